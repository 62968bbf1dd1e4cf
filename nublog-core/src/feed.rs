//! Atom feed and sitemap generation.

use crate::config::{FeedConfig, SiteConfig};
use crate::models::DocumentMeta;
use crate::query::{query_content_all, QueryError};
use crate::validate::{validate_date_string, MetaError};
use chrono::{NaiveTime, SecondsFormat};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("Missing title: {0}")]
    MissingTitle(String),

    #[error("Missing postDate: {0}")]
    MissingPostDate(String),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Meta(#[from] MetaError),
}

fn absolute_url(site_url: &str, url_path: &str) -> String {
    format!("{}{}", site_url.trim_end_matches('/'), url_path)
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// `YYYY-MM-DD` as an RFC 3339 timestamp at midnight UTC.
fn to_timestamp(date: &str) -> Result<String, FeedError> {
    let date = validate_date_string(date)?;
    Ok(date
        .and_time(NaiveTime::MIN)
        .and_utc()
        .to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Atom feed of the newest `feed.limit` documents under `feed.url_prefix`.
///
/// Entry `updated` is the edit date when there is one, `published` is always
/// the post date.
pub fn atom_feed(
    site: &SiteConfig,
    feed: &FeedConfig,
    index: &[DocumentMeta],
) -> Result<String, FeedError> {
    let articles = query_content_all(index, Some(&feed.url_prefix))?;

    let mut entries = String::new();
    let mut feed_updated: Option<String> = None;

    for article in articles.into_iter().take(feed.limit) {
        let title = article
            .title
            .as_deref()
            .ok_or_else(|| FeedError::MissingTitle(article.url_path.clone()))?;
        let post_date = article
            .post_date
            .as_deref()
            .ok_or_else(|| FeedError::MissingPostDate(article.url_path.clone()))?;

        let link = escape_xml(&absolute_url(&site.url, &article.url_path));
        let updated = to_timestamp(article.edit_date.as_deref().unwrap_or(post_date))?;
        let published = to_timestamp(post_date)?;

        if feed_updated.as_ref().map_or(true, |latest| updated > *latest) {
            feed_updated = Some(updated.clone());
        }

        entries.push_str(&format!(
            "  <entry>\n    <title type=\"html\">{}</title>\n    <id>{}</id>\n    <link href=\"{}\"/>\n    <updated>{}</updated>\n    <published>{}</published>\n  </entry>\n",
            escape_xml(title),
            link,
            link,
            updated,
            published
        ));
    }

    let site_link = escape_xml(&absolute_url(&site.url, "/"));
    let author = site
        .author
        .as_deref()
        .map(|name| format!("  <author>\n    <name>{}</name>\n  </author>\n", escape_xml(name)))
        .unwrap_or_default();
    let updated = feed_updated
        .unwrap_or_else(|| chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

    Ok(format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <id>{site_link}</id>
  <title>{title}</title>
  <subtitle>{title}</subtitle>
  <updated>{updated}</updated>
  <link rel="alternate" href="{site_link}"/>
{author}{entries}</feed>
"#,
        title = escape_xml(&site.title),
    ))
}

/// Sitemap listing every document, newest first.
pub fn sitemap(site_url: &str, index: &[DocumentMeta]) -> Result<String, FeedError> {
    let mut urls = String::new();

    for content in query_content_all(index, None)? {
        let loc = escape_xml(&absolute_url(site_url, &content.url_path));
        urls.push_str(&format!("<url><loc>{}</loc>", loc));
        if let Some(lastmod) = content.edit_date.as_deref().or(content.post_date.as_deref()) {
            urls.push_str(&format!("<lastmod>{}</lastmod>", lastmod));
        }
        urls.push_str("</url>");
    }

    Ok(format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
{}
</urlset>
"#,
        urls
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteConfig {
        SiteConfig {
            title: String::from("Nugine's Blog"),
            url: String::from("https://nugine.xyz/"),
            author: Some(String::from("Nugine")),
        }
    }

    fn article(slug: &str, date: &str, edit: Option<&str>) -> DocumentMeta {
        let mut meta = DocumentMeta::new(
            format!("/articles/{}.md", slug),
            format!("/articles/{}", slug),
        );
        meta.title = Some(format!("On {} & more", slug));
        meta.post_date = Some(date.to_string());
        meta.edit_date = edit.map(str::to_string);
        meta
    }

    #[test]
    fn test_atom_entries() {
        let index = vec![
            article("old", "2023-05-01", None),
            article("new", "2024-01-02", Some("2024-03-04")),
            DocumentMeta {
                title: Some(String::from("About")),
                post_date: Some(String::from("2025-01-01")),
                ..DocumentMeta::new("/about.md", "/about")
            },
        ];

        let xml = atom_feed(&site(), &FeedConfig::default(), &index).unwrap();

        assert!(xml.contains("<title>Nugine&apos;s Blog</title>"));
        assert!(xml.contains("<updated>2024-03-04T00:00:00Z</updated>\n  <link rel=\"alternate\""));
        assert!(xml.contains("<name>Nugine</name>"));
        assert!(xml.contains("<title type=\"html\">On new &amp; more</title>"));
        assert!(xml.contains("<published>2024-01-02T00:00:00Z</published>"));
        assert!(!xml.contains("/about"));

        let new_pos = xml.find("/articles/new").unwrap();
        let old_pos = xml.find("/articles/old").unwrap();
        assert!(new_pos < old_pos);
    }

    #[test]
    fn test_atom_limit() {
        let index = vec![
            article("a", "2024-01-01", None),
            article("b", "2024-01-02", None),
            article("c", "2024-01-03", None),
        ];
        let feed = FeedConfig {
            limit: 2,
            ..FeedConfig::default()
        };
        let xml = atom_feed(&site(), &feed, &index).unwrap();
        assert_eq!(xml.matches("<entry>").count(), 2);
        assert!(!xml.contains("/articles/a\""));
    }

    #[test]
    fn test_atom_requires_title() {
        let mut untitled = article("x", "2024-01-01", None);
        untitled.title = None;
        assert_eq!(
            atom_feed(&site(), &FeedConfig::default(), &[untitled]),
            Err(FeedError::MissingTitle(String::from("/articles/x")))
        );
    }

    #[test]
    fn test_sitemap() {
        let index = vec![
            article("a", "2024-01-01", None),
            DocumentMeta {
                post_date: Some(String::from("2020-01-01")),
                ..DocumentMeta::new("/index.md", "/")
            },
        ];
        let xml = sitemap("https://nugine.xyz", &index).unwrap();
        assert!(xml.contains(
            "<url><loc>https://nugine.xyz/articles/a</loc><lastmod>2024-01-01</lastmod></url>\
             <url><loc>https://nugine.xyz/</loc><lastmod>2020-01-01</lastmod></url>"
        ));
    }
}
