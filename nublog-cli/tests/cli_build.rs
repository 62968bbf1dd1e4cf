use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const CONFIG: &str = r#"
site:
  title: "Test"
  url: "https://example.com"
  author: "Tester"
paths:
  content: "content"
  output: "dist"
"#;

fn write(root: &Path, rel: &str, contents: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

fn site(root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    write(root, "nublog.yml", CONFIG)?;
    write(
        root,
        "content/index.md",
        "---\npostDate: 2020-01-01\n---\n\n# Home\n\nSee [hello](./articles/hello.md).\n",
    )?;
    write(
        root,
        "content/articles/hello.md",
        "---\npostDate: 2024-05-01\neditDate: 2024-06-01\n---\n\n# Hello\n\n```rust\nfn main() {}\n```\n",
    )?;
    Ok(())
}

#[test]
fn build_writes_fragments_index_feed_and_sitemap() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    site(dir.path())?;

    #[allow(deprecated)]
    Command::cargo_bin("nublog")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .success();

    let dist = dir.path().join("dist");

    let fragment = fs::read_to_string(dist.join("fragments/articles/hello.vue"))?;
    assert!(fragment.starts_with("<script setup>\n"));
    assert!(fragment.contains("<MarkdownPage :meta=\"meta\">"));
    assert!(fragment.contains("class=\"syntect\""));

    let home = fs::read_to_string(dist.join("fragments/index.vue"))?;
    assert!(home.contains("<XLink href=\"/articles/hello\">hello</XLink>"));

    let contents: Value = serde_json::from_str(&fs::read_to_string(dist.join("contents.json"))?)?;
    let entries = contents.as_array().ok_or("contents.json is not an array")?;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["urlPath"], "/articles/hello");
    assert_eq!(entries[1]["urlPath"], "/");

    let feed = fs::read_to_string(dist.join("atom.xml"))?;
    assert!(feed.contains("<link href=\"https://example.com/articles/hello\"/>"));
    assert!(feed.contains("<updated>2024-06-01T00:00:00Z</updated>"));

    let sitemap = fs::read_to_string(dist.join("sitemap.xml"))?;
    assert!(sitemap.contains("<loc>https://example.com/</loc>"));

    assert!(dist.join(".content-cache.json").exists());
    Ok(())
}

#[test]
fn query_json_lists_newest_first() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    site(dir.path())?;

    #[allow(deprecated)]
    let assert = Command::cargo_bin("nublog")?
        .current_dir(dir.path())
        .args(["query", "--json"])
        .assert()
        .success();

    let output: Value = serde_json::from_slice(&assert.get_output().stdout)?;
    let urls: Vec<&str> = output
        .as_array()
        .ok_or("query output is not an array")?
        .iter()
        .filter_map(|entry| entry["urlPath"].as_str())
        .collect();
    assert_eq!(urls, vec!["/articles/hello", "/"]);
    Ok(())
}

#[test]
fn compile_prints_fragment() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    site(dir.path())?;

    #[allow(deprecated)]
    Command::cargo_bin("nublog")?
        .current_dir(dir.path())
        .args(["compile", "index.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<template>"))
        .stdout(predicate::str::contains("\"urlPath\":\"/\""));
    Ok(())
}

#[test]
fn check_reports_url_path_conflicts() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    site(dir.path())?;
    write(
        dir.path(),
        "content/articles/hello/index.md",
        "---\npostDate: 2024-05-02\n---\n\n# Again\n",
    )?;

    #[allow(deprecated)]
    Command::cargo_bin("nublog")?
        .current_dir(dir.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("URL path conflict"));

    assert!(!dir.path().join("dist/contents.json").exists());
    Ok(())
}
