//! Generated logic block of a fragment: import bindings and constants.

use crate::error::CompileError;
use serde::Serialize;

/// Insertion-ordered imports and constant declarations requested by stages.
///
/// Imports and constants share one namespace. Re-adding an import with the
/// same source is a no-op; any other reuse of a name is a conflict.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    imports: Vec<(String, String)>,
    constants: Vec<(String, String)>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_import(&mut self, name: &str, source: &str) -> Result<(), CompileError> {
        if let Some((_, existing)) = self.imports.iter().find(|(n, _)| n == name) {
            if existing == source {
                return Ok(());
            }
            return Err(CompileError::BindingConflict {
                name: name.to_string(),
                existing: format!("import {:?}", existing),
            });
        }
        self.ensure_not_constant(name)?;
        self.imports.push((name.to_string(), source.to_string()));
        Ok(())
    }

    /// Declare a constant bound to a raw expression.
    pub fn add_constant_expr(&mut self, name: &str, expr: &str) -> Result<(), CompileError> {
        if let Some((_, existing)) = self.imports.iter().find(|(n, _)| n == name) {
            return Err(CompileError::BindingConflict {
                name: name.to_string(),
                existing: format!("import {:?}", existing),
            });
        }
        self.ensure_not_constant(name)?;
        self.constants.push((name.to_string(), expr.to_string()));
        Ok(())
    }

    /// Declare a constant holding the JSON serialization of `value`.
    pub fn add_constant_json<T: Serialize>(
        &mut self,
        name: &str,
        value: &T,
    ) -> Result<(), CompileError> {
        let json = serde_json::to_string(value)
            .map_err(|e| CompileError::Parse(format!("cannot serialize `{}`: {}", name, e)))?;
        self.add_constant_expr(name, &escape_script_close(&json))
    }

    pub fn imports(&self) -> &[(String, String)] {
        &self.imports
    }

    pub fn constants(&self) -> &[(String, String)] {
        &self.constants
    }

    /// Render the logic block: imports first, then constants, in insertion order.
    pub fn finalize(&self) -> String {
        let imports = self
            .imports
            .iter()
            .map(|(name, source)| format!("import {} from {};", name, js_string(source)));
        let constants = self
            .constants
            .iter()
            .map(|(name, expr)| format!("const {} = {};", name, expr));
        imports.chain(constants).collect::<Vec<_>>().join("\n")
    }

    fn ensure_not_constant(&self, name: &str) -> Result<(), CompileError> {
        match self.constants.iter().find(|(n, _)| n == name) {
            Some(_) => Err(CompileError::BindingConflict {
                name: name.to_string(),
                existing: String::from("a constant"),
            }),
            None => Ok(()),
        }
    }
}

/// A JSON string literal, which is also a valid JS string literal.
fn js_string(value: &str) -> String {
    escape_script_close(&serde_json::Value::String(value.to_string()).to_string())
}

/// Keep a literal `</script>` inside a string from closing the block.
fn escape_script_close(json: &str) -> String {
    json.replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_finalize_orders_imports_before_constants() {
        let mut script = Script::new();
        script.add_constant_expr("answer", "42").unwrap();
        script.add_import("XLink", "~/components/XLink.vue").unwrap();
        script.add_import("img1", "./cover.png").unwrap();

        assert_eq!(
            script.finalize(),
            "import XLink from \"~/components/XLink.vue\";\n\
             import img1 from \"./cover.png\";\n\
             const answer = 42;"
        );
    }

    #[test]
    fn test_duplicate_import_same_source_is_idempotent() {
        let mut script = Script::new();
        script.add_import("XLink", "~/components/XLink.vue").unwrap();
        script.add_import("XLink", "~/components/XLink.vue").unwrap();
        assert_eq!(script.imports().len(), 1);
    }

    #[test]
    fn test_conflicting_bindings() {
        let mut script = Script::new();
        script.add_import("img1", "./a.png").unwrap();
        assert!(matches!(
            script.add_import("img1", "./b.png"),
            Err(CompileError::BindingConflict { .. })
        ));
        assert!(script.add_constant_expr("img1", "1").is_err());

        script.add_constant_expr("graphviz1", "{}").unwrap();
        assert!(script.add_constant_expr("graphviz1", "{}").is_err());
        assert!(script.add_import("graphviz1", "./x").is_err());
    }

    #[test]
    fn test_json_constant_escapes_script_close() {
        let mut script = Script::new();
        script
            .add_constant_json("data", &json!({ "source": "</script>" }))
            .unwrap();
        assert_eq!(script.constants()[0].1, r#"{"source":"<\/script>"}"#);
    }

    #[test]
    fn test_import_sources_are_js_strings() {
        let mut script = Script::new();
        script.add_import("img1", "./zero\u{200b}width.png").unwrap();
        script.add_import("img2", "./quote\"d.png").unwrap();
        assert_eq!(
            script.finalize(),
            "import img1 from \"./zero\u{200b}width.png\";\n\
             import img2 from \"./quote\\\"d.png\";"
        );
    }
}
