//! Python language extractor
//!
//! Extracts top-level functions and classes from Python source using tree-sitter.

use super::framework::{self, CodeEntity, EntityExtractor, EntityKind};
use crate::Result;
use tree_sitter::{Language, Node};

/// Python language extractor
pub struct PythonExtractor {
    language: Language,
}

impl PythonExtractor {
    /// Create a new Python extractor
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }

    /// Unwrap `@decorator` wrappers; the span keeps the decorators
    fn definition(node: Node) -> Option<Node> {
        match node.kind() {
            "decorated_definition" => node.child_by_field_name("definition"),
            "function_definition" | "class_definition" => Some(node),
            _ => None,
        }
    }

    fn method_names(class_def: Node, source: &str) -> Vec<String> {
        let Some(body) = class_def.child_by_field_name("body") else {
            return Vec::new();
        };

        let mut cursor = body.walk();
        body.named_children(&mut cursor)
            .filter_map(Self::definition)
            .filter(|def| def.kind() == "function_definition")
            .filter_map(|def| framework::field_text(def, "name", source))
            .map(str::to_string)
            .collect()
    }
}

impl Default for PythonExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityExtractor for PythonExtractor {
    fn language_name(&self) -> &str {
        "Python"
    }

    fn file_extensions(&self) -> &[&str] {
        &["py", "pyi"]
    }

    fn extract(&self, source: &str) -> Result<Vec<CodeEntity>> {
        let tree = framework::parse(&self.language, source)?;
        let root = tree.root_node();

        let mut entities = Vec::new();
        let mut cursor = root.walk();

        for span in root.named_children(&mut cursor) {
            let Some(def) = Self::definition(span) else {
                continue;
            };
            let Some(name) = framework::field_text(def, "name", source) else {
                continue;
            };

            let entity = match def.kind() {
                "function_definition" => CodeEntity::from_node(EntityKind::Function, name, span, source),
                "class_definition" => CodeEntity::from_node(EntityKind::Class, name, span, source)
                    .map(|e| e.with_methods(Self::method_names(def, source))),
                _ => None,
            };

            if let Some(entity) = entity {
                entities.push(entity);
            }
        }

        Ok(entities)
    }
}
