//! JavaScript language extractor
//!
//! Extracts top-level function declarations, classes (with their method
//! names) and `const`/`let` bindings to function expressions. Declarations
//! wrapped in `export` are unwrapped.

use super::framework::{self, CodeEntity, EntityExtractor, EntityKind};
use crate::Result;
use tree_sitter::{Language, Node};

/// JavaScript language extractor
pub struct JavaScriptExtractor {
    language: Language,
}

const FUNCTION_VALUES: &[&str] = &[
    "arrow_function",
    "function",
    "function_expression",
    "generator_function",
];

impl JavaScriptExtractor {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_javascript::LANGUAGE.into(),
        }
    }

    fn method_names(class_decl: Node, source: &str) -> Vec<String> {
        let Some(body) = class_decl.child_by_field_name("body") else {
            return Vec::new();
        };

        let mut cursor = body.walk();
        body.named_children(&mut cursor)
            .filter(|member| member.kind() == "method_definition")
            .filter_map(|member| framework::field_text(member, "name", source))
            .map(str::to_string)
            .collect()
    }

    fn visit(&self, node: Node, source: &str, entities: &mut Vec<CodeEntity>) {
        match node.kind() {
            "function_declaration" | "generator_function_declaration" => {
                if let Some(name) = framework::field_text(node, "name", source) {
                    entities.extend(CodeEntity::from_node(EntityKind::Function, name, node, source));
                }
            }
            "class_declaration" => {
                if let Some(name) = framework::field_text(node, "name", source) {
                    entities.extend(
                        CodeEntity::from_node(EntityKind::Class, name, node, source)
                            .map(|e| e.with_methods(Self::method_names(node, source))),
                    );
                }
            }
            "export_statement" => {
                if let Some(declaration) = node.child_by_field_name("declaration") {
                    self.visit(declaration, source, entities);
                } else if let Some(value) = node.child_by_field_name("value") {
                    // `export default class Foo {}` parsed as an expression
                    if let Some(name) = framework::field_text(value, "name", source) {
                        Self::push_value(name, value, node, source, entities);
                    }
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                self.visit_declarators(node, source, entities);
            }
            _ => {}
        }
    }

    /// `const add = (a, b) => a + b;` and `const Foo = class { ... }`
    fn visit_declarators(&self, declaration: Node, source: &str, entities: &mut Vec<CodeEntity>) {
        let mut cursor = declaration.walk();
        let declarators: Vec<Node> = declaration
            .named_children(&mut cursor)
            .filter(|n| n.kind() == "variable_declarator")
            .collect();

        // A lone declarator keeps the `const` keyword in its snippet
        let single = declarators.len() == 1;

        for declarator in declarators {
            let (Some(name), Some(value)) = (
                framework::field_text(declarator, "name", source),
                declarator.child_by_field_name("value"),
            ) else {
                continue;
            };
            let span = if single { declaration } else { declarator };
            Self::push_value(name, value, span, source, entities);
        }
    }

    /// Record a function or class expression bound to `name`
    fn push_value(name: &str, value: Node, span: Node, source: &str, entities: &mut Vec<CodeEntity>) {
        if FUNCTION_VALUES.contains(&value.kind()) {
            entities.extend(CodeEntity::from_node(EntityKind::Function, name, span, source));
        } else if value.kind() == "class" {
            entities.extend(
                CodeEntity::from_node(EntityKind::Class, name, span, source)
                    .map(|e| e.with_methods(Self::method_names(value, source))),
            );
        }
    }
}

impl Default for JavaScriptExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityExtractor for JavaScriptExtractor {
    fn language_name(&self) -> &str {
        "JavaScript"
    }

    fn file_extensions(&self) -> &[&str] {
        &["js", "jsx", "mjs", "cjs"]
    }

    fn extract(&self, source: &str) -> Result<Vec<CodeEntity>> {
        let tree = framework::parse(&self.language, source)?;
        let root = tree.root_node();

        let mut entities = Vec::new();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            self.visit(child, source, &mut entities);
        }

        Ok(entities)
    }
}
