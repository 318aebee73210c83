//! Core adapter framework
//!
//! Defines the traits and types that all language extractors implement.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tree_sitter::{Language, Node, Parser, Tree};

/// Kind of extracted code entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Function,
    Class,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Function => "function",
            EntityKind::Class => "class",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A top-level function or class definition with its exact source span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEntity {
    pub kind: EntityKind,
    pub name: String,
    pub snippet: String,
    /// Method names, classes only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
    /// Starting line number (1-indexed)
    pub start_line: u32,
    /// Ending line number (1-indexed, inclusive)
    pub end_line: u32,
}

impl CodeEntity {
    pub(crate) fn from_node(kind: EntityKind, name: &str, span: Node, source: &str) -> Option<Self> {
        let snippet = span.utf8_text(source.as_bytes()).ok()?;
        Some(Self {
            kind,
            name: name.to_string(),
            snippet: snippet.to_string(),
            methods: Vec::new(),
            start_line: span.start_position().row as u32 + 1,
            end_line: span.end_position().row as u32 + 1,
        })
    }

    pub fn with_methods(mut self, methods: Vec<String>) -> Self {
        self.methods = methods;
        self
    }
}

/// Trait for language extractors
///
/// Each extractor is responsible for:
/// 1. Identifying files it can parse
/// 2. Parsing them with its tree-sitter grammar
/// 3. Returning the top-level functions and classes
pub trait EntityExtractor: Send + Sync {
    /// Get the language name (for display)
    fn language_name(&self) -> &str;

    /// Get file extensions this extractor handles
    fn file_extensions(&self) -> &[&str];

    /// Check if this extractor can handle a file
    fn can_handle(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            self.file_extensions().contains(&ext)
        } else {
            false
        }
    }

    /// Extract top-level code entities from source text
    fn extract(&self, source: &str) -> Result<Vec<CodeEntity>>;
}

/// Parse `source` with a fresh parser for `language`
pub(crate) fn parse(language: &Language, source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(language)
        .map_err(|e| Error::Parse(format!("Failed to set language: {}", e)))?;

    parser
        .parse(source, None)
        .ok_or_else(|| Error::Parse("Failed to parse file".to_string()))
}

/// Text of a node's `name` field
pub(crate) fn field_text<'a>(node: Node, field: &str, source: &'a str) -> Option<&'a str> {
    node.child_by_field_name(field)?.utf8_text(source.as_bytes()).ok()
}

/// Registry of language extractors
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn EntityExtractor>>,
}

impl ExtractorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extractor
    pub fn register(&mut self, extractor: impl EntityExtractor + 'static) {
        self.extractors.push(Box::new(extractor));
    }

    /// Find an extractor for a file
    pub fn find_extractor(&self, path: &Path) -> Option<&dyn EntityExtractor> {
        self.extractors
            .iter()
            .find(|e| e.can_handle(path))
            .map(|e| e.as_ref())
    }

    /// Extract entities with the matching extractor; unsupported files yield nothing
    pub fn extract(&self, path: &Path, source: &str) -> Result<Vec<CodeEntity>> {
        match self.find_extractor(path) {
            Some(extractor) => extractor.extract(source),
            None => Ok(Vec::new()),
        }
    }
}

/// Create a default registry with all built-in extractors
pub fn default_registry() -> ExtractorRegistry {
    let mut registry = ExtractorRegistry::new();
    registry.register(super::python::PythonExtractor::new());
    registry.register(super::javascript::JavaScriptExtractor::new());
    registry
}
