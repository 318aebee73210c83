//! Language Adapter Framework
//!
//! Each language provides a Tree-sitter grammar and an extractor that maps
//! top-level function and class definitions to [`CodeEntity`] values.
//! Files without an extractor produce no entities.

pub mod framework;
pub mod javascript;
pub mod python;

pub use framework::{CodeEntity, EntityExtractor, EntityKind, ExtractorRegistry, default_registry};
pub use javascript::JavaScriptExtractor;
pub use python::PythonExtractor;
