// crates/bmad-template/src/lib.rs
// ============================================================================
// Crate: bmad-template
// Description: Variable resolution, placeholder substitution, section-marker
// replacement, and structural validation for document templates.
// Purpose: Deterministic document assembly, independent of any markdown
// parser, built on bmad-core's section-marker scanner.
// ============================================================================

//! ## Overview
//! `bmad-template` composes three independent passes over a template:
//! [`variables::resolve_variables`] builds the variable map, then
//! [`substitution::substitute`] and [`bmad_core::Document::replace_section`]
//! transform the text. [`loader::load_template`] wraps the whole thing with
//! the custom-override-with-fallback policy document assembly callers need.

pub mod loader;
pub mod substitution;
pub mod validation;
pub mod variables;

pub use loader::LoadedTemplate;
pub use loader::TemplateError;
pub use loader::TemplateSource;
pub use loader::load_template;
pub use substitution::substitute;
pub use validation::StructuralReport;
pub use validation::validate_structure;
pub use variables::resolve_variables;
