//! # credgen
//!
//! A library and CLI tool for rendering verifiable-credential templates.
//!
//! Templates come in three formats (WPML text, WPM JSON objects and WPT
//! directives); each parses into a [`TemplateDefinition`] which the
//! [`Renderer`] turns into the unsigned credential JSON.

pub mod cli;
pub mod error;
pub mod interactive;
pub mod render;
pub mod template;

// Re-exports
pub use cli::{Cli, Commands};
pub use error::{CredgenError, Result};
pub use render::{render, Organization, RenderContext, RenderedCredential, Renderer};
pub use template::{Catalog, FieldSpec, FieldType, Skeleton, TemplateDefinition, TemplateLoader};
