//! Template engine.
//!
//! Templates are plain text files: an optional header of `;key:value` lines
//! followed by a body of hiccup-style forms.
//!
//! ```text
//! ;layout:default
//! ;title:About
//! [:h1 (:title site)]
//! [:p "Hello"]
//! ```
//!
//! Compiling a template yields a [`RenderFn`] that maps a site context and
//! content values to a document tree ([`Value`]). Trees go through the
//! [`Pipeline`] and are serialized by [`crate::render::serialize`].

mod compiler;
mod error;
mod eval;
mod layout;
mod options;
mod pipeline;
mod reader;
mod source;
mod value;

pub use compiler::{CompiledTemplate, Compiler, RenderFn};
pub use error::TemplateError;
pub use options::{DocumentOptions, Format};
pub use pipeline::Pipeline;
#[cfg(test)]
pub use source::MemorySource;
pub use source::{FsSource, TemplateSource, read_source};
pub use value::{Deferred, Map, Node, Value};
