//! Template error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, compiling, composing or serializing templates.
///
/// Cloneable so a deferred computation can cache its failure alongside its
/// successful value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    #[error("layout `{0}` not found")]
    MissingLayout(String),

    #[error("layout cycle detected: {}", .0.join(" -> "))]
    LayoutCycle(Vec<String>),

    #[error("{template}:{line}:{column}: {message}")]
    Syntax {
        template: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{template}: {message}")]
    Eval { template: String, message: String },

    #[error("template file not found: `{}`", .0.display())]
    MissingTemplate(PathBuf),

    #[error("IO error when reading `{}`: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("serialization failed: {0}")]
    Serialize(String),
}

impl TemplateError {
    /// Map an IO failure on `path`, turning `NotFound` into [`Self::MissingTemplate`].
    pub fn from_io(path: PathBuf, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::MissingTemplate(path),
            _ => Self::Io {
                path,
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_error_display() {
        let err = TemplateError::LayoutCycle(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(err.to_string(), "layout cycle detected: a -> b -> a");

        let err = TemplateError::Syntax {
            template: "index.html.sx".into(),
            line: 3,
            column: 7,
            message: "unclosed `(`".into(),
        };
        assert_eq!(err.to_string(), "index.html.sx:3:7: unclosed `(`");

        let err = TemplateError::MissingLayout("default".into());
        assert!(err.to_string().contains("`default`"));
    }

    #[test]
    fn test_from_io_not_found() {
        let err = TemplateError::from_io(
            PathBuf::from("template/missing.sx"),
            &Error::new(ErrorKind::NotFound, "gone"),
        );
        assert_eq!(
            err,
            TemplateError::MissingTemplate(PathBuf::from("template/missing.sx"))
        );

        let err = TemplateError::from_io(
            PathBuf::from("template/locked.sx"),
            &Error::new(ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, TemplateError::Io { .. }));
    }
}
