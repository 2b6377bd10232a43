//! Where template text comes from.

use super::error::TemplateError;
#[cfg(test)]
use rustc_hash::FxHashMap;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Loads raw template text by name.
pub trait TemplateSource {
    fn read(&self, name: &str) -> Result<String, TemplateError>;
}

/// Read a template file, mapping a missing file to `MissingTemplate`.
pub fn read_source(path: &Path) -> Result<String, TemplateError> {
    fs::read_to_string(path).map_err(|err| TemplateError::from_io(path.to_path_buf(), &err))
}

/// Templates stored as `<dir>/<name>.<extension>`.
#[derive(Debug, Clone)]
pub struct FsSource {
    dir: PathBuf,
    extension: String,
}

impl FsSource {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    /// File path for a template name; names that already carry the extension
    /// are used as is.
    pub fn path_of(&self, name: &str) -> PathBuf {
        let suffix = format!(".{}", self.extension);
        if name.ends_with(&suffix) {
            self.dir.join(name)
        } else {
            self.dir.join(format!("{name}{suffix}"))
        }
    }
}

impl TemplateSource for FsSource {
    fn read(&self, name: &str) -> Result<String, TemplateError> {
        read_source(&self.path_of(name))
    }
}

/// In-memory templates, keyed by name.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    templates: FxHashMap<String, String>,
}

#[cfg(test)]
impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, text: &str) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: &str, text: &str) {
        self.templates.insert(name.to_owned(), text.to_owned());
    }
}

#[cfg(test)]
impl TemplateSource for MemorySource {
    fn read(&self, name: &str) -> Result<String, TemplateError> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| TemplateError::MissingTemplate(PathBuf::from(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fs_source_reads_with_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("default.sx"), "[:p]").unwrap();

        let source = FsSource::new(dir.path(), "sx");
        assert_eq!(source.read("default").unwrap(), "[:p]");
        assert_eq!(source.read("default.sx").unwrap(), "[:p]");
    }

    #[test]
    fn test_fs_source_missing() {
        let dir = TempDir::new().unwrap();
        let source = FsSource::new(dir.path(), "sx");
        assert_eq!(
            source.read("nope"),
            Err(TemplateError::MissingTemplate(dir.path().join("nope.sx")))
        );
    }

    #[test]
    fn test_memory_source() {
        let source = MemorySource::new().with("a", "[:a]");
        assert_eq!(source.read("a").unwrap(), "[:a]");
        assert!(matches!(
            source.read("b"),
            Err(TemplateError::MissingTemplate(_))
        ));
    }
}
