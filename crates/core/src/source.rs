//! Template sources.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::error::CompileError;

/// Where template text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Template file read in full when compiled.
    File(PathBuf),
    /// In-memory template with a display name for diagnostics.
    Inline {
        /// Name used in messages (typically a virtual path).
        name: String,
        /// Template text.
        text: String,
    },
}

impl Source {
    /// Source backed by a file on disk.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Source::File(path.into())
    }

    /// Source backed by in-memory text.
    pub fn inline(name: impl Into<String>, text: impl Into<String>) -> Self {
        Source::Inline {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Name shown in diagnostics.
    pub fn name(&self) -> Cow<'_, str> {
        match self {
            Source::File(path) => path.to_string_lossy(),
            Source::Inline { name, .. } => Cow::Borrowed(name),
        }
    }

    /// Path on disk, for file sources.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Source::File(path) => Some(path),
            Source::Inline { .. } => None,
        }
    }

    /// Read the whole template. The file handle is released before this
    /// returns, on success and on error.
    pub fn read(&self) -> Result<Cow<'_, str>, CompileError> {
        match self {
            Source::File(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|err| CompileError::source_unavailable(path, err))?;
                log::debug!("read {} bytes from {}", text.len(), path.display());
                Ok(Cow::Owned(text))
            }
            Source::Inline { text, .. } => Ok(Cow::Borrowed(text)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "%p from disk").unwrap();

        let source = Source::file(file.path());
        assert_eq!(source.read().unwrap(), "%p from disk\n");
        assert_eq!(source.path(), Some(file.path()));
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.phml");

        let err = Source::file(&missing).read().unwrap_err();
        match err {
            CompileError::SourceUnavailable { path, source } => {
                assert_eq!(path, missing);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn inline_source_borrows_text() {
        let source = Source::inline("inline.phml", "%p hi");
        assert_eq!(source.name(), "inline.phml");
        assert!(matches!(source.read().unwrap(), Cow::Borrowed("%p hi")));
        assert_eq!(source.path(), None);
    }
}
