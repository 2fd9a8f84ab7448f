//! File entry points.
//!
//! The core codec never touches the filesystem. These helpers read a whole
//! document through a [`TextSource`], run the in-memory entry point with
//! the path as the location's file name, and write encoded text back.

use crate::binding::Accessor;
use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::value::Object;
use std::io;
use std::path::Path;
use yamlbind_tree::{CodecOptions, ParseMode, parse_named};

/// Where documents are read from and written to.
pub trait TextSource {
    /// Read the full text at `path`.
    fn read_text(&self, path: &Path) -> io::Result<String>;

    /// Create or replace the text at `path`.
    fn write_text(&self, path: &Path, text: &str) -> io::Result<()>;
}

/// The local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl TextSource for FsSource {
    fn read_text(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_text(&self, path: &Path, text: &str) -> io::Result<()> {
        std::fs::write(path, text)
    }
}

fn read(source: &dyn TextSource, path: &Path) -> Result<String> {
    tracing::debug!(path = %path.display(), "reading document");
    source.read_text(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl Codec {
    /// Compile the schema stored at `path`.
    pub fn from_source(source: &dyn TextSource, path: &Path, options: CodecOptions) -> Result<Self> {
        let text = read(source, path)?;
        Codec::from_named(&text, &path.display().to_string(), options)
    }

    /// Validate the document stored at `path`.
    pub fn validate_source(&self, source: &dyn TextSource, path: &Path) -> Result<()> {
        let text = read(source, path)?;
        let document = parse_named(&text, &path.display().to_string(), self.options(), ParseMode::Data)?;
        self.validate_tree(&document)
    }

    /// Decode the document stored at `path`.
    pub fn decode_source(
        &self,
        source: &dyn TextSource,
        path: &Path,
        root_class: &str,
        accessor: &dyn Accessor,
    ) -> Result<Object> {
        let text = read(source, path)?;
        let document = parse_named(&text, &path.display().to_string(), self.options(), ParseMode::Data)?;
        self.decode_tree(&document, root_class, accessor)
    }

    /// Encode `object` and store the text at `path`.
    ///
    /// Nothing is written when encoding fails.
    pub fn encode_to_source(
        &self,
        source: &dyn TextSource,
        path: &Path,
        object: &Object,
        accessor: &dyn Accessor,
    ) -> Result<()> {
        let text = self.encode(object, accessor)?;
        tracing::debug!(path = %path.display(), "writing document");
        source.write_text(path, &text).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Compile the schema file at `path` with default options.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_source(&FsSource, path.as_ref(), CodecOptions::default())
    }

    pub fn validate_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.validate_source(&FsSource, path.as_ref())
    }

    pub fn decode_file(
        &self,
        path: impl AsRef<Path>,
        root_class: &str,
        accessor: &dyn Accessor,
    ) -> Result<Object> {
        self.decode_source(&FsSource, path.as_ref(), root_class, accessor)
    }

    pub fn encode_to_file(
        &self,
        path: impl AsRef<Path>,
        object: &Object,
        accessor: &dyn Accessor,
    ) -> Result<()> {
        self.encode_to_source(&FsSource, path.as_ref(), object, accessor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::DynamicAccessor;
    use crate::error::ErrorClass;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// In-memory source for exercising the plumbing without a filesystem.
    #[derive(Default)]
    struct MemorySource {
        files: RefCell<HashMap<PathBuf, String>>,
    }

    impl TextSource for MemorySource {
        fn read_text(&self, path: &Path) -> io::Result<String> {
            self.files
                .borrow()
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such document"))
        }

        fn write_text(&self, path: &Path, text: &str) -> io::Result<()> {
            self.files.borrow_mut().insert(path.to_path_buf(), text.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_memory_round_trip() {
        let source = MemorySource::default();
        source
            .write_text(Path::new("schema.yaml"), "---\nproperties:\n  name: string\n")
            .unwrap();
        let codec = Codec::from_source(&source, Path::new("schema.yaml"), CodecOptions::default()).unwrap();

        let object = Object::new("Person").with("name", "Ada");
        codec
            .encode_to_source(&source, Path::new("ada.yaml"), &object, &DynamicAccessor)
            .unwrap();
        let decoded = codec
            .decode_source(&source, Path::new("ada.yaml"), "Person", &DynamicAccessor)
            .unwrap();
        assert_eq!(decoded, object);
    }

    #[test]
    fn test_missing_document_is_io() {
        let source = MemorySource::default();
        let err = Codec::from_source(&source, Path::new("nowhere.yaml"), CodecOptions::default()).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Io);
        assert_eq!(err.error_code(), "Y-1-90");
    }

    #[test]
    fn test_locations_carry_the_path() {
        let source = MemorySource::default();
        source
            .write_text(Path::new("schema.yaml"), "---\nproperties:\n  age: integer\n")
            .unwrap();
        source.write_text(Path::new("data.yaml"), "---\nage: old\n").unwrap();
        let codec = Codec::from_source(&source, Path::new("schema.yaml"), CodecOptions::default()).unwrap();
        let err = codec.validate_source(&source, Path::new("data.yaml")).unwrap_err();
        assert_eq!(
            err.location().and_then(|l| l.file.as_deref()),
            Some("data.yaml")
        );
    }
}
