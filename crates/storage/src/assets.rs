use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use folio_core::{AssetSource, FetchError};

/// Resolves relative asset references against a root directory.
#[derive(Debug, Clone)]
pub struct AssetOrigin {
    root: PathBuf,
}

impl AssetOrigin {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Joins `reference` onto the root; rejects absolute paths and `..`.
    pub fn resolve(&self, reference: &str) -> Result<PathBuf, FetchError> {
        let trimmed = reference.trim();
        let invalid = || FetchError::InvalidReference(reference.to_string());
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let relative = Path::new(trimmed);
        let mut path = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(invalid());
                }
            }
        }
        Ok(path)
    }
}

impl AssetSource for AssetOrigin {
    fn fetch_bytes(&self, reference: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.resolve(reference)?;
        std::fs::read(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => FetchError::NotFound(reference.to_string()),
            _ => FetchError::Io {
                reference: reference.to_string(),
                message: err.to_string(),
            },
        })
    }
}
