/// Errors produced while fetching a static asset (notes text or cover image).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("invalid asset reference `{0}`")]
    InvalidReference(String),
    #[error("asset `{0}` not found")]
    NotFound(String),
    #[error("reading `{reference}`: {message}")]
    Io { reference: String, message: String },
    #[error("decoding `{reference}`: {message}")]
    Decode { reference: String, message: String },
}

/// Where `content_ref` / `cover_image_ref` values are resolved.
///
/// Implementations are shared with background fetch threads.
pub trait AssetSource: Send + Sync {
    fn fetch_bytes(&self, reference: &str) -> Result<Vec<u8>, FetchError>;

    fn fetch_text(&self, reference: &str) -> Result<String, FetchError> {
        let bytes = self.fetch_bytes(reference)?;
        String::from_utf8(bytes).map_err(|err| FetchError::Decode {
            reference: reference.to_string(),
            message: err.to_string(),
        })
    }
}
