#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    /// No API key is configured. Permanent for the session.
    #[error("image host credential is not configured")]
    UploadCredentialMissing,
    #[error("image upload failed: {0}")]
    UploadNetworkError(String),
    #[error("could not fetch remote image: {0}")]
    FetchCorsBlocked(String),
}
