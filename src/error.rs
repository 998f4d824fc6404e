use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloaderError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("HTTP error: {status} for URL: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("Archive error: {0}")]
    ArchiveError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DownloaderError {
    /// Bad credentials, as opposed to any other failure during login.
    pub fn is_auth(&self) -> bool {
        matches!(self, DownloaderError::Authentication(_))
    }
}
