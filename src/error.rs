use thiserror::Error;

/// Errors that can occur while running an ad break
#[derive(Error, Debug)]
pub enum AdError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Ad request failed: {0}")]
    Fetch(String),

    #[error("Failed to parse XML: {0}")]
    XmlParseError(#[from] quick_xml::Error),

    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("No playable linear creative in response")]
    NoFill,
}

pub type Result<T> = std::result::Result<T, AdError>;
