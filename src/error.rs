use thiserror::Error;

/// Errors that can occur while fetching, parsing or resolving VAST documents
#[derive(Error, Debug)]
pub enum VastError {
    #[error("Failed to fetch {uri}: {detail}")]
    Http {
        uri: String,
        /// HTTP status code when the server answered, `None` for network failures
        status: Option<u16>,
        detail: String,
    },

    #[error("Failed to parse XML: {0}")]
    XmlParseError(#[from] quick_xml::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Malformed VAST document: {0}")]
    Malformed(String),

    #[error("No ads found in {uri}")]
    NoAds { uri: String },

    #[error("Maximum wrapper depth of {max_depth} exceeded")]
    MaxDepthExceeded { max_depth: usize },

    #[error("Invalid loader options: {0}")]
    InvalidOptions(String),
}

/// Coarse classification of a [`VastError`], used by observers that want to
/// react to a failure without matching on every variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Http,
    Parse,
    NoAds,
    MaxDepthExceeded,
    Config,
}

impl VastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VastError::Http { .. } => ErrorKind::Http,
            VastError::XmlParseError(_) | VastError::MissingField(_) | VastError::Malformed(_) => {
                ErrorKind::Parse
            }
            VastError::NoAds { .. } => ErrorKind::NoAds,
            VastError::MaxDepthExceeded { .. } => ErrorKind::MaxDepthExceeded,
            VastError::InvalidOptions(_) => ErrorKind::Config,
        }
    }

    /// The IAB VAST error code to report through a tag's `<Error>` URL
    pub fn vast_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Parse => 100,
            ErrorKind::Http => 301,
            ErrorKind::MaxDepthExceeded => 302,
            ErrorKind::NoAds => 303,
            ErrorKind::Config => 900,
        }
    }

    /// The HTTP status code behind an `Http` error, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            VastError::Http { status, .. } => *status,
            _ => None,
        }
    }

    pub(crate) fn http(uri: &str, status: Option<u16>, detail: impl Into<String>) -> Self {
        VastError::Http {
            uri: uri.to_string(),
            status,
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VastError>;
