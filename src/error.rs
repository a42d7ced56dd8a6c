use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Credential rejected by the vendor (HTTP 401). Terminal until the
    /// token is replaced; never retried internally.
    Auth,
    /// Transport or service failure. Transient: the next poll or command
    /// is the retry path.
    Connectivity(reqwest::Error),
    /// The vendor answered with a body the engine cannot decode. Treated
    /// like a connectivity failure by callers.
    Decode(serde_json::Error),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Auth => write!(f, "unauthorized: access token rejected"),
            Error::Connectivity(e) => write!(f, "connection error: {e}"),
            Error::Decode(e) => write!(f, "malformed listing: {e}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connectivity(e) => Some(e),
            Error::Decode(e) => Some(e),
            Error::Io(e) => Some(e),
            Error::Auth => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Connectivity(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
