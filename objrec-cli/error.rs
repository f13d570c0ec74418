use objrec_fast::FastError;
use std::path::PathBuf;

#[derive(Debug)]
pub enum LocateError {
    Fast(FastError),
    Image(image::ImageError),
    Io(std::io::Error),
    Json(serde_json::Error),
    TomlDe(toml::de::Error),
    TomlSer(toml::ser::Error),
    ThreadPool(rayon::ThreadPoolBuildError),
    /// Raw pixel buffer does not match its declared dimensions
    InvalidFrame { width: u32, height: u32, expected_len: usize, actual_len: usize },
    InvalidConfig(String),
    UnsupportedConfigFormat(PathBuf),
}

impl std::fmt::Display for LocateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocateError::Fast(e) => write!(f, "FAST error: {}", e),
            LocateError::Image(e) => write!(f, "Image error: {}", e),
            LocateError::Io(e) => write!(f, "I/O error: {}", e),
            LocateError::Json(e) => write!(f, "JSON error: {}", e),
            LocateError::TomlDe(e) => write!(f, "TOML parse error: {}", e),
            LocateError::TomlSer(e) => write!(f, "TOML write error: {}", e),
            LocateError::ThreadPool(e) => write!(f, "Thread pool error: {}", e),
            LocateError::InvalidFrame { width, height, expected_len, actual_len } => write!(
                f,
                "Invalid frame {}x{}: expected {} bytes, got {}",
                width, height, expected_len, actual_len
            ),
            LocateError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            LocateError::UnsupportedConfigFormat(path) => {
                write!(f, "Unsupported configuration format: {} (expected .toml or .json)", path.display())
            }
        }
    }
}

impl std::error::Error for LocateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LocateError::Fast(e) => Some(e),
            LocateError::Image(e) => Some(e),
            LocateError::Io(e) => Some(e),
            LocateError::Json(e) => Some(e),
            LocateError::TomlDe(e) => Some(e),
            LocateError::TomlSer(e) => Some(e),
            LocateError::ThreadPool(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FastError> for LocateError {
    fn from(err: FastError) -> Self {
        LocateError::Fast(err)
    }
}

impl From<image::ImageError> for LocateError {
    fn from(err: image::ImageError) -> Self {
        LocateError::Image(err)
    }
}

impl From<std::io::Error> for LocateError {
    fn from(err: std::io::Error) -> Self {
        LocateError::Io(err)
    }
}

impl From<serde_json::Error> for LocateError {
    fn from(err: serde_json::Error) -> Self {
        LocateError::Json(err)
    }
}

impl From<toml::de::Error> for LocateError {
    fn from(err: toml::de::Error) -> Self {
        LocateError::TomlDe(err)
    }
}

impl From<toml::ser::Error> for LocateError {
    fn from(err: toml::ser::Error) -> Self {
        LocateError::TomlSer(err)
    }
}

impl From<rayon::ThreadPoolBuildError> for LocateError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        LocateError::ThreadPool(err)
    }
}

pub type LocateResult<T> = Result<T, LocateError>;
