use std::fmt;
use std::path::PathBuf;

/// Malformed or unreadable external input.
///
/// These are configuration errors: they are surfaced to the caller and never
/// swallowed or retried.
#[derive(Debug)]
pub enum FormatError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl FormatError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        FormatError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            FormatError::Parse(err) => write!(f, "parse error: {err}"),
            FormatError::Invalid { field, reason } => write!(f, "invalid {field}: {reason}"),
        }
    }
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FormatError::Io { source, .. } => Some(source),
            FormatError::Parse(err) => Some(err),
            FormatError::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for FormatError {
    fn from(err: serde_json::Error) -> Self {
        FormatError::Parse(err)
    }
}

pub(crate) fn read_file(path: &std::path::Path) -> Result<String, FormatError> {
    std::fs::read_to_string(path).map_err(|source| FormatError::Io {
        path: path.to_path_buf(),
        source,
    })
}
