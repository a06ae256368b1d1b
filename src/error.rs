use std::fmt;

/// Failures the plugin can run into while adjusting the host.
///
/// None of these are fatal to the host process. Callers log the error and
/// skip the single corrective action it belongs to.
#[derive(Debug)]
pub enum GraphicsOptionsError {
    /// The configuration file is missing, unreadable or malformed.
    Configuration(String),

    /// Changing page protection or writing patched memory failed.
    Patch(String),

    /// The detected host build has no entry in the patch table.
    VersionMismatch { found: Option<u16> },

    /// Window interception could not be attached or detached.
    Hook(String),

    Platform(anyhow::Error),
}

impl fmt::Display for GraphicsOptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsOptionsError::Configuration(s) => write!(f, "Configuration error: {}", s),
            GraphicsOptionsError::Patch(s) => write!(f, "Memory patch failed: {}", s),
            GraphicsOptionsError::VersionMismatch { found: Some(v) } => {
                write!(f, "Unsupported game version {}", v)
            }
            GraphicsOptionsError::VersionMismatch { found: None } => {
                write!(f, "Unable to detect the game version")
            }
            GraphicsOptionsError::Hook(s) => write!(f, "Window interception failed: {}", s),
            GraphicsOptionsError::Platform(e) => write!(f, "Platform error: {:#}", e),
        }
    }
}

impl std::error::Error for GraphicsOptionsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GraphicsOptionsError::Platform(e) => Some(&**e),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for GraphicsOptionsError {
    fn from(e: anyhow::Error) -> Self {
        GraphicsOptionsError::Platform(e)
    }
}

pub type Result<T> = std::result::Result<T, GraphicsOptionsError>;
