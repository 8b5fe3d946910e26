use thiserror::Error;
use virtual_store::FsError;

pub type Result<T> = std::result::Result<T, ShimError>;

/// Every failure a namespace member can surface to its caller.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum ShimError {
    /// Argument or option validation failed before any work was done
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    /// The member exists for structural completeness only
    #[error("`{0}` is not implemented in this host")]
    NotImplemented(String),
    /// The resource id is closed or was never opened
    #[error("bad resource id {0}")]
    BadResource(u32),
    #[error(transparent)]
    Fs(#[from] FsError),
    #[error("{0}")]
    TypeError(String),
    #[error("`{0}` is already bound in the global scope")]
    AlreadyInstalled(String),
    #[error("`{0}` cannot be rebound")]
    NotInstalled(String),
    /// The surface table is malformed or disagrees with the implementation
    #[error("surface contract: {0}")]
    Surface(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    /// An error value built through one of the `errors.*` classes
    #[error("{message}")]
    Thrown { class: String, message: String },
}

impl ShimError {
    /// Name of the runtime error class this failure is reported as.
    pub fn class(&self) -> &str {
        match self {
            Self::InvalidArgs(_) | Self::TypeError(_) => "TypeError",
            Self::BadResource(_) => "BadResource",
            Self::Fs(err) => match err {
                FsError::EntityNotFound => "NotFound",
                FsError::AlreadyExists => "AlreadyExists",
                FsError::InvalidInput => "InvalidData",
                FsError::PermissionDenied => "PermissionDenied",
                FsError::WriteZero => "WriteZero",
                FsError::NotAFile => "Error",
            },
            Self::Thrown { class, .. } => class,
            Self::NotImplemented(_)
            | Self::AlreadyInstalled(_)
            | Self::NotInstalled(_)
            | Self::Surface(_)
            | Self::Config(_) => "Error",
        }
    }
}
