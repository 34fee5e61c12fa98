use std::io;

use nix::errno::Errno;
use thiserror::Error;

/// Gadget tree error type
///
/// Every variant carries a human-readable context message, usually the
/// configfs path the failing operation touched.
#[derive(Error, Debug)]
pub enum GadgetError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    Access(String),

    #[error("Out of memory: {0}")]
    NoMemory(String),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Error: {0}")]
    Other(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Error category, independent of the attached message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Access,
    NoMemory,
    InvalidParam,
    Io,
    Other,
    Config,
}

impl GadgetError {
    /// Translate an OS errno into the error taxonomy
    pub fn from_errno(errno: Errno, context: impl Into<String>) -> Self {
        let context = format!("{}: {}", context.into(), errno.desc());
        match errno {
            Errno::ENOENT | Errno::ENOTDIR => GadgetError::NotFound(context),
            Errno::EACCES => GadgetError::Access(context),
            Errno::ENOMEM => GadgetError::NoMemory(context),
            Errno::EINVAL => GadgetError::InvalidParam(context),
            Errno::EIO => GadgetError::Io(context),
            _ => GadgetError::Other(context),
        }
    }

    /// Translate an `io::Error`, preferring its raw errno when present
    pub fn from_io(err: &io::Error, context: impl Into<String>) -> Self {
        if let Some(code) = err.raw_os_error() {
            return Self::from_errno(Errno::from_raw(code), context);
        }

        let context = format!("{}: {}", context.into(), err);
        match err.kind() {
            io::ErrorKind::NotFound => GadgetError::NotFound(context),
            io::ErrorKind::PermissionDenied => GadgetError::Access(context),
            io::ErrorKind::OutOfMemory => GadgetError::NoMemory(context),
            io::ErrorKind::InvalidInput => GadgetError::InvalidParam(context),
            _ => GadgetError::Other(context),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GadgetError::NotFound(_) => ErrorKind::NotFound,
            GadgetError::Access(_) => ErrorKind::Access,
            GadgetError::NoMemory(_) => ErrorKind::NoMemory,
            GadgetError::InvalidParam(_) => ErrorKind::InvalidParam,
            GadgetError::Io(_) => ErrorKind::Io,
            GadgetError::Other(_) => ErrorKind::Other,
            GadgetError::Config(_) => ErrorKind::Config,
        }
    }
}

impl From<serde_json::Error> for GadgetError {
    fn from(err: serde_json::Error) -> Self {
        GadgetError::Config(err.to_string())
    }
}

/// Result type alias for gadget tree operations
pub type Result<T> = std::result::Result<T, GadgetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_mapping() {
        let cases = [
            (Errno::ENOENT, ErrorKind::NotFound),
            (Errno::ENOTDIR, ErrorKind::NotFound),
            (Errno::EACCES, ErrorKind::Access),
            (Errno::ENOMEM, ErrorKind::NoMemory),
            (Errno::EINVAL, ErrorKind::InvalidParam),
            (Errno::EIO, ErrorKind::Io),
            (Errno::EEXIST, ErrorKind::Other),
            (Errno::EBUSY, ErrorKind::Other),
        ];

        for (errno, kind) in cases {
            assert_eq!(GadgetError::from_errno(errno, "x").kind(), kind, "{:?}", errno);
        }
    }

    #[test]
    fn test_io_error_mapping() {
        let err = io::Error::from_raw_os_error(Errno::ENOENT as i32);
        assert_eq!(GadgetError::from_io(&err, "/missing").kind(), ErrorKind::NotFound);

        let err = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert_eq!(GadgetError::from_io(&err, "/locked").kind(), ErrorKind::Access);

        let err = io::Error::new(io::ErrorKind::UnexpectedEof, "short");
        assert_eq!(GadgetError::from_io(&err, "/short").kind(), ErrorKind::Other);
    }

    #[test]
    fn test_message_keeps_context() {
        let err = GadgetError::from_errno(Errno::ENOENT, "/sys/kernel/config/usb_gadget");
        assert!(err.to_string().contains("/sys/kernel/config/usb_gadget"));
    }
}
