// Core Layer: Rust Error Types
// Idiomatic Rust error handling over spbla status codes

use crate::ffi::error::*;
use std::fmt;

/// Rust-native spbla error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpblaError {
    /// Generic error reported by the engine
    Error,
    /// No cuda/opencl compatible device in the system
    DeviceNotPresent,
    /// Device side error
    DeviceError,
    /// Memory allocation failed on host or device
    MemOpFailed,
    /// Invalid argument (also raised locally for shape and index checks)
    InvalidArgument,
    /// Call is not possible in the current state
    InvalidState,
    /// Failed to select a supported backend
    BackendError,
    /// Feature is not implemented by the engine
    NotImplemented,
    /// Native library could not be located or loaded
    EngineLoad(String),
    /// Native initialization (or logging setup) failed
    EngineInit(Box<SpblaError>),
}

impl SpblaError {
    /// Convert Rust error to C API status code
    pub fn to_status(&self) -> spbla_Status {
        match self {
            Self::Error => SPBLA_STATUS_ERROR,
            Self::DeviceNotPresent => SPBLA_STATUS_DEVICE_NOT_PRESENT,
            Self::DeviceError => SPBLA_STATUS_DEVICE_ERROR,
            Self::MemOpFailed => SPBLA_STATUS_MEM_OP_FAILED,
            Self::InvalidArgument => SPBLA_STATUS_INVALID_ARGUMENT,
            Self::InvalidState => SPBLA_STATUS_INVALID_STATE,
            Self::BackendError => SPBLA_STATUS_BACKEND_ERROR,
            Self::NotImplemented => SPBLA_STATUS_NOT_IMPLEMENTED,
            // Client-side kinds have no status of their own
            Self::EngineLoad(_) => SPBLA_STATUS_ERROR,
            Self::EngineInit(cause) => cause.to_status(),
        }
    }

    /// Convert C API status code to Rust error
    pub fn from_status(status: spbla_Status) -> Option<Self> {
        match status {
            SPBLA_STATUS_SUCCESS => None,
            SPBLA_STATUS_ERROR => Some(Self::Error),
            SPBLA_STATUS_DEVICE_NOT_PRESENT => Some(Self::DeviceNotPresent),
            SPBLA_STATUS_DEVICE_ERROR => Some(Self::DeviceError),
            SPBLA_STATUS_MEM_OP_FAILED => Some(Self::MemOpFailed),
            SPBLA_STATUS_INVALID_ARGUMENT => Some(Self::InvalidArgument),
            SPBLA_STATUS_INVALID_STATE => Some(Self::InvalidState),
            SPBLA_STATUS_BACKEND_ERROR => Some(Self::BackendError),
            SPBLA_STATUS_NOT_IMPLEMENTED => Some(Self::NotImplemented),
            unknown => {
                log::warn!("Unknown spbla status code {}", unknown);
                Some(Self::Error)
            }
        }
    }

    /// Symbolic status name carried by this error
    pub fn status_name(&self) -> &'static str {
        status_name(self.to_status())
    }
}

/// Translate a native status code, failing on anything but success
///
/// Output parameters of the native call must not be read before this
/// returns `Ok`.
pub fn check_status(status: spbla_Status) -> Result<()> {
    match SpblaError::from_status(status) {
        None => Ok(()),
        Some(err) => Err(err),
    }
}

impl fmt::Display for SpblaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EngineLoad(reason) => write!(f, "Failed to load spbla library: {}", reason),
            Self::EngineInit(cause) => write!(f, "Failed to initialize spbla library: {}", cause),
            other => write!(f, "{}", status_to_string(other.to_status())),
        }
    }
}

impl std::error::Error for SpblaError {}

/// Result type for spbla operations
pub type Result<T> = std::result::Result<T, SpblaError>;
