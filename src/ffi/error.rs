// FFI Layer: spbla C API Status Codes
// spbla_Status return type for all C API functions

/// spbla return status codes
pub type spbla_Status = u32;

pub const SPBLA_STATUS_SUCCESS: spbla_Status = 0;
pub const SPBLA_STATUS_ERROR: spbla_Status = 1;
pub const SPBLA_STATUS_DEVICE_NOT_PRESENT: spbla_Status = 2; // No cuda/opencl compatible device
pub const SPBLA_STATUS_DEVICE_ERROR: spbla_Status = 3;
pub const SPBLA_STATUS_MEM_OP_FAILED: spbla_Status = 4; // Allocation failed on host or device
pub const SPBLA_STATUS_INVALID_ARGUMENT: spbla_Status = 5;
pub const SPBLA_STATUS_INVALID_STATE: spbla_Status = 6;
pub const SPBLA_STATUS_BACKEND_ERROR: spbla_Status = 7; // Failed to select a backend
pub const SPBLA_STATUS_NOT_IMPLEMENTED: spbla_Status = 8;

/// Symbolic name of a status code
pub fn status_name(status: spbla_Status) -> &'static str {
    match status {
        SPBLA_STATUS_SUCCESS => "SPBLA_STATUS_SUCCESS",
        SPBLA_STATUS_ERROR => "SPBLA_STATUS_ERROR",
        SPBLA_STATUS_DEVICE_NOT_PRESENT => "SPBLA_STATUS_DEVICE_NOT_PRESENT",
        SPBLA_STATUS_DEVICE_ERROR => "SPBLA_STATUS_DEVICE_ERROR",
        SPBLA_STATUS_MEM_OP_FAILED => "SPBLA_STATUS_MEM_OP_FAILED",
        SPBLA_STATUS_INVALID_ARGUMENT => "SPBLA_STATUS_INVALID_ARGUMENT",
        SPBLA_STATUS_INVALID_STATE => "SPBLA_STATUS_INVALID_STATE",
        SPBLA_STATUS_BACKEND_ERROR => "SPBLA_STATUS_BACKEND_ERROR",
        SPBLA_STATUS_NOT_IMPLEMENTED => "SPBLA_STATUS_NOT_IMPLEMENTED",
        _ => "SPBLA_STATUS_UNKNOWN",
    }
}

/// Helper to get error message for a spbla_Status code
pub fn status_to_string(status: spbla_Status) -> &'static str {
    match status {
        SPBLA_STATUS_SUCCESS => "SPBLA_STATUS_SUCCESS: operation completed successfully",
        SPBLA_STATUS_ERROR => "SPBLA_STATUS_ERROR: generic error",
        SPBLA_STATUS_DEVICE_NOT_PRESENT => {
            "SPBLA_STATUS_DEVICE_NOT_PRESENT: no compatible device in the system"
        }
        SPBLA_STATUS_DEVICE_ERROR => "SPBLA_STATUS_DEVICE_ERROR: device side error",
        SPBLA_STATUS_MEM_OP_FAILED => {
            "SPBLA_STATUS_MEM_OP_FAILED: failed to allocate memory on host or device"
        }
        SPBLA_STATUS_INVALID_ARGUMENT => "SPBLA_STATUS_INVALID_ARGUMENT: invalid argument",
        SPBLA_STATUS_INVALID_STATE => {
            "SPBLA_STATUS_INVALID_STATE: call is not possible in the current state"
        }
        SPBLA_STATUS_BACKEND_ERROR => {
            "SPBLA_STATUS_BACKEND_ERROR: failed to select supported backend for computations"
        }
        SPBLA_STATUS_NOT_IMPLEMENTED => "SPBLA_STATUS_NOT_IMPLEMENTED: feature is not implemented",
        _ => "Unknown spbla_Status code",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_names() {
        assert_eq!(status_name(SPBLA_STATUS_SUCCESS), "SPBLA_STATUS_SUCCESS");
        assert_eq!(
            status_name(SPBLA_STATUS_INVALID_ARGUMENT),
            "SPBLA_STATUS_INVALID_ARGUMENT"
        );
        assert_eq!(status_name(42), "SPBLA_STATUS_UNKNOWN");
    }

    #[test]
    fn test_status_messages_carry_name() {
        for status in SPBLA_STATUS_SUCCESS..=SPBLA_STATUS_NOT_IMPLEMENTED {
            assert!(status_to_string(status).starts_with(status_name(status)));
        }
    }
}
