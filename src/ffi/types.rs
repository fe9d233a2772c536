// FFI Layer: spbla C API Types
//
// Index and hint word types, the opaque matrix handle and the hint bit
// constants exactly as the native header declares them.

use std::os::raw::{c_char, c_int, c_ulonglong};

/// Matrix index type (unsigned 32-bit)
pub type spbla_Index = u32;

/// Hints word passed to every configurable call
pub type spbla_Hints = u32;

/// Opaque spbla_Matrix handle
#[repr(C)]
pub struct spbla_Matrix_t {
    _private: [u8; 0],
}

/// spbla_Matrix pointer
pub type spbla_Matrix = *mut spbla_Matrix_t;

pub const SPBLA_HINT_NO: spbla_Hints = 0;
pub const SPBLA_HINT_CPU_BACKEND: spbla_Hints = 1;
pub const SPBLA_HINT_CUDA_BACKEND: spbla_Hints = 2;
pub const SPBLA_HINT_OPENCL_BACKEND: spbla_Hints = 4;
pub const SPBLA_HINT_GPU_MEM_MANAGED: spbla_Hints = 8;
pub const SPBLA_HINT_VALUES_SORTED: spbla_Hints = 16;
pub const SPBLA_HINT_ACCUMULATE: spbla_Hints = 32;
pub const SPBLA_HINT_RELAXED_FINALIZE: spbla_Hints = 64;
pub const SPBLA_HINT_LOG_ERROR: spbla_Hints = 128;
pub const SPBLA_HINT_LOG_WARNING: spbla_Hints = 256;
pub const SPBLA_HINT_LOG_ALL: spbla_Hints = 512;
pub const SPBLA_HINT_NO_DUPLICATES: spbla_Hints = 1024;
pub const SPBLA_HINT_TIME_CHECK: spbla_Hints = 2048;

/// Device capabilities as filled in by `spbla_GetDeviceCaps`
#[repr(C)]
#[derive(Clone, Copy)]
#[allow(non_snake_case)]
pub struct spbla_DeviceCaps {
    pub name: [c_char; 256],
    pub cudaSupported: bool,
    pub openclSupported: bool,
    pub major: c_int,
    pub minor: c_int,
    pub warp: c_int,
    pub globalMemoryKiBs: c_ulonglong,
    pub sharedMemoryPerMultiProcKiBs: c_ulonglong,
    pub sharedMemoryPerBlockKiBs: c_ulonglong,
}

impl Default for spbla_DeviceCaps {
    fn default() -> Self {
        Self {
            name: [0; 256],
            cudaSupported: false,
            openclSupported: false,
            major: 0,
            minor: 0,
            warp: 0,
            globalMemoryKiBs: 0,
            sharedMemoryPerMultiProcKiBs: 0,
            sharedMemoryPerBlockKiBs: 0,
        }
    }
}
