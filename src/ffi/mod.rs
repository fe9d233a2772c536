// FFI Layer: spbla C API Module
//
// C ABI types and status codes of the spbla engine, the `RawEngine` call
// surface and the dynamic loader for the native library.

pub mod api;
pub mod error;
pub mod library;
pub mod types;

// Re-export commonly used types
pub use api::RawEngine;
pub use error::*;
pub use library::{discover_library, SpblaLibrary};
pub use types::{spbla_DeviceCaps, spbla_Hints, spbla_Index, spbla_Matrix};
