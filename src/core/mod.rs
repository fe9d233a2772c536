// Core Layer: Safe spbla API
//
// Error translation, configuration, engine lifecycle and the owned matrix
// handle built on top of the ffi layer.

pub mod config;
pub mod engine;
pub mod error;
pub mod handles;
pub mod hints;
pub mod library;
pub mod matrix;

// Re-export commonly used types
pub use config::{Backend, EngineConfig, LibrarySource, LoggingConfig};
pub use engine::{DeviceCaps, Engine};
pub use error::{Result, SpblaError};
pub use handles::HandleRegistry;
pub use hints::{
    BuildHints, EwiseAddHints, Hint, HintSet, InitHints, KroneckerHints, LogHints, MxmHints,
    OperationHints, ReduceHints, SubMatrixHints, TransposeHints,
};
pub use library::{Library, LibraryGuard};
pub use matrix::Matrix;
