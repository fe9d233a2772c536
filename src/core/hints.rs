// Core Layer: Operation Hints
//
// Hints modify the behavior of spbla operations. Each operation family has
// its own small config struct naming only the options it understands; the
// struct composes into the native bit word at the call boundary.
//
// Families:
// - Init: backend selection, relaxed finalize, managed GPU memory
// - Logging: verbosity of the native log
// - Build: input pairs sorted / free of duplicates
// - MxM: accumulate into the output, time check
// - Sub-matrix, transpose, reduce, kronecker, ewise add: time check

use crate::core::config::Backend;
use crate::ffi::types::*;
use std::ops::{BitOr, BitOrAssign};

/// A single named hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hint {
    CpuBackend,
    CudaBackend,
    OpenClBackend,
    GpuMemManaged,
    ValuesSorted,
    Accumulate,
    RelaxedFinalize,
    LogError,
    LogWarning,
    LogAll,
    NoDuplicates,
    TimeCheck,
}

impl Hint {
    /// Native bit for this hint
    pub fn bit(self) -> spbla_Hints {
        match self {
            Hint::CpuBackend => SPBLA_HINT_CPU_BACKEND,
            Hint::CudaBackend => SPBLA_HINT_CUDA_BACKEND,
            Hint::OpenClBackend => SPBLA_HINT_OPENCL_BACKEND,
            Hint::GpuMemManaged => SPBLA_HINT_GPU_MEM_MANAGED,
            Hint::ValuesSorted => SPBLA_HINT_VALUES_SORTED,
            Hint::Accumulate => SPBLA_HINT_ACCUMULATE,
            Hint::RelaxedFinalize => SPBLA_HINT_RELAXED_FINALIZE,
            Hint::LogError => SPBLA_HINT_LOG_ERROR,
            Hint::LogWarning => SPBLA_HINT_LOG_WARNING,
            Hint::LogAll => SPBLA_HINT_LOG_ALL,
            Hint::NoDuplicates => SPBLA_HINT_NO_DUPLICATES,
            Hint::TimeCheck => SPBLA_HINT_TIME_CHECK,
        }
    }
}

/// Set of hints, encoded as the native bit word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HintSet(spbla_Hints);

impl HintSet {
    /// Empty set (`SPBLA_HINT_NO`)
    pub const fn empty() -> Self {
        HintSet(SPBLA_HINT_NO)
    }

    /// Add `hint` when `enabled` holds
    pub fn with_if(self, hint: Hint, enabled: bool) -> Self {
        if enabled {
            self.with(hint)
        } else {
            self
        }
    }

    /// Add `hint`
    pub fn with(self, hint: Hint) -> Self {
        HintSet(self.0 | hint.bit())
    }

    /// Check if `hint` is present
    pub fn contains(self, hint: Hint) -> bool {
        self.0 & hint.bit() != 0
    }

    /// Native bit word
    pub fn bits(self) -> spbla_Hints {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == SPBLA_HINT_NO
    }
}

impl From<Hint> for HintSet {
    fn from(hint: Hint) -> Self {
        HintSet::empty().with(hint)
    }
}

impl BitOr<Hint> for HintSet {
    type Output = HintSet;

    fn bitor(self, hint: Hint) -> HintSet {
        self.with(hint)
    }
}

impl BitOr for HintSet {
    type Output = HintSet;

    fn bitor(self, other: HintSet) -> HintSet {
        HintSet(self.0 | other.0)
    }
}

impl BitOrAssign<Hint> for HintSet {
    fn bitor_assign(&mut self, hint: Hint) {
        self.0 |= hint.bit();
    }
}

/// Per-family hint configuration
pub trait OperationHints {
    /// Compose the configured options into a hint set
    fn hint_set(&self) -> HintSet;
}

/// Compose optional operation hints, `None` meaning no flags
pub fn bits_of<H: OperationHints>(hints: Option<&H>) -> spbla_Hints {
    hints.map(|h| h.hint_set().bits()).unwrap_or(SPBLA_HINT_NO)
}

/// Library initialization hints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitHints {
    /// Forced backend, `Backend::Default` lets the engine choose
    pub backend: Backend,
    /// Tolerate matrices not freed before finalize
    pub relaxed_release: bool,
    /// Use managed (unified) memory on GPU backends
    pub managed_memory: bool,
}

impl Default for InitHints {
    fn default() -> Self {
        Self {
            backend: Backend::Default,
            relaxed_release: true,
            managed_memory: false,
        }
    }
}

impl OperationHints for InitHints {
    fn hint_set(&self) -> HintSet {
        let set = match self.backend {
            Backend::Default => HintSet::empty(),
            Backend::Cpu => Hint::CpuBackend.into(),
            Backend::Cuda => Hint::CudaBackend.into(),
            Backend::OpenCl => Hint::OpenClBackend.into(),
        };
        set.with_if(Hint::RelaxedFinalize, self.relaxed_release)
            .with_if(Hint::GpuMemManaged, self.managed_memory)
    }
}

/// Native logging verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogHints {
    pub all: bool,
    pub error: bool,
    pub warning: bool,
}

impl Default for LogHints {
    fn default() -> Self {
        Self {
            all: true,
            error: false,
            warning: false,
        }
    }
}

impl OperationHints for LogHints {
    fn hint_set(&self) -> HintSet {
        HintSet::empty()
            .with_if(Hint::LogAll, self.all)
            .with_if(Hint::LogError, self.error)
            .with_if(Hint::LogWarning, self.warning)
    }
}

/// Build-from-pairs hints
///
/// Both options are promises about the input. Passing them for data that is
/// not actually sorted or deduplicated is undefined on native engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildHints {
    /// Pairs are already in row-major order
    pub sorted: bool,
    /// Pairs contain no duplicates
    pub no_duplicates: bool,
}

impl BuildHints {
    /// Sorted and duplicate-free input
    pub fn sorted_unique() -> Self {
        Self {
            sorted: true,
            no_duplicates: true,
        }
    }
}

impl OperationHints for BuildHints {
    fn hint_set(&self) -> HintSet {
        HintSet::empty()
            .with_if(Hint::ValuesSorted, self.sorted)
            .with_if(Hint::NoDuplicates, self.no_duplicates)
    }
}

/// Matrix-matrix multiplication hints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MxmHints {
    /// Union the product into the existing output (`C |= A x B`)
    pub accumulate: bool,
    /// Diagnostic time check, never changes the result
    pub time_check: bool,
}

impl MxmHints {
    /// Create hints with accumulation enabled
    pub fn accumulate() -> Self {
        Self {
            accumulate: true,
            ..Self::default()
        }
    }

    /// Set accumulate
    pub fn set_accumulate(&mut self, value: bool) -> &mut Self {
        self.accumulate = value;
        self
    }

    /// Set time check
    pub fn set_time_check(&mut self, value: bool) -> &mut Self {
        self.time_check = value;
        self
    }
}

impl OperationHints for MxmHints {
    fn hint_set(&self) -> HintSet {
        HintSet::empty()
            .with_if(Hint::Accumulate, self.accumulate)
            .with_if(Hint::TimeCheck, self.time_check)
    }
}

/// Families whose only option is the diagnostic time check
macro_rules! time_check_hints {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
            pub struct $name {
                /// Diagnostic time check, never changes the result
                pub time_check: bool,
            }

            impl $name {
                /// Create hints with the time check enabled
                pub fn time_checked() -> Self {
                    Self { time_check: true }
                }
            }

            impl OperationHints for $name {
                fn hint_set(&self) -> HintSet {
                    HintSet::empty().with_if(Hint::TimeCheck, self.time_check)
                }
            }
        )*
    };
}

time_check_hints!(
    /// Sub-matrix extraction hints
    SubMatrixHints,
    /// Transpose hints
    TransposeHints,
    /// Row reduction hints
    ReduceHints,
    /// Kronecker product hints
    KroneckerHints,
    /// Element-wise addition hints
    EwiseAddHints,
);
