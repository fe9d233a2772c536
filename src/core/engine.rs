// Core Layer: Engine Context
//
// An `Engine` is an initialized spbla engine plus the lock that serializes
// every call into it. Matrices keep a clone of the engine they were created
// on, so the engine outlives all of its matrices and is finalized at most
// once: explicitly through `finalize`, or when the last clone is dropped.

use crate::core::config::{Backend, EngineConfig, LibrarySource};
use crate::core::error::{check_status, Result, SpblaError};
use crate::core::hints::{HintSet, InitHints, OperationHints};
use crate::ffi::api::RawEngine;
use crate::ffi::error::spbla_Status;
use crate::ffi::library::{discover_library, SpblaLibrary};
use crate::ffi::types::{spbla_DeviceCaps, spbla_Matrix};
use crate::host::HostEngine;
use std::ffi::{CStr, CString};
use std::fmt;
use std::os::raw::{c_char, c_int};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Set while an engine backed by the native library is alive
static NATIVE_ENGINE_LIVE: AtomicBool = AtomicBool::new(false);

/// Reservation of the single native engine slot, released on drop unless kept
struct NativeClaim {
    armed: bool,
}

impl NativeClaim {
    fn acquire() -> Result<Self> {
        NATIVE_ENGINE_LIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| NativeClaim { armed: true })
            .map_err(|_| {
                log::warn!("A native spbla engine is already initialized in this process");
                SpblaError::InvalidState
            })
    }

    fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for NativeClaim {
    fn drop(&mut self) {
        if self.armed {
            NATIVE_ENGINE_LIVE.store(false, Ordering::Release);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Ready,
    Finalized,
}

struct EngineInner {
    raw: Box<dyn RawEngine>,
    state: Mutex<EngineState>,
    backend: Backend,
    init_hints: HintSet,
    native: bool,
}

impl EngineInner {
    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn shutdown(&self) -> Result<()> {
        let mut state = self.lock_state();
        if *state == EngineState::Finalized {
            return Err(SpblaError::InvalidState);
        }
        *state = EngineState::Finalized;

        let status = unsafe { self.raw.finalize() };
        if self.native {
            NATIVE_ENGINE_LIVE.store(false, Ordering::Release);
        }
        log::info!("spbla engine {} finalized", self.raw.describe());
        check_status(status)
    }
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        if *self.lock_state() == EngineState::Ready {
            if let Err(err) = self.shutdown() {
                log::warn!("Implicit spbla finalize failed: {}", err);
            }
        }
    }
}

/// Device capabilities reported by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCaps {
    pub name: String,
    pub cuda_supported: bool,
    pub opencl_supported: bool,
    pub major: i32,
    pub minor: i32,
    pub warp: i32,
    pub global_memory_kib: u64,
    pub shared_memory_per_multiproc_kib: u64,
    pub shared_memory_per_block_kib: u64,
}

impl From<&spbla_DeviceCaps> for DeviceCaps {
    fn from(caps: &spbla_DeviceCaps) -> Self {
        let name: Vec<u8> = caps
            .name
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| c as u8)
            .collect();
        Self {
            name: String::from_utf8_lossy(&name).into_owned(),
            cuda_supported: caps.cudaSupported,
            opencl_supported: caps.openclSupported,
            major: caps.major,
            minor: caps.minor,
            warp: caps.warp,
            global_memory_kib: caps.globalMemoryKiBs,
            shared_memory_per_multiproc_kib: caps.sharedMemoryPerMultiProcKiBs,
            shared_memory_per_block_kib: caps.sharedMemoryPerBlockKiBs,
        }
    }
}

/// Handle to an initialized spbla engine
///
/// Cloning is cheap and every clone refers to the same engine.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Load, configure and initialize an engine
    ///
    /// Only one engine backed by the native library may be live at a time;
    /// a second one fails with `InvalidState`. Host engines are independent.
    pub fn initialize(config: &EngineConfig) -> Result<Engine> {
        let claim = match config.source {
            LibrarySource::Host => None,
            _ => Some(NativeClaim::acquire()?),
        };

        let raw: Box<dyn RawEngine> = match &config.source {
            LibrarySource::Host => Box::new(HostEngine::new()),
            LibrarySource::Path(path) => Box::new(SpblaLibrary::load(path)?),
            LibrarySource::Discover(dir) => Box::new(SpblaLibrary::load(&discover_library(dir)?)?),
        };
        log::info!("Using spbla engine {}", raw.describe());

        if let Some(logging) = &config.logging {
            let file = CString::new(logging.file.to_string_lossy().as_bytes())
                .map_err(|_| SpblaError::EngineInit(Box::new(SpblaError::InvalidArgument)))?;
            let bits = logging.level.hint_set().bits();
            check_status(unsafe { raw.setup_logging(file.as_ptr(), bits) })
                .map_err(|err| SpblaError::EngineInit(Box::new(err)))?;
            log::debug!("spbla native log: {}", logging.file.display());
        }

        let init_hints = InitHints {
            backend: config.backend,
            relaxed_release: true,
            managed_memory: config.managed_memory,
        }
        .hint_set();
        log::debug!(
            "Initializing spbla (backend {}, hints {:#x})",
            config.backend.name(),
            init_hints.bits()
        );
        check_status(unsafe { raw.initialize(init_hints.bits()) }).map_err(|err| {
            log::warn!("spbla initialization failed: {}", err);
            SpblaError::EngineInit(Box::new(err))
        })?;

        let native = claim.is_some();
        if let Some(claim) = claim {
            claim.keep();
        }
        log::info!("spbla engine ready (backend {})", config.backend.name());

        Ok(Engine {
            inner: Arc::new(EngineInner {
                raw,
                state: Mutex::new(EngineState::Ready),
                backend: config.backend,
                init_hints,
                native,
            }),
        })
    }

    /// Finalize the engine; every later call fails with `InvalidState`
    ///
    /// The engine is unusable afterwards even if the native finalize fails.
    pub fn finalize(&self) -> Result<()> {
        self.inner.shutdown()
    }

    pub fn is_finalized(&self) -> bool {
        *self.inner.lock_state() == EngineState::Finalized
    }

    /// Backend requested at initialization
    pub fn backend(&self) -> Backend {
        self.inner.backend
    }

    /// Hints passed to the native initialize
    pub fn init_hints(&self) -> HintSet {
        self.inner.init_hints
    }

    /// Whether this engine runs the dynamically loaded library
    pub fn is_native(&self) -> bool {
        self.inner.native
    }

    pub fn describe(&self) -> String {
        self.inner.raw.describe()
    }

    /// Whether two handles refer to the same engine
    pub fn same_engine(&self, other: &Engine) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Engine version as (major, minor, sub)
    pub fn version(&self) -> Result<(i32, i32, i32)> {
        let (mut major, mut minor, mut sub): (c_int, c_int, c_int) = (0, 0, 0);
        self.call("get_version", |raw| unsafe {
            raw.get_version(&mut major, &mut minor, &mut sub)
        })?;
        Ok((major, minor, sub))
    }

    /// Human readable description of the engine implementation
    ///
    /// Safe to query after finalize: the text is static for the loaded library.
    pub fn about(&self) -> Result<String> {
        self.info_text("get_about", |raw| unsafe { raw.get_about() })
    }

    /// License text of the engine implementation
    pub fn license_info(&self) -> Result<String> {
        self.info_text("get_license_info", |raw| unsafe { raw.get_license_info() })
    }

    fn info_text<F>(&self, op: &str, f: F) -> Result<String>
    where
        F: FnOnce(&dyn RawEngine) -> *const c_char,
    {
        let _state = self.inner.lock_state();
        let text = f(self.inner.raw.as_ref());
        if text.is_null() {
            log::debug!("spbla {} returned no text", op);
            return Err(SpblaError::Error);
        }
        Ok(unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned())
    }

    /// Capabilities of the selected device
    pub fn device_caps(&self) -> Result<DeviceCaps> {
        let mut caps = spbla_DeviceCaps::default();
        self.call("get_device_caps", |raw| unsafe { raw.get_device_caps(&mut caps) })?;
        Ok(DeviceCaps::from(&caps))
    }

    /// Run one native call inside the engine's critical section
    ///
    /// Fails with `InvalidState` without touching the engine once finalized.
    pub(crate) fn call<F>(&self, op: &str, f: F) -> Result<()>
    where
        F: FnOnce(&dyn RawEngine) -> spbla_Status,
    {
        let state = self.inner.lock_state();
        if *state != EngineState::Ready {
            log::debug!("spbla {} rejected: engine finalized", op);
            return Err(SpblaError::InvalidState);
        }
        let status = f(self.inner.raw.as_ref());
        drop(state);

        check_status(status).map_err(|err| {
            log::debug!("spbla {} failed: {}", op, err);
            err
        })
    }

    /// Free a matrix handle, skipped when the engine is already finalized
    pub(crate) fn release(&self, handle: spbla_Matrix) {
        let state = self.inner.lock_state();
        if *state != EngineState::Ready {
            log::trace!("Skipping release of {:p}: engine finalized", handle);
            return;
        }
        let status = unsafe { self.inner.raw.matrix_free(handle) };
        if let Err(err) = check_status(status) {
            log::warn!("Failed to release matrix {:p}: {}", handle, err);
        } else {
            log::trace!("Released matrix {:p}", handle);
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("engine", &self.inner.raw.describe())
            .field("backend", &self.inner.backend)
            .field("state", &*self.inner.lock_state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::types::SPBLA_HINT_RELAXED_FINALIZE;

    #[test]
    fn test_host_lifecycle() {
        let engine = Engine::initialize(&EngineConfig::host()).unwrap();
        assert!(!engine.is_native());
        assert!(!engine.is_finalized());
        assert_eq!(engine.describe(), "host");
        assert_eq!(engine.init_hints().bits(), SPBLA_HINT_RELAXED_FINALIZE);

        engine.finalize().unwrap();
        assert!(engine.is_finalized());
        assert_eq!(engine.finalize(), Err(SpblaError::InvalidState));
    }

    #[test]
    fn test_calls_after_finalize_fail() {
        let engine = Engine::initialize(&EngineConfig::host()).unwrap();
        engine.finalize().unwrap();
        assert_eq!(engine.version(), Err(SpblaError::InvalidState));
    }

    #[test]
    fn test_version() {
        let engine = Engine::initialize(&EngineConfig::host()).unwrap();
        let (major, minor, sub) = engine.version().unwrap();
        assert!(major >= 0 && minor >= 0 && sub >= 0);
    }

    #[test]
    fn test_about_and_license_info() {
        let engine = Engine::initialize(&EngineConfig::host()).unwrap();
        assert!(engine.about().unwrap().contains("host engine"));
        assert_eq!(engine.license_info().unwrap(), "MIT License");

        engine.finalize().unwrap();
        assert!(!engine.about().unwrap().is_empty());
    }

    #[test]
    fn test_forced_gpu_backend_fails_initialization() {
        let config = EngineConfig::host().backend(Backend::Cuda);
        let err = Engine::initialize(&config).unwrap_err();
        assert_eq!(err, SpblaError::EngineInit(Box::new(SpblaError::DeviceNotPresent)));
    }

    #[test]
    fn test_cpu_backend_and_logging() {
        let config = EngineConfig::host()
            .backend(Backend::Cpu)
            .logging("spbla-host.log", Default::default());
        let engine = Engine::initialize(&config).unwrap();
        assert_eq!(engine.backend(), Backend::Cpu);
    }

    #[test]
    fn test_missing_library_releases_native_slot() {
        let config = EngineConfig::library("/nonexistent/libspbla.so");
        for _ in 0..2 {
            match Engine::initialize(&config) {
                Err(SpblaError::EngineLoad(_)) => {}
                other => panic!("expected EngineLoad, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_device_caps_on_host() {
        let engine = Engine::initialize(&EngineConfig::host()).unwrap();
        assert_eq!(engine.device_caps(), Err(SpblaError::DeviceNotPresent));
    }

    #[test]
    fn test_clones_share_the_engine() {
        let a = Engine::initialize(&EngineConfig::host()).unwrap();
        let b = Engine::initialize(&EngineConfig::host()).unwrap();
        let a2 = a.clone();
        assert!(a.same_engine(&a2));
        assert!(!a.same_engine(&b));

        a2.finalize().unwrap();
        assert!(a.is_finalized());
        assert!(!b.is_finalized());
    }

    #[test]
    fn test_device_caps_conversion() {
        let mut raw = spbla_DeviceCaps::default();
        for (slot, byte) in raw.name.iter_mut().zip(b"Test GPU") {
            *slot = *byte as std::os::raw::c_char;
        }
        raw.cudaSupported = true;
        raw.warp = 32;
        let caps = DeviceCaps::from(&raw);
        assert_eq!(caps.name, "Test GPU");
        assert!(caps.cuda_supported);
        assert!(!caps.opencl_supported);
        assert_eq!(caps.warp, 32);
    }
}
