// Core Layer: Process-wide Library
//
// Lazily initialized global engine for code that does not pass an `Engine`
// around. The first `engine()` call initializes from the environment; a
// failed initialization is remembered and reported to every later caller.
//
// Statics are never dropped, so the global engine is only finalized by
// `Library::finalize` or by dropping the `LibraryGuard` from `initialize`.

use crate::core::config::EngineConfig;
use crate::core::engine::Engine;
use crate::core::error::{Result, SpblaError};
use std::ops::Deref;
use std::sync::{Mutex, MutexGuard, PoisonError};

enum LibraryState {
    Uninitialized,
    Ready(Engine),
    Failed(SpblaError),
    Finalized,
}

lazy_static::lazy_static! {
    static ref LIBRARY: Mutex<LibraryState> = Mutex::new(LibraryState::Uninitialized);
}

fn library() -> MutexGuard<'static, LibraryState> {
    LIBRARY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-wide spbla engine
///
/// Teardown is tied to the [`LibraryGuard`] returned by `initialize`: hold
/// it for the life of the program (typically in `main`) and the engine is
/// finalized when it drops. When the engine is instead started lazily
/// through `engine()`, `get_or_initialize` or `Matrix::empty`, nothing
/// finalizes it at exit and `Library::finalize` must be called explicitly.
pub struct Library;

impl Library {
    /// Initialize the global engine with an explicit configuration
    ///
    /// Fails with `InvalidState` unless the library is still uninitialized.
    /// Dropping the returned guard finalizes the library.
    pub fn initialize(config: &EngineConfig) -> Result<LibraryGuard> {
        let mut state = library();
        match *state {
            LibraryState::Uninitialized => {
                Self::start(&mut state, config).map(|engine| LibraryGuard { engine })
            }
            _ => Err(SpblaError::InvalidState),
        }
    }

    /// Return the global engine, initializing it with `config` if needed
    pub fn get_or_initialize(config: &EngineConfig) -> Result<Engine> {
        let mut state = library();
        if let LibraryState::Uninitialized = *state {
            return Self::start(&mut state, config);
        }
        Self::current(&state)
    }

    /// Return the global engine, initializing it from the environment
    pub fn engine() -> Result<Engine> {
        let mut state = library();
        if let LibraryState::Uninitialized = *state {
            return Self::start(&mut state, &EngineConfig::from_env());
        }
        Self::current(&state)
    }

    /// Whether the global engine is initialized and not finalized
    pub fn is_initialized() -> bool {
        matches!(*library(), LibraryState::Ready(_))
    }

    /// Finalize the global engine
    ///
    /// Matrices still holding the engine can no longer be used, and the
    /// library cannot be initialized again in this process.
    pub fn finalize() -> Result<()> {
        let mut state = library();
        match std::mem::replace(&mut *state, LibraryState::Finalized) {
            LibraryState::Ready(engine) => engine.finalize(),
            LibraryState::Finalized => Err(SpblaError::InvalidState),
            LibraryState::Uninitialized => {
                log::debug!("spbla library finalized before first use");
                Ok(())
            }
            LibraryState::Failed(err) => {
                log::debug!("Finalizing spbla library after failed initialization: {}", err);
                Ok(())
            }
        }
    }

    fn current(state: &LibraryState) -> Result<Engine> {
        match state {
            LibraryState::Ready(engine) => Ok(engine.clone()),
            LibraryState::Failed(err) => Err(err.clone()),
            LibraryState::Uninitialized | LibraryState::Finalized => Err(SpblaError::InvalidState),
        }
    }

    fn start(state: &mut LibraryState, config: &EngineConfig) -> Result<Engine> {
        match Engine::initialize(config) {
            Ok(engine) => {
                *state = LibraryState::Ready(engine.clone());
                Ok(engine)
            }
            Err(err) => {
                log::warn!("spbla library initialization failed: {}", err);
                *state = LibraryState::Failed(err.clone());
                Err(err)
            }
        }
    }
}

/// Owner of the global engine returned by [`Library::initialize`]
///
/// Dereferences to the engine. On drop the library is finalized, unless it
/// was already finalized explicitly.
#[derive(Debug)]
pub struct LibraryGuard {
    engine: Engine,
}

impl LibraryGuard {
    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

impl Deref for LibraryGuard {
    type Target = Engine;

    fn deref(&self) -> &Engine {
        &self.engine
    }
}

impl Drop for LibraryGuard {
    fn drop(&mut self) {
        let mut state = library();
        let owned = matches!(&*state, LibraryState::Ready(engine) if engine.same_engine(&self.engine));
        if !owned {
            log::trace!("spbla library already finalized");
            return;
        }
        *state = LibraryState::Finalized;
        drop(state);

        match self.engine.finalize() {
            Ok(()) => log::debug!("spbla library finalized by its guard"),
            Err(err) => log::warn!("spbla library finalize on guard drop failed: {}", err),
        }
    }
}
