//! Interfaces to the external camera and face inference collaborators.
//!
//! The inference engine is expensive to load and shared between sessions.
//! [`SharedEngine`] hands out [`EngineLease`]s: while any lease is alive every
//! acquisition returns the same instance, and once the last lease is dropped
//! the engine is released and the next acquisition loads it again.

use crate::{landmarks::DetectedFaces, state::LivenessState, Error, Result};
use log::{debug, info};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// A frame together with its capture time
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame<F> {
    /// Frame payload, opaque to the liveness core
    pub frame: F,
    /// Capture time in milliseconds
    pub timestamp_ms: u64,
}

/// Source of frames, typically a camera
pub trait FrameSource {
    /// Frame payload type
    type Frame;

    /// Read the next frame; `None` when the stream has ended
    fn next_frame(&mut self) -> Result<Option<CapturedFrame<Self::Frame>>>;

    /// Show the latest session state to the person in front of the source
    fn present(&mut self, _state: &LivenessState) {}

    /// Release the underlying device
    fn release(&mut self);
}

/// Face landmark inference engine
pub trait FaceLandmarker {
    /// Frame payload type accepted by the engine
    type Frame;

    /// Detect faces, landmarks and expression scores in one frame
    fn detect_faces(&mut self, frame: &Self::Frame, timestamp_ms: u64) -> Result<DetectedFaces>;
}

/// Lease-scoped shared handle to an inference engine
pub struct SharedEngine<E> {
    slot: Mutex<Weak<Mutex<E>>>,
}

impl<E> SharedEngine<E> {
    /// Create an empty shared handle; nothing is loaded until the first acquisition
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Weak::new()),
        }
    }

    /// Acquire a lease, loading the engine only if no lease is outstanding.
    ///
    /// The loader runs without the slot locked, so it may itself use this
    /// handle. If another acquisition stores an engine while the loader runs,
    /// that engine is leased and the freshly loaded one is discarded.
    ///
    /// # Errors
    ///
    /// Returns the loader's error, or an error if the slot lock is poisoned
    pub fn acquire_with<F>(&self, load: F) -> Result<EngineLease<E>>
    where
        F: FnOnce() -> Result<E>,
    {
        if let Some(engine) = self.live_engine()? {
            debug!("Reusing loaded inference engine");
            return Ok(EngineLease { engine });
        }

        info!("Loading inference engine");
        let loaded = load()?;

        let mut slot = self.slot.lock().map_err(|_| Error::LockPoisoned)?;
        if let Some(engine) = slot.upgrade() {
            debug!("Inference engine loaded concurrently, discarding duplicate");
            return Ok(EngineLease { engine });
        }
        let engine = Arc::new(Mutex::new(loaded));
        *slot = Arc::downgrade(&engine);
        Ok(EngineLease { engine })
    }

    fn live_engine(&self) -> Result<Option<Arc<Mutex<E>>>> {
        let slot = self.slot.lock().map_err(|_| Error::LockPoisoned)?;
        Ok(slot.upgrade())
    }

    /// Number of outstanding leases
    #[must_use]
    pub fn active_leases(&self) -> usize {
        self.slot.lock().map(|slot| slot.strong_count()).unwrap_or(0)
    }

    /// Whether an engine instance is currently loaded
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.active_leases() > 0
    }
}

impl<E> Default for SharedEngine<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// A lease on the shared engine; the engine is released when the last lease drops
pub struct EngineLease<E> {
    engine: Arc<Mutex<E>>,
}

impl<E> EngineLease<E> {
    /// Lock the engine for use
    ///
    /// # Errors
    ///
    /// Returns an error if a previous holder panicked while using the engine
    pub fn lock(&self) -> Result<MutexGuard<'_, E>> {
        self.engine.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Whether two leases refer to the same engine instance
    #[must_use]
    pub fn same_engine(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.engine, &other.engine)
    }
}

impl<E> Clone for EngineLease<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<E: FaceLandmarker> EngineLease<E> {
    /// Run face detection on the leased engine
    ///
    /// # Errors
    ///
    /// Returns the engine's error or a lock error
    pub fn detect_faces(&self, frame: &E::Frame, timestamp_ms: u64) -> Result<DetectedFaces> {
        self.lock()?.detect_faces(frame, timestamp_ms)
    }
}
