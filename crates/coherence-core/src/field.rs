//! The shared field record and its locking discipline.
//!
//! [`FieldStore`] owns the single [`Field`] value. Every mutation runs under
//! the exclusive lock against a working copy; the copy is clamped into
//! `[0, 1]` and only then replaces the stored value. A transform that fails
//! or panics never commits anything, and because the lock is
//! non-poisoning, the store stays usable afterwards.

use coherence_types::{EmotionalState, Field};
use parking_lot::RwLock;

/// Thread-safe owner of the shared [`Field`].
#[derive(Debug)]
pub struct FieldStore {
    inner: RwLock<Field>,
}

impl FieldStore {
    /// Create a store holding `field`, clamped into range.
    pub fn new(mut field: Field) -> Self {
        field.clamp();
        Self {
            inner: RwLock::new(field),
        }
    }

    /// Return an independent copy of the committed field.
    pub fn snapshot(&self) -> Field {
        self.inner.read().clone()
    }

    /// Current committed coherence.
    pub fn coherence(&self) -> f64 {
        self.inner.read().coherence
    }

    /// Apply `transform` atomically and return the committed value.
    ///
    /// The transform sees a working copy. After it returns, coherence and
    /// every harmony are clamped into `[0, 1]` and the copy replaces the
    /// stored field. If the transform panics the stored field is untouched.
    pub fn apply_delta<F>(&self, transform: F) -> Field
    where
        F: FnOnce(&mut Field),
    {
        let mut guard = self.inner.write();
        let mut working = guard.clone();
        transform(&mut working);
        working.clamp();
        *guard = working.clone();
        working
    }

    /// Apply a fallible transform atomically.
    ///
    /// On `Ok` the clamped working copy is committed; on `Err` it is
    /// discarded and the stored field is unchanged.
    ///
    /// # Errors
    ///
    /// Returns whatever error `transform` returns.
    pub fn try_apply_delta<F, R, E>(&self, transform: F) -> Result<R, E>
    where
        F: FnOnce(&mut Field) -> Result<R, E>,
    {
        let mut guard = self.inner.write();
        let mut working = guard.clone();
        let out = transform(&mut working)?;
        working.clamp();
        *guard = working;
        Ok(out)
    }

    /// Overwrite the emotional state.
    pub fn set_emotional_state(&self, state: EmotionalState) {
        self.inner.write().emotional_state = state;
    }

    /// Overwrite the geometry tag.
    pub fn set_geometry(&self, geometry: impl Into<String>) {
        self.inner.write().geometry = geometry.into();
    }
}
