//! Participant registry: the set of participants integrated into the field.
//!
//! The registry only stores records. The field and wisdom side effects of
//! integration and release live on [`FieldContext`](crate::context::FieldContext),
//! which acquires the registry lock first and the field lock second.

use std::collections::BTreeMap;

use coherence_types::{Participant, ParticipantId};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe map of participant ID to participant.
///
/// Enumeration takes the read lock, so it never observes a half-applied
/// insertion or removal.
#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    inner: RwLock<BTreeMap<ParticipantId, Participant>>,
}

impl ParticipantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a participant, replacing any previous entry with the same ID.
    pub fn insert(&self, participant: Participant) {
        self.inner.write().insert(participant.id, participant);
    }

    /// Remove and return a participant.
    pub fn remove(&self, id: ParticipantId) -> Option<Participant> {
        self.inner.write().remove(&id)
    }

    /// A copy of one participant.
    pub fn get(&self, id: ParticipantId) -> Option<Participant> {
        self.inner.read().get(&id).cloned()
    }

    /// Whether a participant is registered.
    pub fn contains(&self, id: ParticipantId) -> bool {
        self.inner.read().contains_key(&id)
    }

    /// A consistent point-in-time copy of every participant, ordered by ID.
    pub fn enumerate(&self) -> Vec<Participant> {
        self.inner.read().values().cloned().collect()
    }

    /// Number of registered participants.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Mutate one participant in place.
    ///
    /// Returns the updated copy, or `None` if the ID is unknown.
    pub fn update<F>(&self, id: ParticipantId, mutate: F) -> Option<Participant>
    where
        F: FnOnce(&mut Participant),
    {
        let mut guard = self.inner.write();
        let participant = guard.get_mut(&id)?;
        mutate(participant);
        Some(participant.clone())
    }

    /// Mutate every participant under one write lock. Returns the count.
    pub fn update_all<F>(&self, mut mutate: F) -> usize
    where
        F: FnMut(&mut Participant),
    {
        let mut guard = self.inner.write();
        for participant in guard.values_mut() {
            mutate(participant);
        }
        guard.len()
    }

    /// Take the read lock for a multi-step operation.
    ///
    /// Callers that also touch the field or wisdom must take this lock first.
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, BTreeMap<ParticipantId, Participant>> {
        self.inner.read()
    }

    /// Take the write lock for a multi-step operation.
    ///
    /// Callers that also touch the field or wisdom must take this lock first.
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<ParticipantId, Participant>> {
        self.inner.write()
    }
}
