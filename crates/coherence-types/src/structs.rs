//! Core entity structs: the field record, participants, ceremony effects.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{EmotionalState, Harmony, ParticipantKind};
use crate::ids::ParticipantId;

/// Milliseconds in one hour, for lifetime arithmetic.
const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Clamp a value into `[0, 1]`.
///
/// Non-finite input (`NaN`) clamps to `0.0`; infinities clamp to the nearest
/// bound.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// The shared aggregate state of the field.
///
/// Owned exclusively by the core's field store. Copies handed out by
/// snapshot operations are independent values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Primary scalar health metric, always in `[0, 1]` once committed.
    pub coherence: f64,
    /// Named sub-scalars, each in `[0, 1]` once committed.
    pub harmonies: BTreeMap<Harmony, f64>,
    /// Categorical mood tag.
    pub emotional_state: EmotionalState,
    /// Free-form descriptive geometry tag. No behavioral effect.
    pub geometry: String,
}

impl Field {
    /// Create a field with the given coherence and every harmony set to
    /// `harmony_level`. Values are clamped.
    pub fn new(coherence: f64, harmony_level: f64, geometry: impl Into<String>) -> Self {
        let harmonies = Harmony::ALL
            .iter()
            .map(|h| (*h, clamp_unit(harmony_level)))
            .collect();
        Self {
            coherence: clamp_unit(coherence),
            harmonies,
            emotional_state: EmotionalState::default(),
            geometry: geometry.into(),
        }
    }

    /// Clamp coherence and every harmony into `[0, 1]`.
    pub fn clamp(&mut self) {
        self.coherence = clamp_unit(self.coherence);
        for value in self.harmonies.values_mut() {
            *value = clamp_unit(*value);
        }
    }

    /// Whether every numeric entry is inside `[0, 1]`.
    pub fn is_within_bounds(&self) -> bool {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        in_unit(self.coherence) && self.harmonies.values().all(|v| in_unit(*v))
    }

    /// Current value of a harmony, or `0.0` if the axis is absent.
    pub fn harmony(&self, harmony: Harmony) -> f64 {
        self.harmonies.get(&harmony).copied().unwrap_or(0.0)
    }

    /// Multiply a harmony by `factor` if the axis is present.
    pub fn scale_harmony(&mut self, harmony: Harmony, factor: f64) {
        if let Some(value) = self.harmonies.get_mut(&harmony) {
            *value *= factor;
        }
    }
}

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

/// Creation payload for a participant, supplied by the caller layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    /// What kind of resource this participant is.
    pub kind: ParticipantKind,
    /// Display name.
    pub name: String,
    /// Immutable purpose statement.
    pub purpose: String,
    /// The participant's own coherence at integration time.
    pub own_coherence: f64,
    /// Domain frequency in hertz.
    pub frequency: u32,
}

/// A participant integrated into the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Unique identifier assigned at integration.
    pub id: ParticipantId,
    /// What kind of resource this participant is. Immutable.
    pub kind: ParticipantKind,
    /// Display name. Immutable.
    pub name: String,
    /// When the participant was integrated.
    pub birth_time: DateTime<Utc>,
    /// Purpose statement. Immutable.
    pub purpose: String,
    /// The participant's own coherence. Not clamped by the registry.
    pub own_coherence: f64,
    /// Domain frequency in hertz.
    pub frequency: u32,
}

impl Participant {
    /// Build a participant from a creation record.
    pub fn from_record(id: ParticipantId, record: ParticipantRecord, birth_time: DateTime<Utc>) -> Self {
        Self {
            id,
            kind: record.kind,
            name: record.name,
            birth_time,
            purpose: record.purpose,
            own_coherence: record.own_coherence,
            frequency: record.frequency,
        }
    }

    /// Hours elapsed between birth and `now`, never negative.
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        let millis = now.signed_duration_since(self.birth_time).num_milliseconds();
        (millis.max(0) as f64) / MILLIS_PER_HOUR
    }
}

// ---------------------------------------------------------------------------
// Ceremony effects
// ---------------------------------------------------------------------------

/// A one-shot composite mutation triggered from outside the core.
///
/// Every part is optional; an all-`None` effect is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CeremonyEffect {
    /// Additive coherence boost (result is clamped).
    #[serde(default)]
    pub coherence_boost: Option<f64>,
    /// Emotional state to force until the next heartbeat.
    #[serde(default)]
    pub emotional_reset: Option<EmotionalState>,
    /// Fraction of current wisdom shared with every participant.
    #[serde(default)]
    pub wisdom_share_fraction: Option<f64>,
}
