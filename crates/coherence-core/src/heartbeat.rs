//! The heartbeat: the emitter that keeps the field honest.
//!
//! Every beat recomputes coherence as the true mean of participant own
//! coherence, derives the emotional state from that value, and evaluates
//! the evolution ladder once. An empty registry leaves coherence alone but
//! still re-derives the emotional state.

use chrono::{DateTime, Utc};
use coherence_types::EmotionalState;
use serde::Serialize;
use tracing::debug;

use crate::context::FieldContext;
use crate::emitter::Emitter;
use crate::error::EmitterError;
use crate::evolution::Evaluation;

/// Emotional bands, evaluated from the top down.
const BANDS: [(f64, EmotionalState); 6] = [
    (0.9, EmotionalState::Ecstatic),
    (0.8, EmotionalState::Joyful),
    (0.7, EmotionalState::Content),
    (0.6, EmotionalState::Peaceful),
    (0.5, EmotionalState::Contemplative),
    (0.4, EmotionalState::Seeking),
];

/// Derive the emotional state for a coherence value.
pub fn emotional_state_for(coherence: f64) -> EmotionalState {
    BANDS
        .iter()
        .find(|(floor, _)| coherence >= *floor)
        .map_or(EmotionalState::Resting, |(_, state)| *state)
}

/// What one beat did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeartbeatReport {
    /// When the beat ran.
    pub at: DateTime<Utc>,
    /// Participants counted in the mean.
    pub participants: usize,
    /// Committed coherence after the beat.
    pub coherence: f64,
    /// Derived emotional state.
    pub emotional_state: EmotionalState,
    /// Result of the evolution evaluation.
    pub evaluation: Evaluation,
}

/// Run one beat against `ctx`.
pub(crate) fn beat(ctx: &FieldContext) -> HeartbeatReport {
    let (participants, committed) = {
        let registry = ctx.registry().read();
        let count = registry.len();
        let mean = (count > 0).then(|| {
            let total: f64 = registry.values().map(|p| p.own_coherence).sum();
            total / count as f64
        });
        let committed = ctx.field().apply_delta(|field| {
            if let Some(mean) = mean {
                field.coherence = mean;
            }
            field.clamp();
            field.emotional_state = emotional_state_for(field.coherence);
        });
        drop(registry);
        (count, committed)
    };

    let evaluation = ctx.evaluate_evolution();
    let report = HeartbeatReport {
        at: Utc::now(),
        participants,
        coherence: committed.coherence,
        emotional_state: committed.emotional_state,
        evaluation,
    };
    debug!(
        participants = report.participants,
        coherence = report.coherence,
        emotional_state = %report.emotional_state,
        "Heartbeat"
    );
    report
}

/// The heartbeat as a periodic emitter.
#[derive(Debug, Default)]
pub struct Heartbeat;

impl Heartbeat {
    /// Create a heartbeat emitter.
    pub const fn new() -> Self {
        Self
    }
}

impl Emitter for Heartbeat {
    fn name(&self) -> &str {
        "heartbeat"
    }

    fn tick(&mut self, ctx: &FieldContext) -> Result<(), EmitterError> {
        ctx.heartbeat();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_match_thresholds() {
        assert_eq!(emotional_state_for(0.95), EmotionalState::Ecstatic);
        assert_eq!(emotional_state_for(0.9), EmotionalState::Ecstatic);
        assert_eq!(emotional_state_for(0.85), EmotionalState::Joyful);
        assert_eq!(emotional_state_for(0.7), EmotionalState::Content);
        assert_eq!(emotional_state_for(0.700_000_000_000_000_1), EmotionalState::Content);
        assert_eq!(emotional_state_for(0.65), EmotionalState::Peaceful);
        assert_eq!(emotional_state_for(0.55), EmotionalState::Contemplative);
        assert_eq!(emotional_state_for(0.45), EmotionalState::Seeking);
        assert_eq!(emotional_state_for(0.1), EmotionalState::Resting);
        assert_eq!(emotional_state_for(0.0), EmotionalState::Resting);
    }

    #[test]
    fn band_edges_are_inclusive() {
        assert_eq!(emotional_state_for(0.4), EmotionalState::Seeking);
        assert_eq!(emotional_state_for(0.399_999), EmotionalState::Resting);
    }
}
