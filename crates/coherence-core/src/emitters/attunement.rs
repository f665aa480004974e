//! Per-participant attunement.
//!
//! Each participant gets its own emitter that pulls its own coherence
//! toward the field's, with a little random drift. The heartbeat later
//! folds those values back into the field mean. When the participant is
//! released the emitter faults with [`EmitterError::ParticipantGone`] and
//! ends.

use std::time::Duration;

use coherence_types::{ParticipantId, clamp_unit};
use tracing::trace;

use crate::context::FieldContext;
use crate::emitter::Emitter;
use crate::error::EmitterError;
use crate::flavor::Flavor;

/// Frequency whose period equals the configured base period.
const REFERENCE_FREQUENCY: u64 = 432;

/// Attunement of one participant to the field.
#[derive(Debug)]
pub struct Attunement {
    participant: ParticipantId,
    name: String,
    rate: f64,
    jitter: f64,
    flavor: Flavor,
}

impl Attunement {
    /// Create an attunement emitter for `participant`.
    pub fn new(participant: ParticipantId, rate: f64, jitter: f64, flavor: Flavor) -> Self {
        Self {
            participant,
            name: format!("attunement:{participant}"),
            rate,
            jitter,
            flavor,
        }
    }

    /// Period for a participant: `base_period_ms * 432 / frequency`, at least
    /// one millisecond.
    pub fn period(base_period_ms: u64, frequency: u32) -> Duration {
        let frequency = u64::from(frequency.max(1));
        let millis = base_period_ms.saturating_mul(REFERENCE_FREQUENCY) / frequency;
        Duration::from_millis(millis.max(1))
    }
}

impl Emitter for Attunement {
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&mut self, ctx: &FieldContext) -> Result<(), EmitterError> {
        let target = ctx.field().coherence();
        let drift = self.flavor.jitter(self.jitter);
        let rate = self.rate;
        let updated = ctx
            .registry()
            .update(self.participant, |p| {
                let pulled = rate.mul_add(target - p.own_coherence, p.own_coherence);
                p.own_coherence = clamp_unit(pulled + drift);
            })
            .ok_or(EmitterError::ParticipantGone(self.participant))?;
        trace!(
            participant = %self.participant,
            own_coherence = updated.own_coherence,
            target,
            "Attuned"
        );
        Ok(())
    }
}
