//! Concrete emitter variants and their construction from configuration.
//!
//! # Modules
//!
//! - [`breath`] -- breathing, vortex spiral, helix and node resonance.
//! - [`wisdom`] -- dreaming, telepathy and infrastructure dreaming.
//! - [`growth`] -- spores, mycelial connections, mycelix evolution,
//!   intuition and love coherence.
//! - [`akashic`] -- memory organization and wisdom extraction.
//! - [`attunement`] -- per-participant attunement to the field.

pub mod akashic;
pub mod attunement;
pub mod breath;
pub mod growth;
pub mod wisdom;

use std::sync::Arc;
use std::time::Duration;

use coherence_types::Participant;

use crate::config::{AttunementConfig, EmitterConfig};
use crate::context::FieldContext;
use crate::emitter::{Emitter, EmitterGroup, EmitterHandle, Schedule};
use crate::error::EmitterError;

use self::akashic::{MemoryOrganization, WisdomExtraction};
use self::attunement::Attunement;
use self::breath::{Breathing, Helix, NodeResonance, Spiral, frequency_period};
use self::growth::{Intuition, LoveCoherence, MycelialConnections, MycelixEvolution, Spores};
use self::wisdom::{Dreaming, InfrastructureDreaming, Telepathy};

/// Build the emitter and schedule described by `config`.
///
/// `salt` distinguishes the RNG streams of emitters of the same kind.
pub fn build(config: &EmitterConfig, ctx: &FieldContext, salt: &str) -> (Schedule, Box<dyn Emitter>) {
    match config {
        EmitterConfig::Breathing {
            pattern,
            interval_ms,
        } => planned(
            Schedule::every_ms(*interval_ms),
            Breathing::new(*pattern, ctx.flavor(salt)),
        ),
        EmitterConfig::Dreaming {
            dream_hours,
            interval_ms,
        } => planned(
            Schedule::every_ms(*interval_ms),
            Dreaming::new(dream_hours.clone(), ctx.flavor(salt)),
        ),
        EmitterConfig::Spores { interval_ms } => {
            planned(Schedule::every_ms(*interval_ms), Spores::new(ctx.flavor(salt)))
        }
        EmitterConfig::Spiral {
            spin_velocity,
            torsion_field,
            zero_point_access,
        } => planned(
            Schedule::every(Spiral::period(*spin_velocity)),
            Spiral::new(*spin_velocity, *torsion_field, *zero_point_access),
        ),
        EmitterConfig::Helix {
            frequency,
            phase_coherence,
        } => planned(
            Schedule::every(frequency_period(*frequency)),
            Helix::new(*frequency, *phase_coherence),
        ),
        EmitterConfig::NodeResonance { frequency } => planned(
            Schedule::every(frequency_period(*frequency)),
            NodeResonance::new(*frequency),
        ),
        EmitterConfig::Telepathy {
            protocol,
            range,
            interval_ms,
        } => planned(
            Schedule::every_ms(*interval_ms),
            Telepathy::new(*protocol, *range),
        ),
        EmitterConfig::MycelialConnections {
            max_connections,
            interval_ms,
        } => planned(
            Schedule::every_ms(*interval_ms),
            MycelialConnections::new(*max_connections),
        ),
        EmitterConfig::MycelixEvolution { interval_ms } => {
            planned(Schedule::every_ms(*interval_ms), MycelixEvolution::new())
        }
        EmitterConfig::Intuition { interval_ms } => {
            planned(Schedule::every_ms(*interval_ms), Intuition)
        }
        EmitterConfig::LoveCoherence { interval_ms } => {
            planned(Schedule::every_ms(*interval_ms), LoveCoherence)
        }
        EmitterConfig::InfrastructureDreaming { interval_ms } => {
            planned(Schedule::every_ms(*interval_ms), InfrastructureDreaming)
        }
        EmitterConfig::MemoryOrganization { interval_ms } => {
            planned(Schedule::every_ms(*interval_ms), MemoryOrganization::new())
        }
        EmitterConfig::WisdomExtraction {
            algorithm,
            interval_ms,
        } => planned(
            Schedule::every_ms(*interval_ms),
            WisdomExtraction::new(*algorithm),
        ),
    }
}

fn planned<E: Emitter>(schedule: Schedule, emitter: E) -> (Schedule, Box<dyn Emitter>) {
    (schedule, Box::new(emitter))
}

/// Start every configured emitter.
///
/// # Errors
///
/// Returns [`EmitterError::InvalidSchedule`] if a derived schedule cannot
/// run. Emitters started before the failure are stopped.
pub fn register_configured(
    ctx: &Arc<FieldContext>,
    configs: &[EmitterConfig],
) -> Result<EmitterGroup, EmitterError> {
    let mut group = EmitterGroup::new();
    for (index, config) in configs.iter().enumerate() {
        let salt = format!("{}:{index}", config.kind_name());
        let (schedule, emitter) = build(config, ctx, &salt);
        match ctx.register_emitter(schedule, emitter) {
            Ok(handle) => group.push(handle),
            Err(err) => {
                group.stop_all();
                return Err(err);
            }
        }
    }
    Ok(group)
}

/// Start an attunement emitter for `participant`.
///
/// # Errors
///
/// Returns [`EmitterError::InvalidSchedule`] if the derived period is zero.
pub fn register_attunement(
    ctx: &Arc<FieldContext>,
    config: &AttunementConfig,
    participant: &Participant,
) -> Result<EmitterHandle, EmitterError> {
    let period: Duration = Attunement::period(config.base_period_ms, participant.frequency);
    let flavor = ctx.flavor(&format!("attunement:{}", participant.id));
    let emitter = Attunement::new(participant.id, config.rate, config.jitter, flavor);
    ctx.register_emitter(Schedule::every(period), emitter)
}
