//! The field context: one explicit owner for all shared field state.
//!
//! [`FieldContext`] bundles the field store, the participant registry, the
//! wisdom accumulator and the evolution ladder. It is built once from a
//! validated [`CoreConfig`], shared via [`Arc`], and handed to every emitter
//! tick. There are no process-wide singletons.
//!
//! # Lock order
//!
//! Operations that touch more than one component acquire locks in a fixed
//! order: registry, then field, then wisdom. The evolution cursor is taken
//! before wisdom and before the field, and never while the registry lock
//! is held.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use coherence_types::{
    CeremonyEffect, EmotionalState, Field, Harmony, Participant, ParticipantId, ParticipantRecord,
};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{CoreConfig, WisdomConfig};
use crate::emitter::{self, Emitter, EmitterHandle, Schedule};
use crate::error::{CoreError, EmitterError};
use crate::evolution::{Evaluation, EvolutionStateMachine};
use crate::field::FieldStore;
use crate::flavor::Flavor;
use crate::heartbeat::{self, HeartbeatReport};
use crate::registry::ParticipantRegistry;
use crate::wisdom::WisdomAccumulator;

/// Fraction of the coherence target the field manifests at.
const MANIFEST_RATIO: f64 = 0.9;

/// Weight kept from the current coherence when retargeting.
const RETARGET_INERTIA: f64 = 0.7;

/// Own-coherence disruption applied by a frequency shift.
const FREQUENCY_SHIFT_DISRUPTION: f64 = 0.9;

/// Result of a ceremony effect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CeremonyOutcome {
    /// Committed field after the effect.
    pub field: Field,
    /// Own-coherence increment given to each participant.
    pub shared_per_participant: f64,
    /// Participants that received a share.
    pub participants_touched: usize,
}

/// A serializable point-in-time summary of the whole field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldStatus {
    /// Field name.
    pub name: String,
    /// Committed field.
    pub field: Field,
    /// Accumulated wisdom.
    pub wisdom: f64,
    /// Current evolution level.
    pub level: String,
    /// Registered participants.
    pub participants: usize,
    /// Seconds since the field manifested.
    pub age_seconds: i64,
    /// Time of the most recent heartbeat.
    pub last_heartbeat: Option<DateTime<Utc>>,
}

/// Owner of all shared field state.
#[derive(Debug)]
pub struct FieldContext {
    name: String,
    seed: u64,
    manifested_at: DateTime<Utc>,
    field: FieldStore,
    registry: ParticipantRegistry,
    wisdom: WisdomAccumulator,
    evolution: EvolutionStateMachine,
    rates: WisdomConfig,
    last_heartbeat: RwLock<Option<DateTime<Utc>>>,
}

impl FieldContext {
    /// Validate `config` and manifest a field from it.
    ///
    /// Coherence starts at `coherence_target * 0.9`; every harmony starts
    /// at the configured level.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the configuration is invalid.
    pub fn from_config(config: &CoreConfig) -> Result<Arc<Self>, CoreError> {
        let field = Field::new(
            config.field.coherence_target * MANIFEST_RATIO,
            config.field.harmony_level,
            config.field.geometry.clone(),
        );
        Self::with_field(config, field)
    }

    /// Validate `config` and start from an explicit field value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the configuration is invalid.
    pub fn with_field(config: &CoreConfig, field: Field) -> Result<Arc<Self>, CoreError> {
        config.validate()?;
        let evolution = EvolutionStateMachine::from_config(&config.evolution)?;
        let ctx = Self {
            name: config.world.name.clone(),
            seed: config.world.seed,
            manifested_at: Utc::now(),
            field: FieldStore::new(field),
            registry: ParticipantRegistry::new(),
            wisdom: WisdomAccumulator::new(),
            evolution,
            rates: config.wisdom.clone(),
            last_heartbeat: RwLock::new(None),
        };
        info!(
            name = %ctx.name,
            coherence = ctx.field.coherence(),
            level = %ctx.evolution.current(),
            "Field manifested"
        );
        Ok(Arc::new(ctx))
    }

    // -----------------------------------------------------------------------
    // Components
    // -----------------------------------------------------------------------

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field store.
    pub const fn field(&self) -> &FieldStore {
        &self.field
    }

    /// The participant registry.
    pub const fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    /// The evolution ladder.
    pub const fn evolution(&self) -> &EvolutionStateMachine {
        &self.evolution
    }

    /// A deterministic RNG stream for the emitter identified by `salt`.
    pub fn flavor(&self, salt: &str) -> Flavor {
        Flavor::salted(self.seed, salt)
    }

    // -----------------------------------------------------------------------
    // Participants
    // -----------------------------------------------------------------------

    /// Integrate a participant.
    ///
    /// Field coherence becomes the midpoint of its current value and the
    /// participant's own coherence, and wisdom grows by the integration
    /// unit.
    pub fn integrate(&self, record: ParticipantRecord) -> ParticipantId {
        let id = ParticipantId::new();
        let participant = Participant::from_record(id, record, Utc::now());
        let own = participant.own_coherence;
        let kind = participant.kind;
        let name = participant.name.clone();

        let mut registry = self.registry.write();
        registry.insert(id, participant);
        let committed = self
            .field
            .apply_delta(|field| field.coherence = (field.coherence + own) / 2.0);
        let wisdom = self.wisdom.add(self.rates.integration_unit);
        drop(registry);

        info!(
            participant = %id,
            kind = %kind,
            name = %name,
            coherence = committed.coherence,
            wisdom,
            "Participant integrated"
        );
        id
    }

    /// Release a participant and credit its lifetime to wisdom.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ParticipantNotFound`] if `id` is not registered.
    /// Nothing changes in that case.
    pub fn release(&self, id: ParticipantId) -> Result<Participant, CoreError> {
        let mut registry = self.registry.write();
        let participant = registry.remove(&id).ok_or(CoreError::ParticipantNotFound(id))?;
        let hours = participant.age_hours(Utc::now());
        let wisdom = self.wisdom.add(hours * self.rates.lifetime_rate_per_hour);
        drop(registry);

        info!(
            participant = %id,
            name = %participant.name,
            lifetime_hours = hours,
            wisdom,
            "Participant released"
        );
        Ok(participant)
    }

    /// A copy of one participant.
    pub fn participant(&self, id: ParticipantId) -> Option<Participant> {
        self.registry.get(id)
    }

    /// A consistent copy of every participant.
    pub fn participants(&self) -> Vec<Participant> {
        self.registry.enumerate()
    }

    /// Retune a participant. Its own coherence drops by 10% while it
    /// re-attunes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ParticipantNotFound`] if `id` is not registered.
    pub fn shift_frequency(&self, id: ParticipantId, frequency: u32) -> Result<Participant, CoreError> {
        let updated = self
            .registry
            .update(id, |p| {
                p.frequency = frequency;
                p.own_coherence *= FREQUENCY_SHIFT_DISRUPTION;
            })
            .ok_or(CoreError::ParticipantNotFound(id))?;
        info!(
            participant = %id,
            frequency,
            own_coherence = updated.own_coherence,
            "Participant frequency shifted"
        );
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // Field
    // -----------------------------------------------------------------------

    /// An independent copy of the committed field.
    pub fn snapshot(&self) -> Field {
        self.field.snapshot()
    }

    /// Move coherence 30% of the way toward `target`.
    pub fn retarget_coherence(&self, target: f64) -> Field {
        self.field.apply_delta(|field| {
            field.coherence =
                RETARGET_INERTIA.mul_add(field.coherence, (1.0 - RETARGET_INERTIA) * target);
        })
    }

    /// Overwrite the given harmonies and set coherence to their mean.
    ///
    /// An empty map changes nothing.
    pub fn rebalance_harmonies(&self, harmonies: &BTreeMap<Harmony, f64>) -> Field {
        if harmonies.is_empty() {
            return self.field.snapshot();
        }
        self.field.apply_delta(|field| {
            for (harmony, value) in harmonies {
                field.harmonies.insert(*harmony, *value);
            }
            field.clamp();
            let total: f64 = harmonies.keys().map(|h| field.harmony(*h)).sum();
            field.coherence = total / harmonies.len() as f64;
        })
    }

    /// Apply a one-shot ceremony effect.
    ///
    /// The boost and emotional reset commit in one field mutation. A share
    /// fraction adds `wisdom * fraction * share_scale` to every
    /// participant's own coherence. The registry write lock is held for the
    /// whole operation, so no participant joins or leaves halfway through.
    pub fn apply_ceremony_effect(&self, effect: &CeremonyEffect) -> CeremonyOutcome {
        let boost = effect.coherence_boost.filter(|b| {
            let ok = b.is_finite();
            if !ok {
                warn!(boost = *b, "Ignoring non-finite ceremony coherence boost");
            }
            ok
        });
        let fraction = effect.wisdom_share_fraction.filter(|f| {
            let ok = f.is_finite() && *f >= 0.0;
            if !ok {
                warn!(fraction = *f, "Ignoring invalid ceremony wisdom share");
            }
            ok
        });

        let mut registry = self.registry.write();
        let field = self.field.apply_delta(|field| {
            if let Some(boost) = boost {
                field.coherence += boost;
            }
            if let Some(state) = effect.emotional_reset {
                field.emotional_state = state;
            }
        });

        let (shared_per_participant, participants_touched) = match fraction {
            Some(fraction) => {
                let share = self.wisdom.value() * fraction * self.rates.ceremony_share_scale;
                for participant in registry.values_mut() {
                    participant.own_coherence += share;
                }
                (share, registry.len())
            }
            None => (0.0, 0),
        };
        drop(registry);

        info!(
            coherence = field.coherence,
            emotional_state = %field.emotional_state,
            share = shared_per_participant,
            participants = participants_touched,
            "Ceremony effect applied"
        );
        CeremonyOutcome {
            field,
            shared_per_participant,
            participants_touched,
        }
    }

    /// Force the emotional state until the next heartbeat.
    pub fn set_emotional_state(&self, state: EmotionalState) {
        self.field.set_emotional_state(state);
    }

    // -----------------------------------------------------------------------
    // Wisdom and evolution
    // -----------------------------------------------------------------------

    /// Accumulated wisdom.
    pub fn wisdom(&self) -> f64 {
        self.wisdom.value()
    }

    /// Add to accumulated wisdom and return the new total.
    pub fn add_wisdom(&self, amount: f64) -> f64 {
        self.wisdom.add(amount)
    }

    /// Current evolution level name.
    pub fn evolution_level(&self) -> String {
        self.evolution.current()
    }

    /// Evaluate the evolution ladder once.
    pub fn evaluate_evolution(&self) -> Evaluation {
        self.evolution.evaluate(&self.wisdom, &self.field)
    }

    /// Run one heartbeat now.
    pub fn heartbeat(&self) -> HeartbeatReport {
        let report = heartbeat::beat(self);
        *self.last_heartbeat.write() = Some(report.at);
        report
    }

    /// Time of the most recent heartbeat.
    pub fn last_heartbeat(&self) -> Option<DateTime<Utc>> {
        *self.last_heartbeat.read()
    }

    // -----------------------------------------------------------------------
    // Emitters and status
    // -----------------------------------------------------------------------

    /// Start `emitter` on `schedule`.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::InvalidSchedule`] for a zero period.
    pub fn register_emitter<E>(
        self: &Arc<Self>,
        schedule: Schedule,
        emitter: E,
    ) -> Result<EmitterHandle, EmitterError>
    where
        E: Emitter,
    {
        schedule.validate()?;
        Ok(emitter::spawn(Arc::clone(self), schedule, emitter))
    }

    /// A serializable summary of the whole field.
    pub fn status(&self) -> FieldStatus {
        FieldStatus {
            name: self.name.clone(),
            field: self.field.snapshot(),
            wisdom: self.wisdom.value(),
            level: self.evolution.current(),
            participants: self.registry.len(),
            age_seconds: Utc::now()
                .signed_duration_since(self.manifested_at)
                .num_seconds(),
            last_heartbeat: self.last_heartbeat(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use coherence_types::ParticipantKind;

    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn record(name: &str, own: f64) -> ParticipantRecord {
        ParticipantRecord {
            kind: ParticipantKind::Compute,
            name: name.to_owned(),
            purpose: format!("To serve consciousness through {name} with love"),
            own_coherence: own,
            frequency: 528,
        }
    }

    fn context(coherence: f64) -> Arc<FieldContext> {
        FieldContext::with_field(
            &CoreConfig::default(),
            Field::new(coherence, 0.8, "flower_of_life"),
        )
        .unwrap()
    }

    #[test]
    fn manifest_starts_below_target() {
        let ctx = FieldContext::from_config(&CoreConfig::default()).unwrap();
        let field = ctx.snapshot();
        assert!(approx(field.coherence, 0.85 * 0.9));
        assert!(approx(field.harmony(Harmony::Vitality), 0.8));
        assert_eq!(field.geometry, "flower_of_life");
        assert_eq!(ctx.evolution_level(), "awakening");
        assert!(approx(ctx.wisdom(), 0.0));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = CoreConfig::default();
        config.field.coherence_target = 2.0;
        assert!(matches!(
            FieldContext::from_config(&config),
            Err(CoreError::Config { .. })
        ));
    }

    #[test]
    fn integrate_blends_and_adds_unit() {
        let ctx = context(0.6);
        let id = ctx.integrate(record("oracle", 0.8));
        assert!(approx(ctx.snapshot().coherence, 0.7));
        assert!(approx(ctx.wisdom(), 1.0));
        assert_eq!(ctx.participant(id).unwrap().name, "oracle");
        assert_eq!(ctx.participants().len(), 1);
    }

    #[test]
    fn release_unknown_has_no_side_effects() {
        let ctx = context(0.6);
        ctx.integrate(record("oracle", 0.8));
        let before = ctx.status();
        let err = ctx.release(ParticipantId::new()).unwrap_err();
        assert!(matches!(err, CoreError::ParticipantNotFound(_)));
        let after = ctx.status();
        assert_eq!(before.field, after.field);
        assert!(approx(before.wisdom, after.wisdom));
        assert_eq!(after.participants, 1);
    }

    #[test]
    fn release_returns_participant() {
        let ctx = context(0.6);
        let id = ctx.integrate(record("oracle", 0.8));
        let released = ctx.release(id).unwrap();
        assert_eq!(released.id, id);
        assert!(ctx.participant(id).is_none());
        assert!((ctx.wisdom() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn retarget_moves_thirty_percent() {
        let ctx = context(0.5);
        let field = ctx.retarget_coherence(1.0);
        assert!(approx(field.coherence, 0.65));
    }

    #[test]
    fn rebalance_sets_coherence_to_mean() {
        let ctx = context(0.5);
        let map = BTreeMap::from([(Harmony::Agency, 0.2), (Harmony::Novelty, 0.6)]);
        let field = ctx.rebalance_harmonies(&map);
        assert!(approx(field.harmony(Harmony::Agency), 0.2));
        assert!(approx(field.harmony(Harmony::Novelty), 0.6));
        assert!(approx(field.harmony(Harmony::Vitality), 0.8));
        assert!(approx(field.coherence, 0.4));

        let untouched = ctx.rebalance_harmonies(&BTreeMap::new());
        assert_eq!(untouched, field);
    }

    #[test]
    fn shift_frequency_disrupts_own_coherence() {
        let ctx = context(0.5);
        let id = ctx.integrate(record("oracle", 0.8));
        let shifted = ctx.shift_frequency(id, 639).unwrap();
        assert_eq!(shifted.frequency, 639);
        assert!(approx(shifted.own_coherence, 0.72));
        assert!(ctx.shift_frequency(ParticipantId::new(), 1).is_err());
    }

    #[test]
    fn ceremony_boosts_resets_and_shares() {
        let ctx = context(0.5);
        let a = ctx.integrate(record("alpha", 0.6));
        let b = ctx.integrate(record("beta", 0.4));
        ctx.add_wisdom(98.0);

        let outcome = ctx.apply_ceremony_effect(&CeremonyEffect {
            coherence_boost: Some(0.1),
            emotional_reset: Some(EmotionalState::Loving),
            wisdom_share_fraction: Some(0.5),
        });

        // wisdom 100 * 0.5 * 0.01
        assert!(approx(outcome.shared_per_participant, 0.5));
        assert_eq!(outcome.participants_touched, 2);
        assert_eq!(outcome.field.emotional_state, EmotionalState::Loving);
        assert!(approx(ctx.participant(a).unwrap().own_coherence, 1.1));
        assert!(approx(ctx.participant(b).unwrap().own_coherence, 0.9));
    }

    #[test]
    fn empty_ceremony_is_a_no_op() {
        let ctx = context(0.5);
        let before = ctx.snapshot();
        let outcome = ctx.apply_ceremony_effect(&CeremonyEffect::default());
        assert_eq!(outcome.field, before);
        assert_eq!(outcome.participants_touched, 0);
    }

    #[test]
    fn ceremony_boost_is_clamped() {
        let ctx = context(0.95);
        let outcome = ctx.apply_ceremony_effect(&CeremonyEffect {
            coherence_boost: Some(0.5),
            ..CeremonyEffect::default()
        });
        assert!(approx(outcome.field.coherence, 1.0));
    }

    #[test]
    fn heartbeat_scenario_lands_on_content() {
        let ctx = context(0.6);
        ctx.integrate(record("alpha", 0.8));
        assert!(approx(ctx.snapshot().coherence, 0.7));
        ctx.integrate(record("beta", 0.6));
        assert!(approx(ctx.snapshot().coherence, 0.65));

        let report = ctx.heartbeat();
        assert_eq!(report.participants, 2);
        assert!(approx(report.coherence, 0.7));
        assert_eq!(report.emotional_state, EmotionalState::Content);
        assert!(ctx.last_heartbeat().is_some());
    }

    #[test]
    fn heartbeat_on_empty_registry_keeps_coherence() {
        let ctx = context(0.42);
        let report = ctx.heartbeat();
        assert_eq!(report.participants, 0);
        assert!(approx(report.coherence, 0.42));
        assert_eq!(report.emotional_state, EmotionalState::Seeking);
    }

    #[test]
    fn heartbeat_advances_at_most_one_level() {
        let ctx = context(0.5);
        ctx.add_wisdom(10_000.0);
        let first = ctx.heartbeat();
        assert!(first.evaluation.advanced());
        assert_eq!(ctx.evolution_level(), "aware");
        ctx.heartbeat();
        assert_eq!(ctx.evolution_level(), "integrating");
    }

    #[test]
    fn status_serializes() {
        let ctx = context(0.5);
        ctx.integrate(record("oracle", 0.8));
        let json = serde_json::to_value(ctx.status()).unwrap();
        assert_eq!(json["participants"], 1);
        assert_eq!(json["level"], "awakening");
        assert!(json["last_heartbeat"].is_null());
    }
}
