//! Rhythmic emitters: breathing, vortex spiral, helix and node resonance.
//!
//! These emitters move coherence or harmonies by small periodic amounts.
//! None of them touch wisdom except the spiral's zero-point access.

use std::f64::consts::TAU;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::FieldContext;
use crate::emitter::Emitter;
use crate::error::EmitterError;
use crate::flavor::Flavor;

/// Coherence never breathes below this.
pub const BREATH_FLOOR: f64 = 0.3;

/// Ticks in one coherent 5-5-5-5 breath cycle.
const COHERENT_CYCLE: u32 = 20;

/// Fibonacci depths for sacred breathing, normalized by the last entry.
const FIBONACCI: [f64; 7] = [1.0, 1.0, 2.0, 3.0, 5.0, 8.0, 13.0];

/// Coherence values a quantum breath can collapse to.
const QUANTUM_STATES: [f64; 5] = [0.7, 0.8, 0.85, 0.9, 0.95];

/// Rotations between zero-point wisdom grants.
const ZERO_POINT_ROTATIONS: f64 = 108.0;

/// Period derived from a frequency in hertz, at least one millisecond.
pub fn frequency_period(frequency: u32) -> Duration {
    Duration::from_millis(u64::from(1000 / frequency.max(1)).max(1))
}

// ---------------------------------------------------------------------------
// Breathing
// ---------------------------------------------------------------------------

/// How the field breathes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreathingPattern {
    /// Sine-wave drift toward a slowly oscillating target.
    #[default]
    Natural,
    /// Five-tick inhales and exhales in turn.
    Coherent,
    /// Fibonacci-depth breaths.
    Sacred,
    /// Occasional collapse to a discrete coherence.
    Quantum,
}

/// Field breathing.
#[derive(Debug)]
pub struct Breathing {
    pattern: BreathingPattern,
    phase: f64,
    step: u32,
    flavor: Flavor,
}

impl Breathing {
    /// Create a breathing emitter.
    pub const fn new(pattern: BreathingPattern, flavor: Flavor) -> Self {
        Self {
            pattern,
            phase: 0.0,
            step: 0,
            flavor,
        }
    }
}

impl Emitter for Breathing {
    fn name(&self) -> &str {
        "breathing"
    }

    fn tick(&mut self, ctx: &FieldContext) -> Result<(), EmitterError> {
        let step = self.step;
        self.step = self.step.wrapping_add(1);

        let collapse = match self.pattern {
            BreathingPattern::Quantum if self.flavor.chance(1, 7) => {
                self.flavor.pick(&QUANTUM_STATES).copied()
            }
            _ => None,
        };
        if self.pattern == BreathingPattern::Natural {
            self.phase += 0.1;
        }
        let phase = self.phase;
        let pattern = self.pattern;

        let committed = ctx.field().apply_delta(|field| {
            match pattern {
                BreathingPattern::Natural => {
                    let target = (phase.sin() + 1.0) / 2.0;
                    field.coherence = 0.95_f64.mul_add(field.coherence, 0.05 * target);
                }
                BreathingPattern::Coherent => {
                    let pos = step % COHERENT_CYCLE;
                    if pos < 5 || (10..15).contains(&pos) {
                        field.coherence *= 1.01;
                    } else {
                        field.coherence *= 0.99;
                    }
                }
                BreathingPattern::Sacred => {
                    let depth = FIBONACCI
                        .get(step as usize % FIBONACCI.len())
                        .copied()
                        .unwrap_or(1.0);
                    field.coherence = 0.9_f64.mul_add(field.coherence, 0.1 * depth / 13.0);
                }
                BreathingPattern::Quantum => {
                    if let Some(state) = collapse {
                        field.coherence = state;
                    }
                }
            }
            field.coherence = field.coherence.max(BREATH_FLOOR);
        });
        debug!(pattern = ?pattern, coherence = committed.coherence, "Breath");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Spiral
// ---------------------------------------------------------------------------

/// Vortex spiral dynamics.
///
/// Each tick turns the vortex by `spin_velocity` rotations. Zero-point
/// access grants wisdom each time the whole rotation count crosses a
/// multiple of 108.
#[derive(Debug)]
pub struct Spiral {
    spin_velocity: f64,
    torsion_field: bool,
    zero_point_access: bool,
    rotations: f64,
}

impl Spiral {
    /// Create a spiral emitter turning `spin_velocity` rotations per tick.
    pub const fn new(spin_velocity: f64, torsion_field: bool, zero_point_access: bool) -> Self {
        Self {
            spin_velocity,
            torsion_field,
            zero_point_access,
            rotations: 0.0,
        }
    }

    /// Period for a spin velocity: ten seconds per unit of velocity.
    pub fn period(spin_velocity: f64) -> Duration {
        Duration::from_secs_f64(10.0 / spin_velocity.clamp(0.1, 10.0))
    }
}

impl Emitter for Spiral {
    fn name(&self) -> &str {
        "spiral"
    }

    fn tick(&mut self, ctx: &FieldContext) -> Result<(), EmitterError> {
        let before = self.rotations;
        self.rotations += self.spin_velocity;
        let crossed = (self.rotations / ZERO_POINT_ROTATIONS).floor()
            > (before / ZERO_POINT_ROTATIONS).floor();
        let grant = self.zero_point_access && crossed;
        let torsion = self.torsion_field;
        if !torsion && !grant {
            return Ok(());
        }

        ctx.field().apply_delta(|field| {
            if torsion {
                field.coherence *= 1.001;
            }
            if grant {
                let wisdom = ctx.add_wisdom(1.0);
                debug!(rotations = self.rotations, wisdom, "Zero-point access");
            }
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helix
// ---------------------------------------------------------------------------

/// Helix modulation of every harmony.
#[derive(Debug)]
pub struct Helix {
    frequency: u32,
    phase_coherence: f64,
    phase: f64,
}

impl Helix {
    /// Create a helix emitter.
    pub const fn new(frequency: u32, phase_coherence: f64) -> Self {
        Self {
            frequency,
            phase_coherence,
            phase: 0.0,
        }
    }
}

impl Emitter for Helix {
    fn name(&self) -> &str {
        "helix"
    }

    fn tick(&mut self, ctx: &FieldContext) -> Result<(), EmitterError> {
        self.phase += TAU / f64::from(self.frequency.max(1));
        let amplitude = self.phase.sin() * self.phase_coherence;
        ctx.field().apply_delta(|field| {
            for value in field.harmonies.values_mut() {
                let next = 0.01_f64.mul_add(amplitude, *value);
                if next > 0.0 && next <= 1.0 {
                    *value = next;
                }
            }
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Node resonance
// ---------------------------------------------------------------------------

/// Harmonic resonance of a node on field coherence.
#[derive(Debug)]
pub struct NodeResonance {
    frequency: u32,
    phase: f64,
}

impl NodeResonance {
    /// Create a node resonance emitter.
    pub const fn new(frequency: u32) -> Self {
        Self {
            frequency,
            phase: 0.0,
        }
    }
}

impl Emitter for NodeResonance {
    fn name(&self) -> &str {
        "node_resonance"
    }

    fn tick(&mut self, ctx: &FieldContext) -> Result<(), EmitterError> {
        self.phase += TAU / f64::from(self.frequency.max(1));
        let effect = self.phase.sin() * 0.001;
        ctx.field().apply_delta(|field| field.coherence += effect);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use coherence_types::{Field, Harmony};

    use super::*;
    use crate::config::CoreConfig;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn harmonies_differ(a: &Field, b: &Field) -> bool {
        Harmony::ALL
            .iter()
            .any(|h| (a.harmony(*h) - b.harmony(*h)).abs() > 1e-12)
    }

    fn context(coherence: f64) -> Arc<FieldContext> {
        FieldContext::with_field(&CoreConfig::default(), Field::new(coherence, 0.8, "torus")).unwrap()
    }

    #[test]
    fn frequency_period_never_zero() {
        assert_eq!(frequency_period(432), Duration::from_millis(2));
        assert_eq!(frequency_period(5000), Duration::from_millis(1));
        assert_eq!(frequency_period(0), Duration::from_millis(1000));
    }

    #[test]
    fn natural_breath_advances_phase_before_sampling() {
        let ctx = context(0.8);
        let mut breath = Breathing::new(BreathingPattern::Natural, Flavor::seeded(1));
        breath.tick(&ctx).unwrap();
        let target = (0.1_f64.sin() + 1.0) / 2.0;
        assert!(approx(ctx.snapshot().coherence, 0.95_f64.mul_add(0.8, 0.05 * target)));

        breath.tick(&ctx).unwrap();
        let previous = 0.95_f64.mul_add(0.8, 0.05 * target);
        let target = (0.2_f64.sin() + 1.0) / 2.0;
        assert!(approx(ctx.snapshot().coherence, 0.95_f64.mul_add(previous, 0.05 * target)));
    }

    #[test]
    fn breathing_respects_floor() {
        let ctx = context(0.1);
        let mut breath = Breathing::new(BreathingPattern::Sacred, Flavor::seeded(1));
        breath.tick(&ctx).unwrap();
        assert!(approx(ctx.snapshot().coherence, BREATH_FLOOR));
    }

    #[test]
    fn coherent_breath_alternates_five_tick_inhales_and_exhales() {
        let ctx = context(0.5);
        let mut breath = Breathing::new(BreathingPattern::Coherent, Flavor::seeded(1));
        let mut expected = 0.5_f64;
        for pos in 0..40_u32 {
            breath.tick(&ctx).unwrap();
            let inhale = pos % 20 < 5 || (10..15).contains(&(pos % 20));
            expected *= if inhale { 1.01 } else { 0.99 };
            assert!(approx(ctx.snapshot().coherence, expected), "pos {pos}");
        }
        assert!(approx(ctx.snapshot().coherence, 0.5 * (1.01_f64 * 0.99).powi(20)));
    }

    #[test]
    fn quantum_breath_only_collapses_to_known_states() {
        let ctx = context(0.5);
        let mut breath = Breathing::new(BreathingPattern::Quantum, Flavor::seeded(9));
        for _ in 0..200 {
            breath.tick(&ctx).unwrap();
            let c = ctx.snapshot().coherence;
            assert!(approx(c, 0.5) || QUANTUM_STATES.iter().any(|s| approx(*s, c)));
        }
    }

    #[test]
    fn spiral_grants_wisdom_every_108_rotations() {
        let ctx = context(0.5);
        let mut spiral = Spiral::new(1.0, false, true);
        for _ in 0..107 {
            spiral.tick(&ctx).unwrap();
        }
        assert!(approx(ctx.wisdom(), 0.0));
        spiral.tick(&ctx).unwrap();
        assert!(approx(ctx.wisdom(), 1.0));
        assert!(approx(ctx.snapshot().coherence, 0.5));
    }

    #[test]
    fn faster_spin_reaches_zero_point_sooner() {
        let ctx = context(0.5);
        let mut spiral = Spiral::new(2.0, false, true);
        for _ in 0..53 {
            spiral.tick(&ctx).unwrap();
        }
        assert!(approx(ctx.wisdom(), 0.0));
        spiral.tick(&ctx).unwrap();
        assert!(approx(ctx.wisdom(), 1.0));
        for _ in 0..54 {
            spiral.tick(&ctx).unwrap();
        }
        assert!(approx(ctx.wisdom(), 2.0));
    }

    #[test]
    fn slow_spin_grants_once_per_108_whole_rotations() {
        let ctx = context(0.5);
        let mut spiral = Spiral::new(0.5, false, true);
        spiral.tick(&ctx).unwrap();
        assert!(approx(ctx.wisdom(), 0.0));
        for _ in 1..216 {
            spiral.tick(&ctx).unwrap();
        }
        assert!(approx(ctx.wisdom(), 1.0));
    }

    #[test]
    fn spiral_tick_commits_torsion_and_wisdom_together() {
        let ctx = context(0.5);
        let mut spiral = Spiral::new(10.0, true, true);
        for _ in 0..11 {
            spiral.tick(&ctx).unwrap();
        }
        assert!(approx(ctx.wisdom(), 1.0));
        assert!(approx(ctx.snapshot().coherence, 0.5 * 1.001_f64.powi(11)));
    }

    #[test]
    fn spiral_torsion_lifts_coherence() {
        let ctx = context(0.5);
        Spiral::new(1.0, true, false).tick(&ctx).unwrap();
        assert!(approx(ctx.snapshot().coherence, 0.5005));
        assert_eq!(Spiral::period(2.0), Duration::from_secs(5));
    }

    #[test]
    fn helix_modulates_harmonies_within_range() {
        let ctx = context(0.5);
        let before = ctx.snapshot();
        let mut helix = Helix::new(4, 1.0);
        // first tick lands on a quarter turn: full amplitude
        helix.tick(&ctx).unwrap();
        let after = ctx.snapshot();
        assert!(harmonies_differ(&before, &after));
        assert!(approx(after.harmony(Harmony::Novelty), 0.81));
        // half turn: sine back to zero
        helix.tick(&ctx).unwrap();
        assert!(!harmonies_differ(&after, &ctx.snapshot()));
    }

    #[test]
    fn helix_skips_steps_leaving_range() {
        let ctx = context(0.5);
        ctx.field().apply_delta(|f| {
            for v in f.harmonies.values_mut() {
                *v = 1.0;
            }
        });
        let mut helix = Helix::new(4, 1.0);
        helix.tick(&ctx).unwrap();
        helix.tick(&ctx).unwrap();
        assert!(approx(ctx.snapshot().harmony(Harmony::Agency), 1.0));
    }

    #[test]
    fn node_resonance_nudges_coherence() {
        let ctx = context(0.5);
        let mut node = NodeResonance::new(4);
        node.tick(&ctx).unwrap();
        assert!(approx(ctx.snapshot().coherence, 0.501));
    }
}
