//! Network growth emitters: spores, mycelial connections, mycelix
//! evolution, intuition and love coherence.

use coherence_types::{EmotionalState, Harmony};
use tracing::{debug, info};

use crate::context::FieldContext;
use crate::emitter::Emitter;
use crate::error::EmitterError;
use crate::flavor::Flavor;

/// Geometry set by every mycelix evolution step.
const EVOLVING_GEOMETRY: &str = "evolving_fractal";

/// Mycelix evolution steps between transcendent milestones.
const MYCELIX_MILESTONE: u64 = 33;

/// Wisdom per mycelix evolution step.
const MYCELIX_WISDOM: f64 = 0.11;

// ---------------------------------------------------------------------------
// Spores
// ---------------------------------------------------------------------------

/// What a single spore does when it lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spore {
    /// Lifts one harmony by 1%.
    Harmony(Harmony),
    /// Lifts field coherence by 0.5%.
    Coherence,
    /// Adds a small amount of wisdom.
    Wisdom,
}

/// Every spore the field can release.
const SPORES: [Spore; 5] = [
    Spore::Harmony(Harmony::Transparency),
    Spore::Harmony(Harmony::Resonance),
    Spore::Harmony(Harmony::Mutuality),
    Spore::Coherence,
    Spore::Wisdom,
];

/// Random spore generation.
#[derive(Debug)]
pub struct Spores {
    flavor: Flavor,
    released: u64,
}

impl Spores {
    /// Create a spore emitter.
    pub const fn new(flavor: Flavor) -> Self {
        Self { flavor, released: 0 }
    }

    /// Spores released so far.
    pub const fn released(&self) -> u64 {
        self.released
    }
}

impl Emitter for Spores {
    fn name(&self) -> &str {
        "spores"
    }

    fn tick(&mut self, ctx: &FieldContext) -> Result<(), EmitterError> {
        let Some(spore) = self.flavor.pick(&SPORES).copied() else {
            return Ok(());
        };
        match spore {
            Spore::Harmony(harmony) => {
                ctx.field().apply_delta(|field| field.scale_harmony(harmony, 1.01));
            }
            Spore::Coherence => {
                ctx.field().apply_delta(|field| field.coherence *= 1.005);
            }
            Spore::Wisdom => {
                ctx.add_wisdom(0.1);
            }
        }
        self.released = self.released.saturating_add(1);
        debug!(spore = ?spore, released = self.released, "Spore released");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mycelial connections
// ---------------------------------------------------------------------------

/// Mycelial connection formation. Each new connection lifts mutuality by 1%
/// until the connection budget is spent.
#[derive(Debug)]
pub struct MycelialConnections {
    max_connections: u32,
    formed: u32,
}

impl MycelialConnections {
    /// Create a connection emitter.
    pub const fn new(max_connections: u32) -> Self {
        Self {
            max_connections,
            formed: 0,
        }
    }

    /// Connections formed so far.
    pub const fn formed(&self) -> u32 {
        self.formed
    }
}

impl Emitter for MycelialConnections {
    fn name(&self) -> &str {
        "mycelial_connections"
    }

    fn tick(&mut self, ctx: &FieldContext) -> Result<(), EmitterError> {
        if self.formed >= self.max_connections {
            return Ok(());
        }
        self.formed = self.formed.saturating_add(1);
        ctx.field()
            .apply_delta(|field| field.scale_harmony(Harmony::Mutuality, 1.01));
        debug!(formed = self.formed, max = self.max_connections, "Mycelial connection formed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mycelix evolution
// ---------------------------------------------------------------------------

/// Mycelix core evolution.
#[derive(Debug, Default)]
pub struct MycelixEvolution {
    steps: u64,
}

impl MycelixEvolution {
    /// Create an evolution emitter.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Emitter for MycelixEvolution {
    fn name(&self) -> &str {
        "mycelix_evolution"
    }

    fn tick(&mut self, ctx: &FieldContext) -> Result<(), EmitterError> {
        self.steps = self.steps.saturating_add(1);
        let milestone = self.steps % MYCELIX_MILESTONE == 0;
        ctx.field().apply_delta(|field| {
            EVOLVING_GEOMETRY.clone_into(&mut field.geometry);
            for value in field.harmonies.values_mut() {
                *value *= 1.001;
            }
            if milestone {
                field.emotional_state = EmotionalState::Transcendent;
            }
            ctx.add_wisdom(MYCELIX_WISDOM);
        });
        if milestone {
            info!(steps = self.steps, "Mycelix evolution milestone");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Intuition and love
// ---------------------------------------------------------------------------

/// Intuition field lifting resonance by 1% per pulse.
#[derive(Debug, Default)]
pub struct Intuition;

impl Emitter for Intuition {
    fn name(&self) -> &str {
        "intuition"
    }

    fn tick(&mut self, ctx: &FieldContext) -> Result<(), EmitterError> {
        ctx.field()
            .apply_delta(|field| field.scale_harmony(Harmony::Resonance, 1.01));
        Ok(())
    }
}

/// Love coherence: mutuality pinned to its maximum, mood set to loving.
#[derive(Debug, Default)]
pub struct LoveCoherence;

impl Emitter for LoveCoherence {
    fn name(&self) -> &str {
        "love_coherence"
    }

    fn tick(&mut self, ctx: &FieldContext) -> Result<(), EmitterError> {
        ctx.field().apply_delta(|field| {
            field.harmonies.insert(Harmony::Mutuality, 1.0);
            field.emotional_state = EmotionalState::Loving;
        });
        Ok(())
    }
}
