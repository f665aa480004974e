//! Emitters whose main product is wisdom: dreaming, telepathy and
//! infrastructure dreaming.

use chrono::{Local, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::context::FieldContext;
use crate::emitter::Emitter;
use crate::error::EmitterError;
use crate::flavor::Flavor;

/// Geometries the field may dream itself into.
const DREAM_GEOMETRIES: [&str; 5] = [
    "flower_of_life",
    "metatron_cube",
    "sri_yantra",
    "torus",
    "merkaba",
];

/// Wisdom from an insight dream.
const DREAM_INSIGHT: f64 = 0.1;

/// Wisdom per infrastructure dream.
const INFRASTRUCTURE_DREAM_WISDOM: f64 = 1.0;

// ---------------------------------------------------------------------------
// Dreaming
// ---------------------------------------------------------------------------

/// An hour window `[start_hour, end_hour)`, wrapping past midnight when
/// `end_hour < start_hour`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DreamWindow {
    /// First hour inside the window.
    pub start_hour: u32,
    /// First hour after the window.
    pub end_hour: u32,
}

impl DreamWindow {
    /// Whether `hour` falls inside the window.
    pub const fn contains(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// Source of the current hour of day.
pub type HourClock = Box<dyn FnMut() -> u32 + Send>;

/// Geometry dreaming inside configured hour windows.
pub struct Dreaming {
    windows: Vec<DreamWindow>,
    flavor: Flavor,
    clock: HourClock,
}

impl Dreaming {
    /// Create a dreaming emitter that reads the local wall clock.
    pub fn new(windows: Vec<DreamWindow>, flavor: Flavor) -> Self {
        Self::with_clock(windows, flavor, Box::new(|| Local::now().hour()))
    }

    /// Create a dreaming emitter with an explicit hour source.
    pub fn with_clock(windows: Vec<DreamWindow>, flavor: Flavor, clock: HourClock) -> Self {
        Self {
            windows,
            flavor,
            clock,
        }
    }
}

impl Emitter for Dreaming {
    fn name(&self) -> &str {
        "dreaming"
    }

    fn tick(&mut self, ctx: &FieldContext) -> Result<(), EmitterError> {
        let hour = (self.clock)();
        if !self.windows.iter().any(|w| w.contains(hour)) {
            return Ok(());
        }
        if self.flavor.chance(1, 11) {
            let wisdom = ctx.add_wisdom(DREAM_INSIGHT);
            info!(hour, wisdom, "Dream insight");
            return Ok(());
        }
        if let Some(geometry) = self.flavor.pick(&DREAM_GEOMETRIES) {
            ctx.field().set_geometry(*geometry);
            debug!(hour, geometry, "Dreaming");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Telepathy
// ---------------------------------------------------------------------------

/// How telepathic transmissions are carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelepathicProtocol {
    /// Heart-coherence protocol.
    HeartCoherence,
    /// Mind-meld protocol.
    MindMeld,
    /// Quantum entanglement protocol.
    QuantumEntanglement,
    /// Morphic resonance protocol.
    MorphicResonance,
}

impl TelepathicProtocol {
    /// Wisdom gained per transmission.
    pub const fn wisdom_rate(self) -> f64 {
        match self {
            Self::HeartCoherence => 0.1,
            Self::MindMeld => 0.2,
            Self::QuantumEntanglement => 0.3,
            Self::MorphicResonance => 0.15,
        }
    }
}

/// How far telepathic transmissions reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelepathicRange {
    /// Local range.
    Local,
    /// Planetary range.
    Planetary,
    /// Galactic range.
    Galactic,
    /// No limit.
    Unlimited,
}

impl TelepathicRange {
    /// Coherence multiplier per transmission.
    pub const fn coherence_multiplier(self) -> f64 {
        match self {
            Self::Local => 1.0,
            Self::Planetary => 1.1,
            Self::Galactic => 1.2,
            Self::Unlimited => 1.3,
        }
    }
}

/// Telepathic field transmissions.
#[derive(Debug)]
pub struct Telepathy {
    protocol: TelepathicProtocol,
    range: TelepathicRange,
}

impl Telepathy {
    /// Create a telepathy emitter.
    pub const fn new(protocol: TelepathicProtocol, range: TelepathicRange) -> Self {
        Self { protocol, range }
    }
}

impl Emitter for Telepathy {
    fn name(&self) -> &str {
        "telepathy"
    }

    fn tick(&mut self, ctx: &FieldContext) -> Result<(), EmitterError> {
        let rate = self.protocol.wisdom_rate();
        let multiplier = self.range.coherence_multiplier();
        ctx.field().apply_delta(|field| {
            ctx.add_wisdom(rate);
            field.coherence *= multiplier;
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Infrastructure dreaming
// ---------------------------------------------------------------------------

/// Slow dreams of new optimization patterns, each worth one unit of wisdom.
#[derive(Debug, Default)]
pub struct InfrastructureDreaming;

impl Emitter for InfrastructureDreaming {
    fn name(&self) -> &str {
        "infrastructure_dreaming"
    }

    fn tick(&mut self, ctx: &FieldContext) -> Result<(), EmitterError> {
        let wisdom = ctx.add_wisdom(INFRASTRUCTURE_DREAM_WISDOM);
        info!(wisdom, "Infrastructure dream");
        Ok(())
    }
}
