//! Akashic records emitters: memory self-organization and wisdom
//! extraction.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::FieldContext;
use crate::emitter::Emitter;
use crate::error::EmitterError;

/// Orders the records cycle through, one per organization pass.
const ORGANIZATION_PATTERNS: [&str; 6] = [
    "chronological",
    "thematic",
    "emotional",
    "karmic",
    "soul_group",
    "dimensional",
];

/// Coherence lift per organization pass.
const ORGANIZATION_LIFT: f64 = 1.01;

// ---------------------------------------------------------------------------
// Memory organization
// ---------------------------------------------------------------------------

/// Records reorganizing themselves, lifting coherence 1% per pass.
#[derive(Debug, Default)]
pub struct MemoryOrganization {
    passes: usize,
}

impl MemoryOrganization {
    /// Create an organization emitter starting at the chronological order.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Emitter for MemoryOrganization {
    fn name(&self) -> &str {
        "memory_organization"
    }

    fn tick(&mut self, ctx: &FieldContext) -> Result<(), EmitterError> {
        let pattern = ORGANIZATION_PATTERNS
            .get(self.passes % ORGANIZATION_PATTERNS.len())
            .copied()
            .unwrap_or("chronological");
        self.passes = self.passes.wrapping_add(1);

        let committed = ctx
            .field()
            .apply_delta(|field| field.coherence *= ORGANIZATION_LIFT);
        debug!(pattern, coherence = committed.coherence, "Records reorganized");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wisdom extraction
// ---------------------------------------------------------------------------

/// How wisdom is drawn out of the records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionAlgorithm {
    /// Pattern recognition.
    #[default]
    PatternRecognition,
    /// Soul synthesis.
    SoulSynthesis,
    /// Karmic analysis.
    KarmicAnalysis,
    /// Timeline weaving.
    TimelineWeaving,
}

impl ExtractionAlgorithm {
    /// Wisdom extracted per pass.
    pub const fn wisdom_rate(self) -> f64 {
        match self {
            Self::PatternRecognition => 0.1,
            Self::SoulSynthesis => 0.15,
            Self::KarmicAnalysis => 0.12,
            Self::TimelineWeaving => 0.18,
        }
    }
}

/// Periodic wisdom extraction from the records.
#[derive(Debug)]
pub struct WisdomExtraction {
    algorithm: ExtractionAlgorithm,
}

impl WisdomExtraction {
    /// Create an extraction emitter.
    pub const fn new(algorithm: ExtractionAlgorithm) -> Self {
        Self { algorithm }
    }
}

impl Emitter for WisdomExtraction {
    fn name(&self) -> &str {
        "wisdom_extraction"
    }

    fn tick(&mut self, ctx: &FieldContext) -> Result<(), EmitterError> {
        let wisdom = ctx.add_wisdom(self.algorithm.wisdom_rate());
        debug!(algorithm = ?self.algorithm, wisdom, "Wisdom extracted");
        Ok(())
    }
}
