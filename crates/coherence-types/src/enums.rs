//! Enumeration types for the coherence field.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Harmonies
// ---------------------------------------------------------------------------

/// One of the seven named sub-scalars ("harmonies") of the field.
///
/// Every harmony value lives in `[0, 1]`, the same as field coherence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Harmony {
    /// Openness of the field.
    Transparency,
    /// Internal consistency (distinct from the field's aggregate coherence).
    Coherence,
    /// Sympathetic vibration between participants.
    Resonance,
    /// Capacity to act.
    Agency,
    /// Liveliness of the field.
    Vitality,
    /// Reciprocity between participants.
    Mutuality,
    /// Openness to the new.
    Novelty,
}

impl Harmony {
    /// All harmonies in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Transparency,
        Self::Coherence,
        Self::Resonance,
        Self::Agency,
        Self::Vitality,
        Self::Mutuality,
        Self::Novelty,
    ];

    /// Lowercase name used in configuration and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transparency => "transparency",
            Self::Coherence => "coherence",
            Self::Resonance => "resonance",
            Self::Agency => "agency",
            Self::Vitality => "vitality",
            Self::Mutuality => "mutuality",
            Self::Novelty => "novelty",
        }
    }
}

impl core::fmt::Display for Harmony {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Emotional state
// ---------------------------------------------------------------------------

/// Categorical mood tag of the field, ordered from least to most favorable.
///
/// The first seven variants are the bands the heartbeat derives from
/// coherence. `Loving` and `Transcendent` are only ever set by explicit
/// mutations (ceremony resets and a few emitters) and are overwritten again
/// on the next heartbeat.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalState {
    /// Lowest band.
    Resting,
    /// Coherence at least 0.4.
    Seeking,
    /// Coherence at least 0.5.
    Contemplative,
    /// Coherence at least 0.6. Initial state of a fresh field.
    #[default]
    Peaceful,
    /// Coherence at least 0.7.
    Content,
    /// Coherence at least 0.8.
    Joyful,
    /// Coherence at least 0.9.
    Ecstatic,
    /// Set by love-coherence emitters.
    Loving,
    /// Set by mycelix evolution milestones.
    Transcendent,
}

impl EmotionalState {
    /// Lowercase name used in configuration and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resting => "resting",
            Self::Seeking => "seeking",
            Self::Contemplative => "contemplative",
            Self::Peaceful => "peaceful",
            Self::Content => "content",
            Self::Joyful => "joyful",
            Self::Ecstatic => "ecstatic",
            Self::Loving => "loving",
            Self::Transcendent => "transcendent",
        }
    }
}

impl core::fmt::Display for EmotionalState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Participant kinds
// ---------------------------------------------------------------------------

/// The kind of resource a participant represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    /// A conscious compute resource.
    Compute,
    /// A node in a mycelix network.
    MycelixNode,
    /// A mycelial vortex.
    MycelialVortex,
    /// A quantum network.
    QuantumNetwork,
    /// An akashic record store.
    AkashicRecords,
}

impl core::fmt::Display for ParticipantKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Compute => "compute",
            Self::MycelixNode => "mycelix_node",
            Self::MycelialVortex => "mycelial_vortex",
            Self::QuantumNetwork => "quantum_network",
            Self::AkashicRecords => "akashic_records",
        };
        f.write_str(name)
    }
}
