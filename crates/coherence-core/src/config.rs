//! Configuration loading and typed config structures for the coherence core.
//!
//! The canonical configuration lives in `coherence-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure, a loader, and [`CoreConfig::validate`], which the engine
//! runs once before any value reaches the core. Everything downstream of
//! validation can assume well-formed numbers.

use std::path::Path;

use coherence_types::ParticipantRecord;
use serde::{Deserialize, Serialize};

use crate::emitters::akashic::ExtractionAlgorithm;
use crate::emitters::breath::BreathingPattern;
use crate::emitters::wisdom::{DreamWindow, TelepathicProtocol, TelepathicRange};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but is not usable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Shorthand for building a [`ConfigError::Invalid`].
fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.into(),
    }
}

/// Top-level core configuration.
///
/// Mirrors the structure of `coherence-config.yaml`. Every section has
/// defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CoreConfig {
    /// World-level settings (name, seed).
    #[serde(default)]
    pub world: WorldConfig,

    /// Initial field settings.
    #[serde(default)]
    pub field: FieldConfig,

    /// Wisdom contribution rates.
    #[serde(default)]
    pub wisdom: WisdomConfig,

    /// Evolution ladder.
    #[serde(default)]
    pub evolution: EvolutionConfig,

    /// Heartbeat schedule.
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,

    /// Per-participant attunement emitters.
    #[serde(default)]
    pub attunement: AttunementConfig,

    /// Background emitters started with the engine.
    #[serde(default)]
    pub emitters: Vec<EmitterConfig>,

    /// Participants integrated at startup.
    #[serde(default)]
    pub participants: Vec<ParticipantRecord>,

    /// Run boundaries for the engine binary.
    #[serde(default)]
    pub bounds: BoundsConfig,
}

impl CoreConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// An empty document yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Check every numeric and structural constraint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.field.validate()?;
        self.wisdom.validate()?;
        self.evolution.validate()?;
        if self.heartbeat.period_ms == 0 {
            return Err(invalid("heartbeat.period_ms must be at least 1"));
        }
        self.attunement.validate()?;
        for emitter in &self.emitters {
            emitter.validate()?;
        }
        for record in &self.participants {
            if !record.own_coherence.is_finite() {
                return Err(invalid(format!(
                    "participant {} has a non-finite own_coherence",
                    record.name
                )));
            }
            if record.frequency == 0 {
                return Err(invalid(format!(
                    "participant {} must have a non-zero frequency",
                    record.name
                )));
            }
        }
        Ok(())
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable field name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducible emitter flavor.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
        }
    }
}

/// Initial field configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldConfig {
    /// Target coherence. The field manifests slightly below it.
    #[serde(default = "default_coherence_target")]
    pub coherence_target: f64,

    /// Starting value for every harmony.
    #[serde(default = "default_harmony_level")]
    pub harmony_level: f64,

    /// Starting geometry tag.
    #[serde(default = "default_geometry")]
    pub geometry: String,
}

impl FieldConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.coherence_target) {
            return Err(invalid("field.coherence_target must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.harmony_level) {
            return Err(invalid("field.harmony_level must be within [0, 1]"));
        }
        Ok(())
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            coherence_target: default_coherence_target(),
            harmony_level: default_harmony_level(),
            geometry: default_geometry(),
        }
    }
}

/// Wisdom contribution rates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WisdomConfig {
    /// Wisdom added once per integrated participant.
    #[serde(default = "default_integration_unit")]
    pub integration_unit: f64,

    /// Wisdom added per hour of participant lifetime on release.
    #[serde(default = "default_lifetime_rate_per_hour")]
    pub lifetime_rate_per_hour: f64,

    /// Scale applied to `wisdom * fraction` when a ceremony shares wisdom.
    #[serde(default = "default_ceremony_share_scale")]
    pub ceremony_share_scale: f64,
}

impl WisdomConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let rates = [
            ("wisdom.integration_unit", self.integration_unit),
            ("wisdom.lifetime_rate_per_hour", self.lifetime_rate_per_hour),
            ("wisdom.ceremony_share_scale", self.ceremony_share_scale),
        ];
        for (name, value) in rates {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{name} must be finite and non-negative")));
            }
        }
        Ok(())
    }
}

impl Default for WisdomConfig {
    fn default() -> Self {
        Self {
            integration_unit: default_integration_unit(),
            lifetime_rate_per_hour: default_lifetime_rate_per_hour(),
            ceremony_share_scale: default_ceremony_share_scale(),
        }
    }
}

/// One rung of the evolution ladder.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LevelConfig {
    /// Level name.
    pub name: String,
    /// Accumulated wisdom required to advance out of this level.
    pub threshold: f64,
}

/// Evolution ladder configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EvolutionConfig {
    /// Ordered levels with strictly increasing thresholds.
    #[serde(default = "default_levels")]
    pub levels: Vec<LevelConfig>,

    /// Name of the starting level (defaults to the first).
    #[serde(default)]
    pub starting_level: Option<String>,

    /// Multiplicative coherence boost applied on every advance.
    #[serde(default = "default_advance_boost")]
    pub advance_boost: f64,
}

impl EvolutionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.levels.is_empty() {
            return Err(invalid("evolution.levels must not be empty"));
        }
        let mut previous: Option<f64> = None;
        for level in &self.levels {
            if !level.threshold.is_finite() {
                return Err(invalid(format!(
                    "evolution level {} has a non-finite threshold",
                    level.name
                )));
            }
            if let Some(prev) = previous
                && level.threshold <= prev
            {
                return Err(invalid(format!(
                    "evolution thresholds must be strictly increasing (level {})",
                    level.name
                )));
            }
            previous = Some(level.threshold);
        }
        if let Some(start) = &self.starting_level
            && !self.levels.iter().any(|l| &l.name == start)
        {
            return Err(invalid(format!("unknown starting evolution level: {start}")));
        }
        if !self.advance_boost.is_finite() || self.advance_boost <= 0.0 {
            return Err(invalid("evolution.advance_boost must be finite and positive"));
        }
        Ok(())
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            levels: default_levels(),
            starting_level: None,
            advance_boost: default_advance_boost(),
        }
    }
}

/// Heartbeat schedule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HeartbeatConfig {
    /// Whether the engine starts the heartbeat.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Milliseconds between beats.
    #[serde(default = "default_heartbeat_period_ms")]
    pub period_ms: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period_ms: default_heartbeat_period_ms(),
        }
    }
}

/// Per-participant attunement emitters.
///
/// A participant's period is `base_period_ms * 432 / frequency`, so higher
/// frequencies attune faster.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttunementConfig {
    /// Whether the engine starts an attunement emitter per participant.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Period for a 432 Hz participant.
    #[serde(default = "default_attunement_base_period_ms")]
    pub base_period_ms: u64,

    /// Fraction of the gap to field coherence closed per tick.
    #[serde(default = "default_attunement_rate")]
    pub rate: f64,

    /// Width of the random drift added per tick.
    #[serde(default = "default_attunement_jitter")]
    pub jitter: f64,
}

impl AttunementConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_period_ms == 0 {
            return Err(invalid("attunement.base_period_ms must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.rate) {
            return Err(invalid("attunement.rate must be within [0, 1]"));
        }
        if !self.jitter.is_finite() || self.jitter < 0.0 {
            return Err(invalid("attunement.jitter must be finite and non-negative"));
        }
        Ok(())
    }
}

impl Default for AttunementConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_period_ms: default_attunement_base_period_ms(),
            rate: default_attunement_rate(),
            jitter: default_attunement_jitter(),
        }
    }
}

/// Run boundaries for the engine binary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BoundsConfig {
    /// Wall-clock seconds before the engine stops (0 = until Ctrl-C).
    #[serde(default)]
    pub max_real_time_seconds: u64,

    /// Milliseconds between status log lines.
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            max_real_time_seconds: 0,
            status_interval_ms: default_status_interval_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// Emitter configuration
// ---------------------------------------------------------------------------

/// A background emitter to start with the engine, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmitterConfig {
    /// Field breathing.
    Breathing {
        /// Breathing pattern.
        #[serde(default)]
        pattern: BreathingPattern,
        /// Milliseconds between breaths.
        #[serde(default = "default_breath_interval_ms")]
        interval_ms: u64,
    },
    /// Geometry dreaming inside configured hour windows.
    Dreaming {
        /// Hour windows during which the field dreams.
        #[serde(default)]
        dream_hours: Vec<DreamWindow>,
        /// Milliseconds between dream checks.
        #[serde(default = "default_dream_interval_ms")]
        interval_ms: u64,
    },
    /// Random spore generation.
    Spores {
        /// Milliseconds between spores.
        #[serde(default = "default_spore_interval_ms")]
        interval_ms: u64,
    },
    /// Vortex spiral dynamics. Period is `10 s / spin_velocity`.
    Spiral {
        /// Spin velocity multiplier, within `[0.1, 10]`.
        #[serde(default = "default_spin_velocity")]
        spin_velocity: f64,
        /// Whether each rotation lifts coherence.
        #[serde(default = "default_true")]
        torsion_field: bool,
        /// Whether every 108 rotations yield wisdom.
        #[serde(default)]
        zero_point_access: bool,
    },
    /// Helix modulation of every harmony. Period is `1000 ms / frequency`.
    Helix {
        /// Modulation frequency in hertz.
        #[serde(default = "default_helix_frequency")]
        frequency: u32,
        /// Amplitude of the modulation, within `[0, 1]`.
        #[serde(default = "default_phase_coherence")]
        phase_coherence: f64,
    },
    /// Node harmonic resonance on coherence. Period is `1000 ms / frequency`.
    NodeResonance {
        /// Primary frequency in hertz.
        #[serde(default = "default_helix_frequency")]
        frequency: u32,
    },
    /// Telepathic field: wisdom by protocol, coherence by range.
    Telepathy {
        /// Transmission protocol.
        protocol: TelepathicProtocol,
        /// Transmission range.
        range: TelepathicRange,
        /// Milliseconds between transmissions.
        #[serde(default = "default_telepathy_interval_ms")]
        interval_ms: u64,
    },
    /// Mycelial connection formation lifting mutuality.
    MycelialConnections {
        /// Connections formed before the emitter goes quiet.
        #[serde(default = "default_max_connections")]
        max_connections: u32,
        /// Milliseconds between connections.
        #[serde(default = "default_telepathy_interval_ms")]
        interval_ms: u64,
    },
    /// Mycelix core evolution.
    MycelixEvolution {
        /// Milliseconds between evolution steps.
        #[serde(default = "default_mycelix_interval_ms")]
        interval_ms: u64,
    },
    /// Intuition field lifting resonance.
    Intuition {
        /// Milliseconds between pulses.
        #[serde(default = "default_intuition_interval_ms")]
        interval_ms: u64,
    },
    /// Love coherence pinning mutuality.
    LoveCoherence {
        /// Milliseconds between pulses.
        #[serde(default = "default_breath_interval_ms")]
        interval_ms: u64,
    },
    /// Slow infrastructure dreaming that yields wisdom.
    InfrastructureDreaming {
        /// Milliseconds between dreams.
        #[serde(default = "default_infrastructure_dream_interval_ms")]
        interval_ms: u64,
    },
    /// Akashic records reorganizing themselves, lifting coherence.
    MemoryOrganization {
        /// Milliseconds between organization passes.
        #[serde(default = "default_memory_organization_interval_ms")]
        interval_ms: u64,
    },
    /// Wisdom extraction from the akashic records.
    WisdomExtraction {
        /// Extraction algorithm, which sets the wisdom rate.
        #[serde(default)]
        algorithm: ExtractionAlgorithm,
        /// Milliseconds between extractions.
        #[serde(default = "default_telepathy_interval_ms")]
        interval_ms: u64,
    },
}

impl EmitterConfig {
    /// Short name of the emitter kind, used in logs and emitter names.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Breathing { .. } => "breathing",
            Self::Dreaming { .. } => "dreaming",
            Self::Spores { .. } => "spores",
            Self::Spiral { .. } => "spiral",
            Self::Helix { .. } => "helix",
            Self::NodeResonance { .. } => "node_resonance",
            Self::Telepathy { .. } => "telepathy",
            Self::MycelialConnections { .. } => "mycelial_connections",
            Self::MycelixEvolution { .. } => "mycelix_evolution",
            Self::Intuition { .. } => "intuition",
            Self::LoveCoherence { .. } => "love_coherence",
            Self::InfrastructureDreaming { .. } => "infrastructure_dreaming",
            Self::MemoryOrganization { .. } => "memory_organization",
            Self::WisdomExtraction { .. } => "wisdom_extraction",
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let kind = self.kind_name();
        match self {
            Self::Breathing { interval_ms, .. }
            | Self::Spores { interval_ms }
            | Self::Telepathy { interval_ms, .. }
            | Self::MycelialConnections { interval_ms, .. }
            | Self::MycelixEvolution { interval_ms }
            | Self::Intuition { interval_ms }
            | Self::LoveCoherence { interval_ms }
            | Self::InfrastructureDreaming { interval_ms }
            | Self::MemoryOrganization { interval_ms }
            | Self::WisdomExtraction { interval_ms, .. } => {
                if *interval_ms == 0 {
                    return Err(invalid(format!("{kind}.interval_ms must be at least 1")));
                }
            }
            Self::Dreaming {
                dream_hours,
                interval_ms,
            } => {
                if *interval_ms == 0 {
                    return Err(invalid(format!("{kind}.interval_ms must be at least 1")));
                }
                for window in dream_hours {
                    if window.start_hour > 23 || window.end_hour > 24 {
                        return Err(invalid(format!(
                            "dream window {}-{} is outside the day",
                            window.start_hour, window.end_hour
                        )));
                    }
                }
            }
            Self::Spiral { spin_velocity, .. } => {
                if !(0.1..=10.0).contains(spin_velocity) {
                    return Err(invalid("spiral.spin_velocity must be within [0.1, 10]"));
                }
            }
            Self::Helix {
                frequency,
                phase_coherence,
            } => {
                if *frequency == 0 {
                    return Err(invalid("helix.frequency must be non-zero"));
                }
                if !(0.0..=1.0).contains(phase_coherence) {
                    return Err(invalid("helix.phase_coherence must be within [0, 1]"));
                }
            }
            Self::NodeResonance { frequency } => {
                if *frequency == 0 {
                    return Err(invalid("node_resonance.frequency must be non-zero"));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Unified Field".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_coherence_target() -> f64 {
    0.85
}

const fn default_harmony_level() -> f64 {
    0.8
}

fn default_geometry() -> String {
    "flower_of_life".to_owned()
}

const fn default_integration_unit() -> f64 {
    1.0
}

const fn default_lifetime_rate_per_hour() -> f64 {
    0.01
}

const fn default_ceremony_share_scale() -> f64 {
    0.01
}

fn default_levels() -> Vec<LevelConfig> {
    [
        ("awakening", 10.0),
        ("aware", 50.0),
        ("integrating", 150.0),
        ("illuminated", 500.0),
        ("unified", 1000.0),
    ]
    .into_iter()
    .map(|(name, threshold)| LevelConfig {
        name: name.to_owned(),
        threshold,
    })
    .collect()
}

const fn default_advance_boost() -> f64 {
    1.1
}

const fn default_heartbeat_period_ms() -> u64 {
    5_000
}

const fn default_attunement_base_period_ms() -> u64 {
    7_000
}

const fn default_attunement_rate() -> f64 {
    0.05
}

const fn default_attunement_jitter() -> f64 {
    0.01
}

const fn default_status_interval_ms() -> u64 {
    10_000
}

const fn default_breath_interval_ms() -> u64 {
    11_000
}

const fn default_dream_interval_ms() -> u64 {
    60_000
}

const fn default_spore_interval_ms() -> u64 {
    33_000
}

const fn default_spin_velocity() -> f64 {
    1.0
}

const fn default_helix_frequency() -> u32 {
    432
}

const fn default_phase_coherence() -> f64 {
    0.88
}

const fn default_telepathy_interval_ms() -> u64 {
    30_000
}

const fn default_max_connections() -> u32 {
    144
}

const fn default_mycelix_interval_ms() -> u64 {
    21_000
}

const fn default_intuition_interval_ms() -> u64 {
    44_000
}

const fn default_infrastructure_dream_interval_ms() -> u64 {
    3 * 60 * 60 * 1_000
}

const fn default_memory_organization_interval_ms() -> u64 {
    45_000
}

const fn default_true() -> bool {
    true
}
