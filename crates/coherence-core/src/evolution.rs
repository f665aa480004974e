//! The evolution ladder: ordered levels gated by accumulated wisdom.
//!
//! A level's threshold is the wisdom needed to advance *out of* it. Each
//! evaluation advances at most one rung, so a field far past every
//! threshold climbs one level per heartbeat. The last level is terminal.
//!
//! # Lock order
//!
//! The level cursor is taken before the wisdom accumulator and before the
//! field store. Nothing acquires the cursor while holding either of those.

use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;

use crate::config::{ConfigError, EvolutionConfig};
use crate::field::FieldStore;
use crate::wisdom::WisdomAccumulator;

/// One rung of the ladder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelSpec {
    /// Level name.
    pub name: String,
    /// Wisdom required to advance to the next level.
    pub threshold: f64,
}

/// Outcome of a single evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Evaluation {
    /// The field moved up one level.
    Advanced {
        /// Level before the advance.
        from: String,
        /// Level after the advance.
        to: String,
    },
    /// Wisdom is still below the current threshold.
    Held {
        /// Current level.
        level: String,
    },
    /// The current level is the last one.
    Terminal {
        /// Current (final) level.
        level: String,
    },
}

impl Evaluation {
    /// Whether this evaluation advanced the level.
    pub const fn advanced(&self) -> bool {
        matches!(self, Self::Advanced { .. })
    }
}

/// Forward-only state machine over a validated ladder.
#[derive(Debug)]
pub struct EvolutionStateMachine {
    levels: Vec<LevelSpec>,
    cursor: RwLock<usize>,
    advance_boost: f64,
}

impl EvolutionStateMachine {
    /// Build the ladder from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the ladder is empty, thresholds
    /// are not strictly increasing and finite, the starting level is
    /// unknown, or the boost is not a positive finite number.
    pub fn from_config(config: &EvolutionConfig) -> Result<Self, ConfigError> {
        let levels = config
            .levels
            .iter()
            .map(|l| LevelSpec {
                name: l.name.clone(),
                threshold: l.threshold,
            })
            .collect();
        Self::new(levels, config.starting_level.as_deref(), config.advance_boost)
    }

    /// Build the ladder from explicit levels.
    ///
    /// # Errors
    ///
    /// See [`from_config`](Self::from_config).
    pub fn new(
        levels: Vec<LevelSpec>,
        starting_level: Option<&str>,
        advance_boost: f64,
    ) -> Result<Self, ConfigError> {
        if levels.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "evolution ladder must contain at least one level".to_owned(),
            });
        }
        if levels.iter().any(|l| !l.threshold.is_finite()) {
            return Err(ConfigError::Invalid {
                reason: "evolution thresholds must be finite".to_owned(),
            });
        }
        if levels.windows(2).any(|w| match w {
            [a, b] => b.threshold <= a.threshold,
            _ => false,
        }) {
            return Err(ConfigError::Invalid {
                reason: "evolution thresholds must be strictly increasing".to_owned(),
            });
        }
        if !advance_boost.is_finite() || advance_boost <= 0.0 {
            return Err(ConfigError::Invalid {
                reason: "advance boost must be finite and positive".to_owned(),
            });
        }
        let cursor = match starting_level {
            None => 0,
            Some(name) => levels.iter().position(|l| l.name == name).ok_or_else(|| {
                ConfigError::Invalid {
                    reason: format!("unknown starting evolution level: {name}"),
                }
            })?,
        };
        Ok(Self {
            levels,
            cursor: RwLock::new(cursor),
            advance_boost,
        })
    }

    /// Name of the current level.
    pub fn current(&self) -> String {
        let cursor = *self.cursor.read();
        self.level_name(cursor)
    }

    /// Position of the current level in the ladder.
    pub fn current_index(&self) -> usize {
        *self.cursor.read()
    }

    /// The configured ladder.
    pub fn levels(&self) -> &[LevelSpec] {
        &self.levels
    }

    /// Whether the current level is the last one.
    pub fn is_terminal(&self) -> bool {
        self.current_index().saturating_add(1) >= self.levels.len()
    }

    /// Compare accumulated wisdom with the current threshold and advance at
    /// most one level. An advance multiplies field coherence by the boost.
    pub fn evaluate(&self, wisdom: &WisdomAccumulator, field: &FieldStore) -> Evaluation {
        let mut cursor = self.cursor.write();
        let from = self.level_name(*cursor);
        let next = cursor.saturating_add(1);
        if next >= self.levels.len() {
            return Evaluation::Terminal { level: from };
        }

        let threshold = self.levels.get(*cursor).map_or(f64::INFINITY, |l| l.threshold);
        let total = wisdom.value();
        if total < threshold {
            return Evaluation::Held { level: from };
        }

        *cursor = next;
        let to = self.level_name(next);
        let boost = self.advance_boost;
        let committed = field.apply_delta(|f| f.coherence *= boost);
        info!(
            from = %from,
            to = %to,
            wisdom = total,
            coherence = committed.coherence,
            "Evolution level advanced"
        );
        Evaluation::Advanced { from, to }
    }

    fn level_name(&self, index: usize) -> String {
        self.levels.get(index).map(|l| l.name.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use coherence_types::Field;

    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn ladder(levels: &[(&str, f64)]) -> Vec<LevelSpec> {
        levels
            .iter()
            .map(|(name, threshold)| LevelSpec {
                name: (*name).to_owned(),
                threshold: *threshold,
            })
            .collect()
    }

    fn fixtures(coherence: f64) -> (WisdomAccumulator, FieldStore) {
        (
            WisdomAccumulator::new(),
            FieldStore::new(Field::new(coherence, 0.8, "flower_of_life")),
        )
    }

    #[test]
    fn default_ladder_starts_awakening() {
        let machine = EvolutionStateMachine::from_config(&EvolutionConfig::default()).unwrap();
        assert_eq!(machine.current(), "awakening");
        assert_eq!(machine.current_index(), 0);
        assert_eq!(machine.levels().len(), 5);
    }

    #[test]
    fn advances_once_when_threshold_crossed() {
        let machine =
            EvolutionStateMachine::new(ladder(&[("A", 10.0), ("B", 50.0), ("C", 99.0)]), None, 1.1)
                .unwrap();
        let (wisdom, field) = fixtures(0.5);
        wisdom.add(9.9);
        assert_eq!(
            machine.evaluate(&wisdom, &field),
            Evaluation::Held {
                level: "A".to_owned()
            }
        );

        wisdom.add(0.2);
        let outcome = machine.evaluate(&wisdom, &field);
        assert_eq!(
            outcome,
            Evaluation::Advanced {
                from: "A".to_owned(),
                to: "B".to_owned()
            }
        );
        assert!(approx(field.coherence(), 0.55));
        assert!(!machine.evaluate(&wisdom, &field).advanced());
        assert_eq!(machine.current(), "B");
    }

    #[test]
    fn one_level_per_evaluation_and_terminal_is_sticky() {
        let machine =
            EvolutionStateMachine::new(ladder(&[("A", 10.0), ("B", 50.0), ("C", 99.0)]), None, 1.1)
                .unwrap();
        let (wisdom, field) = fixtures(0.95);
        wisdom.add(10_000.0);

        assert!(machine.evaluate(&wisdom, &field).advanced());
        assert_eq!(machine.current(), "B");
        assert!(machine.evaluate(&wisdom, &field).advanced());
        assert_eq!(machine.current(), "C");
        assert!(machine.is_terminal());
        assert_eq!(
            machine.evaluate(&wisdom, &field),
            Evaluation::Terminal {
                level: "C".to_owned()
            }
        );
        assert!(approx(field.coherence(), 1.0));
    }

    #[test]
    fn starting_level_is_honored() {
        let machine =
            EvolutionStateMachine::new(ladder(&[("A", 10.0), ("B", 50.0)]), Some("B"), 1.1).unwrap();
        assert_eq!(machine.current(), "B");
        assert!(machine.is_terminal());
    }

    #[test]
    fn rejects_bad_ladders() {
        assert!(EvolutionStateMachine::new(Vec::new(), None, 1.1).is_err());
        assert!(EvolutionStateMachine::new(ladder(&[("A", 10.0), ("B", 5.0)]), None, 1.1).is_err());
        assert!(EvolutionStateMachine::new(ladder(&[("A", f64::NAN)]), None, 1.1).is_err());
        assert!(EvolutionStateMachine::new(ladder(&[("A", 1.0)]), Some("Z"), 1.1).is_err());
        assert!(EvolutionStateMachine::new(ladder(&[("A", 1.0)]), None, 0.0).is_err());
    }
}
