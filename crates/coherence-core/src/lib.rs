//! Shared field state, participants, wisdom, evolution and periodic emitters.
//!
//! This crate owns everything that mutates the coherence field. A single
//! [`FieldContext`] is built from a validated [`CoreConfig`] and shared via
//! `Arc` with every background emitter.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `coherence-config.yaml` into
//!   strongly-typed structs.
//! - [`context`] -- [`FieldContext`], the facade over all shared state.
//! - [`field`] -- [`FieldStore`], the clamped, lock-guarded field record.
//! - [`registry`] -- The participant registry.
//! - [`wisdom`] -- The monotonic wisdom accumulator.
//! - [`evolution`] -- The forward-only evolution ladder.
//! - [`emitter`] -- The [`Emitter`] trait, schedules, handles and the task
//!   loop.
//! - [`heartbeat`] -- The heartbeat emitter and emotional bands.
//! - [`emitters`] -- Concrete emitter variants.
//! - [`flavor`] -- Seedable randomness for emitters.
//!
//! [`FieldContext`]: context::FieldContext
//! [`CoreConfig`]: config::CoreConfig
//! [`FieldStore`]: field::FieldStore
//! [`Emitter`]: emitter::Emitter

pub mod config;
pub mod context;
pub mod emitter;
pub mod emitters;
pub mod error;
pub mod evolution;
pub mod field;
pub mod flavor;
pub mod heartbeat;
pub mod registry;
pub mod wisdom;

pub use config::{ConfigError, CoreConfig};
pub use context::{CeremonyOutcome, FieldContext, FieldStatus};
pub use emitter::{
    Emitter, EmitterExit, EmitterGroup, EmitterHandle, EmitterReport, Schedule, emitter_fn,
    field_transform, wisdom_source,
};
pub use error::{CoreError, EmitterError};
pub use evolution::Evaluation;
pub use heartbeat::{Heartbeat, HeartbeatReport};
