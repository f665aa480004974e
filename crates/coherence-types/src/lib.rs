//! Shared type definitions for the coherence field core.
//!
//! This crate is the single source of truth for the value types that flow
//! between the core and whatever lifecycle layer drives it.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for participant and emitter identifiers
//! - [`enums`] -- Harmony axes, emotional states, participant kinds
//! - [`structs`] -- The field record, participants, and ceremony effects

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EmotionalState, Harmony, ParticipantKind};
pub use ids::{EmitterId, ParticipantId};
pub use structs::{CeremonyEffect, Field, Participant, ParticipantRecord, clamp_unit};
