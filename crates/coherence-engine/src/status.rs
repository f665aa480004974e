//! Periodic status logging and the shutdown wait.

use std::fmt;
use std::time::Duration;

use coherence_core::config::BoundsConfig;
use coherence_core::FieldContext;
use tracing::{info, warn};

use crate::error::EngineError;

/// Why the engine left its status loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Ctrl-C was received.
    Interrupted,
    /// `max_real_time_seconds` elapsed.
    TimeLimit,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupted => write!(f, "interrupted"),
            Self::TimeLimit => write!(f, "time_limit"),
        }
    }
}

/// Log a status line every `status_interval_ms` until Ctrl-C or the
/// wall-clock bound. A zero interval disables periodic status lines.
pub async fn run_until_shutdown(
    ctx: &FieldContext,
    bounds: &BoundsConfig,
) -> Result<ShutdownReason, EngineError> {
    let deadline = async {
        if bounds.max_real_time_seconds == 0 {
            std::future::pending::<()>().await;
        } else {
            tokio::time::sleep(Duration::from_secs(bounds.max_real_time_seconds)).await;
        }
    };
    tokio::pin!(deadline);

    let period = Duration::from_millis(bounds.status_interval_ms.max(1));
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                return Ok(ShutdownReason::Interrupted);
            }
            () = &mut deadline => return Ok(ShutdownReason::TimeLimit),
            _ = interval.tick() => {
                if bounds.status_interval_ms > 0 {
                    log_status(ctx);
                }
            }
        }
    }
}

/// Log one structured status line.
pub fn log_status(ctx: &FieldContext) {
    let status = ctx.status();
    info!(
        coherence = status.field.coherence,
        emotional_state = status.field.emotional_state.as_str(),
        geometry = status.field.geometry.as_str(),
        wisdom = status.wisdom,
        level = status.level.as_str(),
        final_level = ctx.evolution().is_terminal(),
        participants = status.participants,
        age_seconds = status.age_seconds,
        "Field status"
    );
}

/// Log the closing status as a single JSON document.
pub fn log_final(ctx: &FieldContext) {
    match serde_json::to_string(&ctx.status()) {
        Ok(json) => info!(status = json.as_str(), "Final field status"),
        Err(err) => warn!(error = %err, "Could not serialize final status"),
    }
}
