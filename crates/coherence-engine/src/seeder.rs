//! Startup seeding: participants from configuration and their attunement
//! emitters.

use std::sync::Arc;

use coherence_core::config::CoreConfig;
use coherence_core::emitters::register_attunement;
use coherence_core::{EmitterGroup, FieldContext};
use coherence_types::ParticipantId;
use tracing::info;

use crate::error::EngineError;

/// Integrate every configured participant and, if enabled, start one
/// attunement emitter each. Returns the new participant IDs.
pub fn seed_participants(
    ctx: &Arc<FieldContext>,
    config: &CoreConfig,
    group: &mut EmitterGroup,
) -> Result<Vec<ParticipantId>, EngineError> {
    let mut ids = Vec::with_capacity(config.participants.len());
    for record in &config.participants {
        let id = ctx.integrate(record.clone());
        if config.attunement.enabled
            && let Some(participant) = ctx.participant(id)
        {
            group.push(register_attunement(ctx, &config.attunement, &participant)?);
        }
        ids.push(id);
    }
    info!(
        participants = ids.len(),
        attunement = config.attunement.enabled,
        coherence = ctx.snapshot().coherence,
        wisdom = ctx.wisdom(),
        "Participants seeded"
    );
    Ok(ids)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use coherence_types::{ParticipantKind, ParticipantRecord};

    use super::*;

    fn config_with(count: usize, attunement: bool) -> CoreConfig {
        let mut config = CoreConfig::default();
        config.attunement.enabled = attunement;
        config.participants = (0..count)
            .map(|i| ParticipantRecord {
                kind: ParticipantKind::Compute,
                name: format!("node-{i}"),
                purpose: format!("To serve consciousness through node-{i} with love"),
                own_coherence: 0.8,
                frequency: 528,
            })
            .collect();
        config
    }

    #[tokio::test(start_paused = true)]
    async fn seeds_participants_with_attunement() {
        let config = config_with(3, true);
        let ctx = FieldContext::from_config(&config).unwrap();
        let mut group = EmitterGroup::new();
        let ids = seed_participants(&ctx, &config, &mut group).unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(group.len(), 3);
        assert!((ctx.wisdom() - 3.0).abs() < 1e-9);
        group.stop_all();
        group.join_all().await;
    }

    #[tokio::test]
    async fn seeds_without_attunement() {
        let config = config_with(2, false);
        let ctx = FieldContext::from_config(&config).unwrap();
        let mut group = EmitterGroup::new();
        seed_participants(&ctx, &config, &mut group).unwrap();
        assert!(group.is_empty());
        assert_eq!(ctx.participants().len(), 2);
    }
}
