//! Integration tests for the periodic emitter framework.
//!
//! These run real emitter tasks on the multi-threaded tokio runtime and
//! check the concurrency properties of the shared field: no lost updates,
//! fault isolation, and cooperative stop.

#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::missing_panics_doc
)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use coherence_core::emitters::register_attunement;
use coherence_core::{
    CoreConfig, EmitterError, EmitterExit, EmitterGroup, FieldContext, Heartbeat, Schedule,
    emitter_fn, field_transform, wisdom_source,
};
use coherence_types::{Field, Harmony, ParticipantKind, ParticipantRecord};

// =============================================================================
// Helpers
// =============================================================================

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn context(coherence: f64) -> Arc<FieldContext> {
    FieldContext::with_field(
        &CoreConfig::default(),
        Field::new(coherence, 0.8, "flower_of_life"),
    )
    .unwrap()
}

fn record(name: &str, own: f64, frequency: u32) -> ParticipantRecord {
    ParticipantRecord {
        kind: ParticipantKind::MycelialVortex,
        name: name.to_owned(),
        purpose: format!("To amplify field coherence through {name}"),
        own_coherence: own,
        frequency,
    }
}

// =============================================================================
// Throughput and lost updates
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn hundred_emitters_lose_no_wisdom() {
    const EMITTERS: u64 = 100;
    const TICKS: u64 = 20;

    let ctx = context(0.5);
    let mut group = EmitterGroup::new();
    for i in 0..EMITTERS {
        let schedule = Schedule::every_ms(1).with_max_ticks(TICKS);
        let handle = ctx
            .register_emitter(schedule, wisdom_source(format!("counter-{i}"), || 1.0))
            .unwrap();
        group.push(handle);
    }

    let reports = group.join_all().await;
    assert_eq!(reports.len(), 100);
    for report in &reports {
        assert_eq!(report.exit, EmitterExit::Completed);
        assert_eq!(report.ticks, TICKS);
    }
    assert!(approx(ctx.wisdom(), (EMITTERS * TICKS) as f64));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transforms_keep_field_in_bounds() {
    let ctx = context(0.5);
    let mut group = EmitterGroup::new();
    for i in 0..16 {
        let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
        let emitter = field_transform(format!("swing-{i}"), move |field| {
            field.coherence += sign * 0.73;
            for value in field.harmonies.values_mut() {
                *value -= sign * 0.41;
            }
        });
        group.push(
            ctx.register_emitter(Schedule::every_ms(1).with_max_ticks(50), emitter)
                .unwrap(),
        );
    }

    let watcher = {
        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            for _ in 0..200 {
                assert!(ctx.snapshot().is_within_bounds());
                tokio::task::yield_now().await;
            }
        })
    };

    group.join_all().await;
    watcher.await.unwrap();
    assert!(ctx.snapshot().is_within_bounds());
}

// =============================================================================
// Fault isolation
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn faulting_and_panicking_emitters_stop_alone() {
    let ctx = context(0.5);

    let mut calls = 0_u32;
    let failing = emitter_fn("failing", move |_ctx| {
        calls += 1;
        if calls == 3 {
            return Err(EmitterError::Transform {
                emitter: "failing".to_owned(),
                reason: "third tick refused".to_owned(),
            });
        }
        Ok(())
    });

    let panicking = emitter_fn("panicking", |ctx| {
        ctx.field().apply_delta(|field| {
            field.coherence = 0.0;
            panic!("transform exploded");
        });
        Ok(())
    });

    let healthy = wisdom_source("healthy", || 1.0);

    let failing = ctx
        .register_emitter(Schedule::every_ms(2), failing)
        .unwrap();
    let panicking = ctx
        .register_emitter(Schedule::every_ms(2), panicking)
        .unwrap();
    let healthy = ctx
        .register_emitter(Schedule::every_ms(2).with_max_ticks(25), healthy)
        .unwrap();

    let failing = failing.join().await;
    assert_eq!(failing.ticks, 2);
    assert!(matches!(
        &failing.exit,
        EmitterExit::Faulted { reason } if reason.contains("third tick refused")
    ));

    let panicking = panicking.join().await;
    assert_eq!(panicking.ticks, 0);
    assert!(matches!(
        &panicking.exit,
        EmitterExit::Faulted { reason } if reason.contains("transform exploded")
    ));

    let healthy = healthy.join().await;
    assert_eq!(healthy.exit, EmitterExit::Completed);
    assert_eq!(healthy.ticks, 25);
    assert!(approx(ctx.wisdom(), 25.0));

    // The panicking transform never committed and the lock is still usable.
    assert!(approx(ctx.snapshot().coherence, 0.5));
    let committed = ctx.field().apply_delta(|field| field.coherence = 0.6);
    assert!(approx(committed.coherence, 0.6));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn attunement_faults_after_release() {
    let ctx = context(0.5);
    let id = ctx.integrate(record("vortex", 0.9, 432));
    let participant = ctx.participant(id).unwrap();
    let config = coherence_core::config::AttunementConfig {
        base_period_ms: 2,
        ..Default::default()
    };

    let handle = register_attunement(&ctx, &config, &participant).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    ctx.release(id).unwrap();

    let report = tokio::time::timeout(Duration::from_secs(5), handle.join())
        .await
        .unwrap();
    assert!(report.ticks >= 1);
    assert!(matches!(
        &report.exit,
        EmitterExit::Faulted { reason } if reason.contains("no longer registered")
    ));
}

// =============================================================================
// Stop
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_prevents_further_mutation() {
    let ctx = context(0.5);
    let counter = Arc::new(AtomicU64::new(0));
    let seen = Arc::clone(&counter);
    let emitter = emitter_fn("counting", move |ctx| {
        seen.fetch_add(1, Ordering::SeqCst);
        ctx.add_wisdom(1.0);
        Ok(())
    });

    let handle = ctx.register_emitter(Schedule::every_ms(2), emitter).unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    handle.stop();
    let report = handle.join().await;

    assert_eq!(report.exit, EmitterExit::Stopped);
    let after_join = ctx.wisdom();
    assert!(approx(after_join, report.ticks as f64));

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(approx(ctx.wisdom(), after_join));
    assert_eq!(counter.load(Ordering::SeqCst), report.ticks);
}

#[tokio::test(start_paused = true)]
async fn first_tick_waits_one_period() {
    let ctx = context(0.5);
    let handle = ctx
        .register_emitter(Schedule::every(Duration::from_secs(11)), wisdom_source("slow", || 1.0))
        .unwrap();

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(handle.ticks(), 0);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(handle.ticks(), 1);

    handle.stop();
    let report = handle.join().await;
    assert_eq!(report.ticks, 1);
    assert!(approx(ctx.wisdom(), 1.0));
}

#[tokio::test]
async fn zero_period_is_rejected() {
    let ctx = context(0.5);
    let result = ctx.register_emitter(Schedule::every(Duration::ZERO), wisdom_source("never", || 1.0));
    assert!(matches!(result, Err(EmitterError::InvalidSchedule { .. })));
}

#[tokio::test(start_paused = true)]
async fn stop_all_ends_every_emitter() {
    let ctx = context(0.5);
    let mut group = EmitterGroup::new();
    for i in 0..5 {
        group.push(
            ctx.register_emitter(
                Schedule::every_ms(100),
                field_transform(format!("novelty-{i}"), |f| f.scale_harmony(Harmony::Novelty, 1.001)),
            )
            .unwrap(),
        );
    }
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(group.running(), 5);
    group.stop_all();
    let reports = group.join_all().await;
    assert!(reports.iter().all(|r| r.exit == EmitterExit::Stopped));
    assert!(reports.iter().all(|r| r.ticks == 3));
}

// =============================================================================
// Heartbeat as an emitter
// =============================================================================

#[tokio::test(start_paused = true)]
async fn heartbeat_emitter_recomputes_and_records() {
    let ctx = context(0.6);
    ctx.integrate(record("alpha", 0.8, 528));
    ctx.integrate(record("beta", 0.6, 528));
    assert!(approx(ctx.snapshot().coherence, 0.65));
    assert!(ctx.last_heartbeat().is_none());

    let handle = ctx
        .register_emitter(Schedule::every_ms(5_000).with_max_ticks(2), Heartbeat::new())
        .unwrap();
    let report = handle.join().await;

    assert_eq!(report.exit, EmitterExit::Completed);
    assert_eq!(report.ticks, 2);
    assert!(approx(ctx.snapshot().coherence, 0.7));
    assert!(ctx.last_heartbeat().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn evolution_never_regresses_under_load() {
    let ctx = context(0.5);
    let mut group = EmitterGroup::new();
    group.push(
        ctx.register_emitter(Schedule::every_ms(1).with_max_ticks(200), wisdom_source("w", || 5.0))
            .unwrap(),
    );
    group.push(
        ctx.register_emitter(Schedule::every_ms(1).with_max_ticks(200), Heartbeat::new())
            .unwrap(),
    );

    let mut last = ctx.evolution().current_index();
    while group.running() > 0 {
        let now = ctx.evolution().current_index();
        assert!(now >= last);
        last = now;
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    group.join_all().await;
    assert!(ctx.evolution().current_index() >= last);
    assert!(approx(ctx.wisdom(), 1000.0));
}
