//! The periodic emitter framework.
//!
//! An emitter is a background task that applies one transform to the
//! shared field per tick. Each emitter runs on its own tokio task with its
//! own [`Schedule`]; there is no ordering between emitters. A tick is fully
//! committed before the next one starts.
//!
//! # Lifecycle
//!
//! 1. [`FieldContext::register_emitter`] validates the schedule and spawns
//!    the task. The first tick fires one full period after registration.
//! 2. [`EmitterHandle::stop`] requests a cooperative stop, honored at the
//!    next tick boundary. A tick already in flight completes.
//! 3. [`EmitterHandle::join`] waits for the task and returns an
//!    [`EmitterReport`].
//!
//! # Fault isolation
//!
//! A tick that returns `Err` or panics is caught at the task boundary,
//! logged, and ends that emitter only. The field store uses non-poisoning
//! locks and commits through a working copy, so a panicking transform
//! leaves no partial state behind.
//!
//! [`FieldContext::register_emitter`]: crate::context::FieldContext::register_emitter

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use coherence_types::{EmitterId, Field};
use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::context::FieldContext;
use crate::error::EmitterError;

// ---------------------------------------------------------------------------
// Emitter trait and adapters
// ---------------------------------------------------------------------------

/// A periodic transform over the shared field.
///
/// `tick` is synchronous: it runs entirely under the context's in-memory
/// locks and must not block on I/O.
pub trait Emitter: Send + 'static {
    /// Name used in logs and reports.
    fn name(&self) -> &str;

    /// Apply one transform.
    fn tick(&mut self, ctx: &FieldContext) -> Result<(), EmitterError>;
}

impl Emitter for Box<dyn Emitter> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn tick(&mut self, ctx: &FieldContext) -> Result<(), EmitterError> {
        (**self).tick(ctx)
    }
}

/// Emitter backed by a closure over the whole context.
pub struct FnEmitter<F> {
    name: String,
    tick: F,
}

impl<F> Emitter for FnEmitter<F>
where
    F: FnMut(&FieldContext) -> Result<(), EmitterError> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&mut self, ctx: &FieldContext) -> Result<(), EmitterError> {
        (self.tick)(ctx)
    }
}

/// Wrap a closure as an [`Emitter`].
pub fn emitter_fn<F>(name: impl Into<String>, tick: F) -> FnEmitter<F>
where
    F: FnMut(&FieldContext) -> Result<(), EmitterError> + Send + 'static,
{
    FnEmitter {
        name: name.into(),
        tick,
    }
}

/// Emitter that applies one field delta per tick.
pub struct FieldTransform<F> {
    name: String,
    transform: F,
}

impl<F> Emitter for FieldTransform<F>
where
    F: FnMut(&mut Field) + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&mut self, ctx: &FieldContext) -> Result<(), EmitterError> {
        ctx.field().apply_delta(|field| (self.transform)(field));
        Ok(())
    }
}

/// Build an emitter that runs `transform` through one `apply_delta` per tick.
pub fn field_transform<F>(name: impl Into<String>, transform: F) -> FieldTransform<F>
where
    F: FnMut(&mut Field) + Send + 'static,
{
    FieldTransform {
        name: name.into(),
        transform,
    }
}

/// Emitter that adds one wisdom contribution per tick.
pub struct WisdomSource<F> {
    name: String,
    amount: F,
}

impl<F> Emitter for WisdomSource<F>
where
    F: FnMut() -> f64 + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&mut self, ctx: &FieldContext) -> Result<(), EmitterError> {
        ctx.add_wisdom((self.amount)());
        Ok(())
    }
}

/// Build an emitter that adds `amount()` to wisdom every tick.
pub fn wisdom_source<F>(name: impl Into<String>, amount: F) -> WisdomSource<F>
where
    F: FnMut() -> f64 + Send + 'static,
{
    WisdomSource {
        name: name.into(),
        amount,
    }
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// How often an emitter ticks and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// Time between ticks. Must be non-zero.
    pub period: Duration,
    /// Stop after this many successful ticks (`None` = until stopped).
    pub max_ticks: Option<u64>,
}

impl Schedule {
    /// Tick every `period` until stopped.
    pub const fn every(period: Duration) -> Self {
        Self {
            period,
            max_ticks: None,
        }
    }

    /// Tick every `millis` milliseconds until stopped.
    pub const fn every_ms(millis: u64) -> Self {
        Self::every(Duration::from_millis(millis))
    }

    /// Limit the schedule to `max_ticks` successful ticks.
    #[must_use]
    pub const fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    /// Check that the schedule can be run.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::InvalidSchedule`] for a zero period.
    pub fn validate(&self) -> Result<(), EmitterError> {
        if self.period.is_zero() {
            return Err(EmitterError::InvalidSchedule {
                reason: "period must be non-zero".to_owned(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Why an emitter task ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmitterExit {
    /// [`EmitterHandle::stop`] was called.
    Stopped,
    /// The schedule's `max_ticks` was reached.
    Completed,
    /// A tick returned an error or panicked.
    Faulted {
        /// Error message or panic payload.
        reason: String,
    },
}

/// Final accounting for an emitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmitterReport {
    /// Emitter ID.
    pub id: EmitterId,
    /// Emitter name.
    pub name: String,
    /// Successful ticks committed.
    pub ticks: u64,
    /// Why the emitter ended.
    pub exit: EmitterExit,
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Stop flag shared between a handle and its task.
#[derive(Debug, Default)]
struct StopSignal {
    stopped: AtomicBool,
    notify: Notify,
}

impl StopSignal {
    fn request(&self) {
        self.stopped.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    fn is_requested(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Control handle for a running emitter.
///
/// Dropping the handle does not stop the emitter.
#[derive(Debug)]
pub struct EmitterHandle {
    id: EmitterId,
    name: String,
    signal: Arc<StopSignal>,
    ticks: Arc<AtomicU64>,
    task: JoinHandle<EmitterReport>,
}

impl EmitterHandle {
    /// Emitter ID.
    pub const fn id(&self) -> EmitterId {
        self.id
    }

    /// Emitter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Successful ticks so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Request a stop at the next tick boundary.
    pub fn stop(&self) {
        self.signal.request();
    }

    /// Whether the emitter task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the emitter to end and return its report.
    pub async fn join(self) -> EmitterReport {
        match self.task.await {
            Ok(report) => report,
            Err(err) => EmitterReport {
                id: self.id,
                name: self.name,
                ticks: self.ticks.load(Ordering::Acquire),
                exit: EmitterExit::Faulted {
                    reason: err.to_string(),
                },
            },
        }
    }
}

/// A set of emitters stopped and joined together.
#[derive(Debug, Default)]
pub struct EmitterGroup {
    handles: Vec<EmitterHandle>,
}

impl EmitterGroup {
    /// Create an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handle to the group.
    pub fn push(&mut self, handle: EmitterHandle) {
        self.handles.push(handle);
    }

    /// Number of emitters in the group.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether the group is empty.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Number of emitters still running.
    pub fn running(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Request a stop on every emitter.
    pub fn stop_all(&self) {
        for handle in &self.handles {
            handle.stop();
        }
    }

    /// Wait for every emitter and return their reports in registration order.
    pub async fn join_all(self) -> Vec<EmitterReport> {
        futures::future::join_all(self.handles.into_iter().map(EmitterHandle::join)).await
    }
}

impl Extend<EmitterHandle> for EmitterGroup {
    fn extend<T: IntoIterator<Item = EmitterHandle>>(&mut self, iter: T) {
        self.handles.extend(iter);
    }
}

impl IntoIterator for EmitterGroup {
    type Item = EmitterHandle;
    type IntoIter = std::vec::IntoIter<EmitterHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.handles.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Task loop
// ---------------------------------------------------------------------------

/// Spawn the task driving `emitter` on `schedule`.
pub(crate) fn spawn<E>(ctx: Arc<FieldContext>, schedule: Schedule, emitter: E) -> EmitterHandle
where
    E: Emitter,
{
    let id = EmitterId::new();
    let name = emitter.name().to_owned();
    let signal = Arc::new(StopSignal::default());
    let ticks = Arc::new(AtomicU64::new(0));

    let task = tokio::spawn(run(
        ctx,
        id,
        schedule,
        emitter,
        Arc::clone(&signal),
        Arc::clone(&ticks),
    ));

    EmitterHandle {
        id,
        name,
        signal,
        ticks,
        task,
    }
}

async fn run<E>(
    ctx: Arc<FieldContext>,
    id: EmitterId,
    schedule: Schedule,
    mut emitter: E,
    signal: Arc<StopSignal>,
    ticks: Arc<AtomicU64>,
) -> EmitterReport
where
    E: Emitter,
{
    let name = emitter.name().to_owned();
    info!(
        emitter = %name,
        emitter_id = %id,
        period_ms = u64::try_from(schedule.period.as_millis()).unwrap_or(u64::MAX),
        max_ticks = ?schedule.max_ticks,
        "Emitter started"
    );

    let mut interval = tokio::time::interval_at(Instant::now() + schedule.period, schedule.period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let exit = loop {
        if signal.is_requested() {
            break EmitterExit::Stopped;
        }
        if schedule
            .max_ticks
            .is_some_and(|max| ticks.load(Ordering::Acquire) >= max)
        {
            break EmitterExit::Completed;
        }

        tokio::select! {
            biased;
            () = signal.notify.notified() => continue,
            _ = interval.tick() => {}
        }

        if signal.is_requested() {
            break EmitterExit::Stopped;
        }

        match std::panic::catch_unwind(AssertUnwindSafe(|| emitter.tick(&ctx))) {
            Ok(Ok(())) => {
                let n = ticks.fetch_add(1, Ordering::AcqRel).saturating_add(1);
                debug!(emitter = %name, tick = n, "Emitter tick committed");
            }
            Ok(Err(err)) => {
                error!(emitter = %name, emitter_id = %id, error = %err, "Emitter tick failed");
                break EmitterExit::Faulted {
                    reason: err.to_string(),
                };
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                error!(emitter = %name, emitter_id = %id, reason = %reason, "Emitter tick panicked");
                break EmitterExit::Faulted { reason };
            }
        }
    };

    let total = ticks.load(Ordering::Acquire);
    info!(emitter = %name, emitter_id = %id, ticks = total, exit = ?exit, "Emitter ended");
    EmitterReport {
        id,
        name,
        ticks: total,
        exit,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        return (*msg).to_owned();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "emitter panicked".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn zero_period_is_rejected() {
        assert!(Schedule::every(Duration::ZERO).validate().is_err());
        assert!(Schedule::every_ms(1).validate().is_ok());
    }

    #[test]
    fn with_max_ticks_sets_limit() {
        let schedule = Schedule::every_ms(10).with_max_ticks(3);
        assert_eq!(schedule.max_ticks, Some(3));
        assert_eq!(schedule.period, Duration::from_millis(10));
    }

    #[test]
    fn panic_message_extracts_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "emitter panicked");
    }

    #[test]
    fn report_serializes_exit_tag() {
        let report = EmitterReport {
            id: EmitterId::new(),
            name: "spores".to_owned(),
            ticks: 3,
            exit: EmitterExit::Faulted {
                reason: "boom".to_owned(),
            },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["exit"]["kind"], "faulted");
        assert_eq!(json["ticks"], 3);
    }
}
