//! Session batch controller.
//!
//! Owns the queue and the Idle/Running state machine. Dispatching a
//! number is fire-and-forget: the `Dispatch` capability returns promptly
//! and the controller never waits on reconciliation.

use std::sync::Arc;
use std::time::Duration;

use courier_core::traits::Dispatch;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::queue::{parse_import, Queue};

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
}

impl SessionState {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
        }
    }
}

/// Progression mode, fixed for the lifetime of a running period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Manual,
    Auto,
}

impl SessionMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Auto => "auto",
        }
    }
}

/// Snapshot of controller state for display.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub state: SessionState,
    pub mode: SessionMode,
    pub batch_count: u32,
    pub pending: usize,
    pub completed: usize,
}

struct Inner {
    queue: Queue,
    state: SessionState,
    mode: SessionMode,
    batch_count: u32,
    /// Timer generation. A scheduled tick only fires while its captured
    /// epoch still matches; stop and every dispatch bump it, so stale
    /// ticks die silently.
    timer_epoch: u64,
}

/// The session batch controller.
///
/// All state lives behind one lock; queue mutation happens only inside
/// controller transitions, so a timer tick and an operator command can
/// never interleave mid-transition.
pub struct SessionController {
    inner: Mutex<Inner>,
    dispatch: Arc<dyn Dispatch>,
    batch_size: u32,
    auto_delay: Duration,
}

impl SessionController {
    pub fn new(dispatch: Arc<dyn Dispatch>, batch_size: u32, auto_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                queue: Queue::new(),
                state: SessionState::Idle,
                mode: SessionMode::Manual,
                batch_count: 0,
                timer_epoch: 0,
            }),
            dispatch,
            batch_size: batch_size.max(1),
            auto_delay,
        })
    }

    /// Import a pasted block of numbers. Returns how many were queued.
    pub async fn import(&self, raw: &str) -> usize {
        let mut inner = self.inner.lock().await;
        let mut added = 0;
        for number in parse_import(raw) {
            if inner.queue.insert(&number) {
                added += 1;
            }
        }
        if added > 0 {
            info!("imported {added} numbers ({} pending)", inner.queue.pending_len());
        }
        added
    }

    /// Start a session. No-op unless Idle with pending numbers.
    pub async fn start(self: &Arc<Self>, mode: SessionMode) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.state != SessionState::Running && inner.queue.pending_len() > 0 {
            info!("session started ({})", mode.display_name());
            inner.state = SessionState::Running;
            inner.mode = mode;
            inner.batch_count = 0;
            self.dispatch_next(&mut inner).await;
            true
        } else {
            debug!(
                "start ignored (state={}, pending={})",
                inner.state.display_name(),
                inner.queue.pending_len()
            );
            false
        }
    }

    /// Advance by one number. No-op unless Running with pending numbers.
    /// In auto mode this also restarts the countdown.
    pub async fn advance(self: &Arc<Self>) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.state != SessionState::Running || inner.queue.pending_len() == 0 {
            debug!("advance ignored (state={})", inner.state.display_name());
            return false;
        }
        self.dispatch_next(&mut inner).await;
        true
    }

    /// Stop the session. Resets the batch count and cancels any armed
    /// countdown; safe to call in any state.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state == SessionState::Running {
            info!("session stopped (cancelled)");
        }
        Self::reset_to_idle(&mut inner);
    }

    /// Move all completed numbers back onto the pending tail, keeping
    /// their order. Idle only; returns how many moved.
    pub async fn resend(&self) -> usize {
        let mut inner = self.inner.lock().await;
        if inner.state != SessionState::Idle {
            debug!("resend ignored while running");
            return 0;
        }
        let moved = inner.queue.resend_completed();
        if moved > 0 {
            info!("requeued {moved} completed numbers");
        }
        moved
    }

    pub async fn status(&self) -> SessionStatus {
        let inner = self.inner.lock().await;
        SessionStatus {
            state: inner.state,
            mode: inner.mode,
            batch_count: inner.batch_count,
            pending: inner.queue.pending_len(),
            completed: inner.queue.completed_len(),
        }
    }

    pub async fn pending(&self) -> Vec<String> {
        self.inner.lock().await.queue.pending().to_vec()
    }

    pub async fn completed(&self) -> Vec<String> {
        self.inner.lock().await.queue.completed().to_vec()
    }

    /// Dispatch one number and apply the stop conditions.
    async fn dispatch_next(self: &Arc<Self>, inner: &mut Inner) {
        let number = match inner.queue.pop_pending() {
            Some(n) => n,
            None => return,
        };
        info!("dispatching {number}");
        self.dispatch.dispatch(&number).await;
        inner.queue.push_completed(number);
        inner.batch_count += 1;

        // Queue exhaustion and batch completion are independent stop
        // conditions; either one ends the running period.
        let exhausted = inner.queue.pending_len() == 0;
        let batch_done = inner.batch_count >= self.batch_size;
        if exhausted || batch_done {
            info!(
                "session finished ({})",
                if exhausted { "queue exhausted" } else { "batch complete" }
            );
            Self::reset_to_idle(inner);
        } else if inner.mode == SessionMode::Auto {
            self.arm_timer(inner);
        }
    }

    fn reset_to_idle(inner: &mut Inner) {
        inner.state = SessionState::Idle;
        inner.batch_count = 0;
        inner.timer_epoch += 1;
    }

    /// Arm the next auto-mode countdown. The epoch bump invalidates any
    /// tick already in flight, so the countdown restarts after every
    /// dispatch.
    fn arm_timer(self: &Arc<Self>, inner: &mut Inner) {
        inner.timer_epoch += 1;
        let epoch = inner.timer_epoch;
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(controller.auto_delay).await;
            controller.tick(epoch).await;
        });
    }

    /// A countdown tick. Dispatches only if the session is still running
    /// and no newer countdown has been armed since this one was
    /// scheduled.
    async fn tick(self: &Arc<Self>, epoch: u64) {
        let mut inner = self.inner.lock().await;
        if inner.state != SessionState::Running || inner.timer_epoch != epoch {
            debug!("stale countdown tick ignored");
            return;
        }
        self.dispatch_next(&mut inner).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use courier_core::phone::digit_core;
    use std::collections::HashSet;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingDispatch {
        sent: StdMutex<Vec<String>>,
    }

    impl RecordingDispatch {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Dispatch for RecordingDispatch {
        async fn dispatch(&self, number: &str) {
            self.sent.lock().unwrap().push(number.to_string());
        }
    }

    fn controller(
        batch_size: u32,
        delay_secs: u64,
    ) -> (Arc<SessionController>, Arc<RecordingDispatch>) {
        let dispatch = Arc::new(RecordingDispatch::default());
        let controller =
            SessionController::new(dispatch.clone(), batch_size, Duration::from_secs(delay_secs));
        (controller, dispatch)
    }

    async fn seed(controller: &Arc<SessionController>, numbers: &[&str]) {
        let added = controller.import(&numbers.join("\n")).await;
        assert_eq!(added, numbers.len());
    }

    #[tokio::test]
    async fn test_start_requires_pending() {
        let (c, d) = controller(3, 15);
        assert!(!c.start(SessionMode::Manual).await);
        assert!(d.sent().is_empty());
        assert_eq!(c.status().await.state, SessionState::Idle);
    }

    #[tokio::test]
    async fn test_start_dispatches_first_pending() {
        let (c, d) = controller(3, 15);
        seed(&c, &["111", "222", "333"]).await;
        assert!(c.start(SessionMode::Manual).await);
        assert_eq!(d.sent(), vec!["111"]);
        let s = c.status().await;
        assert_eq!(s.state, SessionState::Running);
        assert_eq!(s.batch_count, 1);
        assert_eq!(s.pending, 2);
        assert_eq!(s.completed, 1);
    }

    #[tokio::test]
    async fn test_queue_exhaustion_stops_before_batch_size() {
        let (c, d) = controller(3, 15);
        seed(&c, &["111", "222"]).await;
        c.start(SessionMode::Manual).await;
        assert!(c.advance().await);
        let s = c.status().await;
        assert_eq!(s.state, SessionState::Idle);
        assert_eq!(s.batch_count, 0);
        assert_eq!(s.pending, 0);
        assert_eq!(s.completed, 2);
        assert_eq!(d.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_batch_complete_stops_with_pending_left() {
        let (c, _d) = controller(2, 15);
        seed(&c, &["111", "222", "333", "444", "555"]).await;
        c.start(SessionMode::Manual).await;
        c.advance().await;
        let s = c.status().await;
        assert_eq!(s.state, SessionState::Idle);
        assert_eq!(s.batch_count, 0);
        assert_eq!(s.pending, 3);
        assert_eq!(s.completed, 2);
    }

    #[tokio::test]
    async fn test_single_entry_start_finishes_immediately() {
        let (c, d) = controller(5, 15);
        seed(&c, &["111"]).await;
        assert!(c.start(SessionMode::Manual).await);
        assert_eq!(c.status().await.state, SessionState::Idle);
        assert_eq!(d.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_advance_ignored_when_idle() {
        let (c, d) = controller(3, 15);
        seed(&c, &["111", "222"]).await;
        assert!(!c.advance().await);
        assert!(d.sent().is_empty());
    }

    #[tokio::test]
    async fn test_stop_resets_batch_count() {
        let (c, _d) = controller(10, 15);
        seed(&c, &["111", "222", "333"]).await;
        c.start(SessionMode::Manual).await;
        c.stop().await;
        let s = c.status().await;
        assert_eq!(s.state, SessionState::Idle);
        assert_eq!(s.batch_count, 0);
        assert_eq!(s.pending, 2);
    }

    #[tokio::test]
    async fn test_resend_preserves_order_and_empties_completed() {
        let (c, _d) = controller(10, 15);
        seed(&c, &["+911", "+912"]).await;
        c.start(SessionMode::Manual).await;
        c.advance().await;
        assert_eq!(c.completed().await, vec!["+911", "+912"]);

        let moved = c.resend().await;
        assert_eq!(moved, 2);
        assert_eq!(c.pending().await, vec!["+911", "+912"]);
        assert!(c.completed().await.is_empty());
    }

    #[tokio::test]
    async fn test_resend_rejected_while_running() {
        let (c, _d) = controller(10, 15);
        seed(&c, &["111", "222", "333"]).await;
        c.start(SessionMode::Manual).await;
        assert_eq!(c.resend().await, 0);
        assert_eq!(c.status().await.completed, 1);
    }

    #[tokio::test]
    async fn test_pending_and_completed_stay_disjoint() {
        let (c, _d) = controller(2, 15);
        seed(&c, &["111", "222", "333", "444"]).await;
        c.start(SessionMode::Manual).await;
        c.advance().await;
        c.resend().await;
        c.import("111, 555").await;

        let pending: HashSet<String> =
            c.pending().await.iter().map(|n| digit_core(n)).collect();
        let completed: HashSet<String> =
            c.completed().await.iter().map(|n| digit_core(n)).collect();
        assert!(pending.is_disjoint(&completed));
        assert_eq!(pending.len() + completed.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_mode_advances_on_countdown() {
        let (c, d) = controller(10, 15);
        seed(&c, &["111", "222", "333"]).await;
        c.start(SessionMode::Auto).await;
        assert_eq!(d.sent().len(), 1);

        tokio::time::sleep(Duration::from_secs(16)).await;
        assert_eq!(d.sent(), vec!["111", "222"]);

        tokio::time::sleep(Duration::from_secs(16)).await;
        assert_eq!(d.sent(), vec!["111", "222", "333"]);
        assert_eq!(c.status().await.state, SessionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_armed_countdown() {
        let (c, d) = controller(10, 15);
        seed(&c, &["111", "222", "333"]).await;
        c.start(SessionMode::Auto).await;
        c.stop().await;

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(d.sent().len(), 1);
        assert_eq!(c.status().await.state, SessionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_advance_restarts_auto_countdown() {
        let (c, d) = controller(10, 15);
        seed(&c, &["111", "222", "333", "444"]).await;
        c.start(SessionMode::Auto).await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        c.advance().await;
        assert_eq!(d.sent().len(), 2);

        // The tick armed at start would have fired at t=15; the manual
        // advance re-armed the countdown for t=25.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(d.sent().len(), 2);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(d.sent().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_batch_complete_disarms_countdown() {
        let (c, d) = controller(2, 15);
        seed(&c, &["111", "222", "333"]).await;
        c.start(SessionMode::Auto).await;

        tokio::time::sleep(Duration::from_secs(16)).await;
        assert_eq!(d.sent().len(), 2);
        assert_eq!(c.status().await.state, SessionState::Idle);

        // Batch finished; no further ticks.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(d.sent().len(), 2);
    }
}
