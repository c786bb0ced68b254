//! Countdown clock attached to a group event, with pause/resume semantics.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::state::ScopeId;

/// Lifecycle states of an [`EventTimer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Never started; no duration is set yet.
    Stopped,
    /// Counting down one unit per tick.
    Running,
    /// Frozen at the current remaining value.
    Paused,
    /// Reached zero; no further ticks will fire.
    Ended,
}

/// Caller-initiated timer actions, used in transition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// `start(minutes)`.
    Start,
    /// `pause()`.
    Pause,
    /// `resume()`.
    Resume,
}

/// Error returned when a timer action is not legal in the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action:?} the event timer while it is {state:?}")]
pub struct InvalidTimerTransition {
    /// State the timer was in when the action arrived.
    pub state: TimerState,
    /// The rejected action.
    pub action: TimerAction,
}

/// Kinds of notifications delivered to timer listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEventKind {
    /// The timer started; `remaining` carries the full duration.
    Started,
    /// The timer was paused; `remaining` carries the frozen value.
    Paused,
    /// The timer resumed; `remaining` carries the current value.
    Resumed,
    /// One unit elapsed; `remaining` carries the new value.
    Tick,
    /// The countdown reached zero; `remaining` is `None` ("time's up").
    Ended,
}

/// Observer notified of every timer transition and tick.
///
/// Listeners are delivered to sequentially in registration order. A listener
/// returning an error is logged and does not affect later listeners or the
/// countdown itself.
pub trait TimerListener: Send + Sync {
    /// Handle one timer notification for the given scope.
    fn on_timer_event(
        &self,
        scope: &ScopeId,
        kind: TimerEventKind,
        remaining: Option<u64>,
    ) -> anyhow::Result<()>;
}

struct Inner {
    state: TimerState,
    total_minutes: u64,
    remaining_minutes: u64,
    listeners: Vec<Arc<dyn TimerListener>>,
    tick_task: Option<JoinHandle<()>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        // No dangling ticks once the owning event goes away.
        if let Some(task) = self.tick_task.take() {
            task.abort();
        }
    }
}

/// Per-scope countdown clock.
///
/// Cloning yields another handle to the same clock; the decrement task holds
/// one such handle while the timer is running.
#[derive(Clone)]
pub struct EventTimer {
    scope: ScopeId,
    tick_period: Duration,
    inner: Arc<Mutex<Inner>>,
}

impl EventTimer {
    /// Create a stopped timer for `scope`. `tick_period` is the wall-clock
    /// duration of one countdown unit (one minute in production).
    pub fn new(scope: ScopeId, tick_period: Duration) -> Self {
        Self {
            scope,
            tick_period,
            inner: Arc::new(Mutex::new(Inner {
                state: TimerState::Stopped,
                total_minutes: 0,
                remaining_minutes: 0,
                listeners: Vec::new(),
                tick_task: None,
            })),
        }
    }

    /// Register a listener. All registered listeners receive every event.
    pub fn add_listener(&self, listener: Arc<dyn TimerListener>) {
        self.lock().listeners.push(listener);
    }

    /// Current state.
    pub fn state(&self) -> TimerState {
        self.lock().state
    }

    /// Remaining countdown units, once the timer has been started.
    pub fn remaining_minutes(&self) -> Option<u64> {
        let inner = self.lock();
        match inner.state {
            TimerState::Stopped => None,
            _ => Some(inner.remaining_minutes),
        }
    }

    /// Total duration set at start.
    pub fn total_minutes(&self) -> Option<u64> {
        let inner = self.lock();
        match inner.state {
            TimerState::Stopped => None,
            _ => Some(inner.total_minutes),
        }
    }

    /// Start the countdown: `Stopped -> Running`. Emits `Started` with the
    /// full duration and schedules the recurring decrement.
    pub fn start(&self, minutes: u64) -> Result<(), InvalidTimerTransition> {
        let listeners = {
            let mut inner = self.lock();
            if inner.state != TimerState::Stopped {
                return Err(InvalidTimerTransition {
                    state: inner.state,
                    action: TimerAction::Start,
                });
            }
            inner.state = TimerState::Running;
            inner.total_minutes = minutes;
            inner.remaining_minutes = minutes;
            inner.listeners.clone()
        };
        self.emit(&listeners, TimerEventKind::Started, Some(minutes));
        self.spawn_ticker();
        Ok(())
    }

    /// Freeze the countdown: `Running -> Paused`. The decrement task is
    /// cancelled and the remaining value holds.
    pub fn pause(&self) -> Result<(), InvalidTimerTransition> {
        let (listeners, remaining) = {
            let mut inner = self.lock();
            if inner.state != TimerState::Running {
                return Err(InvalidTimerTransition {
                    state: inner.state,
                    action: TimerAction::Pause,
                });
            }
            inner.state = TimerState::Paused;
            if let Some(task) = inner.tick_task.take() {
                task.abort();
            }
            (inner.listeners.clone(), inner.remaining_minutes)
        };
        self.emit(&listeners, TimerEventKind::Paused, Some(remaining));
        Ok(())
    }

    /// Continue the countdown from the frozen value: `Paused -> Running`.
    /// A timer that was never started cannot be resumed.
    pub fn resume(&self) -> Result<(), InvalidTimerTransition> {
        let (listeners, remaining) = {
            let mut inner = self.lock();
            if inner.state != TimerState::Paused {
                return Err(InvalidTimerTransition {
                    state: inner.state,
                    action: TimerAction::Resume,
                });
            }
            inner.state = TimerState::Running;
            (inner.listeners.clone(), inner.remaining_minutes)
        };
        self.emit(&listeners, TimerEventKind::Resumed, Some(remaining));
        self.spawn_ticker();
        Ok(())
    }

    /// Cancel the decrement task without emitting anything. Used when the
    /// owning event is dismantled.
    pub fn shutdown(&self) {
        let mut inner = self.lock();
        if let Some(task) = inner.tick_task.take() {
            task.abort();
        }
    }

    /// Advance the countdown by one unit. Returns `false` once the timer is no
    /// longer running, which terminates the decrement task.
    pub(crate) fn tick(&self) -> bool {
        let (listeners, event) = {
            let mut inner = self.lock();
            if inner.state != TimerState::Running {
                return false;
            }
            inner.remaining_minutes = inner.remaining_minutes.saturating_sub(1);
            if inner.remaining_minutes == 0 {
                inner.state = TimerState::Ended;
                inner.tick_task = None;
                (inner.listeners.clone(), (TimerEventKind::Ended, None))
            } else {
                (
                    inner.listeners.clone(),
                    (TimerEventKind::Tick, Some(inner.remaining_minutes)),
                )
            }
        };
        let (kind, remaining) = event;
        self.emit(&listeners, kind, remaining);
        kind == TimerEventKind::Tick
    }

    fn spawn_ticker(&self) {
        let timer = self.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::time::sleep(timer.tick_period).await;
                if !timer.tick() {
                    break;
                }
            }
        });
        self.lock().tick_task = Some(task);
    }

    /// Deliver one event to every listener, isolating failures. The inner
    /// lock must not be held here so listeners may call back into the timer.
    fn emit(&self, listeners: &[Arc<dyn TimerListener>], kind: TimerEventKind, remaining: Option<u64>) {
        for listener in listeners {
            if let Err(err) = listener.on_timer_event(&self.scope, kind, remaining) {
                warn!(scope = %self.scope, ?kind, error = %err, "timer listener failed");
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
