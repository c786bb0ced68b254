//! Multi-channel group events: channel fan-out and the event clock.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::warn;

use crate::error::ServiceError;
use crate::platform::{ChannelId, NotificationSink};
use crate::state::ScopeId;
use crate::state::timer::{EventTimer, TimerEventKind, TimerListener, TimerState};

/// One coordinated multi-channel activity in a scope, wrapping an optional
/// countdown clock. Its lifecycle is independent of the blob game's: an event
/// can outlive a game and vice versa.
struct GroupEvent {
    channels: Vec<ChannelId>,
    timer: Option<EventTimer>,
}

/// Coordinates group events per scope: membership, broadcasts, and the event
/// clock. An event exists in the map exactly while it is running.
pub struct GroupEventService {
    sink: Arc<dyn NotificationSink>,
    events: Arc<DashMap<ScopeId, GroupEvent>>,
    tick_period: Duration,
}

impl GroupEventService {
    /// Build the service over a notification sink. `tick_period` is the
    /// wall-clock length of one countdown unit (one minute in production).
    pub fn new(sink: Arc<dyn NotificationSink>, tick_period: Duration) -> Self {
        Self {
            sink,
            events: Arc::new(DashMap::new()),
            tick_period,
        }
    }

    /// Whether an event is running in `scope`.
    pub fn is_event_running(&self, scope: &ScopeId) -> bool {
        self.events.contains_key(scope)
    }

    /// Start an event over the given channels. Fails when one is already
    /// running in the scope.
    pub fn start_event(
        &self,
        scope: &ScopeId,
        channels: Vec<ChannelId>,
    ) -> Result<(), ServiceError> {
        if self.is_event_running(scope) {
            return Err(ServiceError::InvalidState(format!(
                "an event is already running in scope `{scope}`"
            )));
        }
        self.events.insert(
            scope.clone(),
            GroupEvent {
                channels,
                timer: None,
            },
        );
        Ok(())
    }

    /// Tear down the event, cancelling any scheduled clock ticks. Returns the
    /// channels that were enrolled, or `None` when nothing was running.
    pub fn end_event(&self, scope: &ScopeId) -> Option<Vec<ChannelId>> {
        let (_, event) = self.events.remove(scope)?;
        if let Some(timer) = &event.timer {
            timer.shutdown();
        }
        Some(event.channels)
    }

    /// Enroll another channel into the running event. Returns `false` when no
    /// event is running.
    pub fn add_channel(&self, scope: &ScopeId, channel: ChannelId) -> bool {
        match self.events.get_mut(scope) {
            Some(mut event) => {
                if !event.channels.contains(&channel) {
                    event.channels.push(channel);
                }
                true
            }
            None => false,
        }
    }

    /// Channels enrolled in the running event.
    pub fn channels(&self, scope: &ScopeId) -> Option<Vec<ChannelId>> {
        self.events.get(scope).map(|event| event.channels.clone())
    }

    /// Fan a message out to every enrolled channel except those in `exclude`.
    /// One channel's delivery failure is logged and does not abort the rest.
    /// Returns the number of successful deliveries, or `None` when no event
    /// is running.
    pub async fn broadcast(
        &self,
        scope: &ScopeId,
        message: &str,
        exclude: &[ChannelId],
    ) -> Option<usize> {
        let channels = self.channels(scope)?;
        let mut delivered = 0;
        for channel in channels {
            if exclude.contains(&channel) {
                continue;
            }
            match self.sink.send(&channel, message).await {
                Ok(()) => delivered += 1,
                Err(err) => {
                    warn!(scope = %scope, %channel, error = %err, "broadcast delivery failed");
                }
            }
        }
        Some(delivered)
    }

    /// Start the event clock for `minutes`. Creates the timer on first use
    /// (or after a finished countdown) and wires the tiered announcer, which
    /// reads the live channel set so later enrollments hear the clock too.
    /// Returns `None` when no event is running.
    pub fn start_timer(
        &self,
        scope: &ScopeId,
        minutes: u64,
    ) -> Result<Option<()>, ServiceError> {
        if minutes == 0 {
            return Err(ServiceError::InvalidInput(
                "the timer needs a positive number of minutes".into(),
            ));
        }

        let Some(mut event) = self.events.get_mut(scope) else {
            return Ok(None);
        };

        let needs_fresh_timer = match &event.timer {
            None => true,
            Some(timer) => timer.state() == TimerState::Ended,
        };
        if needs_fresh_timer {
            let timer = EventTimer::new(scope.clone(), self.tick_period);
            timer.add_listener(Arc::new(TimeAnnouncer {
                sink: self.sink.clone(),
                events: self.events.clone(),
            }));
            event.timer = Some(timer);
        }

        let timer = event.timer.as_ref().map(EventTimer::clone);
        drop(event);
        match timer {
            Some(timer) => {
                timer.start(minutes)?;
                Ok(Some(()))
            }
            None => Ok(None),
        }
    }

    /// Pause the event clock. Returns `None` when no event is running; fails
    /// when the clock was never started.
    pub fn pause_timer(&self, scope: &ScopeId) -> Result<Option<()>, ServiceError> {
        match self.timer(scope) {
            None if !self.is_event_running(scope) => Ok(None),
            None => Err(ServiceError::InvalidState(
                "the event clock was never started".into(),
            )),
            Some(timer) => {
                timer.pause()?;
                Ok(Some(()))
            }
        }
    }

    /// Resume the event clock from its frozen value. Returns `None` when no
    /// event is running; fails when the clock was never started.
    pub fn resume_timer(&self, scope: &ScopeId) -> Result<Option<()>, ServiceError> {
        match self.timer(scope) {
            None if !self.is_event_running(scope) => Ok(None),
            None => Err(ServiceError::InvalidState(
                "the event clock was never started".into(),
            )),
            Some(timer) => {
                timer.resume()?;
                Ok(Some(()))
            }
        }
    }

    /// Remaining minutes on the event clock, once started.
    pub fn timer_remaining(&self, scope: &ScopeId) -> Option<u64> {
        self.timer(scope)?.remaining_minutes()
    }

    /// Handle to the scope's event clock, if one exists.
    pub(crate) fn timer(&self, scope: &ScopeId) -> Option<EventTimer> {
        self.events
            .get(scope)?
            .timer
            .as_ref()
            .map(EventTimer::clone)
    }
}

/// Relays countdown milestones to the event channels at a tiered cadence.
///
/// Reads the channel set from the live event map on every notification, so a
/// channel enrolled after the clock started still hears it. Once the event is
/// gone the announcer goes silent.
struct TimeAnnouncer {
    sink: Arc<dyn NotificationSink>,
    events: Arc<DashMap<ScopeId, GroupEvent>>,
}

impl TimerListener for TimeAnnouncer {
    fn on_timer_event(
        &self,
        scope: &ScopeId,
        kind: TimerEventKind,
        remaining: Option<u64>,
    ) -> anyhow::Result<()> {
        let Some(channels) = self.events.get(scope).map(|event| event.channels.clone()) else {
            return Ok(());
        };
        let message = match (kind, remaining) {
            (TimerEventKind::Started, Some(minutes)) => {
                format!("The event clock is running: {minutes} minutes on the clock!")
            }
            (TimerEventKind::Paused, _) => "The event clock is paused.".to_string(),
            (TimerEventKind::Resumed, Some(minutes)) => {
                format!("The event clock resumes with {minutes} minutes left.")
            }
            (TimerEventKind::Tick, Some(minutes)) if announcement_due(minutes) => {
                format!("{minutes} minutes remaining!")
            }
            (TimerEventKind::Tick, _) => return Ok(()),
            (TimerEventKind::Ended, _) => "Time's up!".to_string(),
            (kind, remaining) => {
                anyhow::bail!("timer event {kind:?} arrived without a remaining value ({remaining:?})")
            }
        };

        let scope = scope.clone();
        for channel in &channels {
            let sink = self.sink.clone();
            let channel = channel.clone();
            let message = message.clone();
            let scope = scope.clone();
            tokio::spawn(async move {
                if let Err(err) = sink.send(&channel, &message).await {
                    warn!(scope = %scope, %channel, error = %err, "timer announcement failed");
                }
            });
        }
        Ok(())
    }
}

/// Tiered cadence for remaining-time announcements: every 15 minutes while an
/// hour or more remains, every 10 from 59 down to 30, every 5 from 29 down to
/// 10, and every minute below 10.
fn announcement_due(remaining: u64) -> bool {
    match remaining {
        0 => false,
        r if r >= 60 => r % 15 == 0,
        r if r >= 30 => r % 10 == 0,
        r if r >= 10 => r % 5 == 0,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::platform::DeliveryError;

    /// Sink recording deliveries and failing for designated channels.
    #[derive(Default)]
    struct FlakySink {
        fail_for: Vec<ChannelId>,
        delivered: Arc<Mutex<HashMap<ChannelId, Vec<String>>>>,
    }

    impl NotificationSink for FlakySink {
        fn send(
            &self,
            channel: &ChannelId,
            message: &str,
        ) -> BoxFuture<'static, Result<(), DeliveryError>> {
            let fail = self.fail_for.contains(channel);
            let delivered = self.delivered.clone();
            let channel = channel.clone();
            let message = message.to_string();
            Box::pin(async move {
                if fail {
                    return Err(DeliveryError {
                        channel,
                        reason: "gateway refused".into(),
                    });
                }
                delivered
                    .lock()
                    .unwrap()
                    .entry(channel)
                    .or_default()
                    .push(message);
                Ok(())
            })
        }
    }

    fn scope() -> ScopeId {
        ScopeId::new("guild-1")
    }

    fn channels(names: &[&str]) -> Vec<ChannelId> {
        names.iter().map(|name| ChannelId::from(*name)).collect()
    }

    fn service_with(sink: FlakySink) -> GroupEventService {
        GroupEventService::new(Arc::new(sink), Duration::from_secs(3600))
    }

    #[test]
    fn cadence_tiers() {
        // Hour or more: every quarter hour.
        assert!(announcement_due(120));
        assert!(announcement_due(60));
        assert!(!announcement_due(61));
        // 30..=59: every ten minutes.
        assert!(announcement_due(50));
        assert!(announcement_due(30));
        assert!(!announcement_due(59));
        assert!(!announcement_due(45));
        // 10..=29: every five minutes.
        assert!(announcement_due(25));
        assert!(announcement_due(10));
        assert!(!announcement_due(29));
        // Below ten: every minute, but never at zero.
        for minute in 1..10 {
            assert!(announcement_due(minute));
        }
        assert!(!announcement_due(0));
    }

    #[tokio::test]
    async fn event_lifecycle() {
        let service = service_with(FlakySink::default());
        assert!(!service.is_event_running(&scope()));

        service
            .start_event(&scope(), channels(&["alpha", "beta"]))
            .unwrap();
        assert!(service.is_event_running(&scope()));
        assert!(matches!(
            service.start_event(&scope(), channels(&["gamma"])),
            Err(ServiceError::InvalidState(_))
        ));

        assert!(service.add_channel(&scope(), ChannelId::from("gamma")));
        assert_eq!(
            service.channels(&scope()).unwrap(),
            channels(&["alpha", "beta", "gamma"])
        );

        let ended = service.end_event(&scope()).unwrap();
        assert_eq!(ended.len(), 3);
        assert!(service.end_event(&scope()).is_none());
    }

    #[tokio::test]
    async fn broadcast_tolerates_partial_failure() {
        let sink = FlakySink {
            fail_for: channels(&["beta"]),
            ..FlakySink::default()
        };
        let delivered = sink.delivered.clone();
        let service = service_with(sink);

        service
            .start_event(&scope(), channels(&["alpha", "beta", "gamma"]))
            .unwrap();
        let count = service.broadcast(&scope(), "the blob stirs", &[]).await;
        assert_eq!(count, Some(2));

        let delivered = delivered.lock().unwrap();
        assert!(delivered.contains_key(&ChannelId::from("alpha")));
        assert!(delivered.contains_key(&ChannelId::from("gamma")));
        assert!(!delivered.contains_key(&ChannelId::from("beta")));
    }

    #[tokio::test]
    async fn broadcast_honors_exclusions_and_absence() {
        let sink = FlakySink::default();
        let delivered = sink.delivered.clone();
        let service = service_with(sink);

        assert_eq!(service.broadcast(&scope(), "anyone?", &[]).await, None);

        service
            .start_event(&scope(), channels(&["alpha", "beta"]))
            .unwrap();
        let count = service
            .broadcast(&scope(), "quietly", &channels(&["alpha"]))
            .await;
        assert_eq!(count, Some(1));
        assert!(!delivered.lock().unwrap().contains_key(&ChannelId::from("alpha")));
    }

    #[tokio::test]
    async fn timer_requires_a_running_event() {
        let service = service_with(FlakySink::default());
        assert_eq!(service.start_timer(&scope(), 30).unwrap(), None);
        assert_eq!(service.pause_timer(&scope()).unwrap(), None);
        assert_eq!(service.resume_timer(&scope()).unwrap(), None);
    }

    #[tokio::test]
    async fn timer_lifecycle_through_the_event() {
        let service = service_with(FlakySink::default());
        service.start_event(&scope(), channels(&["alpha"])).unwrap();

        assert!(matches!(
            service.pause_timer(&scope()),
            Err(ServiceError::InvalidState(_))
        ));

        assert_eq!(service.start_timer(&scope(), 30).unwrap(), Some(()));
        assert_eq!(service.timer_remaining(&scope()), Some(30));

        let timer = service.timer(&scope()).unwrap();
        assert!(timer.tick());
        assert_eq!(service.timer_remaining(&scope()), Some(29));

        service.pause_timer(&scope()).unwrap();
        assert!(!timer.tick());
        assert_eq!(service.timer_remaining(&scope()), Some(29));

        service.resume_timer(&scope()).unwrap();
        assert!(timer.tick());
        assert_eq!(service.timer_remaining(&scope()), Some(28));

        // A second start while running is an invalid transition.
        assert!(matches!(
            service.start_timer(&scope(), 10),
            Err(ServiceError::Timer(_))
        ));
    }

    #[tokio::test]
    async fn finished_timer_can_be_started_fresh() {
        let service = service_with(FlakySink::default());
        service.start_event(&scope(), channels(&["alpha"])).unwrap();
        service.start_timer(&scope(), 1).unwrap();

        let timer = service.timer(&scope()).unwrap();
        assert!(!timer.tick());
        assert_eq!(timer.state(), TimerState::Ended);

        assert_eq!(service.start_timer(&scope(), 5).unwrap(), Some(()));
        assert_eq!(service.timer_remaining(&scope()), Some(5));
    }

    #[tokio::test]
    async fn late_enrolled_channels_hear_the_clock() {
        let sink = FlakySink::default();
        let delivered = sink.delivered.clone();
        let service = service_with(sink);
        service.start_event(&scope(), channels(&["alpha"])).unwrap();
        service.start_timer(&scope(), 6).unwrap();

        // Enrolled after the clock started.
        assert!(service.add_channel(&scope(), ChannelId::from("beta")));

        let timer = service.timer(&scope()).unwrap();
        assert!(timer.tick());
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        let delivered = delivered.lock().unwrap();
        let beta = delivered.get(&ChannelId::from("beta")).unwrap();
        assert!(beta.iter().any(|m| m.contains("5 minutes remaining")));
    }

    #[tokio::test]
    async fn announcer_reaches_event_channels() {
        let sink = FlakySink::default();
        let delivered = sink.delivered.clone();
        let service = service_with(sink);
        service
            .start_event(&scope(), channels(&["alpha", "beta"]))
            .unwrap();
        service.start_timer(&scope(), 6).unwrap();

        let timer = service.timer(&scope()).unwrap();
        assert!(timer.tick());

        // Announcements are spawned; let them run.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        let delivered = delivered.lock().unwrap();
        let alpha = delivered.get(&ChannelId::from("alpha")).unwrap();
        assert!(alpha.iter().any(|m| m.contains("6 minutes on the clock")));
        assert!(alpha.iter().any(|m| m.contains("5 minutes remaining")));
        assert!(delivered.contains_key(&ChannelId::from("beta")));
    }
}
