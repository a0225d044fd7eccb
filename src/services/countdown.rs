use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::{interval, Duration},
};
use tracing::debug;

use crate::{
    models::race::{CountdownParts, RaceEvent, RaceRecord},
    utils::clock::ArcClock,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CountdownView {
    /// No target has been selected yet.
    Pending,
    Running {
        race: RaceRecord,
        remaining: CountdownParts,
    },
    Started {
        race: RaceRecord,
    },
    SeasonEnded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerSnapshot {
    /// Wall clock in East Africa Time.
    pub clock: String,
    pub countdown: CountdownView,
}

/// What the ticker counts down to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountdownTarget {
    Race(RaceEvent),
    SeasonEnded,
}

pub fn snapshot(now: DateTime<Utc>, target: Option<&CountdownTarget>) -> TickerSnapshot {
    let countdown = match target {
        None => CountdownView::Pending,
        Some(CountdownTarget::SeasonEnded) => CountdownView::SeasonEnded,
        Some(CountdownTarget::Race(race)) if race.start > now => CountdownView::Running {
            race: race.to_record(),
            remaining: CountdownParts::from(race.start - now),
        },
        Some(CountdownTarget::Race(race)) => CountdownView::Started {
            race: race.to_record(),
        },
    };
    TickerSnapshot {
        clock: (now + ChronoDuration::hours(3)).format("%H:%M:%S").to_string(),
        countdown,
    }
}

/// One-second clock and countdown publisher. Owns its interval task so
/// that at most one is ever running.
pub struct CountdownTicker {
    clock: ArcClock,
    tx: Arc<watch::Sender<TickerSnapshot>>,
    task: Mutex<Option<JoinHandle<()>>>,
    target: Mutex<Option<CountdownTarget>>,
}

impl CountdownTicker {
    pub fn new(clock: ArcClock) -> Self {
        let (tx, _rx) = watch::channel(snapshot(clock.now(), None));
        Self {
            clock,
            tx: Arc::new(tx),
            task: Mutex::new(None),
            target: Mutex::new(None),
        }
    }

    pub fn latest(&self) -> TickerSnapshot {
        self.tx.borrow().clone()
    }

    /// Stops any running interval and starts a new one for `target`.
    pub async fn restart(&self, target: CountdownTarget) {
        let mut task = self.task.lock().await;
        if let Some(previous) = task.take() {
            previous.abort();
        }
        *self.target.lock().await = Some(target.clone());

        let tx = self.tx.clone();
        let clock = self.clock.clone();
        *task = Some(tokio::spawn(async move {
            let mut ticks = interval(Duration::from_secs(1));
            loop {
                ticks.tick().await;
                tx.send_replace(snapshot(clock.now(), Some(&target)));
            }
        }));
        debug!("Countdown ticker restarted");
    }

    /// Restarts only when the target differs from the current one or the
    /// ticker is not running. Returns whether a restart happened.
    pub async fn retarget(&self, target: CountdownTarget) -> bool {
        let unchanged = self.target.lock().await.as_ref() == Some(&target);
        if unchanged && self.is_running().await {
            return false;
        }
        self.restart(target).await;
        true
    }

    pub async fn stop(&self) {
        if let Some(task) = self.task.lock().await.take() {
            task.abort();
            debug!("Countdown ticker stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::utils::clock::FixedClock;

    fn race(name: &str, start: DateTime<Utc>) -> RaceEvent {
        RaceEvent {
            round: 1,
            name: name.to_string(),
            country: "Kenya".to_string(),
            locality: None,
            start,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn snapshot_reports_remaining_time_and_local_clock() {
        let target = CountdownTarget::Race(race("A", now() + ChronoDuration::seconds(90_061)));
        let snap = snapshot(now(), Some(&target));
        assert_eq!(snap.clock, "12:00:00");
        match snap.countdown {
            CountdownView::Running { remaining, .. } => {
                assert_eq!((remaining.days, remaining.hours, remaining.minutes, remaining.seconds), (1, 1, 1, 1));
            }
            other => panic!("unexpected view {other:?}"),
        }

        let past = CountdownTarget::Race(race("B", now() - ChronoDuration::seconds(1)));
        assert!(matches!(snapshot(now(), Some(&past)).countdown, CountdownView::Started { .. }));
        assert_eq!(snapshot(now(), None).countdown, CountdownView::Pending);
        assert_eq!(
            snapshot(now(), Some(&CountdownTarget::SeasonEnded)).countdown,
            CountdownView::SeasonEnded
        );
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_the_running_task() {
        let ticker = CountdownTicker::new(Arc::new(FixedClock(now())));

        ticker
            .restart(CountdownTarget::Race(race("A", now() + ChronoDuration::hours(1))))
            .await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        match ticker.latest().countdown {
            CountdownView::Running { race, .. } => assert_eq!(race.race_name, "A"),
            other => panic!("unexpected view {other:?}"),
        }

        ticker
            .restart(CountdownTarget::Race(race("B", now() + ChronoDuration::hours(2))))
            .await;
        tokio::time::sleep(Duration::from_millis(1500)).await;

        match ticker.latest().countdown {
            CountdownView::Running { race, .. } => assert_eq!(race.race_name, "B"),
            other => panic!("unexpected view {other:?}"),
        }
        assert!(ticker.is_running().await);

        ticker.stop().await;
        assert!(!ticker.is_running().await);
    }

    #[tokio::test(start_paused = true)]
    async fn retarget_with_same_target_keeps_the_timer() {
        let ticker = CountdownTicker::new(Arc::new(FixedClock(now())));
        let target = CountdownTarget::Race(race("A", now() + ChronoDuration::hours(1)));

        assert!(ticker.retarget(target.clone()).await);
        assert!(!ticker.retarget(target.clone()).await);
        assert!(ticker.retarget(CountdownTarget::SeasonEnded).await);

        ticker.stop().await;
        assert!(ticker.retarget(CountdownTarget::SeasonEnded).await);
    }
}
