use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One race of a season, rebuilt from whichever schedule source answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceEvent {
    pub round: u32,
    pub name: String,
    pub country: String,
    pub locality: Option<String>,
    pub start: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaceStatus {
    Done,
    Upcoming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleSource {
    Primary,
    Secondary,
    Tertiary,
    Fallback,
}

impl ScheduleSource {
    /// Tiers whose payload is not already scoped to the requested season.
    pub fn needs_year_filter(self) -> bool {
        matches!(self, ScheduleSource::Secondary | ScheduleSource::Tertiary)
    }
}

/// Canonical wire shape of a race, shared by responses and the bundled file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceRecord {
    pub round: u32,
    #[serde(rename = "raceName")]
    pub race_name: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RaceView {
    #[serde(flatten)]
    pub record: RaceRecord,
    pub status: RaceStatus,
}

impl RaceEvent {
    pub fn status_at(&self, now: DateTime<Utc>) -> RaceStatus {
        if self.start < now {
            RaceStatus::Done
        } else {
            RaceStatus::Upcoming
        }
    }

    pub fn to_record(&self) -> RaceRecord {
        RaceRecord {
            round: self.round,
            race_name: self.name.clone(),
            country: self.country.clone(),
            locality: self.locality.clone(),
            date: self.start.format("%Y-%m-%d").to_string(),
            time: self.start.format("%H:%M:%SZ").to_string(),
        }
    }

    pub fn view_at(&self, now: DateTime<Utc>) -> RaceView {
        RaceView {
            record: self.to_record(),
            status: self.status_at(now),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Countdown {
    Next {
        event: RaceEvent,
        remaining: Duration,
    },
    SeasonEnded,
}

/// Remaining time split for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountdownParts {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl From<Duration> for CountdownParts {
    fn from(remaining: Duration) -> Self {
        let total = remaining.num_seconds().max(0);
        Self {
            days: total / 86_400,
            hours: (total % 86_400) / 3_600,
            minutes: (total % 3_600) / 60,
            seconds: total % 60,
        }
    }
}
