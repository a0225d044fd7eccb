//! Normalization of race payloads from heterogeneous schedule sources.
//!
//! Every logical field is resolved through an ordered list of JSON paths;
//! the first path holding a non-empty value wins. The lists are plain data
//! so the priority policy can be read and tested directly.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::models::race::{Countdown, RaceEvent};

pub type FieldPath = &'static [&'static str];

pub const NAME_FIELDS: &[FieldPath] = &[
    &["raceName"],
    &["name"],
    &["grandPrix"],
    &["title"],
    &["circuit"],
    &["Circuit", "circuitName"],
    &["circuit", "name"],
];

/// Fields consulted when judging whether a payload carries real race names.
pub const PLAUSIBLE_NAME_FIELDS: &[FieldPath] =
    &[&["raceName"], &["name"], &["grandPrix"], &["title"]];

pub const COUNTRY_FIELDS: &[FieldPath] = &[
    &["country"],
    &["Circuit", "Location", "country"],
    &["location", "country"],
    &["location"],
];

pub const LOCALITY_FIELDS: &[FieldPath] = &[
    &["locality"],
    &["Circuit", "Location", "locality"],
    &["location", "locality"],
    &["location", "city"],
    &["city"],
];

pub const ROUND_FIELDS: &[FieldPath] = &[&["round"], &["roundNumber"], &["round_number"]];

/// Separate date/time pairs, preferred over the combined `datetime` field.
/// A `None` time means the date field alone.
pub const DATE_FIELDS: &[(&str, Option<&str>)] = &[
    ("date", Some("time")),
    ("date", None),
    ("race_date", Some("race_time")),
    ("race_date", None),
    ("startDate", Some("startTime")),
    ("startDate", None),
];

pub const COMBINED_DATE_FIELD: &str = "datetime";

pub const YEAR_FIELDS: &[FieldPath] = &[&["date"], &["race_date"], &["startDate"], &["datetime"]];

/// Nested list locations probed on third-party schedule payloads.
pub const LIST_FIELDS: &[FieldPath] = &[
    &["races"],
    &["schedule"],
    &["data"],
    &["events"],
    &["MRData", "RaceTable", "Races"],
];

const PLACEHOLDER_NAMES: &[&str] = &["Unknown", "unknown"];

/// Offset of the wall clock used by combined `datetime` values (UTC+3).
const EAST_AFRICA_OFFSET_HOURS: i64 = 3;

pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(key))
}

pub fn text_at(value: &Value, path: &[&str]) -> Option<String> {
    lookup(value, path)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn first_text(value: &Value, fields: &[FieldPath]) -> Option<String> {
    fields.iter().find_map(|path| text_at(value, path))
}

fn round_at(value: &Value, path: &[&str]) -> Option<u32> {
    let raw = lookup(value, path)?;
    let round = match raw {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }?;
    (round > 0).then_some(round)
}

/// Start instant used for races whose date cannot be determined.
pub fn far_future() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2099, 12, 31)
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Values without an offset are read as UTC.
fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let zoned = match s.strip_suffix('Z') {
        Some(head) => format!("{head}+00:00"),
        None => s.to_string(),
    };
    ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M%z"]
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(&zoned, fmt).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| parse_naive(s).map(|naive| naive.and_utc()))
}

/// Drops a trailing `Z`, `+hh:mm` or `+hhmm` after the time part.
fn strip_zone_suffix(s: &str) -> &str {
    if let Some(stripped) = s.strip_suffix('Z') {
        return stripped;
    }
    let Some(t) = s.find('T') else {
        return s;
    };
    let Some(sign) = s[t..].rfind(['+', '-']).map(|i| t + i) else {
        return s;
    };
    let digits: Vec<char> = s[sign + 1..].chars().filter(|&c| c != ':').collect();
    if digits.len() == 4 && digits.iter().all(char::is_ascii_digit) {
        &s[..sign]
    } else {
        s
    }
}

/// Combined values are East Africa wall-clock times, whatever suffix they carry.
fn parse_combined(s: &str) -> Option<DateTime<Utc>> {
    let naive = parse_naive(strip_zone_suffix(s))?;
    Some((naive - Duration::hours(EAST_AFRICA_OFFSET_HOURS)).and_utc())
}

/// Resolves the start of a race. The first field combination present wins;
/// if it does not parse, or nothing is present, the far-future sentinel is
/// returned so the race sorts last and never counts as run.
pub fn parse_race_date(value: &Value) -> DateTime<Utc> {
    for &(date_field, time_field) in DATE_FIELDS {
        let Some(date) = text_at(value, &[date_field]) else {
            continue;
        };
        // a date field that already carries its time is read on its own
        if date.contains('T') {
            return parse_instant(&date).unwrap_or_else(far_future);
        }
        match time_field {
            Some(time_field) => {
                if let Some(time) = text_at(value, &[time_field]) {
                    return parse_instant(&format!("{date}T{time}")).unwrap_or_else(far_future);
                }
            }
            None => return parse_instant(&date).unwrap_or_else(far_future),
        }
    }

    text_at(value, &[COMBINED_DATE_FIELD])
        .and_then(|combined| parse_combined(&combined))
        .unwrap_or_else(far_future)
}

pub fn event_year(value: &Value, current_year: i32) -> i32 {
    YEAR_FIELDS
        .iter()
        .filter_map(|path| text_at(value, path))
        .find_map(|s| s.get(0..4).and_then(|y| y.parse::<i32>().ok()))
        .unwrap_or(current_year)
}

pub fn filter_by_year(events: Vec<Value>, year: i32, current_year: i32) -> Vec<Value> {
    events
        .into_iter()
        .filter(|event| event_year(event, current_year) == year)
        .collect()
}

pub fn normalize_event(value: &Value, index: usize) -> RaceEvent {
    let round = ROUND_FIELDS
        .iter()
        .find_map(|path| round_at(value, path))
        .unwrap_or_else(|| u32::try_from(index + 1).unwrap_or(u32::MAX));

    RaceEvent {
        round,
        name: first_text(value, NAME_FIELDS).unwrap_or_else(|| format!("Race {round}")),
        country: first_text(value, COUNTRY_FIELDS).unwrap_or_else(|| "Unknown".to_string()),
        locality: first_text(value, LOCALITY_FIELDS),
        start: parse_race_date(value),
    }
}

/// Normalizes a payload list and orders it by start time.
pub fn normalize_events(values: &[Value]) -> Vec<RaceEvent> {
    let mut events: Vec<RaceEvent> = values
        .iter()
        .enumerate()
        .map(|(index, value)| normalize_event(value, index))
        .collect();
    events.sort_by_key(|event| event.start);
    events
}

pub fn is_placeholder_name(name: &str) -> bool {
    PLACEHOLDER_NAMES.contains(&name)
}

pub fn has_plausible_names(events: &[Value]) -> bool {
    events.iter().any(|event| {
        first_text(event, PLAUSIBLE_NAME_FIELDS).is_some_and(|name| !is_placeholder_name(&name))
    })
}

/// Finds the race list in a payload that may be a bare list or an object
/// wrapping one under a known field.
pub fn probe_event_list(body: &Value) -> Option<Vec<Value>> {
    if let Some(list) = body.as_array() {
        return (!list.is_empty()).then(|| list.clone());
    }
    LIST_FIELDS.iter().find_map(|path| {
        lookup(body, path)
            .and_then(Value::as_array)
            .filter(|list| !list.is_empty())
            .cloned()
    })
}

pub fn select_countdown(events: &[RaceEvent], now: DateTime<Utc>) -> Countdown {
    events
        .iter()
        .filter(|event| event.start > now)
        .min_by_key(|event| event.start)
        .map(|event| Countdown::Next {
            event: event.clone(),
            remaining: event.start - now,
        })
        .unwrap_or(Countdown::SeasonEnded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn separate_date_and_time_take_priority_over_combined() {
        let value = json!({
            "date": "2025-03-09",
            "time": "15:00:00Z",
            "datetime": "2025-01-01T00:00:00+03:00"
        });
        assert_eq!(parse_race_date(&value), utc(2025, 3, 9, 15, 0));
    }

    #[test]
    fn date_without_time_is_midnight_utc() {
        assert_eq!(
            parse_race_date(&json!({"date": "2025-04-06"})),
            utc(2025, 4, 6, 0, 0)
        );
        assert_eq!(
            parse_race_date(&json!({"race_date": "2025-04-06", "race_time": "05:00:00"})),
            utc(2025, 4, 6, 5, 0)
        );
        assert_eq!(
            parse_race_date(&json!({"startDate": "2025-04-06", "startTime": "05:30"})),
            utc(2025, 4, 6, 5, 30)
        );
        assert_eq!(
            parse_race_date(&json!({"date": "2025-03-09", "time": "15:00Z"})),
            utc(2025, 3, 9, 15, 0)
        );
        assert_eq!(
            parse_race_date(&json!({"date": "2025-03-09", "time": "18:00+03:00"})),
            utc(2025, 3, 9, 15, 0)
        );
        assert_eq!(
            parse_race_date(&json!({"date": "2025-03-09", "time": "15:00:00.000Z"})),
            utc(2025, 3, 9, 15, 0)
        );
    }

    #[test]
    fn full_timestamp_in_date_field_ignores_time_field() {
        assert_eq!(
            parse_race_date(&json!({"date": "2025-03-09T15:00:00Z", "time": "15:00:00Z"})),
            utc(2025, 3, 9, 15, 0)
        );
        assert_eq!(
            parse_race_date(&json!({"race_date": "2025-03-09T18:00:00+0300"})),
            utc(2025, 3, 9, 15, 0)
        );
    }

    #[test]
    fn combined_datetime_is_read_as_east_africa_time() {
        let value = json!({"datetime": "2025-03-16T14:00:00+03:00"});
        assert_eq!(parse_race_date(&value), utc(2025, 3, 16, 11, 0));
        let naive = json!({"datetime": "2025-03-16T14:00:00"});
        assert_eq!(parse_race_date(&naive), utc(2025, 3, 16, 11, 0));
        let compact = json!({"datetime": "2025-03-09T15:00:00.000+0300"});
        assert_eq!(parse_race_date(&compact), utc(2025, 3, 9, 12, 0));
        let short = json!({"datetime": "2025-03-09T15:00Z"});
        assert_eq!(parse_race_date(&short), utc(2025, 3, 9, 12, 0));
    }

    #[test]
    fn missing_or_unparsable_dates_use_sentinel() {
        assert_eq!(parse_race_date(&json!({"raceName": "Mystery GP"})), far_future());
        assert_eq!(parse_race_date(&json!({"date": "TBC"})), far_future());
        assert_eq!(
            parse_race_date(&json!({"date": "2025-03-09", "time": "late afternoon"})),
            far_future()
        );
        assert_eq!(parse_race_date(&json!({"datetime": "2025-03-09T25:00+0300"})), far_future());
        // the first present combination wins even when a later one would parse
        assert_eq!(
            parse_race_date(&json!({"date": "TBC", "datetime": "2025-03-16T14:00:00"})),
            far_future()
        );
    }

    #[test]
    fn mixed_shapes_sort_ascending() {
        let values = vec![
            json!({"raceName": "C", "datetime": "2025-05-01T16:00:00+03:00"}),
            json!({"raceName": "Unknown date"}),
            json!({"raceName": "A", "date": "2025-03-09", "time": "15:00:00Z"}),
            json!({"raceName": "B", "startDate": "2025-04-01"}),
        ];
        let events = normalize_events(&values);
        let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "Unknown date"]);
        assert!(events.windows(2).all(|w| w[0].start <= w[1].start));
    }

    #[test]
    fn resolves_fields_in_priority_order() {
        let value = json!({
            "name": "Generic",
            "title": "Title",
            "Circuit": {
                "circuitName": "Bahrain International Circuit",
                "Location": {"country": "Bahrain", "locality": "Sakhir"}
            },
            "roundNumber": "4"
        });
        let event = normalize_event(&value, 0);
        assert_eq!(event.name, "Generic");
        assert_eq!(event.country, "Bahrain");
        assert_eq!(event.locality.as_deref(), Some("Sakhir"));
        assert_eq!(event.round, 4);
    }

    #[test]
    fn missing_fields_fall_back_to_synthesized_values() {
        let event = normalize_event(&json!({"location": "Kenya"}), 2);
        assert_eq!(event.round, 3);
        assert_eq!(event.name, "Race 3");
        assert_eq!(event.country, "Kenya");
        assert_eq!(event.locality, None);

        let empty = normalize_event(&json!({"country": "  ", "round": 0}), 0);
        assert_eq!(empty.country, "Unknown");
        assert_eq!(empty.round, 1);
    }

    #[test]
    fn normalizing_canonical_shape_is_idempotent() {
        let event = normalize_event(
            &json!({
                "round": 5,
                "raceName": "Saudi Arabian Grand Prix",
                "Circuit": {"Location": {"country": "Saudi Arabia", "locality": "Jeddah"}},
                "date": "2025-04-20",
                "time": "17:00:00Z"
            }),
            0,
        );
        let canonical = serde_json::to_value(event.to_record()).unwrap();
        let again = normalize_event(&canonical, 9);
        assert_eq!(again, event);

        let no_locality = RaceEvent {
            locality: None,
            ..event.clone()
        };
        let canonical = serde_json::to_value(no_locality.to_record()).unwrap();
        assert_eq!(normalize_event(&canonical, 0), no_locality);
    }

    #[test]
    fn year_filter_keeps_matching_and_defaults_to_current_year() {
        let events = vec![
            json!({"raceName": "A", "date": "2024-11-30"}),
            json!({"raceName": "B", "date": "2025-03-09"}),
            json!({"raceName": "C", "date": "TBC"}),
            json!({"raceName": "D", "datetime": "2025-06-01T14:00:00+03:00"}),
        ];
        let kept = filter_by_year(events.clone(), 2025, 2025);
        let names: Vec<&str> = kept.iter().filter_map(|e| e["raceName"].as_str()).collect();
        assert_eq!(names, vec!["B", "C", "D"]);

        let kept = filter_by_year(events, 2025, 2026);
        let names: Vec<&str> = kept.iter().filter_map(|e| e["raceName"].as_str()).collect();
        assert_eq!(names, vec!["B", "D"]);
    }

    #[test]
    fn plausibility_rejects_placeholder_names() {
        assert!(!has_plausible_names(&[json!({"raceName": "Unknown"}), json!({"name": "unknown"})]));
        assert!(!has_plausible_names(&[json!({"circuit": "Monza"})]));
        assert!(has_plausible_names(&[json!({"raceName": "Unknown"}), json!({"title": "Italian GP"})]));
    }

    #[test]
    fn probes_known_list_shapes_in_order() {
        let bare = json!([{"raceName": "A"}]);
        assert_eq!(probe_event_list(&bare).map(|l| l.len()), Some(1));

        let nested = json!({"races": [], "schedule": [{"raceName": "B"}], "data": [{}, {}]});
        let list = probe_event_list(&nested).unwrap();
        assert_eq!(list, vec![json!({"raceName": "B"})]);

        let ergast = json!({"MRData": {"RaceTable": {"Races": [{"raceName": "C"}]}}});
        assert_eq!(probe_event_list(&ergast).map(|l| l.len()), Some(1));

        assert!(probe_event_list(&json!({"races": "nope"})).is_none());
        assert!(probe_event_list(&json!([])).is_none());
    }

    #[test]
    fn countdown_picks_first_future_race() {
        let events = normalize_events(&[
            json!({"raceName": "A", "date": "2025-03-09", "time": "15:00:00Z"}),
            json!({"raceName": "B", "date": "2025-04-06", "time": "05:00:00Z"}),
        ]);

        match select_countdown(&events, utc(2025, 1, 1, 0, 0)) {
            Countdown::Next { event, .. } => assert_eq!(event.name, "A"),
            Countdown::SeasonEnded => panic!("expected a next race"),
        }

        match select_countdown(&events, utc(2025, 3, 9, 15, 0)) {
            Countdown::Next { event, remaining } => {
                assert_eq!(event.name, "B");
                assert_eq!(remaining, utc(2025, 4, 6, 5, 0) - utc(2025, 3, 9, 15, 0));
            }
            Countdown::SeasonEnded => panic!("expected a next race"),
        }

        assert_eq!(
            select_countdown(&events, utc(2025, 12, 31, 0, 0)),
            Countdown::SeasonEnded
        );
    }
}
