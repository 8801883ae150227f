//! Schedule time handling.
//!
//! The upstream schedule publishes local times in a compact `YYYYMMDD-HHMM`
//! form without any zone information. [`ConferenceClock`] pins those times to
//! a single civil timezone and supplies the fallbacks used when a field is
//! missing or malformed, so resolving an event's start or end never fails.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::event::EventRecord;

/// Length of a compact time string, `YYYYMMDD-HHMM`.
const COMPACT_TIME_LEN: usize = 13;

/// Timezone of the conference the default schedule belongs to.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Berlin;

/// Parses a compact local time (`YYYYMMDD-HHMM`) in the given timezone.
///
/// Seconds are always zero. Any malformed input returns `fallback`
/// unchanged. Values chrono refuses to construct (month 13, day 32, a local
/// time skipped by a DST transition) also resolve to `fallback`; a local time
/// that occurs twice resolves to the earlier instant.
pub fn parse_compact_time(text: &str, tz: Tz, fallback: DateTime<Tz>) -> DateTime<Tz> {
    match parse_naive(text).map(|naive| tz.from_local_datetime(&naive)) {
        Some(LocalResult::Single(dt)) => dt,
        Some(LocalResult::Ambiguous(earliest, _)) => earliest,
        Some(LocalResult::None) | None => fallback,
    }
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    let bytes = text.as_bytes();
    if bytes.len() != COMPACT_TIME_LEN || bytes[8] != b'-' {
        return None;
    }

    let year = digits(&bytes[0..4])?;
    let month = digits(&bytes[4..6])?;
    let day = digits(&bytes[6..8])?;
    let hour = digits(&bytes[9..11])?;
    let minute = digits(&bytes[11..13])?;

    NaiveDate::from_ymd_opt(year as i32, month, day)?.and_hms_opt(hour, minute, 0)
}

fn digits(bytes: &[u8]) -> Option<u32> {
    bytes.iter().try_fold(0u32, |acc, b| {
        b.is_ascii_digit().then(|| acc * 10 + u32::from(b - b'0'))
    })
}

/// Formats an instant as an iCalendar UTC date-time (`YYYYMMDDTHHMMSSZ`).
pub fn format_utc_stamp<Tz2: TimeZone>(instant: &DateTime<Tz2>) -> String {
    instant
        .with_timezone(&Utc)
        .format("%Y%m%dT%H%M%SZ")
        .to_string()
}

/// What an event's end resolves to when its `End` field is unusable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndFallback {
    /// The event's resolved start.
    #[default]
    Start,
    /// The configured conference end.
    ConferenceEnd,
}

/// The fixed civil timezone and fallback instants of one conference.
#[derive(Debug, Clone, PartialEq)]
pub struct ConferenceClock {
    tz: Tz,
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    end_fallback: EndFallback,
}

impl Default for ConferenceClock {
    fn default() -> Self {
        let tz = DEFAULT_TIMEZONE;
        // Both instants fall outside DST transitions.
        let start = tz
            .with_ymd_and_hms(2013, 5, 30, 17, 23, 0)
            .single()
            .expect("valid conference start");
        let end = tz
            .with_ymd_and_hms(2013, 6, 2, 15, 30, 0)
            .single()
            .expect("valid conference end");
        Self::new(tz, start, end)
    }
}

impl ConferenceClock {
    /// Creates a clock for the given timezone and conference bounds.
    pub fn new(tz: Tz, start: DateTime<Tz>, end: DateTime<Tz>) -> Self {
        Self {
            tz,
            start: start.with_timezone(&tz),
            end: end.with_timezone(&tz),
            end_fallback: EndFallback::default(),
        }
    }

    /// Builds a clock from local wall-clock bounds.
    ///
    /// Returns `None` if either bound does not exist in `tz`.
    pub fn from_local(tz: Tz, start: NaiveDateTime, end: NaiveDateTime) -> Option<Self> {
        let start = tz.from_local_datetime(&start).earliest()?;
        let end = tz.from_local_datetime(&end).earliest()?;
        Some(Self::new(tz, start, end))
    }

    /// Builder: set the end fallback.
    pub fn with_end_fallback(mut self, fallback: EndFallback) -> Self {
        self.end_fallback = fallback;
        self
    }

    /// Returns the timezone schedule times are interpreted in.
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Returns the conference start.
    pub fn conference_start(&self) -> DateTime<Tz> {
        self.start
    }

    /// Returns the conference end.
    pub fn conference_end(&self) -> DateTime<Tz> {
        self.end
    }

    /// Returns the end fallback in use.
    pub fn end_fallback(&self) -> EndFallback {
        self.end_fallback
    }

    /// Parses a compact time against this clock's timezone.
    pub fn parse(&self, text: &str, fallback: DateTime<Tz>) -> DateTime<Tz> {
        parse_compact_time(text, self.tz, fallback)
    }

    /// Resolves an event's start, falling back to the conference start.
    pub fn start_of(&self, event: &EventRecord) -> DateTime<Tz> {
        self.parse(&event.start, self.start)
    }

    /// Resolves an event's end, falling back according to [`EndFallback`].
    pub fn end_of(&self, event: &EventRecord) -> DateTime<Tz> {
        let fallback = match self.end_fallback {
            EndFallback::Start => self.start_of(event),
            EndFallback::ConferenceEnd => self.end,
        };
        self.parse(&event.end, fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn berlin(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Tz> {
        DEFAULT_TIMEZONE
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .single()
            .unwrap()
    }

    #[test]
    fn parses_compact_time() {
        let fallback = berlin(2000, 1, 1, 0, 0);
        let parsed = parse_compact_time("20130530-1723", DEFAULT_TIMEZONE, fallback);
        assert_eq!(parsed, berlin(2013, 5, 30, 17, 23));
    }

    #[test]
    fn malformed_input_returns_fallback() {
        let fallback = berlin(2013, 5, 30, 17, 23);
        for input in [
            "",
            "2013",
            "20130530 1723",
            "20130530-17234",
            "2013O530-1723",
            "20130530-17:3",
            "+0130530-1723",
        ] {
            assert_eq!(
                parse_compact_time(input, DEFAULT_TIMEZONE, fallback),
                fallback,
                "input {input:?}"
            );
        }
    }

    #[test]
    fn out_of_range_fields_return_fallback() {
        let fallback = berlin(2013, 5, 30, 17, 23);
        assert_eq!(
            parse_compact_time("20131330-1000", DEFAULT_TIMEZONE, fallback),
            fallback
        );
        assert_eq!(
            parse_compact_time("20130532-1000", DEFAULT_TIMEZONE, fallback),
            fallback
        );
        assert_eq!(
            parse_compact_time("20130530-2500", DEFAULT_TIMEZONE, fallback),
            fallback
        );
    }

    #[test]
    fn dst_gap_returns_fallback_and_overlap_picks_earliest() {
        let fallback = berlin(2013, 5, 30, 17, 23);
        // 2013-03-31 02:30 does not exist in Berlin.
        assert_eq!(
            parse_compact_time("20130331-0230", DEFAULT_TIMEZONE, fallback),
            fallback
        );

        // 2013-10-27 02:30 happens twice; the first one is still CEST (+02:00).
        let overlap = parse_compact_time("20131027-0230", DEFAULT_TIMEZONE, fallback);
        assert_eq!(format_utc_stamp(&overlap), "20131027T003000Z");
    }

    #[test]
    fn stamp_is_rendered_in_utc() {
        assert_eq!(
            format_utc_stamp(&berlin(2013, 5, 30, 17, 23)),
            "20130530T152300Z"
        );
        assert_eq!(
            format_utc_stamp(&berlin(2013, 1, 5, 0, 30)),
            "20130104T233000Z"
        );
    }

    #[test]
    fn event_start_falls_back_to_conference_start() {
        let clock = ConferenceClock::default();
        let event = EventRecord {
            start: "garbage".into(),
            ..Default::default()
        };
        assert_eq!(clock.start_of(&event), clock.conference_start());
    }

    #[test]
    fn event_end_falls_back_to_start_by_default() {
        let clock = ConferenceClock::default();
        let event = EventRecord {
            start: "20130531-1000".into(),
            end: "".into(),
            ..Default::default()
        };
        assert_eq!(clock.end_of(&event), berlin(2013, 5, 31, 10, 0));
    }

    #[test]
    fn event_end_can_fall_back_to_conference_end() {
        let clock = ConferenceClock::default().with_end_fallback(EndFallback::ConferenceEnd);
        let event = EventRecord {
            start: "20130531-1000".into(),
            end: "soon".into(),
            ..Default::default()
        };
        assert_eq!(clock.end_of(&event), clock.conference_end());
    }

    #[test]
    fn from_local_rejects_nonexistent_bounds() {
        let start = NaiveDate::from_ymd_opt(2013, 3, 31)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let end = NaiveDate::from_ymd_opt(2013, 4, 2)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert!(ConferenceClock::from_local(DEFAULT_TIMEZONE, start, end).is_none());
    }
}
