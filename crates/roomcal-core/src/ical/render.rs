//! VEVENT and VCALENDAR rendering.
//!
//! An event becomes an ordered list of [`Property`] values, each written as
//! one escaped content line through a [`FoldingWriter`].

use std::borrow::Cow;
use std::io::Write;

use chrono::{DateTime, Utc};

use crate::error::RenderResult;
use crate::event::{DescriptionPolicy, EventRecord};
use crate::ical::escape::escape_text;
use crate::ical::fold::{DEFAULT_LINE_WIDTH, FoldingWriter};
use crate::time::{ConferenceClock, format_utc_stamp};

/// MIME type of rendered documents.
pub const CALENDAR_CONTENT_TYPE: &str = "text/calendar";

/// Default `PRODID` of rendered calendars.
pub const DEFAULT_PRODUCT_ID: &str = "-//roomcal//schedule//EN";

/// One content line before escaping and folding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property<'a> {
    pub key: &'static str,
    pub value: Cow<'a, str>,
}

impl<'a> Property<'a> {
    pub fn new(key: &'static str, value: impl Into<Cow<'a, str>>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }

    /// Writes the property as `KEY:escaped-value` followed by CRLF.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        write_property(writer, self.key, &self.value)
    }
}

/// Writes one content line.
///
/// Key, separator, escaped value and terminator are written as separate
/// chunks; folding is left to the writer.
pub fn write_property<W: Write>(writer: &mut W, key: &str, value: &str) -> std::io::Result<()> {
    writer.write_all(key.as_bytes())?;
    writer.write_all(b":")?;
    writer.write_all(escape_text(value).as_bytes())?;
    writer.write_all(b"\r\n")
}

/// Settings shared by every rendered document.
#[derive(Debug, Clone)]
pub struct RendererOptions {
    /// Timezone and fallbacks for schedule times.
    pub clock: ConferenceClock,
    /// Value of the calendar's `PRODID`.
    pub product_id: String,
    /// Fold width in octets.
    pub line_width: usize,
    /// How links shape descriptions.
    pub description: DescriptionPolicy,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            clock: ConferenceClock::default(),
            product_id: DEFAULT_PRODUCT_ID.to_string(),
            line_width: DEFAULT_LINE_WIDTH,
            description: DescriptionPolicy::default(),
        }
    }
}

impl RendererOptions {
    /// Builder: set the conference clock.
    pub fn with_clock(mut self, clock: ConferenceClock) -> Self {
        self.clock = clock;
        self
    }

    /// Builder: set the product identifier.
    pub fn with_product_id(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = product_id.into();
        self
    }

    /// Builder: set the fold width.
    pub fn with_line_width(mut self, width: usize) -> Self {
        self.line_width = width;
        self
    }

    /// Builder: set the description policy.
    pub fn with_description(mut self, policy: DescriptionPolicy) -> Self {
        self.description = policy;
        self
    }
}

/// Renders schedule events into iCalendar documents.
#[derive(Debug, Clone, Default)]
pub struct CalendarRenderer {
    options: RendererOptions,
}

impl CalendarRenderer {
    pub fn new(options: RendererOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    /// Returns the VEVENT properties of one event, in output order.
    pub fn event_properties<'a>(
        &self,
        event: &'a EventRecord,
        stamp: DateTime<Utc>,
    ) -> Vec<Property<'a>> {
        let clock = &self.options.clock;
        vec![
            Property::new("BEGIN", "VEVENT"),
            Property::new("DTSTAMP", format_utc_stamp(&stamp)),
            Property::new("DTSTART", format_utc_stamp(&clock.start_of(event))),
            Property::new("DTEND", format_utc_stamp(&clock.end_of(event))),
            Property::new("SUMMARY", event.summary()),
            Property::new("DESCRIPTION", event.description(self.options.description)),
            Property::new("LOCATION", event.place.as_str()),
            Property::new("UID", event.uid()),
            Property::new("END", "VEVENT"),
        ]
    }

    /// Writes one VEVENT block. Folding is up to `writer`.
    pub fn write_event<W: Write>(
        &self,
        writer: &mut W,
        event: &EventRecord,
        stamp: DateTime<Utc>,
    ) -> std::io::Result<()> {
        for property in self.event_properties(event, stamp) {
            property.write_to(writer)?;
        }
        Ok(())
    }

    /// Renders a complete calendar into `writer` and returns it.
    ///
    /// Events are emitted in iteration order, without sorting or
    /// deduplication. `stamp` becomes every event's DTSTAMP.
    pub fn render_to<'a, W, I>(
        &self,
        writer: W,
        events: I,
        stamp: DateTime<Utc>,
    ) -> RenderResult<W>
    where
        W: Write,
        I: IntoIterator<Item = &'a EventRecord>,
    {
        let mut folded = FoldingWriter::with_width(writer, self.options.line_width);

        write_property(&mut folded, "BEGIN", "VCALENDAR")?;
        write_property(&mut folded, "VERSION", "2.0")?;
        write_property(&mut folded, "PRODID", &self.options.product_id)?;
        for event in events {
            self.write_event(&mut folded, event, stamp)?;
        }
        write_property(&mut folded, "END", "VCALENDAR")?;

        Ok(folded.finish()?)
    }

    /// Renders a complete calendar into a byte buffer.
    pub fn render<'a, I>(&self, events: I, stamp: DateTime<Utc>) -> RenderResult<Vec<u8>>
    where
        I: IntoIterator<Item = &'a EventRecord>,
    {
        self.render_to(Vec::new(), events, stamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::ical::escape::unescape_text;

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2013, 6, 1, 12, 0, 0).unwrap()
    }

    fn opening() -> EventRecord {
        EventRecord {
            start: "20130530-1723".into(),
            end: "20130530-1800".into(),
            title: "Opening".into(),
            speaker: "Andi".into(),
            desc: "Welcome, everyone; enjoy".into(),
            place: "Saal1".into(),
            ..Default::default()
        }
    }

    fn render_event(renderer: &CalendarRenderer, event: &EventRecord) -> String {
        let mut out = Vec::new();
        renderer.write_event(&mut out, event, stamp()).unwrap();
        String::from_utf8(out).unwrap()
    }

    /// Splits a folded document into logical lines.
    fn logical_lines(document: &str) -> Vec<String> {
        document
            .replace("\r\n ", "")
            .split("\r\n")
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn write_property_terminates_with_crlf() {
        let mut out = Vec::new();
        write_property(&mut out, "LOCATION", "").unwrap();
        assert_eq!(out, b"LOCATION:\r\n");
    }

    #[test]
    fn vevent_snapshot() {
        let rendered = render_event(&CalendarRenderer::default(), &opening());
        insta::assert_snapshot!(rendered.replace("\r\n", "\n"), @r#"
        BEGIN:VEVENT
        DTSTAMP:20130601T120000Z
        DTSTART:20130530T152300Z
        DTEND:20130530T160000Z
        SUMMARY:"Opening" - Andi
        DESCRIPTION:Welcome\, everyone\; enjoy
        LOCATION:Saal1
        UID:74d8efa6522f11ff3e6befb4511a7d77538ee613c97c5950799c068ef12939cb
        END:VEVENT
        "#);
    }

    #[test]
    fn property_order_is_fixed() {
        let renderer = CalendarRenderer::default();
        let event = opening();
        let keys: Vec<_> = renderer
            .event_properties(&event, stamp())
            .iter()
            .map(|p| p.key)
            .collect();
        assert_eq!(
            keys,
            [
                "BEGIN",
                "DTSTAMP",
                "DTSTART",
                "DTEND",
                "SUMMARY",
                "DESCRIPTION",
                "LOCATION",
                "UID",
                "END"
            ]
        );
    }

    #[test]
    fn dtstart_is_converted_from_berlin_to_utc() {
        let event = EventRecord {
            start: "20130530-1723".into(),
            title: "Opening".into(),
            place: "Saal1".into(),
            ..Default::default()
        };
        let renderer = CalendarRenderer::default();
        let first = render_event(&renderer, &event);
        let second = render_event(&renderer, &event);

        assert!(first.contains("DTSTART:20130530T152300Z\r\n"));
        // End falls back to the start.
        assert!(first.contains("DTEND:20130530T152300Z\r\n"));
        assert!(first.contains(&format!("UID:{}\r\n", event.uid())));
        assert_eq!(first, second);
    }

    #[test]
    fn unparsable_times_use_conference_start() {
        let event = EventRecord {
            title: "TBA".into(),
            ..Default::default()
        };
        let rendered = render_event(&CalendarRenderer::default(), &event);
        assert!(rendered.contains("DTSTART:20130530T152300Z\r\n"));
        assert!(rendered.contains("DTEND:20130530T152300Z\r\n"));
        assert!(rendered.contains("LOCATION:\r\n"));
        assert!(rendered.contains("DESCRIPTION:No Description\r\n"));
    }

    #[test]
    fn link_description_is_escaped() {
        let mut event = opening();
        event.link = "http://example.org/a,b".into();
        let rendered = render_event(&CalendarRenderer::default(), &event);
        assert!(rendered.contains("DESCRIPTION:\\n\\nhttp://example.org/a\\,b\r\n"));
    }

    #[test]
    fn append_link_policy_keeps_the_text() {
        let renderer =
            CalendarRenderer::new(RendererOptions::default().with_description(DescriptionPolicy::AppendLink));
        let mut event = opening();
        event.link = "http://example.org".into();
        let rendered = render_event(&renderer, &event);
        assert!(rendered.contains(
            "DESCRIPTION:Welcome\\, everyone\\; enjoy\\n\\nhttp://example.org\r\n"
        ));
    }

    #[test]
    fn hundred_character_title_folds_once() {
        let title = "x".repeat(100);
        let event = EventRecord {
            title: title.clone(),
            ..Default::default()
        };
        let document = String::from_utf8(CalendarRenderer::default().render([&event], stamp()).unwrap())
            .unwrap();

        let summary_start = document.find("SUMMARY:").unwrap();
        let summary_end = summary_start + document[summary_start..].find("\r\nDESCRIPTION").unwrap();
        let summary = &document[summary_start..summary_end];

        assert_eq!(summary.matches("\r\n ").count(), 1);
        assert_eq!(
            summary.replace("\r\n ", ""),
            format!("SUMMARY:\"{title}\"")
        );
    }

    #[test]
    fn calendar_envelope_wraps_events_in_order() {
        let first = opening();
        let second = EventRecord {
            title: "Closing".into(),
            start: "20130602-1500".into(),
            place: "Saal2".into(),
            ..Default::default()
        };
        let document = String::from_utf8(
            CalendarRenderer::default()
                .render([&first, &second], stamp())
                .unwrap(),
        )
        .unwrap();

        let lines = logical_lines(&document);
        assert_eq!(lines[0], "BEGIN:VCALENDAR");
        assert_eq!(lines[1], "VERSION:2.0");
        assert_eq!(lines[2], format!("PRODID:{DEFAULT_PRODUCT_ID}"));
        assert_eq!(lines[3], "BEGIN:VEVENT");
        assert_eq!(lines[lines.len() - 2], "END:VCALENDAR");
        assert_eq!(lines[lines.len() - 1], "");
        assert!(document.ends_with("END:VCALENDAR\r\n"));

        let opening_at = document.find("SUMMARY:\"Opening\"").unwrap();
        let closing_at = document.find("SUMMARY:\"Closing\"").unwrap();
        assert!(opening_at < closing_at);
        assert_eq!(document.matches("BEGIN:VEVENT\r\n").count(), 2);
    }

    #[test]
    fn empty_calendar_has_only_the_envelope() {
        let document = CalendarRenderer::default()
            .render(std::iter::empty(), stamp())
            .unwrap();
        assert_eq!(
            String::from_utf8(document).unwrap(),
            format!(
                "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:{DEFAULT_PRODUCT_ID}\r\nEND:VCALENDAR\r\n"
            )
        );
    }

    #[test]
    fn long_unicode_description_round_trips() {
        let mut event = opening();
        event.long_desc = "Grüße, 日本語; \\ und\nmehr ".repeat(12);
        let renderer = CalendarRenderer::default();
        let document = String::from_utf8(renderer.render([&event], stamp()).unwrap()).unwrap();

        for line in document.split("\r\n") {
            assert!(line.len() <= DEFAULT_LINE_WIDTH, "{line:?}");
        }
        let description = logical_lines(&document)
            .into_iter()
            .find_map(|line| line.strip_prefix("DESCRIPTION:").map(str::to_string))
            .unwrap();
        assert_eq!(unescape_text(&description), event.long_desc);
    }

    #[test]
    fn narrow_line_width_is_honoured() {
        let renderer = CalendarRenderer::new(RendererOptions::default().with_line_width(20));
        let document = String::from_utf8(renderer.render([&opening()], stamp()).unwrap()).unwrap();
        assert!(document.split("\r\n").all(|line| line.len() <= 20));
    }
}
