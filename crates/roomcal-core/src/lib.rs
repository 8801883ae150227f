//! Core types: schedule events, time parsing, iCalendar rendering

pub mod error;
pub mod event;
pub mod ical;
pub mod time;
pub mod tracing;

pub use error::{RenderError, RenderResult};
pub use event::{DescriptionPolicy, EventRecord, NO_DESCRIPTION};
pub use ical::{
    CALENDAR_CONTENT_TYPE, CalendarRenderer, DEFAULT_LINE_WIDTH, DEFAULT_PRODUCT_ID,
    FoldingWriter, RendererOptions, escape_text, unescape_text,
};
pub use time::{ConferenceClock, DEFAULT_TIMEZONE, EndFallback, format_utc_stamp, parse_compact_time};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
