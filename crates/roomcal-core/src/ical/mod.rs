//! iCalendar (RFC 5545) output: text escaping, line folding and rendering.

pub mod escape;
pub mod fold;
pub mod render;

pub use escape::{escape_text, unescape_text};
pub use fold::{DEFAULT_LINE_WIDTH, FoldingWriter};
pub use render::{
    CALENDAR_CONTENT_TYPE, CalendarRenderer, DEFAULT_PRODUCT_ID, Property, RendererOptions,
    write_property,
};
