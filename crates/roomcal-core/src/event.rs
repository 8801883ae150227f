//! Schedule event records.
//!
//! [`EventRecord`] mirrors one entry of the upstream JSON schedule. Every field
//! is free text and may be empty; derived values (summary line, description,
//! stable identity) are computed here so every renderer agrees on them.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Description used when an event carries no text at all.
pub const NO_DESCRIPTION: &str = "No Description";

/// One event as published by the upstream schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRecord {
    #[serde(rename = "Confirmed")]
    pub confirmed: String,
    /// Compact local start time, `YYYYMMDD-HHMM`.
    #[serde(rename = "Start")]
    pub start: String,
    /// Compact local end time, `YYYYMMDD-HHMM`.
    #[serde(rename = "End")]
    pub end: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Speaker")]
    pub speaker: String,
    #[serde(rename = "Affiliation")]
    pub affiliation: String,
    #[serde(rename = "Desc")]
    pub desc: String,
    #[serde(rename = "Long_desc", alias = "LongDesc")]
    pub long_desc: String,
    #[serde(rename = "Link")]
    pub link: String,
    /// Room the event takes place in. Empty means unplaced.
    #[serde(rename = "Place")]
    pub place: String,
}

/// How a non-empty `Link` shapes the event description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DescriptionPolicy {
    /// The description becomes the link alone, preceded by a blank line.
    #[default]
    LinkOverrides,
    /// The link is appended after a blank line.
    AppendLink,
}

impl EventRecord {
    /// Returns true if the event has a room.
    pub fn is_placed(&self) -> bool {
        !self.place.is_empty()
    }

    /// Returns the summary line: quoted title, speaker and affiliation.
    ///
    /// The affiliation is omitted when it repeats the speaker.
    pub fn summary(&self) -> String {
        let mut summary = format!("\"{}\"", self.title);
        if !self.speaker.is_empty() {
            summary.push_str(" - ");
            summary.push_str(&self.speaker);
        }
        if !self.affiliation.is_empty() && self.affiliation != self.speaker {
            summary.push_str(" (");
            summary.push_str(&self.affiliation);
            summary.push(')');
        }
        summary
    }

    /// Returns the description text under the given link policy.
    pub fn description(&self, policy: DescriptionPolicy) -> String {
        let text = if !self.long_desc.is_empty() {
            self.long_desc.as_str()
        } else if !self.desc.is_empty() {
            self.desc.as_str()
        } else {
            NO_DESCRIPTION
        };

        if self.link.is_empty() {
            return text.to_string();
        }

        match policy {
            DescriptionPolicy::LinkOverrides => format!("\n\n{}", self.link),
            DescriptionPolicy::AppendLink => format!("{}\n\n{}", text, self.link),
        }
    }

    /// Returns the stable event identifier.
    ///
    /// Lowercase hex SHA-256 over start, title and place. The same triple
    /// always yields the same identifier, which lets calendar clients match
    /// events across refreshes.
    pub fn uid(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.start.as_bytes());
        hasher.update(self.title.as_bytes());
        hasher.update(self.place.as_bytes());
        hex::encode(hasher.finalize())
    }
}
