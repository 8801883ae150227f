//! Rooms command: list document keys with their event counts.

use roomcal_core::EventRecord;
use roomcal_server::{STATUS_KEY, group_by_room};

use crate::commands::build_provider;
use crate::config::AppConfig;
use crate::error::CliResult;

/// One line of the room listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomCount {
    pub room: String,
    pub events: usize,
}

/// Prints every room key with its event count, the all-events key first.
pub async fn run(config: &AppConfig) -> CliResult<()> {
    let provider = build_provider(config)?;
    let events = provider.fetch_schedule().await?;

    for line in room_counts(&events, &config.calendar.all_events_key) {
        println!("{}\t{}", line.room, line.events);
    }
    Ok(())
}

/// Counts events per document key.
pub fn room_counts(events: &[EventRecord], all_events_key: &str) -> Vec<RoomCount> {
    let mut counts = vec![RoomCount {
        room: all_events_key.to_string(),
        events: events.len(),
    }];
    counts.extend(
        group_by_room(events)
            .into_iter()
            .filter(|(room, _)| *room != all_events_key && *room != STATUS_KEY)
            .map(|(room, room_events)| RoomCount {
                room: room.to_string(),
                events: room_events.len(),
            }),
    );
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(place: &str) -> EventRecord {
        EventRecord {
            place: place.into(),
            ..Default::default()
        }
    }

    #[test]
    fn counts_rooms_after_all_events() {
        let events = vec![event("Saal2"), event("Saal1"), event(""), event("Saal2")];
        let counts = room_counts(&events, "Alle");

        let pairs: Vec<_> = counts
            .iter()
            .map(|c| (c.room.as_str(), c.events))
            .collect();
        assert_eq!(pairs, vec![("Alle", 4), ("Saal1", 1), ("Saal2", 2)]);
    }

    #[test]
    fn colliding_room_is_not_listed_twice() {
        let events = vec![event("Alle"), event("Saal1")];
        let counts = room_counts(&events, "Alle");
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].events, 2);
    }

    #[test]
    fn status_room_is_not_listed() {
        let events = vec![event("_status"), event("Saal1")];
        let rooms: Vec<_> = room_counts(&events, "Alle")
            .into_iter()
            .map(|c| c.room)
            .collect();
        assert_eq!(rooms, vec!["Alle", "Saal1"]);
    }
}
