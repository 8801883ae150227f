//! Render command: fetch once, render one calendar, write it out.

use std::io::Write;
use std::path::Path;

use chrono::Utc;
use roomcal_core::CalendarRenderer;
use roomcal_server::{RenderedDocument, render_snapshot};
use tracing::info;

use crate::cli::RenderArgs;
use crate::commands::build_provider;
use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// Renders the requested room (or the all-events calendar).
pub async fn run(config: &AppConfig, args: &RenderArgs) -> CliResult<()> {
    let document = render_room(config, args.room.as_deref()).await?;

    match args.output {
        Some(ref path) => write_file(path, &document).await,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(document.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}

/// Fetches the schedule and renders the document `room` would be served.
pub async fn render_room(config: &AppConfig, room: Option<&str>) -> CliResult<RenderedDocument> {
    let provider = build_provider(config)?;
    let renderer = CalendarRenderer::new(config.renderer_options()?);
    let events = provider.fetch_schedule().await?;

    let all_events_key = config.calendar.all_events_key.as_str();
    let room = room.unwrap_or(all_events_key);
    let snapshot = render_snapshot(&renderer, &events, all_events_key, Utc::now())?;

    let document = snapshot
        .get(room)
        .cloned()
        .ok_or_else(|| CliError::UnknownRoom(room.to_string()))?;
    info!(room, events = events.len(), bytes = document.len(), "Rendered calendar");
    Ok(document)
}

async fn write_file(path: &Path, document: &RenderedDocument) -> CliResult<()> {
    tokio::fs::write(path, document.as_bytes())
        .await
        .map_err(CliError::from)?;
    info!(path = %path.display(), "Wrote calendar");
    Ok(())
}
