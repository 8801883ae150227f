//! Serve command: runs the refresh loop and the HTTP server in the foreground.
//!
//! This module wires the server components together:
//! - Schedule provider from `[source]`
//! - Refresher (fetch, group, render, publish) and its scheduler
//! - Signal handler (SIGTERM/SIGINT for shutdown, SIGHUP for refresh)
//! - axum router on the configured listen address

use std::time::Duration;

use roomcal_core::CalendarRenderer;
use roomcal_server::{
    AppState, DocumentCache, Refresher, Scheduler, SchedulerExit, ServerError, SignalHandler, bind,
    router, serve,
};
use tracing::{error, info, warn};

use crate::commands::build_provider;
use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// Runs the server until a shutdown signal arrives or refreshing halts.
pub async fn run(config: &AppConfig) -> CliResult<()> {
    config.validate()?;
    let server_config = config.server_config()?;

    // 1. Provider and renderer
    let provider = build_provider(config)?;
    let renderer = CalendarRenderer::new(config.renderer_options()?);

    // 2. Cache and refresher
    let cache = DocumentCache::shared();
    let refresher = Refresher::new(provider, renderer, cache.clone(), server_config.refresh());
    let health = refresher.health();

    // 3. Scheduler and signal handler
    let scheduler = Scheduler::new(server_config.scheduler());
    let scheduler_handle = scheduler.handle();

    let signal_handler = SignalHandler::new();
    signal_handler.spawn_listener(scheduler_handle.clone())?;
    let shutdown = signal_handler.shutdown_handle();

    // 4. Bind before the first refresh so a taken port fails fast
    let listener = bind(server_config.bind).await?;

    // 5. Refresh loop; a halted loop shuts the server down
    let scheduler_task = tokio::spawn(async move {
        let exit = scheduler
            .run(move || {
                let refresher = refresher.clone();
                async move { refresher.run_cycle().await }
            })
            .await;
        if let SchedulerExit::Halted(ref reason) = exit {
            error!(error = %reason, "Refresh halted, shutting down");
            shutdown.trigger();
        }
        exit
    });

    // 6. HTTP until shutdown
    let app = router(AppState::new(cache, health, server_config.unknown_room));
    info!(
        bind = %server_config.bind,
        interval_secs = server_config.refresh_interval.as_secs(),
        "roomcal serving"
    );
    serve(listener, app, signal_handler.shutdown()).await?;

    info!("Shutting down...");
    if let Err(e) = scheduler_handle.stop().await {
        // Already gone when it halted.
        warn!(error = %e, "Failed to send stop command to scheduler");
    }

    let exit = match tokio::time::timeout(Duration::from_secs(5), scheduler_task).await {
        Ok(Ok(exit)) => exit,
        Ok(Err(e)) => return Err(CliError::Server(format!("refresh task failed: {}", e))),
        Err(_) => {
            warn!("Scheduler did not stop in time");
            SchedulerExit::Stopped
        }
    };

    match exit {
        SchedulerExit::Stopped => {
            info!("Server stopped");
            Ok(())
        }
        SchedulerExit::Halted(reason) => Err(ServerError::halted(reason).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn abort_policy_ends_serve_with_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let mut config = AppConfig::default();
        config.source.file = Some(file.path().to_path_buf());
        config.server.bind = "127.0.0.1:0".to_string();
        config.server.on_fetch_error = roomcal_server::FetchFailurePolicy::Abort;

        let result = tokio::time::timeout(Duration::from_secs(5), run(&config))
            .await
            .unwrap();
        let err = result.unwrap_err();
        assert!(matches!(err, CliError::Server(ref msg) if msg.contains("invalid_response")));
        assert!(err.to_string().starts_with("server error: Refresh halted:"));
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_binding() {
        let mut config = AppConfig::default();
        config.server.refresh_interval_secs = 0;

        assert!(matches!(run(&config).await, Err(CliError::Config(_))));
    }
}
