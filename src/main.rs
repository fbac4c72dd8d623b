//! # Task Queue Server - Entry Point
//! src/main.rs
//!
//! Parsea la configuración, arranca el servidor y lo apaga en orden al
//! recibir Ctrl-C / SIGTERM.

use clap::Parser;
use task_queue_server::config::Config;
use task_queue_server::error::ServerError;
use task_queue_server::logging::init_logging;
use task_queue_server::server::Server;
use tracing::{error, info, warn};

fn main() {
    let config = Config::parse();
    init_logging(&config.log_level);

    if let Err(e) = run(config) {
        error!(error = %e, "Fatal error");
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<(), ServerError> {
    config.validate()?;
    info!("Task Queue Server v{}", env!("CARGO_PKG_VERSION"));
    config.print_summary();

    let server = Server::bind(&config)?;

    let shutdown = server.shutdown_handle();
    ctrlc::set_handler(move || {
        info!("Signal received, shutting down...");
        shutdown.trigger();
    })
    .map_err(|e| ServerError::Signal(e.to_string()))?;

    let report = server.run()?;
    if report.is_clean() {
        info!(workers = report.exited, "Server stopped cleanly");
    } else {
        warn!(
            exited = report.exited,
            still_running = report.still_running,
            "Server stopped with workers still running"
        );
    }
    Ok(())
}
