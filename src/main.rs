use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use tokio::signal;
use tokio::signal::unix::SignalKind;

use zigate_admin::config;
use zigate_admin::error::ApiResult;
use zigate_admin::server::appstate::AppState;
use zigate_admin::server::http;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: Utf8PathBuf,
}

/*
 * Formatter function to output in syslog format. This makes sense when running
 * as a service (where output might go to a log file, or the system journal)
 */
#[allow(clippy::match_same_arms)]
fn syslog_format(
    buf: &mut pretty_env_logger::env_logger::fmt::Formatter,
    record: &log::Record,
) -> std::io::Result<()> {
    writeln!(
        buf,
        "<{}>{}: {}",
        match record.level() {
            log::Level::Error => 3,
            log::Level::Warn => 4,
            log::Level::Info => 6,
            log::Level::Debug => 7,
            log::Level::Trace => 7,
        },
        record.target(),
        record.args()
    )
}

fn init_logging() -> ApiResult<()> {
    /* Try to provide reasonable default filters, when RUST_LOG is not specified */
    const DEFAULT_LOG_FILTERS: &[&str] = &[
        "debug",
        "hyper=info",
        "reqwest=info",
        "tower_http::trace::on_request=info",
        "h2=info",
        "axum::rejection=trace",
    ];

    let log_filters = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTERS.join(","));

    /* Detect if we need syslog or human-readable formatting */
    if std::env::var("SYSTEMD_EXEC_PID").is_ok_and(|pid| pid == std::process::id().to_string()) {
        Ok(pretty_env_logger::env_logger::builder()
            .format(syslog_format)
            .parse_filters(&log_filters)
            .try_init()?)
    } else {
        Ok(pretty_env_logger::formatted_timed_builder()
            .parse_filters(&log_filters)
            .try_init()?)
    }
}

async fn shutdown_signal() -> ApiResult<()> {
    let mut term = signal::unix::signal(SignalKind::terminate())?;
    tokio::select! {
        _ = signal::ctrl_c() => log::warn!("Ctrl-C pressed, exiting.."),
        _ = term.recv() => log::warn!("SIGTERM received, exiting.."),
    }
    let _ = std::io::stderr().flush();
    Ok(())
}

async fn run() -> ApiResult<()> {
    init_logging()?;

    let args = Args::parse();
    let config = config::parse(&args.config)?;
    log::debug!("Configuration loaded successfully");

    let appstate = AppState::from_config(config)?;

    // Warm the snapshot so the first request doesn't pay for a full fetch.
    // An offline gateway is not fatal here; the next request retries.
    match appstate.reload().await {
        Ok(snapshot) => log::info!(
            "Initial refresh: {} equipments, {} discovered",
            snapshot.equipments.len(),
            snapshot.discovered.len()
        ),
        Err(err) => log::warn!("Initial refresh failed: {err}"),
    }

    let conf = appstate.config();
    let service = http::build_service(appstate);

    tokio::select! {
        res = http::serve(conf.server.listen, conf.server.port, service) => res,
        res = shutdown_signal() => res,
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        log::error!("zigate-admin error: {err}");
        log::error!("Fatal error encountered, cannot continue.");
    }
}
