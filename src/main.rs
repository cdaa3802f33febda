use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, info};
use syslog::{BasicLogger, Facility, Formatter3164};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use zbus::Connection;

use hddtempd::{cli::Cli, config::Settings, discovery, server::ReportServer};

fn init_log(debug: bool) -> Result<()> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    syslog::unix(Formatter3164 {
        facility: Facility::LOG_DAEMON,
        hostname: None,
        process: "hddtempd".into(),
        pid: 0,
    })
    .map_err(|e| anyhow!("{e}"))
    .and_then(|logger| {
        log::set_boxed_logger(Box::new(BasicLogger::new(logger)))
            .map(|_| log::set_max_level(level))
            .map_err(|e| anyhow!("{e}"))
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_cli(&cli)?;
    init_log(settings.debug)?;

    let connection = Connection::system()
        .await
        .context("connect to the system bus")?;
    let fleet = discovery::scan(&connection, settings.debug)
        .await
        .context("drive discovery")?;

    if settings.daemon {
        let listener = TcpListener::bind((settings.listen.as_str(), settings.port))
            .await
            .with_context(|| format!("bind {}:{}", settings.listen, settings.port))?;
        println!("listening on {}:{}", settings.listen, settings.port);
        println!("monitoring {}", fleet.names().join(", "));

        let server = ReportServer::new(Arc::new(fleet), settings.separator);
        let cancel = CancellationToken::new();
        tokio::select! {
            result = server.serve(listener, cancel.child_token()) => {
                result.context("report server")?;
            }
            result = tokio::signal::ctrl_c() => {
                result.context("listen for shutdown signal")?;
                info!("received Ctrl+C, shutting down");
                cancel.cancel();
            }
        }

        return Ok(());
    }

    for drive in fleet.drives() {
        let state = drive.power_state().await;
        match drive.temperature().await {
            Ok(celsius) => println!(
                "{}: {celsius} °{} idle={state}",
                drive.name(),
                drive.unit().symbol()
            ),
            Err(e) => println!("{}: read failed ({e}) idle={state}", drive.name()),
        }
    }

    Ok(())
}
