//! TCP report daemon.
//!
//! The classic hddtemp protocol has no request body: connecting is the
//! request. Every accepted connection gets one freshly computed full-fleet
//! snapshot and is then closed. The fleet is injected at construction; the
//! server holds no other state and nothing is shared between connections.

use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
};
use tokio_util::sync::CancellationToken;

use crate::{drive::Fleet, error::Result, report};

/// Serves one full-fleet snapshot per accepted connection.
pub struct ReportServer {
    fleet: Arc<Fleet>,
    separator: char,
}

impl ReportServer {
    pub fn new(fleet: Arc<Fleet>, separator: char) -> Self {
        Self { fleet, separator }
    }

    /// Accept loop. Each connection is handled on its own task; concurrent
    /// connections each trigger an independent report cycle. Runs until the
    /// token is cancelled.
    pub async fn serve(&self, listener: TcpListener, cancel: CancellationToken) -> Result<()> {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("report server shutting down");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!("connection from {peer}");
                        let fleet = self.fleet.clone();
                        let separator = self.separator;
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &fleet, separator).await {
                                warn!("connection error: {e}");
                            }
                        });
                    }
                    Err(e) => error!("accept failed: {e}"),
                }
            }
        }

        Ok(())
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    fleet: &Fleet,
    separator: char,
) -> std::io::Result<()> {
    let snapshot = report::fleet_report(fleet, separator).await;
    stream.write_all(snapshot.as_bytes()).await?;
    stream.shutdown().await
}
