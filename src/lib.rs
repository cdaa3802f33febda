//! # hddtempd
//!
//! A Linux daemon reporting storage-drive temperatures and spin-down state
//! over the classic `hddtemp` TCP protocol.
//!
//! ## Features
//!
//! - **UDisks2 Discovery**: Enumerates ATA drives over the D-Bus system bus
//! - **Dual Sensor Sources**: Prefers kernel drivetemp/hwmon readings,
//!   falls back to the SMART temperature attribute
//! - **Spin-Down Aware**: Sleeping disks report `SLP` instead of waking or
//!   lying about their temperature
//! - **Legacy Wire Format**: Field-separated records any hddtemp client
//!   can parse
//! - **Degraded Records**: A failing or hung drive yields a diagnostic
//!   record without aborting the rest of the fleet
//!
//! ## Architecture
//!
//! - [`discovery`] builds the immutable [`drive::Fleet`] at startup
//! - [`drive`] resolves each drive's temperature and power state live, on
//!   every request
//! - [`properties`] separates cached identity lookups from forced-fresh
//!   temperature queries
//! - [`report`] renders wire-format records; [`server`] serves one fresh
//!   full-fleet snapshot per TCP connection
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use hddtempd::{discovery, server::ReportServer};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let connection = zbus::Connection::system().await?;
//!     let fleet = discovery::scan(&connection, false).await?;
//!     let listener = tokio::net::TcpListener::bind(("localhost", 7634)).await?;
//!     ReportServer::new(Arc::new(fleet), '|')
//!         .serve(listener, CancellationToken::new())
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod discovery;
pub mod drive;
pub mod error;
pub mod properties;
pub mod report;
pub mod server;
pub mod udisks;
