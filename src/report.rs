//! Wire-format report rendering.
//!
//! One record per drive, all records concatenated in fleet order. The field
//! layout mirrors what classic `hddtemp` clients parse, including the
//! leading and trailing separators.

use std::time::Duration;

use futures::future::join_all;
use log::warn;
use tokio::time::timeout;

use crate::{
    drive::{Drive, Fleet},
    error::Error,
};

/// Sentinel temperature for a spun-down drive.
const SLEEPING: &str = "SLP";

/// Diagnostic sentinel for a drive whose queries failed; keeps the field
/// count intact so parsers survive a degraded record.
const FAILED: &str = "ERR";

/// Unit placeholder when no numeric temperature is reported.
const NO_UNIT: &str = "*";

/// Ceiling for one drive's record computation. A hung device degrades its
/// own record instead of stalling the whole listener.
const DRIVE_DEADLINE: Duration = Duration::from_secs(10);

/// Renders one record:
/// `<sep><dev><sep><model><sep><temp><sep><unit><sep><sep>`.
pub fn record(sep: char, dev: &str, model: &str, temperature: &str, unit: &str) -> String {
    let mut out = String::new();
    for field in [dev, model, temperature, unit, ""] {
        out.push(sep);
        out.push_str(field);
    }
    out.push(sep);
    out
}

/// Computes one drive's current record.
///
/// A confirmed spin-down renders `SLP` with no unit; the temperature is not
/// read in that case. Unknown power state renders a live temperature like
/// the active case. Any per-drive failure degrades to an `ERR` record.
pub async fn drive_record(drive: &Drive, sep: char) -> String {
    let dev = drive.dev().display().to_string();
    let model = drive.model_label();

    if drive.power_state().await.is_idle() {
        return record(sep, &dev, model, SLEEPING, NO_UNIT);
    }

    match drive.temperature().await {
        Ok(celsius) => {
            let rounded = format!("{}", celsius.round() as i64);
            record(sep, &dev, model, &rounded, drive.unit().symbol())
        }
        Err(e) => {
            warn!("temperature read failed for {}: {e}", drive.name());
            record(sep, &dev, model, FAILED, NO_UNIT)
        }
    }
}

/// Full-fleet snapshot: every drive's record concatenated in fleet order,
/// computed concurrently with a per-drive deadline. Recomputed from scratch
/// on every call; nothing is cached between reports.
pub async fn fleet_report(fleet: &Fleet, sep: char) -> String {
    let records = join_all(fleet.drives().iter().map(|drive| async move {
        match timeout(DRIVE_DEADLINE, drive_record(drive, sep)).await {
            Ok(rendered) => rendered,
            Err(_) => {
                warn!("{}", Error::Timeout(drive.name().to_string()));
                record(
                    sep,
                    &drive.dev().display().to_string(),
                    drive.model_label(),
                    FAILED,
                    NO_UNIT,
                )
            }
        }
    }))
    .await;

    records.concat()
}
