//! Drive model: identity, temperature resolution, and spin-down state.
//!
//! A [`Drive`] is built once at discovery and its identity never changes.
//! Temperature and power state are deliberately NOT stored: every report
//! request re-reads the kernel sensor or re-queries the device service, so
//! clients always see a live snapshot.

use std::{
    fmt, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::debug;

use crate::{
    error::{Error, Result},
    properties::{DriveEndpoint, PropertyCache},
    udisks::{ATA_IFACE, DRIVE_IFACE},
};

const BY_ID_ROOT: &str = "/dev/disk/by-id";
const SYS_BLOCK: &str = "/sys/class/block";
const SMART_TEMPERATURE: &str = "SmartTemperature";

/// Water freezes at 273.15 K; SMART reports temperature in Kelvin.
const KELVIN_OFFSET: f64 = 273.15;

/// Reporting unit. The protocol only ever emits Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
}

impl TemperatureUnit {
    pub fn symbol(self) -> &'static str {
        "C"
    }
}

/// Outcome of a live power-management query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// The query returned zero: the drive is spun up.
    Active,
    /// The query returned a nonzero state: the drive is spun down.
    Idle,
    /// The query failed, commonly EACCES when not running as root. Kept
    /// distinct from `Active` so callers can tell "confirmed awake" from
    /// "no idea".
    Unknown,
}

impl PowerState {
    pub fn from_raw(raw: u8) -> Self {
        if raw == 0 {
            PowerState::Active
        } else {
            PowerState::Idle
        }
    }

    /// Only a confirmed spin-down counts as idle; `Unknown` does not.
    pub fn is_idle(self) -> bool {
        matches!(self, PowerState::Idle)
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PowerState::Active => "active",
            PowerState::Idle => "idle",
            PowerState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// One physical storage device.
pub struct Drive {
    endpoint: Arc<dyn DriveEndpoint>,
    ata_props: PropertyCache,
    vendor: Option<String>,
    model: Option<String>,
    serial: Option<String>,
    wwn: String,
    uid: String,
    path: PathBuf,
    dev: PathBuf,
    name: String,
    hwmon: Option<PathBuf>,
    unit: TemperatureUnit,
}

impl std::fmt::Debug for Drive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Drive")
            .field("vendor", &self.vendor)
            .field("model", &self.model)
            .field("serial", &self.serial)
            .field("wwn", &self.wwn)
            .field("uid", &self.uid)
            .field("path", &self.path)
            .field("dev", &self.dev)
            .field("name", &self.name)
            .field("hwmon", &self.hwmon)
            .field("unit", &self.unit)
            .finish()
    }
}

impl Drive {
    /// Builds a drive from its remote endpoint.
    ///
    /// Identity properties are fetched through the cached path (they never
    /// change); the WWN is required and the `/dev/disk/by-id` symlink it
    /// names must resolve, otherwise construction fails here instead of at
    /// the first report.
    pub async fn build(endpoint: Arc<dyn DriveEndpoint>) -> Result<Self> {
        let drive_props = PropertyCache::new(endpoint.clone(), DRIVE_IFACE);
        let ata_props = PropertyCache::new(endpoint.clone(), ATA_IFACE);

        let vendor = drive_props.get_string("Vendor").await?;
        let model = drive_props.get_string("Model").await?;
        let serial = drive_props.get_string("Serial").await?;
        let wwn = drive_props
            .get_string("WWN")
            .await?
            .filter(|s| !s.is_empty())
            .ok_or(Error::Property {
                interface: DRIVE_IFACE,
                name: "WWN",
            })?;

        let uid = unique_id(vendor.as_deref(), model.as_deref(), serial.as_deref());
        let (path, dev, name) = resolve_device(Path::new(BY_ID_ROOT), &wwn)?;
        let hwmon = hwmon_sensor(Path::new(SYS_BLOCK), &name);

        let drive = Self {
            endpoint,
            ata_props,
            vendor,
            model,
            serial,
            wwn,
            uid,
            path,
            dev,
            name,
            hwmon,
            unit: TemperatureUnit::Celsius,
        };
        debug!(
            "drive {}: uid={} wwn={} vendor={:?} serial={:?} by-id={} hwmon={:?}",
            drive.name,
            drive.uid,
            drive.wwn,
            drive.vendor,
            drive.serial,
            drive.path.display(),
            drive.hwmon,
        );
        Ok(drive)
    }

    /// Resolved short device name, e.g. `sda`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved device path, e.g. `/dev/sda`.
    pub fn dev(&self) -> &Path {
        &self.dev
    }

    /// Model string as reported by the drive; empty when unavailable.
    pub fn model_label(&self) -> &str {
        self.model.as_deref().unwrap_or("")
    }

    /// Best-effort unique id (vendor/model/serial). May be empty.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    /// Current temperature in Celsius, rounded to two decimals.
    ///
    /// The kernel hwmon sensor wins when one was found at discovery and
    /// still exists; otherwise the SMART value is re-queried (never cached).
    /// A hwmon read failure after the existence check propagates rather
    /// than falling through to the SMART path.
    pub async fn temperature(&self) -> Result<f64> {
        if let Some(path) = &self.hwmon {
            if path.exists() {
                return self.hwmon_temperature(path).await;
            }
        }
        self.ata_temperature().await
    }

    /// Live spin-down query. Never fails: a query error degrades to
    /// [`PowerState::Unknown`] and is logged.
    pub async fn power_state(&self) -> PowerState {
        match self.endpoint.pm_state().await {
            Ok(raw) => PowerState::from_raw(raw),
            Err(e) => {
                debug!("power state query failed for {}: {e}", self.name);
                PowerState::Unknown
            }
        }
    }

    async fn hwmon_temperature(&self, path: &Path) -> Result<f64> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::SensorRead {
                path: path.to_path_buf(),
                source,
            })?;
        let milli: i64 = text.trim().parse().map_err(|e| Error::SensorRead {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })?;
        Ok(round2(milli as f64 / 1000.0))
    }

    async fn ata_temperature(&self) -> Result<f64> {
        let kelvin = self
            .ata_props
            .fresh_f64(SMART_TEMPERATURE)
            .await?
            .ok_or(Error::Property {
                interface: ATA_IFACE,
                name: SMART_TEMPERATURE,
            })?;
        Ok(round2(kelvin - KELVIN_OFFSET))
    }

    #[cfg(test)]
    pub(crate) fn for_tests(
        endpoint: Arc<dyn DriveEndpoint>,
        model: Option<&str>,
        dev: &str,
        name: &str,
        hwmon: Option<PathBuf>,
    ) -> Self {
        Self {
            ata_props: PropertyCache::new(endpoint.clone(), ATA_IFACE),
            endpoint,
            vendor: None,
            model: model.map(str::to_owned),
            serial: None,
            wwn: "0x0000000000000000".to_string(),
            uid: String::new(),
            path: PathBuf::from(dev),
            dev: PathBuf::from(dev),
            name: name.to_string(),
            hwmon,
            unit: TemperatureUnit::Celsius,
        }
    }
}

/// The fixed, ordered set of discovered drives for one process run.
/// Read-only after construction, safe to share across connection handlers.
pub struct Fleet {
    drives: Vec<Drive>,
}

impl Fleet {
    /// Orders drives by short device name, ascending.
    pub fn new(mut drives: Vec<Drive>) -> Self {
        drives.sort_by(|a, b| a.name.cmp(&b.name));
        Self { drives }
    }

    pub fn drives(&self) -> &[Drive] {
        &self.drives
    }

    pub fn len(&self) -> usize {
        self.drives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drives.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.drives.iter().map(|d| d.name()).collect()
    }
}

/// Vendor/model/serial joined by `_`, empty fields dropped, spaces
/// normalized. Best-effort: may be empty when all fields are.
pub(crate) fn unique_id(vendor: Option<&str>, model: Option<&str>, serial: Option<&str>) -> String {
    [vendor, model, serial]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .replace(' ', "_")
}

/// Resolves the stable WWN symlink to (by-id path, real device path, short
/// name). A missing symlink fails this drive's construction.
pub(crate) fn resolve_device(by_id: &Path, wwn: &str) -> Result<(PathBuf, PathBuf, String)> {
    let path = by_id.join(format!("wwn-{wwn}"));
    let dev = std::fs::canonicalize(&path).map_err(|source| Error::DevicePath {
        path: path.clone(),
        source,
    })?;
    let name = dev
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned)
        .ok_or_else(|| Error::DevicePath {
            path: path.clone(),
            source: io::Error::new(io::ErrorKind::InvalidData, "device path has no file name"),
        })?;
    Ok((path, dev, name))
}

/// Searches `<sys_block>/<name>/device/hwmon/hwmon*/temp1_input`.
/// Adopted only when exactly one candidate exists; zero or several mean no
/// hwmon source for this drive.
pub(crate) fn hwmon_sensor(sys_block: &Path, name: &str) -> Option<PathBuf> {
    let hwmon_dir = sys_block.join(name).join("device/hwmon");
    let entries = std::fs::read_dir(hwmon_dir).ok()?;
    let mut candidates: Vec<PathBuf> = entries
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().starts_with("hwmon"))
        .map(|e| e.path().join("temp1_input"))
        .filter(|p| p.exists())
        .collect();
    if candidates.len() == 1 {
        candidates.pop()
    } else {
        None
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
