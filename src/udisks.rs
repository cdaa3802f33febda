//! UDisks2 D-Bus plumbing.
//!
//! The daemon consumes UDisks2 on the system bus: the object manager for
//! drive enumeration, per-object `Properties.GetAll` for identity and SMART
//! attributes, and `Drive.Ata.PmGetState` for spin-down detection.

use std::collections::HashMap;

use async_trait::async_trait;
use zbus::{
    Connection,
    fdo::{ObjectManagerProxy, PropertiesProxy},
    names::{InterfaceName, OwnedInterfaceName},
    proxy,
    zvariant::OwnedObjectPath,
};

use crate::{
    error::{Error, Result},
    properties::{DriveEndpoint, PropertyBag},
};

/// Well-known UDisks2 service name.
pub const SERVICE: &str = "org.freedesktop.UDisks2";

/// Object-manager root path.
pub const MANAGER_PATH: &str = "/org/freedesktop/UDisks2";

/// Generic drive property group (vendor, model, serial, WWN).
pub const DRIVE_IFACE: &str = "org.freedesktop.UDisks2.Drive";

/// ATA-specific property group (SMART attributes, power management).
pub const ATA_IFACE: &str = "org.freedesktop.UDisks2.Drive.Ata";

/// Block-device property group, dumped in debug mode.
pub const BLOCK_IFACE: &str = "org.freedesktop.UDisks2.Block";

#[proxy(
    interface = "org.freedesktop.UDisks2.Drive.Ata",
    default_service = "org.freedesktop.UDisks2",
    gen_blocking = false
)]
pub trait DriveAta {
    /// ATA CHECK POWER MODE. Returns the raw power-state byte.
    fn pm_get_state(
        &self,
        options: HashMap<&str, zbus::zvariant::Value<'_>>,
    ) -> zbus::Result<u8>;
}

/// Builds the object-manager proxy rooted at the UDisks2 service.
pub async fn object_manager(connection: &Connection) -> Result<ObjectManagerProxy<'static>> {
    let proxy = ObjectManagerProxy::builder(connection)
        .destination(SERVICE)?
        .path(MANAGER_PATH)?
        .build()
        .await?;
    Ok(proxy)
}

/// One drive object on the bus: its property bags and ATA interface.
pub struct UdisksEndpoint {
    properties: PropertiesProxy<'static>,
    ata: DriveAtaProxy<'static>,
}

impl UdisksEndpoint {
    pub async fn connect(connection: &Connection, path: &OwnedObjectPath) -> Result<Self> {
        let properties = PropertiesProxy::builder(connection)
            .destination(SERVICE)?
            .path(path.clone())?
            .build()
            .await?;
        let ata = DriveAtaProxy::builder(connection)
            .path(path.clone())?
            .build()
            .await?;
        Ok(Self { properties, ata })
    }
}

#[async_trait]
impl DriveEndpoint for UdisksEndpoint {
    async fn get_all(&self, interface: &'static str) -> Result<PropertyBag> {
        let name = InterfaceName::try_from(interface).map_err(zbus::Error::from)?;
        let bag = self
            .properties
            .get_all(name)
            .await
            .map_err(zbus::Error::from)?;
        Ok(bag)
    }

    async fn pm_state(&self) -> Result<u8> {
        self.ata
            .pm_get_state(HashMap::new())
            .await
            .map_err(Error::from)
    }
}

/// Prints one managed object's interfaces and property bags to stdout.
/// Debug-mode inspection aid, not part of the wire protocol.
pub fn dump_object(path: &OwnedObjectPath, interfaces: &HashMap<OwnedInterfaceName, PropertyBag>) {
    println!("object: {path}");
    let names: Vec<&str> = interfaces.keys().map(|k| k.as_str()).collect();
    println!("interfaces: {names:?}");
    for iface in [BLOCK_IFACE, DRIVE_IFACE, ATA_IFACE] {
        let Some((_, bag)) = interfaces.iter().find(|(k, _)| k.as_str() == iface) else {
            continue;
        };
        println!("{iface}:");
        for (name, value) in bag {
            println!("  {name}: {value:?}");
        }
    }
    println!();
}
