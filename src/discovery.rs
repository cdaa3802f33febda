//! Fleet discovery through the UDisks2 object manager.

use std::{collections::HashMap, sync::Arc};

use log::{info, warn};
use zbus::{Connection, names::OwnedInterfaceName};

use crate::{
    drive::{Drive, Fleet},
    error::{Error, Result},
    properties::PropertyBag,
    udisks::{self, ATA_IFACE, DRIVE_IFACE, UdisksEndpoint},
};

/// Enumerates managed objects and builds the fleet.
///
/// Objects lacking either the generic drive group or the ATA group are
/// skipped: this covers partitions, loop devices and non-ATA disks. A
/// failed enumeration is fatal; zero qualifying drives after a successful
/// one is a legitimate empty fleet. A drive that fails to build (missing
/// WWN, unresolvable by-id symlink) is logged and skipped without touching
/// the rest of the fleet.
pub async fn scan(connection: &Connection, debug_dump: bool) -> Result<Fleet> {
    let manager = udisks::object_manager(connection).await?;
    let managed = manager
        .get_managed_objects()
        .await
        .map_err(|e| Error::Discovery(e.to_string()))?;

    let mut drives = Vec::new();
    for (path, interfaces) in &managed {
        if debug_dump {
            udisks::dump_object(path, interfaces);
        }
        if !is_ata_drive(interfaces) {
            continue;
        }
        let endpoint = match UdisksEndpoint::connect(connection, path).await {
            Ok(endpoint) => endpoint,
            Err(e) => {
                warn!("skipping {path}: {e}");
                continue;
            }
        };
        match Drive::build(Arc::new(endpoint)).await {
            Ok(drive) => drives.push(drive),
            Err(e) => warn!("skipping drive at {path}: {e}"),
        }
    }

    info!("discovered {} ATA drive(s)", drives.len());
    Ok(Fleet::new(drives))
}

/// True when the object carries both property groups a reportable drive
/// needs.
pub(crate) fn is_ata_drive(interfaces: &HashMap<OwnedInterfaceName, PropertyBag>) -> bool {
    has_interface(interfaces, DRIVE_IFACE) && has_interface(interfaces, ATA_IFACE)
}

fn has_interface(interfaces: &HashMap<OwnedInterfaceName, PropertyBag>, name: &str) -> bool {
    interfaces.keys().any(|k| k.as_str() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::udisks::BLOCK_IFACE;
    use pretty_assertions::assert_eq;
    use zbus::names::InterfaceName;

    fn object_with(interfaces: &[&str]) -> HashMap<OwnedInterfaceName, PropertyBag> {
        interfaces
            .iter()
            .map(|name| {
                let name: OwnedInterfaceName = InterfaceName::try_from(*name).unwrap().into();
                (name, PropertyBag::new())
            })
            .collect()
    }

    #[test]
    fn both_property_groups_are_required() {
        assert!(is_ata_drive(&object_with(&[DRIVE_IFACE, ATA_IFACE])));
        assert!(!is_ata_drive(&object_with(&[DRIVE_IFACE])));
        assert!(!is_ata_drive(&object_with(&[ATA_IFACE])));
        assert!(!is_ata_drive(&object_with(&[BLOCK_IFACE])));
        assert!(!is_ata_drive(&object_with(&[])));
    }

    #[test]
    fn only_ata_drives_survive_the_filter() {
        // Three ATA drives, a partition-like block object and a bare drive.
        let objects = vec![
            object_with(&[DRIVE_IFACE, ATA_IFACE, BLOCK_IFACE]),
            object_with(&[DRIVE_IFACE, ATA_IFACE]),
            object_with(&[BLOCK_IFACE]),
            object_with(&[DRIVE_IFACE]),
            object_with(&[DRIVE_IFACE, ATA_IFACE]),
        ];

        let keepers = objects.iter().filter(|o| is_ata_drive(o)).count();
        assert_eq!(keepers, 3);
    }
}
