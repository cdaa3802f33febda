//! Cached access to remote property bags.
//!
//! UDisks2 exposes per-object property bags scoped to an interface name.
//! Identity fields never change for the lifetime of a drive, so they may be
//! served from a cache; temperature-affecting properties must always be
//! re-queried. [`PropertyCache`] makes that split explicit: [`PropertyCache::get`]
//! populates the cache on first use, [`PropertyCache::get_fresh`] bypasses and
//! refreshes it.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;
use zvariant::OwnedValue;

use crate::error::{Error, Result};

/// A full property set for one interface, as returned by `GetAll`.
pub type PropertyBag = HashMap<String, OwnedValue>;

/// Remote access to one drive object: its property bags and its
/// power-management state query.
///
/// The production implementation talks to UDisks2 over D-Bus
/// ([`crate::udisks::UdisksEndpoint`]); tests substitute a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DriveEndpoint: Send + Sync {
    /// Fetches the complete property bag for the given interface.
    async fn get_all(&self, interface: &'static str) -> Result<PropertyBag>;

    /// Issues a live power-management state query against the drive.
    async fn pm_state(&self) -> Result<u8>;
}

/// Cached accessor over one interface's property bag.
pub struct PropertyCache {
    endpoint: Arc<dyn DriveEndpoint>,
    interface: &'static str,
    cache: Mutex<Option<PropertyBag>>,
}

impl PropertyCache {
    pub fn new(endpoint: Arc<dyn DriveEndpoint>, interface: &'static str) -> Self {
        Self {
            endpoint,
            interface,
            cache: Mutex::new(None),
        }
    }

    /// Cached lookup. The full bag is fetched once, on first access, and
    /// reused afterwards. Suitable only for properties that cannot change.
    /// A failed fetch leaves the cache empty so the next call retries.
    pub async fn get(&self, name: &'static str) -> Result<Option<OwnedValue>> {
        let mut cache = self.cache.lock().await;
        let bag = match cache.take() {
            Some(bag) => bag,
            None => self.endpoint.get_all(self.interface).await?,
        };
        let value = clone_value(&bag, name);
        *cache = Some(bag);
        value
    }

    /// Forced-fresh lookup. Always re-fetches the bag and replaces the
    /// cached copy with it.
    pub async fn get_fresh(&self, name: &'static str) -> Result<Option<OwnedValue>> {
        let bag = self.endpoint.get_all(self.interface).await?;
        let value = clone_value(&bag, name)?;
        *self.cache.lock().await = Some(bag);
        Ok(value)
    }

    /// Cached string property. `Ok(None)` when absent, `Error::Property`
    /// when present with a non-string type.
    pub async fn get_string(&self, name: &'static str) -> Result<Option<String>> {
        match self.get(name).await? {
            Some(value) => String::try_from(value)
                .map(Some)
                .map_err(|_| self.type_error(name)),
            None => Ok(None),
        }
    }

    /// Forced-fresh floating-point property.
    pub async fn fresh_f64(&self, name: &'static str) -> Result<Option<f64>> {
        match self.get_fresh(name).await? {
            Some(value) => f64::try_from(value)
                .map(Some)
                .map_err(|_| self.type_error(name)),
            None => Ok(None),
        }
    }

    fn type_error(&self, name: &'static str) -> Error {
        Error::Property {
            interface: self.interface,
            name,
        }
    }
}

fn clone_value(bag: &PropertyBag, name: &str) -> Result<Option<OwnedValue>> {
    bag.get(name)
        .map(|v| v.try_clone().map_err(zbus::Error::from))
        .transpose()
        .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;
    use zvariant::Value;

    const IFACE: &str = "org.freedesktop.UDisks2.Drive";

    fn val<'a, T>(v: T) -> OwnedValue
    where
        Value<'a>: From<T>,
    {
        Value::from(v).try_to_owned().unwrap()
    }

    fn identity_bag(serial: &'static str) -> PropertyBag {
        let mut bag = PropertyBag::new();
        bag.insert("Vendor".to_string(), val("WDC"));
        bag.insert("Serial".to_string(), val(serial));
        bag
    }

    #[tokio::test]
    async fn cached_get_fetches_the_bag_exactly_once() {
        let mut endpoint = MockDriveEndpoint::new();
        endpoint
            .expect_get_all()
            .with(eq(IFACE))
            .times(1)
            .returning(|_| Ok(identity_bag("S1")));

        let cache = PropertyCache::new(Arc::new(endpoint), IFACE);
        assert_eq!(cache.get_string("Vendor").await.unwrap().as_deref(), Some("WDC"));
        assert_eq!(cache.get_string("Serial").await.unwrap().as_deref(), Some("S1"));
        assert_eq!(cache.get_string("Vendor").await.unwrap().as_deref(), Some("WDC"));
    }

    #[tokio::test]
    async fn forced_fresh_refetches_every_time() {
        let mut endpoint = MockDriveEndpoint::new();
        endpoint
            .expect_get_all()
            .times(3)
            .returning(|_| {
                let mut bag = PropertyBag::new();
                bag.insert("SmartTemperature".to_string(), val(307.35f64));
                Ok(bag)
            });

        let cache = PropertyCache::new(Arc::new(endpoint), IFACE);
        for _ in 0..3 {
            let kelvin = cache.fresh_f64("SmartTemperature").await.unwrap();
            assert_eq!(kelvin, Some(307.35));
        }
    }

    #[tokio::test]
    async fn forced_fresh_refreshes_the_stored_bag() {
        let mut endpoint = MockDriveEndpoint::new();
        // One forced fetch; the cached read afterwards must reuse its bag.
        endpoint
            .expect_get_all()
            .times(1)
            .returning(|_| Ok(identity_bag("S2")));

        let cache = PropertyCache::new(Arc::new(endpoint), IFACE);
        assert!(cache.get_fresh("Serial").await.unwrap().is_some());
        assert_eq!(cache.get_string("Serial").await.unwrap().as_deref(), Some("S2"));
    }

    #[tokio::test]
    async fn absent_property_is_none_not_an_error() {
        let mut endpoint = MockDriveEndpoint::new();
        endpoint
            .expect_get_all()
            .times(1)
            .returning(|_| Ok(identity_bag("S1")));

        let cache = PropertyCache::new(Arc::new(endpoint), IFACE);
        assert_eq!(cache.get_string("Model").await.unwrap(), None);
    }

    #[tokio::test]
    async fn mistyped_property_is_a_property_error() {
        let mut endpoint = MockDriveEndpoint::new();
        endpoint.expect_get_all().returning(|_| {
            let mut bag = PropertyBag::new();
            bag.insert("Vendor".to_string(), val(42u32));
            Ok(bag)
        });

        let cache = PropertyCache::new(Arc::new(endpoint), IFACE);
        let err = cache.get_string("Vendor").await.unwrap_err();
        assert!(matches!(err, Error::Property { name: "Vendor", .. }));
    }

    #[tokio::test]
    async fn remote_failure_propagates() {
        let mut endpoint = MockDriveEndpoint::new();
        endpoint
            .expect_get_all()
            .returning(|_| Err(Error::RemoteQuery(zbus::Error::InvalidReply)));

        let cache = PropertyCache::new(Arc::new(endpoint), IFACE);
        assert!(matches!(
            cache.get("Vendor").await,
            Err(Error::RemoteQuery(_))
        ));
    }
}
