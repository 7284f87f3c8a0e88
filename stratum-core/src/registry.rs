//! Process-wide driver registry.
//!
//! Drivers register a factory per URL scheme at program initialization;
//! lookups afterwards treat the registry as frozen. Registering the same
//! scheme twice is an error rather than a silent replacement.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use url::Url;

use crate::driver::{Driver, DriverConfig};
use crate::error::{Error, Result};

/// A factory producing a driver from its configuration snapshot.
pub type DriverFactory = fn(DriverConfig) -> Result<Box<dyn Driver>>;

static REGISTRY: OnceLock<Mutex<HashMap<String, DriverFactory>>> = OnceLock::new();

fn registry() -> &'static Mutex<HashMap<String, DriverFactory>> {
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Register a driver factory under a URL scheme.
///
/// Returns [`Error::DriverAlreadyRegistered`] if the scheme is taken.
pub fn register_driver(scheme: &str, factory: DriverFactory) -> Result<()> {
    let mut map = registry().lock().unwrap_or_else(|e| e.into_inner());
    if map.contains_key(scheme) {
        return Err(Error::DriverAlreadyRegistered(scheme.to_string()));
    }
    map.insert(scheme.to_string(), factory);
    Ok(())
}

/// Resolve a driver for a database URL.
///
/// Hierarchical schemes (`scheme+transport`) are looked up by their primary
/// segment. An unknown scheme yields [`Error::UnsupportedDriver`].
pub fn resolve_driver(url: &Url, migrations_table: &str) -> Result<Box<dyn Driver>> {
    let scheme = url.scheme();
    if scheme.is_empty() {
        return Err(Error::InvalidUrl);
    }
    let primary = scheme.split('+').next().unwrap_or(scheme);

    let factory = {
        let map = registry().lock().unwrap_or_else(|e| e.into_inner());
        map.get(primary).copied()
    };
    let factory = factory.ok_or_else(|| Error::UnsupportedDriver(primary.to_string()))?;

    factory(DriverConfig {
        url: url.clone(),
        migrations_table: migrations_table.to_string(),
    })
}

/// The schemes currently registered, in no particular order.
pub fn registered_schemes() -> Vec<String> {
    registry()
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .keys()
        .cloned()
        .collect()
}
