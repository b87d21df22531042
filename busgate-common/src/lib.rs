pub mod codec;
pub mod errors;
pub mod introspect;
pub mod signature;
pub mod value;

use std::env;

pub use errors::{Error, Result};

pub const DBUS_SERVICE: &str = "org.freedesktop.DBus";
pub const DBUS_PATH: &str = "/";
pub const DBUS_INTERFACE: &str = "org.freedesktop.DBus";

pub const INTROSPECTABLE_INTERFACE: &str = "org.freedesktop.DBus.Introspectable";
pub const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";
pub const OBJECT_MANAGER_INTERFACE: &str = "org.freedesktop.DBus.ObjectManager";

pub const MAPPER_INTERFACE: &str = "xyz.openbmc_project.ObjectMapper";

pub const MAPPER_SERVICE_ENV: &str = "BUSGATE_MAPPER_SERVICE";
pub const MAPPER_PATH_ENV: &str = "BUSGATE_MAPPER_PATH";

const DEFAULT_MAPPER_SERVICE: &str = "xyz.openbmc_project.ObjectMapper";
const DEFAULT_MAPPER_PATH: &str = "/xyz/openbmc_project/object_mapper";

/// Subtree depth for `list` requests. The mapper treats it as unlimited
/// in practice.
pub const LIST_SUBTREE_DEPTH: i32 = 99;

pub fn mapper_service() -> String {
    if let Ok(service) = env::var(MAPPER_SERVICE_ENV) {
        service
    } else {
        DEFAULT_MAPPER_SERVICE.into()
    }
}

pub fn mapper_path() -> String {
    if let Ok(path) = env::var(MAPPER_PATH_ENV) {
        path
    } else {
        DEFAULT_MAPPER_PATH.into()
    }
}
