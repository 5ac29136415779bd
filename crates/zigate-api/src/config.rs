use std::net::Ipv4Addr;
use std::num::NonZeroU64;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use url::Url;

/// Admin HTTP surface.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct ServerConfig {
    pub listen: Ipv4Addr,
    pub port: u16,
}

/// Connection to the Luup engine hosting the gateway plugin.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct LuupConfig {
    /// Base URL of the Luup HTTP interface, e.g. `http://vera.local:3480/`.
    pub url: Url,
    /// Device number of the gateway plugin instance on the controller.
    pub gateway_device: u32,
    pub request_timeout_secs: Option<NonZeroU64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct AdminConfig {
    /// Where the last refresh snapshot is persisted for warm starts.
    pub state_file: Utf8PathBuf,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub luup: LuupConfig,
    pub admin: AdminConfig,
}
