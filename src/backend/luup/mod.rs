mod client;

pub use client::LuupClient;

use serde::{Deserialize, Serialize};

use crate::model::discovery::DiscoveredEquipment;
use crate::model::equipment::Equipment;

/// Service id of the gateway plugin device on the controller.
pub const GATEWAY_SID: &str = "urn:upnp-org:serviceId:ZiGateGateway1";
/// Service id of the child devices the gateway creates.
pub const CHILD_SID: &str = "urn:upnp-org:serviceId:ZiGateDevice1";
/// Plugin request handler name (`id=lr_<name>` on the Luup engine).
pub const PLUGIN_NAME: &str = "ZiGateGateway";

/// Full-replacement document returned by the plugin's `getDevicesInfos`
/// handler. No pagination, no deltas: each fetch is the whole world.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicesInfos {
    #[serde(default)]
    pub equipments: Vec<Equipment>,
    #[serde(default)]
    pub discovered_equipments: Vec<DiscoveredEquipment>,
}
