use serde::{Deserialize, Serialize};

use crate::association::Association;
use crate::settings::Settings;

/// Host-controller device backing one equipment mapping.
///
/// The controller owns these; the gateway only reads them from the refresh
/// document and writes back encoded settings/association state variables.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(default, skip_serializing_if = "Settings::is_empty")]
    pub settings: Settings,
    #[serde(default, skip_serializing_if = "Association::is_empty")]
    pub association: Association,
}
