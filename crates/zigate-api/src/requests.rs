use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use vera::{Association, Settings};

/// One host-device creation request produced from a discovery selection.
///
/// Field names are the gateway plugin's `CreateDevices` wire format. Requests
/// are applied in submission order and the backend may assign device ids in
/// that order, so callers must not reorder the list.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreationRequest {
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub equipment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_id: Option<String>,
    pub feature_names: Vec<String>,
    pub device_type: String,
    #[serde(default)]
    pub settings: Vec<String>,
}

/// Position of one modeling inside the discovered-equipment tree.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd)]
#[serde(rename_all = "camelCase")]
pub struct ModelingKey {
    pub equipment_id: String,
    pub capability: usize,
    pub modeling: usize,
}

impl ModelingKey {
    #[must_use]
    pub fn mapping(&self, mapping: usize) -> MappingKey {
        MappingKey {
            equipment_id: self.equipment_id.clone(),
            capability: self.capability,
            modeling: self.modeling,
            mapping,
        }
    }
}

/// Position of one candidate mapping inside a modeling.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd)]
#[serde(rename_all = "camelCase")]
pub struct MappingKey {
    pub equipment_id: String,
    pub capability: usize,
    pub modeling: usize,
    pub mapping: usize,
}

/// Device type picked in one mapping's dropdown.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTypeChoice {
    #[serde(flatten)]
    pub mapping: MappingKey,
    pub device_type: String,
}

/// The user's checkbox/dropdown state over the discovered tree, as submitted
/// by the learn action.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverySelection {
    /// Modelings whose checkbox is checked.
    #[serde(default)]
    pub modelings: BTreeSet<ModelingKey>,
    /// Dropdown choices, only meaningful for mappings offering several types.
    #[serde(default)]
    pub device_types: Vec<DeviceTypeChoice>,
}

impl DiscoverySelection {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modelings.is_empty()
    }

    #[must_use]
    pub fn is_checked(&self, key: &ModelingKey) -> bool {
        self.modelings.contains(key)
    }

    #[must_use]
    pub fn device_type(&self, key: &MappingKey) -> Option<&str> {
        self.device_types
            .iter()
            .find(|choice| choice.mapping == *key)
            .map(|choice| choice.device_type.as_str())
    }
}

/// Association edit for one equipment feature.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssociateRequest {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub feature: String,
    pub association: Association,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct SettingsUpdateRequest {
    pub settings: Settings,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct LearnResponse {
    pub requested: usize,
    pub created: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct RefreshSummary {
    pub equipments: usize,
    pub discovered: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct InclusionResponse {
    pub started: bool,
}

/// One entry of the gateway's error log, shipped by the plugin as a
/// `[timestamp, method, message]` tuple.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(from = "(u64, String, String)", into = "(u64, String, String)")]
pub struct GatewayError {
    pub timestamp: u64,
    pub method: String,
    pub message: String,
}

impl From<(u64, String, String)> for GatewayError {
    fn from((timestamp, method, message): (u64, String, String)) -> Self {
        Self {
            timestamp,
            method,
            message,
        }
    }
}

impl From<GatewayError> for (u64, String, String) {
    fn from(error: GatewayError) -> Self {
        (error.timestamp, error.method, error.message)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct ErrorsResponse {
    pub errors: Vec<GatewayError>,
}

/// Kind of target offered by the association edit form.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Scene,
    Device,
    Equipment,
}

/// One linkable target, already filtered for compatibility.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssociationTarget {
    pub id: u32,
    pub name: String,
    pub room: String,
    pub kind: TargetKind,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct TargetsResponse {
    pub targets: Vec<AssociationTarget>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn creation_request_uses_wire_field_names() {
        let request = CreationRequest {
            protocol: "ZIGBEE".to_string(),
            address: Some("0x1234".to_string()),
            equipment_id: "4660".to_string(),
            endpoint_id: Some("01".to_string()),
            feature_names: vec!["temperature".to_string()],
            device_type: "urn:schemas-micasaverde-com:device:TemperatureSensor:1".to_string(),
            settings: vec!["pulse".to_string()],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "protocol": "ZIGBEE",
                "address": "0x1234",
                "equipmentId": "4660",
                "endpointId": "01",
                "featureNames": ["temperature"],
                "deviceType": "urn:schemas-micasaverde-com:device:TemperatureSensor:1",
                "settings": ["pulse"],
            })
        );
    }

    #[test]
    fn gateway_error_round_trips_as_tuple() {
        let parsed: GatewayError =
            serde_json::from_value(json!([1700000000, "Network.send", "timeout"])).unwrap();
        assert_eq!(parsed.method, "Network.send");
        assert_eq!(
            serde_json::to_value(&parsed).unwrap(),
            json!([1700000000, "Network.send", "timeout"])
        );
    }

    #[test]
    fn selection_lookups() {
        let key = ModelingKey {
            equipment_id: "4660".to_string(),
            capability: 0,
            modeling: 1,
        };
        let selection = DiscoverySelection {
            modelings: [key.clone()].into(),
            device_types: vec![DeviceTypeChoice {
                mapping: key.mapping(0),
                device_type: "urn:schemas-upnp-org:device:BinaryLight:1".to_string(),
            }],
        };

        assert!(selection.is_checked(&key));
        assert_eq!(
            selection.device_type(&key.mapping(0)),
            Some("urn:schemas-upnp-org:device:BinaryLight:1")
        );
        assert_eq!(selection.device_type(&key.mapping(1)), None);
    }
}
