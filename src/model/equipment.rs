use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vera::Device;

/// A named measurement or capability exposed by an equipment.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Features realized as one host-controller device.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    pub device: Device,
    /// Endpoint of a multi-endpoint node; absent for single-endpoint nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub features: BTreeMap<String, Feature>,
}

/// One physical mesh node managed by the gateway.
///
/// Read-only here: the refresh document replaces the whole list every time,
/// and (protocol, id) is the only identity an equipment has.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub protocol: String,
    #[serde(rename = "id")]
    pub equipment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default, with = "signal_quality")]
    pub quality: Option<u8>,
    /// Seconds since epoch of the last radio frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<u64>,
    #[serde(default)]
    pub mappings: Vec<Mapping>,
    #[serde(default)]
    pub is_new: bool,
}

impl Equipment {
    #[must_use]
    pub fn last_update_utc(&self) -> Option<DateTime<Utc>> {
        self.last_update
            .and_then(|ts| DateTime::from_timestamp(i64::try_from(ts).ok()?, 0))
    }

    /// Order mappings the way the device column renders them.
    pub fn sort_mappings(&mut self) {
        self.mappings
            .sort_by(|a, b| a.device.name.cmp(&b.device.name));
    }
}

/// Sort for the device list: by protocol, then assigned room.
pub fn sort_equipments(equipments: &mut [Equipment]) {
    equipments.sort_by(|a, b| {
        a.protocol
            .cmp(&b.protocol)
            .then_with(|| room_key(a).cmp(&room_key(b)))
    });
}

fn room_key(equipment: &Equipment) -> String {
    equipment.room.as_deref().unwrap_or("").to_lowercase()
}

/// The backend reports link quality as -1 when unknown; map that sentinel to
/// absence instead of surfacing a negative quality.
pub(crate) mod signal_quality {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        quality: &Option<u8>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match quality {
            Some(q) => serializer.serialize_i16(i16::from(*q)),
            None => serializer.serialize_i16(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u8>, D::Error> {
        let raw = Option::<i64>::deserialize(deserializer)?;
        Ok(raw.and_then(|q| u8::try_from(q).ok()))
    }
}
