use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use zigate_api::requests::{CreationRequest, DiscoverySelection, ModelingKey};

use crate::error::{ApiError, ApiResult};
use crate::model::equipment::{Feature, signal_quality};

/// A not-yet-provisioned equipment. Transient: re-fetched wholesale on every
/// poll, read to build the selection form, discarded once devices exist.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredEquipment {
    pub protocol: String,
    #[serde(rename = "id")]
    pub equipment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, with = "signal_quality")]
    pub quality: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<u64>,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

/// One raw capability of a discovered equipment, with the candidate ways to
/// model it as host devices.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    pub name: String,
    #[serde(default)]
    pub features: BTreeMap<String, Feature>,
    #[serde(default)]
    pub modelings: Vec<Modeling>,
}

/// One candidate way to carve a capability into device mappings.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Modeling {
    /// Cleared by the gateway once the modeling is no longer proposable.
    #[serde(default = "default_true")]
    pub is_used: bool,
    #[serde(default)]
    pub mappings: Vec<CandidateMapping>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateMapping {
    #[serde(default = "default_true")]
    pub is_used: bool,
    /// Host device types this mapping can be created as. Empty means the
    /// mapping is not yet provisionable and is skipped, not an error.
    #[serde(default)]
    pub device_types: Vec<String>,
    /// Keys into the capability's feature set.
    #[serde(default)]
    pub feature_names: Vec<String>,
    /// Default settings proposed for the created device, in token form.
    #[serde(default)]
    pub settings: Vec<String>,
}

const fn default_true() -> bool {
    true
}

impl DiscoveredEquipment {
    /// Check that every candidate mapping only names features its capability
    /// declares. A record failing this is rejected at ingest rather than
    /// guessed at.
    pub fn validate(&self) -> ApiResult<()> {
        for capability in &self.capabilities {
            for modeling in &capability.modelings {
                for mapping in &modeling.mappings {
                    for name in &mapping.feature_names {
                        if !capability.features.contains_key(name) {
                            return Err(ApiError::StructuralMismatch {
                                equipment: self.equipment_id.clone(),
                                feature: name.clone(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Sort for the discovery list: most recently heard first.
pub fn sort_discovered(discovered: &mut [DiscoveredEquipment]) {
    discovered.sort_by(|a, b| b.last_update.cmp(&a.last_update));
}

/// Flatten the user's selection over a discovered tree into creation
/// requests, in traversal order: equipment, capability, modeling, mapping.
/// That order is what the backend sees, and it may assign device ids by it.
///
/// Pruned modelings, unchecked modelings, pruned mappings and mappings
/// offering no device type are skipped. A selection matching nothing yields
/// the empty list; this transform has no failure mode.
#[must_use]
pub fn aggregate_selection(
    discovered: &[DiscoveredEquipment],
    selection: &DiscoverySelection,
) -> Vec<CreationRequest> {
    let mut requests = Vec::new();

    for equipment in discovered {
        for (capability_pos, capability) in equipment.capabilities.iter().enumerate() {
            for (modeling_pos, modeling) in capability.modelings.iter().enumerate() {
                if !modeling.is_used {
                    continue;
                }
                let key = ModelingKey {
                    equipment_id: equipment.equipment_id.clone(),
                    capability: capability_pos,
                    modeling: modeling_pos,
                };
                if !selection.is_checked(&key) {
                    continue;
                }
                for (mapping_pos, mapping) in modeling.mappings.iter().enumerate() {
                    if !mapping.is_used || mapping.device_types.is_empty() {
                        continue;
                    }
                    let device_type = match mapping.device_types.as_slice() {
                        [single] => single.clone(),
                        // an untouched dropdown submits its first option
                        types => selection
                            .device_type(&key.mapping(mapping_pos))
                            .unwrap_or(types[0].as_str())
                            .to_string(),
                    };
                    requests.push(CreationRequest {
                        protocol: equipment.protocol.clone(),
                        address: equipment.address.clone(),
                        equipment_id: equipment.equipment_id.clone(),
                        endpoint_id: equipment.endpoint.clone(),
                        feature_names: mapping.feature_names.clone(),
                        device_type,
                        settings: mapping.settings.clone(),
                    });
                }
            }
        }
    }

    requests
}
