use itertools::Itertools;

use vera::sdata::Sdata;
use zigate_api::requests::{AssociationTarget, TargetKind};

use crate::model::index::DeviceIndex;

const NO_ROOM: &str = "_No room";

/// Collect every controller entity the association form can link to a
/// feature: scenes, switchable/dimmable devices, and external devices of the
/// same protocol, sorted by room then name. The device being edited is
/// excluded.
#[must_use]
pub fn collect_targets(
    sdata: &Sdata,
    index: &DeviceIndex<'_>,
    protocol: &str,
    self_device_id: u32,
) -> Vec<AssociationTarget> {
    let mut targets = Vec::new();

    for device in &sdata.devices {
        if device.id == self_device_id {
            continue;
        }
        let external = index.protocol_of(device.id) == Some(protocol);
        if !external && !device.is_switchable() {
            continue;
        }
        targets.push(AssociationTarget {
            id: device.id,
            name: device.name.clone(),
            room: room_name(sdata, device.room),
            kind: if external {
                TargetKind::Equipment
            } else {
                TargetKind::Device
            },
        });
    }

    for scene in &sdata.scenes {
        targets.push(AssociationTarget {
            id: scene.id,
            name: scene.name.clone(),
            room: room_name(sdata, scene.room),
            kind: TargetKind::Scene,
        });
    }

    targets
        .into_iter()
        .sorted_by_key(|t| (t.room.to_lowercase(), t.name.to_lowercase()))
        .collect()
}

fn room_name(sdata: &Sdata, room: u32) -> String {
    sdata
        .room_name(room)
        .map_or_else(|| NO_ROOM.to_string(), ToString::to_string)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;
    use vera::Device;

    use crate::model::equipment::{Equipment, Mapping};

    use super::*;

    fn gateway_equipment(protocol: &str, device_id: u32) -> Equipment {
        Equipment {
            protocol: protocol.to_string(),
            equipment_id: device_id.to_string(),
            address: None,
            room: None,
            quality: None,
            last_update: None,
            mappings: vec![Mapping {
                device: Device {
                    id: device_id,
                    ..Device::default()
                },
                endpoint: None,
                features: BTreeMap::new(),
            }],
            is_new: false,
        }
    }

    fn controller() -> Sdata {
        serde_json::from_value(json!({
            "rooms": [{"id": 1, "name": "Kitchen"}],
            "devices": [
                {"id": 10, "name": "Edited button", "category": 0, "room": 1},
                {"id": 11, "name": "Zwave dimmer", "category": 2, "room": 1},
                {"id": 12, "name": "Thermostat", "category": 5, "room": 1},
                {"id": 13, "name": "Other zigbee remote", "category": 0},
                {"id": 14, "name": "Enocean switch", "category": 0},
            ],
            "scenes": [{"id": 3, "name": "All off", "room": 1}],
        }))
        .unwrap()
    }

    #[test]
    fn filters_by_compatibility_and_protocol() {
        let equipments = vec![
            gateway_equipment("ZIGBEE", 10),
            gateway_equipment("ZIGBEE", 13),
            gateway_equipment("ENOCEAN", 14),
        ];
        let index = DeviceIndex::build(&equipments);
        let sdata = controller();

        let targets = collect_targets(&sdata, &index, "ZIGBEE", 10);
        let summary: Vec<_> = targets.iter().map(|t| (t.id, t.kind)).collect();

        // the edited device, the thermostat and the foreign-protocol
        // equipment are out; "_No room" sorts ahead of "Kitchen"
        assert_eq!(
            summary,
            [
                (13, TargetKind::Equipment),
                (3, TargetKind::Scene),
                (11, TargetKind::Device),
            ]
        );
        assert_eq!(targets[0].room, NO_ROOM);
    }

    #[test]
    fn sorts_by_room_then_name() {
        let index = DeviceIndex::default();
        let sdata: Sdata = serde_json::from_value(json!({
            "rooms": [{"id": 1, "name": "attic"}, {"id": 2, "name": "Bedroom"}],
            "devices": [
                {"id": 20, "name": "b lamp", "category": 3, "room": 2},
                {"id": 21, "name": "A lamp", "category": 3, "room": 2},
                {"id": 22, "name": "Fan", "category": 3, "room": 1},
            ],
            "scenes": [],
        }))
        .unwrap();

        let names: Vec<_> = collect_targets(&sdata, &index, "ZIGBEE", 0)
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, ["Fan", "A lamp", "b lamp"]);
    }
}
