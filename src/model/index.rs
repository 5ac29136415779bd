use std::collections::HashMap;

use crate::model::equipment::{Equipment, Mapping};

/// Reverse lookup from host device id to the owning equipment/mapping pair.
///
/// The index borrows the snapshot it was built from, so it can never outlive
/// it: replacing the equipment list forces a rebuild instead of permitting a
/// stale read.
#[derive(Debug, Default)]
pub struct DeviceIndex<'a> {
    entries: HashMap<u32, (&'a Equipment, &'a Mapping)>,
}

impl<'a> DeviceIndex<'a> {
    /// Build a fresh index over one refresh snapshot. Host ids are unique
    /// upstream; should two mappings still claim the same id, the later one
    /// in iteration order wins.
    #[must_use]
    pub fn build(equipments: &'a [Equipment]) -> Self {
        let mut entries = HashMap::new();
        for equipment in equipments {
            for mapping in &equipment.mappings {
                entries.insert(mapping.device.id, (equipment, mapping));
            }
        }
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn resolve(&self, device_id: u32) -> Option<(&'a Equipment, &'a Mapping)> {
        self.entries.get(&device_id).copied()
    }

    /// Protocol of the equipment owning a device id. Used to filter
    /// equipment-to-equipment association targets.
    #[must_use]
    pub fn protocol_of(&self, device_id: u32) -> Option<&'a str> {
        self.resolve(device_id)
            .map(|(equipment, _)| equipment.protocol.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use vera::Device;

    use super::*;

    fn mapping(device_id: u32) -> Mapping {
        Mapping {
            device: Device {
                id: device_id,
                ..Device::default()
            },
            endpoint: None,
            features: BTreeMap::new(),
        }
    }

    fn equipment(id: &str, device_ids: &[u32]) -> Equipment {
        Equipment {
            protocol: "ZIGBEE".to_string(),
            equipment_id: id.to_string(),
            address: None,
            room: None,
            quality: None,
            last_update: None,
            mappings: device_ids.iter().map(|&id| mapping(id)).collect(),
            is_new: false,
        }
    }

    #[test]
    fn one_entry_per_mapping() {
        let equipments = vec![equipment("a", &[1, 2]), equipment("b", &[3])];
        let index = DeviceIndex::build(&equipments);

        assert_eq!(index.len(), 3);
        for device_id in [1, 2, 3] {
            let (owner, mapping) = index.resolve(device_id).unwrap();
            assert_eq!(mapping.device.id, device_id);
            assert!(owner.mappings.iter().any(|m| m.device.id == device_id));
        }
        assert!(index.resolve(9).is_none());
    }

    #[test]
    fn duplicate_device_id_resolves_to_the_later_mapping() {
        let equipments = vec![equipment("a", &[7]), equipment("b", &[7])];
        let index = DeviceIndex::build(&equipments);

        assert_eq!(index.len(), 1);
        let (owner, _) = index.resolve(7).unwrap();
        assert_eq!(owner.equipment_id, "b");
    }

    #[test]
    fn rebuild_replaces_rather_than_patches() {
        let first = vec![equipment("a", &[1])];
        let index = DeviceIndex::build(&first);
        assert!(index.resolve(1).is_some());

        let second = vec![equipment("b", &[2])];
        let index = DeviceIndex::build(&second);
        assert!(index.resolve(1).is_none());
        assert!(index.resolve(2).is_some());
    }
}
