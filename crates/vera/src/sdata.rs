use serde::Deserialize;

/// Vera device category for dimmable lights.
pub const CATEGORY_DIMMER: u32 = 2;
/// Vera device category for on/off switches.
pub const CATEGORY_SWITCH: u32 = 3;

/// Subset of the controller's `sdata` summary the admin service consumes.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Sdata {
    #[serde(default)]
    pub rooms: Vec<SdataRoom>,
    #[serde(default)]
    pub devices: Vec<SdataDevice>,
    #[serde(default)]
    pub scenes: Vec<SdataScene>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SdataRoom {
    pub id: u32,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SdataDevice {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: u32,
    #[serde(default)]
    pub room: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SdataScene {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub room: u32,
}

impl SdataDevice {
    /// Whether the device can be switched or dimmed, which is what makes it a
    /// valid association target.
    #[must_use]
    pub const fn is_switchable(&self) -> bool {
        matches!(self.category, CATEGORY_DIMMER | CATEGORY_SWITCH)
    }
}

impl Sdata {
    #[must_use]
    pub fn room_name(&self, room: u32) -> Option<&str> {
        self.rooms
            .iter()
            .find(|r| r.id == room)
            .map(|r| r.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_controller_summary() {
        let sdata: Sdata = serde_json::from_value(json!({
            "rooms": [{"id": 1, "name": "Kitchen"}],
            "devices": [
                {"id": 4, "name": "Spot", "category": 2, "room": 1},
                {"id": 5, "name": "Gateway", "category": 19},
            ],
            "scenes": [{"id": 2, "name": "Evening", "room": 1}],
        }))
        .unwrap();

        assert_eq!(sdata.room_name(1), Some("Kitchen"));
        assert_eq!(sdata.room_name(9), None);
        assert!(sdata.devices[0].is_switchable());
        assert!(!sdata.devices[1].is_switchable());
    }
}
