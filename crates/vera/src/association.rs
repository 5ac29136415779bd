use std::collections::BTreeSet;
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{VeraError, VeraResult};

/// Press duration a link reacts to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressLevel {
    Short,
    Long,
}

/// Target category of an association link.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// An ordinary controller device (e.g. a Z-Wave switch).
    Device,
    /// A controller scene.
    Scene,
    /// Another gateway-managed device of the same protocol.
    Equipment,
}

/// One association link in tagged form.
///
/// The state-string prefix grammar is confined to [`AssociationLink::parse`]
/// and the [`Display`] impl; everything else works on this struct.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AssociationLink {
    pub kind: LinkKind,
    pub level: PressLevel,
    pub target: u32,
}

impl AssociationLink {
    /// Classify one state-string token. Longest prefix wins: `+*` before `*`
    /// and `+`, so a long-press scene is never misread as a long-press device.
    pub fn parse(token: &str) -> VeraResult<Self> {
        let (kind, level, digits) = if let Some(rest) = token.strip_prefix("+*") {
            (LinkKind::Scene, PressLevel::Long, rest)
        } else if let Some(rest) = token.strip_prefix('*') {
            (LinkKind::Scene, PressLevel::Short, rest)
        } else if let Some(rest) = token.strip_prefix('%') {
            (LinkKind::Equipment, PressLevel::Short, rest)
        } else if let Some(rest) = token.strip_prefix('+') {
            (LinkKind::Device, PressLevel::Long, rest)
        } else {
            (LinkKind::Device, PressLevel::Short, token)
        };

        let target = digits
            .parse()
            .map_err(|_| VeraError::InvalidAssociationToken(token.to_string()))?;

        Ok(Self {
            kind,
            level,
            target,
        })
    }
}

impl Display for AssociationLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match (self.kind, self.level) {
            (LinkKind::Device, PressLevel::Short) => "",
            (LinkKind::Device, PressLevel::Long) => "+",
            (LinkKind::Scene, PressLevel::Short) => "*",
            (LinkKind::Scene, PressLevel::Long) => "+*",
            // equipment links only exist at short press
            (LinkKind::Equipment, _) => "%",
        };
        write!(f, "{prefix}{}", self.target)
    }
}

/// Link targets of one category, indexed by press level.
///
/// Serialized in the controller's two-array form `[short, long]`, which is
/// how the refresh document has always shipped them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AssociationSets {
    pub short_press: BTreeSet<u32>,
    pub long_press: BTreeSet<u32>,
}

impl AssociationSets {
    #[must_use]
    pub const fn level(&self, level: PressLevel) -> &BTreeSet<u32> {
        match level {
            PressLevel::Short => &self.short_press,
            PressLevel::Long => &self.long_press,
        }
    }

    pub const fn level_mut(&mut self, level: PressLevel) -> &mut BTreeSet<u32> {
        match level {
            PressLevel::Short => &mut self.short_press,
            PressLevel::Long => &mut self.long_press,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.short_press.is_empty() && self.long_press.is_empty()
    }
}

impl Serialize for AssociationSets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.short_press, &self.long_press).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AssociationSets {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (short_press, long_press) = Deserialize::deserialize(deserializer)?;
        Ok(Self {
            short_press,
            long_press,
        })
    }
}

/// Cross-entity trigger links persisted per host device.
///
/// Equipment-to-equipment links only react to a short press; the grammar has
/// no long-press equipment token and [`Association::encode`] never emits one.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Association {
    #[serde(default, skip_serializing_if = "AssociationSets::is_empty")]
    pub devices: AssociationSets,
    #[serde(default, skip_serializing_if = "AssociationSets::is_empty")]
    pub scenes: AssociationSets,
    #[serde(default, skip_serializing_if = "AssociationSets::is_empty")]
    pub equipments: AssociationSets,
}

impl Association {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty() && self.scenes.is_empty() && self.equipments.is_empty()
    }

    pub fn insert(&mut self, link: AssociationLink) {
        let sets = match link.kind {
            LinkKind::Device => &mut self.devices,
            LinkKind::Scene => &mut self.scenes,
            LinkKind::Equipment => &mut self.equipments,
        };
        sets.level_mut(link.level).insert(link.target);
    }

    /// All links in encode order: devices, scenes, equipments, short press
    /// before long press within each category.
    pub fn links(&self) -> impl Iterator<Item = AssociationLink> + '_ {
        let devices = [PressLevel::Short, PressLevel::Long]
            .into_iter()
            .flat_map(move |level| {
                self.devices.level(level).iter().map(move |&target| AssociationLink {
                    kind: LinkKind::Device,
                    level,
                    target,
                })
            });
        let scenes = [PressLevel::Short, PressLevel::Long]
            .into_iter()
            .flat_map(move |level| {
                self.scenes.level(level).iter().map(move |&target| AssociationLink {
                    kind: LinkKind::Scene,
                    level,
                    target,
                })
            });
        let equipments = self
            .equipments
            .short_press
            .iter()
            .map(|&target| AssociationLink {
                kind: LinkKind::Equipment,
                level: PressLevel::Short,
                target,
            });
        devices.chain(scenes).chain(equipments)
    }

    /// Encode to the single comma-delimited string stored on the device.
    #[must_use]
    pub fn encode(&self) -> String {
        self.links()
            .map(|link| link.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Decode a stored state string. The empty string is the empty
    /// association; any token the grammar does not cover fails the whole
    /// decode with [`VeraError::InvalidAssociationToken`].
    pub fn decode(raw: &str) -> VeraResult<Self> {
        let mut association = Self::default();
        if raw.is_empty() {
            return Ok(association);
        }
        for token in raw.split(',') {
            association.insert(AssociationLink::parse(token)?);
        }
        Ok(association)
    }
}

impl Display for Association {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Association {
    type Err = VeraError;

    fn from_str(raw: &str) -> VeraResult<Self> {
        Self::decode(raw)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ids(xs: &[u32]) -> BTreeSet<u32> {
        xs.iter().copied().collect()
    }

    #[test]
    fn decode_classifies_every_prefix() {
        let assoc = Association::decode("12,+34,*5,+*6,%78").unwrap();
        assert_eq!(assoc.devices.short_press, ids(&[12]));
        assert_eq!(assoc.devices.long_press, ids(&[34]));
        assert_eq!(assoc.scenes.short_press, ids(&[5]));
        assert_eq!(assoc.scenes.long_press, ids(&[6]));
        assert_eq!(assoc.equipments.short_press, ids(&[78]));
        assert!(assoc.equipments.long_press.is_empty());
    }

    #[test]
    fn empty_string_is_empty_association() {
        assert_eq!(Association::decode("").unwrap(), Association::default());
        assert_eq!(Association::default().encode(), "");
    }

    #[test]
    fn encode_decode_round_trip() {
        let mut assoc = Association::default();
        assoc.devices.short_press = ids(&[3, 12]);
        assoc.devices.long_press = ids(&[34]);
        assoc.scenes.short_press = ids(&[5]);
        assoc.scenes.long_press = ids(&[6, 9]);
        assoc.equipments.short_press = ids(&[78]);

        assert_eq!(Association::decode(&assoc.encode()).unwrap(), assoc);
    }

    #[test]
    fn encode_orders_devices_scenes_equipments() {
        let assoc = Association::decode("%78,+*6,12").unwrap();
        assert_eq!(assoc.encode(), "12,+*6,%78");
    }

    #[test]
    fn unparsable_token_is_rejected() {
        let err = Association::decode("abc").unwrap_err();
        assert!(matches!(err, VeraError::InvalidAssociationToken(token) if token == "abc"));
    }

    #[test]
    fn prefix_without_id_is_rejected() {
        assert!(Association::decode("12,+").is_err());
        assert!(Association::decode("*").is_err());
    }

    #[test]
    fn trailing_comma_is_rejected() {
        assert!(Association::decode("12,").is_err());
    }

    #[test]
    fn long_press_equipment_is_never_emitted() {
        let mut assoc = Association::default();
        assoc.equipments.short_press.insert(7);
        assoc.equipments.long_press.insert(9);
        assert_eq!(assoc.encode(), "%7");
    }

    #[test]
    fn serde_uses_level_indexed_arrays() {
        let assoc = Association::decode("12,+34,*5").unwrap();
        let value = serde_json::to_value(&assoc).unwrap();
        assert_eq!(
            value,
            json!({
                "devices": [[12], [34]],
                "scenes": [[5], []],
            })
        );
        assert_eq!(serde_json::from_value::<Association>(value).unwrap(), assoc);
    }
}
