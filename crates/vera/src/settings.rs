use std::fmt::{self, Display};

use indexmap::IndexMap;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Setting names the device params form treats as built in. Anything else is
/// a device-specific entry, shown read-only.
pub const BUILTIN_SETTINGS: &[&str] = &["button", "pulse", "toggle", "receiver", "qualifier", "burst"];

/// Value of one persisted setting.
///
/// Absence encodes boolean false: a flag that is off is simply not present in
/// the map, so there is no false-valued variant to mis-persist.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SettingValue {
    Enabled,
    Value(String),
}

/// Per-device settings, keyed by setting name.
///
/// Iteration follows insertion order and the codec writes entries exactly in
/// the order the map holds them; it never sorts.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Settings {
    entries: IndexMap<String, SettingValue>,
}

impl Settings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SettingValue> {
        self.entries.get(name)
    }

    /// Whether the setting is present at all, which is what the device list
    /// badges (PULSE, TOGGLE, ...) key on.
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// The string value of a `key=value` setting, if it has one.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        match self.entries.get(name) {
            Some(SettingValue::Value(value)) => Some(value),
            _ => None,
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: SettingValue) {
        self.entries.insert(name.into(), value);
    }

    /// Turn a boolean flag on or off. Off means removed: the encoded form has
    /// no way to spell a false flag.
    pub fn set_flag(&mut self, name: &str, enabled: bool) {
        if enabled {
            self.entries.insert(name.to_string(), SettingValue::Enabled);
        } else {
            self.entries.shift_remove(name);
        }
    }

    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert(name.into(), SettingValue::Value(value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Entries outside [`BUILTIN_SETTINGS`], in map order.
    pub fn specific_entries(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.iter().filter(|(name, _)| !BUILTIN_SETTINGS.contains(name))
    }

    /// Drop entries whose value is the empty string. Such values must never
    /// reach [`Settings::encode`]; stripping them is the caller's job, not a
    /// codec fallback.
    pub fn retain_persistable(&mut self) {
        self.entries
            .retain(|_, value| !matches!(value, SettingValue::Value(text) if text.is_empty()));
    }

    /// Encode to the single comma-delimited string stored on the device:
    /// bare key for an enabled flag, `key=value` otherwise, in map order.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut tokens = Vec::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            match value {
                SettingValue::Enabled => tokens.push(name.clone()),
                SettingValue::Value(text) => tokens.push(format!("{name}={text}")),
            }
        }
        tokens.join(",")
    }

    /// Decode a stored state string. A token without `=` is a flag; the empty
    /// string is the empty map.
    #[must_use]
    pub fn decode(raw: &str) -> Self {
        let mut settings = Self::default();
        for token in raw.split(',').filter(|token| !token.is_empty()) {
            match token.split_once('=') {
                Some((name, value)) => settings.set_value(name, value),
                None => settings.insert(token, SettingValue::Enabled),
            }
        }
        settings
    }
}

impl Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// On the refresh document settings travel as a JSON object: `true` for an
/// enabled flag, a string for a valued setting. `false` means absent.
impl Serialize for Settings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            match value {
                SettingValue::Enabled => map.serialize_entry(name, &true)?,
                SettingValue::Value(text) => map.serialize_entry(name, text)?,
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Settings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SettingsVisitor;

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Text(String),
        }

        impl<'de> Visitor<'de> for SettingsVisitor {
            type Value = Settings;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of setting names to booleans or strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Settings, A::Error> {
                let mut settings = Settings::default();
                while let Some((name, raw)) = access.next_entry::<String, Raw>()? {
                    match raw {
                        Raw::Flag(true) => settings.insert(name, SettingValue::Enabled),
                        Raw::Flag(false) => {}
                        Raw::Text(text) => settings.insert(name, SettingValue::Value(text)),
                    }
                }
                Ok(settings)
            }
        }

        deserializer.deserialize_map(SettingsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decode_splits_flags_and_values() {
        let settings = Settings::decode("pulse,toggle=off,burst=3");
        assert_eq!(settings.get("pulse"), Some(&SettingValue::Enabled));
        assert_eq!(settings.value("toggle"), Some("off"));
        assert_eq!(settings.value("burst"), Some("3"));
        assert_eq!(settings.len(), 3);
    }

    #[test]
    fn empty_string_is_empty_map() {
        assert!(Settings::decode("").is_empty());
        assert_eq!(Settings::default().encode(), "");
    }

    #[test]
    fn encode_decode_round_trip_keeps_order() {
        let mut settings = Settings::new();
        settings.set_flag("button", true);
        settings.set_value("qualifier", "1");
        settings.set_flag("pulse", true);

        let encoded = settings.encode();
        assert_eq!(encoded, "button,qualifier=1,pulse");
        assert_eq!(Settings::decode(&encoded), settings);
    }

    #[test]
    fn disabled_flag_is_absent() {
        let mut settings = Settings::new();
        settings.set_flag("pulse", true);
        settings.set_flag("toggle", true);
        settings.set_flag("pulse", false);

        assert!(!settings.is_set("pulse"));
        assert_eq!(settings.encode(), "toggle");
    }

    #[test]
    fn retain_persistable_drops_empty_values() {
        let mut settings = Settings::new();
        settings.set_value("qualifier", "");
        settings.set_flag("button", true);
        settings.retain_persistable();

        assert_eq!(settings.encode(), "button");
    }

    #[test]
    fn specific_entries_skip_builtins() {
        let settings = Settings::decode("button,pulse,d1=0x12,lvl=40");
        let specific: Vec<_> = settings.specific_entries().map(|(name, _)| name).collect();
        assert_eq!(specific, ["d1", "lvl"]);
    }

    #[test]
    fn serde_object_form() {
        let settings = Settings::decode("pulse,toggle=off");
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value, json!({"pulse": true, "toggle": "off"}));

        let parsed: Settings =
            serde_json::from_value(json!({"pulse": true, "toggle": "off", "receiver": false}))
                .unwrap();
        assert_eq!(parsed, settings);
    }
}
