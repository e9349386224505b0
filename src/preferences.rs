// 🎛️ Persisted UI preferences
// Temperature unit and collapsible info sections, stored next to the dataset.

use crate::error::SkyResult;
use crate::store::KeyValueStore;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;

pub const TEMPERATURE_UNIT_KEY: &str = "info.tempUnit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "F")]
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }
}

/// Collapsible sections of the info panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoSection {
    Description,
    Facts,
}

impl InfoSection {
    pub fn id(&self) -> &'static str {
        match self {
            InfoSection::Description => "description",
            InfoSection::Facts => "facts",
        }
    }

    pub fn key(&self) -> String {
        format!("info.section.{}", self.id())
    }

    pub fn default_open(&self) -> bool {
        true
    }
}

/// Snapshot of all preferences, read once per activation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    pub temperature_unit: TemperatureUnit,
    pub description_open: bool,
    pub facts_open: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            temperature_unit: TemperatureUnit::default(),
            description_open: InfoSection::Description.default_open(),
            facts_open: InfoSection::Facts.default_open(),
        }
    }
}

impl Preferences {
    pub fn load(store: &impl KeyValueStore) -> Self {
        Self {
            temperature_unit: temperature_unit(store),
            description_open: section_open(store, InfoSection::Description),
            facts_open: section_open(store, InfoSection::Facts),
        }
    }

    pub fn is_open(&self, section: InfoSection) -> bool {
        match section {
            InfoSection::Description => self.description_open,
            InfoSection::Facts => self.facts_open,
        }
    }
}

/// Read a JSON value, falling back to `default` when missing or unreadable
fn read_or<T: DeserializeOwned>(store: &impl KeyValueStore, key: &str, default: T) -> T {
    match store.get(key) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(key, error = %e, "stored preference unreadable, using default");
            default
        }),
        Ok(None) => default,
        Err(e) => {
            warn!(key, error = %e, "failed to load preference");
            default
        }
    }
}

fn write<T: Serialize>(store: &mut impl KeyValueStore, key: &str, value: &T) -> SkyResult<()> {
    let json = serde_json::to_string(value)?;
    store.set(key, &json)
}

pub fn temperature_unit(store: &impl KeyValueStore) -> TemperatureUnit {
    read_or(store, TEMPERATURE_UNIT_KEY, TemperatureUnit::default())
}

pub fn set_temperature_unit(store: &mut impl KeyValueStore, unit: TemperatureUnit) -> SkyResult<()> {
    write(store, TEMPERATURE_UNIT_KEY, &unit)
}

pub fn section_open(store: &impl KeyValueStore, section: InfoSection) -> bool {
    read_or(store, &section.key(), section.default_open())
}

/// Flip a section and return its new state
pub fn toggle_section(store: &mut impl KeyValueStore, section: InfoSection) -> SkyResult<bool> {
    let open = !section_open(store, section);
    write(store, &section.key(), &open)?;
    Ok(open)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_defaults_without_stored_values() {
        let store = MemoryStore::new();
        let prefs = Preferences::load(&store);
        assert_eq!(prefs, Preferences::default());
        assert_eq!(prefs.temperature_unit, TemperatureUnit::Celsius);
        assert!(prefs.is_open(InfoSection::Facts));
    }

    #[test]
    fn test_unit_persists_as_letter() {
        let mut store = MemoryStore::new();
        set_temperature_unit(&mut store, TemperatureUnit::Fahrenheit).unwrap();

        assert_eq!(store.get(TEMPERATURE_UNIT_KEY).unwrap().as_deref(), Some("\"F\""));
        assert_eq!(temperature_unit(&store), TemperatureUnit::Fahrenheit);
    }

    #[test]
    fn test_toggle_section() {
        let mut store = MemoryStore::new();
        assert!(!toggle_section(&mut store, InfoSection::Description).unwrap());
        assert!(!section_open(&store, InfoSection::Description));
        assert!(toggle_section(&mut store, InfoSection::Description).unwrap());

        // Other sections untouched
        assert!(section_open(&store, InfoSection::Facts));
        assert_eq!(store.get("info.section.description").unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn test_garbage_falls_back_to_default() {
        let mut store = MemoryStore::new();
        store.set(TEMPERATURE_UNIT_KEY, "\"Kelvin\"").unwrap();
        assert_eq!(temperature_unit(&store), TemperatureUnit::Celsius);
    }
}
