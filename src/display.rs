// 🪐 Presentation - random pick + formatted info panel
// Every number shown here is derived from raw record values through `units`.

use crate::classifier::PlanetType;
use crate::defaults::default_planets;
use crate::enrichment::article_url;
use crate::preferences::{Preferences, TemperatureUnit};
use crate::record::PlanetRecord;
use crate::store::{DatasetStore, KeyValueStore};
use crate::units::{
    celsius_to_fahrenheit, format_decimal, format_default, kelvin_to_celsius, parsec_to_light_year,
    DISTANCE_DECIMALS, ORBITAL_PERIOD_DECIMALS, TEMPERATURE_DECIMALS,
};
use rand::seq::IndexedRandom;
use rand::Rng;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href=["']?([^"'\s>]+)"#).expect("valid href regex"));

/// Display-ready planet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanetView {
    pub name: String,
    pub planet_type: PlanetType,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    /// Earth radii, 2 dp
    pub radius: String,
    /// Earth masses, 2 dp
    pub mass: String,
    /// Days, 1 dp
    pub orbital_period: String,
    /// Light-years, 0 dp
    pub distance_ly: String,
    pub temperature_c: String,
    pub temperature_f: String,
    pub star_count: u32,
    pub discovery_year: Option<i32>,
    /// Reference text with markup removed
    pub reference: Option<String>,
    pub reference_url: Option<String>,
    /// Encyclopedia link, only for planets that were enriched
    pub article_url: Option<String>,
}

impl PlanetView {
    pub fn from_record(record: &PlanetRecord) -> Self {
        let celsius = kelvin_to_celsius(record.equilibrium_temp_kelvin);
        let name = record.name.replace('"', "");
        let reference = strip_markup(&record.reference.replace('"', ""));

        PlanetView {
            article_url: record.has_enrichment().then(|| article_url(&name)),
            name,
            planet_type: record.planet_type,
            subtitle: record.subtitle.clone(),
            description: record.description.clone(),
            radius: format_default(record.radius_earth),
            mass: format_default(record.mass_earth),
            orbital_period: format_decimal(record.orbital_period_days, ORBITAL_PERIOD_DECIMALS),
            distance_ly: format_decimal(parsec_to_light_year(record.distance_parsec), DISTANCE_DECIMALS),
            temperature_c: format_decimal(celsius, TEMPERATURE_DECIMALS),
            temperature_f: format_decimal(celsius_to_fahrenheit(celsius), TEMPERATURE_DECIMALS),
            star_count: record.star_count,
            discovery_year: record.discovery_year,
            reference: (!reference.is_empty()).then_some(reference),
            reference_url: reference_url(&record.reference),
        }
    }

    /// Temperature with unit symbol, e.g. "6 °C"
    pub fn temperature(&self, unit: TemperatureUnit) -> String {
        let value = match unit {
            TemperatureUnit::Celsius => &self.temperature_c,
            TemperatureUnit::Fahrenheit => &self.temperature_f,
        };
        format!("{} {}", value, unit.symbol())
    }

    /// Title of the collapsible description section
    pub fn heading(&self) -> &str {
        self.subtitle.as_deref().unwrap_or("Description")
    }

    /// Facts section rows, in panel order
    pub fn facts(&self, unit: TemperatureUnit) -> Vec<Fact> {
        let mut facts = vec![
            Fact::new("Radius", format!("{} Earths", self.radius), "Planet radius relative to Earth"),
            Fact::new("Mass", format!("{} Earths", self.mass), "Planet mass relative to Earth"),
            Fact::new("Temperature", self.temperature(unit), "Equilibrium temperature estimate"),
            Fact::new(
                "Orbital period",
                format!("{} Earth Days", self.orbital_period),
                "Time the planet takes to make a complete orbit around the host star or system",
            ),
            Fact::new("Stars", self.star_count.to_string(), "Number of stars in the host system"),
            Fact::new(
                "Distance",
                format!("{} Light Years", self.distance_ly),
                "Approximate distance from Earth to the planetary system",
            ),
        ];
        if let Some(year) = self.discovery_year {
            facts.push(Fact::new("Discovered", year.to_string(), "Year the discovery was announced"));
        }
        facts
    }
}

/// One row of the facts section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    pub label: &'static str,
    pub value: String,
    /// Explanation shown next to the value
    pub help: &'static str,
}

impl Fact {
    fn new(label: &'static str, value: String, help: &'static str) -> Self {
        Fact { label, value, help }
    }
}

/// Remove HTML tags and decode the few entities the archive uses
pub fn strip_markup(markup: &str) -> String {
    TAG.replace_all(markup, "")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .trim()
        .to_string()
}

/// First `href` target in a reference anchor
pub fn reference_url(markup: &str) -> Option<String> {
    HREF.captures(markup)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().replace("&amp;", "&"))
}

// ============================================================================
// SELECTION
// ============================================================================

/// Uniform random choice
pub fn pick_record<'a, R: Rng + ?Sized>(records: &'a [PlanetRecord], rng: &mut R) -> Option<&'a PlanetRecord> {
    records.choose(rng)
}

/// Pick from the stored dataset, or from the built-in planets when nothing usable is stored
pub fn pick_planet<S: KeyValueStore, R: Rng + ?Sized>(store: &DatasetStore<S>, rng: &mut R) -> PlanetView {
    let records = available_records(store);
    match pick_record(&records, &mut *rng) {
        Some(record) => PlanetView::from_record(record),
        None => PlanetView::from_record(&default_planets()[0]),
    }
}

/// Stored records, or the built-in planets
pub fn available_records<S: KeyValueStore>(store: &DatasetStore<S>) -> Vec<PlanetRecord> {
    match store.load_dataset() {
        Some(records) if !records.is_empty() => records,
        _ => default_planets(),
    }
}

/// Records per type, in `PlanetType::ALL` order
pub fn type_counts(records: &[PlanetRecord]) -> Vec<(PlanetType, usize)> {
    PlanetType::ALL
        .into_iter()
        .map(|t| (t, records.iter().filter(|r| r.planet_type == t).count()))
        .collect()
}

// ============================================================================
// TEXT RENDERING
// ============================================================================

/// Plain-text info panel
pub fn render_text(view: &PlanetView, prefs: &Preferences) -> String {
    let mut out = String::new();

    out.push_str(&format!("🪐 {}  [{}]\n", view.name, view.planet_type.label()));

    match (&view.subtitle, &view.description) {
        (Some(subtitle), None) => out.push_str(&format!("   {}\n", subtitle)),
        (_, Some(description)) => {
            out.push_str(&format!("\n▸ {}\n", view.heading()));
            if prefs.description_open {
                out.push_str(&wrap_text(description, 72, "   "));
                out.push('\n');
            }
        }
        (None, None) => {}
    }

    out.push_str("\n▸ Facts\n");
    if prefs.facts_open {
        for fact in view.facts(prefs.temperature_unit) {
            out.push_str(&format!("   {:<16}{}\n", fact.label, fact.value));
        }
    }

    if let Some(reference) = &view.reference {
        out.push_str(&format!("\n   Ref: {}\n", reference));
    }
    if let Some(url) = &view.article_url {
        out.push_str(&format!("   More: {}\n", url));
    }

    out
}

/// Greedy word wrap; every line gets `indent`
pub fn wrap_text(text: &str, width: usize, indent: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
        .iter()
        .map(|l| format!("{}{}", indent, l))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// TESTS
// ============================================================================
