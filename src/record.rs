use crate::classifier::{classify, PlanetType};
use crate::enrichment::Enrichment;
use crate::error::{SkyError, SkyResult};
use crate::parser::RawRow;
use serde::{Deserialize, Serialize};

/// Archive column names
pub mod columns {
    pub const NAME: &str = "pl_name";
    pub const RADIUS: &str = "pl_rade";
    pub const ORBITAL_PERIOD: &str = "pl_orbper";
    pub const MASS: &str = "pl_masse";
    pub const STAR_COUNT: &str = "sy_snum";
    pub const DISTANCE: &str = "sy_dist";
    pub const EQUILIBRIUM_TEMP: &str = "pl_eqt";
    pub const REFERENCE: &str = "pl_refname";
    pub const DISCOVERY_YEAR: &str = "disc_year";
}

/// One exoplanet as ingested from the archive.
///
/// Numeric fields hold raw archive values; display values are derived in
/// [`crate::display::PlanetView`]. The blob keeps the archive's column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetRecord {
    // ========================================================================
    // ARCHIVE FIELDS (raw values, never converted in place)
    // ========================================================================
    #[serde(rename = "pl_name")]
    pub name: String,

    /// Earth radii
    #[serde(rename = "pl_rade")]
    pub radius_earth: f64,

    /// Days
    #[serde(rename = "pl_orbper")]
    pub orbital_period_days: f64,

    /// Earth masses
    #[serde(rename = "pl_masse")]
    pub mass_earth: f64,

    #[serde(rename = "sy_snum")]
    pub star_count: u32,

    /// Parsecs
    #[serde(rename = "sy_dist")]
    pub distance_parsec: f64,

    /// Kelvin
    #[serde(rename = "pl_eqt")]
    pub equilibrium_temp_kelvin: f64,

    /// Bibliographic reference, HTML anchor markup as served by the archive
    #[serde(rename = "pl_refname", default)]
    pub reference: String,

    #[serde(rename = "disc_year", default, skip_serializing_if = "Option::is_none")]
    pub discovery_year: Option<i32>,

    // ========================================================================
    // DERIVED AT INGESTION
    // ========================================================================
    #[serde(rename = "pl_type", default)]
    pub planet_type: PlanetType,

    // ========================================================================
    // ENRICHMENT (absent until a lookup succeeds)
    // ========================================================================
    #[serde(rename = "pl_subtitle", default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(rename = "pl_desc", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PlanetRecord {
    /// Build a record from raw values and classify it
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        radius_earth: f64,
        orbital_period_days: f64,
        mass_earth: f64,
        star_count: u32,
        distance_parsec: f64,
        equilibrium_temp_kelvin: f64,
        reference: &str,
    ) -> Self {
        PlanetRecord {
            name: name.to_string(),
            radius_earth,
            orbital_period_days,
            mass_earth,
            star_count,
            distance_parsec,
            equilibrium_temp_kelvin,
            reference: reference.to_string(),
            discovery_year: None,
            planet_type: classify(mass_earth, radius_earth),
            subtitle: None,
            description: None,
        }
    }

    /// Builder pattern: add discovery year
    pub fn with_discovery_year(mut self, year: i32) -> Self {
        self.discovery_year = Some(year);
        self
    }

    /// Builder pattern: add enrichment text
    pub fn with_enrichment(mut self, subtitle: Option<&str>, description: Option<&str>) -> Self {
        self.subtitle = subtitle.map(str::to_string);
        self.description = description.map(str::to_string);
        self
    }

    /// Map a parsed CSV row onto a record and classify it.
    ///
    /// Missing required columns and unparsable numbers are `ParseMismatch`.
    pub fn from_row(row: &RawRow) -> SkyResult<Self> {
        let name = required(row, columns::NAME)?.replace('"', "");
        if name.trim().is_empty() {
            return Err(SkyError::ParseMismatch("empty planet name".to_string()));
        }

        let mut record = PlanetRecord::new(
            name.trim(),
            number(row, columns::RADIUS)?,
            number(row, columns::ORBITAL_PERIOD)?,
            number(row, columns::MASS)?,
            star_count(row)?,
            number(row, columns::DISTANCE)?,
            number(row, columns::EQUILIBRIUM_TEMP)?,
            row.get(columns::REFERENCE).map(String::as_str).unwrap_or(""),
        );

        record.discovery_year = row
            .get(columns::DISCOVERY_YEAR)
            .and_then(|v| v.trim().parse::<i32>().ok());

        Ok(record)
    }

    pub fn has_enrichment(&self) -> bool {
        self.subtitle.is_some() || self.description.is_some()
    }

    /// Merge a successful lookup; fields the lookup did not produce are left alone
    pub fn apply_enrichment(&mut self, enrichment: &Enrichment) {
        if let Some(subtitle) = &enrichment.subtitle {
            self.subtitle = Some(subtitle.clone());
        }
        if let Some(description) = &enrichment.description {
            self.description = Some(description.clone());
        }
    }
}

fn required<'a>(row: &'a RawRow, column: &str) -> SkyResult<&'a str> {
    row.get(column)
        .map(String::as_str)
        .ok_or_else(|| SkyError::ParseMismatch(format!("missing column '{}'", column)))
}

fn number(row: &RawRow, column: &str) -> SkyResult<f64> {
    let raw = required(row, column)?.trim();
    let value: f64 = raw
        .parse()
        .map_err(|_| SkyError::ParseMismatch(format!("column '{}' is not a number: {:?}", column, raw)))?;

    if !value.is_finite() {
        return Err(SkyError::ParseMismatch(format!("column '{}' is not finite", column)));
    }
    Ok(value)
}

fn star_count(row: &RawRow) -> SkyResult<u32> {
    let value = number(row, columns::STAR_COUNT)?;
    if value < 0.0 {
        return Err(SkyError::ParseMismatch("negative star count".to_string()));
    }
    Ok(value.round() as u32)
}

// ============================================================================
// TESTS
// ============================================================================
