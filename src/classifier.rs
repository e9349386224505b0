// 🏷️ Classification Rules - Rules as Data
// Buckets a planet into a coarse type from its Jupiter-relative mass and radius

use serde::{Deserialize, Deserializer, Serialize};

/// Jupiter's mass in Earth masses
pub const JUPITER_MASS_EARTHS: f64 = 317.8;

/// Jupiter's radius in Earth radii
pub const JUPITER_RADIUS_EARTHS: f64 = 11.2;

// ============================================================================
// PLANET TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanetType {
    GasGiant,
    NeptuneLike,
    SuperEarth,
    Terrestrial,
    #[default]
    Unknown,
}

impl PlanetType {
    pub const ALL: [PlanetType; 5] = [
        PlanetType::GasGiant,
        PlanetType::NeptuneLike,
        PlanetType::SuperEarth,
        PlanetType::Terrestrial,
        PlanetType::Unknown,
    ];

    /// Stable tag used in the persisted blob
    pub fn tag(&self) -> &'static str {
        match self {
            PlanetType::GasGiant => "gas-giant",
            PlanetType::NeptuneLike => "neptune-like",
            PlanetType::SuperEarth => "super-earth",
            PlanetType::Terrestrial => "terrestrial",
            PlanetType::Unknown => "unknown",
        }
    }

    /// Human-readable name for display
    pub fn label(&self) -> &'static str {
        match self {
            PlanetType::GasGiant => "Gas Giant",
            PlanetType::NeptuneLike => "Neptune-like",
            PlanetType::SuperEarth => "Super Earth",
            PlanetType::Terrestrial => "Terrestrial",
            PlanetType::Unknown => "Unknown",
        }
    }

    /// Parse a stored tag; anything unrecognised is `Unknown`
    pub fn from_tag(tag: &str) -> Self {
        PlanetType::ALL
            .into_iter()
            .find(|t| t.tag().eq_ignore_ascii_case(tag.trim()))
            .unwrap_or(PlanetType::Unknown)
    }
}

impl<'de> Deserialize<'de> for PlanetType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = Option::<String>::deserialize(deserializer)?;
        Ok(tag.map(|t| PlanetType::from_tag(&t)).unwrap_or_default())
    }
}

impl std::fmt::Display for PlanetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// RATIOS
// ============================================================================

/// Mass and radius expressed as fractions of Jupiter's
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JupiterRatios {
    pub mass: f64,
    pub radius: f64,
}

impl JupiterRatios {
    /// Convert Earth-relative mass/radius. Missing (non-finite) values count as zero.
    pub fn from_earth_units(mass_earth: f64, radius_earth: f64) -> Self {
        let mass = if mass_earth.is_finite() { mass_earth } else { 0.0 };
        let radius = if radius_earth.is_finite() { radius_earth } else { 0.0 };

        JupiterRatios {
            mass: mass / JUPITER_MASS_EARTHS,
            radius: radius / JUPITER_RADIUS_EARTHS,
        }
    }
}

// ============================================================================
// RULE DEFINITION
// ============================================================================

/// Half-open interval: `min` inclusive, `max` exclusive, either side open when `None`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl RatioRange {
    pub const ANY: RatioRange = RatioRange { min: None, max: None };

    pub const fn at_least(min: f64) -> Self {
        RatioRange { min: Some(min), max: None }
    }

    pub const fn below(max: f64) -> Self {
        RatioRange { min: None, max: Some(max) }
    }

    pub const fn between(min: f64, max: f64) -> Self {
        RatioRange { min: Some(min), max: Some(max) }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value < max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationRule {
    /// Rule ID for tracking
    pub id: &'static str,

    /// Type assigned when both ranges match
    pub planet_type: PlanetType,

    /// Accepted Jupiter-relative mass
    pub mass: RatioRange,

    /// Accepted Jupiter-relative radius
    pub radius: RatioRange,
}

impl ClassificationRule {
    pub fn matches(&self, ratios: JupiterRatios) -> bool {
        self.mass.contains(ratios.mass) && self.radius.contains(ratios.radius)
    }
}

/// Ordered decision table, first match wins.
///
/// The neptune-like row deliberately has no radius bound: a planet with
/// mass ratio in [0.05, 0.1) is neptune-like whatever its size.
pub const RULES: [ClassificationRule; 4] = [
    ClassificationRule {
        id: "gas-giant",
        planet_type: PlanetType::GasGiant,
        mass: RatioRange::at_least(0.1),
        radius: RatioRange::at_least(0.5),
    },
    ClassificationRule {
        id: "neptune-like",
        planet_type: PlanetType::NeptuneLike,
        mass: RatioRange::between(0.05, 0.1),
        radius: RatioRange::ANY,
    },
    ClassificationRule {
        id: "super-earth",
        planet_type: PlanetType::SuperEarth,
        mass: RatioRange::between(0.01, 0.05),
        radius: RatioRange::ANY,
    },
    ClassificationRule {
        id: "terrestrial",
        planet_type: PlanetType::Terrestrial,
        mass: RatioRange::below(0.01),
        radius: RatioRange::below(0.5),
    },
];

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Classify from Jupiter-relative ratios. Total: falls through to `Unknown`.
pub fn classify_ratios(ratios: JupiterRatios) -> PlanetType {
    RULES
        .iter()
        .find(|rule| rule.matches(ratios))
        .map(|rule| rule.planet_type)
        .unwrap_or(PlanetType::Unknown)
}

/// Classify from Earth-relative mass and radius
pub fn classify(mass_earth: f64, radius_earth: f64) -> PlanetType {
    classify_ratios(JupiterRatios::from_earth_units(mass_earth, radius_earth))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ratios(mass: f64, radius: f64) -> JupiterRatios {
        JupiterRatios { mass, radius }
    }

    #[test]
    fn test_decision_table() {
        assert_eq!(classify_ratios(ratios(1.0, 1.0)), PlanetType::GasGiant);
        assert_eq!(classify_ratios(ratios(0.07, 0.3)), PlanetType::NeptuneLike);
        assert_eq!(classify_ratios(ratios(0.02, 0.2)), PlanetType::SuperEarth);
        assert_eq!(classify_ratios(ratios(0.003, 0.09)), PlanetType::Terrestrial);
    }

    #[test]
    fn test_heavy_but_small_is_not_gas_giant() {
        // mass 0.1 fails the gas-giant radius check, and 0.1 is outside [0.05, 0.1)
        assert_ne!(classify_ratios(ratios(0.1, 0.4)), PlanetType::GasGiant);
        assert_eq!(classify_ratios(ratios(0.1, 0.4)), PlanetType::Unknown);
        assert_eq!(classify_ratios(ratios(0.099, 0.4)), PlanetType::NeptuneLike);
    }

    #[test]
    fn test_neptune_like_ignores_radius() {
        assert_eq!(classify_ratios(ratios(0.06, 0.9)), PlanetType::NeptuneLike);
        assert_eq!(classify_ratios(ratios(0.05, 2.0)), PlanetType::NeptuneLike);
    }

    #[test]
    fn test_boundaries_are_half_open() {
        assert_eq!(classify_ratios(ratios(0.1, 0.5)), PlanetType::GasGiant);
        assert_eq!(classify_ratios(ratios(0.05, 0.1)), PlanetType::NeptuneLike);
        assert_eq!(classify_ratios(ratios(0.01, 0.1)), PlanetType::SuperEarth);
        assert_eq!(classify_ratios(ratios(0.0099, 0.49)), PlanetType::Terrestrial);
    }

    #[test]
    fn test_unknown_fallthrough() {
        // Light but huge: no rule claims it
        assert_eq!(classify_ratios(ratios(0.001, 0.8)), PlanetType::Unknown);
        // Heavy but compact
        assert_eq!(classify_ratios(ratios(2.0, 0.3)), PlanetType::Unknown);
    }

    #[test]
    fn test_classify_earth_units() {
        // Jupiter itself
        assert_eq!(classify(317.8, 11.2), PlanetType::GasGiant);
        // Earth
        assert_eq!(classify(1.0, 1.0), PlanetType::Terrestrial);
        // Neptune: 17.15 Earth masses = 0.054 Jupiter
        assert_eq!(classify(17.15, 3.88), PlanetType::NeptuneLike);
        // 8 Earth masses = 0.025 Jupiter
        assert_eq!(classify(8.0, 2.0), PlanetType::SuperEarth);
    }

    #[test]
    fn test_missing_values_count_as_zero() {
        assert_eq!(classify(f64::NAN, 1.0), PlanetType::Terrestrial);
        assert_eq!(classify(f64::NAN, f64::NAN), PlanetType::Terrestrial);
    }

    #[test]
    fn test_classification_is_deterministic() {
        for (mass, radius) in [(0.5, 0.2), (12.0, 4.0), (400.0, 13.0), (30.0, 9.0)] {
            assert_eq!(classify(mass, radius), classify(mass, radius));
        }
    }

    #[test]
    fn test_tag_round_trip_and_lenient_parse() {
        for t in PlanetType::ALL {
            assert_eq!(PlanetType::from_tag(t.tag()), t);
        }
        assert_eq!(PlanetType::from_tag("Gas-Giant"), PlanetType::GasGiant);
        assert_eq!(PlanetType::from_tag("hot jupiter"), PlanetType::Unknown);

        let parsed: PlanetType = serde_json::from_str("\"super-earth\"").unwrap();
        assert_eq!(parsed, PlanetType::SuperEarth);
        let parsed: PlanetType = serde_json::from_str("null").unwrap();
        assert_eq!(parsed, PlanetType::Unknown);
        assert_eq!(serde_json::to_string(&PlanetType::NeptuneLike).unwrap(), "\"neptune-like\"");
    }
}
