// 📐 Unit conversion + decimal formatting for display values
// Pure functions only; every display number goes through here.

/// Light-years in one parsec
pub const LIGHT_YEARS_PER_PARSEC: f64 = 3.2616;

/// Offset between Kelvin and Celsius
pub const KELVIN_OFFSET: f64 = 273.15;

/// Decimal places used when a field has no explicit override
pub const DEFAULT_DECIMALS: u32 = 2;

/// Orbital period is shown with one decimal place
pub const ORBITAL_PERIOD_DECIMALS: u32 = 1;

/// Distance and temperatures are shown as whole numbers
pub const DISTANCE_DECIMALS: u32 = 0;
pub const TEMPERATURE_DECIMALS: u32 = 0;

pub fn parsec_to_light_year(parsec: f64) -> f64 {
    parsec * LIGHT_YEARS_PER_PARSEC
}

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Round half away from zero to `places` decimal places.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    let rounded = (value * factor).round() / factor;

    // -0.0 would render as "-0"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Format a value rounded to `places` decimals.
///
/// Non-finite values render as "n/a" so a bad archive value never shows up as "NaN".
pub fn format_decimal(value: f64, places: u32) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    format!("{:.*}", places as usize, round_to(value, places))
}

/// Format with [`DEFAULT_DECIMALS`]
pub fn format_default(value: f64) -> String {
    format_decimal(value, DEFAULT_DECIMALS)
}

// ============================================================================
// TESTS
// ============================================================================
