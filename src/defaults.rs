// Built-in planets shown when no dataset has been stored yet

use crate::record::PlanetRecord;

pub fn default_planets() -> Vec<PlanetRecord> {
    vec![
        PlanetRecord::new(
            "51 Pegasi b",
            13.7,
            4.230785,
            146.2,
            1,
            15.47,
            1284.0,
            "<a refstr=MAYOR___QUELOZ_1995 href=https://ui.adsabs.harvard.edu/abs/1995Natur.378..355M/abstract target=ref>Mayor &amp; Queloz 1995</a>",
        )
        .with_discovery_year(1995)
        .with_enrichment(
            Some("Extrasolar planet in the constellation Pegasus"),
            Some("51 Pegasi b is the first exoplanet discovered orbiting a main-sequence star, a hot Jupiter completing an orbit around its Sun-like host every four days."),
        ),
        PlanetRecord::new(
            "TRAPPIST-1 e",
            0.92,
            6.101013,
            0.692,
            1,
            12.43,
            250.0,
            "<a refstr=AGOL_ET_AL__2021 href=https://ui.adsabs.harvard.edu/abs/2021PSJ.....2....1A/abstract target=ref>Agol et al. 2021</a>",
        )
        .with_discovery_year(2017)
        .with_enrichment(
            Some("Rocky exoplanet orbiting TRAPPIST-1"),
            Some("TRAPPIST-1e is a rocky, close-to-Earth-sized exoplanet orbiting within the habitable zone of the ultracool dwarf star TRAPPIST-1."),
        ),
        PlanetRecord::new(
            "Proxima Cen b",
            1.07,
            11.1868,
            1.07,
            3,
            1.30119,
            234.0,
            "<a refstr=FARIA_ET_AL__2022 href=https://ui.adsabs.harvard.edu/abs/2022A&amp;A...658A.115F/abstract target=ref>Faria et al. 2022</a>",
        )
        .with_discovery_year(2016),
        PlanetRecord::new(
            "HD 209458 b",
            15.6,
            3.52474859,
            219.0,
            1,
            48.3,
            1449.0,
            "<a refstr=TORRES_ET_AL__2008 href=https://ui.adsabs.harvard.edu/abs/2008ApJ...677.1324T/abstract target=ref>Torres et al. 2008</a>",
        )
        .with_discovery_year(1999),
        PlanetRecord::new(
            "Kepler-16 b",
            8.45,
            228.776,
            105.8,
            2,
            75.1,
            188.0,
            "<a refstr=DOYLE_ET_AL__2011 href=https://ui.adsabs.harvard.edu/abs/2011Sci...333.1602D/abstract target=ref>Doyle et al. 2011</a>",
        )
        .with_discovery_year(2011)
        .with_enrichment(Some("Circumbinary exoplanet in the constellation Cygnus"), None),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::PlanetType;

    #[test]
    fn test_defaults_are_classified() {
        let planets = default_planets();
        assert_eq!(planets.len(), 5);

        let by_name = |name: &str| planets.iter().find(|p| p.name == name).unwrap().planet_type;
        assert_eq!(by_name("HD 209458 b"), PlanetType::GasGiant);
        assert_eq!(by_name("TRAPPIST-1 e"), PlanetType::Terrestrial);
        assert_eq!(by_name("Kepler-16 b"), PlanetType::GasGiant);
    }

    #[test]
    fn test_defaults_cover_multi_star_systems() {
        assert!(default_planets().iter().any(|p| p.star_count > 1));
    }
}
