// Exoplanet Sky - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod units;
pub mod classifier;   // Planet type decision table
pub mod parser;       // CSV → raw rows
pub mod record;
pub mod config;
pub mod enrichment;   // Encyclopedia summaries
pub mod store;        // Key-value persistence (SQLite / memory)
pub mod preferences;
pub mod ingest;       // Fetch → parse → classify → persist → enrich
pub mod defaults;
pub mod display;

// Re-export commonly used types
pub use error::{SkyError, SkyResult};
pub use classifier::{classify, classify_ratios, JupiterRatios, PlanetType};
pub use parser::{parse_table, ParsedTable, RawRow, RowError};
pub use record::PlanetRecord;
pub use config::SkyConfig;
pub use enrichment::{lookup, Enrichment, PageSummary, SummaryService, WikipediaClient};
pub use store::{DatasetMeta, DatasetStore, KeyValueStore, MemoryStore, SqliteStore};
pub use preferences::{InfoSection, Preferences, TemperatureUnit};
pub use ingest::{
    build_records, ArchiveClient, DatasetSource, Ingestor, RefreshOptions, RefreshReport,
};
pub use defaults::default_planets;
pub use display::{pick_planet, render_text, PlanetView};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
