// 🛰️ Ingestion - fetch → parse → classify → persist → enrich
//
// One request for the dataset, then one independent task per record for
// enrichment. Tasks report through a channel; the refresh loop is the only
// writer and commits each batch of completions to the store as it arrives.

use crate::config::{ArchiveConfig, SkyConfig, MAX_AGE_HOURS_LIMIT};
use crate::enrichment::{lookup, Enrichment, SummaryService};
use crate::error::{SkyError, SkyResult};
use crate::parser::parse_table;
use crate::record::PlanetRecord;
use crate::store::{DatasetMeta, DatasetStore, KeyValueStore};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

// ============================================================================
// DATASET SOURCE
// ============================================================================

/// Where the CSV comes from
#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn fetch_csv(&self) -> SkyResult<String>;

    /// Short label for logs
    fn describe(&self) -> String;
}

/// HTTP client for the exoplanet archive's TAP endpoint
pub struct ArchiveClient {
    http: reqwest::Client,
    url: String,
}

impl ArchiveClient {
    pub fn new(config: &ArchiveConfig, user_agent: &str) -> SkyResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl DatasetSource for ArchiveClient {
    async fn fetch_csv(&self) -> SkyResult<String> {
        let resp = self.http.get(&self.url).send().await?;
        if !resp.status().is_success() {
            return Err(SkyError::Api {
                status: resp.status().as_u16(),
                message: "dataset download failed".to_string(),
            });
        }

        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Err(SkyError::MalformedResponse {
                origin: self.describe(),
                message: "empty body".to_string(),
            });
        }
        Ok(body)
    }

    fn describe(&self) -> String {
        "exoplanet archive".to_string()
    }
}

// ============================================================================
// PARSE + CLASSIFY
// ============================================================================

/// Records built from one CSV body
#[derive(Debug, Clone, Default)]
pub struct IngestBatch {
    pub records: Vec<PlanetRecord>,
    /// Rows rejected for a column-count mismatch
    pub parse_errors: usize,
    /// Rows with the right shape but unusable values
    pub conversion_errors: usize,
}

/// Parse the CSV and classify every record
pub fn build_records(csv_text: &str) -> SkyResult<IngestBatch> {
    let table = parse_table(csv_text)?;
    for err in &table.errors {
        debug!(line = err.line, message = %err.message, "rejected row");
    }

    let mut batch = IngestBatch {
        records: Vec::with_capacity(table.rows.len()),
        parse_errors: table.error_count(),
        conversion_errors: 0,
    };

    for row in &table.rows {
        match PlanetRecord::from_row(row) {
            Ok(record) => batch.records.push(record),
            Err(e) => {
                debug!(error = %e, "skipping row");
                batch.conversion_errors += 1;
            }
        }
    }

    Ok(batch)
}

/// SHA-256 of the CSV body, hex encoded
pub fn checksum(csv_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(csv_text.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// REFRESH
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct RefreshOptions {
    /// Rewrite the blob even when the dataset is unchanged
    pub force: bool,
    pub enrich: bool,
}

impl RefreshOptions {
    /// Dataset only, no lookups. For callers that must show a planet right away.
    pub const fn dataset_only() -> Self {
        Self {
            force: false,
            enrich: false,
        }
    }
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            force: false,
            enrich: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentTally {
    pub attempted: usize,
    pub enriched: usize,
    /// Lookups that succeeded but produced nothing usable
    pub empty: usize,
    pub failed: usize,
    /// Store writes performed by the writer loop
    pub commits: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub run_id: String,
    pub record_count: usize,
    pub parse_errors: usize,
    pub conversion_errors: usize,
    /// Dataset checksum matched the stored one; existing blob was kept
    pub unchanged: bool,
    pub enrichment: EnrichmentTally,
}

/// Message from one enrichment task to the writer
#[derive(Debug)]
pub struct EnrichmentOutcome {
    pub index: usize,
    pub name: String,
    pub result: SkyResult<Enrichment>,
}

/// Drives ingestion runs against one store
pub struct Ingestor<S: KeyValueStore> {
    source: Arc<dyn DatasetSource>,
    summaries: Arc<dyn SummaryService>,
    store: DatasetStore<S>,
    max_concurrent: usize,
    max_age: ChronoDuration,
}

impl<S: KeyValueStore> Ingestor<S> {
    pub fn new(
        source: Arc<dyn DatasetSource>,
        summaries: Arc<dyn SummaryService>,
        store: DatasetStore<S>,
    ) -> Self {
        Self {
            source,
            summaries,
            store,
            max_concurrent: 8,
            max_age: ChronoDuration::days(7),
        }
    }

    /// Apply concurrency and staleness settings from config
    pub fn with_config(mut self, config: &SkyConfig) -> Self {
        self.max_concurrent = config.enrichment.max_concurrent.max(1);
        let hours = config.refresh.max_age_hours.min(MAX_AGE_HOURS_LIMIT);
        self.max_age = ChronoDuration::hours(hours as i64);
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_max_age(mut self, max_age: ChronoDuration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn store(&self) -> &DatasetStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DatasetStore<S> {
        &mut self.store
    }

    pub fn into_store(self) -> DatasetStore<S> {
        self.store
    }

    /// True when nothing is stored or the stored dataset is older than the max age
    pub fn is_refresh_due(&self, now: DateTime<Utc>) -> bool {
        match self.store.load_meta() {
            Some(meta) => now - meta.fetched_at >= self.max_age,
            None => true,
        }
    }

    /// Run one ingestion.
    ///
    /// Takes `&mut self`: two refreshes of the same store can never overlap.
    /// Returns after every enrichment task has reported and been committed.
    pub async fn refresh(&mut self, options: RefreshOptions) -> SkyResult<RefreshReport> {
        let run_id = uuid::Uuid::new_v4().to_string();
        info!(%run_id, source = %self.source.describe(), "refreshing dataset");

        let csv_text = self.source.fetch_csv().await?;
        let digest = checksum(&csv_text);
        let batch = build_records(&csv_text)?;

        if batch.records.is_empty() {
            return Err(SkyError::MalformedResponse {
                origin: self.source.describe(),
                message: format!(
                    "no usable records ({} parse errors, {} conversion errors)",
                    batch.parse_errors, batch.conversion_errors
                ),
            });
        }

        let meta = DatasetMeta {
            run_id: run_id.clone(),
            fetched_at: Utc::now(),
            checksum: digest,
            record_count: batch.records.len(),
            parse_errors: batch.parse_errors,
        };

        let stored = if options.force {
            None
        } else {
            self.unchanged_dataset(&meta.checksum)
        };
        let unchanged = stored.is_some();

        let records = match stored {
            Some(records) => {
                info!(count = records.len(), "dataset unchanged, keeping stored enrichment");
                self.store.save_meta(&meta)?;
                records
            }
            None => {
                self.store.save_dataset(&batch.records, &meta)?;
                info!(
                    count = batch.records.len(),
                    parse_errors = batch.parse_errors,
                    conversion_errors = batch.conversion_errors,
                    "dataset saved"
                );
                batch.records
            }
        };

        let record_count = records.len();
        let enrichment = if options.enrich {
            let pending: Vec<usize> = records
                .iter()
                .enumerate()
                .filter(|(_, r)| !r.has_enrichment())
                .map(|(i, _)| i)
                .collect();
            self.enrich(records, pending).await
        } else {
            EnrichmentTally::default()
        };

        Ok(RefreshReport {
            run_id,
            record_count,
            parse_errors: batch.parse_errors,
            conversion_errors: batch.conversion_errors,
            unchanged,
            enrichment,
        })
    }

    /// Refresh, logging any failure instead of returning it
    pub async fn refresh_quietly(&mut self, options: RefreshOptions) -> Option<RefreshReport> {
        match self.refresh(options).await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(error = %e, "dataset refresh failed, keeping stored data");
                None
            }
        }
    }

    /// Refresh the dataset without enrichment, only when due.
    ///
    /// Never waits on summary lookups, so a caller can render straight after.
    /// `None` when nothing was due or the refresh failed.
    pub async fn refresh_if_due(&mut self, now: DateTime<Utc>) -> Option<RefreshReport> {
        if !self.is_refresh_due(now) {
            debug!("stored dataset is fresh");
            return None;
        }
        self.refresh_quietly(RefreshOptions::dataset_only()).await
    }

    /// Stored records when their checksum matches the fresh download
    fn unchanged_dataset(&self, digest: &str) -> Option<Vec<PlanetRecord>> {
        let meta = self.store.load_meta()?;
        if meta.checksum != digest {
            return None;
        }
        self.store.load_dataset()
    }

    /// Spawn one lookup per pending index and commit results as they arrive
    async fn enrich(&mut self, mut records: Vec<PlanetRecord>, pending: Vec<usize>) -> EnrichmentTally {
        let mut tally = EnrichmentTally {
            attempted: pending.len(),
            ..EnrichmentTally::default()
        };
        if pending.is_empty() {
            return tally;
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<EnrichmentOutcome>();
        let permits = Arc::new(Semaphore::new(self.max_concurrent));

        for index in pending {
            let name = records[index].name.clone();
            let tx = tx.clone();
            let service = Arc::clone(&self.summaries);
            let permits = Arc::clone(&permits);

            tokio::spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };
                let result = lookup(service.as_ref(), &name).await;
                let _ = tx.send(EnrichmentOutcome { index, name, result });
            });
        }
        // Channel closes once every task has reported (or died)
        drop(tx);

        while let Some(first) = rx.recv().await {
            let mut dirty = merge_outcome(&mut records, first, &mut tally);

            // Coalesce completions already waiting into the same write
            while let Ok(next) = rx.try_recv() {
                dirty |= merge_outcome(&mut records, next, &mut tally);
            }

            if dirty {
                match self.store.save_records(&records) {
                    Ok(()) => tally.commits += 1,
                    Err(e) => warn!(error = %e, "failed to persist enrichment"),
                }
            }
        }

        info!(
            enriched = tally.enriched,
            empty = tally.empty,
            failed = tally.failed,
            "enrichment finished"
        );
        tally
    }
}

/// Fold one outcome into the collection. Returns true when a record changed.
fn merge_outcome(records: &mut [PlanetRecord], outcome: EnrichmentOutcome, tally: &mut EnrichmentTally) -> bool {
    let enrichment = match outcome.result {
        Ok(enrichment) => enrichment,
        Err(e) => {
            warn!(planet = %outcome.name, error = %e, "enrichment failed");
            tally.failed += 1;
            return false;
        }
    };

    if enrichment.is_empty() {
        tally.empty += 1;
        return false;
    }

    match records.get_mut(outcome.index) {
        Some(record) if record.name == outcome.name => {
            record.apply_enrichment(&enrichment);
            tally.enriched += 1;
            true
        }
        _ => {
            warn!(planet = %outcome.name, index = outcome.index, "enrichment target moved, dropping result");
            tally.failed += 1;
            false
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::PlanetType;

    const CSV: &str = "pl_name,pl_rade,pl_orbper,pl_masse,sy_snum,sy_dist,pl_eqt,pl_refname,disc_year\n\
        Kepler-22 b,2.1,289.86,9.1,1,194.6,279,\"<a href=x>Borucki, et al. 2012</a>\",2011\n\
        HD 209458 b,15.6,3.52,219.0,1,48.3,1449,,1999\n\
        broken,row\n\
        Nameless,1.0,abc,1.0,1,1.0,300,,2000\n";

    #[test]
    fn test_build_records_counts_errors() {
        let batch = build_records(CSV).unwrap();

        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.parse_errors, 1);
        assert_eq!(batch.conversion_errors, 1);
        assert_eq!(batch.records[0].planet_type, PlanetType::SuperEarth);
        assert_eq!(batch.records[1].planet_type, PlanetType::GasGiant);
        assert!(batch.records[0].reference.contains("Borucki, et al."));
    }

    #[test]
    fn test_checksum_is_stable_hex() {
        let a = checksum(CSV);
        assert_eq!(a, checksum(CSV));
        assert_eq!(a.len(), 64);
        assert_ne!(a, checksum("other"));
    }

    #[test]
    fn test_merge_outcome_rules() {
        let mut records = build_records(CSV).unwrap().records;
        let mut tally = EnrichmentTally::default();

        let ok = EnrichmentOutcome {
            index: 1,
            name: "HD 209458 b".to_string(),
            result: Ok(Enrichment {
                subtitle: Some("Hot Jupiter".to_string()),
                description: None,
            }),
        };
        assert!(merge_outcome(&mut records, ok, &mut tally));
        assert_eq!(records[1].subtitle.as_deref(), Some("Hot Jupiter"));

        let wrong_target = EnrichmentOutcome {
            index: 0,
            name: "HD 209458 b".to_string(),
            result: Ok(Enrichment {
                subtitle: Some("misplaced".to_string()),
                description: None,
            }),
        };
        assert!(!merge_outcome(&mut records, wrong_target, &mut tally));
        assert!(records[0].subtitle.is_none());

        let failed = EnrichmentOutcome {
            index: 0,
            name: "Kepler-22 b".to_string(),
            result: Err(SkyError::Api {
                status: 404,
                message: "not found".to_string(),
            }),
        };
        assert!(!merge_outcome(&mut records, failed, &mut tally));

        assert_eq!(tally.enriched, 1);
        assert_eq!(tally.failed, 2);
    }
}
