// End-to-end refresh runs against in-process sources

use async_trait::async_trait;
use chrono::{Duration, Utc};
use exoplanet_sky::store::DATASET_KEY;
use exoplanet_sky::{
    DatasetStore, DatasetSource, Ingestor, KeyValueStore, MemoryStore, PageSummary, PlanetType,
    RefreshOptions, SkyConfig, SkyError, SkyResult, SqliteStore, SummaryService,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration as StdDuration, Instant};

const CSV: &str = "pl_name,pl_rade,pl_orbper,pl_masse,sy_snum,sy_dist,pl_eqt,pl_refname,disc_year\n\
Kepler-22 b,2.1,289.8623,9.1,1,194.6,279,<a href=https://example.org/k22 target=ref>Borucki et al. 2012</a>,2011\n\
HD 209458 b,15.6,3.52474859,219.0,1,48.3,1449,<a href=https://example.org/hd target=ref>Torres et al. 2008</a>,1999\n\
TRAPPIST-1 e,0.92,6.101013,0.692,1,12.43,250,,2017\n\
Mystery (X) b,4.0,12.0,20.0,2,100.0,600,,2020\n\
truncated,row\n";

struct StaticSource {
    body: Mutex<String>,
    calls: AtomicUsize,
}

impl StaticSource {
    fn new(body: &str) -> Arc<Self> {
        Arc::new(Self {
            body: Mutex::new(body.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn replace(&self, body: &str) {
        *self.body.lock().unwrap() = body.to_string();
    }
}

#[async_trait]
impl DatasetSource for StaticSource {
    async fn fetch_csv(&self) -> SkyResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.lock().unwrap().clone())
    }

    fn describe(&self) -> String {
        "static csv".to_string()
    }
}

struct DownSource;

#[async_trait]
impl DatasetSource for DownSource {
    async fn fetch_csv(&self) -> SkyResult<String> {
        Err(SkyError::Api {
            status: 503,
            message: "unavailable".to_string(),
        })
    }

    fn describe(&self) -> String {
        "down".to_string()
    }
}

/// Answers every title except "TRAPPIST-1 e" (404) and "Mystery X b" (empty page)
struct FakeSummaries {
    titles: Mutex<Vec<String>>,
}

impl FakeSummaries {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            titles: Mutex::new(Vec::new()),
        })
    }

    fn titles(&self) -> Vec<String> {
        let mut titles = self.titles.lock().unwrap().clone();
        titles.sort();
        titles
    }
}

#[async_trait]
impl SummaryService for FakeSummaries {
    async fn fetch_summary(&self, title: &str) -> SkyResult<PageSummary> {
        self.titles.lock().unwrap().push(title.to_string());
        tokio::task::yield_now().await;

        match title {
            "TRAPPIST-1 e" => Err(SkyError::Api {
                status: 404,
                message: "not found".to_string(),
            }),
            "Mystery X b" => Ok(PageSummary::default()),
            _ => Ok(PageSummary {
                description: Some(format!("Exoplanet called {}", title)),
                extract: Some(format!("{} (a planet) is an exoplanet used in tests.", title)),
            }),
        }
    }
}

fn ingestor<S: KeyValueStore>(
    source: Arc<dyn DatasetSource>,
    summaries: Arc<dyn SummaryService>,
    kv: S,
) -> Ingestor<S> {
    Ingestor::new(source, summaries, DatasetStore::new(kv)).with_max_concurrent(2)
}

#[tokio::test]
async fn test_refresh_stores_classified_and_enriched_records() {
    let summaries = FakeSummaries::new();
    let mut ingestor = ingestor(StaticSource::new(CSV), summaries.clone(), MemoryStore::new());

    let report = ingestor.refresh(RefreshOptions::default()).await.unwrap();

    assert_eq!(report.record_count, 4);
    assert_eq!(report.parse_errors, 1);
    assert_eq!(report.conversion_errors, 0);
    assert!(!report.unchanged);
    assert_eq!(report.enrichment.attempted, 4);
    assert_eq!(report.enrichment.enriched, 2);
    assert_eq!(report.enrichment.empty, 1);
    assert_eq!(report.enrichment.failed, 1);
    assert!(report.enrichment.commits >= 1);

    // Sanitized names are what gets looked up
    assert_eq!(
        summaries.titles(),
        vec!["HD 209458 b", "Kepler-22 b", "Mystery X b", "TRAPPIST-1 e"]
    );

    let stored = ingestor.store().load_dataset().unwrap();
    assert_eq!(stored.len(), 4);

    let by_name = |name: &str| stored.iter().find(|r| r.name == name).unwrap().clone();

    let kepler = by_name("Kepler-22 b");
    assert_eq!(kepler.planet_type, PlanetType::SuperEarth);
    assert_eq!(kepler.subtitle.as_deref(), Some("Exoplanet called Kepler-22 b"));
    assert_eq!(
        kepler.description.as_deref(),
        Some("Kepler-22 b is an exoplanet used in tests.")
    );
    assert_eq!(kepler.discovery_year, Some(2011));

    assert_eq!(by_name("HD 209458 b").planet_type, PlanetType::GasGiant);

    // Failed and empty lookups leave the record untouched
    let trappist = by_name("TRAPPIST-1 e");
    assert_eq!(trappist.planet_type, PlanetType::Terrestrial);
    assert!(!trappist.has_enrichment());
    assert!(!by_name("Mystery (X) b").has_enrichment());

    let meta = ingestor.store().load_meta().unwrap();
    assert_eq!(meta.run_id, report.run_id);
    assert_eq!(meta.record_count, 4);
    assert_eq!(meta.parse_errors, 1);
}

#[tokio::test]
async fn test_unchanged_dataset_keeps_enrichment() {
    let source = StaticSource::new(CSV);
    let summaries = FakeSummaries::new();
    let mut ingestor = ingestor(source.clone(), summaries.clone(), MemoryStore::new());

    ingestor.refresh(RefreshOptions::default()).await.unwrap();
    let first = ingestor.store().load_dataset().unwrap();

    let report = ingestor.refresh(RefreshOptions::default()).await.unwrap();
    assert!(report.unchanged);
    // Only the two records without enrichment are retried
    assert_eq!(report.enrichment.attempted, 2);
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);

    let second = ingestor.store().load_dataset().unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_changed_dataset_overwrites_wholesale() {
    let source = StaticSource::new(CSV);
    let mut ingestor = ingestor(source.clone(), FakeSummaries::new(), MemoryStore::new());
    ingestor.refresh(RefreshOptions::default()).await.unwrap();

    source.replace(
        "pl_name,pl_rade,pl_orbper,pl_masse,sy_snum,sy_dist,pl_eqt,pl_refname,disc_year\n\
         Proxima Cen b,1.07,11.1868,1.07,3,1.30119,234,,2016\n",
    );
    let report = ingestor
        .refresh(RefreshOptions { force: false, enrich: false })
        .await
        .unwrap();

    assert!(!report.unchanged);
    assert_eq!(report.enrichment.attempted, 0);

    let stored = ingestor.store().load_dataset().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Proxima Cen b");
    assert_eq!(stored[0].star_count, 3);
}

#[tokio::test]
async fn test_force_rewrites_unchanged_dataset() {
    let source = StaticSource::new(CSV);
    let mut ingestor = ingestor(source, FakeSummaries::new(), MemoryStore::new());
    ingestor.refresh(RefreshOptions::default()).await.unwrap();

    let report = ingestor
        .refresh(RefreshOptions { force: true, enrich: false })
        .await
        .unwrap();
    assert!(!report.unchanged);

    // Fresh blob, enrichment from the first run is gone
    let stored = ingestor.store().load_dataset().unwrap();
    assert!(stored.iter().all(|r| !r.has_enrichment()));
}

#[tokio::test]
async fn test_failed_fetch_keeps_stored_dataset() {
    let mut kv = MemoryStore::new();
    kv.set(DATASET_KEY, "[]").unwrap();

    let mut ingestor = ingestor(Arc::new(DownSource), FakeSummaries::new(), kv);
    let err = ingestor.refresh(RefreshOptions::default()).await.unwrap_err();
    assert!(matches!(err, SkyError::Api { status: 503, .. }));

    assert!(ingestor.refresh_quietly(RefreshOptions::default()).await.is_none());
    assert_eq!(ingestor.store().kv().get(DATASET_KEY).unwrap().as_deref(), Some("[]"));
}

#[tokio::test]
async fn test_source_without_usable_rows_is_an_error() {
    let header_only = "pl_name,pl_rade,pl_orbper,pl_masse,sy_snum,sy_dist,pl_eqt,pl_refname\n";
    let mut ingestor = ingestor(StaticSource::new(header_only), FakeSummaries::new(), MemoryStore::new());

    let err = ingestor.refresh(RefreshOptions::default()).await.unwrap_err();
    assert!(matches!(err, SkyError::MalformedResponse { .. }));
    assert!(ingestor.store().load_dataset().is_none());
}

#[tokio::test]
async fn test_refresh_due_tracks_dataset_age() {
    let mut ingestor = ingestor(StaticSource::new(CSV), FakeSummaries::new(), MemoryStore::new())
        .with_max_age(Duration::hours(24));

    assert!(ingestor.is_refresh_due(Utc::now()));

    ingestor
        .refresh(RefreshOptions { force: false, enrich: false })
        .await
        .unwrap();
    assert!(!ingestor.is_refresh_due(Utc::now()));
    assert!(ingestor.is_refresh_due(Utc::now() + Duration::hours(25)));
}

#[tokio::test]
async fn test_refresh_persists_to_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sky.db");

    {
        let kv = SqliteStore::open(&path).unwrap();
        let mut ingestor = ingestor(StaticSource::new(CSV), FakeSummaries::new(), kv);
        ingestor.refresh(RefreshOptions::default()).await.unwrap();
    }

    let store = DatasetStore::new(SqliteStore::open(&path).unwrap());
    let records = store.load_dataset().unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records.iter().filter(|r| r.has_enrichment()).count(), 2);
}

/// Every lookup takes a quarter of a second
struct SlowSummaries {
    calls: AtomicUsize,
}

#[async_trait]
impl SummaryService for SlowSummaries {
    async fn fetch_summary(&self, title: &str) -> SkyResult<PageSummary> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(StdDuration::from_millis(250)).await;
        Ok(PageSummary {
            description: Some(format!("Exoplanet called {}", title)),
            extract: None,
        })
    }
}

fn many_planets(count: usize) -> String {
    let mut csv = String::from("pl_name,pl_rade,pl_orbper,pl_masse,sy_snum,sy_dist,pl_eqt,pl_refname,disc_year\n");
    for i in 0..count {
        csv.push_str(&format!("Planet-{} b,1.0,10.0,1.0,1,20.0,300,,2020\n", i));
    }
    csv
}

#[tokio::test]
async fn test_refresh_if_due_does_not_wait_for_lookups() {
    let summaries = Arc::new(SlowSummaries {
        calls: AtomicUsize::new(0),
    });
    let mut ingestor = ingestor(StaticSource::new(&many_planets(32)), summaries.clone(), MemoryStore::new());

    let started = Instant::now();
    let report = ingestor.refresh_if_due(Utc::now()).await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed < StdDuration::from_millis(250), "took {:?}", elapsed);
    assert_eq!(report.record_count, 32);
    assert_eq!(report.enrichment.attempted, 0);
    assert_eq!(summaries.calls.load(Ordering::SeqCst), 0);
    assert_eq!(ingestor.store().load_dataset().unwrap().len(), 32);

    // Fresh now, so a second call does nothing
    assert!(ingestor.refresh_if_due(Utc::now()).await.is_none());
}

#[tokio::test]
async fn test_refresh_if_due_keeps_data_on_failure() {
    let mut kv = MemoryStore::new();
    kv.set(DATASET_KEY, "[]").unwrap();

    let mut ingestor = ingestor(Arc::new(DownSource), FakeSummaries::new(), kv);
    assert!(ingestor.refresh_if_due(Utc::now()).await.is_none());
    assert_eq!(ingestor.store().kv().get(DATASET_KEY).unwrap().as_deref(), Some("[]"));
}

#[tokio::test]
async fn test_oversized_max_age_does_not_panic() {
    let mut config = SkyConfig::default();
    config.refresh.max_age_hours = u64::MAX;

    let mut ingestor = Ingestor::new(
        StaticSource::new(CSV),
        FakeSummaries::new(),
        DatasetStore::new(MemoryStore::new()),
    )
    .with_config(&config);

    assert!(ingestor.is_refresh_due(Utc::now()));
    ingestor.refresh(RefreshOptions::dataset_only()).await.unwrap();
    assert!(!ingestor.is_refresh_due(Utc::now() + Duration::days(365)));
}
