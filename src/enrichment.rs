// 📖 Enrichment Fetcher - short descriptions from an encyclopedia summary API
// One lookup per planet; failures leave the record untouched.

use crate::config::EnrichmentConfig;
use crate::error::{SkyError, SkyResult};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

pub const MAX_SUBTITLE_LENGTH: usize = 75;
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;
/// Descriptions must be longer than this to be kept
pub const MIN_DESCRIPTION_LENGTH: usize = 10;

const ELLIPSIS: &str = "...";

static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("valid parenthetical regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

// ============================================================================
// CORE TYPES
// ============================================================================

/// Raw summary payload. Only the two fields we use are decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageSummary {
    /// Short tagline, becomes the subtitle
    #[serde(default)]
    pub description: Option<String>,

    /// Lead paragraph, becomes the description
    #[serde(default)]
    pub extract: Option<String>,
}

/// Cleaned enrichment text for one record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrichment {
    pub subtitle: Option<String>,
    pub description: Option<String>,
}

impl Enrichment {
    pub fn is_empty(&self) -> bool {
        self.subtitle.is_none() && self.description.is_none()
    }

    /// Apply truncation and cleanup rules to a raw summary
    pub fn from_summary(summary: &PageSummary) -> Self {
        let subtitle = summary
            .description
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| truncate_with_ellipsis(s, MAX_SUBTITLE_LENGTH));

        let description = summary
            .extract
            .as_deref()
            .map(clean_description)
            .filter(|d| d.chars().count() > MIN_DESCRIPTION_LENGTH)
            .map(|d| truncate_with_ellipsis(&d, MAX_DESCRIPTION_LENGTH));

        Enrichment {
            subtitle,
            description,
        }
    }
}

// ============================================================================
// TEXT RULES
// ============================================================================

/// Keep ASCII letters, digits, whitespace and hyphens, then trim.
///
/// "Kepler-22 b" stays as is; "2MASS J0249-0557 c (AB)" loses the parens.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Cut to `max` characters and append "..." when anything was cut
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push_str(ELLIPSIS);
    cut
}

/// Drop parenthetical asides and collapse runs of whitespace
pub fn clean_description(text: &str) -> String {
    let without_asides = PARENTHETICAL.replace_all(text, "");
    WHITESPACE.replace_all(&without_asides, " ").trim().to_string()
}

/// Article link for a planet name
pub fn article_url(name: &str) -> String {
    format!(
        "https://en.wikipedia.org/wiki/{}",
        urlencoding::encode(&sanitize_name(name))
    )
}

// ============================================================================
// SUMMARY SERVICE
// ============================================================================

/// Source of page summaries keyed by title
#[async_trait]
pub trait SummaryService: Send + Sync {
    async fn fetch_summary(&self, title: &str) -> SkyResult<PageSummary>;
}

/// Wikipedia REST client
pub struct WikipediaClient {
    http: reqwest::Client,
    base_url: String,
}

impl WikipediaClient {
    pub fn new(config: &EnrichmentConfig) -> SkyResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn summary_url(&self, title: &str) -> String {
        format!(
            "{}/page/summary/{}",
            self.base_url,
            urlencoding::encode(title)
        )
    }
}

#[async_trait]
impl SummaryService for WikipediaClient {
    async fn fetch_summary(&self, title: &str) -> SkyResult<PageSummary> {
        let url = self.summary_url(title);
        debug!(%url, "fetching summary");

        let resp = self.http.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(SkyError::Api {
                status: resp.status().as_u16(),
                message: format!("summary lookup failed for '{}'", title),
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| SkyError::MalformedResponse {
            origin: url,
            message: e.to_string(),
        })
    }
}

/// Look up and clean the enrichment for one planet name.
///
/// An empty result (nothing usable in the summary) is `Ok(Enrichment::default())`.
pub async fn lookup(service: &dyn SummaryService, planet_name: &str) -> SkyResult<Enrichment> {
    let title = sanitize_name(planet_name);
    if title.is_empty() {
        return Err(SkyError::MalformedResponse {
            origin: "planet name".to_string(),
            message: format!("nothing left of {:?} after sanitizing", planet_name),
        });
    }

    let summary = service.fetch_summary(&title).await?;
    Ok(Enrichment::from_summary(&summary))
}

// ============================================================================
// TESTS
// ============================================================================
