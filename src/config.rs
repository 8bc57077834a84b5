use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};
use crate::search::trending::TrendPeriod;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub trending: TrendingConfig,
    #[serde(default)]
    pub compare: CompareConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, project_root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("PREPCAT_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            match Self::load_patch(&path)? {
                Some(patch) => config.merge_patch(patch),
                None => {
                    return Err(PrepError::Config(format!(
                        "config file {} not found",
                        path.display()
                    )));
                }
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(project_root)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a full TOML document on top of the defaults.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let patch: ConfigPatch =
            toml::from_str(raw).map_err(|err| PrepError::Config(format!("parse config: {err}")))?;
        let mut config = Self::default();
        config.merge_patch(patch);
        config.validate()?;
        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("prepcat/config.toml"))
    }

    fn load_project(project_root: &Path) -> Result<Option<ConfigPatch>> {
        Self::load_patch(&project_root.join("prepcat.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| PrepError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| PrepError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.search {
            self.search.merge(patch);
        }
        if let Some(patch) = patch.scoring {
            self.scoring.merge(patch);
        }
        if let Some(patch) = patch.trending {
            self.trending.merge(patch);
        }
        if let Some(patch) = patch.compare {
            self.compare.merge(patch);
        }
        if let Some(patch) = patch.cache {
            self.cache.merge(patch);
        }
        if let Some(patch) = patch.store {
            self.store.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_usize("PREPCAT_SEARCH_DEFAULT_LIMIT")? {
            self.search.default_limit = value;
        }
        if let Some(value) = env_usize("PREPCAT_SEARCH_MAX_LIMIT")? {
            self.search.max_limit = value;
        }
        if let Some(value) = env_usize("PREPCAT_SEARCH_TAG_FACET_CAP")? {
            self.search.tag_facet_cap = value;
        }
        if let Some(value) = env_string("PREPCAT_SEARCH_TAG_FACET_ORDER") {
            self.search.tag_facet_order = parse_tag_facet_order(&value)?;
        }
        if let Some(value) = env_bool("PREPCAT_SEARCH_FACETS_ENABLED")? {
            self.search.facets_enabled = value;
        }

        if let Some(value) = env_u64("PREPCAT_SCORING_POPULAR_THRESHOLD")? {
            self.scoring.popular_threshold = value;
        }
        if let Some(value) = env_f64("PREPCAT_SCORING_POPULARITY_WEIGHT")? {
            self.scoring.popularity_weight = value;
        }
        if let Some(value) = env_f64("PREPCAT_SCORING_RATING_WEIGHT")? {
            self.scoring.rating_weight = value;
        }
        if let Some(value) = env_f64("PREPCAT_SCORING_STUDENTS_WEIGHT")? {
            self.scoring.students_weight = value;
        }
        if let Some(value) = env_f64("PREPCAT_SCORING_TRENDING_POPULARITY_WEIGHT")? {
            self.scoring.trending_popularity_weight = value;
        }
        if let Some(value) = env_f64("PREPCAT_SCORING_TRENDING_RATING_WEIGHT")? {
            self.scoring.trending_rating_weight = value;
        }
        if let Some(value) = env_f64("PREPCAT_SCORING_TRENDING_STUDENTS_WEIGHT")? {
            self.scoring.trending_students_weight = value;
        }

        if let Some(value) = env_string("PREPCAT_TRENDING_DEFAULT_PERIOD") {
            self.trending.default_period = value;
        }
        if let Some(value) = env_usize("PREPCAT_TRENDING_DEFAULT_LIMIT")? {
            self.trending.default_limit = value;
        }
        if let Some(value) = env_usize("PREPCAT_TRENDING_MAX_LIMIT")? {
            self.trending.max_limit = value;
        }

        if let Some(value) = env_usize("PREPCAT_COMPARE_MAX_IDS")? {
            self.compare.max_ids = value;
        }

        if let Some(value) = env_bool("PREPCAT_CACHE_ENABLED")? {
            self.cache.enabled = value;
        }
        if let Some(value) = env_usize("PREPCAT_CACHE_CAPACITY")? {
            self.cache.capacity = value;
        }
        if let Some(value) = env_u64("PREPCAT_CACHE_TTL_SECONDS")? {
            self.cache.ttl_seconds = value;
        }

        if let Some(value) = env_u64("PREPCAT_STORE_TIMEOUT_MS")? {
            self.store.timeout_ms = value;
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.search.max_limit == 0 {
            return Err(PrepError::Config("search.max_limit must be positive".to_string()));
        }
        if self.search.default_limit == 0 || self.search.default_limit > self.search.max_limit {
            return Err(PrepError::Config(format!(
                "search.default_limit {} must be between 1 and search.max_limit {}",
                self.search.default_limit, self.search.max_limit
            )));
        }
        if self.trending.default_limit == 0 || self.trending.default_limit > self.trending.max_limit
        {
            return Err(PrepError::Config(format!(
                "trending.default_limit {} must be between 1 and trending.max_limit {}",
                self.trending.default_limit, self.trending.max_limit
            )));
        }
        if TrendPeriod::parse(&self.trending.default_period).is_err() {
            return Err(PrepError::Config(format!(
                "trending.default_period {:?} must be day, week or month",
                self.trending.default_period
            )));
        }
        if self.compare.max_ids < 2 {
            return Err(PrepError::Config("compare.max_ids must be at least 2".to_string()));
        }
        if self.store.timeout_ms == 0 {
            return Err(PrepError::Config("store.timeout_ms must be positive".to_string()));
        }
        Ok(())
    }
}

/// How the tag facet picks its capped entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagFacetOrder {
    /// Descending occurrence count, ties by first appearance.
    #[default]
    Frequency,
    /// First appearance after de-duplication.
    FirstSeen,
}

/// Search request limits and facet behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Page size when the request omits `limit`.
    #[serde(default)]
    pub default_limit: usize,
    /// Largest accepted `limit`; larger values are rejected, not clamped.
    #[serde(default)]
    pub max_limit: usize,
    /// Maximum number of entries in the tag facet.
    #[serde(default)]
    pub tag_facet_cap: usize,
    /// Which tags survive the cap.
    #[serde(default)]
    pub tag_facet_order: TagFacetOrder,
    /// Global switch; when off, responses never carry facets.
    #[serde(default)]
    pub facets_enabled: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
            tag_facet_cap: 50,
            tag_facet_order: TagFacetOrder::Frequency,
            facets_enabled: true,
        }
    }
}

impl SearchConfig {
    fn merge(&mut self, patch: SearchPatch) {
        if let Some(value) = patch.default_limit {
            self.default_limit = value;
        }
        if let Some(value) = patch.max_limit {
            self.max_limit = value;
        }
        if let Some(value) = patch.tag_facet_cap {
            self.tag_facet_cap = value;
        }
        if let Some(value) = patch.tag_facet_order {
            self.tag_facet_order = value;
        }
        if let Some(value) = patch.facets_enabled {
            self.facets_enabled = value;
        }
    }
}

/// Business tuning constants for popularity, trending and engagement scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// `isPopular=true` keeps records with popularity strictly above this.
    #[serde(default)]
    pub popular_threshold: u64,
    /// Popularity score weights.
    #[serde(default)]
    pub popularity_weight: f64,
    #[serde(default)]
    pub rating_weight: f64,
    #[serde(default)]
    pub students_weight: f64,
    /// Trending score weights. Age in days is subtracted unweighted.
    #[serde(default)]
    pub trending_popularity_weight: f64,
    #[serde(default)]
    pub trending_rating_weight: f64,
    #[serde(default)]
    pub trending_students_weight: f64,
    /// Comparison engagement score weights.
    #[serde(default)]
    pub engagement_students_weight: f64,
    #[serde(default)]
    pub engagement_popularity_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            popular_threshold: 100,
            popularity_weight: 1.0,
            rating_weight: 10.0,
            students_weight: 0.1,
            trending_popularity_weight: 0.4,
            trending_rating_weight: 20.0,
            trending_students_weight: 0.1,
            engagement_students_weight: 0.1,
            engagement_popularity_weight: 0.01,
        }
    }
}

impl ScoringConfig {
    fn merge(&mut self, patch: ScoringPatch) {
        if let Some(value) = patch.popular_threshold {
            self.popular_threshold = value;
        }
        if let Some(value) = patch.popularity_weight {
            self.popularity_weight = value;
        }
        if let Some(value) = patch.rating_weight {
            self.rating_weight = value;
        }
        if let Some(value) = patch.students_weight {
            self.students_weight = value;
        }
        if let Some(value) = patch.trending_popularity_weight {
            self.trending_popularity_weight = value;
        }
        if let Some(value) = patch.trending_rating_weight {
            self.trending_rating_weight = value;
        }
        if let Some(value) = patch.trending_students_weight {
            self.trending_students_weight = value;
        }
        if let Some(value) = patch.engagement_students_weight {
            self.engagement_students_weight = value;
        }
        if let Some(value) = patch.engagement_popularity_weight {
            self.engagement_popularity_weight = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingConfig {
    /// `day`, `week` or `month`.
    #[serde(default)]
    pub default_period: String,
    #[serde(default)]
    pub default_limit: usize,
    #[serde(default)]
    pub max_limit: usize,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            default_period: "week".to_string(),
            default_limit: 10,
            max_limit: 50,
        }
    }
}

impl TrendingConfig {
    fn merge(&mut self, patch: TrendingPatch) {
        if let Some(value) = patch.default_period {
            self.default_period = value;
        }
        if let Some(value) = patch.default_limit {
            self.default_limit = value;
        }
        if let Some(value) = patch.max_limit {
            self.max_limit = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Most distinct ids one comparison accepts.
    #[serde(default)]
    pub max_ids: usize,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self { max_ids: 10 }
    }
}

impl CompareConfig {
    fn merge(&mut self, patch: ComparePatch) {
        if let Some(value) = patch.max_ids {
            self.max_ids = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Off by default: every search reads the store.
    #[serde(default)]
    pub enabled: bool,
    /// Maximum cached responses before least-recently-used eviction.
    #[serde(default)]
    pub capacity: usize,
    /// Upper bound on how stale a cached response may be.
    #[serde(default)]
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: 256,
            ttl_seconds: 60,
        }
    }
}

impl CacheConfig {
    fn merge(&mut self, patch: CachePatch) {
        if let Some(value) = patch.enabled {
            self.enabled = value;
        }
        if let Some(value) = patch.capacity {
            self.capacity = value;
        }
        if let Some(value) = patch.ttl_seconds {
            self.ttl_seconds = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Deadline for a single catalog store call.
    #[serde(default)]
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { timeout_ms: 5_000 }
    }
}

impl StoreConfig {
    fn merge(&mut self, patch: StorePatch) {
        if let Some(value) = patch.timeout_ms {
            self.timeout_ms = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub search: Option<SearchPatch>,
    pub scoring: Option<ScoringPatch>,
    pub trending: Option<TrendingPatch>,
    pub compare: Option<ComparePatch>,
    pub cache: Option<CachePatch>,
    pub store: Option<StorePatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SearchPatch {
    pub default_limit: Option<usize>,
    pub max_limit: Option<usize>,
    pub tag_facet_cap: Option<usize>,
    pub tag_facet_order: Option<TagFacetOrder>,
    pub facets_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ScoringPatch {
    pub popular_threshold: Option<u64>,
    pub popularity_weight: Option<f64>,
    pub rating_weight: Option<f64>,
    pub students_weight: Option<f64>,
    pub trending_popularity_weight: Option<f64>,
    pub trending_rating_weight: Option<f64>,
    pub trending_students_weight: Option<f64>,
    pub engagement_students_weight: Option<f64>,
    pub engagement_popularity_weight: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TrendingPatch {
    pub default_period: Option<String>,
    pub default_limit: Option<usize>,
    pub max_limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ComparePatch {
    pub max_ids: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CachePatch {
    pub enabled: Option<bool>,
    pub capacity: Option<usize>,
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StorePatch {
    pub timeout_ms: Option<u64>,
}

fn parse_tag_facet_order(value: &str) -> Result<TagFacetOrder> {
    match value.to_lowercase().as_str() {
        "frequency" => Ok(TagFacetOrder::Frequency),
        "first_seen" | "firstseen" | "first-seen" => Ok(TagFacetOrder::FirstSeen),
        _ => Err(PrepError::Config(format!(
            "invalid tag facet order {value} (expected frequency|first_seen)"
        ))),
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_bool(key: &str) -> Result<Option<bool>> {
    match std::env::var(key) {
        Ok(value) => match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(PrepError::Config(format!(
                "invalid {key} value {value}: expected true or false"
            ))),
        },
        Err(_) => Ok(None),
    }
}

fn env_usize(key: &str) -> Result<Option<usize>> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<usize>()
            .map(Some)
            .map_err(|err| PrepError::Config(format!("invalid {key} value {value}: {err}"))),
        Err(_) => Ok(None),
    }
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|err| PrepError::Config(format!("invalid {key} value {value}: {err}"))),
        Err(_) => Ok(None),
    }
}

fn env_f64(key: &str) -> Result<Option<f64>> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<f64>()
            .map(Some)
            .map_err(|err| PrepError::Config(format!("invalid {key} value {value}: {err}"))),
        Err(_) => Ok(None),
    }
}
