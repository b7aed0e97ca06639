//! Configuration model and configuration file resolution
//!
//! Every section deserializes with `#[serde(default)]`, so a partial file (or no
//! file at all) yields the compiled defaults for whatever is not given.
//!
//! **Resolution order** for the configuration file:
//! 1. Explicit path (command-line argument)
//! 2. `MANATCG_CONFIG` environment variable
//! 3. `<user config dir>/manatcg/config.toml`
//! 4. Compiled defaults

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "MANATCG_CONFIG";

/// Default authority service endpoint
pub const DEFAULT_AUTHORITY_URL: &str = "https://api.scryfall.com";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Scoring weights and confidence thresholds
    pub policy: MatchPolicy,
    /// Set-name alias tables
    pub aliases: AliasConfig,
    /// Reference dataset content filters
    pub filters: FilterConfig,
    /// External authority verification
    pub verifier: VerifierConfig,
    /// Deferred review settings
    pub review: ReviewConfig,
    /// Output record settings
    pub output: OutputConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

// ============================================================================
// Matching policy
// ============================================================================

/// How aggressively the scorer skips reference records before scoring them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PruneStrictness {
    /// Skip only when neither the first character nor any word overlaps
    #[default]
    Standard,
    /// First characters must agree; single-word names must be equal;
    /// multi-word names must share a word
    Strict,
    /// Score every record
    Off,
}

/// Additive score adjustments used by the candidate scorer
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Bonus when one name contains the other
    pub substring_bonus: i32,
    /// Bonus when normalized set names are equal
    pub set_match_bonus: i32,
    /// Bonus when either collector number is unknown
    pub number_unknown_bonus: i32,
    /// Bonus when both collector numbers are known and equal
    pub number_match_bonus: i32,
    /// Penalty when both collector numbers are known and differ
    pub number_mismatch_penalty: i32,
    /// Bonus for identical condition rank
    pub condition_same_bonus: i32,
    /// Penalty for adjacent condition ranks
    pub condition_adjacent_penalty: i32,
    /// Penalty for condition ranks two or more apart
    pub condition_far_penalty: i32,
    /// Penalty for differing, unrecognized condition strings
    pub condition_unknown_penalty: i32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            substring_bonus: 20,
            set_match_bonus: 50,
            number_unknown_bonus: 50,
            number_match_bonus: 100,
            number_mismatch_penalty: 15,
            condition_same_bonus: 50,
            condition_adjacent_penalty: 10,
            condition_far_penalty: 30,
            condition_unknown_penalty: 20,
        }
    }
}

/// Matching thresholds and heuristics
///
/// The numbers are empirically chosen; they are kept here so a run can
/// override them without a rebuild.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MatchPolicy {
    /// Top score that auto-confirms a reference record outright
    pub auto_confirm_score: i32,
    /// Top score that auto-confirms when the runner-up trails by `margin`
    pub margin_confirm_score: i32,
    /// Required lead over the runner-up for the margin rule
    pub margin: i32,
    /// Minimum score for auto-confirming an authority-synthesized record
    pub authority_floor: i32,
    /// Score assigned to an authority-synthesized candidate
    pub synthesized_score: i32,
    /// Consult the authority when the top local score is below this
    pub verify_below: i32,
    /// Synthesize a candidate when the top local score is below this
    pub synthesize_below: i32,
    /// Auto-confirm threshold on the token path
    pub token_confirm_score: i32,
    /// Pruning strictness
    pub prune: PruneStrictness,
    /// Score adjustments
    pub weights: ScoreWeights,
    /// Penalty per special-print term present on exactly one side
    pub special_print_penalties: BTreeMap<String, i32>,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        let special_print_penalties = [
            ("foil", 40),
            ("showcase", 30),
            ("etched", 30),
            ("borderless", 30),
            ("extended", 30),
            ("gilded", 30),
        ]
        .into_iter()
        .map(|(term, penalty)| (term.to_string(), penalty))
        .collect();

        Self {
            auto_confirm_score: 270,
            margin_confirm_score: 260,
            margin: 30,
            authority_floor: 350,
            synthesized_score: 350,
            verify_below: 260,
            synthesize_below: 300,
            token_confirm_score: 250,
            prune: PruneStrictness::default(),
            weights: ScoreWeights::default(),
            special_print_penalties,
        }
    }
}

// ============================================================================
// Aliases and filters
// ============================================================================

/// Set-name alias tables
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AliasConfig {
    /// Raw set name → canonical set name, substituted before normalization
    pub sets: BTreeMap<String, String>,
    /// Normalized set name → authority set code
    pub set_codes: BTreeMap<String, String>,
    /// Normalized set names denoting the universal reprint set
    pub universal_reprint_sets: Vec<String>,
}

impl Default for AliasConfig {
    fn default() -> Self {
        let sets = [
            (
                "Universes Beyond: The Lord of the Rings: Tales of Middle-earth",
                "LTR",
            ),
            ("Commander: The Lord of the Rings: Tales of Middle-earth", "LTC"),
            ("the list", "The List"),
            ("edge of eternities", "eoe"),
            ("EOE", "eoe"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

        let set_codes = [("the list reprints", "plst")]
            .into_iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();

        Self {
            sets,
            set_codes,
            universal_reprint_sets: vec![
                "plst".to_string(),
                "the list".to_string(),
                "the list reprints".to_string(),
            ],
        }
    }
}

/// Reference dataset content filters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Drop rows whose product name mentions a prerelease
    pub exclude_prerelease: bool,
    /// Drop rows whose product name matches a promo pattern
    pub exclude_promo: bool,
    /// Case-insensitive regular expressions for the promo filter
    pub promo_patterns: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            exclude_prerelease: false,
            exclude_promo: false,
            promo_patterns: [
                r"\(Bundle\)",
                r"\(Buyabox\)",
                r"\(Buy-a-[Bb]ox\)",
                r"\(Promo\)",
                r"\(Release\)",
                r"\(Launch\)",
                r"\(Store Championship\)",
                r"\(Game Day\)",
                r"\(FNM\)",
                r"\(Judge\)",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
        }
    }
}

// ============================================================================
// Verifier, review, output, logging
// ============================================================================

/// External authority verification settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Consult the authority at all
    pub enabled: bool,
    /// Authority base URL
    pub base_url: String,
    /// Minimum interval between any two requests (process-wide)
    pub min_interval_ms: u64,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Upper bound on in-flight verification lookups
    pub max_concurrency: usize,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_AUTHORITY_URL.to_string(),
            min_interval_ms: 100,
            timeout_secs: 10,
            max_concurrency: 4,
            user_agent: format!("manatcg/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Which decision surface resolves deferred items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSurfaceKind {
    /// Full-screen terminal UI, falling back to text prompts
    #[default]
    Interactive,
    /// Line-oriented prompts on stdin/stdout
    Text,
    /// Confirm every deferred item with its top candidate
    AutoTop,
    /// Skip every deferred item
    SkipAll,
}

/// Deferred review settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Decision surface
    pub surface: ReviewSurfaceKind,
    /// Number of ranked candidates shown per item
    pub display_limit: usize,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            surface: ReviewSurfaceKind::default(),
            display_limit: 5,
        }
    }
}

/// Output record settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Price used when neither reference nor source carries a positive price
    pub floor_price: f64,
    /// Product line written on entries that have no reference row
    pub product_line: String,
    /// Prefix of the timestamped output directory
    pub directory_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            floor_price: 0.10,
            product_line: "Magic: The Gathering".to_string(),
            directory_prefix: "converted_output".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Append logs to this file instead of stderr
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl TomlConfig {
    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read TOML failed ({}): {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.review.display_limit == 0 {
            return Err(Error::Config("review.display_limit must be at least 1".to_string()));
        }
        if self.verifier.max_concurrency == 0 {
            return Err(Error::Config("verifier.max_concurrency must be at least 1".to_string()));
        }
        if self.verifier.timeout_secs == 0 {
            return Err(Error::Config("verifier.timeout_secs must be at least 1".to_string()));
        }
        if !self.output.floor_price.is_finite() || self.output.floor_price < 0.0 {
            return Err(Error::Config(format!(
                "output.floor_price must be a non-negative number, got {}",
                self.output.floor_price
            )));
        }
        Ok(())
    }
}

/// Per-user default configuration file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("manatcg").join("config.toml"))
}

/// Load configuration following the resolution order
///
/// An explicit path (argument or environment variable) must be readable and
/// valid. The per-user default file is optional: when it is missing or broken
/// the compiled defaults are used and a warning is logged.
pub fn load_config(cli_path: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = cli_path {
        info!("Loading configuration from {}", path.display());
        return TomlConfig::load(path);
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            info!("Loading configuration from {} ({})", path, CONFIG_ENV_VAR);
            return TomlConfig::load(Path::new(&path));
        }
    }

    if let Some(path) = default_config_path() {
        if path.exists() {
            match TomlConfig::load(&path) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    return Ok(config);
                }
                Err(e) => {
                    warn!("Ignoring configuration at {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(TomlConfig::default())
}
