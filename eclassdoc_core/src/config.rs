use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::EclassError;
use crate::EclassResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"eclassdoc.toml",
	".eclassdoc.toml",
	".config/eclassdoc.toml",
];

/// Default cache directory relative to the repository root.
pub const DEFAULT_CACHE_DIR: &str = ".eclassdoc/cache";

/// Default eclass directory relative to the repository root.
pub const DEFAULT_ECLASS_DIR: &str = "eclass";

/// Configuration loaded from an `eclassdoc.toml` file.
///
/// ```toml
/// eclass_dir = "eclass"
///
/// [cache]
/// enabled = true
/// dir = ".eclassdoc/cache"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EclassdocConfig {
	/// Directory holding the `*.eclass` files, relative to the repository
	/// root.
	#[serde(default = "default_eclass_dir")]
	pub eclass_dir: PathBuf,
	/// Documentation cache settings.
	#[serde(default)]
	pub cache: CacheConfig,
}

impl Default for EclassdocConfig {
	fn default() -> Self {
		Self {
			eclass_dir: default_eclass_dir(),
			cache: CacheConfig::default(),
		}
	}
}

/// Configuration for the persisted documentation cache.
///
/// ```toml
/// [cache]
/// enabled = false
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
	/// When false, every run parses all eclasses and nothing is persisted.
	#[serde(default = "default_true")]
	pub enabled: bool,
	/// Cache directory relative to the repository root.
	#[serde(default = "default_cache_dir")]
	pub dir: PathBuf,
}

impl Default for CacheConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			dir: default_cache_dir(),
		}
	}
}

fn default_true() -> bool {
	true
}

fn default_cache_dir() -> PathBuf {
	PathBuf::from(DEFAULT_CACHE_DIR)
}

fn default_eclass_dir() -> PathBuf {
	PathBuf::from(DEFAULT_ECLASS_DIR)
}

impl EclassdocConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> EclassResult<Option<Self>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config: Self =
			toml::from_str(&content).map_err(|e| EclassError::ConfigParse(e.to_string()))?;

		Ok(Some(config))
	}

	/// Load the config at `root`, falling back to defaults when absent.
	pub fn load_or_default(root: &Path) -> EclassResult<Self> {
		Ok(Self::load(root)?.unwrap_or_default())
	}
}
