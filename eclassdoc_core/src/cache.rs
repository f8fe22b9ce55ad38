use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

use crate::Eclass;
use crate::EclassError;
use crate::EclassResult;
use crate::EclassdocConfig;

/// Current layout version of the persisted eclass cache. Bump whenever the
/// serialized form of [`Eclass`] changes.
pub const CACHE_VERSION: u32 = 2;
/// File name of the persisted eclass cache inside the cache directory.
pub const CACHE_FILE_NAME: &str = "eclass-v2.json";

/// Mapping from eclass name to its parsed documentation.
pub type EclassMap = BTreeMap<String, Eclass>;

#[derive(Deserialize)]
struct VersionProbe {
	version: Option<u32>,
}

#[derive(Serialize)]
struct CacheFileRef<'a> {
	version: u32,
	eclasses: &'a EclassMap,
}

#[derive(Deserialize)]
struct CacheFile {
	version: u32,
	eclasses: EclassMap,
}

/// Location and expected version of a persisted eclass cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStore {
	path: PathBuf,
	version: u32,
}

/// Outcome of reading the cache file without trusting it.
enum Probe {
	Missing,
	Valid(EclassMap),
	Invalid(String),
}

impl CacheStore {
	pub fn new(path: impl Into<PathBuf>, version: u32) -> Self {
		Self {
			path: path.into(),
			version,
		}
	}

	/// The cache for the repository at `root`, placed according to `config`.
	pub fn for_repo(root: &Path, config: &EclassdocConfig) -> Self {
		Self::new(
			root.join(&config.cache.dir).join(CACHE_FILE_NAME),
			CACHE_VERSION,
		)
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn version(&self) -> u32 {
		self.version
	}

	fn probe(&self) -> Probe {
		let bytes = match std::fs::read(&self.path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Probe::Missing,
			Err(e) => return Probe::Invalid(format!("unreadable: {e}")),
		};

		let version = match serde_json::from_slice::<VersionProbe>(&bytes) {
			Ok(probe) => probe.version,
			Err(e) => return Probe::Invalid(format!("corrupt: {e}")),
		};
		match version {
			Some(version) if version == self.version => {}
			Some(version) => {
				return Probe::Invalid(format!(
					"outdated version {version}, expected {}",
					self.version
				));
			}
			None => return Probe::Invalid("missing version marker".to_string()),
		}

		match serde_json::from_slice::<CacheFile>(&bytes) {
			Ok(file) if file.version == self.version => Probe::Valid(file.eclasses),
			Ok(_) => Probe::Invalid("version changed while reading".to_string()),
			Err(e) => Probe::Invalid(format!("corrupt: {e}")),
		}
	}

	/// Load the persisted eclasses.
	///
	/// Returns `None` when no cache exists. A cache that cannot be read,
	/// fails to deserialize, or carries a different version is removed and
	/// also reported as `None`, forcing a full rebuild.
	pub fn load(&self) -> Option<EclassMap> {
		match self.probe() {
			Probe::Missing => None,
			Probe::Valid(eclasses) => Some(eclasses),
			Probe::Invalid(reason) => {
				tracing::debug!(
					path = %self.path.display(),
					"forcing eclass cache regen: {reason}"
				);
				self.remove_stale();
				None
			}
		}
	}

	fn remove_stale(&self) {
		if let Err(e) = std::fs::remove_file(&self.path) {
			if e.kind() != ErrorKind::NotFound {
				tracing::debug!(path = %self.path.display(), "failed removing stale cache: {e}");
			}
		}
	}

	/// Persist `eclasses`, replacing any previous cache.
	///
	/// The payload is written to a sibling temporary file and renamed over
	/// the cache so an interrupted write never leaves a partial file at the
	/// cache path.
	pub fn save(&self, eclasses: &EclassMap) -> EclassResult<()> {
		let write_error = |reason: String| {
			EclassError::CacheWrite {
				path: self.path.display().to_string(),
				reason,
			}
		};

		if let Some(cache_dir) = self.path.parent() {
			std::fs::create_dir_all(cache_dir).map_err(|e| write_error(e.to_string()))?;
		}

		let payload = serde_json::to_vec(&CacheFileRef {
			version: self.version,
			eclasses,
		})
		.map_err(|e| write_error(e.to_string()))?;

		let temp_path = self.path.with_extension(format!(
			"json.tmp-{}-{}",
			std::process::id(),
			SystemTime::now()
				.duration_since(UNIX_EPOCH)
				.map_or(0, |duration| duration.as_nanos())
		));

		std::fs::write(&temp_path, payload).map_err(|e| {
			let _ = std::fs::remove_file(&temp_path);
			write_error(e.to_string())
		})?;

		std::fs::rename(&temp_path, &self.path).map_err(|e| {
			let _ = std::fs::remove_file(&temp_path);
			write_error(e.to_string())
		})?;

		tracing::debug!(
			path = %self.path.display(),
			entries = eclasses.len(),
			"saved eclass cache"
		);

		Ok(())
	}

	/// Delete the cache file. Returns whether a file was removed.
	pub fn clear(&self) -> EclassResult<bool> {
		match std::fs::remove_file(&self.path) {
			Ok(()) => Ok(true),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
			Err(e) => Err(e.into()),
		}
	}

	/// Inspect the cache file without modifying it.
	pub fn inspect(&self) -> CacheInspection {
		let mut inspection = CacheInspection {
			path: self.path.clone(),
			exists: self.path.is_file(),
			readable: false,
			version: None,
			version_supported: false,
			valid: false,
			entries: 0,
		};

		if !inspection.exists {
			return inspection;
		}

		let Ok(bytes) = std::fs::read(&self.path) else {
			return inspection;
		};
		inspection.readable = true;

		let Ok(probe) = serde_json::from_slice::<VersionProbe>(&bytes) else {
			return inspection;
		};
		inspection.version = probe.version;
		inspection.version_supported = probe.version == Some(self.version);

		let Ok(file) = serde_json::from_slice::<CacheFile>(&bytes) else {
			return inspection;
		};
		inspection.valid = inspection.version_supported;
		inspection.entries = file.eclasses.len();
		inspection
	}
}

/// Read-only health report for an eclass cache file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct CacheInspection {
	/// Path of the cache file.
	pub path: PathBuf,
	/// Whether a file exists at the path.
	pub exists: bool,
	/// Whether the file could be read.
	pub readable: bool,
	/// Version marker found in the file, if any.
	pub version: Option<u32>,
	/// Whether the version marker matches the expected version.
	pub version_supported: bool,
	/// Whether the file would be accepted by [`CacheStore::load`].
	pub valid: bool,
	/// Number of cached eclasses when the file parsed.
	pub entries: usize,
}
