use std::collections::BTreeMap;
use std::path::PathBuf;

use derive_more::Deref;
use serde::Serialize;

use crate::CacheStore;
use crate::Eclass;
use crate::EclassMap;
use crate::EclassResult;
use crate::model::file_mtime;

/// Eclass name to file path for every eclass currently present in the
/// repository.
pub type LiveEclasses = BTreeMap<String, PathBuf>;

/// The eclasses whose cache entries changed during one reconciliation. Each
/// list is sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheChanges {
	/// Entries dropped because their file disappeared or no longer parses.
	pub removed: Vec<String>,
	/// Eclasses parsed for the first time.
	pub added: Vec<String>,
	/// Eclasses re-parsed after their file changed.
	pub updated: Vec<String>,
	/// Eclasses that could not be read or parsed. They are retried on the
	/// next run.
	pub failed: Vec<String>,
}

impl CacheChanges {
	/// Whether the cached mapping differs from what was loaded.
	pub fn is_dirty(&self) -> bool {
		!(self.removed.is_empty() && self.added.is_empty() && self.updated.is_empty())
	}

	/// Number of eclasses parsed during this pass, successful or not.
	pub fn parsed_count(&self) -> usize {
		self.added.len() + self.updated.len() + self.failed.len()
	}
}

/// The reconciled documentation of every known eclass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, Serialize)]
#[serde(transparent)]
pub struct EclassRepo(EclassMap);

impl EclassRepo {
	pub fn new(eclasses: EclassMap) -> Self {
		Self(eclasses)
	}

	/// Name of the first eclass (by name) documenting `function`.
	pub fn function_owner(&self, function: &str) -> Option<&str> {
		self.0
			.iter()
			.find(|(_, eclass)| eclass.documents_function(function))
			.map(|(name, _)| name.as_str())
	}

	/// Name of the first eclass (by name) documenting the eclass variable
	/// `variable`.
	pub fn variable_owner(&self, variable: &str) -> Option<&str> {
		self.0
			.iter()
			.find(|(_, eclass)| eclass.documents_variable(variable))
			.map(|(name, _)| name.as_str())
	}

	pub fn into_inner(self) -> EclassMap {
		self.0
	}
}

impl From<EclassMap> for EclassRepo {
	fn from(value: EclassMap) -> Self {
		Self(value)
	}
}

/// Result of bringing a cache up to date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
	pub repo: EclassRepo,
	pub changes: CacheChanges,
	/// Whether the updated mapping was written to the cache store.
	pub persisted: bool,
}

/// Bring `previous` in line with the eclasses in `live`.
///
/// Entries whose backing file is gone are dropped. Every live eclass whose
/// file modification time (or path) differs from its cached entry, or that
/// has no entry, is parsed again. Parse and read failures are not fatal: the
/// eclass is left out of the result and reported in
/// [`CacheChanges::failed`].
pub fn reconcile(previous: EclassMap, live: &LiveEclasses) -> Reconciliation {
	let mut eclasses = previous;
	let mut changes = CacheChanges::default();

	eclasses.retain(|name, eclass| {
		let exists = eclass.path().exists();
		if !exists {
			tracing::debug!(eclass = %name, "dropping removed eclass");
			changes.removed.push(name.clone());
		}
		exists
	});

	for (name, path) in live {
		let current_mtime = file_mtime(path).ok();
		let is_current = eclasses.get(name).is_some_and(|cached| {
			Some(cached.mtime()) == current_mtime && cached.path() == path.as_path()
		});
		if is_current {
			continue;
		}

		match Eclass::from_path(path) {
			Ok(eclass) => {
				if eclasses.insert(name.clone(), eclass).is_some() {
					changes.updated.push(name.clone());
				} else {
					changes.added.push(name.clone());
				}
			}
			Err(e) => {
				tracing::debug!(eclass = %name, path = %path.display(), "skipping eclass: {e}");
				if eclasses.remove(name).is_some() {
					changes.removed.push(name.clone());
				}
				changes.failed.push(name.clone());
			}
		}
	}

	changes.removed.sort();

	Reconciliation {
		repo: EclassRepo(eclasses),
		changes,
		persisted: false,
	}
}

/// Load the cache in `store`, reconcile it against `live` and persist the
/// result if anything changed.
///
/// With `force` the persisted cache is ignored and every eclass is parsed.
#[tracing::instrument(skip_all, fields(cache = %store.path().display(), force = force))]
pub fn update_cache(
	store: &CacheStore,
	live: &LiveEclasses,
	force: bool,
) -> EclassResult<Reconciliation> {
	let previous = if force {
		EclassMap::new()
	} else {
		store.load().unwrap_or_default()
	};

	let mut reconciliation = reconcile(previous, live);
	if reconciliation.changes.is_dirty() {
		store.save(&reconciliation.repo)?;
		reconciliation.persisted = true;
	}

	tracing::debug!(
		removed = reconciliation.changes.removed.len(),
		added = reconciliation.changes.added.len(),
		updated = reconciliation.changes.updated.len(),
		failed = reconciliation.changes.failed.len(),
		"eclass cache reconciled"
	);

	Ok(reconciliation)
}
