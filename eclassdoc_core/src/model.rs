use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use derive_more::Deref;
use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;

use crate::EclassResult;
use crate::document::parse_document;
use crate::schema::FUNCTION_VARIABLES_FIELD;
use crate::schema::FUNCTIONS_FIELD;
use crate::schema::VARIABLES_FIELD;

/// The parsed value of a single documentation tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
	/// Single line of text, e.g. `@BLURB:`.
	Text(String),
	/// Ordered body lines, e.g. `@MAINTAINER:` or `@DESCRIPTION:`.
	Lines(Vec<String>),
	/// Presence of a flag tag such as `@INTERNAL`.
	Flag(bool),
	/// Unordered word set, e.g. `@SUPPORTED_EAPIS:`.
	Words(BTreeSet<String>),
}

impl FieldValue {
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text),
			_ => None,
		}
	}

	pub fn as_lines(&self) -> Option<&[String]> {
		match self {
			Self::Lines(lines) => Some(lines),
			_ => None,
		}
	}

	pub fn as_words(&self) -> Option<&BTreeSet<String>> {
		match self {
			Self::Words(words) => Some(words),
			_ => None,
		}
	}

	pub fn is_set(&self) -> bool {
		matches!(self, Self::Flag(true))
	}
}

/// Field name to value mapping produced by parsing one block.
pub type BlockData = BTreeMap<String, FieldValue>;

/// A top level document entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocValue {
	/// A field contributed by the singular `@ECLASS:` block.
	Field(FieldValue),
	/// Every block of one repeatable kind, in document order.
	Blocks(Vec<BlockData>),
}

impl DocValue {
	pub fn as_field(&self) -> Option<&FieldValue> {
		match self {
			Self::Field(value) => Some(value),
			Self::Blocks(_) => None,
		}
	}

	pub fn as_blocks(&self) -> Option<&[BlockData]> {
		match self {
			Self::Blocks(blocks) => Some(blocks),
			Self::Field(_) => None,
		}
	}
}

/// The merged documentation of one eclass, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EclassData(pub(crate) BTreeMap<String, DocValue>);

impl EclassData {
	/// Look up a top level field of the `@ECLASS:` block.
	pub fn field(&self, name: &str) -> Option<&FieldValue> {
		self.0.get(name).and_then(DocValue::as_field)
	}

	/// All blocks accumulated under `name`, or an empty slice.
	pub fn blocks(&self, name: &str) -> &[BlockData] {
		self.0
			.get(name)
			.and_then(DocValue::as_blocks)
			.unwrap_or_default()
	}

	fn block_names(&self, name: &str) -> Vec<&str> {
		self.blocks(name)
			.iter()
			.filter_map(|block| block.get("name").and_then(FieldValue::as_text))
			.collect()
	}

	/// A view serializing this document without variant tags, for output
	/// meant to be read by people and scripts rather than reloaded.
	pub fn plain(&self) -> PlainData<'_> {
		PlainData(self)
	}

	pub fn into_inner(self) -> BTreeMap<String, DocValue> {
		self.0
	}
}

/// Untagged serialization of [`EclassData`]. Text becomes a string, lines and
/// words become arrays, flags become booleans and block lists become arrays
/// of objects.
#[derive(Debug, Clone, Copy)]
pub struct PlainData<'a>(&'a EclassData);

impl Serialize for PlainData<'_> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_map(self.0.iter().map(|(name, value)| (name, PlainDoc(value))))
	}
}

struct PlainDoc<'a>(&'a DocValue);

impl Serialize for PlainDoc<'_> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self.0 {
			DocValue::Field(value) => PlainField(value).serialize(serializer),
			DocValue::Blocks(blocks) => serializer.collect_seq(blocks.iter().map(PlainBlock)),
		}
	}
}

struct PlainBlock<'a>(&'a BlockData);

impl Serialize for PlainBlock<'_> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_map(self.0.iter().map(|(name, value)| (name, PlainField(value))))
	}
}

struct PlainField<'a>(&'a FieldValue);

impl Serialize for PlainField<'_> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self.0 {
			FieldValue::Text(text) => serializer.serialize_str(text),
			FieldValue::Lines(lines) => lines.serialize(serializer),
			FieldValue::Flag(set) => serializer.serialize_bool(*set),
			FieldValue::Words(words) => words.serialize(serializer),
		}
	}
}

impl From<BTreeMap<String, DocValue>> for EclassData {
	fn from(value: BTreeMap<String, DocValue>) -> Self {
		Self(value)
	}
}

/// Parsed documentation for one eclass file.
///
/// An `Eclass` records the modification time its file had when it was
/// parsed. It is never updated in place: once the file changes, the value is
/// stale and is replaced by a fresh parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eclass {
	path: PathBuf,
	mtime: u64,
	data: EclassData,
}

impl Eclass {
	/// Read and parse the eclass at `path`.
	///
	/// The modification time is captured before the content is read so a
	/// concurrent edit makes the entry look stale rather than current.
	pub fn from_path(path: impl AsRef<Path>) -> EclassResult<Self> {
		let path = path.as_ref();
		let mtime = file_mtime(path)?;
		let content = std::fs::read_to_string(path)?;
		let data = parse_document(&content)?;
		tracing::trace!(path = %path.display(), mtime, "parsed eclass docs");

		Ok(Self {
			path: path.to_path_buf(),
			mtime,
			data,
		})
	}

	/// Assemble an eclass from already parsed data.
	pub fn new(path: impl Into<PathBuf>, mtime: u64, data: EclassData) -> Self {
		Self {
			path: path.into(),
			mtime,
			data,
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Modification time of the source file at parse time, in nanoseconds
	/// since the Unix epoch.
	pub fn mtime(&self) -> u64 {
		self.mtime
	}

	pub fn data(&self) -> &EclassData {
		&self.data
	}

	pub fn get(&self, field: &str) -> Option<&DocValue> {
		self.data.get(field)
	}

	/// The name declared by `@ECLASS:`.
	pub fn name(&self) -> Option<&str> {
		self.data.field("name").and_then(FieldValue::as_text)
	}

	pub fn blurb(&self) -> Option<&str> {
		self.data.field("blurb").and_then(FieldValue::as_text)
	}

	pub fn maintainers(&self) -> &[String] {
		self.data
			.field("maintainers")
			.and_then(FieldValue::as_lines)
			.unwrap_or_default()
	}

	pub fn supported_eapis(&self) -> Option<&BTreeSet<String>> {
		self.data
			.field("supported_eapis")
			.and_then(FieldValue::as_words)
	}

	/// The replacement suggested by `@DEPRECATED:`, if the eclass is
	/// deprecated.
	pub fn deprecated(&self) -> Option<&str> {
		self.data.field("deprecated").and_then(FieldValue::as_text)
	}

	/// Names of documented functions in document order.
	pub fn functions(&self) -> Vec<&str> {
		self.data.block_names(FUNCTIONS_FIELD)
	}

	/// Names of documented eclass variables in document order.
	pub fn variables(&self) -> Vec<&str> {
		self.data.block_names(VARIABLES_FIELD)
	}

	/// Names of documented function-local variables in document order.
	pub fn function_variables(&self) -> Vec<&str> {
		self.data.block_names(FUNCTION_VARIABLES_FIELD)
	}

	pub fn documents_function(&self, name: &str) -> bool {
		self.functions().contains(&name)
	}

	pub fn documents_variable(&self, name: &str) -> bool {
		self.variables().contains(&name)
	}

	/// Functions marked `@INTERNAL`.
	pub fn internal_functions(&self) -> Vec<&str> {
		self.data
			.blocks(FUNCTIONS_FIELD)
			.iter()
			.filter(|block| block.get("internal").is_some_and(FieldValue::is_set))
			.filter_map(|block| block.get("name").and_then(FieldValue::as_text))
			.collect()
	}
}

/// Modification time of `path` in nanoseconds since the Unix epoch.
pub fn file_mtime(path: &Path) -> EclassResult<u64> {
	let modified = std::fs::metadata(path)?.modified()?;
	Ok(modified
		.duration_since(UNIX_EPOCH)
		.ok()
		.and_then(|duration| duration.as_nanos().try_into().ok())
		.unwrap_or(0))
}
