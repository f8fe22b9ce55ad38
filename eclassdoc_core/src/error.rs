use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum EclassError {
	#[error(transparent)]
	#[diagnostic(code(eclassdoc::io_error))]
	Io(#[from] std::io::Error),

	#[error("{header:?}, line {line}: missing {what}")]
	#[diagnostic(
		code(eclassdoc::empty_tag),
		help("add the missing text directly after the tag or on the following comment lines")
	)]
	EmptyTag {
		header: String,
		line: usize,
		what: &'static str,
	},

	#[error("{header:?}, line {line}: tag takes no args, got {got:?}")]
	#[diagnostic(
		code(eclassdoc::unexpected_args),
		help("flag tags only mark presence; move the text into a `@DESCRIPTION:` tag")
	)]
	UnexpectedArgs {
		header: String,
		line: usize,
		got: String,
	},

	#[error("{header:?}, line {line}: missing tag{}: {}", plural_suffix(.tags), quoted_list(.tags))]
	#[diagnostic(code(eclassdoc::missing_tags))]
	MissingTags {
		header: String,
		line: usize,
		tags: Vec<String>,
	},

	#[error("{text:?}, line {line}: text outside of any tag")]
	#[diagnostic(code(eclassdoc::untagged_line))]
	UntaggedLine { text: String, line: usize },

	#[error("line {line}: duplicate {marker} doc block")]
	#[diagnostic(
		code(eclassdoc::duplicate_block),
		help("an eclass may only describe itself once; merge the two `@{marker}:` blocks")
	)]
	DuplicateBlock { marker: &'static str, line: usize },

	#[error("failed dumping eclasses: {path:?}: {reason}")]
	#[diagnostic(
		code(eclassdoc::cache_write),
		help("check that the cache directory is writable or disable caching in eclassdoc.toml")
	)]
	CacheWrite { path: String, reason: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(eclassdoc::config_parse),
		help("check that eclassdoc.toml is valid TOML with an optional [cache] section")
	)]
	ConfigParse(String),
}

fn plural_suffix(items: &[String]) -> &'static str {
	if items.len() == 1 { "" } else { "s" }
}

fn quoted_list(items: &[String]) -> String {
	items
		.iter()
		.map(|item| format!("{item:?}"))
		.collect::<Vec<_>>()
		.join(", ")
}

impl EclassError {
	/// Whether this error comes from malformed documentation rather than the
	/// environment.
	pub fn is_parse_error(&self) -> bool {
		matches!(
			self,
			Self::EmptyTag { .. }
				| Self::UnexpectedArgs { .. }
				| Self::MissingTags { .. }
				| Self::UntaggedLine { .. }
				| Self::DuplicateBlock { .. }
		)
	}
}

pub type EclassResult<T> = Result<T, EclassError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
