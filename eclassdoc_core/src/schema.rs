use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

use crate::EclassError;
use crate::EclassResult;
use crate::FieldValue;

/// The kinds of documentation block an eclass may contain.
///
/// The set is closed: adding a block kind means adding a variant here along
/// with its tag table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlockKind {
	/// `@ECLASS:`, the eclass describing itself. Singular; its fields are
	/// merged into the top level of the document.
	Eclass,
	/// `@ECLASS-VARIABLE:`, a variable set or consumed by the eclass.
	EclassVariable,
	/// `@FUNCTION:`, a function exported by the eclass.
	Function,
	/// `@VARIABLE:`, a variable local to a documented function.
	FunctionVariable,
}

impl BlockKind {
	/// Every block kind in registration order.
	pub const ALL: [Self; 4] = [
		Self::Eclass,
		Self::EclassVariable,
		Self::Function,
		Self::FunctionVariable,
	];

	/// The marker following `@` on the line opening the block.
	pub fn marker(self) -> &'static str {
		match self {
			Self::Eclass => "ECLASS",
			Self::EclassVariable => "ECLASS-VARIABLE",
			Self::Function => "FUNCTION",
			Self::FunctionVariable => "VARIABLE",
		}
	}

	/// Look up a block kind by its exact marker.
	pub fn from_marker(marker: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|kind| kind.marker() == marker)
	}

	/// Singular blocks may appear at most once per document.
	pub fn singular(self) -> bool {
		matches!(self, Self::Eclass)
	}

	/// The document field that accumulates blocks of this kind. Singular
	/// blocks have none since they merge into the top level.
	pub fn field_name(self) -> Option<&'static str> {
		match self {
			Self::Eclass => None,
			Self::EclassVariable => Some(VARIABLES_FIELD),
			Self::Function => Some(FUNCTIONS_FIELD),
			Self::FunctionVariable => Some(FUNCTION_VARIABLES_FIELD),
		}
	}

	/// The registered tags for this block kind, in registration order.
	pub fn tags(self) -> &'static [TagRule] {
		match self {
			Self::Eclass => ECLASS_TAGS,
			Self::EclassVariable => ECLASS_VARIABLE_TAGS,
			Self::Function => FUNCTION_TAGS,
			Self::FunctionVariable => FUNCTION_VARIABLE_TAGS,
		}
	}

	/// Find the rule for an exact tag name such as `MAINTAINER:` or
	/// `INTERNAL`.
	pub fn tag(self, tag: &str) -> Option<&'static TagRule> {
		self.tags().iter().find(|rule| rule.tag == tag)
	}

	/// Tags that must appear in every block of this kind.
	pub fn required_tags(self) -> impl Iterator<Item = &'static TagRule> {
		self.tags().iter().filter(|rule| rule.required)
	}

	/// The compiled `^@(?P<tag>...)(?P<value>.*)` header pattern for this
	/// kind's tags. Built on first use.
	pub(crate) fn tag_pattern(self) -> &'static Regex {
		match self {
			Self::Eclass => &ECLASS_TAG_RE,
			Self::EclassVariable => &ECLASS_VARIABLE_TAG_RE,
			Self::Function => &FUNCTION_TAG_RE,
			Self::FunctionVariable => &FUNCTION_VARIABLE_TAG_RE,
		}
	}
}

impl fmt::Display for BlockKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.marker())
	}
}

/// Document field holding `@ECLASS-VARIABLE:` blocks.
pub const VARIABLES_FIELD: &str = "variables";
/// Document field holding `@FUNCTION:` blocks.
pub const FUNCTIONS_FIELD: &str = "functions";
/// Document field holding `@VARIABLE:` blocks.
pub const FUNCTION_VARIABLES_FIELD: &str = "function-variables";

/// A tag registered for one block kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRule {
	/// The literal tag name. A trailing `:` means the tag carries text; a
	/// bare name is a presence flag.
	pub tag: &'static str,
	/// Whether every block of this kind must contain the tag.
	pub required: bool,
	/// The output field the parsed value is stored under.
	pub field: &'static str,
	/// How the tag body is turned into a value.
	pub parser: TagParser,
}

impl TagRule {
	const fn optional(tag: &'static str, field: &'static str, parser: TagParser) -> Self {
		Self {
			tag,
			required: false,
			field,
			parser,
		}
	}

	const fn required(tag: &'static str, field: &'static str, parser: TagParser) -> Self {
		Self {
			tag,
			required: true,
			field,
			parser,
		}
	}

	/// The tag name as written in error messages, without the trailing `:`.
	pub fn display_name(&self) -> &'static str {
		self.tag.strip_suffix(':').unwrap_or(self.tag)
	}
}

/// Handler turning a tag's body lines into a [`FieldValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagParser {
	/// The first body line. `missing` names the absent content in errors.
	Text { missing: &'static str },
	/// Every body line; at least one is required.
	Lines { missing: &'static str },
	/// Every body line; an empty body is allowed.
	OptionalLines,
	/// Presence only. Any body text is an error.
	Flag,
	/// The whitespace separated words of the first body line.
	Words { missing: &'static str },
}

impl TagParser {
	/// Parse the body of one tag. `header` is the tag's header line and
	/// `line` its 1-based line number, both used for error reporting.
	pub fn parse(self, lines: &[String], header: &str, line: usize) -> EclassResult<FieldValue> {
		let empty = |what: &'static str| {
			EclassError::EmptyTag {
				header: header.to_string(),
				line,
				what,
			}
		};

		match self {
			Self::Text { missing } => {
				let first = lines.first().ok_or_else(|| empty(missing))?;
				Ok(FieldValue::Text(first.clone()))
			}
			Self::Lines { missing } => {
				if lines.is_empty() {
					return Err(empty(missing));
				}
				Ok(FieldValue::Lines(lines.to_vec()))
			}
			Self::OptionalLines => Ok(FieldValue::Lines(lines.to_vec())),
			Self::Flag => {
				if let Some(got) = lines.first() {
					return Err(EclassError::UnexpectedArgs {
						header: header.to_string(),
						line,
						got: got.clone(),
					});
				}
				Ok(FieldValue::Flag(true))
			}
			Self::Words { missing } => {
				let first = lines.first().ok_or_else(|| empty(missing))?;
				let words: BTreeSet<String> =
					first.split_whitespace().map(ToString::to_string).collect();
				Ok(FieldValue::Words(words))
			}
		}
	}
}

const DEPRECATED: TagRule = TagRule::optional(
	"DEPRECATED:",
	"deprecated",
	TagParser::Text {
		missing: "deprecated text",
	},
);

const DESCRIPTION: TagRule = TagRule::optional(
	"DESCRIPTION:",
	"description",
	TagParser::Lines {
		missing: "description",
	},
);

const fn flag(tag: &'static str, field: &'static str) -> TagRule {
	TagRule::optional(tag, field, TagParser::Flag)
}

static ECLASS_TAGS: &[TagRule] = &[
	TagRule::required("ECLASS:", "name", TagParser::Text {
		missing: "eclass name",
	}),
	TagRule::required("MAINTAINER:", "maintainers", TagParser::Lines {
		missing: "maintainers",
	}),
	TagRule::optional("AUTHOR:", "authors", TagParser::Lines { missing: "authors" }),
	TagRule::optional("BUGREPORTS:", "bugreports", TagParser::Lines {
		missing: "bug reporting info",
	}),
	TagRule::optional("VCSURL:", "vcsurl", TagParser::Text {
		missing: "vcs url",
	}),
	TagRule::required("BLURB:", "blurb", TagParser::Text {
		missing: "blurb text",
	}),
	DESCRIPTION,
	TagRule::optional("EXAMPLE:", "example", TagParser::Lines {
		missing: "examples",
	}),
	TagRule::optional("SUPPORTED_EAPIS:", "supported_eapis", TagParser::Words {
		missing: "supported EAPIs",
	}),
	DEPRECATED,
];

static ECLASS_VARIABLE_TAGS: &[TagRule] = &[
	TagRule::required("ECLASS-VARIABLE:", "name", TagParser::Text {
		missing: "eclass variable name",
	}),
	flag("DEFAULT_UNSET", "default_unset"),
	flag("INTERNAL", "internal"),
	flag("REQUIRED", "required"),
	flag("PRE_INHERIT", "pre_inherit"),
	flag("USER_VARIABLE", "user_variable"),
	flag("OUTPUT_VARIABLE", "output_variable"),
	DESCRIPTION,
	DEPRECATED,
];

static FUNCTION_TAGS: &[TagRule] = &[
	TagRule::required("FUNCTION:", "name", TagParser::Text {
		missing: "function name",
	}),
	// Phase overrides regularly omit usage, so an empty body is accepted.
	TagRule::optional("USAGE:", "usage", TagParser::OptionalLines),
	TagRule::optional("RETURN:", "return", TagParser::Text {
		missing: "return value",
	}),
	TagRule::optional("MAINTAINER:", "maintainers", TagParser::Lines {
		missing: "maintainers",
	}),
	flag("INTERNAL", "internal"),
	DESCRIPTION,
	DEPRECATED,
];

static FUNCTION_VARIABLE_TAGS: &[TagRule] = &[
	TagRule::optional("VARIABLE:", "name", TagParser::Text {
		missing: "variable name",
	}),
	flag("DEFAULT_UNSET", "default_unset"),
	flag("INTERNAL", "internal"),
	flag("REQUIRED", "required"),
	DESCRIPTION,
	DEPRECATED,
];

fn build_tag_pattern(kind: BlockKind) -> Regex {
	let mut tags: Vec<&str> = kind.tags().iter().map(|rule| rule.tag).collect();
	// Longest first so a tag never shadows another it is a prefix of.
	tags.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
	let alternation = tags
		.iter()
		.map(|tag| regex::escape(tag))
		.collect::<Vec<_>>()
		.join("|");

	Regex::new(&format!("^@(?P<tag>{alternation})(?P<value>.*)"))
		.unwrap_or_else(|e| panic!("invalid tag pattern for {kind}: {e}"))
}

static ECLASS_TAG_RE: LazyLock<Regex> = LazyLock::new(|| build_tag_pattern(BlockKind::Eclass));
static ECLASS_VARIABLE_TAG_RE: LazyLock<Regex> =
	LazyLock::new(|| build_tag_pattern(BlockKind::EclassVariable));
static FUNCTION_TAG_RE: LazyLock<Regex> = LazyLock::new(|| build_tag_pattern(BlockKind::Function));
static FUNCTION_VARIABLE_TAG_RE: LazyLock<Regex> =
	LazyLock::new(|| build_tag_pattern(BlockKind::FunctionVariable));

/// Matches a comment line opening a documentation block, capturing the
/// comment leader as `prefix` and the block marker as `marker`.
pub(crate) static BLOCK_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
	let mut markers: Vec<&str> = BlockKind::ALL.iter().map(|kind| kind.marker()).collect();
	markers.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
	let alternation = markers
		.iter()
		.map(|marker| regex::escape(marker))
		.collect::<Vec<_>>()
		.join("|");

	Regex::new(&format!(
		r"^(?P<prefix>\s*#)\s*@(?P<marker>{alternation}):(?P<value>.*)"
	))
	.unwrap_or_else(|e| panic!("invalid block marker pattern: {e}"))
});
