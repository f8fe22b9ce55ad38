use std::collections::BTreeSet;

use crate::BlockData;
use crate::BlockKind;
use crate::EclassError;
use crate::EclassResult;
use crate::TagRule;

/// One tag occurrence collected while splitting a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawBlock {
	pub rule: &'static TagRule,
	pub header: String,
	pub line: usize,
	pub body: Vec<String>,
}

/// Split the de-prefixed `lines` of one block into per-tag sections.
///
/// A line matching the kind's tag pattern opens a new section whose body
/// starts with the trimmed text following the tag. Every other line is
/// appended verbatim to the most recently opened section.
pub(crate) fn split_tags(
	kind: BlockKind,
	lines: &[String],
	first_line: usize,
) -> EclassResult<Vec<RawBlock>> {
	let pattern = kind.tag_pattern();
	let mut raw_blocks: Vec<RawBlock> = Vec::new();

	for (offset, line) in lines.iter().enumerate() {
		let line_number = first_line + offset;
		let Some(captures) = pattern.captures(line) else {
			let Some(current) = raw_blocks.last_mut() else {
				return Err(EclassError::UntaggedLine {
					text: line.clone(),
					line: line_number,
				});
			};
			current.body.push(line.clone());
			continue;
		};

		let tag = &captures["tag"];
		let Some(rule) = kind.tag(tag) else {
			// The pattern is generated from this table.
			return Err(EclassError::UntaggedLine {
				text: line.clone(),
				line: line_number,
			});
		};
		let value = captures["value"].trim();

		raw_blocks.push(RawBlock {
			rule,
			header: line.clone(),
			line: line_number,
			body: if value.is_empty() {
				Vec::new()
			} else {
				vec![value.to_string()]
			},
		});
	}

	Ok(raw_blocks)
}

/// Parse one documentation block of the given kind.
///
/// `lines` are the block's comment lines with the comment leader removed and
/// `first_line` is the 1-based file line of `lines[0]`. Any tag failing to
/// parse aborts the block; afterwards every required tag must have been
/// seen.
pub fn parse_block(kind: BlockKind, lines: &[String], first_line: usize) -> EclassResult<BlockData> {
	let raw_blocks = split_tags(kind, lines, first_line)?;
	let mut missing: BTreeSet<&'static str> = kind.required_tags().map(|rule| rule.tag).collect();
	let mut data = BlockData::new();

	for raw in &raw_blocks {
		missing.remove(raw.rule.tag);
		let value = raw.rule.parser.parse(&raw.body, &raw.header, raw.line)?;
		data.insert(raw.rule.field.to_string(), value);
	}

	if !missing.is_empty() {
		// Report in registration order rather than set order.
		let tags = kind
			.required_tags()
			.filter(|rule| missing.contains(rule.tag))
			.map(|rule| rule.display_name().to_string())
			.collect();

		return Err(EclassError::MissingTags {
			header: lines.first().cloned().unwrap_or_default(),
			line: first_line,
			tags,
		});
	}

	Ok(data)
}
