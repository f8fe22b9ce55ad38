use std::collections::BTreeMap;
use std::path::Path;

use crate::BlockKind;
use crate::DocValue;
use crate::EclassData;
use crate::EclassError;
use crate::EclassResult;
use crate::block::parse_block;
use crate::schema::BLOCK_MARKER_RE;

/// A contiguous comment region opened by a block marker line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BlockRegion {
	pub kind: BlockKind,
	/// 1-based line number of the marker line.
	pub start_line: usize,
	/// Region lines with the comment leader removed.
	pub lines: Vec<String>,
}

/// Locate every documentation block region in `lines`.
///
/// A region starts at a line such as `# @FUNCTION: foo` and extends over the
/// following lines sharing exactly the same comment leader (the `#` and any
/// indentation before it). Lines outside any region are ordinary code and
/// are skipped.
pub(crate) fn find_regions(lines: &[&str]) -> Vec<BlockRegion> {
	let mut regions = Vec::new();
	let mut index = 0;

	while index < lines.len() {
		let Some(captures) = BLOCK_MARKER_RE.captures(lines[index]) else {
			index += 1;
			continue;
		};
		let Some(kind) = BlockKind::from_marker(&captures["marker"]) else {
			index += 1;
			continue;
		};

		let prefix = &captures["prefix"];
		let start_line = index + 1;
		// Spacing before `@` may vary on the marker line itself.
		let mut region_lines = vec![format!("@{}:{}", &captures["marker"], &captures["value"])];
		index += 1;

		while let Some(line) = lines.get(index) {
			let Some(rest) = line.strip_prefix(prefix) else {
				break;
			};
			region_lines.push(strip_one_space(rest).to_string());
			index += 1;
		}

		regions.push(BlockRegion {
			kind,
			start_line,
			lines: region_lines,
		});
	}

	regions
}

fn strip_one_space(text: &str) -> &str {
	let mut chars = text.chars();
	match chars.next() {
		Some(c) if c.is_whitespace() => chars.as_str(),
		_ => text,
	}
}

/// Parse all documentation blocks in eclass `content`.
///
/// Singular blocks merge their fields into the top level of the result;
/// repeatable blocks are collected in document order under their field name.
pub fn parse_document(content: &str) -> EclassResult<EclassData> {
	let content = normalize_line_endings(content);
	let lines: Vec<&str> = content.lines().collect();
	let mut doc: BTreeMap<String, DocValue> = BTreeMap::new();

	for region in find_regions(&lines) {
		let data = parse_block(region.kind, &region.lines, region.start_line)?;

		let Some(field_name) = region.kind.field_name() else {
			if data.keys().any(|key| doc.contains_key(key)) {
				return Err(EclassError::DuplicateBlock {
					marker: region.kind.marker(),
					line: region.start_line,
				});
			}
			doc.extend(
				data.into_iter()
					.map(|(key, value)| (key, DocValue::Field(value))),
			);
			continue;
		};

		let entry = doc
			.entry(field_name.to_string())
			.or_insert_with(|| DocValue::Blocks(Vec::new()));
		if let DocValue::Blocks(blocks) = entry {
			blocks.push(data);
		}
	}

	Ok(EclassData::from(doc))
}

/// Read and parse the eclass at `path`, returning only its documentation.
pub fn parse_file(path: impl AsRef<Path>) -> EclassResult<EclassData> {
	let content = std::fs::read_to_string(path.as_ref())?;
	parse_document(&content)
}

/// Normalize CRLF line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}
