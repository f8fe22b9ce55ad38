use std::fs::File;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rstest::fixture;

pub(crate) const FOO_ECLASS: &str = r#"# Copyright 2024 Gentoo Authors
# Distributed under the terms of the GNU General Public License v2

# @ECLASS: foo.eclass
# @MAINTAINER:
# Jane Doe <jane@example.org>
# Build Team <build@example.org>
# @AUTHOR:
# John Roe <john@example.org>
# @SUPPORTED_EAPIS: 7 8
# @BLURB: does a thing
# @DESCRIPTION:
# Helpers for doing a thing.
#
# Second paragraph.

# @ECLASS-VARIABLE: FOO_OPTS
# @DEFAULT_UNSET
# @DESCRIPTION:
# Extra options passed to foo.

# @FUNCTION: foo_src_compile
# @USAGE: [args...]
# @DESCRIPTION:
# Compile the thing.
foo_src_compile() {
	# @VARIABLE: FOO_JOBS
	# @DESCRIPTION:
	# Number of jobs.
	: "${FOO_JOBS:=1}"
	emake -j"${FOO_JOBS}" "$@"
}

# @FUNCTION: _foo_helper
# @INTERNAL
# @RETURN: 0 on success
_foo_helper() { :; }
"#;

#[fixture]
pub(crate) fn foo_eclass() -> &'static str {
	FOO_ECLASS
}

/// Split a block literal into owned lines the way the document parser hands
/// them to the block parser.
pub(crate) fn block_lines(text: &str) -> Vec<String> {
	text.lines().map(ToString::to_string).collect()
}

/// A minimal valid eclass declaring `functions`.
pub(crate) fn eclass_source(name: &str, functions: &[&str]) -> String {
	let mut source = format!(
		"# @ECLASS: {name}.eclass\n# @MAINTAINER:\n# Jane Doe <jane@example.org>\n# @BLURB: \
		 {name} helpers\n\n"
	);
	for function in functions {
		source.push_str(&format!(
			"# @FUNCTION: {function}\n# @DESCRIPTION:\n# Runs {function}.\n{function}() {{ :; \
			 }}\n\n"
		));
	}
	source
}

/// A point in time `secs` seconds after the Unix epoch.
pub(crate) fn at_secs(secs: u64) -> SystemTime {
	UNIX_EPOCH + Duration::from_secs(secs)
}

pub(crate) fn set_mtime(path: &Path, secs: u64) {
	set_modified(path, at_secs(secs));
}

pub(crate) fn set_mtime_nanos(path: &Path, nanos: u64) {
	set_modified(path, UNIX_EPOCH + Duration::from_nanos(nanos));
}

fn set_modified(path: &Path, time: SystemTime) {
	File::options()
		.write(true)
		.open(path)
		.and_then(|file| file.set_modified(time))
		.unwrap_or_else(|e| panic!("set mtime of {}: {e}", path.display()));
}

/// Write `content` to `<dir>/<name>.eclass` and pin its modification time.
pub(crate) fn write_eclass(dir: &Path, name: &str, content: &str, mtime_secs: u64) -> PathBuf {
	let path = dir.join(format!("{name}.eclass"));
	std::fs::write(&path, content).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
	set_mtime(&path, mtime_secs);
	path
}
