#![allow(dead_code)]

use std::path::Path;
use std::path::PathBuf;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn eclassdoc_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("eclassdoc"));
	cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
	cmd
}

/// A minimal valid eclass documenting `functions`.
pub fn eclass_source(name: &str, functions: &[&str]) -> String {
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

/// Write `<root>/eclass/<name>.eclass`, creating the eclass directory.
pub fn write_eclass(root: &Path, name: &str, content: &str) -> PathBuf {
	let dir = root.join("eclass");
	std::fs::create_dir_all(&dir).unwrap_or_else(|e| panic!("create {}: {e}", dir.display()));
	let path = dir.join(format!("{name}.eclass"));
	std::fs::write(&path, content).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
	path
}

pub fn cache_path(root: &Path) -> PathBuf {
	root.join(".eclassdoc").join("cache").join("eclass-v2.json")
}
