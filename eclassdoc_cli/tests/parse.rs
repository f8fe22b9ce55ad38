mod common;

use eclassdoc_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;
use serde_json::Value;
use similar_asserts::assert_eq;

const FOO_ECLASS: &str = "# @ECLASS: foo.eclass
# @MAINTAINER:
# Jane Doe <jane@example.org>
# @SUPPORTED_EAPIS: 7 8
# @BLURB: does a thing

# @ECLASS-VARIABLE: FOO_OPTS
# @DEFAULT_UNSET
# @DESCRIPTION:
# Extra options.

# @FUNCTION: foo_src_compile
# @USAGE: [args...]
# @DESCRIPTION:
# Compile the thing.
foo_src_compile() { :; }

# @FUNCTION: _foo_helper
# @INTERNAL
_foo_helper() { :; }
";

#[test]
fn parse_prints_eclass_summary() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let path = common::write_eclass(tmp.path(), "foo", FOO_ECLASS);

	common::eclassdoc_cmd()
		.arg("parse")
		.arg(&path)
		.assert()
		.success()
		.stdout(predicates::str::contains("foo.eclass"))
		.stdout(predicates::str::contains("does a thing"))
		.stdout(predicates::str::contains("Jane Doe <jane@example.org>"))
		.stdout(predicates::str::contains("7, 8"))
		.stdout(predicates::str::contains("  foo_src_compile\n"))
		.stdout(predicates::str::contains("_foo_helper (internal)"))
		.stdout(predicates::str::contains("FOO_OPTS"));

	Ok(())
}

#[test]
fn parse_json_outputs_plain_values() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let path = common::write_eclass(tmp.path(), "foo", FOO_ECLASS);

	let output = common::eclassdoc_cmd()
		.arg("parse")
		.arg(&path)
		.arg("--format")
		.arg("json")
		.output()?;
	assert!(output.status.success());

	let json: Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(json["name"], "foo.eclass");
	assert_eq!(
		json["supported_eapis"],
		serde_json::json!(["7", "8"])
	);

	let functions = json["functions"]
		.as_array()
		.ok_or("functions should be an array")?;
	let names: Vec<&str> = functions
		.iter()
		.filter_map(|block| block["name"].as_str())
		.collect();
	assert_eq!(names, vec!["foo_src_compile", "_foo_helper"]);
	assert_eq!(functions[1]["internal"], true);
	assert_eq!(json["variables"][0]["default_unset"], true);
	assert_eq!(
		json["maintainers"],
		serde_json::json!(["Jane Doe <jane@example.org>"])
	);

	Ok(())
}

#[test]
fn parse_does_not_write_a_cache() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let path = common::write_eclass(tmp.path(), "foo", FOO_ECLASS);

	common::eclassdoc_cmd()
		.arg("parse")
		.arg(&path)
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	assert!(!common::cache_path(tmp.path()).exists());

	Ok(())
}

#[test]
fn parse_reports_missing_required_tag() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let path = common::write_eclass(
		tmp.path(),
		"bar",
		"# @ECLASS: bar.eclass\n# @MAINTAINER:\n# Jane Doe <jane@example.org>\n",
	);

	common::eclassdoc_cmd()
		.arg("parse")
		.arg(&path)
		.assert()
		.code(2)
		.stderr(predicates::str::contains(r#"line 1: missing tag: "BLURB""#))
		.stderr(predicates::str::contains("eclassdoc::missing_tags"));

	Ok(())
}

#[test]
fn parse_reports_flag_with_arguments() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let path = common::write_eclass(
		tmp.path(),
		"bar",
		"# @ECLASS: bar.eclass\n# @MAINTAINER:\n# Jane\n# @BLURB: x\n\n# @FUNCTION: \
		 bar_do\n# @INTERNAL please\n",
	);

	common::eclassdoc_cmd()
		.arg("parse")
		.arg(&path)
		.assert()
		.code(2)
		.stderr(predicates::str::contains("line 7: tag takes no args"))
		.stderr(predicates::str::contains(r#"got "please""#));

	Ok(())
}

#[test]
fn parse_reports_duplicate_eclass_block() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let block = "# @ECLASS: bar.eclass\n# @MAINTAINER:\n# Jane\n# @BLURB: x\n";
	let path = common::write_eclass(tmp.path(), "bar", &format!("{block}\n{block}"));

	common::eclassdoc_cmd()
		.arg("parse")
		.arg(&path)
		.assert()
		.code(2)
		.stderr(predicates::str::contains("line 6: duplicate ECLASS doc block"));

	Ok(())
}

#[test]
fn parse_missing_file_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::eclassdoc_cmd()
		.arg("parse")
		.arg(tmp.path().join("missing.eclass"))
		.assert()
		.code(2)
		.stdout(predicates::str::is_empty());

	Ok(())
}

#[test]
fn no_subcommand_prints_usage_hint() {
	common::eclassdoc_cmd()
		.assert()
		.code(1)
		.stderr(predicates::str::contains("No subcommand specified").and(
			predicates::str::contains("eclassdoc --help"),
		));
}
