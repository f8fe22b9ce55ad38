mod common;

use eclassdoc_core::AnyEmptyResult;
use rstest::rstest;
use serde_json::Value;
use similar_asserts::assert_eq;

fn json_output(cmd: &mut assert_cmd::Command) -> Value {
	let output = cmd
		.output()
		.unwrap_or_else(|e| panic!("run eclassdoc: {e}"));
	assert!(
		output.status.success(),
		"eclassdoc failed: {}",
		String::from_utf8_lossy(&output.stderr)
	);
	serde_json::from_slice(&output.stdout).unwrap_or_else(|e| panic!("parse json output: {e}"))
}

#[test]
fn list_prints_documented_eclasses() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_eclass(tmp.path(), "alpha", &common::eclass_source("alpha", &["alpha_do"]));
	common::write_eclass(
		tmp.path(),
		"old",
		"# @ECLASS: old.eclass\n# @MAINTAINER:\n# Jane\n# @BLURB: legacy helpers\n# \
		 @DEPRECATED: alpha\n",
	);

	common::eclassdoc_cmd()
		.arg("list")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"  alpha eclass/alpha.eclass (1 function(s), 0 variable(s))\n    alpha helpers",
		))
		.stdout(predicates::str::contains(
			"  old eclass/old.eclass (0 function(s), 0 variable(s)) [deprecated]",
		))
		.stdout(predicates::str::contains("2 eclass(es)"));

	Ok(())
}

#[test]
fn list_json_describes_each_eclass() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_eclass(tmp.path(), "beta", &common::eclass_source("beta", &["b1", "b2"]));
	common::write_eclass(tmp.path(), "alpha", &common::eclass_source("alpha", &[]));

	let json = json_output(
		common::eclassdoc_cmd()
			.arg("list")
			.arg("--format")
			.arg("json")
			.arg("--path")
			.arg(tmp.path()),
	);

	assert_eq!(
		json,
		serde_json::json!([
			{
				"name": "alpha",
				"path": "eclass/alpha.eclass",
				"blurb": "alpha helpers",
				"deprecated": null,
				"functions": [],
				"variables": [],
			},
			{
				"name": "beta",
				"path": "eclass/beta.eclass",
				"blurb": "beta helpers",
				"deprecated": null,
				"functions": ["b1", "b2"],
				"variables": [],
			},
		])
	);

	Ok(())
}

#[test]
fn list_omits_invalid_eclasses() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_eclass(tmp.path(), "alpha", &common::eclass_source("alpha", &[]));
	common::write_eclass(tmp.path(), "bad", "# @FUNCTION:\n");

	let json = json_output(
		common::eclassdoc_cmd()
			.arg("list")
			.arg("--format")
			.arg("json")
			.arg("--path")
			.arg(tmp.path()),
	);

	let names: Vec<&str> = json
		.as_array()
		.ok_or("list output should be an array")?
		.iter()
		.filter_map(|entry| entry["name"].as_str())
		.collect();
	assert_eq!(names, vec!["alpha"]);

	Ok(())
}

#[test]
fn list_ignores_non_eclass_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_eclass(tmp.path(), "alpha", &common::eclass_source("alpha", &[]));
	std::fs::write(tmp.path().join("eclass").join("README"), "not an eclass")?;
	std::fs::create_dir_all(tmp.path().join("eclass").join("tests.eclass"))?;

	common::eclassdoc_cmd()
		.arg("list")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("1 eclass(es)"));

	Ok(())
}

#[test]
fn list_empty_eclass_dir() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("eclass"))?;

	common::eclassdoc_cmd()
		.arg("list")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("No documented eclasses found."));

	Ok(())
}

#[test]
fn info_json_reports_cache_health() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_eclass(tmp.path(), "alpha", &common::eclass_source("alpha", &[]));
	common::write_eclass(tmp.path(), "beta", &common::eclass_source("beta", &[]));

	let before = json_output(
		common::eclassdoc_cmd()
			.arg("info")
			.arg("--format")
			.arg("json")
			.arg("--path")
			.arg(tmp.path()),
	);
	assert_eq!(before["eclass_files"], 2);
	assert_eq!(before["cache_enabled"], true);
	assert_eq!(before["cache"]["exists"], false);
	assert_eq!(before["config"], Value::Null);

	common::eclassdoc_cmd()
		.arg("cache")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	let after = json_output(
		common::eclassdoc_cmd()
			.arg("info")
			.arg("--format")
			.arg("json")
			.arg("--path")
			.arg(tmp.path()),
	);
	assert_eq!(after["cache"]["valid"], true);
	assert_eq!(after["cache"]["entries"], 2);
	assert_eq!(after["cache"]["version"], after["expected_cache_version"]);

	Ok(())
}

#[test]
fn info_does_not_modify_outdated_cache() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("eclass"))?;
	let cache = common::cache_path(tmp.path());
	std::fs::create_dir_all(cache.parent().ok_or("cache path has a parent")?)?;
	std::fs::write(&cache, r#"{"version":0,"eclasses":{}}"#)?;

	let report = json_output(
		common::eclassdoc_cmd()
			.arg("info")
			.arg("--format")
			.arg("json")
			.arg("--path")
			.arg(tmp.path()),
	);
	assert_eq!(report["cache"]["version"], 0);
	assert_eq!(report["cache"]["version_supported"], false);
	assert_eq!(report["cache"]["valid"], false);
	assert!(cache.is_file());

	Ok(())
}

#[rstest]
#[case::default_location("eclassdoc.toml")]
#[case::hidden_file(".eclassdoc.toml")]
#[case::config_dir(".config/eclassdoc.toml")]
fn info_text_shows_resolved_config(#[case] config_file: &str) -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let config_path = tmp.path().join(config_file);
	std::fs::create_dir_all(config_path.parent().ok_or("config path has a parent")?)?;
	std::fs::write(&config_path, "[cache]\nenabled = false\n")?;

	common::eclassdoc_cmd()
		.arg("info")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(format!(
			"Resolved config      {config_file}"
		)))
		.stdout(predicates::str::contains("Enabled              no"))
		.stdout(predicates::str::contains("Eclass files         missing"));

	Ok(())
}
