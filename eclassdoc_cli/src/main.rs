use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use eclassdoc_cli::Commands;
use eclassdoc_cli::EclassdocCli;
use eclassdoc_cli::OutputFormat;
use eclassdoc_core::CACHE_VERSION;
use eclassdoc_core::CacheInspection;
use eclassdoc_core::CacheStore;
use eclassdoc_core::Eclass;
use eclassdoc_core::EclassMap;
use eclassdoc_core::EclassdocConfig;
use eclassdoc_core::LiveEclasses;
use eclassdoc_core::Reconciliation;
use eclassdoc_core::reconcile;
use eclassdoc_core::update_cache;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = EclassdocCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Parse { file, format }) => run_parse(file, *format),
		Some(Commands::Cache { force, remove }) => run_cache(&args, *force, *remove),
		Some(Commands::List { format }) => run_list(&args, *format),
		Some(Commands::Info { format }) => run_info(&args, *format),
		None => {
			eprintln!("No subcommand specified. Run `eclassdoc --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Documentation and cache errors carry codes and help text.
		match e.downcast::<eclassdoc_core::EclassError>() {
			Ok(eclass_err) => {
				let report: miette::Report = (*eclass_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr. `RUST_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_directive = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.try_init()
		.ok();
}

/// The repository a command operates on.
struct RepoContext {
	root: PathBuf,
	config: EclassdocConfig,
	config_path: Option<PathBuf>,
}

impl RepoContext {
	fn eclass_dir(&self) -> PathBuf {
		self.root.join(&self.config.eclass_dir)
	}

	fn store(&self) -> CacheStore {
		CacheStore::for_repo(&self.root, &self.config)
	}
}

/// The repository root as an absolute path. Cached entries record the paths
/// built from it, so it must not depend on the working directory.
fn resolve_root(args: &EclassdocCli) -> PathBuf {
	let root = args
		.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
	std::fs::canonicalize(&root).unwrap_or(root)
}

fn load_repo(args: &EclassdocCli) -> Result<RepoContext, Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = EclassdocConfig::load_or_default(&root)?;
	let config_path = EclassdocConfig::resolve_path(&root);

	Ok(RepoContext {
		root,
		config,
		config_path,
	})
}

/// Every `*.eclass` file directly inside `eclass_dir`, keyed by file stem.
fn discover_eclasses(eclass_dir: &Path) -> Result<LiveEclasses, Box<dyn std::error::Error>> {
	let entries = std::fs::read_dir(eclass_dir).map_err(|e| {
		format!(
			"cannot read eclass directory {}: {e}",
			eclass_dir.display()
		)
	})?;

	let mut live = LiveEclasses::new();
	for entry in entries {
		let path = entry?.path();
		if !path.is_file() || path.extension().is_none_or(|ext| ext != "eclass") {
			continue;
		}
		let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
			continue;
		};
		live.insert(name.to_string(), path.clone());
	}

	tracing::debug!(dir = %eclass_dir.display(), count = live.len(), "discovered eclasses");
	Ok(live)
}

/// Reconcile the repository's eclasses, through the cache when it is
/// enabled, and warn about every eclass that failed to parse.
fn refresh(repo: &RepoContext, force: bool) -> Result<Reconciliation, Box<dyn std::error::Error>> {
	let live = discover_eclasses(&repo.eclass_dir())?;
	let reconciliation = if repo.config.cache.enabled {
		update_cache(&repo.store(), &live, force)?
	} else {
		reconcile(EclassMap::new(), &live)
	};

	for name in &reconciliation.changes.failed {
		let rel = live
			.get(name)
			.map_or_else(|| name.clone(), |path| make_relative(path, &repo.root));
		eprintln!(
			"{} skipped {rel}: invalid documentation (run with --verbose for details)",
			colored!("warning:", yellow)
		);
	}

	Ok(reconciliation)
}

fn print_section(title: &str) {
	println!();
	println!("{}", colored!(title, bold));
}

fn print_field(label: &str, value: impl std::fmt::Display) {
	println!("{label:<20} {value}");
}

fn yes_no(value: bool) -> &'static str {
	if value { "yes" } else { "no" }
}

fn join_or_none<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
	let joined = items.into_iter().collect::<Vec<_>>().join(", ");
	if joined.is_empty() {
		"none".to_string()
	} else {
		joined
	}
}

fn run_parse(file: &Path, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
	let eclass = Eclass::from_path(file)?;

	match format {
		OutputFormat::Json => {
			println!("{}", serde_json::to_string_pretty(&eclass.data().plain())?);
		}
		OutputFormat::Text => print_eclass(&eclass, file),
	}

	Ok(())
}

fn print_eclass(eclass: &Eclass, file: &Path) {
	let fallback = file.display().to_string();
	println!("{}", colored!(eclass.name().unwrap_or(&fallback), bold));

	if let Some(blurb) = eclass.blurb() {
		print_field("Blurb", blurb);
	}
	print_field(
		"Maintainers",
		join_or_none(eclass.maintainers().iter().map(String::as_str)),
	);
	if let Some(eapis) = eclass.supported_eapis() {
		print_field("Supported EAPIs", join_or_none(eapis.iter().map(String::as_str)));
	}
	if let Some(replacement) = eclass.deprecated() {
		print_field("Deprecated", colored!(replacement, yellow));
	}

	let internal = eclass.internal_functions();
	print_section("Functions");
	if eclass.functions().is_empty() {
		println!("  none");
	}
	for function in eclass.functions() {
		if internal.contains(&function) {
			println!("  {function} (internal)");
		} else {
			println!("  {function}");
		}
	}

	print_section("Variables");
	let variables = eclass.variables();
	if variables.is_empty() {
		println!("  none");
	}
	for variable in variables {
		println!("  {variable}");
	}

	let function_variables = eclass.function_variables();
	if !function_variables.is_empty() {
		print_section("Function variables");
		for variable in function_variables {
			println!("  {variable}");
		}
	}
}

fn run_cache(
	args: &EclassdocCli,
	force: bool,
	remove: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	let repo = load_repo(args)?;
	let store = repo.store();
	let rel_cache = make_relative(store.path(), &repo.root);

	if remove {
		if store.clear()? {
			println!("Removed cache {rel_cache}");
		} else {
			println!("No cache to remove at {rel_cache}");
		}
		return Ok(());
	}

	if !repo.config.cache.enabled {
		println!("Caching is disabled in the config. Nothing to update.");
		return Ok(());
	}

	let result = refresh(&repo, force)?;
	let changes = &result.changes;

	for name in &changes.added {
		println!("  {} {name}", colored!("+", green));
	}
	for name in &changes.updated {
		println!("  {} {name}", colored!("~", yellow));
	}
	for name in &changes.removed {
		println!("  {} {name}", colored!("-", red));
	}

	println!(
		"{} cached eclass(es): {} added, {} updated, {} removed, {} failed",
		result.repo.len(),
		changes.added.len(),
		changes.updated.len(),
		changes.removed.len(),
		changes.failed.len()
	);

	if result.persisted {
		println!("{} {rel_cache}", colored!("Wrote", green));
	} else {
		println!("Cache is up to date.");
	}

	Ok(())
}

#[derive(Serialize)]
struct EclassSummary<'a> {
	name: &'a str,
	path: String,
	blurb: Option<&'a str>,
	deprecated: Option<&'a str>,
	functions: Vec<&'a str>,
	variables: Vec<&'a str>,
}

fn run_list(args: &EclassdocCli, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
	let repo = load_repo(args)?;
	let result = refresh(&repo, false)?;

	let summaries: Vec<EclassSummary> = result
		.repo
		.iter()
		.map(|(name, eclass)| {
			EclassSummary {
				name,
				path: make_relative(eclass.path(), &repo.root),
				blurb: eclass.blurb(),
				deprecated: eclass.deprecated(),
				functions: eclass.functions(),
				variables: eclass.variables(),
			}
		})
		.collect();

	if matches!(format, OutputFormat::Json) {
		println!("{}", serde_json::to_string_pretty(&summaries)?);
		return Ok(());
	}

	if summaries.is_empty() {
		println!("No documented eclasses found.");
		return Ok(());
	}

	println!("{}", colored!("Eclasses:", bold));
	for summary in &summaries {
		let deprecated = if summary.deprecated.is_some() {
			format!(" {}", colored!("[deprecated]", yellow))
		} else {
			String::new()
		};
		println!(
			"  {} {} ({} function(s), {} variable(s)){deprecated}",
			summary.name,
			summary.path,
			summary.functions.len(),
			summary.variables.len()
		);
		if let Some(blurb) = summary.blurb {
			println!("    {blurb}");
		}
	}

	println!("\n{} eclass(es)", summaries.len());

	Ok(())
}

#[derive(Serialize)]
struct InfoReport {
	root: PathBuf,
	config: Option<PathBuf>,
	eclass_dir: PathBuf,
	eclass_files: Option<usize>,
	cache_enabled: bool,
	expected_cache_version: u32,
	cache: CacheInspection,
}

fn run_info(args: &EclassdocCli, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
	let repo = load_repo(args)?;
	let eclass_dir = repo.eclass_dir();
	let report = InfoReport {
		root: repo.root.clone(),
		config: repo.config_path.clone(),
		eclass_files: discover_eclasses(&eclass_dir).ok().map(|live| live.len()),
		eclass_dir,
		cache_enabled: repo.config.cache.enabled,
		expected_cache_version: CACHE_VERSION,
		cache: repo.store().inspect(),
	};

	if matches!(format, OutputFormat::Json) {
		println!("{}", serde_json::to_string_pretty(&report)?);
		return Ok(());
	}

	println!("{}", colored!("eclassdoc info", bold));

	print_section("Repository");
	print_field("Repository root", report.root.display());
	print_field(
		"Resolved config",
		report
			.config
			.as_deref()
			.map_or_else(|| "none".to_string(), |path| make_relative(path, &repo.root)),
	);
	print_field("Eclass dir", make_relative(&report.eclass_dir, &repo.root));
	print_field(
		"Eclass files",
		report
			.eclass_files
			.map_or_else(|| "missing".to_string(), |count| count.to_string()),
	);

	let cache = &report.cache;
	print_section("Cache");
	print_field("Enabled", yes_no(report.cache_enabled));
	print_field("Path", make_relative(&cache.path, &repo.root));
	print_field("Exists", yes_no(cache.exists));
	print_field("Readable", yes_no(cache.readable));
	print_field(
		"Version",
		cache
			.version
			.map_or_else(|| "none".to_string(), |version| version.to_string()),
	);
	print_field("Expected version", report.expected_cache_version);
	print_field("Valid", yes_no(cache.valid));
	print_field("Entries", cache.entries);

	Ok(())
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
