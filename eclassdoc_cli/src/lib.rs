use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Parse eclass documentation blocks and keep an incremental cache of them.",
	long_about = "eclassdoc reads the structured `# @TAG:` documentation embedded in eclass \
	              comment blocks and keeps a cache of the parsed results keyed by file \
	              modification time, so repeated runs only parse what changed.\n\nQuick \
	              start:\n  eclassdoc parse FILE  Show one eclass\n  eclassdoc cache       \
	              Refresh the cache\n  eclassdoc list        List documented eclasses\n  \
	              eclassdoc info        Inspect the cache"
)]
pub struct EclassdocCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the repository root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Parse a single eclass file and print its documentation.
	///
	/// The file is read directly and the cache is neither consulted nor
	/// written. Exits with a non-zero status when the documentation is
	/// malformed, reporting the offending tag and line.
	Parse {
		/// The eclass file to parse.
		file: PathBuf,

		/// Output format. Use `text` for a human-readable summary or `json`
		/// for the complete parsed field mapping.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Bring the eclass documentation cache up to date.
	///
	/// Discovers every `*.eclass` file in the repository's eclass directory,
	/// drops cache entries whose files were removed, and re-parses eclasses
	/// that are new or changed since they were cached. Eclasses that fail to
	/// parse are reported and skipped.
	Cache {
		/// Ignore the persisted cache and parse every eclass again.
		#[arg(long, default_value_t = false)]
		force: bool,

		/// Delete the cache file instead of updating it.
		#[arg(long, default_value_t = false, conflicts_with = "force")]
		remove: bool,
	},
	/// List every documented eclass in the repository.
	///
	/// Uses the cache when enabled, refreshing it first.
	List {
		/// Output format for the listing.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Print a diagnostic summary of the repository and its cache.
	///
	/// Shows the resolved config, eclass directory, and the health of the
	/// cache file without modifying it.
	Info {
		/// Output format for info results.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
