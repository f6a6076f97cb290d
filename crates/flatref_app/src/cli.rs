use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use flatref_engine::{
    ArchPolicy, DownloadOptions, DumpOptions, Selection, DEFAULT_ARCH, DEFAULT_BRANCH,
    DEFAULT_DESCRIPTOR_DIR, DEFAULT_REFS_DIR,
};

/// Flatpak refs utility toolkit.
#[derive(Debug, Parser)]
#[command(name = "flatref", version, about)]
pub struct Cli {
    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Less log output (-q warnings only, -qq errors only).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Also write the log to this file.
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// RON file overriding catalog and descriptor endpoints.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate Flatpak ref lists from the Flathub AppStream catalog.
    Dump(DumpArgs),
    /// Download .flatpakref descriptors for the apps in ref lists.
    Download(DownloadArgs),
}

#[derive(Debug, Args)]
pub struct DumpArgs {
    /// AppStream category to include (repeatable).
    #[arg(short = 'c', long = "category", value_name = "NAME")]
    pub categories: Vec<String>,

    /// Generate refs for all categories (one file per category).
    #[arg(long)]
    pub all: bool,

    /// Print category counts and exit without writing files.
    #[arg(long)]
    pub dump_categories: bool,

    /// Flatpak architecture.
    #[arg(long, default_value = DEFAULT_ARCH)]
    pub arch: String,

    /// Flatpak branch.
    #[arg(long, default_value = DEFAULT_BRANCH)]
    pub branch: String,

    /// Output directory for *.refs files.
    #[arg(long, default_value = DEFAULT_REFS_DIR)]
    pub out: PathBuf,

    /// Merge the selected categories into a single file with this name.
    #[arg(long, value_name = "FILENAME")]
    pub merge_to: Option<String>,

    /// Drop catalog entries that declare no architecture instead of keeping them.
    #[arg(long)]
    pub require_arch: bool,

    /// Catalog location; `{arch}` is replaced by the architecture.
    #[arg(long, value_name = "URL")]
    pub catalog_url: Option<String>,
}

impl DumpArgs {
    pub fn to_options(&self) -> DumpOptions {
        let selection = if self.dump_categories {
            Selection::ReportOnly
        } else if self.all {
            Selection::All
        } else {
            Selection::Categories {
                names: self.categories.clone(),
                merge_to: self.merge_to.clone(),
            }
        };
        DumpOptions {
            arch: self.arch.clone(),
            branch: self.branch.clone(),
            selection,
            out_dir: self.out.clone(),
            arch_policy: if self.require_arch {
                ArchPolicy::RequireExplicit
            } else {
                ArchPolicy::IncludeUnspecified
            },
        }
    }
}

#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Path to a .refs file (repeatable).
    #[arg(short = 'f', long = "refs-file", value_name = "PATH")]
    pub refs_files: Vec<PathBuf>,

    /// Directory containing *.refs files.
    #[arg(long, value_name = "DIR")]
    pub refs_dir: Option<PathBuf>,

    /// Directory to store downloaded .flatpakref files.
    #[arg(long, default_value = DEFAULT_DESCRIPTOR_DIR)]
    pub out: PathBuf,

    /// Skip downloads whose destination file already exists (default).
    #[arg(long, overrides_with = "no_skip_existing")]
    pub skip_existing: bool,

    /// Overwrite existing files instead of skipping them.
    #[arg(long)]
    pub no_skip_existing: bool,

    /// Seconds to wait between downloads to be gentle on the server.
    #[arg(long, default_value = "0", value_parser = parse_seconds, value_name = "SECONDS")]
    pub throttle: Duration,

    /// Stop after this many successful downloads (0 = no limit).
    #[arg(long, default_value_t = 0)]
    pub limit: usize,

    /// HTTP timeout for each request in seconds.
    #[arg(long, default_value_t = 30, value_name = "SECONDS")]
    pub timeout: u64,
}

impl DownloadArgs {
    pub fn to_options(&self) -> DownloadOptions {
        DownloadOptions {
            refs_files: self.refs_files.clone(),
            refs_dir: self.refs_dir.clone(),
            out_dir: self.out.clone(),
            throttle: self.throttle,
            limit: self.limit,
            skip_existing: !self.no_skip_existing,
        }
    }
}

fn parse_seconds(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("`{raw}` is not a number of seconds"))?;
    if secs < 0.0 {
        return Err(format!("`{raw}` must be a non-negative number of seconds"));
    }
    Duration::try_from_secs_f64(secs).map_err(|err| format!("`{raw}`: {err}"))
}
