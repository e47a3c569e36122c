use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use proton_pack::config::{discover_config, DEFAULT_TARGET};
use proton_pack::{logging, Driver, Profile};

/// Build and package generated protobuf code
#[derive(Parser, Debug)]
#[command(name = "proton-pack", version, about, long_about = None)]
struct Cli {
    /// Command to run
    #[arg(value_enum)]
    command: Command,

    /// Version hash to append (e.g., git commit hash)
    #[arg(long)]
    hash: Option<String>,

    /// Project root that paths and the generator run from
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Target package to operate on
    #[arg(long, default_value = DEFAULT_TARGET)]
    target: String,

    /// Config file (default: <root>/proton-pack.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Command {
    Clean,
    Build,
    Publish,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("resolving project root '{}'", cli.root.display()))?;
    let config = discover_config(&root, cli.config.as_deref())?;
    let profile = Profile::resolve(&cli.target, config.as_ref())?;
    tracing::debug!(root = %root.display(), target = %profile.name, "resolved profile");

    let driver = Driver::new(root, profile);
    match cli.command {
        Command::Clean => driver.clean(),
        Command::Build => driver.build(cli.hash.as_deref()).map(|_| ()),
        Command::Publish => driver.publish().map(|_| ()),
    }
}
