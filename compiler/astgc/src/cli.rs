//! Command line of the `astg` binary.

use std::io::Write as _;
use std::path::PathBuf;

use astg_loader::GoEnv;
use clap::{Args, Parser, Subcommand};

use crate::config::DriverConfig;
use crate::driver;
use crate::error::{DriverError, Result};

#[derive(Debug, Parser)]
#[command(
    name = "astg",
    version,
    about = "Generate Go clients from annotated contract interfaces",
    long_about = "Analyzes a Go module, collects the interfaces of its contracts directory \
                  and writes JSON-RPC and HTTP clients, shared types, a batch harness, \
                  metrics and a Markdown manual."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Debug-level logging when RUST_LOG is unset
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate the client package
    Client(ClientCmd),

    /// Print or write the analyzed project as JSON
    Dump(DumpCmd),

    /// Print the generator version
    Version,
}

/// Where the module lives and what to analyze in it.
#[derive(Debug, Args)]
pub struct ModuleArgs {
    /// Module root, the directory holding go.mod
    #[arg(long, env = "ASTG_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Directory of contract interfaces, relative to the root
    #[arg(long, env = "ASTG_CONTRACTS", default_value = "contracts")]
    pub contracts_dir: String,

    /// Only generate these interfaces
    #[arg(long, value_delimiter = ',')]
    pub ifaces: Vec<String>,

    /// Directories skipped while walking the module
    #[arg(long = "exclude", value_delimiter = ',')]
    pub excluded_dirs: Vec<String>,

    /// Extra build tags
    #[arg(long, env = "ASTG_TAGS", value_delimiter = ',')]
    pub tags: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ClientCmd {
    #[command(flatten)]
    pub module: ModuleArgs,

    /// Output directory, relative to the root unless absolute
    #[arg(long, env = "ASTG_OUT", default_value = "client")]
    pub out: PathBuf,

    /// Import path of the output package, required outside the module
    #[arg(long = "module", env = "ASTG_MODULE")]
    pub module_path: Option<String>,

    /// Skip Prometheus instrumentation
    #[arg(long)]
    pub no_metrics: bool,

    /// Skip readme.md
    #[arg(long)]
    pub no_docs: bool,

    /// Render from a project document instead of analyzing the module
    #[arg(long, value_name = "PROJECT_JSON")]
    pub from: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DumpCmd {
    #[command(flatten)]
    pub module: ModuleArgs,

    /// Write the document here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl ModuleArgs {
    fn config(&self) -> DriverConfig {
        let mut config = DriverConfig::new(&self.root);
        config.contracts_dir.clone_from(&self.contracts_dir);
        config.ifaces.clone_from(&self.ifaces);
        config.excluded_dirs.clone_from(&self.excluded_dirs);
        config.build_tags.clone_from(&self.tags);
        config
    }
}

impl ClientCmd {
    pub fn config(&self) -> DriverConfig {
        let mut config = self.module.config();
        config.out.clone_from(&self.out);
        config.import_path.clone_from(&self.module_path);
        config.metrics = !self.no_metrics;
        config.docs = !self.no_docs;
        config
    }
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Client(cmd) => {
            let config = cmd.config();
            let files = match &cmd.from {
                Some(path) => driver::client_from_project(&config, path)?,
                None => driver::client(&config, GoEnv::from_env())?,
            };
            println!("{} files written to {}", files.len(), config.out_dir().display());
        }
        Commands::Dump(cmd) => {
            let project = driver::analyze(&cmd.module.config())?;
            let text = driver::dump(&project, cmd.output.as_deref())?;
            if cmd.output.is_none() {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{text}").map_err(|e| DriverError::io("<stdout>", e))?;
            }
        }
        Commands::Version => println!("astg {}", env!("CARGO_PKG_VERSION")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn client_flags_fill_the_config() {
        let cli = parse(&[
            "astg",
            "client",
            "--root",
            "/src/shop",
            "--out",
            "gen/api",
            "--ifaces",
            "Users,Pinger",
            "--exclude",
            "vendor",
            "--tags",
            "integration",
            "--no-docs",
        ]);
        let Commands::Client(cmd) = cli.command else {
            panic!("expected client");
        };
        let config = cmd.config();
        assert_eq!(config.root, PathBuf::from("/src/shop"));
        assert_eq!(config.out, PathBuf::from("gen/api"));
        assert_eq!(config.ifaces, vec!["Users", "Pinger"]);
        assert_eq!(config.excluded_dirs, vec!["vendor"]);
        assert_eq!(config.build_tags, vec!["integration"]);
        assert!(config.metrics);
        assert!(!config.docs);
        assert!(cmd.from.is_none());
    }

    #[test]
    fn dump_and_version_parse() {
        let cli = parse(&["astg", "-v", "dump", "-o", "project.json"]);
        assert!(cli.verbose);
        let Commands::Dump(cmd) = cli.command else {
            panic!("expected dump");
        };
        assert_eq!(cmd.output, Some(PathBuf::from("project.json")));
        assert!(matches!(parse(&["astg", "version"]).command, Commands::Version));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["astg", "server"]).is_err());
    }
}
