use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use provision::Platform;
use std::path::PathBuf;

use crate::project::PROJECT_FILE;

#[derive(Parser)]
#[command(name = "guestprov")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Provision VM guests with puppet apply", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Project file
    #[arg(short, long, global = true, env = "GUESTPROV_CONFIG", default_value = PROJECT_FILE)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run puppet apply on the guest
    Provision(ProvisionArgs),

    /// Show the synced folders and guest paths for the project
    Plan(PlanArgs),

    /// Print the puppet apply command without contacting the guest
    Command(CommandArgs),

    /// Check the project file against the host filesystem
    Validate,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct ProvisionArgs {
    /// Upload planned folders to the guest before verifying them
    #[arg(long)]
    pub sync: bool,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CommandArgs {
    /// Directory holding the puppet binary on the guest
    #[arg(long)]
    pub binary_path: Option<String>,

    /// Guest platform, overrides the project file
    #[arg(long, value_enum)]
    pub platform: Option<PlatformArg>,

    /// Pass --color=false to puppet
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PlatformArg {
    Posix,
    Windows,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Posix => Platform::Posix,
            PlatformArg::Windows => Platform::Windows,
        }
    }
}
