use clap::{ArgAction, Parser, Subcommand};

use crate::commands::{
    ConfigFileCommand, ContextCommand, InitCommand, ListCommand, ObtainCommand,
};
use crate::Result;

#[derive(Debug, Clone, Parser)]
#[command(name = "letme", version, about = "Obtain temporary AWS credentials for your accounts", long_about = None)]
pub struct Cli {
    #[arg(
        short = 'c',
        long,
        global = true,
        help = "Context to use instead of the current one"
    )]
    pub context: Option<String>,

    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Increase verbosity (-v info, -vv debug, -vvv trace)")]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    #[command(visible_alias = "ob", about = "Obtain credentials for an account")]
    Obtain(ObtainCommand),
    #[command(about = "Cache the account directory locally")]
    Init(InitCommand),
    #[command(about = "List accounts")]
    List(ListCommand),
    #[command(about = "List or switch contexts")]
    Context(ContextCommand),
    #[command(about = "Create a configuration file template")]
    ConfigFile(ConfigFileCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let context = self.context.as_deref();

        match self.command {
            Commands::Obtain(cmd) => cmd.execute(context).await,
            Commands::Init(cmd) => cmd.execute(context).await,
            Commands::List(cmd) => cmd.execute(context).await,
            Commands::Context(cmd) => cmd.execute().await,
            Commands::ConfigFile(cmd) => cmd.execute().await,
        }
    }
}
