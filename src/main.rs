use clap::Parser;
use splitlab::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let options = cli.options();

    match cli.command {
        Command::Serve => cli::serve::run(options).await,
        Command::Resolve(command) => cli::assign::resolve(options, command).await,
        Command::Show { name } => cli::assign::show(options, &name).await,
        Command::List => cli::assign::list(options).await,
        Command::Reset { name } => cli::assign::reset(options, &name).await,
    }
}
