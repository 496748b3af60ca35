use clap::Parser;

use filter_compiler_cli::{run, Command};

/// Compile filter requests to parameterized SQL.
#[derive(Parser)]
#[command(name = "filter-compiler", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("running {:?}", cli.command);

    let output = run(cli.command).await?;
    println!("{output}");
    Ok(())
}
