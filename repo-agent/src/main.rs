use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Parse CLI arguments first to get verbosity level
    let cli = Cli::parse();

    // Initialize tracing with appropriate verbosity
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let root = cli.root;
    debug!("Command {:?} on {}", cli.command, root.display());

    match cli.command {
        Commands::Init => cli::commands::init::execute(&root)?,
        Commands::Start => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(cli::commands::watch::start(&root))?;
        }
        Commands::Stop => cli::commands::watch::stop(&root)?,
        Commands::Status => cli::commands::watch::status(&root)?,
        Commands::Pause => cli::commands::watch::pause(&root)?,
        Commands::Resume => cli::commands::watch::resume(&root)?,
        Commands::Check(args) => cli::commands::check::execute(&root, args)?,
        Commands::Logs(args) => cli::commands::logs::execute(&root, args)?,
        Commands::Scan => cli::commands::scan::execute(&root)?,
    }

    Ok(())
}
