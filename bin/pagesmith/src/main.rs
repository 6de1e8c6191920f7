//! Pagesmith CLI
//!
//! Template-driven static site generator with a live-reloading dev server.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use pagesmith::session::DevOptions;

/// Command-line interface for Pagesmith.
#[derive(Parser)]
#[command(
    name = "pagesmith",
    version,
    about = "A template-driven static site generator"
)]
struct Cli {
    /// Project root directory
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build the site into the output directory
    Build {
        /// Override base_url from config.yaml (e.g., https://example.com)
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Development mode
    Dev {
        #[command(subcommand)]
        mode: DevMode,
    },
}

/// Development modes.
#[derive(clap::Subcommand)]
enum DevMode {
    /// Build, serve the output and reload browsers on change
    Serve {
        /// First port to try for the file server
        #[arg(short, long, default_value_t = pagesmith::server::DEFAULT_PORT)]
        port: u16,
        /// Port of the live reload WebSocket
        #[arg(long, default_value_t = pagesmith::livereload::DEFAULT_RELOAD_PORT)]
        reload_port: u16,
        /// Open browser automatically
        #[arg(long)]
        open: bool,
    },
    /// Build and rebuild on change, without serving
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    pagesmith::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build { base_url } => {
            pagesmith::cmd::build::run(&cli.root, base_url.as_deref())?;
        }
        Commands::Dev {
            mode:
                DevMode::Serve {
                    port,
                    reload_port,
                    open,
                },
        } => {
            let options = DevOptions {
                port,
                reload_port,
                open,
            };
            pagesmith::cmd::dev::serve(&cli.root, options).await?;
        }
        Commands::Dev {
            mode: DevMode::Watch,
        } => {
            pagesmith::cmd::dev::watch(&cli.root).await?;
        }
    }

    Ok(())
}
