mod backend;
mod commands;
mod utils;

use aerolab_config::Backend;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

/// Exit code after Ctrl-C, as shells report SIGINT
const INTERRUPTED_EXIT: i32 = 130;

#[derive(Parser)]
#[command(name = "aerolab")]
#[command(about = "Run commands and move files across Aerospike lab clusters", long_about = None)]
struct Cli {
    /// Inventory backend (docker, file)
    #[arg(long, global = true, env = "AEROLAB_BACKEND")]
    backend: Option<Backend>,
    /// Inventory snapshot used by the file backend
    #[arg(long, global = true, env = "AEROLAB_INVENTORY")]
    inventory: Option<PathBuf>,
    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the whole inventory
    #[command(subcommand)]
    Inventory(InventoryCommands),
    /// List clusters and manage their hosts files
    #[command(subcommand)]
    Cluster(ClusterCommands),
    /// Run a command on cluster nodes
    Attach {
        #[command(flatten)]
        target: TargetArgs,
        /// Session timeout in seconds (0 = unbounded)
        #[arg(long)]
        timeout: Option<u64>,
        /// Attach a terminal; requires exactly one node
        #[arg(short, long)]
        interactive: bool,
        /// Command to run (after --); an interactive shell when omitted
        #[arg(last = true)]
        command: Vec<String>,
    },
    /// Copy files to or from cluster nodes
    #[command(subcommand)]
    Files(FilesCommands),
    /// Collect Aerospike logs
    #[command(subcommand)]
    Logs(LogsCommands),
    /// Inspect volumes
    #[command(subcommand)]
    Volumes(VolumesCommands),
    /// Show version
    Version,
}

/// Clusters, nodes and fan-out width of a fleet command
#[derive(clap::Args, Clone)]
struct TargetArgs {
    /// Cluster names, comma separated
    #[arg(short = 'n', long = "name", default_value = "mydc")]
    names: String,
    /// Node numbers, e.g. 1,3,5-7; every node when empty
    #[arg(short = 'l', long = "nodes", default_value = "")]
    nodes: String,
    /// Nodes worked on at the same time
    #[arg(short, long)]
    parallel: Option<usize>,
}

#[derive(Subcommand)]
enum InventoryCommands {
    /// List instances and volumes
    List {
        /// Include terminated instances and deleted volumes
        #[arg(short, long)]
        all: bool,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ClusterCommands {
    /// List cluster nodes
    List {
        /// Cluster names, comma separated; every cluster when omitted
        #[arg(short = 'n', long = "name")]
        names: Option<String>,
        /// Include terminated instances
        #[arg(short, long)]
        all: bool,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Render /etc/hosts entries for cluster nodes
    Hosts {
        /// Cluster names, comma separated
        #[arg(short = 'n', long = "name", default_value = "mydc")]
        names: String,
        /// Write the entries into /etc/hosts on every running node
        #[arg(long)]
        apply: bool,
        /// Nodes worked on at the same time
        #[arg(short, long)]
        parallel: Option<usize>,
    },
}

#[derive(Subcommand)]
enum FilesCommands {
    /// Upload a local file to every node
    Upload {
        #[command(flatten)]
        target: TargetArgs,
        /// Octal permissions of the remote file
        #[arg(long, default_value = "644")]
        mode: String,
        /// Local file
        source: PathBuf,
        /// Remote path
        dest: String,
    },
    /// Download a remote file from every node into DEST/<cluster>-<node>/
    Download {
        #[command(flatten)]
        target: TargetArgs,
        /// Remote path
        source: String,
        /// Local directory
        dest: PathBuf,
    },
}

#[derive(Subcommand)]
enum LogsCommands {
    /// Download the Aerospike log of every node
    Get {
        #[command(flatten)]
        target: TargetArgs,
        /// Remote log file
        #[arg(long, default_value = commands::logs::DEFAULT_LOG_PATH)]
        path: String,
        /// Read the systemd journal instead of the log file
        #[arg(short, long)]
        journal: bool,
        /// Local directory
        #[arg(short = 'd', long = "destination", default_value = "./logs")]
        dest: PathBuf,
    },
}

#[derive(Subcommand)]
enum VolumesCommands {
    /// List volumes
    List {
        /// Include deleted volumes
        #[arg(short, long)]
        all: bool,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted");
            eprintln!("\n{}", "Interrupted".yellow());
            std::process::exit(INTERRUPTED_EXIT);
        }
    });

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Version needs neither config nor inventory
    if matches!(cli.command, Commands::Version) {
        println!("aerolab {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let setup = backend::Setup::load(cli.backend, cli.inventory)?;
    let inventory = setup.snapshot().await?;

    match cli.command {
        Commands::Inventory(InventoryCommands::List { all, json }) => {
            commands::inventory::list(&inventory, all, json)?;
        }
        Commands::Cluster(ClusterCommands::List { names, all, json }) => {
            commands::cluster::list(&inventory, names.as_deref(), all, json)?;
        }
        Commands::Cluster(ClusterCommands::Hosts {
            names,
            apply,
            parallel,
        }) => {
            let ctx = setup.context(inventory, parallel, None);
            commands::cluster::hosts(&ctx, &names, apply).await?;
        }
        Commands::Attach {
            target,
            timeout,
            interactive,
            command,
        } => {
            let session =
                timeout.map(|secs| (secs > 0).then(|| std::time::Duration::from_secs(secs)));
            let ctx = setup.context(inventory, target.parallel, session);
            commands::attach::handle(&ctx, &target.names, &target.nodes, interactive, command)
                .await?;
        }
        Commands::Files(FilesCommands::Upload {
            target,
            mode,
            source,
            dest,
        }) => {
            let ctx = setup.context(inventory, target.parallel, None);
            commands::files::upload(&ctx, &target.names, &target.nodes, &source, &dest, &mode)
                .await?;
        }
        Commands::Files(FilesCommands::Download {
            target,
            source,
            dest,
        }) => {
            let ctx = setup.context(inventory, target.parallel, None);
            commands::files::download(&ctx, &target.names, &target.nodes, &source, &dest).await?;
        }
        Commands::Logs(LogsCommands::Get {
            target,
            path,
            journal,
            dest,
        }) => {
            let ctx = setup.context(inventory, target.parallel, None);
            commands::logs::get(&ctx, &target.names, &target.nodes, &path, journal, &dest)
                .await?;
        }
        Commands::Volumes(VolumesCommands::List { all, json }) => {
            commands::volumes::list(&inventory, all, json)?;
        }
        Commands::Version => {
            unreachable!("Version is handled before inventory loading");
        }
    }

    Ok(())
}
