use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::commands::{self, ScanArgs};
use tracing_subscriber::EnvFilter;
use zenith_core::config;
use zenith_core::render;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan {
            root,
            exclude,
            exclude_glob,
            include_hidden,
            threshold,
            json,
            markdown,
            save,
        } => {
            let args = ScanArgs {
                root,
                exclude,
                exclude_globs: exclude_glob,
                include_hidden,
                threshold,
                markdown,
                save,
            };
            let outcome = commands::run_scan(&cfg, &args).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome.report)?);
            } else {
                print!("{}", commands::format_report(&outcome.report));
                if let Some(id) = outcome.scan_id {
                    println!("saved as scan #{}", id);
                }
            }
        }
        Commands::History { limit, json } => {
            let scans = commands::history(&cfg, limit).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&scans)?);
            } else if scans.is_empty() {
                println!("no scans stored yet");
            } else {
                print!("{}", commands::format_history(&scans));
            }
        }
        Commands::Show {
            scan_id,
            json,
            markdown,
        } => {
            let (id, report) = commands::stored_report(&cfg, scan_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if markdown {
                print!("{}", render::markdown(&report));
            } else {
                println!("scan #{}", id);
                print!("{}", commands::format_report(&report));
            }
        }
        Commands::Projects { undocumented, json } => {
            let (projects, latest) = commands::stored_projects(&cfg, undocumented).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&projects)?);
            } else {
                print!("{}", commands::format_projects(&projects, latest));
            }
        }
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "zenith")]
#[command(about = "Project inventory: discovery, duplicate detection and health scores", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a directory tree for projects
    Scan {
        /// Directory to scan (defaults to scan.root from config, then ".")
        root: Option<String>,
        /// Extra directory names to skip (comma-separated or repeated)
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,
        /// Glob patterns to skip, matched against names and full paths
        #[arg(long, value_delimiter = ',')]
        exclude_glob: Vec<String>,
        /// Descend into hidden directories
        #[arg(long, default_value_t = false)]
        include_hidden: bool,
        /// Projects scoring below this are reported as undocumented
        #[arg(long)]
        threshold: Option<u8>,
        /// Output the full report as JSON
        #[arg(long)]
        json: bool,
        /// Also write a Markdown report to this file
        #[arg(long)]
        markdown: Option<String>,
        /// Persist the report to the database
        #[arg(long, default_value_t = false)]
        save: bool,
    },
    /// List stored scans, newest first
    History {
        #[arg(short, long, default_value_t = 10)]
        limit: i64,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a stored report (latest when no id is given)
    Show {
        scan_id: Option<i64>,
        /// Output JSON
        #[arg(long)]
        json: bool,
        /// Output Markdown
        #[arg(long, conflicts_with = "json")]
        markdown: bool,
    },
    /// List projects known to the database
    Projects {
        /// Only projects from the latest scan below the threshold it ran with
        #[arg(long, default_value_t = false)]
        undocumented: bool,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}
