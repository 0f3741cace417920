use crate::demo::{run_demo, DemoArgs};
use crate::infra::{build_backends, parse_status};
use crate::server;
use clap::{Args, Parser, Subcommand};
use hostlane::admin::export_properties_csv;
use hostlane::backend::PropertyFilter;
use hostlane::config::AppConfig;
use hostlane::error::AppError;
use hostlane::listings::domain::PropertyStatus;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Hostlane",
    about = "Run the Hostlane listing platform API and its operator tools",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk a listing through the wizard and moderation against the in-memory backend
    Demo(DemoArgs),
    /// Write the moderation CSV for the configured backend
    Export(ExportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Only export listings in this status (pending, under_review, approved, rejected)
    #[arg(long, value_parser = parse_status)]
    pub(crate) status: Option<PropertyStatus>,
    /// Write to this file instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args).await,
        Command::Export(args) => run_export(args).await,
    }
}

async fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let backends = build_backends(&config.backend).await?;
    let filter = PropertyFilter {
        status: args.status,
        ..PropertyFilter::default()
    };
    let csv = export_properties_csv(backends.properties.as_ref(), &filter).await?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, csv)?;
            println!("Wrote {}", path.display());
        }
        None => print!("{csv}"),
    }
    Ok(())
}
