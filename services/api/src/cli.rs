use crate::demo::{
    run_analytics_summary, run_demo, run_offices_nearest, DemoArgs, NearestArgs, SummaryArgs,
};
use crate::server;
use civic_dispatch::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Civic Dispatch",
    about = "Route civic issue reports to the responsible offices and summarize them by region",
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
    /// Look up the offices responsible for a location
    Offices {
        #[command(subcommand)]
        command: OfficesCommand,
    },
    /// Summarize exported reports by region
    Analytics {
        #[command(subcommand)]
        command: AnalyticsCommand,
    },
    /// Run an in-memory walkthrough: resolve, dispatch, update and aggregate
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum OfficesCommand {
    /// Rank registry offices by distance from a coordinate
    Nearest(NearestArgs),
}

#[derive(Subcommand, Debug)]
enum AnalyticsCommand {
    /// Print counts, regional shares and rankings for a report export
    Summary(SummaryArgs),
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

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Offices {
            command: OfficesCommand::Nearest(args),
        } => run_offices_nearest(args).await,
        Command::Analytics {
            command: AnalyticsCommand::Summary(args),
        } => run_analytics_summary(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
