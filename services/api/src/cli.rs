use crate::recommend::{run_recommend, RecommendArgs};
use crate::server;
use crate::train::{run_train, TrainArgs};
use clap::{Args, Parser, Subcommand};
use stat_selector::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Statistical Test Selector",
    about = "Recommend a classical statistical test for a research design",
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
    /// Evaluate one research design and print the recommendation
    Recommend(RecommendArgs),
    /// Fit the encoder and decision tree from a labelled CSV corpus
    Train(TrainArgs),
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
        Command::Recommend(args) => run_recommend(args),
        Command::Train(args) => run_train(args),
    }
}
