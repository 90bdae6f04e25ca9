use crate::demo::{run_catalog, run_demo, CatalogArgs, DemoArgs};
use crate::server;
use academy_enrollment::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Academy Enrollment",
    about = "Run the learner registration service or walk through the enrollment wizard",
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
    /// Walk a sample learner through the seven-step registration wizard
    Demo(DemoArgs),
    /// Print the programs, classifications and disability types offered
    Catalog(CatalogArgs),
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
        Command::Demo(args) => {
            tokio::task::spawn_blocking(move || run_demo(args))
                .await
                .map_err(|err| AppError::Io(std::io::Error::other(err)))?
        }
        Command::Catalog(args) => run_catalog(args),
    }
}
