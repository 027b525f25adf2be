use crate::demo::{print_schema, run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use quote_intake::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Quote Intake",
    about = "Serve and demonstrate the guided quote-request wizard",
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
    /// Walk a scripted quote request through all five wizard steps
    Demo(DemoArgs),
    /// Print the per-step validation table
    Schema,
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
        Command::Demo(args) => run_demo(args).await,
        Command::Schema => {
            print_schema();
            Ok(())
        }
    }
}
