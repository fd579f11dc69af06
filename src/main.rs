use clap::Parser;
use lineport::console::{Cli, run};
use log::error;

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
