use clap::Parser;
use file_collector::cli::{Cli, run_cli};
use file_collector::output::OutputFormatter;
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = run_cli(&cli) {
        OutputFormatter::error(&format!("Error: {}", e));
        process::exit(1);
    }
}
