//! Entry point for the hashcache CLI.

use clap::Parser;
use hashcache::cli::Cli;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = hashcache::run(&cli) {
        // {:#} renders the whole context chain on one line.
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
