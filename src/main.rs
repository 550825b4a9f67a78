#![forbid(unsafe_code)]

//! sth — Singlish Transliteration Harness CLI entry point.

use clap::Parser;

mod cli_app;

#[tokio::main]
async fn main() {
    let args = cli_app::Cli::parse();
    match cli_app::run(&args).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("sth: {e}");
            std::process::exit(cli_app::fatal_exit_code(&e));
        }
    }
}
