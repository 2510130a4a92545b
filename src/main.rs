use crate::cli::run;

pub mod cli;
mod config;
pub mod domain;
pub mod http;
pub mod library;
mod public_endpoint;

fn main() {
    if let Err(err) = run() {
        log::error!("{err:#}");
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
