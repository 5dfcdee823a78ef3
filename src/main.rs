mod catalogue;
mod cli;
mod codec;
mod error;
mod geo;
mod graph;
mod render;
mod requests;
mod router;
mod settings;
mod shortest_paths;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read base requests on stdin, build the catalogue and routing graph,
    /// and write the binary archive.
    #[command(name = "make_base")]
    MakeBase,
    /// Read stat requests on stdin, answer them against a previously built
    /// archive, and write the JSON response array to stdout.
    #[command(name = "process_requests")]
    ProcessRequests,
}

fn main() {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    let result = match args.command {
        Command::MakeBase => cli::make_base(),
        Command::ProcessRequests => cli::process_requests(),
    };

    if let Err(err) = result {
        log::error!("{err}");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
