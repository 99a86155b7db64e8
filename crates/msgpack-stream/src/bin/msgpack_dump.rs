//! `msgpack-dump`: print a MessagePack stream (file or stdin) as JSON.
//!
//! Usage:
//!   msgpack-dump [--events] [--skip N] [FILE]

use std::fs::File;
use std::io::{self, BufWriter, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use msgpack_stream::cli::{dump, DumpOptions};

#[derive(Debug, Parser)]
#[command(name = "msgpack-dump", version, about = "Print MessagePack values as JSON")]
struct Args {
    /// Input file; stdin when omitted.
    path: Option<PathBuf>,
    /// Print the token stream, indented by nesting depth.
    #[arg(long)]
    events: bool,
    /// Skip this many top-level values first.
    #[arg(long, default_value_t = 0)]
    skip: u64,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let input: Box<dyn Read> = match &args.path {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(file),
            Err(e) => {
                eprintln!("{}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(io::stdin().lock()),
    };
    let options = DumpOptions {
        events: args.events,
        skip: args.skip,
    };
    match dump(input, BufWriter::new(io::stdout().lock()), &options) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
