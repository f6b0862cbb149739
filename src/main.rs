//! Command-line driver: opens the two files named on the command line and
//! hands them to [`asm8086::assemble`], matching the original tool's
//! argument and exit-code contract (spec.md §6).

use std::env;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.len() != 3 {
        eprintln!("Error: invalid number of arguments, expected 2");
        eprintln!("Correct Usage: asm8086 input.asm output");
        return ExitCode::FAILURE;
    }

    let in_name = &args[1];
    let out_name = &args[2];

    if !in_name.ends_with(".asm") {
        eprintln!("Error: input file does not end with .asm");
        return ExitCode::FAILURE;
    }

    let input = match File::open(in_name) {
        Ok(f) => BufReader::new(f),
        Err(e) => {
            eprintln!("Error with input file '{in_name}': {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut output = match File::create(out_name) {
        Ok(f) => BufWriter::new(f),
        Err(e) => {
            eprintln!("Error with output file '{out_name}': {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = asm8086::assemble(input, &mut output) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
