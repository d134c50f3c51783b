use clap::Parser as _;
use peg_engine::{calc, Options};
use std::fs;
use std::path::PathBuf;
use std::process::exit;

#[derive(clap::Parser)]
#[command(name = "peg-calc", version)]
#[command(about = "Evaluate an arithmetic expression read from a file")]
struct Args {
    /// Accept an expression followed by input that is not part of it
    #[arg(long)]
    partial: bool,

    /// File containing the expression
    file: PathBuf,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    let input = match fs::read_to_string(&args.file) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("error: cannot read {}: {}", args.file.display(), e);
            exit(1);
        }
    };

    let parser = calc::parser().with_options(Options { allow_partial: args.partial });
    let file = args.file.display().to_string();

    match parser.parse_file(&input, &file) {
        Ok(value) => println!("{}", value),
        Err(e) => {
            eprintln!("{}", e);
            exit(2);
        }
    }
}
