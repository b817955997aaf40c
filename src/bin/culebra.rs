//! Thin demo entry point: `culebra <file>` interprets a script and prints
//! whatever it writes to stdout; `culebra --emit-llvm <file>` lowers it to
//! textual LLVM IR on stdout instead. No subcommands, no REPL — just enough
//! to run an example end to end.

use std::fs;
use std::io::{self, Write};

use anyhow::{anyhow, Context, Result};
use log::{error, info};

fn main() -> std::process::ExitCode {
    simple_logger::init_with_level(log::Level::Warn).ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            std::process::ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<()> {
    let (emit_llvm, path) = match args {
        [flag, path] if flag == "--emit-llvm" => (true, path.as_str()),
        [path] => (false, path.as_str()),
        _ => return Err(anyhow!("usage: culebra [--emit-llvm] <file>")),
    };

    info!("reading {path}");
    let source = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;

    if emit_llvm {
        let ir = culebra::emit_llvm_ir(&source).map_err(|e| anyhow!("{e}"))?;
        print!("{ir}");
    } else {
        let stdin = io::stdin();
        let mut input = String::new();
        io::Read::read_to_string(&mut stdin.lock(), &mut input).ok();
        let output = culebra::run_to_string(&source, &input).map_err(|e| anyhow!("{e}"))?;
        print!("{output}");
        io::stdout().flush().ok();
    }

    Ok(())
}
