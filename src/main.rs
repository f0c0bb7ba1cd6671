use std::env;
use std::fs;
use std::io;
use std::io::prelude::*;
use std::process;

use anyhow::{Context, Result};
use log::debug;

use loxcore::Config;
use loxcore::VM;

static NAME: &str = "loxcore";

const EX_USAGE: i32 = 64;
const EX_IOERR: i32 = 74;

fn main() {
    env_logger::init();

    let args = env::args().collect::<Vec<String>>();
    let status = match args.len() {
        1 => match run_prompt() {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("[{}] {:#}", NAME, err);
                EX_IOERR
            }
        },
        2 => match run_file(&args[1]) {
            Ok(status) => status,
            Err(err) => {
                eprintln!("[{}] {:#}", NAME, err);
                EX_IOERR
            }
        },
        _ => {
            eprintln!("Usage: {} [script]", NAME);
            EX_USAGE
        }
    };

    process::exit(status);
}

fn run_file(path: &str) -> Result<i32> {
    let source =
        fs::read_to_string(path).with_context(|| format!("could not read file \"{}\"", path))?;
    debug!("running {} ({} bytes)", path, source.len());
    let mut vm = VM::with_config(Config::from_env(), io::stdout());
    Ok(vm.interpret(&source).exit_code())
}

fn run_prompt() -> Result<()> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut vm = VM::with_config(Config::from_env(), io::stdout());
    let mut line = String::new();
    loop {
        {
            let mut stdout = io::stdout();
            stdout.write_all(b"> ")?;
            stdout.flush()?;
        }
        line.clear();
        let n = reader.read_line(&mut line).context("could not read input")?;
        if n == 0 {
            println!();
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        vm.interpret(&line);
    }
    Ok(())
}
