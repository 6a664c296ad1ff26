use std::path::PathBuf;
use std::process;

use rox as lox;

use anyhow::anyhow;
use clap::error::ErrorKind;
use clap::Parser as ClapParser;

use lox::runner::Lox;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Lox script to execute; omit to start the interactive prompt
    script: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,

        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit();
        }

        Err(_) => {
            eprintln!("Usage: rox [script]");
            process::exit(64);
        }
    };

    let mut lox = Lox::new(std::io::stdout());

    // LoxError carries interpreter values and is not Send, so it converts to
    // anyhow by message rather than through `?`.
    match args.script {
        Some(path) => {
            let code = lox.run_file(&path).map_err(|e| anyhow!(e.to_string()))?;
            process::exit(code);
        }

        None => lox.run_prompt().map_err(|e| anyhow!(e.to_string()))?,
    }

    Ok(())
}
