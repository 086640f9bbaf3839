mod cli;
mod tracing;

use std::process;

use anyhow::Result;

// Keep this thin. Argument handling lives in `cli::run`.
fn main() -> Result<()> {
    let exit_code = cli::run()?;
    process::exit(exit_code)
}
