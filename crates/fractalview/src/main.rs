mod cli;
mod headless;
mod paths;
mod run;
mod script;
mod tracker;

use anyhow::Result;

fn main() -> Result<()> {
    let args = cli::parse();
    run::run(args)
}
