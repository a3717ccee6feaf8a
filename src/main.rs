use anyhow::Result;
use rootgpt::cli;

fn main() -> Result<()> {
    cli::run()
}
