use clap::Parser;
use paratus::{Config, Reactor, shutdown};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let config = Config::parse();

    shutdown::install()?;
    Reactor::bind(&config)?.run()?;

    Ok(())
}
