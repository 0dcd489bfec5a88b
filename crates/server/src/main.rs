//! fragsim server binary: compare uploaded images against a fixed
//! reference over a minimal HTTP interface.

use server::ServerConfig;

fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(config.log_level.as_str())
        .with_target(false)
        .init();

    server::run(config)
}
