use grid_nav::config::{Cli, Config};
use grid_nav::simulation::Simulation;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let config = if let Some(config_file) = cli.config.as_ref() {
        let config_str = std::fs::read_to_string(config_file)
            .with_context(|| format!("error reading config file: {config_file}"))?;
        Config::from_yaml_str(&config_str)
            .with_context(|| format!("error with config file: {config_file}"))?
    } else {
        info!("No config file specified, using default config");
        Config::default()
    }
    .override_from_command_line(&cli)?;

    let mut simulation = Simulation::new(&config)?;
    for agent in simulation.agents() {
        info!(
            "Agent {} ({}) starts at {:?}",
            agent.id,
            agent.strategy.name(),
            agent.position
        );
    }

    let summary = if config.concurrent {
        tokio::runtime::Runtime::new()?.block_on(simulation.run_concurrent())?
    } else {
        simulation.run()
    };

    for agent in &summary.agents {
        info!(
            "Agent {} ({}) collected {} goals, ends at {:?}",
            agent.id,
            agent.strategy.name(),
            agent.collected,
            agent.position
        );
    }

    if let Some(output_path) = config.output_path.as_ref() {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(output_path, json)
            .with_context(|| format!("error writing summary to {output_path}"))?;
        info!("Summary written to {output_path}");
    }

    Ok(())
}
