use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use genetic_lander::headless::TrainingRun;
use genetic_lander::lander::ThrusterLayout;
use genetic_lander::SimulationConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// RON configuration file (defaults to ./lander.ron when present)
    config: Option<PathBuf>,

    /// Number of generations to train
    #[arg(short = 'g', long)]
    generations: Option<usize>,

    /// Screen width in pixels
    #[arg(long)]
    width: Option<f32>,

    /// Screen height in pixels
    #[arg(long)]
    height: Option<f32>,

    /// Thruster layout: twin-flame or pulse-rocker
    #[arg(long)]
    layout: Option<ThrusterLayout>,

    /// Seed for terrain and evolution
    #[arg(long)]
    seed: Option<u64>,

    /// Resume from a population checkpoint (ckpt-<generation>.ron)
    #[arg(long)]
    resume: Option<PathBuf>,

    /// Parent directory for run folders
    #[arg(long)]
    output: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let mut config = SimulationConfig::load(args.config.as_deref())?;
    apply_overrides(&mut config, &args);
    config.validate().context("Invalid configuration")?;

    log::info!("Starting headless lander training");
    log::info!(
        "  Screen: {}x{}",
        config.screen.width,
        config.screen.height
    );
    log::info!("  Layout: {:?}", config.lander.layout);
    log::info!("  Generations: {}", config.training.generations);
    log::info!("  Population: {}", config.training.population_size);
    log::info!("  Output: {}", config.training.output_dir);

    let mut run = match &args.resume {
        Some(checkpoint) => TrainingRun::resume(config, checkpoint)?,
        None => TrainingRun::new(config)?,
    };

    match run.run()? {
        Some(winner) => log::info!(
            "Best genome {} (fitness {:.2}) in {}",
            winner.id,
            winner.fitness.unwrap_or(f32::NAN),
            run.run_dir().display()
        ),
        None => log::warn!("No generation completed, nothing to save"),
    }
    Ok(())
}

/// Command-line values take precedence over the configuration file
fn apply_overrides(config: &mut SimulationConfig, args: &Args) {
    if let Some(generations) = args.generations {
        config.training.generations = generations;
    }
    if let Some(width) = args.width {
        config.screen.width = width;
    }
    if let Some(height) = args.height {
        config.screen.height = height;
    }
    if let Some(layout) = args.layout {
        config.lander.layout = layout;
        config.lander.thrust = layout.nominal_thrust();
    }
    if let Some(seed) = args.seed {
        config.training.seed = Some(seed);
    }
    if let Some(output) = &args.output {
        config.training.output_dir = output.clone();
    }
}
