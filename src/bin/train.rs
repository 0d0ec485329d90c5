use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blackjack_dqn::config::AppConfig;
use blackjack_dqn::export::Quantization;
use blackjack_dqn::training::TrainingSession;

/// Train a blackjack play policy and export it for the game client.
#[derive(Parser)]
#[command(name = "train", about = "Train a blackjack DQN policy")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override number of training episodes
    #[arg(long)]
    episodes: Option<usize>,

    /// Override replay batch size
    #[arg(long)]
    batch_size: Option<usize>,

    /// Override learning rate
    #[arg(long)]
    lr: Option<f64>,

    /// Seed every random source for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Override the exported model path
    #[arg(long)]
    model_out: Option<PathBuf>,

    /// Override the training stats path
    #[arg(long)]
    stats_out: Option<PathBuf>,

    /// Export full-precision weights instead of int8
    #[arg(long)]
    no_quantize: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_default_config {
        print!("{}", AppConfig::default_toml()?);
        return Ok(());
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Apply CLI overrides
    if let Some(episodes) = cli.episodes {
        app_config.training.num_episodes = episodes;
    }
    if let Some(batch_size) = cli.batch_size {
        app_config.agent.batch_size = batch_size;
    }
    if let Some(lr) = cli.lr {
        app_config.agent.learning_rate = lr;
    }
    if cli.seed.is_some() {
        app_config.training.seed = cli.seed;
    }
    if let Some(path) = cli.model_out {
        app_config.export.model_path = path;
    }
    if let Some(path) = cli.stats_out {
        app_config.export.stats_path = path;
    }
    if cli.no_quantize {
        app_config.export.quantization = Quantization::None;
    }
    app_config.validate().context("invalid configuration")?;

    let mut session = TrainingSession::new(app_config.training.clone(), app_config.agent.clone());
    session.run().context("training failed")?;

    let eval_hands = app_config.training.eval_hands;
    if eval_hands > 0 {
        let eval = session.evaluate(eval_hands).context("evaluation failed")?;
        println!(
            "Greedy policy over {} hands: win {:.1}% | push {:.1}% | loss {:.1}% | avg reward {:.3}",
            eval.agent.hands,
            eval.agent.win_rate() * 100.0,
            eval.agent.push_rate() * 100.0,
            eval.agent.loss_rate() * 100.0,
            eval.agent.average_reward(),
        );
        println!(
            "Random baseline over {} hands: win {:.1}% | push {:.1}% | loss {:.1}% | avg reward {:.3}",
            eval.baseline.hands,
            eval.baseline.win_rate() * 100.0,
            eval.baseline.push_rate() * 100.0,
            eval.baseline.loss_rate() * 100.0,
            eval.baseline.average_reward(),
        );
    }

    let report = session
        .export(&app_config.export)
        .with_context(|| format!("exporting model to {}", app_config.export.model_path.display()))?;
    let stats = session
        .record_stats(&app_config.export.stats_path)
        .with_context(|| format!("writing stats to {}", app_config.export.stats_path.display()))?;

    println!(
        "Model saved to {} ({:.1} KB, {:?})",
        report.path.display(),
        report.bytes as f64 / 1024.0,
        report.quantization
    );
    println!(
        "Stats saved to {} | episodes {} | final avg reward {:.3} | max {:.1} | min {:.1}",
        app_config.export.stats_path.display(),
        stats.episodes,
        stats.final_avg_reward,
        stats.max_reward,
        stats.min_reward
    );

    let agent = session.into_agent();
    tracing::debug!(updates = agent.step_count(), "session closed");
    Ok(())
}
