use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use snake_dqn::game::GameConfig;
use snake_dqn::logging;
use snake_dqn::modes::{EvaluateMode, HumanMode, PlayMode, TrainConfig, TrainMode};
use snake_dqn::rl::{default_device, DqnConfig, InferenceBackend, TrainingBackend};

#[derive(Parser)]
#[command(name = "snake_dqn")]
#[command(version, about = "Snake game with a deep Q-learning agent")]
struct Cli {
    #[arg(long, value_enum, default_value = "human")]
    mode: Mode,

    /// Grid width
    #[arg(long, default_value = "20")]
    width: usize,

    /// Grid height
    #[arg(long, default_value = "20")]
    height: usize,

    /// Episodes to train (default 1000) or evaluate (default 10)
    #[arg(long)]
    episodes: Option<usize>,

    /// Minibatch size per gradient step
    #[arg(long, default_value = "64")]
    batch_size: usize,

    /// Copy live weights into the target network every N episodes
    #[arg(long, default_value = "5")]
    target_sync_every: usize,

    /// Save a checkpoint every N episodes
    #[arg(long, default_value = "100")]
    checkpoint_every: usize,

    /// Draw every N-th training episode in the terminal (headless if unset)
    #[arg(long)]
    render_every: Option<usize>,

    /// Model path for saving (train) or loading (play, evaluate)
    #[arg(long, default_value = "models/snake_model")]
    model: PathBuf,

    /// Per-episode training metrics CSV
    #[arg(long)]
    metrics: Option<PathBuf>,

    /// Do not write the training metrics CSV
    #[arg(long)]
    no_metrics: bool,

    /// Continue training from the saved model if present
    #[arg(long)]
    resume: bool,

    /// Seed for the game and the agent
    #[arg(long)]
    seed: Option<u64>,

    /// Ticks per second when watching an agent
    #[arg(long, default_value = "30")]
    fps: u32,

    /// Log filter, e.g. "debug" or "snake_dqn=trace" (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Log file; terminal UI modes default to snake_dqn.log
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Play snake with keyboard controls
    Human,
    /// Train a DQN agent
    Train,
    /// Watch a trained agent play
    Play,
    /// Measure a trained agent without rendering
    Evaluate,
}

impl Cli {
    fn uses_terminal_ui(&self) -> bool {
        match self.mode {
            Mode::Human | Mode::Play => true,
            Mode::Train => self.render_every.is_some(),
            Mode::Evaluate => false,
        }
    }

    fn game_config(&self) -> GameConfig {
        let config = GameConfig::new(self.width, self.height);
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }

    fn train_config(&self) -> TrainConfig {
        let mut config = TrainConfig::new(self.episodes.unwrap_or(1000), self.model.clone());
        config.batch_size = self.batch_size;
        config.target_sync_every = self.target_sync_every;
        config.checkpoint_every = self.checkpoint_every;
        config.render_every = self.render_every;
        config.fps = self.fps;
        config.resume = self.resume;
        config.game_config = self.game_config();
        config.dqn_config = DqnConfig {
            seed: self.seed,
            ..DqnConfig::default()
        };

        if self.no_metrics {
            config.metrics_path = None;
        } else if let Some(path) = &self.metrics {
            config.metrics_path = Some(path.clone());
        }

        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = match (&cli.log_file, cli.uses_terminal_ui()) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => Some(PathBuf::from("snake_dqn.log")),
        (None, false) => None,
    };
    logging::init(cli.log_level.as_deref(), log_file.as_deref())?;

    let device = default_device();

    match cli.mode {
        Mode::Human => {
            let mut human_mode = HumanMode::new(cli.game_config())?;
            human_mode.run().await?;
        }
        Mode::Train => {
            let mut train_mode = TrainMode::<TrainingBackend>::new(cli.train_config(), device)?;
            if cli.render_every.is_some() {
                train_mode.run_rendered().await?;
            } else {
                train_mode.run()?;
            }
        }
        Mode::Play => {
            let mut play_mode =
                PlayMode::<InferenceBackend>::new(&cli.model, cli.game_config(), device, cli.fps)?;
            play_mode.run().await?;
        }
        Mode::Evaluate => {
            let mut evaluate_mode = EvaluateMode::<InferenceBackend>::new(
                &cli.model,
                cli.game_config(),
                device,
                cli.episodes.unwrap_or(10),
            )?;
            evaluate_mode.run()?;
        }
    }

    Ok(())
}
