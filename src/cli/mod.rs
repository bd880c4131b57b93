// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and delegates to Layer 2:
//
//   1. `train`    — trains the VAE, checkpointing every epoch
//   2. `evaluate` — reconstructs images and reports losses
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "lens-vae",
    version,
    about = "Train and evaluate a convolutional VAE on gravitational-lensing images."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}'", args.data_path);
    let checkpoint_path = args.checkpoint_path.clone();
    let history = TrainUseCase::new(args.into()).execute()?;

    match (history.first(), history.last()) {
        (Some(first), Some(last)) => println!(
            "Training complete: {} epochs, loss {:.6} → {:.6}. Weights in '{}'.",
            history.len(), first, last, checkpoint_path
        ),
        _ => println!("Training complete (0 epochs). Weights in '{}'.", checkpoint_path),
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    tracing::info!("Evaluating '{}'", args.data_path);
    let report = EvaluateUseCase::new(args.into()).execute()?;

    println!(
        "Evaluated {} images | mean loss {:.6} | min {:.6} | max {:.6}",
        report.losses.len(),
        report.mean_loss(),
        report.min_loss(),
        report.max_loss(),
    );
    println!("Reconstructions: {}", report.samples_path.display());
    println!("Losses:          {}", report.losses_path.display());
    Ok(())
}
