// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`    — trains the classifier on a folder of images
//   2. `live`     — labels the webcam feed in a window
//   3. `classify` — labels image files and prints the result
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{ClassifyArgs, Commands, LiveArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "season-vision",
    version,
    about = "Train a season classifier on a frozen MobileNetV2, then label a live camera feed."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Live(args)     => run_live(args),
            Commands::Classify(args) => run_classify(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on images in: {}", args.data_dir);
    TrainUseCase::new(args.into()).execute()?;

    println!("Training complete.");
    Ok(())
}

fn run_live(args: LiveArgs) -> Result<()> {
    use crate::application::live_use_case::{run_camera, StopReason};

    let summary = run_camera(&args.into())?;
    let reason  = match summary.stop_reason {
        StopReason::QuitKey     => "quit key pressed",
        StopReason::EndOfStream => "camera stopped producing frames",
    };
    println!("Stopped after {} frames ({reason}).", summary.frames);
    Ok(())
}

fn run_classify(args: ClassifyArgs) -> Result<()> {
    use crate::application::classify_use_case::{format_prediction, ClassifyUseCase};
    use crate::ml::inferencer::Inferencer;

    let inferencer = Inferencer::from_artifact(&args.model_path)?;
    let labels     = inferencer.labels().names().to_vec();

    for (path, prediction) in ClassifyUseCase::new(inferencer).execute(&args.images)? {
        println!("{}: {}", path.display(), format_prediction(&prediction, &labels));
    }
    Ok(())
}
