use std::path::PathBuf;
use std::process::ExitCode;

use agvision::batch::{self, BatchOptions, BatchOutcome};
use agvision::constants::{DEFAULT_INPUT_IMAGE, RESULTS_FILE_NAME};
use arboard::Clipboard;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "Count flowers in a photo and summarize their sizes", long_about = None)]
struct Args {
    /// Path to the image file
    #[arg(long, default_value = DEFAULT_INPUT_IMAGE)]
    image: PathBuf,

    /// Detection prompt (overrides config)
    #[arg(long)]
    prompt: Option<String>,

    /// Where to write the raw API response
    #[arg(long, default_value = RESULTS_FILE_NAME)]
    output: PathBuf,

    /// TOML config file (overrides AGVISION_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Copy the summary to the clipboard
    #[arg(long)]
    clip: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    let options = BatchOptions {
        image: args.image,
        prompt: args.prompt,
        output: args.output,
        config: args.config,
    };

    let mut stdout = std::io::stdout();
    match batch::run(&options, |key| std::env::var(key).ok(), &mut stdout).await {
        Ok(BatchOutcome::Completed { summary, .. }) => {
            if args.clip {
                copy_to_clipboard(&summary);
            }
            ExitCode::SUCCESS
        }
        Ok(BatchOutcome::NoDetections) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn copy_to_clipboard(text: &str) {
    match Clipboard::new() {
        Ok(mut clipboard) => {
            if let Err(e) = clipboard.set_text(text) {
                eprintln!("Failed to copy to clipboard: {}", e);
            }
        }
        Err(e) => eprintln!("Failed to initialize clipboard: {}", e),
    }
}
