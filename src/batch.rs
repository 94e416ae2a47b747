//! The `flower-detect` flow: one local image in, the raw API response and a
//! textual summary out.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;

use crate::constants::{DEFAULT_INPUT_IMAGE, RESULTS_FILE_NAME};
use crate::{AppConfig, DetectionClient, Outcome, image_processor, output};

const RULE: &str = "============================================================";

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub image: PathBuf,
    pub prompt: Option<String>,
    pub output: PathBuf,
    pub config: Option<PathBuf>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            image: PathBuf::from(DEFAULT_INPUT_IMAGE),
            prompt: None,
            output: PathBuf::from(RESULTS_FILE_NAME),
            config: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Completed { summary: String, results_path: PathBuf },
    NoDetections,
}

/// Runs one analysis and prints progress to `out`.
///
/// Configuration and the image are checked before any request is sent. The
/// results file is written only when there is at least one usable detection.
pub async fn run<F, W>(options: &BatchOptions, env: F, out: &mut W) -> anyhow::Result<BatchOutcome>
where
    F: Fn(&str) -> Option<String>,
    W: Write,
{
    let mut config = AppConfig::load_with(options.config.as_deref(), env)?;
    if let Some(prompt) = &options.prompt {
        config.override_prompt(prompt.as_str())?;
    }
    let api_key = config.require_api_key()?;

    let image = image_processor::process_image_from_path(&options.image)?;

    writeln!(out, "{RULE}")?;
    writeln!(out, "🌸 AUTOMATED FLOWER PHENOTYPING")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "🔍 Analyzing: {}", options.image.display())?;
    writeln!(out, "📝 Prompt: '{}'", config.detection.prompt)?;
    writeln!(out, "{}", "-".repeat(60))?;

    let client = DetectionClient::new(config.detection, api_key)?;
    let analysis = client.analyze(&image).await?;

    let Outcome::Detected(report) = &analysis.outcome else {
        writeln!(out, "No flowers detected")?;
        return Ok(BatchOutcome::NoDetections);
    };

    output::write_json_pretty(&options.output, &analysis.raw_response)
        .with_context(|| format!("failed to write {}", options.output.display()))?;
    writeln!(out, "Results saved to: {}", options.output.display())?;

    let summary = output::format_summary(report);
    writeln!(out)?;
    writeln!(out, "{summary}")?;
    writeln!(out, "\n✅ Analysis complete!")?;

    Ok(BatchOutcome::Completed {
        summary,
        results_path: options.output.clone(),
    })
}
