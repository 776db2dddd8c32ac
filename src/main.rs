use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scanstruct::detection::{OcrsRecognizer, TesseractRecognizer, TextRecognizer};
use scanstruct::{OcrOptions, Pipeline, PipelineSettings};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    /// Tesseract command-line tool
    Tesseract,
    /// Pure-Rust ocrs engine
    Ocrs,
}

#[derive(Parser)]
#[command(name = "scanstruct")]
#[command(about = "Recognize text, tables and diagrams in a document image")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Text recognizer to use
    #[arg(long, value_enum, default_value = "tesseract")]
    backend: Backend,

    /// Directory holding the ocrs models
    #[arg(long, value_name = "DIR")]
    model_dir: Option<PathBuf>,

    /// Settings file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the default recognition language
    #[arg(long)]
    language: Option<String>,

    /// Override the decode/recognition timeout in seconds (0 disables it)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Skip table detection
    #[arg(long)]
    no_tables: bool,

    /// Skip diagram detection
    #[arg(long)]
    no_diagrams: bool,

    /// Use the default engine mode instead of LSTM-only
    #[arg(long)]
    no_handwriting: bool,

    /// Recognize with the configured extra languages too
    #[arg(long)]
    multi_language: bool,

    /// Let the recognizer collapse runs of spaces between words
    #[arg(long)]
    no_preserve_formatting: bool,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Pretty-print the JSON result
    #[arg(long)]
    pretty: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> OcrOptions {
        OcrOptions {
            detect_tables: !self.no_tables,
            detect_handwriting: !self.no_handwriting,
            multi_language: self.multi_language,
            preserve_formatting: !self.no_preserve_formatting,
            detect_diagrams: !self.no_diagrams,
        }
    }

    fn settings(&self) -> anyhow::Result<PipelineSettings> {
        let mut settings = match &self.config {
            Some(path) => PipelineSettings::load(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => PipelineSettings::default(),
        };
        if let Some(language) = &self.language {
            settings.default_language = language.clone();
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_secs = timeout;
        }
        settings.validate()?;
        Ok(settings)
    }

    fn recognizer(&self) -> Arc<dyn TextRecognizer> {
        match self.backend {
            Backend::Tesseract => Arc::new(TesseractRecognizer::new()),
            Backend::Ocrs => match &self.model_dir {
                Some(dir) => Arc::new(OcrsRecognizer::with_model_dir(dir)),
                None => Arc::new(OcrsRecognizer::new()),
            },
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_filter = if args.verbose {
        "scanstruct=debug"
    } else {
        "scanstruct=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = args.settings()?;

    tracing::info!("Loading image: {}", args.image_path.display());
    let bytes = std::fs::read(&args.image_path)
        .with_context(|| format!("Failed to read {}", args.image_path.display()))?;

    if bytes.len() as u64 > settings.max_file_size_bytes() {
        anyhow::bail!(
            "{} is {} bytes, larger than the {} MB limit",
            args.image_path.display(),
            bytes.len(),
            settings.max_file_size_mb
        );
    }

    let mut pipeline = Pipeline::new(args.recognizer()).with_settings(settings);
    if let Some(debug_dir) = &args.debug_out {
        pipeline = pipeline.with_debug(debug_dir.clone())?;
    }

    let result = pipeline.run(&bytes, &args.options())?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{}", json);

    Ok(())
}
