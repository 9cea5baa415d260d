use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use aisay_core::voice::audio::wav::WavFileOutput;
use aisay_core::voice::audio::AudioOutput;
use aisay_core::voice::tts::types::OutputFormat;
use aisay_core::{SayError, Settings, SettingsManager};

mod input;

const USAGE: &str = "Usage: ai-say [-m model] [-v voice] <text>\n       echo 'text' | ai-say\n       ai-say --list";

#[derive(Parser, Debug)]
#[command(name = "ai-say")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Speak text aloud using streaming text-to-speech")]
struct Args {
    /// Synthesis model identifier
    #[arg(short, long)]
    model: Option<String>,

    /// Voice ID or name (names are matched case-insensitively)
    #[arg(short, long)]
    voice: Option<String>,

    /// List available voices and exit
    #[arg(short, long)]
    list: bool,

    /// Write audio to a WAV file instead of playing it
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Load settings from a specific file
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Text to speak. Read from standard input when omitted.
    text: Vec<String>,
}

fn main() -> ExitCode {
    if let Err(e) = setup_tracing() {
        eprintln!("warning: logging disabled: {e:#}");
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(async_main(Args::parse())) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("{e:#}");
            if matches!(e.downcast_ref::<SayError>(), Some(SayError::Config(_))) {
                eprintln!("{USAGE}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn async_main(args: Args) -> Result<()> {
    info!(
        "CLI startup: model={:?}, voice={:?}, list={}, output={:?}",
        args.model, args.voice, args.list, args.output
    );

    let manager = match args.settings {
        Some(path) => SettingsManager::from_path(path)?,
        None => SettingsManager::new()?,
    };
    let settings = manager
        .settings()
        .with_env()
        .with_model(args.model)
        .with_voice(args.voice);

    if args.list {
        return list(&settings).await;
    }

    let text = input::resolve_text(args.text).await?;
    if text.is_empty() {
        return Err(SayError::Config("no text to speak".to_string()).into());
    }
    settings.api_key()?;

    let profile = OutputFormat::pcm_s16le().profile();
    let mut output: Box<dyn AudioOutput> = match args.output {
        Some(path) => Box::new(WavFileOutput::create(path, profile)?),
        None => open_player(profile)?,
    };

    let report = aisay_core::speak(&settings, &text, output.as_mut()).await?;
    info!(
        chunks = report.chunks,
        bytes = report.bytes,
        state = ?report.state,
        "synthesis complete"
    );
    Ok(())
}

async fn list(settings: &Settings) -> Result<()> {
    for (id, name) in aisay_core::list_voices(settings).await? {
        println!("{id}\t{name}");
    }
    Ok(())
}

#[cfg(feature = "playback")]
fn open_player(profile: aisay_core::voice::audio::AudioProfile) -> Result<Box<dyn AudioOutput>> {
    use aisay_core::voice::audio::playback::StreamingPlayer;

    Ok(Box::new(StreamingPlayer::new(profile)?))
}

#[cfg(not(feature = "playback"))]
fn open_player(_profile: aisay_core::voice::audio::AudioProfile) -> Result<Box<dyn AudioOutput>> {
    Err(SayError::Config(
        "built without audio playback; use --output FILE to write a WAV file".to_string(),
    )
    .into())
}

fn setup_tracing() -> Result<()> {
    use std::fs;
    use tracing_subscriber::fmt;

    // Logs go to a file so stdout stays clean for --list
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    let trace_dir = PathBuf::from(home).join(".ai-say").join("trace");
    fs::create_dir_all(&trace_dir)?;

    let log_file = trace_dir.join("ai-say.log");
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter)
        .init();

    info!("Tracing initialized to {:?}", log_file);
    Ok(())
}
