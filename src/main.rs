//! Speakwise - resilient text-to-speech from the command line
//!
//! Speaks with the local espeak-ng voices when they cover the language and
//! falls back to the remote speech mirrors otherwise.

use anyhow::Result;
use clap::{Parser, Subcommand};
use speakwise::audio::SoundEngine;
use speakwise::config::Config;
use speakwise::languages::{self, SUPPORTED_LANGUAGES};
use speakwise::remote::HttpAudioBackend;
use speakwise::tts::espeak::EspeakPlatform;
use speakwise::{SpeakOptions, SpeechOrchestrator, Spoken};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Speak some text
    Speak {
        text: String,

        /// Language tag, e.g. ja-JP
        #[arg(short, long)]
        lang: Option<String>,

        #[arg(long)]
        rate: Option<f32>,

        #[arg(long)]
        pitch: Option<f32>,

        #[arg(long)]
        volume: Option<f32>,

        /// Never use the remote speech service
        #[arg(long)]
        no_remote: bool,
    },
    /// List local voices
    Voices,
    /// List supported languages
    Languages,
    /// Probe local and remote support for every supported language
    Probe,
    /// Print the player status as JSON
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Setup logging
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_lowercase()))
    };
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🗣️ Speakwise v{} starting...", env!("CARGO_PKG_VERSION"));

    let platform = Arc::new(EspeakPlatform::default());
    let audio = Arc::new(HttpAudioBackend::new(
        SoundEngine::new()?,
        config.mirror_start_timeout(),
    )?);
    let speech = SpeechOrchestrator::from_config(&config, platform, audio);
    speech.init().await;

    match args.command {
        Command::Speak {
            text,
            lang,
            rate,
            pitch,
            volume,
            no_remote,
        } => {
            if no_remote {
                speech.set_remote_fallback(false);
            }
            let options = SpeakOptions {
                rate,
                pitch,
                volume,
                lang,
            };
            tokio::select! {
                result = speech.speak(&text, &options) => match result? {
                    Spoken::Local => info!("✅ Spoken locally"),
                    Spoken::Remote { mirror } => info!("✅ Spoken remotely (mirror {})", mirror),
                    Spoken::Skipped => info!("Nothing to say"),
                    Spoken::Cancelled => info!("🛑 Cancelled"),
                },
                _ = tokio::signal::ctrl_c() => {
                    speech.stop();
                    info!("🛑 Stopped");
                }
            }
        }
        Command::Voices => {
            for voice in speech.catalog().voices() {
                println!("{:<12} {}", voice.lang, voice.name);
            }
        }
        Command::Languages => {
            for entry in SUPPORTED_LANGUAGES.iter() {
                println!(
                    "{:<6} {:<8} {:<6} {}",
                    entry.tag,
                    languages::remote_code(entry.tag),
                    if speech.catalog().is_supported(entry.tag) {
                        "local"
                    } else {
                        "-"
                    },
                    entry.display_name
                );
            }
        }
        Command::Probe => {
            let reports = speech.test_all_languages().await;
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        Command::Status => {
            println!("{}", serde_json::to_string_pretty(&speech.status())?);
        }
    }

    Ok(())
}
