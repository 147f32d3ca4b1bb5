mod audio;
mod auth;
mod clip;
mod config;
mod constants;
mod enrollment;
mod features;
mod pattern;
mod similarity;
mod spectral;

use anyhow::Result;
use audio::AudioCapture;
use auth::{AuthError, EnrollmentStatus};
use clap::{Parser, Subcommand};
use config::Config;
use enrollment::FileStore;
use pattern::{Pattern, PatternFileStore};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "voiceguard")]
#[command(about = "Local voiceprint and pattern-lock authentication", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record (or load) a voice sample and save it as the enrolled voiceprint
    Enroll {
        /// Use a WAV clip instead of recording from the microphone
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Record (or load) a voice sample and match it against the enrolled voiceprint
    Auth {
        /// Use a WAV clip instead of recording from the microphone
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Show whether a voiceprint is enrolled
    Status,
    /// Delete the enrolled voiceprint
    Reset,
    /// Print the extracted feature set of a WAV clip (debugging aid)
    Analyze {
        /// WAV clip to analyze
        file: PathBuf,
    },
    /// Pattern-lock operations
    Pattern {
        #[command(subcommand)]
        action: PatternAction,
    },
}

#[derive(Subcommand)]
enum PatternAction {
    /// Enroll a dot sequence, e.g. 0-4-8-5
    Enroll { sequence: String },
    /// Verify a dot sequence against the enrolled pattern
    Verify { sequence: String },
    /// Delete the enrolled pattern
    Clear,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Enroll { file } => enroll_command(file),
        Commands::Auth { file } => auth_command(file),
        Commands::Status => status_command(),
        Commands::Reset => reset_command(),
        Commands::Analyze { file } => analyze_command(&file),
        Commands::Pattern { action } => pattern_command(action),
    }
}

/// Obtain a sample buffer: decode the given clip, or record from the microphone
fn capture_samples(file: Option<PathBuf>, config: &Config) -> Result<Vec<f32>> {
    if let Some(path) = file {
        return clip::load_wav(&path);
    }

    let mut capture = AudioCapture::new()?;
    println!(
        "Recording for {} seconds... speak your phrase now",
        config.capture.record_duration_secs
    );
    capture.start_recording()?;
    std::thread::sleep(Duration::from_secs(config.capture.record_duration_secs));
    let samples = capture.stop_recording()?;

    if AudioCapture::is_silence(&samples, config.capture.silence_threshold) {
        println!("⚠️  The recording sounds silent - check your microphone level");
    }

    Ok(samples)
}

fn enroll_command(file: Option<PathBuf>) -> Result<()> {
    let config = Config::load_or_create()?;
    let store = FileStore::open_default()?;

    let samples = capture_samples(file, &config)?;
    println!("Extracting voiceprint features...");
    let features = features::extract(&samples);

    if features.is_empty() {
        println!("⚠️  No usable audio in the recording - the voiceprint will never authenticate");
    }

    let record = auth::enroll(&store, features)?;
    println!("✅ Voiceprint saved (enrolled at {} ms)", record.timestamp);
    println!("You can now authenticate with: voiceguard auth");
    Ok(())
}

fn auth_command(file: Option<PathBuf>) -> Result<()> {
    let config = Config::load_or_create()?;
    let store = FileStore::open_default()?;

    let samples = capture_samples(file, &config)?;
    println!("Analyzing voice sample...");
    let candidate = features::extract(&samples);

    match auth::authenticate(&store, &candidate) {
        Ok(outcome) => {
            println!();
            println!("Similarity: {}%  {}", outcome.percentage, similarity_bar(outcome.percentage));
            if outcome.accepted {
                println!("✅ Authentication successful");
                println!("🔓 Access Granted");
            } else {
                println!(
                    "❌ Authentication failed - similarity {}% (required: 85%)",
                    outcome.percentage
                );
                println!("🔒 Access Denied");
            }
        }
        Err(AuthError::MissingEnrollment) => {
            println!("No voiceprint enrolled yet. Run: voiceguard enroll");
        }
        Err(AuthError::Store(e)) => return Err(e),
    }
    Ok(())
}

fn status_command() -> Result<()> {
    let store = FileStore::open_default()?;
    match auth::status(&store)? {
        EnrollmentStatus::Enrolled { timestamp } => {
            println!("✅ Voiceprint enrolled ({} ms since epoch)", timestamp);
        }
        EnrollmentStatus::Unenrolled => {
            println!("No voiceprint enrolled. Run: voiceguard enroll");
        }
    }
    Ok(())
}

fn reset_command() -> Result<()> {
    let store = FileStore::open_default()?;
    auth::reset(&store)?;
    println!("Voiceprint enrollment has been reset. Enroll again to authenticate.");
    Ok(())
}

fn analyze_command(file: &PathBuf) -> Result<()> {
    let samples = clip::load_wav(file)?;
    let features = features::extract(&samples);

    println!("Feature set for {}:", file.display());
    println!("  mfcc:             {:?}", features.mfcc);
    println!("  spectralCentroid: {:.3} Hz", features.spectral_centroid);
    println!("  spectralRolloff:  {:.3} Hz", features.spectral_rolloff);
    println!("  spectralFlatness: {:.6}", features.spectral_flatness);
    println!("  zcr:              {:.6}", features.zcr);
    println!("  rms:              {:.6}", features.rms);
    println!("  chroma:           {:?}", features.chroma);
    if features.is_empty() {
        println!("  (degenerate: buffer too short or silent)");
    }
    Ok(())
}

fn pattern_command(action: PatternAction) -> Result<()> {
    let store = PatternFileStore::open_default()?;

    match action {
        PatternAction::Enroll { sequence } => match Pattern::parse(&sequence) {
            Ok(p) => {
                pattern::enroll(&store, &p)?;
                println!("✅ Pattern enrolled. You can now verify with: voiceguard pattern verify");
            }
            Err(e) => println!("❌ {}", e),
        },
        PatternAction::Verify { sequence } => match Pattern::parse(&sequence) {
            Ok(attempt) => match pattern::verify(&store, &attempt) {
                Ok(true) => println!("✅ Authentication successful"),
                Ok(false) => println!("❌ Try again"),
                Err(pattern::PatternError::NotEnrolled) => {
                    println!("No pattern enrolled yet. Run: voiceguard pattern enroll");
                }
                Err(e) => println!("❌ {}", e),
            },
            Err(e) => println!("❌ {}", e),
        },
        PatternAction::Clear => {
            pattern::clear(&store)?;
            println!("Pattern enrollment has been cleared.");
        }
    }
    Ok(())
}

/// ASCII rendering of the similarity fill bar
fn similarity_bar(percentage: i32) -> String {
    let filled = (percentage.clamp(0, 100) as usize) / 10;
    let mut bar = String::from("[");
    for i in 0..10 {
        bar.push(if i < filled { '█' } else { '-' });
    }
    bar.push(']');
    bar
}
