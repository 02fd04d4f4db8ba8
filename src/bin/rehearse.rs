//! Rehearse CLI
//!
//! Inspect an annotation document and dry-run it against a simulated player.
//! Built with `--features cli`.
//!
//! # Usage
//! - `rehearse tutorial.md` - print the table of contents
//! - `rehearse tutorial.md --json` - print the parsed document as JSON
//! - `rehearse tutorial.md --simulate 60000` - play the first minute and
//!   report every annotation that fires

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rehearseur::formatting::format_time;
use rehearseur::navigation::{MemoryLocation, SimulatedPlayer};
use rehearseur::presentation::TocBadge;
use rehearseur::{build_toc, parse_annotations, AnnotationFile, NavigationEngine, PlayerConfig};

/// Inspect and dry-run annotation documents
#[derive(Parser)]
#[command(name = "rehearse")]
#[command(author, version, about = "Inspect and dry-run annotation documents")]
struct Cli {
    /// Annotation document (markdown)
    file: PathBuf,

    /// Print the parsed document as JSON
    #[arg(long)]
    json: bool,

    /// Play the document for this many milliseconds, resuming after every pause
    #[arg(long, value_name = "MS")]
    simulate: Option<u64>,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rehearseur=info,rehearse=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = PlayerConfig::from_env().context("Invalid REHEARSEUR_* configuration")?;
    debug!(?config, "configuration loaded");

    let cli = Cli::parse();

    let markdown = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;
    let file = parse_annotations(&markdown);
    info!(
        title = %file.title,
        annotations = file.annotations.len(),
        sections = file.sections.len(),
        "parsed {}",
        cli.file.display()
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&file)?);
    } else {
        print_toc(&file, &config);
    }

    if let Some(duration) = cli.simulate {
        simulate(&file, config, duration);
    }

    Ok(())
}

fn print_toc(file: &AnnotationFile, config: &PlayerConfig) {
    let toc = build_toc(file, 0, &config.default_color);

    println!("{} (version {})", toc.title, file.version);
    for section in &toc.sections {
        println!();
        println!("{}  [{}]", section.title, section.id);
        for item in &section.items {
            let badges: Vec<&str> = item
                .badges
                .iter()
                .map(|badge| match badge {
                    TocBadge::Pause => "pause",
                    TocBadge::Highlight => "highlight",
                })
                .collect();

            let mut line = format!("  {:>6}  {}  #{}", item.time, item.title, item.id);
            if !badges.is_empty() {
                line.push_str(&format!("  ({})", badges.join(", ")));
            }
            println!("{}", line);
        }
    }
}

/// Drive the engine with a virtual clock, the way the browser polling loop
/// would, and report each annotation as it fires.
fn simulate(file: &AnnotationFile, config: PlayerConfig, duration: u64) {
    let step = u64::from(config.polling_interval_ms);
    let mut engine = NavigationEngine::with_player(
        config,
        file,
        SimulatedPlayer::with_duration(duration),
        MemoryLocation::new(),
    );

    println!();
    println!("Simulating {}", format_time(duration));

    engine.play();
    let mut reported = 0;
    let mut resumes = 0;

    loop {
        engine.tick();

        let fired: Vec<String> = engine.location().writes()[reported..].to_vec();
        reported += fired.len();
        for id in &fired {
            let Some(annotation) = file.find_by_id(id) else {
                continue;
            };
            let mut effects = Vec::new();
            if !engine.is_playing() {
                effects.push("pause");
            }
            if engine.active_annotation().is_some_and(|active| active.id == *id) {
                effects.push("overlay");
            }
            println!(
                "  {:>6}  {}  {}",
                format_time(annotation.timestamp),
                annotation.title,
                if effects.is_empty() { "-".to_string() } else { effects.join(", ") }
            );
        }

        let finished = engine.player().is_some_and(|player| player.is_finished());
        if finished {
            break;
        }

        if !engine.is_playing() {
            resumes += 1;
            debug!(time_ms = engine.current_time(), "resuming after pause");
            engine.play();
        }

        if let Some(player) = engine.player_mut() {
            player.advance(step);
        }
    }

    info!(
        triggered = engine.triggered_count(),
        total = file.annotations.len(),
        resumes,
        "simulation finished"
    );
}
