//! Cadence CLI
//!
//! Command-line interface for seeding, reviewing and inspecting SM-2 items.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use cadence_core::{quality_label, NewReviewItem, QualityPolicy, ReviewItem, Storage};
use cadence_server::api;
use cadence_server::config::{ServeArgs, ServerConfig};
use cadence_server::logging::init_tracing;

/// Cadence - SM-2 Spaced Repetition CLI
#[derive(Parser)]
#[command(name = "cadence")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CLI for the Cadence SM-2 review scheduler")]
#[command(long_about = "Cadence schedules flashcard reviews with the SM-2 algorithm.\n\nRatings run from 0 (blackout) to 5 (perfect recall); 3 and above count as a successful recall.")]
struct Cli {
    /// Directory holding cadence.db (env: CADENCE_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// How to handle ratings outside 0-5: reject, clamp or accept (env: CADENCE_QUALITY_POLICY)
    #[arg(long, global = true)]
    quality_policy: Option<QualityPolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed a new review item
    Add {
        /// Prompt text
        content: Option<String>,
        /// Lesson the item belongs to
        #[arg(long)]
        lesson: Option<String>,
        /// Explicit item id (default: random UUID)
        #[arg(long)]
        id: Option<String>,
        /// Imported easiness factor
        #[arg(long)]
        easiness: Option<f64>,
        /// Imported interval in days
        #[arg(long)]
        interval: Option<i32>,
        /// Imported repetition streak
        #[arg(long)]
        repetitions: Option<i32>,
    },

    /// Review an item with a 0-5 recall rating
    Review {
        /// Item id
        item_id: String,
        /// Recall rating (0-5)
        #[arg(allow_negative_numbers = true)]
        rating: i32,
        /// Learner performing the review
        #[arg(long, default_value = "cli")]
        user: String,
    },

    /// Show an item's schedule
    Show {
        /// Item id
        id: String,
    },

    /// Preview what each rating would do to an item
    Preview {
        /// Item id
        id: String,
    },

    /// List items due for review
    Due {
        /// Maximum number of items
        #[arg(long, default_value = "20")]
        limit: i32,
    },

    /// Show the review log for an item or a learner
    History {
        /// Item id
        #[arg(long, conflicts_with = "user", required_unless_present = "user")]
        item: Option<String>,
        /// Learner id
        #[arg(long)]
        user: Option<String>,
        /// Maximum number of sessions
        #[arg(long, default_value = "20")]
        limit: i32,
    },

    /// Show review statistics
    Stats,

    /// Create a full backup of the SQLite database
    Backup {
        /// Output file path for the backup
        output: PathBuf,
    },

    /// Run the HTTP server
    Serve(ServeArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }
    if let Some(policy) = cli.quality_policy {
        config.quality_policy = policy;
    }

    match cli.command {
        Commands::Add {
            content,
            lesson,
            id,
            easiness,
            interval,
            repetitions,
        } => run_add(
            &config,
            NewReviewItem {
                id,
                lesson_id: lesson,
                content,
                easiness_factor: easiness,
                interval,
                repetitions,
            },
        ),
        Commands::Review {
            item_id,
            rating,
            user,
        } => run_review(&config, &user, &item_id, rating),
        Commands::Show { id } => run_show(&config, &id),
        Commands::Preview { id } => run_preview(&config, &id),
        Commands::Due { limit } => run_due(&config, limit),
        Commands::History { item, user, limit } => run_history(&config, item, user, limit),
        Commands::Stats => run_stats(&config),
        Commands::Backup { output } => run_backup(&config, output),
        Commands::Serve(args) => run_serve(config, args),
    }
}

fn open(config: &ServerConfig) -> anyhow::Result<Storage> {
    Ok(config.open_storage()?)
}

fn format_time(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "never".dimmed().to_string(),
    }
}

fn print_item(item: &ReviewItem) {
    println!("{}: {}", "Id".white().bold(), item.id);
    if let Some(lesson) = &item.lesson_id {
        println!("{}: {}", "Lesson".white().bold(), lesson);
    }
    if let Some(content) = &item.content {
        println!("{}: {}", "Content".white().bold(), content);
    }
    println!("{}: {:.2}", "Easiness".white().bold(), item.easiness_factor);
    println!("{}: {} day(s)", "Interval".white().bold(), item.interval);
    println!("{}: {}", "Repetitions".white().bold(), item.repetitions);
    println!("{}: {}", "Last Reviewed".white().bold(), format_time(item.last_reviewed));
    println!("{}: {}", "Next Review".white().bold(), format_time(item.next_review));
    if let Some(rating) = item.recall_rating {
        println!("{}: {} ({})", "Last Rating".white().bold(), rating, quality_label(rating));
    }
    println!("{}: {}", "Reviews Applied".white().bold(), item.version);
}

fn run_add(config: &ServerConfig, input: NewReviewItem) -> anyhow::Result<()> {
    let storage = open(config)?;
    let item = storage.create_item(input)?;

    println!("{}", "Item created".green().bold());
    print_item(&item);
    storage.close()?;
    Ok(())
}

fn run_review(config: &ServerConfig, user: &str, item_id: &str, rating: i32) -> anyhow::Result<()> {
    let storage = open(config)?;
    let outcome = storage.record_review(user, item_id, rating)?;

    let headline = if outcome.was_lapse() {
        format!("Lapse: {} ({})", rating, quality_label(rating)).red().bold()
    } else {
        format!("Recalled: {} ({})", rating, quality_label(rating)).green().bold()
    };
    println!("{}", headline);
    println!(
        "{}: {:.2} -> {:.2} ({:+.2})",
        "Easiness".white().bold(),
        outcome.previous.easiness,
        outcome.item.easiness_factor,
        outcome.easiness_delta()
    );
    println!(
        "{}: {} -> {} day(s)",
        "Interval".white().bold(),
        outcome.previous.interval,
        outcome.item.interval
    );
    println!("{}: {}", "Repetitions".white().bold(), outcome.item.repetitions);
    println!("{}: {}", "Next Review".white().bold(), format_time(Some(outcome.next_review)));

    storage.close()?;
    Ok(())
}

fn run_show(config: &ServerConfig, id: &str) -> anyhow::Result<()> {
    let storage = open(config)?;
    let item = storage
        .get_item(id)?
        .ok_or_else(|| anyhow::anyhow!("Review item not found: {}", id))?;

    println!("{}", "=== Review Item ===".cyan().bold());
    print_item(&item);
    if item.is_due() {
        println!("{}", "Due now".yellow().bold());
    }
    Ok(())
}

fn run_preview(config: &ServerConfig, id: &str) -> anyhow::Result<()> {
    let storage = open(config)?;
    let preview = storage.preview_review(id)?;

    println!("{}", "=== Review Preview ===".cyan().bold());
    println!(
        "{:<8} {:<12} {:>9} {:>9} {:>6}  {}",
        "Rating", "", "Easiness", "Interval", "Reps", "Next Review"
    );
    for outcome in &preview.outcomes {
        let line = format!(
            "{:<8} {:<12} {:>9.2} {:>9} {:>6}  {}",
            outcome.quality,
            quality_label(outcome.quality),
            outcome.easiness,
            outcome.interval,
            outcome.repetitions,
            outcome.next_review.format("%Y-%m-%d"),
        );
        if outcome.quality >= cadence_core::sm2::PASSING_QUALITY {
            println!("{}", line.green());
        } else {
            println!("{}", line.red());
        }
    }
    Ok(())
}

fn run_due(config: &ServerConfig, limit: i32) -> anyhow::Result<()> {
    let storage = open(config)?;
    let items = storage.get_review_queue(limit.max(1))?;

    println!("{}", "=== Due for Review ===".cyan().bold());
    if items.is_empty() {
        println!("{}", "Nothing due.".dimmed());
        return Ok(());
    }

    for item in &items {
        let due = match item.next_review {
            Some(ts) => ts.format("%Y-%m-%d").to_string(),
            None => "new".yellow().to_string(),
        };
        println!(
            "  {}  {}  {}",
            item.id.white().bold(),
            due,
            item.content.as_deref().unwrap_or("").dimmed()
        );
    }
    println!();
    println!("{} item(s)", items.len());
    Ok(())
}

fn run_history(
    config: &ServerConfig,
    item: Option<String>,
    user: Option<String>,
    limit: i32,
) -> anyhow::Result<()> {
    let storage = open(config)?;
    let limit = limit.max(1);
    let sessions = match (item, user) {
        (Some(item_id), _) => storage.get_sessions_for_item(&item_id, limit)?,
        (None, Some(user_id)) => storage.get_sessions_for_user(&user_id, limit)?,
        (None, None) => anyhow::bail!("Pass --item or --user"),
    };

    println!("{}", "=== Review History ===".cyan().bold());
    if sessions.is_empty() {
        println!("{}", "No sessions recorded.".dimmed());
        return Ok(());
    }

    for session in &sessions {
        println!(
            "  {}  {:<12} {} {} ({})",
            session.date.format("%Y-%m-%d %H:%M"),
            session.user_id,
            session.review_id.dimmed(),
            session.recall_rating,
            quality_label(session.recall_rating)
        );
    }
    Ok(())
}

fn run_stats(config: &ServerConfig) -> anyhow::Result<()> {
    let storage = open(config)?;
    let stats = storage.get_stats()?;

    println!("{}", "=== Cadence Review Statistics ===".cyan().bold());
    println!();
    println!("{}: {}", "Database".white().bold(), storage.path().display());
    println!("{}: {}", "Quality Policy".white().bold(), storage.quality_policy());
    println!("{}: {}", "Total Items".white().bold(), stats.total_items);
    println!("{}: {}", "Due for Review".white().bold(), stats.items_due);
    println!("{}: {}", "Never Reviewed".white().bold(), stats.never_reviewed);
    println!("{}: {}", "Sessions Logged".white().bold(), stats.total_sessions);
    println!("{}: {:.2}", "Average Easiness".white().bold(), stats.average_easiness);
    println!("{}: {}", "Last Review".white().bold(), format_time(stats.last_review));
    Ok(())
}

fn run_backup(config: &ServerConfig, output: PathBuf) -> anyhow::Result<()> {
    if output.exists() {
        anyhow::bail!("Refusing to overwrite existing file: {}", output.display());
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let storage = open(config)?;
    storage.backup_to(&output)?;
    storage.close()?;

    let size = std::fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
    println!(
        "{} {} ({:.1} KB)",
        "Backup written to".green().bold(),
        output.display(),
        size as f64 / 1024.0
    );
    Ok(())
}

fn run_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    config.apply_args(&args);
    init_tracing(config.log_format);

    let storage = Arc::new(open(&config)?);
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(api::serve(&config, Arc::clone(&storage)));
    api::shutdown_storage(storage);
    result
}
