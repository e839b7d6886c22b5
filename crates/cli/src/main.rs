//! StudyMate CLI - learning progress, reminders and quizzes.

use anyhow::Result;
use clap::{Parser, Subcommand};
use studymate_core::{Date, Reminder, ReminderId};
use studymate_progress::{
    create_learning_schedule, format_report, parse_date, render_text, StudyService,
};
use studymate_storage::{open_store, StoreBackend, StoreConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "studymate")]
#[command(about = "Study companion: track milestones, reminders and quizzes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Storage path for StudyMate data
    #[arg(short, long, default_value = ".studymate", global = true)]
    store: std::path::PathBuf,

    /// Storage backend (memory, json, sqlite)
    #[arg(short, long, default_value = "json", global = true)]
    backend: StoreBackend,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a milestone status
    Milestone {
        /// Roadmap ID
        roadmap: String,
        /// Milestone name
        name: String,
        /// completed, in_progress or not_started
        status: String,
    },
    /// Show a roadmap progress report
    Report {
        /// Roadmap ID
        roadmap: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List tracked roadmaps
    Roadmaps,
    /// Schedule a reminder
    Remind {
        /// Reminder text
        message: String,
        /// Due date (YYYY-MM-DD)
        date: String,
    },
    /// List reminders
    Reminders,
    /// Cancel a reminder
    Cancel {
        /// Reminder ID
        id: String,
    },
    /// Fire reminders due on or before a day
    Due {
        /// Day to check (YYYY-MM-DD), defaults to today
        #[arg(long)]
        today: Option<String>,
    },
    /// Save a quiz score
    Quiz {
        /// Quiz ID
        quiz_id: String,
        /// Correct answers
        score: u32,
        /// Questions asked
        total: u32,
    },
    /// Compute a learning schedule
    Plan {
        /// Topic to learn
        topic: String,
        /// Days available
        #[arg(long)]
        days: u32,
        /// Hours per day
        #[arg(long, default_value = "1")]
        hours: u32,
        /// First day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        start: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = StoreConfig {
        backend: cli.backend,
        path: cli.store,
    };

    let service = StudyService::new(open_store(&config).await?);
    debug!("Using {} store at {}", config.backend, config.path.display());

    match cli.command {
        Commands::Milestone { roadmap, name, status } => {
            let progress = service.ledger.record_milestone(&roadmap, &name, &status).await?;
            println!(
                "{}: {} -> {} ({:.1}% complete)",
                progress.roadmap_id, name, status, progress.completion_percentage
            );
        }
        Commands::Report { roadmap, json } => {
            let report = service.ledger.get_report(&roadmap).await?;
            let view = format_report(&report)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{}", render_text(&view));
            }
        }
        Commands::Roadmaps => {
            let roadmaps = service.ledger.list_roadmaps().await?;
            println!("Roadmaps ({})", roadmaps.len());
            for id in roadmaps {
                println!("  {}", id);
            }
        }
        Commands::Remind { message, date } => {
            let reminder = service
                .reminders
                .schedule_reminder(&message, parse_date(&date)?)
                .await?;
            println!("Scheduled reminder {} for {}", reminder.reminder_id, reminder.scheduled_date);
        }
        Commands::Reminders => {
            let reminders = service.reminders.list_reminders().await?;
            println!("Reminders ({})", reminders.len());
            for reminder in &reminders {
                print_reminder(reminder);
            }
        }
        Commands::Cancel { id } => {
            let id: ReminderId = id.parse().map_err(|_| anyhow::anyhow!("Invalid reminder ID"))?;
            let reminder = service.reminders.cancel_reminder(id).await?;
            println!("Cancelled reminder {}", reminder.reminder_id);
        }
        Commands::Due { today } => {
            let today = day_or_today(today.as_deref())?;
            let fired = service.reminders.fire_due(today).await?;
            println!("Due reminders ({})", fired.len());
            for reminder in &fired {
                print_reminder(reminder);
            }
        }
        Commands::Quiz { quiz_id, score, total } => {
            let result = service.quizzes.save_results(&quiz_id, score, total).await?;
            println!(
                "{}: {}/{} ({:.1}%)",
                result.quiz_id, result.score, result.total, result.percentage
            );
        }
        Commands::Plan { topic, days, hours, start } => {
            let start = day_or_today(start.as_deref())?;
            let schedule = create_learning_schedule(&topic, days, hours, start)?;
            println!("Plan for {}", schedule.topic);
            println!(
                "  {} days x {}h = {}h",
                schedule.total_duration_days, schedule.hours_per_day, schedule.total_hours
            );
            println!("  {} -> {}", schedule.start_date, schedule.estimated_completion);
        }
    }

    Ok(())
}

fn day_or_today(s: Option<&str>) -> Result<Date> {
    match s {
        Some(s) => Ok(parse_date(s)?),
        None => Ok(chrono::Utc::now().date_naive()),
    }
}

fn print_reminder(reminder: &Reminder) {
    println!(
        "  {} | {} | {} - {}",
        reminder.reminder_id,
        reminder.scheduled_date,
        reminder.status.as_str().to_uppercase(),
        reminder.message,
    );
}
