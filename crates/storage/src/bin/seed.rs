use std::fmt;

use chrono::{DateTime, Duration, Utc};
use speakwell_core::model::{
    DifficultyLevel, LearningMode, PracticeSessionDraft, UserId, UserProfile, VocabularyDraft,
};
use speakwell_core::streak::{PracticeCompletion, StreakTracker};
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user_id: UserId,
    email: String,
    days: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUserId { raw: String },
    InvalidDays { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user value: {raw}"),
            ArgsError::InvalidDays { raw } => write!(f, "invalid --days value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("SPEAKWELL_DB_URL")
            .unwrap_or_else(|_| "sqlite:speakwell.sqlite3?mode=rwc".into());
        let mut user_id = std::env::var("SPEAKWELL_USER_ID")
            .ok()
            .and_then(|value| value.parse::<UserId>().ok())
            .unwrap_or_else(|| UserId::new(1));
        let mut email =
            std::env::var("SPEAKWELL_EMAIL").unwrap_or_else(|_| "learner@example.com".into());
        let mut days = 4;
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--user" => {
                    let value = require_value(&mut args, "--user")?;
                    user_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?;
                }
                "--email" => {
                    email = require_value(&mut args, "--email")?;
                }
                "--days" => {
                    let value = require_value(&mut args, "--days")?;
                    days = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidDays { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user_id,
            email,
            days,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL");
    eprintln!("                            (default: sqlite:speakwell.sqlite3?mode=rwc)");
    eprintln!("  --user <id>               Learner id to seed (default: 1)");
    eprintln!("  --email <email>           Email for a newly created learner");
    eprintln!("  --days <n>                Days of fully met goals ending yesterday (default: 4)");
    eprintln!("  --now <rfc3339>           Override the current time");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  SPEAKWELL_DB_URL, SPEAKWELL_USER_ID, SPEAKWELL_EMAIL");
}

const SAMPLE_WORDS: [(&str, &str); 6] = [
    ("eloquent", "বাকপটু"),
    ("diligent", "পরিশ্রমী"),
    ("candid", "অকপট"),
    ("resilient", "সহনশীল"),
    ("vivid", "প্রাণবন্ত"),
    ("frugal", "মিতব্যয়ী"),
];

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let mut profile = match storage.profiles.get_profile(args.user_id).await? {
        Some(profile) => profile,
        None => {
            let created = UserProfile::new(
                args.user_id,
                args.email.clone(),
                now - Duration::days(i64::from(args.days) + 1),
            )?;
            storage.profiles.insert_profile(&created).await?;
            created
        }
    };

    // Replay `days` days that each reach both goals, ending yesterday.
    let tracker = StreakTracker::default();
    let mut progress = profile.progress().clone();
    for day in (1..=i64::from(args.days)).rev() {
        let date = (now - Duration::days(day)).date_naive();
        let mut at = date
            .and_hms_opt(12, 0, 0)
            .map_or(now - Duration::days(day), |midday| midday.and_utc());
        for (word, meaning) in SAMPLE_WORDS {
            let saved = VocabularyDraft::new(word, meaning).validate(profile.id(), at)?;
            // Only yesterday's words and sessions are stored.
            if day == 1 {
                storage.vocabulary.insert_word(&saved).await?;
            }
            progress = tracker
                .record_practice_completion(&progress, at, PracticeCompletion::Vocabulary)
                .progress;
            at += Duration::minutes(1);
        }
        // Scores feed speaking time at a tenth of their value: sixty perfect
        // sessions reach the ten-minute goal.
        for _ in 0..60 {
            let score = 100;
            if day == 1 {
                let session = PracticeSessionDraft::new(
                    profile.id(),
                    LearningMode::Speaking,
                    DifficultyLevel::Beginner,
                )
                .with_score(score)
                .validate(at)?;
                storage.history.append_session(&session).await?;
            }
            let completion = PracticeCompletion::Scored { amount: score };
            progress = tracker
                .record_practice_completion(&progress, at, completion)
                .progress;
            at += Duration::minutes(1);
        }
    }
    profile.set_progress(progress);
    storage.profiles.save_profile(&profile).await?;

    println!(
        "Seeded learner {} with a {}-day streak into {}",
        profile.id(),
        profile.progress().current_streak(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
