use std::fmt;

use services::{MilestonePolicy, ProgressSettings};
use speakwell_core::model::{DifficultyLevel, LearningMode, UserId, WordId};
use speakwell_core::streak::{DailyGoals, SPEAKING_GOAL_SECONDS, VOCAB_GOAL_WORDS};
use speakwell_core::time::DayBoundary;

pub const DEFAULT_DB_URL: &str = "sqlite://speakwell.sqlite3";
pub const DEFAULT_EMAIL: &str = "learner@example.com";

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingCommand,
    MissingArgument { command: &'static str, name: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidUserId { raw: String },
    InvalidWordId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidMode { raw: String },
    InvalidScore { raw: String },
    InvalidDifficulty { raw: String },
    InvalidEnv { var: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingCommand => write!(f, "missing subcommand"),
            ArgsError::MissingArgument { command, name } => {
                write!(f, "{command} requires <{name}>")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user value: {raw}"),
            ArgsError::InvalidWordId { raw } => write!(f, "invalid word id: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidMode { raw } => write!(f, "invalid --mode value: {raw}"),
            ArgsError::InvalidScore { raw } => write!(f, "invalid --score value: {raw}"),
            ArgsError::InvalidDifficulty { raw } => write!(f, "invalid difficulty: {raw}"),
            ArgsError::InvalidEnv { var, raw } => write!(f, "invalid {var} value: {raw}"),
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

/// What the learner asked the binary to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    Practice {
        mode: LearningMode,
        score: Option<u32>,
    },
    Word {
        word: String,
        meaning: String,
        example: Option<String>,
    },
    Words,
    Forget(WordId),
    History,
    Challenge,
    CloseChallenge,
    AckMilestone,
    Difficulty(DifficultyLevel),
    Goal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub db_url: String,
    pub user_id: UserId,
    pub email: String,
    pub settings: ProgressSettings,
    pub command: Command,
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  speakwell [--db <sqlite_url>] [--user <id>] [--email <email>] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  status                                   Show streak and today's progress");
    eprintln!("  practice --mode <mode> [--score <0-100>] Log a finished practice session");
    eprintln!("  word <word> <meaning> [--example <text>] Save a vocabulary word");
    eprintln!("  words                                    List saved words");
    eprintln!("  forget <word-id>                         Delete a saved word");
    eprintln!("  history                                  Show the latest practice sessions");
    eprintln!("  challenge                                Take today's vocabulary quiz");
    eprintln!("  close-challenge                          Dismiss today's challenge");
    eprintln!("  ack-milestone                            Clear a pending streak milestone");
    eprintln!("  difficulty <beginner|intermediate|advanced>");
    eprintln!("  goal <text>                              Set your learning goal");
    eprintln!();
    eprintln!("Modes: speaking, writing, reading, listening, grammar, vocabulary");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SPEAKWELL_DB_URL, SPEAKWELL_USER_ID, SPEAKWELL_EMAIL");
    eprintln!("  SPEAKWELL_SPEAKING_GOAL_SECS (default {SPEAKING_GOAL_SECONDS})");
    eprintln!("  SPEAKWELL_VOCAB_GOAL_WORDS (default {VOCAB_GOAL_WORDS})");
    eprintln!("  SPEAKWELL_MILESTONES (comma-separated streak lengths, default 3,7,30)");
    eprintln!("  SPEAKWELL_UTC_OFFSET_MINUTES (day boundary, default: system time zone)");
    eprintln!("  RUST_LOG (log filter)");
}

fn parse_env_u32(
    env: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u32>, ArgsError> {
    env(var)
        .map(|raw| {
            raw.trim()
                .parse::<u32>()
                .map_err(|_| ArgsError::InvalidEnv { var, raw })
        })
        .transpose()
}

fn settings_from_env(
    env: &impl Fn(&str) -> Option<String>,
) -> Result<ProgressSettings, ArgsError> {
    let speaking =
        parse_env_u32(env, "SPEAKWELL_SPEAKING_GOAL_SECS")?.unwrap_or(SPEAKING_GOAL_SECONDS);
    let vocab = parse_env_u32(env, "SPEAKWELL_VOCAB_GOAL_WORDS")?.unwrap_or(VOCAB_GOAL_WORDS);

    let milestones = match env("SPEAKWELL_MILESTONES") {
        None => MilestonePolicy::default(),
        Some(raw) => {
            let thresholds = raw
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::parse::<u32>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| ArgsError::InvalidEnv {
                    var: "SPEAKWELL_MILESTONES",
                    raw: raw.clone(),
                })?;
            MilestonePolicy::new(thresholds)
        }
    };

    let boundary = match env("SPEAKWELL_UTC_OFFSET_MINUTES") {
        None => DayBoundary::system_local(),
        Some(raw) => raw
            .trim()
            .parse::<i32>()
            .ok()
            .and_then(DayBoundary::from_offset_minutes)
            .ok_or(ArgsError::InvalidEnv {
                var: "SPEAKWELL_UTC_OFFSET_MINUTES",
                raw,
            })?,
    };

    Ok(ProgressSettings {
        goals: DailyGoals::new(speaking, vocab),
        boundary,
        milestones,
    })
}

pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn parse_command(name: &str, rest: Vec<String>) -> Result<Command, ArgsError> {
    let mut positionals = Vec::new();
    let mut mode = None;
    let mut score = None;
    let mut example = None;

    let mut iter = rest.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--mode" if name == "practice" => {
                let value = require_value(&mut iter, "--mode")?;
                mode = Some(
                    value
                        .parse::<LearningMode>()
                        .map_err(|_| ArgsError::InvalidMode { raw: value.clone() })?,
                );
            }
            "--score" if name == "practice" => {
                let value = require_value(&mut iter, "--score")?;
                score = Some(
                    value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidScore { raw: value.clone() })?,
                );
            }
            "--example" if name == "word" => {
                example = Some(require_value(&mut iter, "--example")?);
            }
            flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
            _ => positionals.push(arg),
        }
    }

    let mut positionals = positionals.into_iter();
    let command = match name {
        "status" => Command::Status,
        "practice" => Command::Practice {
            mode: mode.ok_or(ArgsError::MissingArgument {
                command: "practice",
                name: "mode",
            })?,
            score,
        },
        "word" => {
            let word = positionals.next().ok_or(ArgsError::MissingArgument {
                command: "word",
                name: "word",
            })?;
            let meaning = positionals.next().ok_or(ArgsError::MissingArgument {
                command: "word",
                name: "meaning",
            })?;
            Command::Word {
                word,
                meaning,
                example,
            }
        }
        "words" => Command::Words,
        "forget" => {
            let raw = positionals.next().ok_or(ArgsError::MissingArgument {
                command: "forget",
                name: "word-id",
            })?;
            let id = raw
                .parse::<WordId>()
                .map_err(|_| ArgsError::InvalidWordId { raw: raw.clone() })?;
            Command::Forget(id)
        }
        "history" => Command::History,
        "challenge" => Command::Challenge,
        "close-challenge" => Command::CloseChallenge,
        "ack-milestone" => Command::AckMilestone,
        "difficulty" => {
            let raw = positionals.next().ok_or(ArgsError::MissingArgument {
                command: "difficulty",
                name: "level",
            })?;
            let level = raw
                .parse::<DifficultyLevel>()
                .map_err(|_| ArgsError::InvalidDifficulty { raw: raw.clone() })?;
            Command::Difficulty(level)
        }
        "goal" => {
            let text = positionals.by_ref().collect::<Vec<_>>().join(" ");
            if text.trim().is_empty() {
                return Err(ArgsError::MissingArgument {
                    command: "goal",
                    name: "text",
                });
            }
            return Ok(Command::Goal(text));
        }
        other => return Err(ArgsError::UnknownCommand(other.to_string())),
    };

    if let Some(extra) = positionals.next() {
        return Err(ArgsError::UnknownArg(extra));
    }
    Ok(command)
}

impl Args {
    pub fn parse() -> Result<Self, ArgsError> {
        Self::parse_from(std::env::args().skip(1), |var| std::env::var(var).ok())
    }

    /// Parse flags and a subcommand; global flags may appear anywhere.
    pub fn parse_from(
        argv: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url =
            env("SPEAKWELL_DB_URL").map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut user_id = match env("SPEAKWELL_USER_ID") {
            Some(raw) => raw
                .parse::<UserId>()
                .map_err(|_| ArgsError::InvalidEnv {
                    var: "SPEAKWELL_USER_ID",
                    raw: raw.clone(),
                })?,
            None => UserId::new(1),
        };
        let mut email = env("SPEAKWELL_EMAIL").unwrap_or_else(|| DEFAULT_EMAIL.into());
        let settings = settings_from_env(&env)?;

        let mut name: Option<String> = None;
        let mut rest = Vec::new();
        let mut args = argv.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
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
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if name.is_none() && !arg.starts_with("--") => name = Some(arg),
                // Command flags take a value; keep the pair together.
                "--mode" | "--score" | "--example" => {
                    let value = require_value(&mut args, flag_name(&arg))?;
                    rest.push(arg);
                    rest.push(value);
                }
                _ => rest.push(arg),
            }
        }

        let name = name.ok_or(ArgsError::MissingCommand)?;
        let command = parse_command(&name, rest)?;

        Ok(Self {
            db_url,
            user_id,
            email,
            settings,
            command,
        })
    }
}

fn flag_name(arg: &str) -> &'static str {
    match arg {
        "--mode" => "--mode",
        "--score" => "--score",
        _ => "--example",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(argv: &[&str], env: &[(&str, &str)]) -> Result<Args, ArgsError> {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Args::parse_from(argv.iter().map(|s| (*s).to_string()), move |var| {
            env.get(var).cloned()
        })
    }

    #[test]
    fn defaults_apply_without_flags_or_env() {
        let args = parse(&["status"], &[]).unwrap();
        assert_eq!(args.db_url, DEFAULT_DB_URL);
        assert_eq!(args.user_id, UserId::new(1));
        assert_eq!(args.email, DEFAULT_EMAIL);
        assert_eq!(args.settings.goals, DailyGoals::default());
        assert_eq!(args.settings.milestones, MilestonePolicy::default());
        assert!(args.settings.boundary.is_system_local());
        assert_eq!(args.command, Command::Status);
    }

    #[test]
    fn global_flags_may_follow_the_command() {
        let args = parse(
            &["practice", "--mode", "speaking", "--user", "7", "--score", "88"],
            &[],
        )
        .unwrap();
        assert_eq!(args.user_id, UserId::new(7));
        assert_eq!(
            args.command,
            Command::Practice {
                mode: LearningMode::Speaking,
                score: Some(88),
            }
        );
    }

    #[test]
    fn word_takes_two_positionals_and_an_example() {
        let args = parse(
            &["word", "candid", "অকপট", "--example", "She was candid."],
            &[],
        )
        .unwrap();
        assert_eq!(
            args.command,
            Command::Word {
                word: "candid".into(),
                meaning: "অকপট".into(),
                example: Some("She was candid.".into()),
            }
        );
        assert_eq!(
            parse(&["word", "candid"], &[]).unwrap_err(),
            ArgsError::MissingArgument {
                command: "word",
                name: "meaning"
            }
        );
    }

    #[test]
    fn goal_joins_remaining_words() {
        let args = parse(&["goal", "Ace", "my", "interview"], &[]).unwrap();
        assert_eq!(args.command, Command::Goal("Ace my interview".into()));
    }

    #[test]
    fn env_configures_progress_policy() {
        let args = parse(
            &["status"],
            &[
                ("SPEAKWELL_SPEAKING_GOAL_SECS", "300"),
                ("SPEAKWELL_VOCAB_GOAL_WORDS", "3"),
                ("SPEAKWELL_MILESTONES", "14, 5"),
                ("SPEAKWELL_UTC_OFFSET_MINUTES", "360"),
                ("SPEAKWELL_USER_ID", "4"),
            ],
        )
        .unwrap();
        assert_eq!(args.settings.goals, DailyGoals::new(300, 3));
        assert_eq!(args.settings.milestones.thresholds(), &[5, 14]);
        assert_eq!(args.settings.boundary.offset_minutes(), Some(360));
        assert_eq!(args.user_id, UserId::new(4));
    }

    #[test]
    fn invalid_input_is_reported() {
        assert_eq!(parse(&[], &[]).unwrap_err(), ArgsError::MissingCommand);
        assert_eq!(
            parse(&["dance"], &[]).unwrap_err(),
            ArgsError::UnknownCommand("dance".into())
        );
        assert_eq!(
            parse(&["practice", "--mode", "poetry"], &[]).unwrap_err(),
            ArgsError::InvalidMode {
                raw: "poetry".into()
            }
        );
        assert_eq!(
            parse(&["forget", "abc"], &[]).unwrap_err(),
            ArgsError::InvalidWordId { raw: "abc".into() }
        );
        assert_eq!(
            parse(&["status", "--example", "x"], &[]).unwrap_err(),
            ArgsError::UnknownArg("--example".into())
        );
        assert!(matches!(
            parse(&["status"], &[("SPEAKWELL_UTC_OFFSET_MINUTES", "99999")]).unwrap_err(),
            ArgsError::InvalidEnv { .. }
        ));
        assert_eq!(
            parse(&["status", "--db"], &[]).unwrap_err(),
            ArgsError::MissingValue { flag: "--db" }
        );
    }

    #[test]
    fn relative_db_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/app.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/app.sqlite3"));
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
    }
}
