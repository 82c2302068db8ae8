use std::io::{self, BufRead, Write};

use services::{AppServices, DailyChallenge, PracticeUpdate, Quiz};
use speakwell_core::model::{PracticeSessionDraft, UserId, UserProfile, VocabularyDraft};
use tracing::warn;

use crate::args::Command;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub async fn execute(app: &AppServices, user_id: UserId, command: Command) -> CommandResult {
    let progress = app.progress();
    match command {
        Command::Status => {
            let profile = progress.profile(user_id).await?;
            print_status(app, &profile);
            if progress.daily_challenge_due(user_id).await? {
                println!("Today's challenge is waiting: run `speakwell challenge`.");
            }
        }
        Command::Practice { mode, score } => {
            let profile = progress.profile(user_id).await?;
            let mut draft = PracticeSessionDraft::new(user_id, mode, profile.difficulty());
            draft.score = score;
            let recorded = app.history().record_session(draft).await?;
            println!(
                "Logged {} session #{}.",
                recorded.session.mode,
                id_or_dash(recorded.session.id)
            );
            match recorded.update {
                Some(update) => print_update(&update),
                None => println!(
                    "{} practice does not count toward daily goals.",
                    recorded.session.mode
                ),
            }
        }
        Command::Word {
            word,
            meaning,
            example,
        } => {
            let mut draft = VocabularyDraft::new(word, meaning);
            if let Some(example) = example {
                draft.example_sentence = example;
            }
            let saved = app.vocabulary().save_word(user_id, draft).await?;
            println!("Saved \"{}\" (#{}).", saved.word.word, id_or_dash(saved.word.id));
            print_update(&saved.update);
        }
        Command::Words => {
            let words = app.vocabulary().list_words(user_id).await?;
            if words.is_empty() {
                println!("No saved words yet.");
            }
            for word in words {
                println!("#{:<5} {:<20} {}", id_or_dash(word.id), word.word, word.meaning);
                if !word.example_sentence.is_empty() {
                    println!("       e.g. {}", word.example_sentence);
                }
            }
        }
        Command::Forget(word_id) => {
            app.vocabulary().delete_word(user_id, word_id).await?;
            println!("Deleted word #{word_id}.");
        }
        Command::History => {
            let sessions = app.history().recent(user_id).await?;
            if sessions.is_empty() {
                println!("No practice sessions yet.");
            }
            for session in sessions {
                let score = session
                    .score
                    .map_or_else(|| "-".to_string(), |s| s.to_string());
                println!(
                    "{}  {:<10} {:<12} score {}",
                    session.created_at.format("%Y-%m-%d %H:%M"),
                    session.mode.as_str(),
                    session.difficulty.as_str(),
                    score
                );
            }
        }
        Command::Challenge => {
            let challenge = app.daily_challenge();
            if !challenge.is_due(user_id).await? {
                println!("You already finished today's challenge. Come back tomorrow!");
                return Ok(());
            }
            match challenge.build_quiz(user_id, &mut rand::rng()).await? {
                DailyChallenge::TipsOnly => {
                    println!("Save at least 4 words to unlock the daily vocabulary quiz.");
                }
                DailyChallenge::Quiz(mut quiz) => run_quiz(&mut quiz)?,
            }
            challenge.close(user_id).await?;
        }
        Command::CloseChallenge => {
            app.daily_challenge().close(user_id).await?;
            println!("Daily challenge closed until tomorrow.");
        }
        Command::AckMilestone => {
            let profile = progress.acknowledge_milestone(user_id).await?;
            println!(
                "Milestone cleared. Current streak: {} day(s).",
                profile.progress().current_streak()
            );
        }
        Command::Difficulty(level) => {
            let profile = progress.update_difficulty(user_id, level).await?;
            println!("Difficulty: {}", profile.difficulty());
        }
        Command::Goal(text) => {
            let profile = progress.update_learning_goal(user_id, &text).await?;
            println!("Learning goal: {}", profile.learning_goal());
        }
    }
    Ok(())
}

fn id_or_dash(id: Option<impl ToString>) -> String {
    id.map_or_else(|| "-".to_string(), |id| id.to_string())
}

fn print_status(app: &AppServices, profile: &UserProfile) {
    let progress = app.progress();
    let tracker = progress.tracker();
    let goals = tracker.goals();
    let record = profile.progress();
    let practised_today = tracker
        .boundary()
        .same_day(record.last_practice_at(), progress.clock().now());

    println!("{} ({}, {})", profile.email(), profile.difficulty(), profile.learning_goal());
    println!("Streak: {} day(s)", record.current_streak());
    if practised_today {
        println!(
            "Today: speaking {}/{}s, vocabulary {}/{} words, {} session(s){}",
            record.daily_speaking_seconds(),
            goals.speaking_seconds(),
            record.daily_vocab_learned(),
            goals.vocab_words(),
            record.daily_sessions_completed(),
            if record.daily_streak_awarded() {
                ", goals met"
            } else {
                ""
            }
        );
    } else {
        println!("Today: no practice yet");
    }
    println!(
        "Lifetime: {} session(s), {} word(s) learned",
        record.practice_sessions_completed(),
        record.words_learned()
    );
    if record.milestone_achieved() > 0 {
        println!(
            "Milestone: {}-day streak! Run `speakwell ack-milestone` to dismiss.",
            record.milestone_achieved()
        );
    }
}

fn print_update(update: &PracticeUpdate) {
    let record = update.profile.progress();
    if update.goals_reached {
        println!("Both daily goals met. Streak secured for today!");
    }
    if let Some(threshold) = update.milestone {
        println!("Milestone reached: {threshold}-day streak!");
    }
    println!(
        "Streak {} | speaking {}s | vocabulary {} word(s) today",
        record.current_streak(),
        record.daily_speaking_seconds(),
        record.daily_vocab_learned()
    );
}

fn run_quiz(quiz: &mut Quiz) -> io::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let total = quiz.len();

    for index in 0..total {
        let (word, options) = {
            let question = &quiz.questions()[index];
            (question.word().to_owned(), question.options().to_vec())
        };
        println!();
        println!("Question {}/{}: what does \"{word}\" mean?", index + 1, total);
        for (n, option) in options.iter().enumerate() {
            println!("  {}. {option}", n + 1);
        }

        let choice = loop {
            print!("> ");
            io::stdout().flush()?;
            let Some(line) = lines.next().transpose()? else {
                println!();
                println!("Quiz stopped. Score: {}/{}", quiz.score(), total);
                return Ok(());
            };
            match line.trim().parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => break options[n - 1].clone(),
                _ => println!("Enter a number between 1 and {}.", options.len()),
            }
        };

        match quiz.answer(index, &choice) {
            Ok(true) => println!("Correct!"),
            Ok(false) => println!(
                "Not quite. \"{word}\" means {}.",
                quiz.questions()[index].correct_answer()
            ),
            Err(err) => warn!(%err, "quiz answer rejected"),
        }
    }

    println!();
    println!("Quiz complete. Score: {}/{}", quiz.score(), total);
    Ok(())
}
