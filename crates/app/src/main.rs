use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use quest_core::model::{Grade, Question, QuestionId, Subject};
use services::{
    AnswerValidator, BatchRequest, BatchRunner, ChatAnswerValidator, ChatQuestionGenerator,
    DEFAULT_PACING, HeuristicValidator, LocationHint, QuestSession, QuestionGenerator,
    SessionSettings, SubmitOutcome, UnavailableGenerator,
};
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArg { name: &'static str },
    UnknownArg(String),
    InvalidValue { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArg { name } => write!(f, "missing <{name}>"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidValue { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

fn parse_value<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<T, ArgsError> {
    let raw = require_value(args, flag)?;
    raw.parse()
        .map_err(|_| ArgsError::InvalidValue { flag, raw: raw.clone() })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- generate --subject <수학|math> --grade <1-6> [--count <n>]");
    eprintln!("                              [--lat <deg> --lon <deg>] [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- list    [--limit <n>] [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- answer  <question-id> <answer...> [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- stats   [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://quest.sqlite3");
    eprintln!("  --count 5, --limit 20");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUEST_DB_URL, QUEST_PACING_MS, QUEST_AI_API_KEY, QUEST_AI_BASE_URL, QUEST_AI_MODEL");
    eprintln!("  RUST_LOG (e.g. RUST_LOG=services=debug)");
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Generate {
        subject: Subject,
        grade: Grade,
        count: u32,
        location: Option<LocationHint>,
    },
    List {
        limit: usize,
    },
    Answer {
        id: QuestionId,
        answer: String,
    },
    Stats,
}

struct Args {
    db_url: String,
    command: Command,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let name = args.next().ok_or(ArgsError::MissingArg { name: "command" })?;
        let mut db_url = std::env::var("QUEST_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quest.sqlite3".into(), normalize_sqlite_url);

        let mut subject = None;
        let mut grade = None;
        let mut count = 5_u32;
        let mut latitude: Option<f64> = None;
        let mut longitude: Option<f64> = None;
        let mut limit = 20_usize;
        let mut positional = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--subject" => subject = Some(parse_value::<Subject>(&mut args, "--subject")?),
                "--grade" => {
                    let raw: u8 = parse_value(&mut args, "--grade")?;
                    grade = Some(Grade::new(raw).map_err(|_| ArgsError::InvalidValue {
                        flag: "--grade",
                        raw: raw.to_string(),
                    })?);
                }
                "--count" => count = parse_value(&mut args, "--count")?,
                "--lat" => latitude = Some(parse_value(&mut args, "--lat")?),
                "--lon" => longitude = Some(parse_value(&mut args, "--lon")?),
                "--limit" => limit = parse_value(&mut args, "--limit")?,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other if other.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        let command = match name.as_str() {
            "generate" => Command::Generate {
                subject: subject.ok_or(ArgsError::MissingValue { flag: "--subject" })?,
                grade: grade.ok_or(ArgsError::MissingValue { flag: "--grade" })?,
                count,
                location: latitude
                    .zip(longitude)
                    .map(|(latitude, longitude)| LocationHint {
                        latitude,
                        longitude,
                    }),
            },
            "list" => Command::List { limit },
            "answer" => {
                let mut rest = positional.drain(..);
                let id = rest
                    .next()
                    .ok_or(ArgsError::MissingArg { name: "question-id" })?;
                let id = id
                    .parse()
                    .map_err(|_| ArgsError::InvalidValue { flag: "question-id", raw: id.clone() })?;
                let answer = rest.collect::<Vec<_>>().join(" ");
                if answer.trim().is_empty() {
                    return Err(ArgsError::MissingArg { name: "answer" });
                }
                Command::Answer { id, answer }
            }
            "stats" => Command::Stats,
            _ => return Err(ArgsError::UnknownArg(name)),
        };
        if !matches!(command, Command::Answer { .. }) {
            if let Some(extra) = positional.into_iter().next() {
                return Err(ArgsError::UnknownArg(extra));
            }
        }

        Ok(Self { db_url, command })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path = std::path::Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn pacing_from_env() -> Duration {
    std::env::var("QUEST_PACING_MS")
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .map_or(DEFAULT_PACING, Duration::from_millis)
}

/// Remote generator and validator when an AI endpoint is configured, offline ones otherwise.
fn capabilities() -> (Arc<dyn QuestionGenerator>, Arc<dyn AnswerValidator>) {
    match services::AiClient::from_env() {
        Some(client) => {
            info!(model = client.model(), "using remote question service");
            (
                Arc::new(ChatQuestionGenerator::new(client.clone())),
                Arc::new(ChatAnswerValidator::new(client)),
            )
        }
        None => {
            info!("no AI endpoint configured; generating from built-in seeds");
            (Arc::new(UnavailableGenerator), Arc::new(HeuristicValidator))
        }
    }
}

fn print_question(question: &Question) {
    println!(
        "{id}  [{subject} {grade}학년 | {level} | {difficulty}] {status}",
        id = question.id(),
        subject = question.subject(),
        grade = question.grade(),
        level = question.cognitive_level(),
        difficulty = question.difficulty(),
        status = question.status(),
    );
    println!("    {}", question.text());
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if argv.is_empty() || matches!(argv[0].as_str(), "--help" | "-h") {
        print_usage();
        return Ok(());
    }

    let parsed = Args::parse(argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;

    let (generator, validator) = capabilities();
    let batch = BatchRunner::new(generator).with_pacing(pacing_from_env());
    let mut session =
        QuestSession::open(storage.kv, batch, validator, SessionSettings::default()).await;

    match parsed.command {
        Command::Generate {
            subject,
            grade,
            count,
            location,
        } => {
            let request = BatchRequest::new(subject, grade, count)?.with_location(location);
            let produced = session
                .generate(&request, |p| {
                    eprintln!("[{}/{}] {}%", p.completed, p.total, p.percent());
                })
                .await?;
            for question in &produced {
                print_question(question);
            }
            println!("{} question(s) in pool", session.questions().len());
        }
        Command::List { limit } => {
            for question in session.questions().iter().take(limit) {
                print_question(question);
            }
        }
        Command::Answer { id, answer } => match session.submit_answer(&id, &answer).await? {
            SubmitOutcome::Graded {
                question,
                is_correct,
                xp_gained,
                stats,
            } => {
                let verdict = if is_correct { "정답" } else { "오답" };
                println!("{verdict}! +{xp_gained} XP (Lv.{})", stats.level());
                if let Some(explanation) = question.explanation() {
                    println!("해설: {explanation}");
                }
            }
            SubmitOutcome::AlreadyAnswered { status } => {
                println!("already answered ({status})");
            }
            SubmitOutcome::ValidationFailed => {
                println!("could not check the answer right now; try again later");
            }
        },
        Command::Stats => {
            let stats = session.stats();
            let (into_level, per_level) = session.rules().level_progress(stats);
            println!(
                "Lv.{}  {into_level}/{per_level} XP  [{}]",
                stats.level(),
                stats.rank()
            );
            println!("score      {}", stats.score());
            println!("accuracy   {}%", stats.accuracy_percent());
            println!(
                "answered   {}/{}",
                stats.correct_count(),
                stats.total_attempted()
            );
            println!("streak     {} (best {})", stats.streak(), stats.max_streak());
        }
    }
    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(args.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn generate_accepts_korean_and_ascii_subjects() {
        let args = parse(&["generate", "--subject", "수학", "--grade", "3", "--count", "2"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Generate { subject: Subject::Math, count: 2, location: None, .. }
        ));

        let args = parse(&["generate", "--subject", "science", "--grade", "5"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Generate { subject: Subject::Science, count: 5, .. }
        ));
    }

    #[test]
    fn generate_requires_a_valid_grade() {
        assert!(matches!(
            parse(&["generate", "--subject", "수학", "--grade", "7"]),
            Err(ArgsError::InvalidValue { flag: "--grade", .. })
        ));
        assert!(matches!(
            parse(&["generate", "--subject", "수학"]),
            Err(ArgsError::MissingValue { flag: "--grade" })
        ));
    }

    #[test]
    fn location_needs_both_coordinates() {
        let args = parse(&[
            "generate", "--subject", "국어", "--grade", "6", "--lat", "37.5", "--lon", "127.0",
        ])
        .unwrap();
        let Command::Generate { location, .. } = args.command else {
            panic!("expected generate");
        };
        assert_eq!(
            location,
            Some(LocationHint {
                latitude: 37.5,
                longitude: 127.0
            })
        );

        let args = parse(&["generate", "--subject", "국어", "--grade", "6", "--lat", "37.5"]).unwrap();
        assert!(matches!(args.command, Command::Generate { location: None, .. }));
    }

    #[test]
    fn answer_joins_remaining_words() {
        let args = parse(&["answer", "abc123", "가장", "큰", "각은", "직각"]).unwrap();
        let Command::Answer { id, answer } = args.command else {
            panic!("expected answer");
        };
        assert_eq!(id.as_str(), "abc123");
        assert_eq!(answer, "가장 큰 각은 직각");
    }

    #[test]
    fn answer_without_text_is_rejected() {
        assert!(matches!(
            parse(&["answer", "abc123"]),
            Err(ArgsError::MissingArg { name: "answer" })
        ));
    }

    #[test]
    fn explicit_db_url_wins() {
        let args = parse(&["stats", "--db", "sqlite::memory:"]).unwrap();
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(args.command, Command::Stats);
    }

    #[test]
    fn stray_arguments_are_rejected() {
        assert!(matches!(parse(&["list", "extra"]), Err(ArgsError::UnknownArg(a)) if a == "extra"));
        assert!(matches!(parse(&["frobnicate"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/quest.sqlite3".to_string());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/quest.sqlite3"));
    }
}
