use std::fmt;

use quiz_core::model::{Answer, AnswerId, Question, QuestionId, SessionScope};
use storage::SqliteRepository;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    scope: String,
    questions: u32,
    options: u32,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidQuestions { raw: String },
    InvalidOptions { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidQuestions { raw } => write!(f, "invalid --questions value: {raw}"),
            ArgsError::InvalidOptions { raw } => write!(f, "invalid --options value: {raw}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut scope = std::env::var("QUIZ_SCOPE").unwrap_or_else(|_| "sample-cert:all".into());
        let mut questions = 20_u32;
        let mut options = 4_u32;

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
                "--scope" => {
                    scope = require_value(&mut args, "--scope")?;
                }
                "--questions" => {
                    let raw = require_value(&mut args, "--questions")?;
                    questions = raw
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidQuestions { raw })?;
                }
                "--options" => {
                    let raw = require_value(&mut args, "--options")?;
                    options = raw
                        .parse::<u32>()
                        .ok()
                        .filter(|n| *n >= 2)
                        .ok_or(ArgsError::InvalidOptions { raw })?;
                }
                other => return Err(ArgsError::UnknownArg(other.to_string())),
            }
        }

        Ok(Self {
            db_url,
            scope,
            questions,
            options,
        })
    }
}

fn build_question(number: u32, options: u32) -> Result<Question, Box<dyn std::error::Error>> {
    let mut answers = Vec::with_capacity(options as usize);
    for option in 0..u64::from(options) {
        let id = u64::from(number) * 100 + option + 1;
        answers.push(Answer::new(
            AnswerId::new(id),
            format!("Option {} for question {number}", option + 1),
            option == 0,
        )?);
    }
    Ok(Question::new(
        QuestionId::new(u64::from(number)),
        format!("Sample question {number}: which option is marked correct?"),
        answers,
        Some(format!("Question {number} keeps its first option correct.")),
    )?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse()?;

    let repo = SqliteRepository::connect(&args.db_url).await?;
    repo.migrate().await?;

    let scope = SessionScope::new(args.scope.clone());
    for number in 1..=args.questions {
        let question = build_question(number, args.options)?;
        repo.insert_question(&scope, &question).await?;
    }

    println!(
        "seeded {} questions ({} options each) into scope '{}' at {}",
        args.questions, args.options, args.scope, args.db_url
    );
    Ok(())
}
