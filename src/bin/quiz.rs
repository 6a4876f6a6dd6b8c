use std::fmt::Display;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use mcq_forge::clients::groq::models::GroqModel;
use mcq_forge::clients::groq::{GroqClient, GroqConfig, DEFAULT_BASE_URL};
use mcq_forge::config::KeyFromEnv;
use mcq_forge::{
    Difficulty, GenerationForm, OptionId, QuestionCount, QuizError, QuizGenerator, QuizRequest, QuizSession, Subject,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "MCQ Generator (IITJEE Level)", long_about = None)]
#[command(after_help = "ENVIRONMENT VARIABLES:
    GROQ_API_KEY   Offered as the default when the key prompt is left empty
    RUST_LOG       Log filter (default: warn)")]
struct Args {
    /// Model identifier sent to the chat-completion endpoint
    #[arg(long, default_value = "llama3-8b-8192")]
    model: String,

    /// Sampling temperature
    #[arg(long, default_value_t = 1.0)]
    temperature: f32,

    /// Maximum completion tokens
    #[arg(long, default_value_t = 512)]
    max_tokens: u32,

    /// OpenAI-compatible API base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

fn read_line(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
    }
    Ok(input.trim().to_string())
}

/// Numbered pick list; Enter keeps `default`.
fn choose<T: Display>(label: &str, items: &[T], default: usize) -> io::Result<usize> {
    println!("\n{}", label);
    for (i, item) in items.iter().enumerate() {
        println!("  {:>2}) {}", i + 1, item);
    }
    loop {
        let answer = read_line(&format!("Choice [{}]: ", default + 1))?;
        if answer.is_empty() {
            return Ok(default);
        }
        match answer.parse::<usize>() {
            Ok(n) if (1..=items.len()).contains(&n) => return Ok(n - 1),
            _ => println!("Please enter a number between 1 and {}.", items.len()),
        }
    }
}

fn read_count() -> io::Result<QuestionCount> {
    loop {
        let answer = read_line(&format!(
            "\nHow many questions? ({}-{}) [{}]: ",
            QuestionCount::MIN,
            QuestionCount::MAX,
            QuestionCount::DEFAULT
        ))?;
        if answer.is_empty() {
            return Ok(QuestionCount::default());
        }
        match answer.parse::<u32>().map_err(|_| ()).and_then(|n| QuestionCount::new(n).map_err(|_| ())) {
            Ok(count) => return Ok(count),
            Err(()) => println!("Please enter a whole number between {} and {}.", QuestionCount::MIN, QuestionCount::MAX),
        }
    }
}

fn confirm(prompt: &str, default: bool) -> io::Result<bool> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    let answer = read_line(&format!("{} {} ", prompt, hint))?.to_lowercase();
    Ok(match answer.as_str() {
        "" => default,
        "y" | "yes" => true,
        _ => false,
    })
}

fn collect_form() -> Result<GenerationForm> {
    let api_key = GroqClient::find_key_with_user("Enter your Groq API Key").context("reading API key")?;

    let subject = Subject::ALL[choose("Select Subject", &Subject::ALL, 0)?];
    let topics = subject.topics();
    let topic = topics[choose("Select Topic", topics, 0)?];
    let count = read_count()?;
    let difficulty = Difficulty::ALL[choose("Select Difficulty", &Difficulty::ALL, 0)?];

    let request = QuizRequest::new(subject, topic, count, difficulty)?;
    Ok(GenerationForm::new(api_key, request))
}

fn report_error(err: &QuizError) {
    println!("\nError: {}", err);
    if let Some(raw) = err.raw_response() {
        println!("----- response -----\n{}\n--------------------", raw);
    }
}

fn show_question(session: &QuizSession, index: usize) {
    let q = &session.questions()[index];
    println!("\nQ{}: {}", index + 1, q.question);
    for id in OptionId::ALL {
        let marker = if session.answer(index) == Some(id) { '*' } else { ' ' };
        println!("  {}{}) {}", marker, id.index() + 1, q.option_text(id));
    }
}

fn ask_answer(session: &mut QuizSession, index: usize) -> Result<()> {
    show_question(session, index);
    loop {
        let answer = read_line(&format!("Select your answer for Q{} (1-4, Enter to skip): ", index + 1))?;
        if answer.is_empty() {
            return Ok(());
        }
        let choice = answer.parse::<usize>().ok().and_then(|n| n.checked_sub(1)).and_then(OptionId::from_index);
        match choice {
            Some(id) => {
                session.select(index, id)?;
                return Ok(());
            }
            None => println!("Please enter 1, 2, 3 or 4."),
        }
    }
}

fn take_quiz(session: &mut QuizSession) -> Result<()> {
    println!("\n===== MCQ Quiz =====");
    for index in 0..session.questions().len() {
        ask_answer(session, index)?;
    }

    loop {
        let total = session.questions().len();
        println!("\nAnswered {} of {}.", session.answered_count(), total);
        let answer = read_line("Question number to change, or 'f' to finish: ")?;
        if answer.eq_ignore_ascii_case("f") {
            return Ok(());
        }
        match answer.parse::<usize>() {
            Ok(n) if (1..=total).contains(&n) => ask_answer(session, n - 1)?,
            _ => println!("Please enter a number between 1 and {} or 'f'.", total),
        }
    }
}

fn show_results(session: &QuizSession) {
    println!("\n===== Results =====");
    for (index, q) in session.questions().iter().enumerate() {
        let selected = session.answer(index);
        let verdict = if q.is_correct(selected) { "correct" } else { "wrong" };
        println!("\nQ{}: {} [{}]", index + 1, q.question, verdict);
        match selected {
            Some(id) => println!("  Your answer:    {}", q.option_text(id)),
            None => println!("  Your answer:    (unanswered)"),
        }
        println!("  Correct answer: {}", q.correct_text());
        if let Some(hints) = &q.hints {
            println!("  Hint:           {}", hints);
        }
        if let Some(solution) = &q.solution {
            println!("  Solution:       {}", solution);
        }
    }
    if let Some(score) = session.score() {
        println!("\nYour Score: {}", score);
    }
    if let Some(elapsed) = session.elapsed() {
        println!("Time taken: {}m {:02}s", elapsed.num_minutes(), elapsed.num_seconds() % 60);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let generator = QuizGenerator::new(GroqClient::new(GroqConfig {
        model: GroqModel::from_id(&args.model),
        temperature: args.temperature,
        max_tokens: args.max_tokens,
        base_url: args.base_url,
        ..GroqConfig::default()
    }));

    println!("MCQ Generator (IITJEE Level)");
    loop {
        let mut session = QuizSession::new();

        while session.is_setup() {
            let form = collect_form()?;
            if !confirm("\nGenerate MCQs?", true)? {
                continue;
            }
            println!("Generating questions...");
            match session.generate(&generator, &form).await {
                Ok(count) => println!("Generated {} questions.", count),
                Err(err) => {
                    report_error(&err);
                    if !confirm("Try again?", true)? {
                        return Ok(());
                    }
                }
            }
        }

        take_quiz(&mut session)?;
        session.finish()?;
        show_results(&session);

        if !confirm("\nStart a new quiz?", false)? {
            return Ok(());
        }
    }
}
