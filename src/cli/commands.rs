//! Command implementations for Colloquy CLI.

use std::io::{self, BufRead, Write};
use std::time::Instant;

use crate::chat::{ChatEngine, load_seed, storefront_seed};
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::EngineConfig;
use crate::error::{ColloquyError, Result};

/// Execute a CLI command.
pub fn execute_command(args: ColloquyArgs) -> Result<()> {
    let engine = build_engine(&args)?;

    match &args.command {
        Command::Ask(ask_args) => ask(&engine, ask_args, &args),
        Command::Chat(chat_args) => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            run_session(&engine, chat_args, stdin.lock(), stdout.lock())
        }
        Command::Stats(stats_args) => show_stats(&engine, stats_args, &args),
    }
}

/// Build the session engine from the global configuration and seed options.
pub fn build_engine(args: &ColloquyArgs) -> Result<ChatEngine> {
    let config = match &args.config {
        Some(path) => {
            log::info!("loading engine configuration from {}", path.display());
            EngineConfig::from_file(path)?
        }
        None => EngineConfig::default(),
    };

    let seed = match &args.seed {
        Some(path) => {
            log::info!("loading seed exemplars from {}", path.display());
            load_seed(path)?
        }
        None => storefront_seed(),
    };

    ChatEngine::new(config, &seed)
}

/// Answer utterances, teaching the given pairs first.
fn ask(engine: &ChatEngine, args: &AskArgs, cli_args: &ColloquyArgs) -> Result<()> {
    let start_time = Instant::now();

    let taught = if args.teach.is_empty() {
        None
    } else {
        Some(engine.add_exemplars(&args.teach)?)
    };

    let answers = args
        .texts
        .iter()
        .map(|text| Answer::new(text, engine.resolve_detailed(text)))
        .collect();

    output_result(
        "Answers",
        &AskResult {
            taught,
            answers,
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Show engine statistics, teaching the given pairs first.
fn show_stats(engine: &ChatEngine, args: &StatsArgs, cli_args: &ColloquyArgs) -> Result<()> {
    if !args.teach.is_empty() {
        engine.add_exemplars(&args.teach)?;
    }

    output_result("Engine statistics", &engine.stats(), cli_args)
}

/// A line typed into an interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// `/teach INPUT => RESPONSE`
    Teach { input: String, response: String },
    /// `/stats`
    Stats,
    /// `/quit`
    Quit,
    /// A blank line.
    Empty,
    /// Anything else is an utterance.
    Say(String),
}

impl SessionCommand {
    /// Parse one session line.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();

        if line.is_empty() {
            return Ok(SessionCommand::Empty);
        }
        if line == "/quit" || line == "/exit" {
            return Ok(SessionCommand::Quit);
        }
        if line == "/stats" {
            return Ok(SessionCommand::Stats);
        }
        if let Some(rest) = line
            .strip_prefix("/teach")
            .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
        {
            let (input, response) = rest.split_once("=>").ok_or_else(|| {
                ColloquyError::validation("usage: /teach INPUT => RESPONSE")
            })?;
            return Ok(SessionCommand::Teach {
                input: input.trim().to_string(),
                response: response.trim().to_string(),
            });
        }

        Ok(SessionCommand::Say(line.to_string()))
    }
}

/// Run a line-oriented session until `/quit` or end of input.
///
/// Teaching mistakes are reported on the output and the session continues.
pub fn run_session<R: BufRead, W: Write>(
    engine: &ChatEngine,
    args: &ChatArgs,
    reader: R,
    mut writer: W,
) -> Result<()> {
    write!(writer, "{}", args.prompt)?;
    writer.flush()?;

    for line in reader.lines() {
        let line = line?;

        match SessionCommand::parse(&line) {
            Ok(SessionCommand::Quit) => break,
            Ok(SessionCommand::Empty) => {}
            Ok(SessionCommand::Stats) => {
                let stats = engine.stats();
                writeln!(
                    writer,
                    "exemplars: {}, vocabulary: {}, responses: {}, version: {}, trained: {}",
                    stats.exemplars,
                    stats.vocabulary_size,
                    stats.distinct_responses,
                    stats.version,
                    stats.model.is_some()
                )?;
            }
            Ok(SessionCommand::Teach { input, response }) => {
                match engine.add_exemplar(&input, &response) {
                    Ok(outcome) => writeln!(writer, "learned '{input}' ({})", outcome.model)?,
                    Err(e) => writeln!(writer, "error: {e}")?,
                }
            }
            Ok(SessionCommand::Say(text)) => {
                let resolution = engine.resolve_detailed(&text);
                if args.show_tier {
                    writeln!(writer, "{} [{}]", resolution.response, resolution.tier)?;
                } else {
                    writeln!(writer, "{}", resolution.response)?;
                }
            }
            Err(e) => writeln!(writer, "error: {e}")?,
        }

        write!(writer, "{}", args.prompt)?;
        writer.flush()?;
    }

    writeln!(writer)?;
    Ok(())
}
