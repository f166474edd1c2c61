//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::chat::{Resolution, Tier, TrainingOutcome};
use crate::cli::args::{ColloquyArgs, OutputFormat};
use crate::error::Result;

/// One answered utterance.
#[derive(Debug, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub response: String,
    pub tier: Tier,
}

impl Answer {
    pub fn new(text: &str, resolution: Resolution) -> Self {
        Self {
            text: text.to_string(),
            response: resolution.response,
            tier: resolution.tier,
        }
    }
}

/// Result structure for the ask command.
#[derive(Debug, Serialize, Deserialize)]
pub struct AskResult {
    pub taught: Option<TrainingOutcome>,
    pub answers: Vec<Answer>,
    pub duration_ms: u64,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &ColloquyArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &ColloquyArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    // Convert to JSON value for easier manipulation
    let value = serde_json::to_value(result)?;

    if std::any::type_name::<T>().contains("AskResult") {
        output_answers_human(&value, args)
    } else {
        output_generic_human(&value, 0);
        Ok(())
    }
}

/// Output answers in human format.
fn output_answers_human(value: &serde_json::Value, args: &ColloquyArgs) -> Result<()> {
    let Some(answers) = value.get("answers").and_then(|a| a.as_array()) else {
        output_generic_human(value, 0);
        return Ok(());
    };

    for answer in answers {
        let text = answer.get("text").map(format_value).unwrap_or_default();
        let response = answer.get("response").map(format_value).unwrap_or_default();
        let tier = answer.get("tier").map(format_value).unwrap_or_default();

        if args.verbosity() > 1 {
            println!("> {text}");
        }
        println!("{response} ({tier})");
    }

    if args.verbosity() > 1
        && let Some(duration) = value.get("duration_ms")
    {
        println!();
        println!("Answered in {} ms", format_value(duration));
    }
    Ok(())
}

/// Generic nested key/value output.
fn output_generic_human(value: &serde_json::Value, indent: usize) {
    let pad = "  ".repeat(indent);
    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                if val.is_object() {
                    println!("{pad}{key}:");
                    output_generic_human(val, indent + 1);
                } else {
                    let formatted_val = format_value(val);
                    println!("{pad}{key}: {formatted_val}");
                }
            }
        }
        _ => {
            let formatted_value = format_value(value);
            println!("{pad}{formatted_value}");
        }
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &ColloquyArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        serde_json::Value::Object(_) => "[object]".to_string(),
        serde_json::Value::Null => "none".to_string(),
    }
}
