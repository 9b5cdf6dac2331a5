// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Tamsaek CLI tool

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use tamsaek::api::ApiBackend;
use tamsaek::dispatch::{dispatch, Payload};
use tamsaek::task::{ReasoningStyle, TaskType};

#[derive(Parser)]
#[command(name = "tamsaek")]
#[command(about = "Prompt-search harness: try candidate system prompts, keep the best", long_about = None)]
struct Cli {
    /// Reasoning style: standard, chain_of_thought, or tree_of_thought
    #[arg(long, global = true, default_value = "standard")]
    reasoning: String,

    /// Fan backend calls out concurrently
    #[arg(long, global = true)]
    parallel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a text
    Summarize {
        /// The text to summarize
        #[arg(short, long, conflicts_with = "file")]
        text: Option<String>,

        /// Read the text from a file instead
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Generate code from a task description
    Codegen {
        /// What the code should do
        #[arg(short, long)]
        task: String,

        /// Target programming language
        #[arg(short, long)]
        language: String,
    },

    /// Extract named fields from a text
    Extract {
        /// The text to extract from
        #[arg(short, long, conflicts_with = "file")]
        text: Option<String>,

        /// Read the text from a file instead
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Comma-separated field names, in order
        #[arg(short = 'F', long, value_delimiter = ',', required = true)]
        fields: Vec<String>,
    },

    /// Answer a question against a context
    Qa {
        /// The context to answer from
        #[arg(short, long, conflicts_with = "file")]
        context: Option<String>,

        /// Read the context from a file instead
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// The question
        #[arg(short, long)]
        question: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let backend = ApiBackend::from_env().context("no generation backend configured")?;
    let style = ReasoningStyle::parse(&cli.reasoning);

    let (task, payload) = match cli.command {
        Commands::Summarize { text, file } => {
            let text = text_input(text, file, "text")?;
            (TaskType::Summarization, Payload::new().set("text", text))
        }
        Commands::Codegen { task, language } => (
            TaskType::CodeGeneration,
            Payload::new()
                .set("task_description", task)
                .set("language", language),
        ),
        Commands::Extract { text, file, fields } => {
            let text = text_input(text, file, "text")?;
            (
                TaskType::DataExtraction,
                Payload::new().set("text", text).fields(fields),
            )
        }
        Commands::Qa {
            context,
            file,
            question,
        } => {
            let context = text_input(context, file, "context")?;
            (
                TaskType::QuestionAnswering,
                Payload::new()
                    .set("context", context)
                    .set("question", question),
            )
        }
    };

    let mut search = dispatch(&backend, task, &payload).reasoning(style);
    if cli.parallel {
        search = search.parallel();
    }

    let outcome = search.go()?;

    println!("System prompt:\n{}\n", outcome.system_prompt);
    println!("Prompt:\n{}\n", outcome.prompt);
    println!("Output:\n{}\n", outcome.output);
    println!("Score (LCS-F1): {:.4}", outcome.score);
    println!(
        "Candidates: {} tried, {} failed",
        outcome.candidates_tried,
        outcome.failures.len()
    );

    Ok(())
}

/// Resolve an input that may come inline or from a file.
fn text_input(
    inline: Option<String>,
    file: Option<PathBuf>,
    what: &str,
) -> anyhow::Result<String> {
    match (inline, file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {} from {}", what, path.display())),
        (None, None) => bail!("provide --{what} or --file"),
    }
}
