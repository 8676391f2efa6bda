mod config;
mod llm;
mod logging;
mod prompts;
mod session;
mod types;
mod web;

use crate::config::Settings;
use crate::session::Session;
use crate::types::{EventSink, OutputFormat, SummaryAction, SummaryEvent, SummaryRequest};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "page-gist", version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Increase logging verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize the readable content of a page
    Summarize {
        url: String,

        /// Language to write the summary in (overrides the stored preference)
        #[arg(long)]
        language: Option<String>,

        /// Output style (overrides the stored preference)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Summarize this text instead of the page's extracted content
        #[arg(long)]
        selection: Option<String>,
    },
    /// Shrink an existing summary into something even shorter
    Shrink {
        url: String,

        /// File holding the previous summary; reads stdin when omitted
        #[arg(long)]
        summary: Option<PathBuf>,

        #[arg(long)]
        language: Option<String>,

        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Turn a summary into a short social media post promoting the page
    Social {
        url: String,

        /// File holding the summary to promote; reads stdin when omitted
        #[arg(long)]
        summary: Option<PathBuf>,

        #[arg(long)]
        language: Option<String>,
    },
    /// Manage stored settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Store the Gemini API key
    SetApiKey { key: String },
    /// Store the preferred summary language
    SetLanguage { language: String },
    /// Store the preferred output format
    SetFormat {
        #[arg(value_enum)]
        format: OutputFormat,
    },
    /// Print the stored settings (the API key is redacted)
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::setup_logging(args.verbose);

    match args.command {
        Command::Summarize {
            url,
            language,
            format,
            selection,
        } => {
            run_request(SummaryRequest {
                action: SummaryAction::Summarize,
                url: Some(url),
                text: None,
                selection,
                language,
                format,
            })
            .await
        }
        Command::Shrink {
            url,
            summary,
            language,
            format,
        } => {
            let text = read_summary(summary)?;
            run_request(SummaryRequest {
                action: SummaryAction::Shrink,
                url: Some(url),
                text: Some(text),
                selection: None,
                language,
                format,
            })
            .await
        }
        Command::Social {
            url,
            summary,
            language,
        } => {
            let text = read_summary(summary)?;
            run_request(SummaryRequest {
                action: SummaryAction::Social,
                url: Some(url),
                text: Some(text),
                selection: None,
                language,
                format: None,
            })
            .await
        }
        Command::Config { command } => handle_config(command),
    }
}

/// Runs one summarization request, printing fragments to stdout as they
/// arrive. Exits nonzero when the request ends in an error event.
async fn run_request(request: SummaryRequest) -> Result<()> {
    let settings = config::load_settings()?;
    let session = Session::new(settings);

    let failed = Arc::new(AtomicBool::new(false));
    let sink_failed = failed.clone();
    let sink: EventSink = Box::new(move |event: &SummaryEvent| {
        match event {
            SummaryEvent::Fragment(text) => {
                print!("{text}");
                std::io::stdout().flush()?;
            }
            SummaryEvent::Complete => println!(),
            SummaryEvent::Error(message) => {
                eprintln!("Error: {message}");
                sink_failed.store(true, Ordering::Relaxed);
            }
        }
        Ok(())
    });

    session.run(request, &sink).await?;

    if failed.load(Ordering::Relaxed) {
        std::process::exit(1);
    }
    Ok(())
}

fn read_summary(path: Option<PathBuf>) -> Result<String> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn handle_config(command: ConfigCommand) -> Result<()> {
    let mut settings = config::load_settings()?;

    match command {
        ConfigCommand::SetApiKey { key } => {
            settings.api_key = Some(key);
            config::save_settings(&settings)?;
            println!("API key saved.");
        }
        ConfigCommand::SetLanguage { language } => {
            settings.preferred_language = Some(language);
            config::save_settings(&settings)?;
            println!("Preferred language saved.");
        }
        ConfigCommand::SetFormat { format } => {
            settings.preferred_format = Some(format);
            config::save_settings(&settings)?;
            println!("Preferred format saved.");
        }
        ConfigCommand::Show => {
            print_settings(&settings);
        }
    }
    Ok(())
}

fn print_settings(settings: &Settings) {
    let api_key = match &settings.api_key {
        Some(_) => "set",
        None => "not set",
    };
    println!("API key:   {api_key}");
    println!(
        "Language:  {}",
        settings
            .preferred_language
            .as_deref()
            .unwrap_or(prompts::DEFAULT_LANGUAGE)
    );
    println!(
        "Format:    {}",
        settings.preferred_format.unwrap_or_default()
    );
}
