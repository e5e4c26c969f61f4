mod assistant;
mod cli;
mod config;
mod error;
mod extract;
mod gemini;
mod job;
mod pdfco;
mod poller;
mod processor;
mod ui;

use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use console::style;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use assistant::{Assistant, DocumentContext, ToolIntent};
use cli::{Cli, Command};
use config::PdfAssistConfig;
use error::PdfAssistError;
use gemini::GeminiClient;
use pdfco::{Operation, PdfCoClient, RemoteStatus};
use poller::{PollConfig, Poller};
use processor::JobProcessor;
use ui::JobProgress;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !ui::is_reported(&e) {
                eprintln!("{} {e:#}", style("error:").red().bold());
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "pdfassist=debug" } else { "pdfassist=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => PdfAssistConfig::load_from(path),
        None => PdfAssistConfig::load(),
    }
    .context("failed to load configuration")?;
    let poll = poll_config(&cli, &config)?;

    match cli.command {
        Command::Tools => {
            for op in Operation::ALL {
                println!(
                    "  {:<14} {} {}",
                    style(op.name()).cyan(),
                    op.description(),
                    style(format!("(min. {} file(s))", op.min_inputs())).dim()
                );
            }
        }

        Command::Process {
            tool,
            files,
            options,
            output,
            report,
        } => {
            let processor = job_processor(&config, poll)?;
            let max = processor.poller().config().max_attempts;
            let progress =
                JobProgress::start(&format!("Uploading {} file(s) for {tool}...", files.len()));

            let outcome = processor
                .process_files(&tool, &files, &options.to_params(), |attempt, status| {
                    progress.attempt(attempt, max, status)
                })
                .await;
            let processed = match outcome {
                Ok(processed) => processed,
                Err(e) => return Err(progress.fail(&e.to_string()).into()),
            };

            match output {
                Some(dest) => {
                    progress.stage("Downloading result...");
                    let size = processor.download_result(&processed.result_url, &dest).await?;
                    progress.succeed(&format!("Saved {} ({size} bytes)", dest.display()));
                }
                None => progress.succeed(&processed.result_url),
            }
            if report {
                progress.print_report(&processed.report);
            }
        }

        Command::Upload { file } => {
            let processor = job_processor(&config, poll)?;
            let uploaded = processor.upload_path(&file).await?;
            println!("{}", uploaded.url);
        }

        Command::Check { job_id } => {
            let processor = job_processor(&config, poll)?;
            match processor.client().check_job(&job_id).await? {
                RemoteStatus::Working(status) => {
                    println!("{} {status}", style("working:").yellow())
                }
                RemoteStatus::Success { url } => println!("{} {url}", style("success:").green()),
                RemoteStatus::Failed { reason } => {
                    println!("{} {reason}", style("failed:").red())
                }
            }
        }

        Command::Ocr { file, language } => {
            let processor = job_processor(&config, poll)?;
            let progress = JobProgress::start(&format!("Extracting text from {}...", file.display()));
            match processor.extract_text(&file, language).await {
                Ok(text) => {
                    progress.succeed("Text extracted");
                    println!("{text}");
                }
                Err(e) => return Err(progress.fail(&e.to_string()).into()),
            }
        }

        Command::Detect { prompt } => {
            let assistant = build_assistant(&config)?;
            match assistant.detect_tool(&prompt).await {
                Some(intent) => {
                    println!("{}", intent.message);
                    println!();
                    println!("  {}", style(process_hint(&intent)).cyan());
                    debug!(?intent, "tool detected");
                }
                None => println!("No matching tool. Run `pdfassist tools` to see what is available."),
            }
        }

        Command::Ask {
            question,
            document,
            style: answer_style,
        } => {
            let assistant = build_assistant(&config)?;
            let context = match document {
                Some(path) => Some(load_document(&config, poll, &path).await?),
                None => None,
            };
            let answer = assistant
                .ask(&question, context.as_ref(), answer_style.into())
                .await?;

            println!("{}", answer.answer);
            if !answer.found_in_document {
                println!("{}", style("(not found in the document)").yellow());
            }
            for citation in &answer.citations {
                println!(
                    "  {} \"{}\"",
                    style(format!("[p. {}]", citation.page)).dim(),
                    citation.quote
                );
            }
        }

        Command::Summarize { file, smart } => {
            let assistant = build_assistant(&config)?;
            let doc = load_document(&config, poll, &file).await?;

            if smart {
                let summary = assistant.smart_summary(&doc.text, &doc.file_name).await;
                if summary.is_scanned {
                    println!(
                        "{}",
                        style("This looks like a scanned document; results may be limited.")
                            .yellow()
                    );
                }
                println!("{} {}", style("Type:").bold(), summary.document_type);
                println!("{} {}", style("Key dates:").bold(), summary.key_dates);
                println!("{} {}", style("Amounts:").bold(), summary.numbers_and_amounts);
                println!("{} {}", style("Parties:").bold(), summary.people_and_orgs);
                println!("{} {}", style("Flags:").bold(), summary.flags);
                println!();
                println!("{}", summary.summary_text);
            } else {
                for point in assistant.summarize(&doc.text).await {
                    println!("  • {point}");
                }
            }
        }

        Command::Speak { text, output } => {
            let assistant = build_assistant(&config)?;
            let audio = assistant.speak(&text).await?;
            let bytes = audio.into_file_bytes();
            tokio::fs::write(&output, &bytes)
                .await
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Saved {} ({} bytes)", output.display(), bytes.len());
        }
    }

    Ok(())
}

/// The `process` invocation that carries out a detected intent.
fn process_hint(intent: &ToolIntent) -> String {
    let mut hint = format!("pdfassist process {}", intent.operation);
    for _ in 0..intent.needs_files.max(1) {
        hint.push_str(" <file>");
    }
    let params = &intent.params;
    if let Some(pages) = &params.pages {
        hint.push_str(&format!(" --pages \"{pages}\""));
    }
    if let Some(angle) = params.angle {
        hint.push_str(&format!(" --angle {angle}"));
    }
    if params.password.is_some() {
        hint.push_str(" --password <password>");
    }
    if let Some(text) = &params.text {
        hint.push_str(&format!(" --text \"{text}\""));
    }
    hint
}

/// Polling settings from config, with command-line flags taking precedence.
fn poll_config(cli: &Cli, config: &PdfAssistConfig) -> Result<PollConfig, PdfAssistError> {
    let mut poll = config.poll_config();
    if let Some(max) = cli.max_attempts {
        poll.max_attempts = max;
    }
    if let Some(ms) = cli.interval_ms {
        if ms == 0 {
            return Err(PdfAssistError::Config(
                "--interval-ms must be greater than zero".to_string(),
            ));
        }
        poll.interval = Duration::from_millis(ms);
    }
    debug!(
        interval = ?poll.interval,
        max_attempts = poll.max_attempts,
        budget = ?poll.budget(),
        "polling configured"
    );
    Ok(poll)
}

fn job_processor(config: &PdfAssistConfig, poll: PollConfig) -> Result<JobProcessor, PdfAssistError> {
    let client = PdfCoClient::with_base_url(
        config.require_pdfco_key()?.to_string(),
        config.pdfco_base_url.clone(),
    )?;
    Ok(JobProcessor::new(client, Poller::new(poll)))
}

fn build_assistant(config: &PdfAssistConfig) -> Result<Assistant<GeminiClient>, PdfAssistError> {
    let client = GeminiClient::with_base_url(
        config.require_gemini_key()?.to_string(),
        config.gemini_base_url.clone(),
    )?;
    Ok(Assistant::new(client, config))
}

/// PDFs go through OCR on the service, or local extraction when that
/// fails; anything else is read as text.
async fn load_document(
    config: &PdfAssistConfig,
    poll: PollConfig,
    path: &Path,
) -> anyhow::Result<DocumentContext> {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime.essence_str() != "application/pdf" {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PdfAssistError::InvalidInput(path.to_path_buf()))?
            .to_string();
        let text = tokio::fs::read_to_string(path).await?;
        return Ok(DocumentContext { file_name, text });
    }

    let processor = job_processor(config, poll)?;
    let progress = JobProgress::start(&format!("Reading {}...", path.display()));
    match processor.load_pdf_document(path).await {
        Ok(doc) => {
            progress.succeed(&format!("Read {}", doc.file_name));
            Ok(doc)
        }
        Err(e) => Err(progress.fail(&e.to_string()).into()),
    }
}
