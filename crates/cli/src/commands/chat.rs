//! `deepdesk chat` — interactive or single-message chat mode.
//!
//! This is the session controller: it owns the UI loop, feeds user input
//! and staged attachments into the session, and renders whatever comes
//! back. No core error terminates the loop — transport failures and empty
//! replies are printed as notices and the prompt comes back.

use std::path::PathBuf;
use std::sync::Arc;

use deepdesk_chat::{ChatSession, TurnOutcome, TurnSettings};
use deepdesk_client::DeepSeekClient;
use deepdesk_config::AppConfig;
use deepdesk_ingest::{AttachmentIngestor, IngestReport, UploadedFile};
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(
    message: Option<String>,
    files: Vec<PathBuf>,
    model: Option<String>,
    temperature: Option<f32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(model) = model {
        config.model = model.parse()?;
    }
    if let Some(temperature) = temperature {
        config.temperature = temperature;
    }

    // Login gating: the core assumes a credential is present once a turn
    // runs, so refuse to start without one.
    let api_key = match config.require_api_key() {
        Ok(key) => key.to_string(),
        Err(err) => {
            eprintln!();
            eprintln!("  ERROR: No API key configured!");
            eprintln!();
            eprintln!("  Set one of these environment variables:");
            eprintln!("    DEEPSEEK_API_KEY=sk-...");
            eprintln!("    DEEPDESK_API_KEY=sk-...");
            eprintln!();
            eprintln!("  Or add it to your config file:");
            eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
            eprintln!();
            return Err(err.into());
        }
    };

    let backend = Arc::new(DeepSeekClient::new(config.api_url.clone(), api_key));
    let mut session = ChatSession::new(backend, config.max_context_messages);
    let ingestor = AttachmentIngestor::new(config.max_file_content);

    let settings = TurnSettings {
        model: config.model.to_string(),
        system_prompt: config.system_prompt.clone(),
        temperature: config.temperature,
    };

    if let Some(msg) = message {
        // Single message mode
        let report = ingest_paths(&ingestor, &files);
        print_ingest_warnings(&report);

        eprint!("  Thinking...");
        let outcome = session.run_turn(&msg, &report.text, &settings).await;
        eprint!("\r              \r");
        render_outcome(&outcome);
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  DeepDesk — model {}, temperature {}", settings.model, settings.temperature);
    println!("  Type your message and press Enter.");
    println!("  /attach <path> stages a file for the next turn, /clear resets");
    println!("  the conversation, 'exit' or Ctrl+D quits.");
    println!();

    let mut staged: Vec<PathBuf> = files;
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    prompt(&staged);
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            prompt(&staged);
            continue;
        }

        if matches!(line.as_str(), "exit" | "quit" | "/exit" | "/quit") {
            break;
        }

        if let Some(path) = line.strip_prefix("/attach ") {
            let path = PathBuf::from(path.trim());
            println!("  Staged {}", path.display());
            staged.push(path);
            prompt(&staged);
            continue;
        }

        if line == "/clear" {
            session.clear();
            staged.clear();
            println!("  Conversation cleared.");
            prompt(&staged);
            continue;
        }

        let report = ingest_paths(&ingestor, &staged);
        print_ingest_warnings(&report);
        if !report.is_empty() {
            println!("  [attached files]");
            for snippet_line in report.text.lines() {
                println!("    {snippet_line}");
            }
        }

        eprint!("  ...");
        let outcome = session.run_turn(&line, &report.text, &settings).await;
        eprint!("\r      \r");
        render_outcome(&outcome);
        // Staged files stay staged until a turn actually commits, so a
        // failed turn can be retried without re-attaching.
        if outcome.committed() {
            staged.clear();
        }
        prompt(&staged);
    }

    Ok(())
}

fn prompt(staged: &[PathBuf]) {
    use std::io::Write;
    if staged.is_empty() {
        print!("  You > ");
    } else {
        print!("  You ({} staged) > ", staged.len());
    }
    let _ = std::io::stdout().flush();
}

fn render_outcome(outcome: &TurnOutcome) {
    match outcome {
        TurnOutcome::Reply(reply) => println!("  Assistant: {reply}"),
        TurnOutcome::NoReply => println!("  (no valid response from the API)"),
        TurnOutcome::Failed(err) => println!("  API Error: {err}"),
    }
}

fn print_ingest_warnings(report: &IngestReport) {
    for failure in &report.failures {
        println!("  Warning: {failure}");
    }
}

/// Read staged paths into boundary objects. A file that cannot be read is
/// skipped with a warning, matching the per-file recovery policy of the
/// ingestor itself.
fn ingest_paths(ingestor: &AttachmentIngestor, paths: &[PathBuf]) -> IngestReport {
    let mut uploads = Vec::new();
    let mut report = IngestReport::default();

    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match std::fs::read(path) {
            Ok(bytes) => {
                let content_type = mime_guess::from_path(path)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string();
                uploads.push(UploadedFile::new(name, content_type, bytes));
            }
            Err(e) => {
                tracing::warn!(file = %name, "Could not read attachment: {e}");
                report
                    .failures
                    .push(deepdesk_core::error::AttachmentError::Unreadable {
                        name,
                        reason: e.to_string(),
                    });
            }
        }
    }

    let ingested = ingestor.ingest(&uploads);
    report.text = ingested.text;
    report.failures.extend(ingested.failures);
    report
}
