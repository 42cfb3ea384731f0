//! Revu application binary - composition root.
//!
//! Ties together the Revu crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Construct the completion client (fail fast on missing credentials)
//! 3. Load the review corpus and build the retriever (dense with lexical fallback)
//! 4. Load the subject database
//! 5. Serve a read-eval loop over stdin, one conversational turn per line

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use revu_chat::{ConversationState, GraphOrchestrator, SubjectDb};
use revu_core::config::RevuConfig;
use revu_core::types::Role;
use revu_llm::{CompletionService, HttpCompletionClient};
use revu_retrieval::{
    build_retriever, load_jsonl, DenseBackend, DocumentRetriever, HttpEmbeddingClient,
};

mod cli;

use cli::CliArgs;

/// Expand a leading `~/` to the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        return PathBuf::from(home).join(rest);
    }
    PathBuf::from(path)
}

/// Build the document retriever: dense when an embedding backend is
/// available, lexical otherwise.
async fn build_document_retriever(
    config: &RevuConfig,
    corpus_path: &Path,
    index_dir: PathBuf,
    lexical_only: bool,
) -> revu_core::Result<Arc<dyn DocumentRetriever>> {
    let docs = load_jsonl(corpus_path)?;
    tracing::info!(path = %corpus_path.display(), docs = docs.len(), "Review corpus loaded");

    let dense = if lexical_only {
        None
    } else {
        match HttpEmbeddingClient::from_config(&config.embedding) {
            Ok(client) => {
                let model = client.model().to_string();
                Some(DenseBackend::new(Box::new(client), model, index_dir))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Embedding backend unavailable, using lexical retriever");
                None
            }
        }
    };

    Ok(build_retriever(docs, config.retrieval.max_features, dense).await)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config first: the log level may come from it.
    let config_file = args.resolve_config_path();
    let config = RevuConfig::load_or_default(&config_file);

    // Tracing.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    tracing::info!("Starting Revu v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Completion client. Missing credentials abort startup; per-turn
    // failures later degrade gracefully instead.
    let llm: Arc<dyn CompletionService> = Arc::new(HttpCompletionClient::from_config(&config.llm)?);
    tracing::info!(model = %config.llm.model, "Completion client ready");

    // Retriever.
    let corpus_path = args.resolve_corpus_path(&config.retrieval.corpus_path);
    let index_dir = expand_home(
        &args
            .resolve_index_dir(&config.retrieval.index_dir)
            .to_string_lossy(),
    );
    let retriever =
        build_document_retriever(&config, &corpus_path, index_dir, args.lexical_only).await?;
    tracing::info!(retriever = retriever.name(), "Retriever ready");

    // Subjects.
    let subjects_path = args.resolve_subjects_path(&config.subjects.path);
    let subjects = Arc::new(SubjectDb::load(&subjects_path)?);
    tracing::info!(path = %subjects_path.display(), subjects = subjects.len(), "Subject database loaded");

    // Orchestrator and session state.
    let orchestrator = GraphOrchestrator::new(
        llm,
        retriever,
        subjects,
        &config.retrieval,
        config.memory.clone(),
    );
    let mut state = ConversationState::new(config.retrieval.k, config.memory.clone());
    tracing::info!(session = %state.session_id, "Session started");

    // Turn loop: one line in, one assistant message out.
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    stdout.write_all("질문을 입력하세요 (종료: exit)\n> ".as_bytes()).await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }

        state.add_message(Role::User, input);
        let route = orchestrator.run_turn(&mut state).await;

        if let Some(message) = state.messages.last() {
            let reply = format!("[{}] {}\n> ", route, message.content);
            stdout.write_all(reply.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    tracing::info!("Session ended");
    Ok(())
}
