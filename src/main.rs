use nlq::client::QueryClient;
use nlq::models::QueryRequest;
use nlq::rows::Row;
use nlq::session::{cancel_channel, SessionOutcome, SessionState, StreamHandler};
use nlq::sse::QueryEvent;
use nlq::SessionError;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::io::Write;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prints streaming query progress to the terminal.
///
/// This is the thin stand-in for a real view layer: all protocol and state
/// handling lives in the library, this only paints.
#[derive(Default)]
struct ConsoleView {
    last_progress: Option<u8>,
    printed_sql: String,
    in_reasoning: bool,
}

impl ConsoleView {
    fn end_reasoning_line(&mut self) {
        if self.in_reasoning {
            println!();
            self.in_reasoning = false;
        }
    }

    fn print_rows(rows: &[Row]) {
        let Some(first) = rows.first() else {
            println!("(no rows)");
            return;
        };
        let columns: Vec<&String> = first.keys().collect();
        println!(
            "{}",
            columns
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(" | ")
        );
        for row in rows {
            let cells: Vec<String> = columns
                .iter()
                .map(|c| match row.get(*c) {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                })
                .collect();
            println!("{}", cells.join(" | "));
        }
    }
}

impl StreamHandler for ConsoleView {
    fn on_event(&mut self, event: &QueryEvent, state: &SessionState) {
        match event {
            QueryEvent::TextDelta { text } => {
                if !text.is_empty() {
                    print!("{text}");
                    let _ = std::io::stdout().flush();
                    self.in_reasoning = true;
                }
            }
            QueryEvent::StageUpdate { .. } => {
                self.end_reasoning_line();
                if let Some(stage) = &state.stage {
                    if self.last_progress != Some(state.progress) {
                        eprintln!("[{:3}%] {}", state.progress, stage);
                        self.last_progress = Some(state.progress);
                    }
                }
                if !state.sql.is_empty() && state.sql != self.printed_sql {
                    println!("\nSQL:\n{}\n", state.sql);
                    self.printed_sql = state.sql.clone();
                }
            }
            _ => {}
        }
    }

    fn on_complete(&mut self, state: &SessionState) {
        self.end_reasoning_line();
        println!();
        Self::print_rows(&state.rows);
    }

    fn on_error(&mut self, error: &SessionError, _state: &SessionState) {
        self.end_reasoning_line();
        eprintln!("error: {error}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("nlq {VERSION}");
        return Ok(());
    }
    let question = args.join(" ");
    if question.trim().is_empty() {
        return Err(eyre!("usage: nlq <question>  (set NLQ_BASE_URL to point at the service)"));
    }

    let client = QueryClient::from_env();
    let request = QueryRequest::new(question);

    let (cancel_handle, cancel_token) = cancel_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_handle.cancel();
        }
    });

    let mut view = ConsoleView::default();
    let (outcome, _state) = client.run_query(&request, &mut view, cancel_token).await;

    match outcome {
        SessionOutcome::Completed => Ok(()),
        SessionOutcome::Cancelled => {
            eprintln!("cancelled");
            Ok(())
        }
        SessionOutcome::Errored => Err(eyre!("query failed")),
    }
}
