use async_trait::async_trait;
use facedex_core::Confirm;
use std::io::{BufRead, Write};

/// Asks on the terminal and waits for `y`/`yes`. Anything else declines.
pub struct TerminalConfirm;

#[async_trait]
impl Confirm for TerminalConfirm {
    async fn confirm(&self, title: &str, body: &str) -> bool {
        let question = format!("{title} {body} [y/N] ");
        let answer = tokio::task::spawn_blocking(move || {
            let mut stdout = std::io::stdout();
            let _ = write!(stdout, "{question}");
            let _ = stdout.flush();
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_yes(&line),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "could not read confirmation");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "confirmation prompt task failed");
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
