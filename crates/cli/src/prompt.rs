use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Shared line reader over stdin, so the terminal popup and the command prompts never race for
/// buffered input.
#[derive(Clone)]
pub struct Prompt {
    lines: Arc<Mutex<Lines<BufReader<Stdin>>>>,
}

impl Prompt {
    pub fn stdin() -> Self {
        Self {
            lines: Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines())),
        }
    }

    /// Prints `label` and reads one trimmed line. `None` at end of input.
    pub async fn read_line(&self, label: &str) -> io::Result<Option<String>> {
        let mut lines = self.lines.lock().await;
        let mut stdout = tokio::io::stdout();
        stdout.write_all(label.as_bytes()).await?;
        stdout.flush().await?;
        Ok(lines.next_line().await?.map(|line| line.trim().to_string()))
    }

    /// Asks until a non-empty answer or end of input.
    pub async fn required(&self, label: &str) -> io::Result<Option<String>> {
        loop {
            match self.read_line(label).await? {
                Some(answer) if answer.is_empty() => continue,
                other => return Ok(other),
            }
        }
    }

    pub async fn confirm(&self, label: &str) -> io::Result<bool> {
        let answer = self.read_line(&format!("{} [y/N] ", label)).await?;
        Ok(matches!(
            answer.as_deref().map(str::to_lowercase).as_deref(),
            Some("y") | Some("yes")
        ))
    }
}
