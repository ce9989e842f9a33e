//! Terminal presenter used by the `imagevolve` binary
//!
//! Posts are printed to stdout and the image is written into an output
//! directory so it can be opened while reacting on stdin.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use async_trait::async_trait;
use tracing::debug;

use generator::ImageFormat;
use shared::{ArtifactPost, MessageId};
use crate::error::{EvolutionError, EvolutionResult};
use crate::traits::SessionPresenter;

pub struct ConsolePresenter {
    output_dir: PathBuf,
    next_message: AtomicU64,
}

impl ConsolePresenter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            next_message: AtomicU64::new(1),
        }
    }

    /// Where a posted message's image is written
    pub fn message_path(&self, message_id: &str, format: ImageFormat) -> PathBuf {
        self.output_dir.join(format!("{}.{}", message_id, format.extension()))
    }
}

#[async_trait]
impl SessionPresenter for ConsolePresenter {
    async fn post_artifact(&self, post: ArtifactPost) -> EvolutionResult<MessageId> {
        let message_id = format!("msg-{}", self.next_message.fetch_add(1, Ordering::Relaxed));
        let path = self.message_path(&message_id, ImageFormat::sniff(&post.image));

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| EvolutionError::presentation(format!("create {}: {}", self.output_dir.display(), e)))?;
        tokio::fs::write(&path, &post.image)
            .await
            .map_err(|e| EvolutionError::presentation(format!("write {}: {}", path.display(), e)))?;

        println!("\n[{}] {}", message_id, post.caption);
        println!("    🖼️  {}", path.display());
        if !post.affordances.is_empty() {
            println!(
                "    React with `feedback <tag> [n]`, or `meta <tag>` for: {}",
                post.affordances.join(" ")
            );
        }
        Ok(message_id)
    }

    async fn retract_artifact(&self, message_id: &str) -> EvolutionResult<()> {
        debug!("🗑️ Retracting {}", message_id);
        for format in ImageFormat::ALL {
            let path = self.message_path(message_id, format);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|e| EvolutionError::presentation(format!("remove {}: {}", path.display(), e)))?;
            }
        }
        Ok(())
    }

    async fn update_status(&self, text: &str) -> EvolutionResult<()> {
        println!("    {}", text);
        Ok(())
    }

    async fn archive_session(&self) -> EvolutionResult<()> {
        println!("    🔒 Session archived");
        Ok(())
    }

    async fn notify_retry(&self, attempt: u32, max_attempts: u32, delay: Duration) -> EvolutionResult<()> {
        println!(
            "    ⏳ Generator busy, retry {}/{} in {}s",
            attempt,
            max_attempts,
            delay.as_secs()
        );
        Ok(())
    }

    async fn report_error(&self, message: &str) -> EvolutionResult<()> {
        println!("    {}", message);
        Ok(())
    }
}
