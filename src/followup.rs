//! Delayed follow-up delivery.
//!
//! [`FollowupScheduler::schedule`] submits a due-timed job to a queue and
//! returns immediately; a dispatcher task consumes the queue and delivers
//! each job once its due time passes, without serializing unrelated jobs
//! behind one another. Fire-and-forget by design: no cancellation handle,
//! no retry, and pending jobs are lost on process restart.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::presenter::{Choice, Presenter};

/// A message waiting to be delivered.
#[derive(Debug)]
pub struct FollowupJob {
    /// Recipient participant.
    pub user_id: i64,
    /// Message text, already localized.
    pub text: String,
    /// Actionable buttons attached to the message.
    pub choices: Vec<Choice>,
    /// Earliest delivery time.
    pub due: Instant,
}

/// Submits follow-up jobs to the dispatcher task.
#[derive(Debug, Clone)]
pub struct FollowupScheduler {
    tx: mpsc::UnboundedSender<FollowupJob>,
}

impl FollowupScheduler {
    /// Start the dispatcher task and return a scheduler handle.
    pub fn spawn(presenter: Arc<dyn Presenter>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_dispatcher(rx, presenter));
        Self { tx }
    }

    /// Queue a message for delivery no earlier than `delay` from now.
    ///
    /// Returns immediately. Delivery failure is swallowed (logged only).
    pub fn schedule(
        &self,
        user_id: i64,
        text: impl Into<String>,
        delay: Duration,
        choices: Vec<Choice>,
    ) {
        let due = Instant::now()
            .checked_add(delay)
            .unwrap_or_else(Instant::now);
        let job = FollowupJob {
            user_id,
            text: text.into(),
            choices,
            due,
        };
        if self.tx.send(job).is_err() {
            warn!(user_id, "follow-up dispatcher stopped, job dropped");
        }
    }
}

/// Consume queued jobs, spawning one timer task per job so a long delay
/// never blocks later deliveries.
async fn run_dispatcher(
    mut rx: mpsc::UnboundedReceiver<FollowupJob>,
    presenter: Arc<dyn Presenter>,
) {
    while let Some(job) = rx.recv().await {
        let presenter = Arc::clone(&presenter);
        tokio::spawn(async move {
            tokio::time::sleep_until(job.due).await;
            match presenter
                .present(job.user_id, &job.text, &job.choices)
                .await
            {
                Ok(()) => debug!(user_id = job.user_id, "follow-up delivered"),
                Err(e) => {
                    warn!(user_id = job.user_id, error = %e, "follow-up delivery failed")
                }
            }
        });
    }
    debug!("follow-up dispatcher stopped");
}
