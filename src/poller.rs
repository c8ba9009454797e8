use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::Stream;
use tokio::time::{sleep, timeout_at, Instant};
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    client::GenerationApi,
    error::{ProxyError, Result},
    models::{StatusSnapshot, TaskOutcome},
};

/// How long and how often to wait for a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
    pub timeout: Option<Duration>,
    pub max_consecutive_errors: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: None,
            timeout: None,
            max_consecutive_errors: 5,
        }
    }
}

impl PollPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_consecutive_errors(mut self, errors: u32) -> Self {
        self.max_consecutive_errors = errors;
        self
    }
}

/// Result of one status fetch, after the error budget has been applied.
enum Step {
    Snapshot(StatusSnapshot),
    Retry,
    Stop(ProxyError),
}

/// Bookkeeping for one polling run, shared by `wait` and `watch`.
struct PollRun {
    started: Instant,
    deadline: Option<Instant>,
    attempts: u32,
    consecutive_errors: u32,
}

impl PollRun {
    fn start(policy: &PollPolicy) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: policy.timeout.map(|t| started + t),
            attempts: 0,
            consecutive_errors: 0,
        }
    }

    fn timed_out(&self) -> ProxyError {
        ProxyError::PollTimeout {
            attempts: self.attempts,
            elapsed: self.started.elapsed(),
        }
    }

    async fn fetch(&mut self, api: &dyn GenerationApi, generate_uuid: &str, policy: &PollPolicy) -> Step {
        self.attempts += 1;

        let fetched = match self.deadline {
            Some(deadline) => match timeout_at(deadline, api.poll(generate_uuid)).await {
                Ok(result) => result,
                Err(_) => return Step::Stop(self.timed_out()),
            },
            None => api.poll(generate_uuid).await,
        };

        match fetched {
            Ok(snapshot) => {
                self.consecutive_errors = 0;
                Step::Snapshot(snapshot)
            }
            Err(e) => {
                self.consecutive_errors += 1;
                if !e.is_transient() || self.consecutive_errors >= policy.max_consecutive_errors {
                    log::error!(
                        "Giving up on task {} after {} consecutive error(s): {}",
                        generate_uuid,
                        self.consecutive_errors,
                        e
                    );
                    Step::Stop(e)
                } else {
                    log::warn!("Status check for {} failed, retrying: {}", generate_uuid, e);
                    Step::Retry
                }
            }
        }
    }

    /// Fails with `PollTimeout` when another attempt would exceed the policy.
    fn may_continue(&self, policy: &PollPolicy) -> Result<()> {
        if policy.max_attempts.is_some_and(|max| self.attempts >= max) {
            return Err(self.timed_out());
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() + policy.interval >= deadline {
                return Err(self.timed_out());
            }
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct Poller {
    api: Arc<dyn GenerationApi>,
    policy: PollPolicy,
}

impl Poller {
    pub fn new(api: Arc<dyn GenerationApi>, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// A single status fetch.
    pub async fn poll_once(&self, generate_uuid: &str) -> Result<StatusSnapshot> {
        self.api.poll(generate_uuid).await
    }

    /// Polls until the task completes, fails, or the policy runs out.
    ///
    /// Dropping the returned future stops polling.
    pub async fn wait(&self, generate_uuid: &str) -> Result<StatusSnapshot> {
        let mut run = PollRun::start(&self.policy);

        loop {
            match run.fetch(self.api.as_ref(), generate_uuid, &self.policy).await {
                Step::Snapshot(snapshot) => match snapshot.outcome() {
                    TaskOutcome::Completed => {
                        log::info!(
                            "Task {} completed with {} image(s) after {} attempt(s)",
                            generate_uuid,
                            snapshot.images.len(),
                            run.attempts
                        );
                        return Ok(snapshot);
                    }
                    TaskOutcome::Failed => {
                        let message = if snapshot.generate_msg.is_empty() {
                            format!("task {} ended as {}", generate_uuid, snapshot.generate_status)
                        } else {
                            snapshot.generate_msg
                        };
                        log::warn!("Task {} failed: {}", generate_uuid, message);
                        return Err(ProxyError::PollFailed(message));
                    }
                    TaskOutcome::Pending => log::debug!(
                        "Task {} is {} ({:.0}%)",
                        generate_uuid,
                        snapshot.generate_status,
                        snapshot.percent_completed * 100.0
                    ),
                },
                Step::Retry => {}
                Step::Stop(e) => return Err(e),
            }

            run.may_continue(&self.policy)?;
            sleep(self.policy.interval).await;
        }
    }

    /// Like [`Poller::wait`], but stops with [`ProxyError::Cancelled`] once `cancel` resolves.
    pub async fn wait_until_cancelled<F>(&self, generate_uuid: &str, cancel: F) -> Result<StatusSnapshot>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.wait(generate_uuid) => result,
            _ = cancel => {
                log::info!("Polling of {} cancelled", generate_uuid);
                Err(ProxyError::Cancelled)
            }
        }
    }

    /// Streams every snapshot until the task is terminal or the policy gives up.
    ///
    /// Retried fetch errors are not emitted. When polling stops early the last
    /// item is the error, `PollTimeout` included. The background task exits as
    /// soon as the stream is dropped.
    pub fn watch(&self, generate_uuid: &str) -> Pin<Box<dyn Stream<Item = Result<StatusSnapshot>> + Send>> {
        let (tx, rx) = tokio::sync::mpsc::channel(16);
        let api = Arc::clone(&self.api);
        let policy = self.policy.clone();
        let generate_uuid = generate_uuid.to_string();

        tokio::spawn(async move {
            let mut run = PollRun::start(&policy);
            loop {
                let (item, stop) = match run.fetch(api.as_ref(), &generate_uuid, &policy).await {
                    Step::Snapshot(snapshot) => {
                        let terminal = snapshot.is_terminal();
                        (Some(Ok(snapshot)), terminal)
                    }
                    Step::Retry => (None, false),
                    Step::Stop(e) => (Some(Err(e)), true),
                };
                if let Some(item) = item {
                    if tx.send(item).await.is_err() {
                        break;
                    }
                }
                if stop {
                    break;
                }
                if let Err(e) = run.may_continue(&policy) {
                    let _ = tx.send(Err(e)).await;
                    break;
                }
                tokio::select! {
                    _ = sleep(policy.interval) => {}
                    _ = tx.closed() => break,
                }
            }
            log::debug!("Stopped watching {} after {} attempt(s)", generate_uuid, run.attempts);
        });

        Box::pin(ReceiverStream::new(rx))
    }
}
