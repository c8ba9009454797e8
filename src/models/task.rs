use serde::{Deserialize, Serialize};

/// Lifecycle of a generation task as reported by the downstream API.
///
/// Serialized as the integer code the API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TaskStatus {
    Created,
    Generating,
    Completed,
    Failed,
    UnderReview,
    Reviewed,
    ReviewFailed,
}

impl TaskStatus {
    pub fn code(&self) -> u8 {
        match self {
            TaskStatus::Created => 0,
            TaskStatus::Generating => 1,
            TaskStatus::Completed => 2,
            TaskStatus::Failed => 3,
            TaskStatus::UnderReview => 4,
            TaskStatus::Reviewed => 5,
            TaskStatus::ReviewFailed => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Created => "created",
            TaskStatus::Generating => "generating",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::UnderReview => "under_review",
            TaskStatus::Reviewed => "reviewed",
            TaskStatus::ReviewFailed => "review_failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TaskStatus::Failed | TaskStatus::ReviewFailed)
    }
}

impl TryFrom<u8> for TaskStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(TaskStatus::Created),
            1 => Ok(TaskStatus::Generating),
            2 => Ok(TaskStatus::Completed),
            3 => Ok(TaskStatus::Failed),
            4 => Ok(TaskStatus::UnderReview),
            5 => Ok(TaskStatus::Reviewed),
            6 => Ok(TaskStatus::ReviewFailed),
            other => Err(format!("unknown task status code: {}", other)),
        }
    }
}

impl From<TaskStatus> for u8 {
    fn from(status: TaskStatus) -> Self {
        status.code()
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub image_url: String,
    #[serde(default)]
    pub seed: i64,
    #[serde(default)]
    pub audit_status: i32,
}

/// One observation of a task, as returned by a status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub generate_uuid: String,
    pub generate_status: TaskStatus,
    #[serde(default)]
    pub percent_completed: f64,
    #[serde(default)]
    pub generate_msg: String,
    #[serde(default)]
    pub points_cost: i64,
    #[serde(default)]
    pub account_balance: i64,
    #[serde(default)]
    pub images: Vec<GeneratedImage>,
}

/// Where a task stands once a snapshot has been interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Pending,
    Completed,
    Failed,
}

impl StatusSnapshot {
    /// The one terminal-state rule: failure status wins, then any image means done.
    pub fn outcome(&self) -> TaskOutcome {
        if self.generate_status.is_failure() {
            TaskOutcome::Failed
        } else if !self.images.is_empty() {
            TaskOutcome::Completed
        } else {
            TaskOutcome::Pending
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome() != TaskOutcome::Pending
    }
}
