//! Generation task wire shapes for the labs tasks API.

use serde::{Deserialize, Serialize};

/// Task type for text-to-image generation.
pub const TEXT_TO_IMAGE: &str = "text2im";

/// Body of `POST /api/labs/tasks`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskRequest {
    pub task_type: String,
    pub prompt: TaskPrompt,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskPrompt {
    pub caption: String,
    pub batch_size: u32,
}

impl TaskRequest {
    /// A `text2im` request for `batch_size` images. The range is enforced server-side.
    pub fn text_to_image(caption: impl Into<String>, batch_size: u32) -> Self {
        Self {
            task_type: TEXT_TO_IMAGE.to_string(),
            prompt: TaskPrompt {
                caption: caption.into(),
                batch_size,
            },
        }
    }
}

/// Remote task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Succeeded,
    Rejected,
    /// Any status the client does not know; treated as still running.
    #[serde(other)]
    Other,
}

impl TaskStatus {
    /// `true` once no further transitions can occur.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Rejected)
    }
}

/// Local copy of a generation task, refreshed on every poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationTask {
    pub id: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub object: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub generations: Option<Generations>,
    #[serde(default)]
    pub status_information: Option<StatusInformation>,
}

impl GenerationTask {
    /// Human-readable rejection reason, falling back to `"Unknown error"`.
    #[must_use]
    pub fn rejection_message(&self) -> String {
        self.status_information
            .as_ref()
            .and_then(|info| info.message.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generations {
    pub data: Vec<GenerationResult>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusInformation {
    #[serde(default)]
    pub message: Option<String>,
}

/// One generated image.
///
/// Wire shape: `{"id": "...", "generation": {"image_path": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub id: String,
    pub generation: GenerationData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationData {
    pub image_path: String,
}

impl GenerationResult {
    #[must_use]
    pub fn image_path(&self) -> &str {
        &self.generation.image_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_request_shape() {
        let req = TaskRequest::text_to_image("a red fox", 4);
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["task_type"], "text2im");
        assert_eq!(v["prompt"]["caption"], "a red fox");
        assert_eq!(v["prompt"]["batch_size"], 4);
    }

    #[test]
    fn test_status_terminal() {
        assert!(TaskStatus::Succeeded.is_terminal());
        assert!(TaskStatus::Rejected.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Other.is_terminal());
    }

    #[test]
    fn test_unknown_status_is_other() {
        let task: GenerationTask =
            serde_json::from_value(json!({"id": "t", "status": "queued"})).unwrap();
        assert_eq!(task.status, TaskStatus::Other);
    }

    #[test]
    fn test_succeeded_task_with_generations() {
        let task: GenerationTask = serde_json::from_value(json!({
            "object": "task",
            "id": "task-1",
            "created": 1_660_000_000,
            "task_type": "text2im",
            "status": "succeeded",
            "generations": {
                "object": "list",
                "data": [{"id": "gen-1", "object": "generation", "generation": {"image_path": "https://img/1.webp"}}]
            }
        }))
        .unwrap();
        let data = task.generations.unwrap().data;
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].id, "gen-1");
        assert_eq!(data[0].image_path(), "https://img/1.webp");
    }

    #[test]
    fn test_rejection_message() {
        let task: GenerationTask = serde_json::from_value(json!({
            "id": "t",
            "status": "rejected",
            "status_information": {"type": "error", "message": "policy"}
        }))
        .unwrap();
        assert_eq!(task.rejection_message(), "policy");

        let bare: GenerationTask =
            serde_json::from_value(json!({"id": "t", "status": "rejected"})).unwrap();
        assert_eq!(bare.rejection_message(), "Unknown error");
    }

    #[test]
    fn test_null_generations() {
        let task: GenerationTask = serde_json::from_value(
            json!({"id": "t", "status": "succeeded", "generations": null}),
        )
        .unwrap();
        assert!(task.generations.is_none());
    }
}
