use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::Task;

/// Wire representation of a task's status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskStatus {
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Done")]
    Done,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
}

/// Any subset of the mutable fields; absent fields are left untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
}

impl From<Task> for TaskResponse {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            title: t.title,
            description: t.description,
            status: t.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub data: Vec<TaskResponse>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// 1-indexed pagination query. Out-of-range values are clamped by the handler.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::ToDo).unwrap(),
            r#""To Do""#
        );
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            r#""In Progress""#
        );
        assert_eq!(
            serde_json::to_string(&TaskStatus::Done).unwrap(),
            r#""Done""#
        );
    }

    #[test]
    fn status_rejects_unknown_value() {
        assert!(serde_json::from_str::<TaskStatus>(r#""Cancelled""#).is_err());
    }

    #[test]
    fn pagination_defaults() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 10);
    }

    #[test]
    fn update_request_empty_body_is_all_none() {
        let req: UpdateTaskRequest = serde_json::from_str("{}").unwrap();
        assert!(req.title.is_none());
        assert!(req.description.is_none());
        assert!(req.status.is_none());
    }

    #[test]
    fn update_request_accepts_subset() {
        let req: UpdateTaskRequest = serde_json::from_str(r#"{"status":"Done"}"#).unwrap();
        assert!(req.title.is_none());
        assert_eq!(req.status, Some(TaskStatus::Done));
    }
}
