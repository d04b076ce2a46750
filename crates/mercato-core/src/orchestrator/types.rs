//! Orchestrator types

use mercato_store::TaskType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one chat turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReply {
    /// Session the turn belongs to
    pub session_id: Uuid,
    /// Assistant reply, as stored
    pub reply_text: String,
    /// Artifact file name, when one was rendered
    pub report_id: Option<String>,
    /// Download path for the artifact
    pub download_url: Option<String>,
    /// Agent that handled the turn; `None` for the capability listing
    pub task_type: Option<TaskType>,
    /// Stored task result
    pub result_id: Option<Uuid>,
}

impl TurnReply {
    /// Download path for an artifact file name
    #[must_use]
    pub fn download_url_for(report_id: &str) -> String {
        format!("/report/{report_id}")
    }
}
