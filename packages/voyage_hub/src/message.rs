//! Message envelope broadcast to room members.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Limited role name → whether someone currently holds it.
pub type RoleStatus = BTreeMap<String, bool>;

/// Messages fanned out to every member of a voyage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VoyageMessage {
    /// Server-generated notice (joins, leaves)
    System { content: String },
    /// Chat from a connected crew member
    Human { role: String, content: String },
    /// Output of a generative responder
    Ai { role: String, content: String },
    /// Snapshot of limited-role occupancy for the room
    RoleStatus { data: RoleStatus },
}

impl VoyageMessage {
    pub fn system(content: impl Into<String>) -> Self {
        VoyageMessage::System {
            content: content.into(),
        }
    }

    pub fn human(role: impl Into<String>, content: impl Into<String>) -> Self {
        VoyageMessage::Human {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn ai(role: impl Into<String>, content: impl Into<String>) -> Self {
        VoyageMessage::Ai {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn role_status(data: RoleStatus) -> Self {
        VoyageMessage::RoleStatus { data }
    }

    /// Wire discriminator, as written in the `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            VoyageMessage::System { .. } => "system",
            VoyageMessage::Human { .. } => "human",
            VoyageMessage::Ai { .. } => "ai",
            VoyageMessage::RoleStatus { .. } => "role_status",
        }
    }

    /// Whether late joiners should see this message in the history replay.
    /// Role snapshots are point-in-time state and go stale immediately.
    pub fn is_replayable(&self) -> bool {
        !matches!(self, VoyageMessage::RoleStatus { .. })
    }
}
