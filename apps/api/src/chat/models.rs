use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roadmap::models::RoadmapData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    Roadmap,
}

/// A completed chat message. A `Roadmap` message always embeds its roadmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roadmap: Option<RoadmapData>,
}

/// An assistant message still receiving fragments. Content can only grow;
/// finishing consumes it and yields an immutable `ChatMessage`.
#[derive(Debug)]
pub struct PendingMessage {
    id: Uuid,
    content: String,
    timestamp: DateTime<Utc>,
}

impl PendingMessage {
    pub fn assistant() -> Self {
        Self {
            id: Uuid::new_v4(),
            content: String::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn append(&mut self, fragment: &str) {
        self.content.push_str(fragment);
    }

    pub fn finish(self) -> ChatMessage {
        ChatMessage {
            id: self.id,
            role: Role::Assistant,
            content: self.content,
            timestamp: self.timestamp,
            kind: MessageKind::Text,
            roadmap: None,
        }
    }

    pub fn finish_with_roadmap(self, roadmap: RoadmapData) -> ChatMessage {
        ChatMessage {
            kind: MessageKind::Roadmap,
            roadmap: Some(roadmap),
            ..self.finish()
        }
    }
}
