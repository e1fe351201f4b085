//! Conversation primitives shared by the agent and the session store.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    /// Unix timestamp in seconds.
    pub at: u64,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self::new(Role::Agent, content)
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            at: unix_now(),
        }
    }
}

/// A multi-turn conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub id: Uuid,
    pub created_at: u64,
    #[serde(default)]
    pub turns: Vec<Turn>,
}

impl Session {
    /// Start an empty session with a fresh id.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: unix_now(),
            turns: Vec::new(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
