//! Message model
//!
//! Mock chat messages attached to a mentoring session. Messages are listed
//! in timestamp order; only session participants may post.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat message within a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier
    pub id: i64,
    /// Session the message belongs to
    pub session_id: i64,
    /// User who sent the message (a session participant)
    pub sender_id: i64,
    /// Message body
    pub text: String,
    /// When the message was sent
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message
    pub fn new(session_id: i64, sender_id: i64, text: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            session_id,
            sender_id,
            text,
            timestamp: Utc::now(),
        }
    }
}
