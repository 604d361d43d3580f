//! Auth token model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque bearer token for user authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    /// Token value (opaque, random)
    pub id: String,
    /// Associated user ID
    pub user_id: i64,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl AuthToken {
    /// Check if the token has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_token_expiry() {
        let fresh = AuthToken {
            id: "token-1".to_string(),
            user_id: 1,
            expires_at: Utc::now() + Duration::days(1),
            created_at: Utc::now(),
        };
        assert!(!fresh.is_expired());

        let stale = AuthToken {
            id: "token-2".to_string(),
            user_id: 1,
            expires_at: Utc::now() - Duration::seconds(1),
            created_at: Utc::now() - Duration::days(8),
        };
        assert!(stale.is_expired());
    }
}
