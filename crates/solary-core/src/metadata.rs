//! Session and backup bookkeeping
//!
//! Nothing here is secret. These records only describe when a vault was
//! opened or exported; losing them never blocks a wallet operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One unlock-to-lock period of a wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Session ID for logging
    pub session_id: Uuid,
    /// Primary address of the wallet the session belongs to
    pub wallet_address: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Start a new session for `wallet_address`
    pub fn start(wallet_address: &str) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            wallet_address: wallet_address.to_string(),
            created_at: now,
            last_accessed_at: now,
        }
    }

    /// Mark the session as used now
    pub fn touch(&mut self) {
        self.last_accessed_at = Utc::now();
    }

    /// Time since the session was last used
    pub fn idle_for(&self) -> chrono::Duration {
        Utc::now() - self.last_accessed_at
    }

    /// Whether the session has been idle longer than `timeout_minutes`
    ///
    /// A timeout of 0 means never.
    pub fn is_idle(&self, timeout_minutes: u32) -> bool {
        timeout_minutes != 0 && self.idle_for() > chrono::Duration::minutes(timeout_minutes.into())
    }
}

/// Last export of a wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRecord {
    pub wallet_address: String,
    pub exported_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_session() {
        let session = SessionRecord::start("Addr111");

        assert_eq!(session.wallet_address, "Addr111");
        assert_eq!(session.created_at, session.last_accessed_at);
        assert!(!session.is_idle(15));
    }

    #[test]
    fn test_sessions_have_unique_ids() {
        let a = SessionRecord::start("Addr111");
        let b = SessionRecord::start("Addr111");
        assert_ne!(a.session_id, b.session_id);
    }

    #[test]
    fn test_idle_detection() {
        let mut session = SessionRecord::start("Addr111");
        session.last_accessed_at = Utc::now() - chrono::Duration::minutes(30);

        assert!(session.is_idle(15));
        assert!(!session.is_idle(60));
        assert!(!session.is_idle(0));

        session.touch();
        assert!(!session.is_idle(15));
    }

    #[test]
    fn test_json_shape() {
        let session = SessionRecord::start("Addr111");
        let json = serde_json::to_value(&session).unwrap();

        assert!(json.get("sessionId").is_some());
        assert_eq!(json["walletAddress"], "Addr111");
        assert!(json.get("lastAccessedAt").is_some());
    }
}
