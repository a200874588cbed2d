//! Status values and event types as they appear in a status document.

use serde::{Deserialize, Serialize};

// ─── License Status ──────────────────────────────────────────────────

/// The `status` member of a status document.
///
/// Closed: a document carrying any other value fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    /// Issued, no device registered yet.
    Ready,
    /// At least one device registered.
    Active,
    /// Returned by the user (terminal).
    Returned,
    /// Revoked by the provider (terminal).
    Revoked,
    /// Cancelled before use (terminal).
    Cancelled,
    /// Past its end date (terminal).
    Expired,
}

impl LicenseStatus {
    /// All statuses, in declaration order.
    pub const ALL: [LicenseStatus; 6] = [
        Self::Ready,
        Self::Active,
        Self::Returned,
        Self::Revoked,
        Self::Cancelled,
        Self::Expired,
    ];

    /// Whether this state is terminal: every client operation is rejected.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Returned | Self::Revoked | Self::Cancelled | Self::Expired
        )
    }

    /// The wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Active => "active",
            Self::Returned => "returned",
            Self::Revoked => "revoked",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Event Type ──────────────────────────────────────────────────────

/// The `type` of an entry in a status document's `events` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Register,
    Renew,
    Return,
    Revoke,
    Cancel,
}

impl EventType {
    /// The wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Renew => "renew",
            Self::Return => "return",
            Self::Revoke => "revoke",
            Self::Cancel => "cancel",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        let terminal: Vec<_> = LicenseStatus::ALL
            .iter()
            .filter(|s| s.is_terminal())
            .copied()
            .collect();
        assert_eq!(
            terminal,
            vec![
                LicenseStatus::Returned,
                LicenseStatus::Revoked,
                LicenseStatus::Cancelled,
                LicenseStatus::Expired
            ]
        );
    }

    #[test]
    fn test_status_serde_matches_display() {
        for status in LicenseStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
            let back: LicenseStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!(serde_json::from_str::<LicenseStatus>("\"pending\"").is_err());
        assert!(serde_json::from_str::<LicenseStatus>("\"Active\"").is_err());
    }

    #[test]
    fn test_event_type_wire_values() {
        let ty: EventType = serde_json::from_str("\"register\"").unwrap();
        assert_eq!(ty, EventType::Register);
        assert_eq!(EventType::Cancel.to_string(), "cancel");
        assert!(serde_json::from_str::<EventType>("\"renewed\"").is_err());
    }
}
