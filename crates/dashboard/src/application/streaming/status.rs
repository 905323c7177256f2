//! Connection lifecycle status.

use std::fmt;

/// Status of one streaming connection.
///
/// There is no `Connecting` state: a hung connect leaves the previous status
/// in place until it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Initial state, and the state after any close
    Disconnected,
    /// Transport open and authenticate frame dispatched
    Connected,
    /// Transport error or failed connect; terminal until the next connect
    Error,
}

impl ConnectionStatus {
    /// Convert to u8 for atomic storage.
    pub fn to_u8(self) -> u8 {
        match self {
            ConnectionStatus::Disconnected => 0,
            ConnectionStatus::Connected => 1,
            ConnectionStatus::Error => 2,
        }
    }

    /// Convert from u8 (atomic storage).
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => ConnectionStatus::Connected,
            2 => ConnectionStatus::Error,
            _ => ConnectionStatus::Disconnected,
        }
    }

    pub fn is_connected(self) -> bool {
        self == ConnectionStatus::Connected
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Error => write!(f, "error"),
        }
    }
}

/// Badge shown next to live panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBadge {
    Online,
    Offline,
    Error,
}

impl StatusBadge {
    pub fn label(self) -> &'static str {
        match self {
            StatusBadge::Online => "Online",
            StatusBadge::Offline => "Offline",
            StatusBadge::Error => "Error",
        }
    }
}

impl From<ConnectionStatus> for StatusBadge {
    fn from(status: ConnectionStatus) -> Self {
        match status {
            ConnectionStatus::Connected => StatusBadge::Online,
            ConnectionStatus::Disconnected => StatusBadge::Offline,
            ConnectionStatus::Error => StatusBadge::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            ConnectionStatus::Disconnected,
            ConnectionStatus::Connected,
            ConnectionStatus::Error,
        ] {
            assert_eq!(ConnectionStatus::from_u8(status.to_u8()), status);
        }
        assert_eq!(ConnectionStatus::from_u8(200), ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_badge_labels() {
        assert_eq!(StatusBadge::from(ConnectionStatus::Connected).label(), "Online");
        assert_eq!(StatusBadge::from(ConnectionStatus::Disconnected).label(), "Offline");
        assert_eq!(StatusBadge::from(ConnectionStatus::Error).label(), "Error");
    }
}
