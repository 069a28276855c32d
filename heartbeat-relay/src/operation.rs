use hyper::Method;
use std::fmt;

const HEARTBEAT_PATH: &str = "/api/v1/users/current/heartbeats";
const HEARTBEATS_BULK_PATH: &str = "/api/v1/users/current/heartbeats.bulk";
const STATUS_TODAY_PATH: &str = "/api/v1/users/current/status_bar/today";

/// The time-tracking API calls the relay knows how to forward.
///
/// Inbound and outbound paths are identical: the outbound URL is the
/// backend's base URL followed by [`Operation::path`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Heartbeat,
    HeartbeatsBulk,
    StatusToday,
}

impl Operation {
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            HEARTBEAT_PATH => Some(Operation::Heartbeat),
            HEARTBEATS_BULK_PATH => Some(Operation::HeartbeatsBulk),
            STATUS_TODAY_PATH => Some(Operation::StatusToday),
            _ => None,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Operation::Heartbeat => HEARTBEAT_PATH,
            Operation::HeartbeatsBulk => HEARTBEATS_BULK_PATH,
            Operation::StatusToday => STATUS_TODAY_PATH,
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Operation::Heartbeat | Operation::HeartbeatsBulk => Method::POST,
            Operation::StatusToday => Method::GET,
        }
    }

    /// Writes are mirrored to every backend, reads only go to the primary.
    pub fn is_write(&self) -> bool {
        self.method() == Method::POST
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Heartbeat => "heartbeat",
            Operation::HeartbeatsBulk => "heartbeats_bulk",
            Operation::StatusToday => "status_today",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(
            Operation::from_path("/api/v1/users/current/heartbeats"),
            Some(Operation::Heartbeat)
        );
        assert_eq!(
            Operation::from_path("/api/v1/users/current/heartbeats.bulk"),
            Some(Operation::HeartbeatsBulk)
        );
        assert_eq!(
            Operation::from_path("/api/v1/users/current/status_bar/today"),
            Some(Operation::StatusToday)
        );
        assert_eq!(Operation::from_path("/api/v1/users/current/heartbeats/"), None);
        assert_eq!(Operation::from_path("/users/current/heartbeats"), None);
    }

    #[test]
    fn test_methods() {
        assert!(Operation::Heartbeat.is_write());
        assert!(Operation::HeartbeatsBulk.is_write());
        assert!(!Operation::StatusToday.is_write());
        assert_eq!(Operation::StatusToday.method(), Method::GET);
    }
}
