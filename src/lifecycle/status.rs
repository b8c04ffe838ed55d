use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Event status. `Published` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Active,
    Completed,
    Published,
}

/// Something that may move an event to another status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Every subject slot reached its quota.
    QuotaMet,
    /// The host asked to publish.
    Publish,
}

impl EventStatus {
    /// The status reached by applying `transition`, or `None` when the
    /// transition is not legal from this status.
    pub fn next(self, transition: Transition) -> Option<EventStatus> {
        match (self, transition) {
            (EventStatus::Active, Transition::QuotaMet) => Some(EventStatus::Completed),
            (EventStatus::Completed, Transition::Publish) => Some(EventStatus::Published),
            _ => None,
        }
    }

    pub fn accepts_contributions(self) -> bool {
        self == EventStatus::Active
    }

    pub fn is_terminal(self) -> bool {
        self == EventStatus::Published
    }

    pub fn visible_to_students(self) -> bool {
        self == EventStatus::Published
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Active => "active",
            EventStatus::Completed => "completed",
            EventStatus::Published => "published",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(EventStatus::Active),
            "completed" => Ok(EventStatus::Completed),
            "published" => Ok(EventStatus::Published),
            other => Err(format!("unknown event status '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_met_only_moves_active_events() {
        assert_eq!(
            EventStatus::Active.next(Transition::QuotaMet),
            Some(EventStatus::Completed)
        );
        assert_eq!(EventStatus::Completed.next(Transition::QuotaMet), None);
        assert_eq!(EventStatus::Published.next(Transition::QuotaMet), None);
    }

    #[test]
    fn publish_requires_completed() {
        assert_eq!(EventStatus::Active.next(Transition::Publish), None);
        assert_eq!(
            EventStatus::Completed.next(Transition::Publish),
            Some(EventStatus::Published)
        );
        assert_eq!(EventStatus::Published.next(Transition::Publish), None);
    }

    #[test]
    fn only_active_accepts_contributions() {
        assert!(EventStatus::Active.accepts_contributions());
        assert!(!EventStatus::Completed.accepts_contributions());
        assert!(!EventStatus::Published.accepts_contributions());
    }

    #[test]
    fn status_string_round_trip() {
        for status in [
            EventStatus::Active,
            EventStatus::Completed,
            EventStatus::Published,
        ] {
            assert_eq!(status.as_str().parse::<EventStatus>(), Ok(status));
        }
        assert!("archived".parse::<EventStatus>().is_err());
    }
}
