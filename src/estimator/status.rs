use crate::hal::CalibrationReport;
use serde::{Deserialize, Serialize};

/// Tracker connection state as seen by the frame loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackerStatus {
    #[default]
    NotConnected,
    Connecting,
    Connected,
    Streaming,
    Error,
}

impl TrackerStatus {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: TrackerStatus) -> bool {
        use TrackerStatus::*;

        matches!(
            (self, target),
            // From NotConnected
            (NotConnected, Connecting) |

            // From Connecting
            (Connecting, Connected) |
            (Connecting, NotConnected) |

            // From Connected
            (Connected, Streaming) |
            (Connected, Error) |
            (Connected, NotConnected) |

            // From Streaming
            (Streaming, Error) |
            (Streaming, NotConnected) |

            // From Error
            (Error, NotConnected)
        )
    }

    pub fn name(&self) -> &str {
        match self {
            Self::NotConnected => "NotConnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::Streaming => "Streaming",
            Self::Error => "Error",
        }
    }

    /// A source is attached and may deliver samples
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected | Self::Streaming)
    }
}

/// Notifications published by the estimator. A receiver obtained from
/// `subscribe` stays registered until it is dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    StatusChanged {
        from: TrackerStatus,
        to: TrackerStatus,
    },
    Calibration(CalibrationReport),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        use TrackerStatus::*;
        assert!(NotConnected.can_transition_to(Connecting));
        assert!(Connecting.can_transition_to(Connected));
        assert!(Connected.can_transition_to(Streaming));
        assert!(Streaming.can_transition_to(NotConnected));
    }

    #[test]
    fn test_error_only_leads_to_not_connected() {
        use TrackerStatus::*;
        assert!(Error.can_transition_to(NotConnected));
        assert!(!Error.can_transition_to(Connecting));
        assert!(!Error.can_transition_to(Streaming));
    }

    #[test]
    fn test_no_skipping_connect() {
        use TrackerStatus::*;
        assert!(!NotConnected.can_transition_to(Connected));
        assert!(!NotConnected.can_transition_to(Streaming));
        assert!(!Connecting.can_transition_to(Streaming));
    }
}
