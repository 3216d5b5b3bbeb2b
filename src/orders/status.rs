//! Order status lifecycle

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fulfilment status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Ready,
    Dispensed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Ready,
        Self::Dispensed,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Dispensed => "dispensed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Dispensed | Self::Cancelled)
    }

    /// The single forward step along pending → processing → ready → dispensed
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            Self::Pending => Some(Self::Processing),
            Self::Processing => Some(Self::Ready),
            Self::Ready => Some(Self::Dispensed),
            Self::Dispensed | Self::Cancelled => None,
        }
    }

    /// Whether the fulfilment graph allows moving to `to`
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == Self::Cancelled || self.next() == Some(to)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// How strictly status updates are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Only forward single steps, or cancellation of a non-terminal order
    #[default]
    Strict,
    /// Any status may follow any other
    Permissive,
}

impl TransitionPolicy {
    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            Self::Strict => from.can_transition_to(to),
            Self::Permissive => true,
        }
    }
}

impl FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "permissive" => Ok(Self::Permissive),
            other => Err(format!("unknown transition policy: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn test_parse_status() {
        assert_eq!("pending".parse::<OrderStatus>(), Ok(Pending));
        assert_eq!("cancelled".parse::<OrderStatus>(), Ok(Cancelled));
        assert!("completed".parse::<OrderStatus>().is_err());
        assert!("Pending".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_forward_steps() {
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Dispensed));
    }

    #[test]
    fn test_skipping_and_reversing_rejected() {
        assert!(!Pending.can_transition_to(Dispensed));
        assert!(!Pending.can_transition_to(Ready));
        assert!(!Ready.can_transition_to(Processing));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn test_cancel_from_non_terminal_only() {
        for status in [Pending, Processing, Ready] {
            assert!(status.can_transition_to(Cancelled));
        }
        assert!(!Dispensed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Cancelled));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for to in OrderStatus::ALL {
            assert!(!Dispensed.can_transition_to(to));
            assert!(!Cancelled.can_transition_to(to));
        }
    }

    #[test]
    fn test_policies() {
        assert!(!TransitionPolicy::Strict.allows(Pending, Dispensed));
        assert!(TransitionPolicy::Permissive.allows(Pending, Dispensed));
        assert!(TransitionPolicy::Permissive.allows(Cancelled, Pending));
        assert_eq!("PERMISSIVE".parse::<TransitionPolicy>(), Ok(TransitionPolicy::Permissive));
        assert!("lenient".parse::<TransitionPolicy>().is_err());
    }
}
