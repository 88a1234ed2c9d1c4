use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Settlement state of a booking's ledger row.
///
/// `Pending` is initial, `Refunded` is terminal. `Failed` exists in the
/// ledger but no operation here moves a payment into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// Status changes a caller can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentAction {
    /// Pending <-> Paid.
    Toggle,
    /// Pending -> Paid, every other status -> Pending.
    LegacyToggle,
    /// Paid -> Refunded.
    Refund,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Pending,
        PaymentStatus::Paid,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Refunded => "Refunded",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Refunded)
    }

    /// Target status for `action`, or `None` when the move is not allowed.
    pub fn apply(self, action: PaymentAction) -> Option<PaymentStatus> {
        use PaymentStatus::*;
        match (action, self) {
            (PaymentAction::Toggle, Pending) => Some(Paid),
            (PaymentAction::Toggle, Paid) => Some(Pending),
            (PaymentAction::Toggle, _) => None,
            (PaymentAction::LegacyToggle, Pending) => Some(Paid),
            (PaymentAction::LegacyToggle, _) => Some(Pending),
            (PaymentAction::Refund, Paid) => Some(Refunded),
            (PaymentAction::Refund, _) => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(PaymentStatus::Pending),
            "Paid" => Ok(PaymentStatus::Paid),
            "Failed" => Ok(PaymentStatus::Failed),
            "Refunded" => Ok(PaymentStatus::Refunded),
            other => Err(UnknownVariant { kind: "payment status", value: other.to_string() }),
        }
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    #[serde(alias = "cash", alias = "CASH")]
    Cash,
    #[serde(alias = "online", alias = "ONLINE")]
    Online,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Online => "Online",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "Cash" => Ok(PaymentMethod::Cash),
            "Online" => Ok(PaymentMethod::Online),
            _ => Err(UnknownVariant { kind: "payment method", value }),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    #[serde(rename = "paymentID")]
    pub id: i64,
    #[serde(rename = "bookingID")]
    pub booking_id: i64,
    pub amount: f64,
    #[sqlx(try_from = "String")]
    #[serde(rename = "paymentMethod")]
    pub method: PaymentMethod,
    #[sqlx(try_from = "String")]
    pub status: PaymentStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_status() -> impl Strategy<Value = PaymentStatus> {
        prop::sample::select(PaymentStatus::ALL.to_vec())
    }

    fn any_action() -> impl Strategy<Value = PaymentAction> {
        prop::sample::select(vec![
            PaymentAction::Toggle,
            PaymentAction::LegacyToggle,
            PaymentAction::Refund,
        ])
    }

    #[test]
    fn toggle_twice_returns_to_pending() {
        let paid = PaymentStatus::Pending.apply(PaymentAction::Toggle).unwrap();
        assert_eq!(paid, PaymentStatus::Paid);
        assert_eq!(paid.apply(PaymentAction::Toggle), Some(PaymentStatus::Pending));
    }

    #[test]
    fn refund_only_from_paid() {
        assert_eq!(PaymentStatus::Paid.apply(PaymentAction::Refund), Some(PaymentStatus::Refunded));
        assert_eq!(PaymentStatus::Pending.apply(PaymentAction::Refund), None);
        assert_eq!(PaymentStatus::Failed.apply(PaymentAction::Refund), None);
        assert_eq!(PaymentStatus::Refunded.apply(PaymentAction::Refund), None);
    }

    #[test]
    fn strict_toggle_rejects_failed_and_refunded() {
        assert_eq!(PaymentStatus::Failed.apply(PaymentAction::Toggle), None);
        assert_eq!(PaymentStatus::Refunded.apply(PaymentAction::Toggle), None);
    }

    #[test]
    fn legacy_toggle_resets_everything_but_pending() {
        assert_eq!(PaymentStatus::Pending.apply(PaymentAction::LegacyToggle), Some(PaymentStatus::Paid));
        for status in [PaymentStatus::Paid, PaymentStatus::Failed, PaymentStatus::Refunded] {
            assert_eq!(status.apply(PaymentAction::LegacyToggle), Some(PaymentStatus::Pending));
        }
    }

    #[test]
    fn status_text_matches_ledger_values() {
        for status in PaymentStatus::ALL {
            assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), status);
        }
        assert!("paid".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn method_accepts_lowercase_json() {
        let method: PaymentMethod = serde_json::from_str("\"online\"").unwrap();
        assert_eq!(method, PaymentMethod::Online);
        assert!(PaymentMethod::try_from("Card".to_string()).is_err());
    }

    proptest! {
        #[test]
        fn nothing_leaves_refunded_except_legacy_toggle(action in any_action()) {
            let next = PaymentStatus::Refunded.apply(action);
            if action == PaymentAction::LegacyToggle {
                prop_assert_eq!(next, Some(PaymentStatus::Pending));
            } else {
                prop_assert_eq!(next, None);
            }
        }

        #[test]
        fn strict_actions_never_produce_failed(
            start in any_status(),
            actions in prop::collection::vec(
                prop::sample::select(vec![PaymentAction::Toggle, PaymentAction::Refund]),
                0..16,
            ),
        ) {
            let mut status = start;
            for action in actions {
                if let Some(next) = status.apply(action) {
                    prop_assert_ne!(next, PaymentStatus::Failed);
                    prop_assert!(!status.is_terminal());
                    status = next;
                }
            }
        }
    }
}
