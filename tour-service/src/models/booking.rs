use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookingAction {
    Confirm,
    Complete,
    Cancel,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// The status reached by applying `action`, or `None` if the edge does not exist.
    pub fn apply(self, action: BookingAction) -> Option<BookingStatus> {
        use BookingAction::*;
        use BookingStatus::*;

        match (self, action) {
            (Pending, Confirm) => Some(Confirmed),
            (Confirmed, Complete) => Some(Completed),
            (Pending, Cancel) | (Confirmed, Cancel) => Some(Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;

        matches!(
            (self, next),
            (Pending, Paid) | (Pending, Failed) | (Failed, Paid) | (Paid, Refunded)
        )
    }
}

impl BookingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingAction::Confirm => "confirm",
            BookingAction::Complete => "complete",
            BookingAction::Cancel => "cancel",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for BookingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            _ => Err(format!("Invalid booking status: {}", s)),
        }
    }
}

impl FromStr for BookingAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "confirm" => Ok(BookingAction::Confirm),
            "complete" => Ok(BookingAction::Complete),
            "cancel" => Ok(BookingAction::Cancel),
            _ => Err(format!("Invalid booking action: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub package_id: String,
    /// Owner of the package when the booking was made.
    pub vendor_id: String,
    /// Package price when the booking was made.
    pub amount: f64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    pub confirmed_at: Option<mongodb::bson::DateTime>,
    pub completed_at: Option<mongodb::bson::DateTime>,
    pub cancelled_at: Option<mongodb::bson::DateTime>,
    pub cancelled_by: Option<String>,
}

impl Booking {
    pub fn new(user_id: String, package_id: String, vendor_id: String, amount: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            package_id,
            vendor_id,
            amount,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
            confirmed_at: None,
            completed_at: None,
            cancelled_at: None,
            cancelled_by: None,
        }
    }

    /// Moves to `next` and stamps the matching timestamp.
    pub fn advance(&mut self, next: BookingStatus, actor_id: &str) {
        let now = Utc::now();
        let stamp = Some(mongodb::bson::DateTime::from_chrono(now));
        match next {
            BookingStatus::Confirmed => self.confirmed_at = stamp,
            BookingStatus::Completed => self.completed_at = stamp,
            BookingStatus::Cancelled => {
                self.cancelled_at = stamp;
                self.cancelled_by = Some(actor_id.to_string());
            }
            BookingStatus::Pending => {}
        }
        self.status = next;
        self.updated_at = now;
    }

    pub fn counts_toward_revenue(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }
}
