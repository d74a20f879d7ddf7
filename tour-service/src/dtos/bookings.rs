use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{Booking, BookingStatus, PaymentStatus};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[validate(
        required(message = "Package id is required"),
        length(min = 1, message = "Package id is required")
    )]
    pub package_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusRequest {
    #[validate(required(message = "Payment status is required"))]
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingListParams {
    /// Only honoured for admins
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: String,
    pub user_id: String,
    pub package_id: String,
    pub vendor_id: String,
    pub amount: f64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<String>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            user_id: b.user_id,
            package_id: b.package_id,
            vendor_id: b.vendor_id,
            amount: b.amount,
            status: b.status,
            payment_status: b.payment_status,
            created_at: b.created_at,
            updated_at: b.updated_at,
            confirmed_at: b.confirmed_at.map(|t| t.to_chrono()),
            completed_at: b.completed_at.map(|t| t.to_chrono()),
            cancelled_at: b.cancelled_at.map(|t| t.to_chrono()),
            cancelled_by: b.cancelled_by,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingListResponse {
    pub bookings: Vec<BookingResponse>,
}
