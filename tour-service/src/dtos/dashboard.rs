use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::bookings::BookingResponse;
use super::packages::PackageResponse;
use crate::models::{BookingStatus, PackageStatus, Role};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RoleCounts {
    pub user: u64,
    pub vendor: u64,
    pub admin: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PackageStatusCounts {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub total: u64,
}

impl PackageStatusCounts {
    pub fn record(&mut self, status: PackageStatus) {
        match status {
            PackageStatus::Pending => self.pending += 1,
            PackageStatus::Approved => self.approved += 1,
            PackageStatus::Rejected => self.rejected += 1,
        }
        self.total += 1;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookingStatusCounts {
    pub pending: u64,
    pub confirmed: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub total: u64,
}

impl BookingStatusCounts {
    pub fn record(&mut self, status: BookingStatus) {
        match status {
            BookingStatus::Pending => self.pending += 1,
            BookingStatus::Confirmed => self.confirmed += 1,
            BookingStatus::Completed => self.completed += 1,
            BookingStatus::Cancelled => self.cancelled += 1,
        }
        self.total += 1;
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub users: RoleCounts,
    pub packages: PackageStatusCounts,
    pub bookings: BookingStatusCounts,
    /// Sum of booking amounts, cancelled bookings excluded
    pub revenue: f64,
    pub recent_bookings: Vec<BookingResponse>,
    pub recent_packages: Vec<PackageResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorStats {
    pub packages: PackageStatusCounts,
    pub bookings: BookingStatusCounts,
    pub revenue: f64,
    pub total_views: i64,
    pub recent_bookings: Vec<BookingResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub bookings: BookingStatusCounts,
    pub total_spent: f64,
    pub recent_bookings: Vec<BookingResponse>,
}

/// Exactly one of the role sections is present, matching `role`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardStatsResponse {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<AdminStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<VendorStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserStats>,
}
