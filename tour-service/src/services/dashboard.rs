use std::sync::Arc;

use super::store::{BookingFilter, Page, PackageFilter, PackageSort, TourStore};
use super::ServiceError;
use crate::dtos::bookings::BookingResponse;
use crate::dtos::dashboard::{
    AdminStats, BookingStatusCounts, DashboardStatsResponse, PackageStatusCounts, RoleCounts,
    UserStats, VendorStats,
};
use crate::dtos::packages::PackageResponse;
use crate::models::{Booking, Identity, PackageStatus, Role};

const RECENT_ITEMS: usize = 5;

/// Role-scoped dashboard aggregates, recomputed on every call.
#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn TourStore>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn TourStore>) -> Self {
        Self { store }
    }

    pub async fn stats(&self, actor: &Identity) -> Result<DashboardStatsResponse, ServiceError> {
        let mut response = DashboardStatsResponse {
            role: actor.role,
            admin: None,
            vendor: None,
            user: None,
        };

        match actor.role {
            Role::Admin => response.admin = Some(self.admin_stats().await?),
            Role::Vendor => response.vendor = Some(self.vendor_stats(&actor.id).await?),
            Role::User => response.user = Some(self.user_stats(&actor.id).await?),
        }

        Ok(response)
    }

    async fn admin_stats(&self) -> Result<AdminStats, ServiceError> {
        let users = RoleCounts {
            user: self.store.count_users(Some(Role::User)).await?,
            vendor: self.store.count_users(Some(Role::Vendor)).await?,
            admin: self.store.count_users(Some(Role::Admin)).await?,
            total: self.store.count_users(None).await?,
        };

        let mut packages = PackageStatusCounts::default();
        for status in [
            PackageStatus::Pending,
            PackageStatus::Approved,
            PackageStatus::Rejected,
        ] {
            let filter = PackageFilter {
                status: Some(status),
                ..Default::default()
            };
            let count = self.store.count_packages(&filter).await?;
            match status {
                PackageStatus::Pending => packages.pending = count,
                PackageStatus::Approved => packages.approved = count,
                PackageStatus::Rejected => packages.rejected = count,
            }
            packages.total += count;
        }

        let bookings = self
            .store
            .find_bookings(&BookingFilter::default(), Page::all())
            .await?;
        let (booking_counts, revenue) = summarize(&bookings);

        let recent_packages = self
            .store
            .find_packages(
                &PackageFilter::default(),
                PackageSort::default(),
                Page::first(RECENT_ITEMS as i64),
            )
            .await?;

        Ok(AdminStats {
            users,
            packages,
            bookings: booking_counts,
            revenue,
            recent_bookings: recent(bookings),
            recent_packages: recent_packages.into_iter().map(PackageResponse::from).collect(),
        })
    }

    async fn vendor_stats(&self, vendor_id: &str) -> Result<VendorStats, ServiceError> {
        let own = PackageFilter {
            vendor_id: Some(vendor_id.to_string()),
            ..Default::default()
        };
        let packages = self
            .store
            .find_packages(&own, PackageSort::default(), Page::all())
            .await?;

        let mut package_counts = PackageStatusCounts::default();
        let mut total_views = 0;
        for package in &packages {
            package_counts.record(package.status);
            total_views += package.views;
        }

        let bookings = self
            .store
            .find_bookings(
                &BookingFilter {
                    vendor_id: Some(vendor_id.to_string()),
                    ..Default::default()
                },
                Page::all(),
            )
            .await?;
        let (booking_counts, revenue) = summarize(&bookings);

        Ok(VendorStats {
            packages: package_counts,
            bookings: booking_counts,
            revenue,
            total_views,
            recent_bookings: recent(bookings),
        })
    }

    async fn user_stats(&self, user_id: &str) -> Result<UserStats, ServiceError> {
        let bookings = self
            .store
            .find_bookings(
                &BookingFilter {
                    user_id: Some(user_id.to_string()),
                    ..Default::default()
                },
                Page::all(),
            )
            .await?;
        let (booking_counts, total_spent) = summarize(&bookings);

        Ok(UserStats {
            bookings: booking_counts,
            total_spent,
            recent_bookings: recent(bookings),
        })
    }
}

/// Counts by status and the amount over non-cancelled bookings.
fn summarize(bookings: &[Booking]) -> (BookingStatusCounts, f64) {
    let mut counts = BookingStatusCounts::default();
    let mut amount = 0.0;
    for booking in bookings {
        counts.record(booking.status);
        if booking.counts_toward_revenue() {
            amount += booking.amount;
        }
    }
    (counts, amount)
}

/// Bookings arrive newest first from the store.
fn recent(bookings: Vec<Booking>) -> Vec<BookingResponse> {
    bookings
        .into_iter()
        .take(RECENT_ITEMS)
        .map(BookingResponse::from)
        .collect()
}
