//! Storage abstraction shared by every repository.
//!
//! Backends only persist and query; business rules live in the repositories.

use async_trait::async_trait;
use std::cmp::Ordering;
use thiserror::Error;

use crate::models::{Booking, BookingStatus, PaymentStatus, PackageStatus, Role, TourPackage, User};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageCounter {
    Views,
    Bookings,
}

#[derive(Debug, Clone, Default)]
pub struct PackageFilter {
    pub vendor_id: Option<String>,
    pub status: Option<PackageStatus>,
    pub available: Option<bool>,
    pub featured: Option<bool>,
    /// Case-insensitive substring of the destination.
    pub destination: Option<String>,
    /// Case-insensitive substring of title, description or destination.
    pub search: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl PackageFilter {
    pub fn matches(&self, package: &TourPackage) -> bool {
        if let Some(vendor_id) = &self.vendor_id {
            if &package.vendor_id != vendor_id {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != package.status)
            || self.available.is_some_and(|a| a != package.available)
            || self.featured.is_some_and(|f| f != package.featured)
            || self.min_price.is_some_and(|min| package.price < min)
            || self.max_price.is_some_and(|max| package.price > max)
        {
            return false;
        }
        if let Some(destination) = &self.destination {
            if !contains_ignore_case(&package.destination, destination) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let hit = [&package.title, &package.description, &package.destination]
                .iter()
                .any(|field| contains_ignore_case(field, search));
            if !hit {
                return false;
            }
        }
        true
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    Price,
    Title,
    Views,
    Duration,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Price => "price",
            SortField::Title => "title",
            SortField::Views => "views",
            SortField::Duration => "duration",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackageSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl PackageSort {
    /// Orders two packages by the sort field, then by id ascending.
    pub fn compare(&self, a: &TourPackage, b: &TourPackage) -> Ordering {
        let primary = match self.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::Price => a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal),
            SortField::Title => a.title.cmp(&b.title),
            SortField::Views => a.views.cmp(&b.views),
            SortField::Duration => a.duration.cmp(&b.duration),
        };
        let primary = match self.order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Page {
    pub skip: u64,
    /// `None` returns every remaining row.
    pub limit: Option<i64>,
}

impl Page {
    pub fn new(page: u64, limit: i64) -> Self {
        Self {
            skip: page
                .saturating_sub(1)
                .saturating_mul(limit.max(0) as u64)
                .min(i64::MAX as u64),
            limit: Some(limit),
        }
    }

    pub fn first(limit: i64) -> Self {
        Self {
            skip: 0,
            limit: Some(limit),
        }
    }

    pub fn all() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub user_id: Option<String>,
    pub vendor_id: Option<String>,
    pub package_id: Option<String>,
    pub status: Option<BookingStatus>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.user_id.as_ref().map_or(true, |id| &booking.user_id == id)
            && self.vendor_id.as_ref().map_or(true, |id| &booking.vendor_id == id)
            && self.package_id.as_ref().map_or(true, |id| &booking.package_id == id)
            && self.status.map_or(true, |s| booking.status == s)
    }
}

#[async_trait]
pub trait TourStore: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Fails with `DuplicateKey("email")` when the email is already taken.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// Writes the admin-managed fields (name, role, active, vendor profile).
    async fn update_user(&self, user: &User) -> Result<bool, StoreError>;
    async fn record_login(&self, id: &str, at: mongodb::bson::DateTime) -> Result<(), StoreError>;
    /// Newest first.
    async fn find_users(&self, role: Option<Role>, page: Page) -> Result<Vec<User>, StoreError>;
    async fn count_users(&self, role: Option<Role>) -> Result<u64, StoreError>;

    async fn insert_package(&self, package: &TourPackage) -> Result<(), StoreError>;
    async fn find_package(&self, id: &str) -> Result<Option<TourPackage>, StoreError>;
    /// Writes the editable fields of `package` only if the stored status still
    /// equals `expected`. Counters are never overwritten. Returns whether it matched.
    async fn update_package_if(
        &self,
        package: &TourPackage,
        expected: PackageStatus,
    ) -> Result<bool, StoreError>;
    async fn delete_package(&self, id: &str) -> Result<bool, StoreError>;
    async fn increment_package_counter(
        &self,
        id: &str,
        counter: PackageCounter,
        by: i64,
    ) -> Result<(), StoreError>;
    async fn find_packages(
        &self,
        filter: &PackageFilter,
        sort: PackageSort,
        page: Page,
    ) -> Result<Vec<TourPackage>, StoreError>;
    async fn count_packages(&self, filter: &PackageFilter) -> Result<u64, StoreError>;

    async fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError>;
    async fn find_booking(&self, id: &str) -> Result<Option<Booking>, StoreError>;
    /// Replaces `booking` only if the stored status and payment status still
    /// equal the expected pair. Returns whether it matched.
    async fn update_booking_if(
        &self,
        booking: &Booking,
        expected_status: BookingStatus,
        expected_payment: PaymentStatus,
    ) -> Result<bool, StoreError>;
    /// Newest first.
    async fn find_bookings(
        &self,
        filter: &BookingFilter,
        page: Page,
    ) -> Result<Vec<Booking>, StoreError>;
}
