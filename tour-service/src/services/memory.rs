use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::store::{
    BookingFilter, Page, PackageCounter, PackageFilter, PackageSort, StoreError, TourStore,
};
use crate::models::{Booking, BookingStatus, PackageStatus, PaymentStatus, Role, TourPackage, User};

/// Process-local store used for local runs (`STORE_BACKEND=memory`) and tests.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, User>>,
    packages: Mutex<HashMap<String, TourPackage>>,
    bookings: Mutex<HashMap<String, Booking>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, StoreError> {
    mutex
        .lock()
        .map_err(|e| StoreError::Backend(anyhow::anyhow!("{} mutex poisoned: {}", name, e)))
}

fn paginate<T>(items: Vec<T>, page: Page) -> Vec<T> {
    let iter = items
        .into_iter()
        .skip(usize::try_from(page.skip).unwrap_or(usize::MAX));
    match page.limit {
        Some(limit) => iter.take(limit.max(0) as usize).collect(),
        None => iter.collect(),
    }
}

#[async_trait]
impl TourStore for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = lock(&self.users, "users")?;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateKey("email".to_string()));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(lock(&self.users, "users")?.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(lock(&self.users, "users")?
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_user(&self, user: &User) -> Result<bool, StoreError> {
        let mut users = lock(&self.users, "users")?;
        match users.get_mut(&user.id) {
            Some(stored) => {
                stored.name = user.name.clone();
                stored.role = user.role;
                stored.active = user.active;
                stored.vendor_profile = user.vendor_profile.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn record_login(&self, id: &str, at: mongodb::bson::DateTime) -> Result<(), StoreError> {
        if let Some(stored) = lock(&self.users, "users")?.get_mut(id) {
            stored.last_login = Some(at);
        }
        Ok(())
    }

    async fn find_users(&self, role: Option<Role>, page: Page) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = lock(&self.users, "users")?
            .values()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(paginate(users, page))
    }

    async fn count_users(&self, role: Option<Role>) -> Result<u64, StoreError> {
        Ok(lock(&self.users, "users")?
            .values()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .count() as u64)
    }

    async fn insert_package(&self, package: &TourPackage) -> Result<(), StoreError> {
        lock(&self.packages, "packages")?.insert(package.id.clone(), package.clone());
        Ok(())
    }

    async fn find_package(&self, id: &str) -> Result<Option<TourPackage>, StoreError> {
        Ok(lock(&self.packages, "packages")?.get(id).cloned())
    }

    async fn update_package_if(
        &self,
        package: &TourPackage,
        expected: PackageStatus,
    ) -> Result<bool, StoreError> {
        let mut packages = lock(&self.packages, "packages")?;
        let Some(stored) = packages.get_mut(&package.id) else {
            return Ok(false);
        };
        if stored.status != expected {
            return Ok(false);
        }

        let (views, bookings_count) = (stored.views, stored.bookings_count);
        *stored = package.clone();
        stored.views = views;
        stored.bookings_count = bookings_count;
        Ok(true)
    }

    async fn delete_package(&self, id: &str) -> Result<bool, StoreError> {
        Ok(lock(&self.packages, "packages")?.remove(id).is_some())
    }

    async fn increment_package_counter(
        &self,
        id: &str,
        counter: PackageCounter,
        by: i64,
    ) -> Result<(), StoreError> {
        if let Some(package) = lock(&self.packages, "packages")?.get_mut(id) {
            match counter {
                PackageCounter::Views => package.views += by,
                PackageCounter::Bookings => package.bookings_count += by,
            }
        }
        Ok(())
    }

    async fn find_packages(
        &self,
        filter: &PackageFilter,
        sort: PackageSort,
        page: Page,
    ) -> Result<Vec<TourPackage>, StoreError> {
        let mut packages: Vec<TourPackage> = lock(&self.packages, "packages")?
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        packages.sort_by(|a, b| sort.compare(a, b));
        Ok(paginate(packages, page))
    }

    async fn count_packages(&self, filter: &PackageFilter) -> Result<u64, StoreError> {
        Ok(lock(&self.packages, "packages")?
            .values()
            .filter(|p| filter.matches(p))
            .count() as u64)
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError> {
        lock(&self.bookings, "bookings")?.insert(booking.id.clone(), booking.clone());
        Ok(())
    }

    async fn find_booking(&self, id: &str) -> Result<Option<Booking>, StoreError> {
        Ok(lock(&self.bookings, "bookings")?.get(id).cloned())
    }

    async fn update_booking_if(
        &self,
        booking: &Booking,
        expected_status: BookingStatus,
        expected_payment: PaymentStatus,
    ) -> Result<bool, StoreError> {
        let mut bookings = lock(&self.bookings, "bookings")?;
        match bookings.get_mut(&booking.id) {
            Some(stored)
                if stored.status == expected_status
                    && stored.payment_status == expected_payment =>
            {
                *stored = booking.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_bookings(
        &self,
        filter: &BookingFilter,
        page: Page,
    ) -> Result<Vec<Booking>, StoreError> {
        let mut bookings: Vec<Booking> = lock(&self.bookings, "bookings")?
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(paginate(bookings, page))
    }
}
