use chrono::Utc;
use service_core::error::FieldViolation;
use std::sync::Arc;

use super::metrics::record_package_approval;
use super::store::{
    BookingFilter, Page, PackageCounter, PackageFilter, PackageSort, SortField, SortOrder,
    TourStore,
};
use super::{policy, ServiceError};
use crate::dtos::packages::ApprovalDecision;
use crate::models::{
    Identity, ItineraryDay, PackageDraft, PackagePatch, PackageStatus, TourPackage,
};

/// Public listing criteria. Status and availability are fixed by the repository.
#[derive(Debug, Clone, Default)]
pub struct PackageQuery {
    pub destination: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
    pub featured: Option<bool>,
    pub sort: PackageSort,
    pub page: u64,
    pub limit: i64,
}

/// CRUD and approval workflow for tour packages.
#[derive(Clone)]
pub struct PackageRepository {
    store: Arc<dyn TourStore>,
}

impl PackageRepository {
    pub fn new(store: Arc<dyn TourStore>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        actor: &Identity,
        mut draft: PackageDraft,
    ) -> Result<TourPackage, ServiceError> {
        policy::permit(actor.role, policy::VENDOR_OR_ADMIN)?;

        draft.title = draft.title.trim().to_string();
        draft.description = draft.description.trim().to_string();
        draft.destination = draft.destination.trim().to_string();
        draft.duration = draft.duration.trim().to_string();

        let mut violations = Vec::new();
        check_text(&mut violations, "title", &draft.title);
        check_text(&mut violations, "description", &draft.description);
        check_text(&mut violations, "destination", &draft.destination);
        check_text(&mut violations, "duration", &draft.duration);
        check_price(&mut violations, draft.price);
        check_itinerary(&mut violations, &draft.itinerary);
        if !violations.is_empty() {
            return Err(ServiceError::Invalid(violations));
        }

        if draft.featured && !actor.is_admin() {
            return Err(ServiceError::Forbidden(
                "Only admins can feature packages".to_string(),
            ));
        }

        let status = if actor.is_admin() {
            PackageStatus::Approved
        } else {
            PackageStatus::Pending
        };
        let package = TourPackage::new(actor.id.clone(), draft, status);
        self.store.insert_package(&package).await?;

        tracing::info!(
            package_id = %package.id,
            vendor_id = %package.vendor_id,
            status = %package.status,
            "Package created"
        );
        Ok(package)
    }

    /// Public listing: approved and available packages only.
    pub async fn list(&self, query: PackageQuery) -> Result<(Vec<TourPackage>, u64), ServiceError> {
        let filter = PackageFilter {
            status: Some(PackageStatus::Approved),
            available: Some(true),
            featured: query.featured,
            destination: non_blank(query.destination),
            search: non_blank(query.search),
            min_price: query.min_price,
            max_price: query.max_price,
            ..Default::default()
        };

        let packages = self
            .store
            .find_packages(&filter, query.sort, Page::new(query.page, query.limit))
            .await?;
        let total = self.store.count_packages(&filter).await?;
        Ok((packages, total))
    }

    /// Returns the package and counts a view. A failed view update is logged, not returned.
    pub async fn get_by_id(&self, id: &str) -> Result<TourPackage, ServiceError> {
        let mut package = self.find(id).await?;

        match self
            .store
            .increment_package_counter(id, PackageCounter::Views, 1)
            .await
        {
            Ok(()) => package.views += 1,
            Err(e) => tracing::warn!(package_id = %id, error = %e, "Failed to record package view"),
        }

        Ok(package)
    }

    pub async fn update(
        &self,
        id: &str,
        actor: &Identity,
        patch: PackagePatch,
    ) -> Result<TourPackage, ServiceError> {
        policy::permit(actor.role, policy::VENDOR_OR_ADMIN)?;

        let mut package = self.find(id).await?;
        ensure_owner(actor, &package)?;

        let patch = trim_patch(patch);
        let mut violations = Vec::new();
        if let Some(title) = &patch.title {
            check_text(&mut violations, "title", title);
        }
        if let Some(description) = &patch.description {
            check_text(&mut violations, "description", description);
        }
        if let Some(destination) = &patch.destination {
            check_text(&mut violations, "destination", destination);
        }
        if let Some(duration) = &patch.duration {
            check_text(&mut violations, "duration", duration);
        }
        if let Some(price) = patch.price {
            check_price(&mut violations, price);
        }
        if let Some(itinerary) = &patch.itinerary {
            check_itinerary(&mut violations, itinerary);
        }
        if !violations.is_empty() {
            return Err(ServiceError::Invalid(violations));
        }

        if patch.featured.is_some_and(|f| f != package.featured) && !actor.is_admin() {
            return Err(ServiceError::Forbidden(
                "Only admins can feature packages".to_string(),
            ));
        }

        let expected = package.status;
        let availability_changed = patch.available.is_some_and(|a| a != package.available);

        let content_changed = package.apply(patch);
        if content_changed && !actor.is_admin() {
            package.status = PackageStatus::Pending;
        }

        if availability_changed && package.status != PackageStatus::Approved {
            return Err(ServiceError::InvalidState(
                "Availability can only be changed on approved packages".to_string(),
            ));
        }

        if !self.store.update_package_if(&package, expected).await? {
            return Err(ServiceError::Conflict(
                "Package was modified concurrently, retry the update".to_string(),
            ));
        }

        tracing::info!(
            package_id = %package.id,
            actor_id = %actor.id,
            status = %package.status,
            "Package updated"
        );
        Ok(self.store.find_package(id).await?.unwrap_or(package))
    }

    /// Admin review. Re-applying the current decision returns the package unchanged.
    pub async fn set_approval(
        &self,
        id: &str,
        actor: &Identity,
        decision: ApprovalDecision,
    ) -> Result<TourPackage, ServiceError> {
        policy::permit(actor.role, policy::ADMIN_ONLY)?;

        let mut package = self.find(id).await?;
        let target = match decision {
            ApprovalDecision::Approve => PackageStatus::Approved,
            ApprovalDecision::Reject => PackageStatus::Rejected,
        };

        if package.status == target {
            return Ok(package);
        }

        let expected = package.status;
        package.status = target;
        if target == PackageStatus::Rejected {
            package.available = false;
        }
        package.updated_at = Utc::now();

        if !self.store.update_package_if(&package, expected).await? {
            let current = self.find(id).await?;
            if current.status == target {
                return Ok(current);
            }
            return Err(ServiceError::Conflict(
                "Package status changed during review".to_string(),
            ));
        }

        record_package_approval(decision);
        tracing::info!(
            package_id = %package.id,
            admin_id = %actor.id,
            decision = decision.as_str(),
            "Package reviewed"
        );
        Ok(package)
    }

    /// Admins may delete booked packages; their bookings are kept.
    pub async fn delete(&self, id: &str, actor: &Identity) -> Result<(), ServiceError> {
        policy::permit(actor.role, policy::VENDOR_OR_ADMIN)?;

        let package = self.find(id).await?;
        ensure_owner(actor, &package)?;

        let has_bookings = package.bookings_count > 0 || self.has_bookings(id).await?;
        if has_bookings && !actor.is_admin() {
            return Err(ServiceError::Conflict(
                "Package has bookings and cannot be deleted".to_string(),
            ));
        }

        if !self.store.delete_package(id).await? {
            return Err(not_found());
        }

        if has_bookings {
            tracing::warn!(
                package_id = %id,
                admin_id = %actor.id,
                "Package deleted by admin; existing bookings retained"
            );
        } else {
            tracing::info!(package_id = %id, actor_id = %actor.id, "Package deleted");
        }
        Ok(())
    }

    /// Every package of one vendor, whatever its status. Vendors see only their own.
    pub async fn list_by_vendor(
        &self,
        actor: &Identity,
        vendor_id: &str,
        page: u64,
        limit: i64,
    ) -> Result<(Vec<TourPackage>, u64), ServiceError> {
        policy::permit(actor.role, policy::VENDOR_OR_ADMIN)?;
        if !actor.is_admin() && actor.id != vendor_id {
            return Err(ServiceError::Forbidden(
                "Vendors can only list their own packages".to_string(),
            ));
        }

        let filter = PackageFilter {
            vendor_id: Some(vendor_id.to_string()),
            ..Default::default()
        };
        let packages = self
            .store
            .find_packages(&filter, PackageSort::default(), Page::new(page, limit))
            .await?;
        let total = self.store.count_packages(&filter).await?;
        Ok((packages, total))
    }

    /// Review queue, oldest first.
    pub async fn list_by_status(
        &self,
        actor: &Identity,
        status: PackageStatus,
        page: u64,
        limit: i64,
    ) -> Result<(Vec<TourPackage>, u64), ServiceError> {
        policy::permit(actor.role, policy::ADMIN_ONLY)?;

        let filter = PackageFilter {
            status: Some(status),
            ..Default::default()
        };
        let sort = PackageSort {
            field: SortField::CreatedAt,
            order: SortOrder::Asc,
        };
        let packages = self
            .store
            .find_packages(&filter, sort, Page::new(page, limit))
            .await?;
        let total = self.store.count_packages(&filter).await?;
        Ok((packages, total))
    }

    pub async fn list_featured(&self, limit: i64) -> Result<Vec<TourPackage>, ServiceError> {
        let filter = PackageFilter {
            status: Some(PackageStatus::Approved),
            available: Some(true),
            featured: Some(true),
            ..Default::default()
        };
        Ok(self
            .store
            .find_packages(&filter, PackageSort::default(), Page::first(limit))
            .await?)
    }

    async fn find(&self, id: &str) -> Result<TourPackage, ServiceError> {
        self.store.find_package(id).await?.ok_or_else(not_found)
    }

    async fn has_bookings(&self, package_id: &str) -> Result<bool, ServiceError> {
        let filter = BookingFilter {
            package_id: Some(package_id.to_string()),
            ..Default::default()
        };
        Ok(!self
            .store
            .find_bookings(&filter, Page::first(1))
            .await?
            .is_empty())
    }
}

fn not_found() -> ServiceError {
    ServiceError::NotFound("Package not found".to_string())
}

fn ensure_owner(actor: &Identity, package: &TourPackage) -> Result<(), ServiceError> {
    if actor.is_admin() || package.vendor_id == actor.id {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "Only the owning vendor or an admin can modify this package".to_string(),
        ))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn trim_patch(mut patch: PackagePatch) -> PackagePatch {
    for field in [
        &mut patch.title,
        &mut patch.description,
        &mut patch.destination,
        &mut patch.duration,
    ] {
        if let Some(value) = field.as_mut() {
            *value = value.trim().to_string();
        }
    }
    patch
}

fn check_text(violations: &mut Vec<FieldViolation>, field: &str, value: &str) {
    if value.is_empty() {
        violations.push(FieldViolation::new(field, format!("{} is required", capitalize(field))));
    }
}

fn check_price(violations: &mut Vec<FieldViolation>, price: f64) {
    if !price.is_finite() || price < 0.0 {
        violations.push(FieldViolation::new("price", "Price must be non-negative"));
    }
}

fn check_itinerary(violations: &mut Vec<FieldViolation>, itinerary: &[ItineraryDay]) {
    if itinerary.iter().any(|d| d.day < 1) {
        violations.push(FieldViolation::new(
            "itinerary",
            "Itinerary days start at 1",
        ));
    }
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
