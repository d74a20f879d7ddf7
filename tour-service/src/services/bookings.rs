use chrono::Utc;
use std::sync::Arc;

use super::metrics::{record_booking_created, record_booking_transition};
use super::store::{BookingFilter, Page, PackageCounter, TourStore};
use super::{policy, ServiceError};
use crate::models::{Booking, BookingAction, BookingStatus, Identity, PaymentStatus, Role};

/// Booking lifecycle: creation against bookable packages and the
/// pending -> confirmed -> completed / cancelled state machine.
#[derive(Clone)]
pub struct BookingRepository {
    store: Arc<dyn TourStore>,
}

impl BookingRepository {
    pub fn new(store: Arc<dyn TourStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, actor: &Identity, package_id: &str) -> Result<Booking, ServiceError> {
        policy::permit(actor.role, policy::ANY_ROLE)?;

        let package = self
            .store
            .find_package(package_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Package not found".to_string()))?;

        if !package.is_bookable() {
            return Err(ServiceError::InvalidState(
                "Package is not available for booking".to_string(),
            ));
        }
        if package.is_expired(Utc::now()) {
            return Err(ServiceError::InvalidState("Package has expired".to_string()));
        }

        let booking = Booking::new(
            actor.id.clone(),
            package.id.clone(),
            package.vendor_id.clone(),
            package.price,
        );
        self.store.insert_booking(&booking).await?;

        if let Err(e) = self
            .store
            .increment_package_counter(&package.id, PackageCounter::Bookings, 1)
            .await
        {
            tracing::warn!(package_id = %package.id, error = %e, "Failed to bump bookings count");
        }

        record_booking_created();
        tracing::info!(
            booking_id = %booking.id,
            package_id = %booking.package_id,
            user_id = %booking.user_id,
            "Booking created"
        );
        Ok(booking)
    }

    /// Applies `action` as a compare-and-set on the current status. The actor
    /// rule is checked before the state rule.
    pub async fn transition(
        &self,
        id: &str,
        actor: &Identity,
        action: BookingAction,
    ) -> Result<Booking, ServiceError> {
        let mut booking = self.find(id).await?;

        let allowed = match action {
            BookingAction::Confirm | BookingAction::Complete => is_vendor_or_admin(actor, &booking),
            BookingAction::Cancel => is_participant(actor, &booking),
        };
        if !allowed {
            return Err(ServiceError::Forbidden(format!(
                "Not permitted to {} this booking",
                action
            )));
        }

        let current = booking.status;
        let next = current.apply(action).ok_or_else(|| {
            ServiceError::InvalidTransition(format!("Cannot {} a {} booking", action, current))
        })?;

        let payment = booking.payment_status;
        booking.advance(next, &actor.id);

        if !self.store.update_booking_if(&booking, current, payment).await? {
            return Err(ServiceError::InvalidTransition(format!(
                "Booking changed while trying to {} it",
                action
            )));
        }

        record_booking_transition(action);
        tracing::info!(
            booking_id = %booking.id,
            actor_id = %actor.id,
            from = %current,
            to = %next,
            "Booking transitioned"
        );
        Ok(booking)
    }

    pub async fn get(&self, id: &str, actor: &Identity) -> Result<Booking, ServiceError> {
        let booking = self.find(id).await?;
        if !is_participant(actor, &booking) {
            return Err(ServiceError::Forbidden(
                "Not permitted to view this booking".to_string(),
            ));
        }
        Ok(booking)
    }

    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<Booking>, ServiceError> {
        self.list(BookingFilter {
            user_id: Some(user_id.to_string()),
            ..Default::default()
        })
        .await
    }

    pub async fn list_by_vendor(&self, vendor_id: &str) -> Result<Vec<Booking>, ServiceError> {
        self.list(BookingFilter {
            vendor_id: Some(vendor_id.to_string()),
            ..Default::default()
        })
        .await
    }

    pub async fn list_by_status(
        &self,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, ServiceError> {
        self.list(BookingFilter {
            status,
            ..Default::default()
        })
        .await
    }

    /// Bookings visible to `actor`: travellers see their own, vendors those on
    /// their packages, admins everything (optionally by status).
    pub async fn list_for(
        &self,
        actor: &Identity,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, ServiceError> {
        let mut bookings = match actor.role {
            Role::User => self.list_by_user(&actor.id).await?,
            Role::Vendor => self.list_by_vendor(&actor.id).await?,
            Role::Admin => return self.list_by_status(status).await,
        };
        if let Some(status) = status {
            bookings.retain(|b| b.status == status);
        }
        Ok(bookings)
    }

    pub async fn set_payment_status(
        &self,
        id: &str,
        actor: &Identity,
        next: PaymentStatus,
    ) -> Result<Booking, ServiceError> {
        let mut booking = self.find(id).await?;
        if !is_vendor_or_admin(actor, &booking) {
            return Err(ServiceError::Forbidden(
                "Not permitted to change payment status".to_string(),
            ));
        }

        let current = booking.payment_status;
        if current == next {
            return Ok(booking);
        }
        if !current.can_transition_to(next) {
            return Err(ServiceError::InvalidTransition(format!(
                "Cannot change payment status from {} to {}",
                current, next
            )));
        }

        let status = booking.status;
        booking.payment_status = next;
        booking.updated_at = Utc::now();

        if !self.store.update_booking_if(&booking, status, current).await? {
            return Err(ServiceError::InvalidTransition(
                "Booking changed while updating payment status".to_string(),
            ));
        }

        tracing::info!(
            booking_id = %booking.id,
            actor_id = %actor.id,
            from = %current,
            to = %next,
            "Payment status updated"
        );
        Ok(booking)
    }

    async fn find(&self, id: &str) -> Result<Booking, ServiceError> {
        self.store
            .find_booking(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Booking not found".to_string()))
    }

    async fn list(&self, filter: BookingFilter) -> Result<Vec<Booking>, ServiceError> {
        Ok(self.store.find_bookings(&filter, Page::all()).await?)
    }
}

fn is_vendor_or_admin(actor: &Identity, booking: &Booking) -> bool {
    actor.is_admin() || (actor.role == Role::Vendor && booking.vendor_id == actor.id)
}

fn is_participant(actor: &Identity, booking: &Booking) -> bool {
    is_vendor_or_admin(actor, booking) || booking.user_id == actor.id
}
