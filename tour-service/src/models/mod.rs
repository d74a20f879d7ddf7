//! Persisted entities and the value types that drive the marketplace workflows.

mod booking;
mod identity;
mod package;
mod user;

pub use booking::{Booking, BookingAction, BookingStatus, PaymentStatus};
pub use identity::Identity;
pub use package::{ItineraryDay, PackageDraft, PackagePatch, PackageStatus, TourPackage};
pub use user::{normalize_email, Role, User, VendorProfile};
