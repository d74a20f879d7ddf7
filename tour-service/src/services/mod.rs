//! Business logic: repositories over the shared store, token handling and
//! the role gate.

pub mod auth;
pub mod bookings;
pub mod dashboard;
mod database;
pub mod error;
mod jwt;
mod memory;
pub mod metrics;
pub mod packages;
pub mod policy;
pub mod store;

pub use auth::AuthService;
pub use bookings::BookingRepository;
pub use dashboard::DashboardService;
pub use database::MongoStore;
pub use error::ServiceError;
pub use jwt::{Claims, JwtService, TokenError};
pub use memory::MemoryStore;
pub use packages::{PackageQuery, PackageRepository};
pub use store::TourStore;
