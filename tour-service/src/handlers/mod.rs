pub mod auth;
pub mod bookings;
pub mod dashboard;
pub mod health;
pub mod packages;
pub mod users;
