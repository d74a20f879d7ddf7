use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::Pagination;
use crate::models::{ItineraryDay, PackageDraft, PackagePatch, PackageStatus, TourPackage};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePackageRequest {
    #[validate(
        required(message = "Title is required"),
        length(min = 1, max = 200, message = "Title must be 1-200 characters")
    )]
    #[schema(example = "Kerala Backwaters")]
    pub title: Option<String>,

    #[validate(
        required(message = "Description is required"),
        length(min = 1, message = "Description is required")
    )]
    pub description: Option<String>,

    #[validate(
        required(message = "Destination is required"),
        length(min = 1, message = "Destination is required")
    )]
    #[schema(example = "Alleppey")]
    pub destination: Option<String>,

    #[validate(
        required(message = "Duration is required"),
        length(min = 1, message = "Duration is required")
    )]
    #[schema(example = "3 days / 2 nights")]
    pub duration: Option<String>,

    #[validate(
        required(message = "Price is required"),
        range(min = 0.0, message = "Price must be non-negative")
    )]
    #[schema(example = 450.0)]
    pub price: Option<f64>,

    pub images: Option<Vec<String>>,
    pub included: Option<Vec<String>>,
    pub itinerary: Option<Vec<ItineraryDay>>,
    /// Honoured only for admins.
    pub featured: Option<bool>,
    pub expiry_date: Option<DateTime<Utc>>,
}

impl From<CreatePackageRequest> for PackageDraft {
    fn from(req: CreatePackageRequest) -> Self {
        Self {
            title: req.title.unwrap_or_default(),
            description: req.description.unwrap_or_default(),
            destination: req.destination.unwrap_or_default(),
            duration: req.duration.unwrap_or_default(),
            price: req.price.unwrap_or_default(),
            images: req.images.unwrap_or_default(),
            included: req.included.unwrap_or_default(),
            itinerary: req.itinerary.unwrap_or_default(),
            featured: req.featured.unwrap_or(false),
            expiry_date: req.expiry_date,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePackageRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: Option<String>,
    #[validate(length(min = 1, message = "Destination must not be empty"))]
    pub destination: Option<String>,
    #[validate(length(min = 1, message = "Duration must not be empty"))]
    pub duration: Option<String>,
    #[validate(range(min = 0.0, message = "Price must be non-negative"))]
    pub price: Option<f64>,
    pub images: Option<Vec<String>>,
    pub included: Option<Vec<String>>,
    pub itinerary: Option<Vec<ItineraryDay>>,
    pub available: Option<bool>,
    pub featured: Option<bool>,
    pub expiry_date: Option<DateTime<Utc>>,
}

impl From<UpdatePackageRequest> for PackagePatch {
    fn from(req: UpdatePackageRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            destination: req.destination,
            duration: req.duration,
            price: req.price,
            images: req.images,
            included: req.included,
            itinerary: req.itinerary,
            available: req.available,
            featured: req.featured,
            expiry_date: req.expiry_date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalDecision {
    Approve,
    Reject,
}

impl ApprovalDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalDecision::Approve => "approve",
            ApprovalDecision::Reject => "reject",
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ApprovalRequest {
    #[validate(required(message = "Decision is required"))]
    pub decision: Option<ApprovalDecision>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PackageListParams {
    /// Case-insensitive substring of the destination
    pub destination: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Case-insensitive substring of title, description or destination
    pub search: Option<String>,
    pub featured: Option<bool>,
    pub page: Option<u64>,
    pub limit: Option<i64>,
    /// One of createdAt, price, title, views, duration
    pub sort_by: Option<String>,
    /// asc or desc
    pub sort_order: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeaturedParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    pub page: Option<u64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReviewQueueParams {
    /// Defaults to pending
    pub status: Option<PackageStatus>,
    pub page: Option<u64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageResponse {
    pub id: String,
    pub vendor_id: String,
    pub title: String,
    pub description: String,
    pub destination: String,
    pub duration: String,
    pub price: f64,
    pub images: Vec<String>,
    pub included: Vec<String>,
    pub itinerary: Vec<ItineraryDay>,
    pub available: bool,
    pub featured: bool,
    pub status: PackageStatus,
    pub views: i64,
    pub bookings_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
}

impl From<TourPackage> for PackageResponse {
    fn from(p: TourPackage) -> Self {
        Self {
            id: p.id,
            vendor_id: p.vendor_id,
            title: p.title,
            description: p.description,
            destination: p.destination,
            duration: p.duration,
            price: p.price,
            images: p.images,
            included: p.included,
            itinerary: p.itinerary,
            available: p.available,
            featured: p.featured,
            status: p.status,
            views: p.views,
            bookings_count: p.bookings_count,
            created_at: p.created_at,
            updated_at: p.updated_at,
            expiry_date: p.expiry_date.map(|t| t.to_chrono()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PackageListResponse {
    pub packages: Vec<PackageResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FeaturedPackagesResponse {
    pub packages: Vec<PackageResponse>,
}
