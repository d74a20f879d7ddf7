use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PackageStatus {
    Pending,
    Approved,
    Rejected,
}

impl PackageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageStatus::Pending => "pending",
            PackageStatus::Approved => "approved",
            PackageStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PackageStatus::Pending),
            "approved" => Ok(PackageStatus::Approved),
            "rejected" => Ok(PackageStatus::Rejected),
            _ => Err(format!("Invalid package status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ItineraryDay {
    pub day: i32,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourPackage {
    #[serde(rename = "_id")]
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
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    pub expiry_date: Option<mongodb::bson::DateTime>,
}

/// Validated input for a new package.
#[derive(Debug, Clone)]
pub struct PackageDraft {
    pub title: String,
    pub description: String,
    pub destination: String,
    pub duration: String,
    pub price: f64,
    pub images: Vec<String>,
    pub included: Vec<String>,
    pub itinerary: Vec<ItineraryDay>,
    pub featured: bool,
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct PackagePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub destination: Option<String>,
    pub duration: Option<String>,
    pub price: Option<f64>,
    pub images: Option<Vec<String>>,
    pub included: Option<Vec<String>>,
    pub itinerary: Option<Vec<ItineraryDay>>,
    pub available: Option<bool>,
    pub featured: Option<bool>,
    pub expiry_date: Option<DateTime<Utc>>,
}

impl TourPackage {
    pub fn new(vendor_id: String, draft: PackageDraft, status: PackageStatus) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            vendor_id,
            title: draft.title,
            description: draft.description,
            destination: draft.destination,
            duration: draft.duration,
            price: draft.price,
            images: draft.images,
            included: dedup(draft.included),
            itinerary: draft.itinerary,
            available: true,
            featured: draft.featured,
            status,
            views: 0,
            bookings_count: 0,
            created_at: now,
            updated_at: now,
            expiry_date: draft.expiry_date.map(mongodb::bson::DateTime::from_chrono),
        }
    }

    /// Public listings and new bookings only see packages that pass this check.
    pub fn is_bookable(&self) -> bool {
        self.status == PackageStatus::Approved && self.available
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date
            .map(|expiry| expiry.to_chrono() < now)
            .unwrap_or(false)
    }

    /// Applies `patch` and reports whether any listing content changed value.
    pub fn apply(&mut self, patch: PackagePatch) -> bool {
        let mut content_changed = false;

        if let Some(title) = patch.title {
            content_changed |= self.title != title;
            self.title = title;
        }
        if let Some(description) = patch.description {
            content_changed |= self.description != description;
            self.description = description;
        }
        if let Some(destination) = patch.destination {
            content_changed |= self.destination != destination;
            self.destination = destination;
        }
        if let Some(duration) = patch.duration {
            content_changed |= self.duration != duration;
            self.duration = duration;
        }
        if let Some(price) = patch.price {
            content_changed |= self.price != price;
            self.price = price;
        }
        if let Some(images) = patch.images {
            self.images = images;
        }
        if let Some(included) = patch.included {
            self.included = dedup(included);
        }
        if let Some(itinerary) = patch.itinerary {
            self.itinerary = itinerary;
        }
        if let Some(available) = patch.available {
            self.available = available;
        }
        if let Some(featured) = patch.featured {
            self.featured = featured;
        }
        if let Some(expiry) = patch.expiry_date {
            self.expiry_date = Some(mongodb::bson::DateTime::from_chrono(expiry));
        }

        self.updated_at = Utc::now();
        content_changed
    }
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
