use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::{AppError, FieldViolation};

use crate::{
    dtos::bookings::{
        BookingListParams, BookingListResponse, BookingResponse, CreateBookingRequest,
        PaymentStatusRequest,
    },
    middleware::AuthUser,
    models::BookingAction,
    utils::ValidatedJson,
    AppState,
};

/// Book an approved, available package
#[utoipa::path(
    post,
    path = "/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingResponse),
        (status = 400, description = "Missing package id"),
        (status = 404, description = "Package not found"),
        (status = 409, description = "Package not bookable")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let package_id = req.package_id.unwrap_or_default();
    let booking = state.bookings.create(&identity, &package_id).await?;
    Ok((StatusCode::CREATED, Json(BookingResponse::from(booking))))
}

/// Bookings visible to the caller
#[utoipa::path(
    get,
    path = "/bookings",
    params(BookingListParams),
    responses((status = 200, description = "Bookings, newest first", body = BookingListResponse)),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Query(params): Query<BookingListParams>,
) -> Result<Json<BookingListResponse>, AppError> {
    let bookings = state.bookings.list_for(&identity, params.status).await?;
    Ok(Json(BookingListResponse {
        bookings: bookings.into_iter().map(BookingResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/bookings/{id}",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking", body = BookingResponse),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Booking not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn get_booking(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    Ok(Json(state.bookings.get(&id, &identity).await?.into()))
}

/// Confirm, complete or cancel a booking
#[utoipa::path(
    put,
    path = "/bookings/{id}/{action}",
    params(
        ("id" = String, Path, description = "Booking id"),
        ("action" = BookingAction, Path, description = "confirm, complete or cancel")
    ),
    responses(
        (status = 200, description = "Booking after the transition", body = BookingResponse),
        (status = 400, description = "Unknown action"),
        (status = 403, description = "Actor not allowed"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Transition not allowed from the current status")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn transition_booking(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path((id, action)): Path<(String, String)>,
) -> Result<Json<BookingResponse>, AppError> {
    let action: BookingAction = action.parse().map_err(|_| {
        AppError::ValidationError(vec![FieldViolation::new(
            "action",
            "action must be one of confirm, complete, cancel",
        )])
    })?;

    let booking = state.bookings.transition(&id, &identity, action).await?;
    Ok(Json(booking.into()))
}

#[utoipa::path(
    put,
    path = "/bookings/{id}/payment",
    params(("id" = String, Path, description = "Booking id")),
    request_body = PaymentStatusRequest,
    responses(
        (status = 200, description = "Booking with the new payment status", body = BookingResponse),
        (status = 403, description = "Owning vendor or admin only"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Payment status change not allowed")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn update_payment(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<PaymentStatusRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let payment_status = req.payment_status.ok_or_else(|| {
        AppError::ValidationError(vec![FieldViolation::new(
            "paymentStatus",
            "Payment status is required",
        )])
    })?;

    let booking = state
        .bookings
        .set_payment_status(&id, &identity, payment_status)
        .await?;
    Ok(Json(booking.into()))
}
