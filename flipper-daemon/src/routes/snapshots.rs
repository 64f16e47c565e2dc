//! Snapshot endpoints
//!
//! Everything here reads the currently published snapshot; nothing triggers
//! a refresh.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use flipper_core::{AuctionItem, CalendarEvent, MayorInfo};
use flipper_services::Services;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ErrorResponse;
use crate::AppState;

const DEFAULT_AUCTION_LIMIT: usize = 100;

/// Query parameters for the auction listing
#[derive(Debug, Deserialize)]
pub struct AuctionsQuery {
    /// Maximum number of auctions to return
    pub limit: Option<usize>,
    /// Only Buy-It-Now listings
    #[serde(default)]
    pub bin: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionsResponse {
    pub fetched_at: DateTime<Utc>,
    pub total_pages: u32,
    pub total_auctions: usize,
    pub auctions: Vec<AuctionItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MayorResponse {
    pub last_updated: DateTime<Utc>,
    #[serde(flatten)]
    pub mayor: MayorInfo,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub active: Vec<CalendarEvent>,
    pub upcoming: Vec<CalendarEvent>,
}

fn error(code: StatusCode, msg: impl Into<String>) -> Response {
    (code, Json(ErrorResponse::new(msg))).into_response()
}

fn services(state: &AppState) -> Result<Arc<Services>, Response> {
    state
        .orchestrator
        .services()
        .ok_or_else(|| error(StatusCode::SERVICE_UNAVAILABLE, "Services are still initializing"))
}

/// GET /api/bazaar
async fn get_bazaar(State(state): State<AppState>) -> Response {
    let services = match services(&state) {
        Ok(services) => services,
        Err(response) => return response,
    };
    match services.bazaar.current_snapshot() {
        Some(snapshot) => Json(snapshot.as_ref().clone()).into_response(),
        None => error(StatusCode::SERVICE_UNAVAILABLE, "No bazaar snapshot yet"),
    }
}

/// GET /api/bazaar/{product_id}
async fn get_product(State(state): State<AppState>, Path(product_id): Path<String>) -> Response {
    let services = match services(&state) {
        Ok(services) => services,
        Err(response) => return response,
    };
    match services.bazaar.product(&product_id) {
        Some(product) => Json(product).into_response(),
        None => error(
            StatusCode::NOT_FOUND,
            format!("Product not found: {}", product_id),
        ),
    }
}

/// GET /api/auctions?limit=n&bin=true
async fn get_auctions(State(state): State<AppState>, Query(query): Query<AuctionsQuery>) -> Response {
    let services = match services(&state) {
        Ok(services) => services,
        Err(response) => return response,
    };
    let Some(snapshot) = services.auctions.current_snapshot() else {
        return error(StatusCode::SERVICE_UNAVAILABLE, "No auction snapshot yet");
    };

    let limit = query.limit.unwrap_or(DEFAULT_AUCTION_LIMIT);
    let auctions = if query.bin {
        snapshot.bin_listings().take(limit).cloned().collect()
    } else {
        snapshot.auctions.iter().take(limit).cloned().collect()
    };
    Json(AuctionsResponse {
        fetched_at: snapshot.fetched_at,
        total_pages: snapshot.total_pages,
        total_auctions: snapshot.total_auctions,
        auctions,
    })
    .into_response()
}

/// GET /api/items/{item_id}
async fn get_item(State(state): State<AppState>, Path(item_id): Path<String>) -> Response {
    let services = match services(&state) {
        Ok(services) => services,
        Err(response) => return response,
    };
    match services.items.get(&item_id) {
        Some(item) => Json(item).into_response(),
        None => error(StatusCode::NOT_FOUND, format!("Item not found: {}", item_id)),
    }
}

/// GET /api/bits/{item_id}
async fn get_bits_item(State(state): State<AppState>, Path(item_id): Path<String>) -> Response {
    let services = match services(&state) {
        Ok(services) => services,
        Err(response) => return response,
    };
    match services.bits_shop.get(&item_id) {
        Some(item) => Json(item).into_response(),
        None => error(
            StatusCode::NOT_FOUND,
            format!("Bits shop item not found: {}", item_id),
        ),
    }
}

/// GET /api/economy
async fn get_economy(State(state): State<AppState>) -> Response {
    match services(&state) {
        Ok(services) => Json(services.economy.current()).into_response(),
        Err(response) => response,
    }
}

/// GET /api/mayor
async fn get_mayor(State(state): State<AppState>) -> Response {
    let services = match services(&state) {
        Ok(services) => services,
        Err(response) => return response,
    };
    match services.mayor.current() {
        Some(record) => Json(MayorResponse {
            last_updated: record.last_updated,
            mayor: record.data.clone(),
        })
        .into_response(),
        None => error(StatusCode::NOT_FOUND, "Mayor data unavailable"),
    }
}

/// GET /api/calendar
async fn get_calendar(State(state): State<AppState>) -> Response {
    let services = match services(&state) {
        Ok(services) => services,
        Err(response) => return response,
    };
    let now = Utc::now();
    Json(CalendarResponse {
        active: services.calendar.active_events(now),
        upcoming: services.calendar.upcoming_events(now),
    })
    .into_response()
}

/// Create snapshot routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bazaar", get(get_bazaar))
        .route("/bazaar/{product_id}", get(get_product))
        .route("/auctions", get(get_auctions))
        .route("/items/{item_id}", get(get_item))
        .route("/bits/{item_id}", get(get_bits_item))
        .route("/economy", get(get_economy))
        .route("/mayor", get(get_mayor))
        .route("/calendar", get(get_calendar))
}
