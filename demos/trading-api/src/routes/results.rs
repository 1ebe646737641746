use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use spimex_sdk::{ResultFilters, TradingResult};

use crate::error::AppError;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 5;
const MAX_LIMIT: usize = 100;
const MAX_FILTER_LEN: usize = 25;

fn check_limit(limit: Option<usize>) -> Result<usize, AppError> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::bad_request(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )));
    }
    Ok(limit)
}

#[derive(Deserialize)]
pub struct FilterParams {
    pub oil_id: Option<String>,
    pub delivery_basis_id: Option<String>,
    pub delivery_type_id: Option<String>,
}

impl FilterParams {
    fn into_filters(self) -> Result<ResultFilters, AppError> {
        for (name, value) in [
            ("oil_id", &self.oil_id),
            ("delivery_basis_id", &self.delivery_basis_id),
            ("delivery_type_id", &self.delivery_type_id),
        ] {
            if value.as_ref().is_some_and(|v| v.chars().count() > MAX_FILTER_LEN) {
                return Err(AppError::bad_request(format!(
                    "{name} must be at most {MAX_FILTER_LEN} characters"
                )));
            }
        }
        Ok(ResultFilters {
            oil_id: self.oil_id,
            delivery_basis_id: self.delivery_basis_id,
            delivery_type_id: self.delivery_type_id,
        })
    }
}

/// GET /all
pub async fn get_all(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TradingResult>>, AppError> {
    Ok(Json(state.sdk.all().await?))
}

#[derive(Deserialize)]
pub struct LastDatesParams {
    pub limit: Option<usize>,
}

/// GET /get_last_trading_dates?limit=5
pub async fn get_last_trading_dates(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LastDatesParams>,
) -> Result<Json<Vec<NaiveDate>>, AppError> {
    let limit = check_limit(params.limit)?;
    Ok(Json(state.sdk.latest_dates(limit).await?))
}

#[derive(Deserialize)]
pub struct DynamicsParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(flatten)]
    pub filters: FilterParams,
}

/// GET /get_dynamics?start_date=2025-01-15&end_date=2025-01-20&oil_id=A592
pub async fn get_dynamics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DynamicsParams>,
) -> Result<Json<Vec<TradingResult>>, AppError> {
    let filters = params.filters.into_filters()?;
    let rows = state
        .sdk
        .dynamics(params.start_date, params.end_date, filters)
        .await?;
    Ok(Json(rows))
}

#[derive(Deserialize)]
pub struct TradingResultsParams {
    pub limit: Option<usize>,
    #[serde(flatten)]
    pub filters: FilterParams,
}

/// GET /get_trading_results?oil_id=A592&limit=10
pub async fn get_trading_results(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TradingResultsParams>,
) -> Result<Json<Vec<TradingResult>>, AppError> {
    let limit = check_limit(params.limit)?;
    let filters = params.filters.into_filters()?;
    let rows = state
        .sdk
        .trading_results(Some(limit), filters)
        .await?;
    Ok(Json(rows))
}
