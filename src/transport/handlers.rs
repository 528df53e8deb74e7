use super::protocol::{InvokeRequest, InvokeResponse};
use crate::multimap::listener::EntryEvent;
use crate::multimap::service::MultiMapService;
use crate::serialization::Datum;

use axum::{Extension, Json, http::StatusCode};
use std::sync::Arc;

pub async fn handle_invoke(
    Extension(service): Extension<Arc<MultiMapService>>,
    Json(req): Json<InvokeRequest>,
) -> (StatusCode, Json<InvokeResponse>) {
    tracing::debug!(
        "Received {} for '{}' partition {}",
        req.operation.name(),
        req.map_name,
        req.partition
    );

    let outcome = service.execute_local(req);
    let status = match &outcome {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!("Invocation failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(InvokeResponse::from(outcome)))
}

pub async fn handle_event(
    Extension(service): Extension<Arc<MultiMapService>>,
    Json(event): Json<EntryEvent<Datum, Datum>>,
) -> StatusCode {
    service.deliver_event(event);
    StatusCode::OK
}
