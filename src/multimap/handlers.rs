use super::protocol::{
    ApiResponse, EntryJson, PutEntryRequest, RemoveEntryRequest, StatsResponse,
};
use super::proxy::MultiMapProxy;
use super::service::MultiMapService;
use crate::error::MultiMapError;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
};
use std::sync::Arc;

type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

fn status_of(error: &MultiMapError) -> StatusCode {
    match error {
        MultiMapError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        MultiMapError::MapNotFound(_) => StatusCode::NOT_FOUND,
        MultiMapError::LockNotHeld(_) | MultiMapError::AlreadyLocked(_) => StatusCode::CONFLICT,
        e if e.is_routing() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reply<T>(result: crate::error::Result<T>) -> Reply<T> {
    match result {
        Ok(value) => (StatusCode::OK, Json(ApiResponse::ok(value))),
        Err(e) => {
            tracing::error!("Request failed: {}", e);
            (status_of(&e), Json(ApiResponse::failed(e)))
        }
    }
}

fn proxy(
    service: &Arc<MultiMapService>,
    name: &str,
) -> crate::error::Result<MultiMapProxy<String, String>> {
    service.multimap::<String, String>(name)
}

pub async fn handle_put(
    Extension(service): Extension<Arc<MultiMapService>>,
    Path(name): Path<String>,
    Json(req): Json<PutEntryRequest>,
) -> Reply<bool> {
    let result = match proxy(&service, &name) {
        Ok(map) => map.put(&req.key, &req.value).await,
        Err(e) => Err(e),
    };
    reply(result)
}

/// Returns the removed values: the given one if it was present, or all of the key's values.
pub async fn handle_remove(
    Extension(service): Extension<Arc<MultiMapService>>,
    Path(name): Path<String>,
    Json(req): Json<RemoveEntryRequest>,
) -> Reply<Vec<String>> {
    let map = match proxy(&service, &name) {
        Ok(map) => map,
        Err(e) => return reply(Err(e)),
    };

    let result = match req.value {
        Some(value) => map
            .remove(&req.key, &value)
            .await
            .map(|removed| if removed { vec![value] } else { Vec::new() }),
        None => map.remove_all(&req.key).await,
    };
    reply(result)
}

pub async fn handle_get(
    Extension(service): Extension<Arc<MultiMapService>>,
    Path((name, key)): Path<(String, String)>,
) -> Reply<Vec<String>> {
    let result = match proxy(&service, &name) {
        Ok(map) => map.get(&key).await,
        Err(e) => Err(e),
    };
    reply(result)
}

pub async fn handle_keys(
    Extension(service): Extension<Arc<MultiMapService>>,
    Path(name): Path<String>,
) -> Reply<Vec<String>> {
    let result = match proxy(&service, &name) {
        Ok(map) => map.key_set().await.map(|keys| {
            let mut keys: Vec<String> = keys.into_iter().collect();
            keys.sort();
            keys
        }),
        Err(e) => Err(e),
    };
    reply(result)
}

pub async fn handle_values(
    Extension(service): Extension<Arc<MultiMapService>>,
    Path(name): Path<String>,
) -> Reply<Vec<String>> {
    let result = match proxy(&service, &name) {
        Ok(map) => map.values().await,
        Err(e) => Err(e),
    };
    reply(result)
}

pub async fn handle_entries(
    Extension(service): Extension<Arc<MultiMapService>>,
    Path(name): Path<String>,
) -> Reply<Vec<EntryJson>> {
    let result = match proxy(&service, &name) {
        Ok(map) => map.entry_set().await.map(|entries| {
            let mut entries: Vec<EntryJson> = entries
                .into_iter()
                .map(|(key, value)| EntryJson { key, value })
                .collect();
            entries.sort_by(|a, b| (&a.key, &a.value).cmp(&(&b.key, &b.value)));
            entries
        }),
        Err(e) => Err(e),
    };
    reply(result)
}

pub async fn handle_stats(
    Extension(service): Extension<Arc<MultiMapService>>,
    Path(name): Path<String>,
) -> (StatusCode, Json<StatsResponse>) {
    reply(proxy(&service, &name).and_then(|map| map.local_stats()))
}

/// Goes straight to the service so a destroy that failed part-way can be repeated.
pub async fn handle_destroy(
    Extension(service): Extension<Arc<MultiMapService>>,
    Path(name): Path<String>,
) -> Reply<bool> {
    reply(service.destroy(&name).await.map(|_| true))
}
