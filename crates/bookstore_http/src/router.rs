//! Axum router for the bookstore REST API.
//! Routes: `/api/{stores,books,authors,publishers}[/:id]`,
//! `/api/stores/:id/books/:book_id` (link/unlink) and `GET /health`.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use bookstore_core::{
    core_version, run_in_transaction, Author, Book, Entity, EntityId, EntityKind, EntityService,
    Publisher, SqliteBacked, SqliteStoreBookLinks, SqliteStoreRepository, Store, StoreBookService,
    ServiceResult,
};
use log::{debug, info};
use rusqlite::Connection;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

use crate::alert::{collection_path, entity_alert, AlertAction};
use crate::error::ApiError;

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    application_name: Arc<str>,
}

impl AppState {
    /// Wraps an open, migrated connection.
    pub fn new(conn: Connection, application_name: impl Into<String>) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            application_name: Arc::from(application_name.into()),
        }
    }

    /// Name used in `X-<name>-*` response headers.
    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    /// Unwraps a JSON body, turning rejections into problem responses.
    fn body<E: Entity>(&self, payload: Result<Json<E>, JsonRejection>) -> Result<E, ApiError> {
        payload
            .map(|Json(entity)| entity)
            .map_err(|rejection| ApiError::invalid_body(&self.application_name, E::KIND, rejection))
    }

    /// Runs `work` as one transaction on a blocking worker.
    async fn run<T, F>(&self, work: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> ServiceResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let app = Arc::clone(&self.application_name);

        let joined = tokio::task::spawn_blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|_| ApiError::Internal("database lock poisoned".to_string()))?;
            run_in_transaction(&mut conn, work).map_err(|error| ApiError::Service { app, error })
        })
        .await;

        match joined {
            Ok(result) => result,
            Err(err) => Err(ApiError::Internal(format!("worker failed: {err}"))),
        }
    }
}

/// Entities exposed as CRUD resources.
pub trait Resource: SqliteBacked + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<E> Resource for E where
    E: SqliteBacked + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// Builds the axum `Router` with all API routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .nest("/api", api_routes())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(resource_routes::<Store>())
        .merge(resource_routes::<Book>())
        .merge(resource_routes::<Author>())
        .merge(resource_routes::<Publisher>())
        .route(
            "/stores/:id/books/:book_id",
            put(link_store_book).delete(unlink_store_book),
        )
}

fn resource_routes<E: Resource>() -> Router<AppState> {
    let base = format!("/{}", collection_path(E::KIND));
    Router::new()
        .route(&base, get(list_resources::<E>).post(create_resource::<E>))
        .route(
            &format!("{base}/:id"),
            get(get_resource::<E>)
                .put(update_resource::<E>)
                .patch(patch_resource::<E>)
                .delete(delete_resource::<E>),
        )
}

async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok", "service": "bookstore", "version": core_version()}))
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    #[serde(default)]
    eagerload: bool,
}

async fn list_resources<E: Resource>(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<E>>, ApiError> {
    // Lists always carry relations; the flag is accepted for compatibility.
    debug!(
        "event=http_list module=http status=start entity={} eagerload={}",
        E::KIND,
        params.eagerload
    );
    let items = state
        .run(|conn| EntityService::new(E::repository(conn)).list(true))
        .await?;
    Ok(Json(items))
}

async fn get_resource<E: Resource>(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> Result<Json<E>, ApiError> {
    let item = state
        .run(move |conn| EntityService::new(E::repository(conn)).get(id))
        .await?;
    Ok(Json(item))
}

async fn create_resource<E: Resource>(
    State(state): State<AppState>,
    payload: Result<Json<E>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = state.body::<E>(payload)?;
    let created = state
        .run(move |conn| EntityService::new(E::repository(conn)).create(&payload))
        .await?;
    let id = created.id().unwrap_or_default();
    info!("event=http_create module=http status=ok entity={} id={id}", E::KIND);

    let mut headers = entity_alert(
        state.application_name(),
        AlertAction::Created,
        E::KIND,
        id,
    );
    let location = format!("/api/{}/{id}", collection_path(E::KIND));
    if let Ok(value) = HeaderValue::from_str(&location) {
        headers.insert(header::LOCATION, value);
    }
    Ok((StatusCode::CREATED, headers, Json(created)).into_response())
}

async fn update_resource<E: Resource>(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    payload: Result<Json<E>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = state.body::<E>(payload)?;
    let updated = state
        .run(move |conn| EntityService::new(E::repository(conn)).update(id, &payload))
        .await?;
    info!("event=http_update module=http status=ok entity={} id={id}", E::KIND);
    Ok(updated_response(&state, E::KIND, id, updated))
}

async fn patch_resource<E: Resource>(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    payload: Result<Json<E>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = state.body::<E>(payload)?;
    let updated = state
        .run(move |conn| EntityService::new(E::repository(conn)).partial_update(id, &payload))
        .await?;
    info!("event=http_patch module=http status=ok entity={} id={id}", E::KIND);
    Ok(updated_response(&state, E::KIND, id, updated))
}

async fn delete_resource<E: Resource>(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> Result<Response, ApiError> {
    state
        .run(move |conn| EntityService::new(E::repository(conn)).delete(id))
        .await?;
    info!("event=http_delete module=http status=ok entity={} id={id}", E::KIND);

    let headers = entity_alert(
        state.application_name(),
        AlertAction::Deleted,
        E::KIND,
        id,
    );
    Ok((StatusCode::NO_CONTENT, headers).into_response())
}

async fn link_store_book(
    State(state): State<AppState>,
    Path((store_id, book_id)): Path<(EntityId, EntityId)>,
) -> Result<Response, ApiError> {
    let store = state
        .run(move |conn| links_service(conn).add_book(store_id, book_id))
        .await?;
    Ok(updated_response(&state, EntityKind::Store, store_id, store))
}

async fn unlink_store_book(
    State(state): State<AppState>,
    Path((store_id, book_id)): Path<(EntityId, EntityId)>,
) -> Result<Response, ApiError> {
    let store = state
        .run(move |conn| links_service(conn).remove_book(store_id, book_id))
        .await?;
    Ok(updated_response(&state, EntityKind::Store, store_id, store))
}

fn links_service(
    conn: &Connection,
) -> StoreBookService<SqliteStoreBookLinks<'_>, SqliteStoreRepository<'_>> {
    StoreBookService::new(
        SqliteStoreBookLinks::new(conn),
        SqliteStoreRepository::new(conn),
    )
}

fn updated_response<T: Serialize>(
    state: &AppState,
    kind: EntityKind,
    id: EntityId,
    body: T,
) -> Response {
    let headers = entity_alert(state.application_name(), AlertAction::Updated, kind, id);
    (StatusCode::OK, headers, Json(body)).into_response()
}
