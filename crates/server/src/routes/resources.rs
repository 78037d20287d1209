//! Generic collection handlers, instantiated once per resource.
//!
//! Every handler reads the caller and runs the policy check before it looks
//! at the path or body, so an unauthorized request gets 401/403 even when its
//! input is malformed.

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use service::pagination::{ListQuery, Page};
use service::policy::Operation;
use service::resource::{Resource, ResourceService};
use tracing::info;

use crate::auth::{Caller, Gate};
use crate::errors::JsonApiError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

type ApiResult<T> = Result<T, JsonApiError>;

pub async fn create<R>(
    State(svc): State<ResourceService<R>>,
    State(gate): State<Gate>,
    caller: Caller,
    body: Result<AppJson<R::Create>, JsonApiError>,
) -> ApiResult<(StatusCode, Json<R::View>)>
where
    R: Resource,
    ResourceService<R>: FromRef<AppState>,
{
    gate.check(R::COLLECTION, Operation::Create, &caller)?;
    let AppJson(input) = body?;
    let view = svc.create(input).await?;
    info!(collection = R::COLLECTION, id = %R::id_of(&view), "created");
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn list<R>(
    State(svc): State<ResourceService<R>>,
    State(gate): State<Gate>,
    caller: Caller,
    query: Result<AppQuery<ListQuery>, JsonApiError>,
) -> ApiResult<Json<Page<R::View>>>
where
    R: Resource,
    ResourceService<R>: FromRef<AppState>,
{
    gate.check(R::COLLECTION, Operation::List, &caller)?;
    let AppQuery(query) = query?;
    Ok(Json(svc.list(query).await?))
}

pub async fn get_one<R>(
    State(svc): State<ResourceService<R>>,
    State(gate): State<Gate>,
    caller: Caller,
    id: Result<AppPath<R::Id>, JsonApiError>,
) -> ApiResult<Json<R::View>>
where
    R: Resource,
    ResourceService<R>: FromRef<AppState>,
{
    gate.check(R::COLLECTION, Operation::Get, &caller)?;
    let AppPath(id) = id?;
    Ok(Json(svc.get(id).await?))
}

pub async fn update<R>(
    State(svc): State<ResourceService<R>>,
    State(gate): State<Gate>,
    caller: Caller,
    id: Result<AppPath<R::Id>, JsonApiError>,
    body: Result<AppJson<R::Update>, JsonApiError>,
) -> ApiResult<Json<R::View>>
where
    R: Resource,
    ResourceService<R>: FromRef<AppState>,
{
    gate.check(R::COLLECTION, Operation::Update, &caller)?;
    let AppPath(id) = id?;
    let AppJson(changes) = body?;
    let view = svc.update(id, changes).await?;
    info!(collection = R::COLLECTION, id = %id, "updated");
    Ok(Json(view))
}

pub async fn remove<R>(
    State(svc): State<ResourceService<R>>,
    State(gate): State<Gate>,
    caller: Caller,
    id: Result<AppPath<R::Id>, JsonApiError>,
) -> ApiResult<StatusCode>
where
    R: Resource,
    ResourceService<R>: FromRef<AppState>,
{
    gate.check(R::COLLECTION, Operation::Delete, &caller)?;
    let AppPath(id) = id?;
    svc.remove(id).await?;
    info!(collection = R::COLLECTION, id = %id, "deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `/{collection}` and `/{collection}/:id` for one resource.
pub fn collection<R>() -> Router<AppState>
where
    R: Resource,
    ResourceService<R>: FromRef<AppState>,
{
    let base = format!("/{}", R::COLLECTION);
    let item = format!("/{}/:id", R::COLLECTION);
    Router::new()
        .route(&base, get(list::<R>).post(create::<R>))
        .route(&item, get(get_one::<R>).put(update::<R>).delete(remove::<R>))
}
