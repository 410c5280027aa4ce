use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use axum_extra::extract::Query;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use service::identity::Identity;
use service::pagination::{PageQuery, Paginated};
use service::services::repository::{ServiceFields, ServicePatch, ServiceRecord};

use crate::errors::JsonApiError;
use crate::identity::ServerState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListServicesQuery {
    /// Case-insensitive term matched against name and description
    pub search: Option<String>,
    /// Repeatable `"<field> [asc|desc]"` entries
    #[serde(default)]
    pub sort: Vec<String>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CreateServiceInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct UpdateServiceInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub versions_count: u64,
}

impl From<ServiceRecord> for ServiceResponse {
    fn from(record: ServiceRecord) -> Self {
        let ServiceRecord { service, versions_count } = record;
        Self {
            id: service.id,
            name: service.name,
            description: service.description,
            created_at: service.created_at,
            updated_at: service.updated_at,
            versions_count,
        }
    }
}

impl From<CreateServiceInput> for ServiceFields {
    fn from(input: CreateServiceInput) -> Self {
        Self { name: input.name, description: input.description }
    }
}

impl From<UpdateServiceInput> for ServicePatch {
    fn from(input: UpdateServiceInput) -> Self {
        Self { name: input.name, description: input.description }
    }
}

#[utoipa::path(
    get, path = "/services", tag = "services",
    params(ListServicesQuery),
    responses(
        (status = 200, description = "One page of services with meta.total"),
        (status = 400, description = "Invalid sort or pagination parameters")
    )
)]
pub async fn list(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ListServicesQuery>,
) -> Result<Json<Paginated<ServiceResponse>>, JsonApiError> {
    let page = PageQuery::new(query.offset, query.limit)?;
    let result = state
        .services
        .find_all(&identity, query.search, &query.sort, page)
        .await?;
    Ok(Json(result.map(ServiceResponse::from)))
}

#[utoipa::path(
    get, path = "/services/{id}", tag = "services",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "OK", body = ServiceResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<ServiceResponse>, JsonApiError> {
    let record = state.services.find_one(&identity, id).await?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    post, path = "/services", tag = "services",
    request_body = CreateServiceInput,
    responses(
        (status = 201, description = "Created", body = ServiceResponse),
        (status = 400, description = "Validation Error")
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Json(input): Json<CreateServiceInput>,
) -> Result<(StatusCode, Json<ServiceResponse>), JsonApiError> {
    let created = state.services.create(&identity, input.into()).await?;
    info!(id = %created.service.id, "created service");
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    put, path = "/services/{id}", tag = "services",
    params(("id" = Uuid, Path, description = "Service ID")),
    request_body = CreateServiceInput,
    responses(
        (status = 200, description = "Replaced, created if absent", body = ServiceResponse),
        (status = 400, description = "Validation Error")
    )
)]
pub async fn upsert(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateServiceInput>,
) -> Result<Json<ServiceResponse>, JsonApiError> {
    let record = state.services.create_or_replace(&identity, id, input.into()).await?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    patch, path = "/services/{id}", tag = "services",
    params(("id" = Uuid, Path, description = "Service ID")),
    request_body = UpdateServiceInput,
    responses(
        (status = 200, description = "Updated", body = ServiceResponse),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateServiceInput>,
) -> Result<Json<ServiceResponse>, JsonApiError> {
    let record = state.services.update(&identity, id, input.into()).await?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    delete, path = "/services/{id}", tag = "services",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    state.services.delete(&identity, id).await?;
    info!(id = %id, "deleted service");
    Ok(StatusCode::NO_CONTENT)
}
