use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use models::version;
use service::identity::Identity;
use service::pagination::{PageQuery, Paginated};
use service::versions::repository::{VersionFields, VersionPatch};

use crate::errors::JsonApiError;
use crate::identity::ServerState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListVersionsQuery {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CreateVersionInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct UpdateVersionInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl From<version::Model> for VersionResponse {
    fn from(model: version::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<CreateVersionInput> for VersionFields {
    fn from(input: CreateVersionInput) -> Self {
        Self { name: input.name, description: input.description }
    }
}

impl From<UpdateVersionInput> for VersionPatch {
    fn from(input: UpdateVersionInput) -> Self {
        Self { name: input.name, description: input.description }
    }
}

#[utoipa::path(
    get, path = "/services/{id}/versions", tag = "versions",
    params(("id" = Uuid, Path, description = "Owning service ID"), ListVersionsQuery),
    responses(
        (status = 200, description = "One page of versions with meta.total"),
        (status = 400, description = "Invalid pagination parameters"),
        (status = 404, description = "Service Not Found")
    )
)]
pub async fn list(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Path(service_id): Path<Uuid>,
    Query(query): Query<ListVersionsQuery>,
) -> Result<Json<Paginated<VersionResponse>>, JsonApiError> {
    let page = PageQuery::new(query.offset, query.limit)?;
    let result = state.versions.find_all(&identity, service_id, page).await?;
    Ok(Json(result.map(VersionResponse::from)))
}

#[utoipa::path(
    get, path = "/services/{id}/versions/{version_id}", tag = "versions",
    params(
        ("id" = Uuid, Path, description = "Owning service ID"),
        ("version_id" = Uuid, Path, description = "Version ID")
    ),
    responses(
        (status = 200, description = "OK", body = VersionResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Path((service_id, version_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<VersionResponse>, JsonApiError> {
    let model = state.versions.find_one(&identity, service_id, version_id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    post, path = "/services/{id}/versions", tag = "versions",
    params(("id" = Uuid, Path, description = "Owning service ID")),
    request_body = CreateVersionInput,
    responses(
        (status = 201, description = "Created", body = VersionResponse),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Service Not Found")
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Path(service_id): Path<Uuid>,
    Json(input): Json<CreateVersionInput>,
) -> Result<(StatusCode, Json<VersionResponse>), JsonApiError> {
    let created = state.versions.create(&identity, service_id, input.into()).await?;
    info!(id = %created.id, service_id = %service_id, "created version");
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    put, path = "/services/{id}/versions/{version_id}", tag = "versions",
    params(
        ("id" = Uuid, Path, description = "Owning service ID"),
        ("version_id" = Uuid, Path, description = "Version ID")
    ),
    request_body = CreateVersionInput,
    responses(
        (status = 200, description = "Replaced, created if absent", body = VersionResponse),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Service Not Found")
    )
)]
pub async fn upsert(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Path((service_id, version_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<CreateVersionInput>,
) -> Result<Json<VersionResponse>, JsonApiError> {
    let model = state
        .versions
        .create_or_replace(&identity, service_id, version_id, input.into())
        .await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch, path = "/services/{id}/versions/{version_id}", tag = "versions",
    params(
        ("id" = Uuid, Path, description = "Owning service ID"),
        ("version_id" = Uuid, Path, description = "Version ID")
    ),
    request_body = UpdateVersionInput,
    responses(
        (status = 200, description = "Updated", body = VersionResponse),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Path((service_id, version_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<UpdateVersionInput>,
) -> Result<Json<VersionResponse>, JsonApiError> {
    let model = state
        .versions
        .update(&identity, service_id, version_id, input.into())
        .await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete, path = "/services/{id}/versions/{version_id}", tag = "versions",
    params(
        ("id" = Uuid, Path, description = "Owning service ID"),
        ("version_id" = Uuid, Path, description = "Version ID")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Path((service_id, version_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, JsonApiError> {
    state.versions.delete(&identity, service_id, version_id).await?;
    info!(id = %version_id, service_id = %service_id, "deleted version");
    Ok(StatusCode::NO_CONTENT)
}
