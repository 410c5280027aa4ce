use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::routes::services::{CreateServiceInput, ServiceResponse, UpdateServiceInput};
use crate::routes::versions::{CreateVersionInput, UpdateVersionInput, VersionResponse};

/// Registers the bearer scheme so Swagger UI can authorize requests.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwtAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::services::list,
        crate::routes::services::get,
        crate::routes::services::create,
        crate::routes::services::upsert,
        crate::routes::services::update,
        crate::routes::services::delete,
        crate::routes::versions::list,
        crate::routes::versions::get,
        crate::routes::versions::create,
        crate::routes::versions::upsert,
        crate::routes::versions::update,
        crate::routes::versions::delete,
    ),
    components(
        schemas(
            CreateServiceInput,
            UpdateServiceInput,
            ServiceResponse,
            CreateVersionInput,
            UpdateVersionInput,
            VersionResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health"),
        (name = "services"),
        (name = "versions")
    )
)]
pub struct ApiDoc;
