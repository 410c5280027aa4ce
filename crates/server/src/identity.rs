use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::DatabaseConnection;

use service::identity::Identity;
use service::services::repository::SeaOrmServicesRepository;
use service::services::service::ServicesService;
use service::versions::repository::SeaOrmVersionsRepository;
use service::versions::service::VersionsService;

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
}

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: ServerAuthConfig,
    pub services: Arc<ServicesService<SeaOrmServicesRepository>>,
    pub versions: Arc<VersionsService<SeaOrmServicesRepository, SeaOrmVersionsRepository>>,
}

impl ServerState {
    pub fn new(db: DatabaseConnection, auth: ServerAuthConfig) -> Self {
        let services_repo = Arc::new(SeaOrmServicesRepository::new(db.clone()));
        let versions_repo = Arc::new(SeaOrmVersionsRepository::new(db.clone()));
        Self {
            services: Arc::new(ServicesService::new(Arc::clone(&services_repo))),
            versions: Arc::new(VersionsService::new(services_repo, versions_repo)),
            db,
            auth,
        }
    }
}

/// Sign an identity triple into a bearer token. Token issuance itself lives
/// outside this system; this mirrors the issuer for tests and the Swagger
/// quick-start.
pub fn sign_identity(identity: &Identity, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    encode(&Header::default(), identity, &EncodingKey::from_secret(secret.as_bytes()))
}

/// Verify a bearer token and extract the identity triple. Tokens carry only
/// the triple; an `exp` claim is honored when present but not required.
pub fn verify_token(token: &str, secret: &str) -> Result<Identity, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();
    decode::<Identity>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
}

/// Reject requests without a valid bearer identity before any handler runs.
/// Handlers read the verified identity from request extensions and never from
/// the payload, so a request can never choose its own tenant.
pub async fn require_identity(State(state): State<ServerState>, mut request: Request, next: Next) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let Some(token) = header.and_then(|value| value.strip_prefix("Bearer ")) else {
        return unauthorized("Missing authorization token");
    };
    match verify_token(token, &state.auth.jwt_secret) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(_) => unauthorized("Invalid authorization token"),
    }
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(serde_json::json!({ "error": message }))).into_response()
}
