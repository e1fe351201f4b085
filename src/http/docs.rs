//! Interactive API documentation, exposed only in debug mode.

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::conversation::{Role, Session, Turn};
use crate::http::response::ErrorBody;
use crate::http::routes::{self, ChatReply, ChatRequest, HealthReport, SessionCreated};

pub const DOCS_PATH: &str = "/docs";
pub const OPENAPI_PATH: &str = "/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(title = "Velarium", description = "Conversational agent API"),
    paths(
        routes::health,
        routes::chat,
        routes::create_session,
        routes::get_session
    ),
    components(schemas(
        HealthReport,
        ChatRequest,
        ChatReply,
        SessionCreated,
        Session,
        Turn,
        Role,
        ErrorBody
    )),
    tags((name = "sessions", description = "Multi-turn conversations"))
)]
pub struct ApiDoc;

/// Swagger UI at `/docs`, serving the generated document at `/openapi.json`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new(DOCS_PATH).url(OPENAPI_PATH, ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route_and_degraded_responses() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = doc["paths"].as_object().unwrap();

        assert_eq!(paths.len(), 4);
        assert!(paths["/health"]["get"]["responses"].get("503").is_none());
        assert!(paths["/api/sessions"]["post"]["responses"].get("503").is_some());
        assert!(paths["/api/sessions/{id}"]["get"]["responses"].get("404").is_some());
        assert_eq!(doc["info"]["title"], "Velarium");
    }

    #[test]
    fn schemas_cover_request_and_reply_bodies() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let schemas = doc["components"]["schemas"].as_object().unwrap();
        for name in ["ChatRequest", "ChatReply", "Session", "ErrorBody"] {
            assert!(schemas.contains_key(name), "missing schema {}", name);
        }
    }
}
