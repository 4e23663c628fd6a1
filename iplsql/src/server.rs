use actix_cors::Cors;
use actix_web::{error, middleware, web, App, HttpResponse, HttpServer};
use common::agent::Orchestrator;
use common::conversation::DEFAULT_SESSION;
use common::schema::SchemaContext;
use common::IplSqlError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub prompt: String,
    #[serde(default)]
    pub reset: bool,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_sql: Option<String>,
}

impl ErrorBody {
    fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            original_sql: None,
        }
    }
}

pub struct AppState {
    pub orchestrator: Orchestrator,
    pub schema: Arc<SchemaContext>,
}

/// map a pipeline failure onto the status codes the ui expects
fn error_response(err: IplSqlError) -> HttpResponse {
    match err {
        IplSqlError::Execution {
            message,
            original_sql,
        } => HttpResponse::BadRequest().json(ErrorBody {
            error: "SQL Error".to_string(),
            message,
            original_sql: Some(original_sql),
        }),
        IplSqlError::Generation(message) => {
            HttpResponse::InternalServerError().json(ErrorBody::new("Failed to generate SQL", message))
        }
        IplSqlError::Sanitization(message) => {
            HttpResponse::InternalServerError().json(ErrorBody::new("Failed to sanitize SQL", message))
        }
        other => HttpResponse::InternalServerError()
            .json(ErrorBody::new("Failed to process prompt.", other.to_string())),
    }
}

async fn query(state: web::Data<AppState>, body: web::Json<QueryRequest>) -> HttpResponse {
    let request = body.into_inner();

    if request.prompt.trim().is_empty() {
        return HttpResponse::BadRequest().json(ErrorBody::new("Invalid request", "prompt must not be empty"));
    }

    let session_id = request
        .session_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SESSION);

    tracing::info!(session = %session_id, reset = request.reset, "received prompt: {}", request.prompt);

    match state
        .orchestrator
        .run(session_id, &request.prompt, request.reset)
        .await
    {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(e) => {
            tracing::warn!("query failed: {}", e);
            error_response(e)
        }
    }
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "schemaVersion": state.schema.version(),
    }))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ErrorBody::new("Invalid request", err.to_string()));
        error::InternalError::from_response(err, response).into()
    })
}

/// routes shared by the server and the handler tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/api/query", web::post().to(query))
        .route("/api/health", web::get().to(health));
}

pub async fn serve(state: web::Data<AppState>, host: &str, port: u16) -> std::io::Result<()> {
    tracing::info!("server running on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((host, port))?
    .run()
    .await
}
