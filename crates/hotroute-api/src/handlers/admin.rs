//! Plugin admin endpoints.

use axum::Json;
use axum::extract::{Path, Request, State};
use axum::response::{IntoResponse, Response};
use http::Method;
use tracing::info;

use hotroute_core::AppError;
use hotroute_plugin::{FindQuery, Operation, PluginManager, StatusRecord};

use crate::handlers::dispatch;
use crate::state::ApiState;

/// GET /api
pub async fn status(State(state): State<ApiState>) -> Result<Json<Vec<StatusRecord>>, AppError> {
    let manager = state.manager.lock().await;
    Ok(Json(manager.status()?))
}

/// GET /{load|unload|start|stop}/{id}
///
/// Any other two-segment path, or a non-GET method, is forwarded to the host.
pub async fn lifecycle(
    State(state): State<ApiState>,
    Path((action, id)): Path<(String, String)>,
    request: Request,
) -> Response {
    let operation = match action.parse::<Operation>() {
        Ok(operation) if request.method() == Method::GET => operation,
        _ => return dispatch::dispatch(State(state), request).await,
    };

    let mut manager = state.manager.lock().await;
    match run(&mut manager, operation, &id).await {
        Ok(()) => {
            info!(plugin_id = %id, operation = %operation, "Lifecycle request completed");
            "success".into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn run(manager: &mut PluginManager, operation: Operation, id: &str) -> Result<(), AppError> {
    if operation != Operation::Load
        && manager.get(id).is_none()
        && manager.find(FindQuery::by_id(id))?.is_none()
    {
        return Err(AppError::not_found(format!("no plugin with id '{id}' found")));
    }

    match operation {
        Operation::Load => manager.load_id(id)?,
        Operation::Start => manager.start(id).await?,
        Operation::Stop => manager.stop(id).await?,
        Operation::Unload => {
            manager.unload(id).await?;
        }
    }
    Ok(())
}
