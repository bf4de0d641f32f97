use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use qfs_common::auth::{require_role, AuthContext, Role};
use qfs_console::link::decode_action;
use qfs_console::mounts::{self, build_file_system_summary, FileSystemSummary};
use qfs_console::{build_shared_fs_page, perform_action, SharedFsAction, SharedFsPage};

use crate::state::AppState;

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
    request_id: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    let body = ErrorResponse {
        error: ErrorDetail {
            code: code.to_string(),
            message: message.to_string(),
            request_id: format!("req_{}", Uuid::new_v4()),
        },
    };
    (status, Json(body)).into_response()
}

pub async fn healthz() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

pub async fn whoami(Extension(ctx): Extension<AuthContext>) -> impl IntoResponse {
    Json(json!({
        "principal": ctx.principal,
        "role": ctx.role.label(),
    }))
}

pub async fn shared_fs_details(
    State(st): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path((host, fs_name)): Path<(String, String)>,
) -> Response {
    if let Some(resp) = require_role(&ctx, Role::Viewer) {
        return resp;
    }
    let page = build_shared_fs_page(st.manager.as_ref(), ctx.role, &host, &fs_name).await;
    (StatusCode::OK, Json(page)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    /// Drop-down option value.
    pub option: String,
    /// Member host the action applies to.
    #[serde(default)]
    pub member: String,
}

/// Run a row action, then answer with the refreshed page.
pub async fn shared_fs_action(
    State(st): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path((host, fs_name)): Path<(String, String)>,
    Json(req): Json<ActionRequest>,
) -> Response {
    if let Some(resp) = require_role(&ctx, Role::Operator) {
        return resp;
    }

    let alert = match decode_action(&req.option) {
        Some(action) => {
            let manager = st.manager.as_ref();
            let result =
                perform_action(manager, ctx.role, &host, &fs_name, &req.member, action).await;
            Some(match result {
                Ok(report) => report.alert,
                Err(e) => {
                    tracing::error!(
                        principal=%ctx.principal,
                        error=%e,
                        "shared file system action failed"
                    );
                    e.to_alert()
                }
            })
        }
        None => None,
    };

    let mut page = build_shared_fs_page(st.manager.as_ref(), ctx.role, &host, &fs_name).await;
    if let Some(alert) = alert {
        page.alerts.insert(0, alert);
    }
    (StatusCode::OK, Json(page)).into_response()
}

/// The page a removal answers with. Deleting the whole file system, or the
/// host the console is browsing, leaves the shared page for the summary.
#[derive(Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
enum RemovalView {
    SharedFs(SharedFsPage),
    FileSystems(FileSystemSummary),
}

/// Remove `member` from the shared file system.
pub async fn remove_shared_member(
    State(st): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path((host, fs_name, member)): Path<(String, String, String)>,
) -> Response {
    if let Some(resp) = require_role(&ctx, Role::Operator) {
        return resp;
    }

    let manager = st.manager.as_ref();
    let remove = SharedFsAction::Remove;
    let alert = match perform_action(manager, ctx.role, &host, &fs_name, &member, remove).await {
        Ok(report) if report.fs_removed => {
            let mut summary = build_file_system_summary(manager, &host).await;
            summary.alerts.insert(0, report.alert);
            return (StatusCode::OK, Json(RemovalView::FileSystems(summary))).into_response();
        }
        Ok(report) => report.alert,
        Err(e) => {
            tracing::error!(
                principal=%ctx.principal,
                member=%member,
                error=%e,
                "member removal failed"
            );
            e.to_alert()
        }
    };

    let mut page = build_shared_fs_page(manager, ctx.role, &host, &fs_name).await;
    page.alerts.insert(0, alert);
    (StatusCode::OK, Json(RemovalView::SharedFs(page))).into_response()
}

pub async fn file_systems(
    State(st): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(host): Path<String>,
) -> Response {
    if let Some(resp) = require_role(&ctx, Role::Viewer) {
        return resp;
    }
    let summary = build_file_system_summary(st.manager.as_ref(), &host).await;
    (StatusCode::OK, Json(summary)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    pub path: String,
    pub fs_info: Option<String>,
}

pub async fn browse(
    State(st): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(host): Path<String>,
    Query(q): Query<BrowseQuery>,
) -> Response {
    if let Some(resp) = require_role(&ctx, Role::Viewer) {
        return resp;
    }
    if !q.path.starts_with('/') {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_path",
            "path must be absolute",
        );
    }
    let page = mounts::browse(st.manager.as_ref(), &host, &q.path, q.fs_info.as_deref()).await;
    (StatusCode::OK, Json(page)).into_response()
}
