mod args;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use clap::Parser;

use qfs_common::auth::{auth_middleware, parse_auth_from_env};
use qfs_common::MemberRole;
use qfs_mgmt::{HttpManager, MemoryManager, SharedFsManager};

use crate::args::Args;
use crate::handlers::{
    browse, file_systems, healthz, remove_shared_member, shared_fs_action, shared_fs_details,
    whoami,
};
use crate::state::AppState;

async fn demo_manager() -> MemoryManager {
    let mgr = MemoryManager::new();
    mgr.add_shared_fs(
        "sharefs1",
        "/qfs/sharefs1",
        &[
            ("mds1", MemberRole::MetadataServer, true),
            ("pmds1", MemberRole::PotentialMetadataServer, true),
            ("client1", MemberRole::Client, true),
            ("client2", MemberRole::Client, false),
            ("client3", MemberRole::Client, true),
        ],
    )
    .await;
    mgr.set_reachable("client3", false).await;
    mgr
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let otel = qfs_common::telemetry::init_tracing(
        "qfs-console",
        args.otlp_endpoint.as_deref(),
        args.otlp_token.as_deref(),
    );

    let manager: Arc<dyn SharedFsManager> = match &args.mgmt_url {
        Some(url) => {
            tracing::info!(url = %url, "using management daemon");
            Arc::new(HttpManager::new(url)?)
        }
        None if args.demo => {
            tracing::info!("using in-process management backend with demo data");
            Arc::new(demo_manager().await)
        }
        None => {
            tracing::warn!("QFS_MGMT_URL not set, using empty in-process management backend");
            Arc::new(MemoryManager::new())
        }
    };

    let st = AppState {
        manager,
        auth: parse_auth_from_env(),
    };

    let protected_routes = Router::new()
        .route("/whoami", get(whoami))
        .route("/hosts/:host/shared/:fs", get(shared_fs_details))
        .route("/hosts/:host/shared/:fs/actions", post(shared_fs_action))
        .route(
            "/hosts/:host/shared/:fs/members/:member",
            delete(remove_shared_member),
        )
        .route("/hosts/:host/filesystems", get(file_systems))
        .route("/hosts/:host/browse", get(browse))
        .layer(middleware::from_fn_with_state(st.clone(), auth_middleware::<AppState>))
        .with_state(st.clone());

    let api_routes = Router::new()
        .route("/healthz", get(healthz))
        .merge(protected_routes);

    let app = Router::new().nest("/api", api_routes);

    let listener = tokio::net::TcpListener::bind(&args.listen_addr).await?;
    tracing::info!(addr = %args.listen_addr, "qfs-console listening");
    axum::serve(listener, app).await?;

    if let Some(provider) = otel {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error=%e, "tracer provider shutdown failed");
        }
    }
    Ok(())
}
