use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio::sync::Mutex;

// ── Role ────────────────────────────────────────────────────────────

/// Console authorization level. Viewers may only look; operators may
/// mount and unmount file systems; admins may do everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Viewer,
    Operator,
    Admin,
}

impl Role {
    pub fn allows(self, required: Role) -> bool {
        self >= required
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Operator => "operator",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown role '{0}', expected viewer, operator or admin")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "viewer" => Ok(Role::Viewer),
            "operator" => Ok(Role::Operator),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

// ── AuthContext ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal: String,
    pub role: Role,
}

// ── AuthConfig ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub enabled: bool,
    pub tokens: Arc<HashMap<String, Role>>,
    pub rate_limits: Arc<Mutex<HashMap<String, RateWindow>>>,
    pub limit_per_minute: u64,
}

#[derive(Debug, Clone)]
pub struct RateWindow {
    pub window_start: Instant,
    pub count: u64,
}

impl AuthConfig {
    /// Auth switched off: every request runs as admin.
    pub fn disabled() -> Self {
        Self::from_tokens(None, 0)
    }

    /// Parse a `token:role,token:role` list. Malformed entries are skipped.
    pub fn from_tokens(raw: Option<&str>, limit_per_minute: u64) -> Self {
        let enabled = raw.is_some();
        let mut tokens = HashMap::new();

        for entry in raw.unwrap_or_default().split(',') {
            let trimmed = entry.trim();
            if trimmed.is_empty() {
                continue;
            }
            let Some((token, role_raw)) = trimmed.split_once(':') else {
                tracing::warn!(
                    entry=%trimmed,
                    "invalid QFS_AUTH_TOKENS entry, expected token:role"
                );
                continue;
            };
            match role_raw.parse::<Role>() {
                Ok(role) => {
                    tokens.insert(token.to_string(), role);
                }
                Err(e) => {
                    tracing::warn!(error=%e, "skipping QFS_AUTH_TOKENS entry");
                }
            }
        }

        AuthConfig {
            enabled,
            tokens: Arc::new(tokens),
            rate_limits: Arc::new(Mutex::new(HashMap::new())),
            limit_per_minute,
        }
    }
}

// ── Environment parsing ─────────────────────────────────────────────

pub fn parse_auth_from_env() -> AuthConfig {
    let tokens_raw = std::env::var("QFS_AUTH_TOKENS").ok();

    let limit_per_minute = std::env::var("QFS_AUTH_RATE_LIMIT_PER_MINUTE")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(120);

    if tokens_raw.is_none() {
        tracing::warn!("auth disabled: QFS_AUTH_TOKENS not set");
    }

    AuthConfig::from_tokens(tokens_raw.as_deref(), limit_per_minute)
}

// ── Middleware ───────────────────────────────────────────────────────
// Generic over any state type S that implements AsRef<AuthConfig>.

pub async fn auth_middleware<S>(
    State(state): State<S>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, std::convert::Infallible>
where
    S: AsRef<AuthConfig> + Clone + Send + Sync + 'static,
{
    let auth = state.as_ref();

    if !auth.enabled {
        req.extensions_mut().insert(AuthContext {
            principal: "guest".into(),
            role: Role::Admin,
        });
        return Ok(next.run(req).await);
    }

    let Some(token) = extract_token(&req) else {
        return Ok(error_body(StatusCode::UNAUTHORIZED, "missing token"));
    };

    let Some(role) = auth.tokens.get(&token).copied() else {
        return Ok(error_body(StatusCode::FORBIDDEN, "invalid token"));
    };

    if auth.limit_per_minute > 0 {
        let mut guard = auth.rate_limits.lock().await;
        let now = Instant::now();
        let entry = guard.entry(token.clone()).or_insert(RateWindow {
            window_start: now,
            count: 0,
        });
        if now.duration_since(entry.window_start) >= Duration::from_secs(60) {
            entry.window_start = now;
            entry.count = 0;
        }
        if entry.count >= auth.limit_per_minute {
            return Ok(error_body(StatusCode::TOO_MANY_REQUESTS, "rate limited"));
        }
        entry.count += 1;
    }

    req.extensions_mut().insert(AuthContext {
        principal: token,
        role,
    });

    Ok(next.run(req).await)
}

fn extract_token(req: &Request<Body>) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .or_else(|| {
            req.headers()
                .get("x-api-key")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
        .filter(|t| !t.is_empty())
}

/// Returns `Some(403)` when the caller lacks `required`.
pub fn require_role(ctx: &AuthContext, required: Role) -> Option<Response> {
    if ctx.role.allows(required) {
        None
    } else {
        Some(error_body(StatusCode::FORBIDDEN, "insufficient permissions"))
    }
}

fn error_body(status: StatusCode, msg: &str) -> Response {
    (status, Json(serde_json::json!({"error": {"message": msg}}))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Admin.allows(Role::Operator));
        assert!(Role::Operator.allows(Role::Viewer));
        assert!(!Role::Viewer.allows(Role::Operator));
    }

    #[test]
    fn test_from_tokens_skips_bad_entries() {
        let cfg = AuthConfig::from_tokens(Some("a:admin, b:operator,junk,c:root, "), 10);
        assert!(cfg.enabled);
        assert_eq!(cfg.tokens.len(), 2);
        assert_eq!(cfg.tokens.get("b"), Some(&Role::Operator));
    }

    #[test]
    fn test_disabled() {
        let cfg = AuthConfig::disabled();
        assert!(!cfg.enabled);
        assert!(cfg.tokens.is_empty());
    }

    #[test]
    fn test_unknown_role() {
        assert_eq!("Root".parse::<Role>(), Err(UnknownRole("root".into())));
    }
}
