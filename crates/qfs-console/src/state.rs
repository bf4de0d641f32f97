use std::sync::Arc;

use qfs_common::auth::AuthConfig;
use qfs_mgmt::SharedFsManager;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<dyn SharedFsManager>,
    pub auth: AuthConfig,
}

impl AsRef<AuthConfig> for AppState {
    fn as_ref(&self) -> &AuthConfig {
        &self.auth
    }
}
