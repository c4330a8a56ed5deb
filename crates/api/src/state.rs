use std::sync::Arc;

use infra::Store;

use crate::auth::{AuthConfig, JwtService};
use crate::services::{AccountService, EnrollmentManager};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    auth_config: AuthConfig,
    jwt_service: JwtService,
    enrollment: EnrollmentManager,
    accounts: AccountService,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, auth_config: AuthConfig) -> Self {
        let jwt_service = JwtService::new(&auth_config);
        let enrollment = EnrollmentManager::new(store.clone());
        let accounts = AccountService::new(store.clone(), jwt_service.clone());

        Self {
            store,
            auth_config,
            jwt_service,
            enrollment,
            accounts,
        }
    }

    pub fn auth_config(&self) -> &AuthConfig {
        &self.auth_config
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn enrollment(&self) -> &EnrollmentManager {
        &self.enrollment
    }

    pub fn accounts(&self) -> &AccountService {
        &self.accounts
    }
}
