use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::{PanelError, PanelResult};
use crate::http::ApiClient;
use crate::schemas::{FormValues, LoginRequest, LoginSchema, Schema};
use crate::stores::UserProfile;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

#[derive(Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Validate credentials locally, exchange them for a token and persist the session
    pub async fn login(&self, values: &FormValues) -> PanelResult<LoginResponse> {
        let request: LoginRequest = LoginSchema::validate_create(values)?;
        let response: LoginResponse = self
            .client
            .post("/auth/login", &request)
            .await
            .map_err(PanelError::Api)?;

        self.client
            .session()
            .set_session(response.token.clone(), response.user.clone())
            .await?;
        info!("Logged in as {}", request.username);
        Ok(response)
    }

    pub async fn logout(&self) -> PanelResult<()> {
        if !self.client.session().is_authenticated().await {
            warn!("Logout requested without an active session");
        }
        self.client.session().clear().await?;
        Ok(())
    }
}
