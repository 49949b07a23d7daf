use std::sync::Arc;
use tracing::{info, warn};
use crate::core::{
    AccountBackend,
    Profile,
    ProfileEdit,
    Result,
    SessionStore,
    SignIn,
    SignUp,
    ACCESS_TOKEN_KEY,
    USER_ID_KEY,
};

/// 账号相关动作, 负责把登录结果写入会话
#[derive(Clone)]
pub struct AccountActions {
    backend: Arc<dyn AccountBackend>,
    session: Arc<dyn SessionStore>,
}

impl AccountActions {
    pub fn new(backend: Arc<dyn AccountBackend>, session: Arc<dyn SessionStore>) -> Self {
        Self { backend, session }
    }

    pub async fn sign_up(&self, payload: &SignUp) -> Result<Profile> {
        self.backend.sign_up(payload).await
    }

    /// Sign in and remember the token and user id for later requests.
    pub async fn sign_in(&self, payload: &SignIn) -> Result<Profile> {
        let response = self.backend.sign_in(payload).await?;

        self.session.set(ACCESS_TOKEN_KEY, &response.access_token)?;
        if let Some(user_id) = &response.user_id {
            self.session.set(USER_ID_KEY, user_id)?;
        }
        info!(email = %payload.email, "signed in");

        Ok(Profile {
            user_id: response.user_id,
            username: response.username.unwrap_or_default(),
            email: Some(payload.email.clone()),
            ..Default::default()
        })
    }

    /// 清空会话, 总是成功
    pub fn sign_out(&self) -> bool {
        if let Err(err) = self.session.clear() {
            warn!(%err, "failed to clear session");
        }
        true
    }

    pub async fn get_profile(&self, username: &str) -> Result<Profile> {
        self.backend.get_profile(username).await
    }

    pub async fn edit_profile(&self, edit: &ProfileEdit) -> Result<Profile> {
        let token = self.session.get(ACCESS_TOKEN_KEY);
        self.backend.edit_profile(token.as_deref(), edit).await
    }
}
