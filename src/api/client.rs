use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;
use crate::core::{
    AccountBackend,
    CreatePostBody,
    FeedScope,
    LikeOutcome,
    Post,
    PostBackend,
    PostError,
    PostId,
    Profile,
    ProfileEdit,
    Result,
    SignIn,
    SignInResponse,
    SignUp,
    SubmissionOutcome,
};

/// 后端错误体, 形如 `{"error": "..."}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: serde_json::Value,
}

/// REST 后端客户端
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    fn build_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| PostError::Config(format!("Cannot use {} as a base url", self.base_url)))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    fn request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        let request = self.client.request(method, url);
        // 没有 token 时照常发送, 由服务端拒绝
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(ErrorBody { error: serde_json::Value::String(message) }) => message,
                Ok(ErrorBody { error }) => error.to_string(),
                Err(_) if text.is_empty() => format!("Request failed with status {}", status),
                Err(_) => text,
            };
            warn!(status = status.as_u16(), %message, "backend rejected request");
            return Err(PostError::rejected(status.as_u16(), message));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl PostBackend for HttpBackend {
    async fn create_post(&self, token: Option<&str>, body: &CreatePostBody) -> Result<SubmissionOutcome> {
        let url = self.build_url(&["posts"])?;
        debug!(%url, files = body.files.len(), "create post");

        let response = self.request(Method::POST, url, token)
            .json(body)
            .send()
            .await?;

        Self::read_json(response).await
    }

    async fn list_posts(&self, token: Option<&str>, scope: &FeedScope) -> Result<Vec<Post>> {
        let url = self.build_url(&["posts"])?;

        let response = self.request(Method::GET, url, token)
            .query(&[("username", scope.as_query())])
            .send()
            .await?;

        Self::read_json(response).await
    }

    async fn toggle_like(&self, token: Option<&str>, post_id: &PostId) -> Result<LikeOutcome> {
        let url = self.build_url(&["posts", post_id.as_str(), "like"])?;

        let response = self.request(Method::PUT, url, token)
            .send()
            .await?;

        Self::read_json(response).await
    }
}

#[async_trait]
impl AccountBackend for HttpBackend {
    async fn sign_up(&self, payload: &SignUp) -> Result<Profile> {
        let url = self.build_url(&["users", "signup"])?;
        let response = self.request(Method::POST, url, None)
            .json(payload)
            .send()
            .await?;

        Self::read_json(response).await
    }

    async fn sign_in(&self, payload: &SignIn) -> Result<SignInResponse> {
        let url = self.build_url(&["users", "signin"])?;
        let response = self.request(Method::POST, url, None)
            .json(payload)
            .send()
            .await?;

        Self::read_json(response).await
    }

    async fn get_profile(&self, username: &str) -> Result<Profile> {
        let url = self.build_url(&["users", username])?;
        let response = self.request(Method::GET, url, None)
            .send()
            .await?;

        Self::read_json(response).await
    }

    async fn edit_profile(&self, token: Option<&str>, edit: &ProfileEdit) -> Result<Profile> {
        let url = self.build_url(&["users", "profile"])?;
        let response = self.request(Method::PUT, url, token)
            .json(edit)
            .send()
            .await?;

        Self::read_json(response).await
    }
}
