use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use crate::core::{
    PostBackend,
    PostError,
    Result,
    SessionStore,
    SubmissionOutcome,
    SubmissionRequest,
    UploadResult,
    ACCESS_TOKEN_KEY,
};
use super::store::SubmissionStore;

/// 已派发的创建请求
pub struct DispatchHandle {
    pub submission: u64,
    join_handle: JoinHandle<Result<SubmissionOutcome>>,
}

impl DispatchHandle {
    /// 等待后端响应. 完成副作用由 watcher 负责, 这里只拿结果
    pub async fn wait(self) -> Result<SubmissionOutcome> {
        self.join_handle
            .await
            .map_err(|err| PostError::internal_error(format!("Dispatch task failed: {}", err)))?
    }
}

/// 组装并派发创建帖子的请求
#[derive(Clone)]
pub struct SubmissionSequencer {
    backend: Arc<dyn PostBackend>,
    session: Arc<dyn SessionStore>,
    store: SubmissionStore,
}

impl SubmissionSequencer {
    pub fn new(backend: Arc<dyn PostBackend>, session: Arc<dyn SessionStore>, store: SubmissionStore) -> Self {
        Self {
            backend,
            session,
            store,
        }
    }

    pub fn build_request(&self, caption: &str, uploads: &[UploadResult]) -> SubmissionRequest {
        let token = self.session.get(ACCESS_TOKEN_KEY);
        if token.is_none() {
            warn!("no access token in session, sending unauthenticated request");
        }
        SubmissionRequest::new(caption, uploads, token)
    }

    /// Send exactly one create request and publish its outcome to the store.
    pub fn dispatch(&self, submission: u64, request: SubmissionRequest) -> DispatchHandle {
        let backend = self.backend.clone();
        let store = self.store.clone();

        info!(submission, files = request.files().len(), "dispatching post");
        let join_handle = tokio::spawn(async move {
            let result = backend
                .create_post(request.auth_token(), request.body())
                .await
                .and_then(|outcome| {
                    if outcome.post_id.is_empty() {
                        Err(PostError::internal_error("Backend returned an empty post id"))
                    } else {
                        Ok(outcome)
                    }
                });

            match &result {
                Ok(outcome) => {
                    store.fulfill(submission, outcome.clone());
                }
                Err(err) => {
                    warn!(submission, %err, "post rejected");
                    store.reject(submission, err);
                }
            }

            result
        });

        DispatchHandle {
            submission,
            join_handle,
        }
    }
}
