use std::sync::Arc;
use tracing::info;
use crate::core::{Attachment, BlobStore, PostBackend, Result, SessionStore};
use super::coordinator::UploadCoordinator;
use super::sequencer::{DispatchHandle, SubmissionSequencer};
use super::store::SubmissionStore;

/// 发布入口: 上传 -> 汇总地址 -> 派发创建请求
#[derive(Clone)]
pub struct PostPublisher {
    coordinator: UploadCoordinator,
    sequencer: SubmissionSequencer,
    store: SubmissionStore,
}

impl PostPublisher {
    pub fn new(
        blob_store: Arc<dyn BlobStore>,
        backend: Arc<dyn PostBackend>,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        let store = SubmissionStore::new();

        Self {
            coordinator: UploadCoordinator::new(blob_store),
            sequencer: SubmissionSequencer::new(backend, session, store.clone()),
            store,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.coordinator = self.coordinator.with_prefix(prefix);
        self
    }

    pub fn store(&self) -> &SubmissionStore {
        &self.store
    }

    /// Upload all attachments, then dispatch one create request.
    ///
    /// Returns once the request is dispatched. An upload failure is written to
    /// the store and returned, and no request is sent.
    pub async fn publish(&self, attachments: Vec<Attachment>, caption: &str) -> Result<DispatchHandle> {
        let submission = self.store.begin();
        info!(submission, attachments = attachments.len(), "publishing post");

        let uploads = match self.coordinator.upload_all(&attachments).await {
            Ok(uploads) => uploads,
            Err(err) => {
                self.store.reject(submission, &err);
                return Err(err);
            }
        };
        drop(attachments);

        let request = self.sequencer.build_request(caption, &uploads);
        Ok(self.sequencer.dispatch(submission, request))
    }
}
