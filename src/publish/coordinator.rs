use std::sync::Arc;
use futures::future::try_join_all;
use tracing::{debug, info, warn};
use crate::core::{Attachment, BlobStore, PostError, Result, UploadResult};

pub const DEFAULT_PREFIX: &str = "files/";

/// 并发上传所有附件, 任一失败则整批失败
#[derive(Clone)]
pub struct UploadCoordinator {
    store: Arc<dyn BlobStore>,
    prefix: String,
}

impl UploadCoordinator {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn path_for(&self, attachment: &Attachment) -> String {
        format!("{}{}", self.prefix, attachment.name)
    }

    /// Upload every attachment concurrently. Results keep the input order.
    pub async fn upload_all(&self, attachments: &[Attachment]) -> Result<Vec<UploadResult>> {
        let total_bytes: u64 = attachments.iter().map(Attachment::size).sum();
        info!(count = attachments.len(), total_bytes, "uploading attachments");

        let uploads = attachments
            .iter()
            .enumerate()
            .map(|(index, attachment)| self.upload_one(index, attachment));

        try_join_all(uploads).await.map_err(|err| {
            warn!(%err, "upload batch aborted");
            PostError::AggregateUpload(Box::new(err))
        })
    }

    async fn upload_one(&self, index: usize, attachment: &Attachment) -> Result<UploadResult> {
        let path = self.path_for(attachment);
        let url = self.store
            .store(&path, attachment)
            .await
            .map_err(|err| PostError::upload(index, &attachment.name, err))?;
        debug!(index, %url, "attachment stored");

        Ok(UploadResult {
            name: attachment.name.clone(),
            url,
        })
    }
}
