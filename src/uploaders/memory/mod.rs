use std::collections::HashMap;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use url::Url;
use crate::core::{Attachment, BlobStore, Result};
use super::simple::HttpBlobStore;

/// 内存存储, 用于本地调试和测试
#[derive(Debug)]
pub struct MemoryBlobStore {
    public_base: Url,
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl MemoryBlobStore {
    pub fn new(public_base: &str) -> Result<Self> {
        Ok(Self {
            public_base: Url::parse(public_base)?,
            blobs: RwLock::new(HashMap::new()),
        })
    }

    pub async fn get(&self, path: &str) -> Option<Bytes> {
        self.blobs.read().await.get(path).cloned()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(&self, path: &str, attachment: &Attachment) -> Result<Url> {
        // 同名覆盖
        self.blobs
            .write()
            .await
            .insert(path.to_string(), attachment.payload.clone());

        HttpBlobStore::object_url(&self.public_base, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_path_last_write_wins() {
        let store = MemoryBlobStore::new("https://cdn.test/").unwrap();
        let first = Attachment::new("a.png", "image/png", vec![1u8]);
        let second = Attachment::new("a.png", "image/png", vec![2u8, 2]);

        let url_a = store.store("files/a.png", &first).await.unwrap();
        let url_b = store.store("files/a.png", &second).await.unwrap();

        assert_eq!(url_a, url_b);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("files/a.png").await.unwrap().as_ref(), &[2u8, 2]);
    }
}
