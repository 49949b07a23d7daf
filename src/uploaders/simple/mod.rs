use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use tracing::debug;
use url::Url;
use crate::core::{Attachment, BlobStore, PostError, Result};

/// 简单 HTTP 存储: 每个附件一次 PUT
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    client: Client,
    endpoint: Url,
    public_base: Url,
}

impl HttpBlobStore {
    /// `public_base` 为空时公开地址与写入地址相同
    pub fn new(endpoint: &str, public_base: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let endpoint = Url::parse(endpoint)?;
        let public_base = match public_base {
            Some(base) => Url::parse(base)?,
            None => endpoint.clone(),
        };

        Ok(Self {
            client,
            endpoint,
            public_base,
        })
    }

    pub(crate) fn object_url(base: &Url, path: &str) -> Result<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| PostError::Config(format!("Cannot use {} as a base url", base)))?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));

        Ok(url)
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn store(&self, path: &str, attachment: &Attachment) -> Result<Url> {
        let target = Self::object_url(&self.endpoint, path)?;
        debug!(url = %target, size = attachment.size(), "storing blob");

        let response = self.client
            .put(target)
            .header(CONTENT_TYPE, attachment.mime.as_str())
            .body(attachment.payload.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PostError::rejected(
                status.as_u16(),
                format!("Store of {} failed: {}", path, message),
            ));
        }

        // 优先使用服务端返回的 Location
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(String::from);

        match location {
            Some(location) => Ok(self.endpoint.join(&location)?),
            None => Self::object_url(&self.public_base, path),
        }
    }
}
