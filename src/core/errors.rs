use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostError {
    #[error("Attachment read error: {0}")]
    AttachmentRead(#[from] std::io::Error),

    /// 单个附件上传失败
    #[error("Upload of '{name}' (#{index}) failed: {source}")]
    Upload {
        index: usize,
        name: String,
        #[source]
        source: Box<PostError>,
    },

    /// 批量上传中任意一个失败, 整批作废
    #[error("Upload batch aborted: {0}")]
    AggregateUpload(#[source] Box<PostError>),

    /// 后端返回错误
    #[error("Rejected by server: status code {status_code}, message: {message}")]
    Rejected {
        status_code: u16,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PostError {
    pub fn upload(index: usize, name: impl Into<String>, source: PostError) -> Self {
        Self::Upload {
            index,
            name: name.into(),
            source: Box::new(source),
        }
    }

    pub fn rejected(status_code: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status_code,
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_aggregate_upload(&self) -> bool {
        matches!(self, Self::AggregateUpload(_))
    }

    /// 给 UI 层展示的可恢复错误文案
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::AggregateUpload(_) | Self::Upload { .. } | Self::AttachmentRead(_) => {
                "Could not upload your photos, please try again"
            }
            _ => "Could not publish post",
        }
    }
}

/// Error alias
pub type Result<T, E = PostError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;
    use super::*;

    #[test]
    fn test_aggregate_wraps_first_failure() {
        let inner = PostError::upload(1, "b.png", PostError::rejected(503, "unavailable"));
        let err = PostError::AggregateUpload(Box::new(inner));

        assert!(err.is_aggregate_upload());
        assert_eq!(
            err.to_string(),
            "Upload batch aborted: Upload of 'b.png' (#1) failed: \
             Rejected by server: status code 503, message: unavailable"
        );
        assert_eq!(err.user_message(), "Could not upload your photos, please try again");
    }

    #[test]
    fn test_rejected_message() {
        let err = PostError::rejected(401, "jwt malformed");
        assert!(!err.is_aggregate_upload());
        assert_eq!(err.user_message(), "Could not publish post");
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn test_upload_keeps_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
        let err = PostError::AggregateUpload(Box::new(PostError::upload(0, "a.png", io.into())));

        let upload = err.source().unwrap();
        assert!(upload.to_string().starts_with("Upload of 'a.png' (#0) failed"));

        let cause = upload.source().unwrap();
        assert_eq!(cause.to_string(), "Attachment read error: connection reset");
        assert_eq!(
            cause.source().unwrap().downcast_ref::<std::io::Error>().unwrap().kind(),
            std::io::ErrorKind::ConnectionReset
        );
    }
}
