use std::path::Path;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;
use super::errors::Result;

/// 帖子唯一标识(由后端生成)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 用户选择的待上传文件
#[derive(Debug, Clone)]
pub struct Attachment {
    /// 显示名称, 同时作为存储路径的一部分
    pub name: String,
    /// MIME 类型
    pub mime: String,
    /// 文件内容
    pub payload: Bytes,
}

impl Attachment {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            payload: payload.into(),
        }
    }

    /// Read an attachment from disk, guessing the MIME type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("Can't read file name of {}", path.display()),
                )
            })?
            .to_string();
        let payload = tokio::fs::read(path).await?;
        let mime = mime_for_name(&name).to_string();

        Ok(Self::new(name, mime, payload))
    }

    pub fn size(&self) -> u64 {
        self.payload.len() as u64
    }

    /// 由 MIME 类型推出的扩展名
    pub fn extension(&self) -> Option<&'static str> {
        extension_for_mime(&self.mime)
    }
}

/// Local display handle for an attachment. Never leaves the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub url: String,
}

impl Preview {
    pub fn of(attachment: &Attachment) -> Self {
        Self {
            url: format!("preview://{}/{}", Uuid::new_v4(), attachment.name),
        }
    }
}

/// 单个附件上传后的公开地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub name: String,
    pub url: Url,
}

/// 创建帖子的请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePostBody {
    pub caption: String,
    pub files: Vec<String>,
}

/// 一次发布请求, 构建后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    body: CreatePostBody,
    auth_token: Option<String>,
}

impl SubmissionRequest {
    pub fn new(caption: impl Into<String>, uploads: &[UploadResult], auth_token: Option<String>) -> Self {
        Self {
            body: CreatePostBody {
                caption: caption.into(),
                files: uploads.iter().map(|upload| upload.url.to_string()).collect(),
            },
            auth_token,
        }
    }

    pub fn body(&self) -> &CreatePostBody {
        &self.body
    }

    pub fn caption(&self) -> &str {
        &self.body.caption
    }

    pub fn files(&self) -> &[String] {
        &self.body.files
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub post_id: PostId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostAuthor {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub post_id: PostId,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(rename = "User", default)]
    pub user: PostAuthor,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeOutcome {
    pub post_id: PostId,
    #[serde(default)]
    pub likes: Vec<String>,
}

/// 刷新动态流的范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedScope {
    /// 所有帖子
    All,
    /// 指定用户的帖子
    Profile(String),
}

impl FeedScope {
    pub fn as_query(&self) -> &str {
        match self {
            FeedScope::All => "",
            FeedScope::Profile(username) => username,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub user_id: Option<String>,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignUp {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignIn {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub access_token: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// 编辑资料时允许修改的字段, 未设置的字段不发送
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "video/mp4" => Some("mp4"),
        _ => None,
    }
}

pub fn mime_for_name(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}
