use async_trait::async_trait;
use url::Url;
use super::errors::Result;
use super::types::{
    Attachment,
    CreatePostBody,
    FeedScope,
    LikeOutcome,
    Post,
    PostId,
    Profile,
    ProfileEdit,
    SignIn,
    SignInResponse,
    SignUp,
    SubmissionOutcome,
};

/// 二进制存储 - 按路径写入并返回可公开访问的地址
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// 写入一个附件, 同名路径后写覆盖先写
    async fn store(&self, path: &str, attachment: &Attachment) -> Result<Url>;
}

/// 帖子相关的后端接口
#[async_trait]
pub trait PostBackend: Send + Sync {
    /// 创建帖子, 非幂等
    async fn create_post(&self, token: Option<&str>, body: &CreatePostBody) -> Result<SubmissionOutcome>;

    /// 拉取动态流
    async fn list_posts(&self, token: Option<&str>, scope: &FeedScope) -> Result<Vec<Post>>;

    /// 点赞/取消点赞
    async fn toggle_like(&self, token: Option<&str>, post_id: &PostId) -> Result<LikeOutcome>;
}

/// 账号与资料接口
#[async_trait]
pub trait AccountBackend: Send + Sync {
    async fn sign_up(&self, payload: &SignUp) -> Result<Profile>;

    async fn sign_in(&self, payload: &SignIn) -> Result<SignInResponse>;

    async fn get_profile(&self, username: &str) -> Result<Profile>;

    async fn edit_profile(&self, token: Option<&str>, edit: &ProfileEdit) -> Result<Profile>;
}

/// 本地会话存储, 保存 token 和当前用户 id
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    fn clear(&self) -> Result<()>;
}
