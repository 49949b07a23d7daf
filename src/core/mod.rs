mod errors;
mod session;
mod traits;
mod types;

pub use errors::{PostError, Result};
pub use session::{FileSession, MemorySession, ACCESS_TOKEN_KEY, USER_ID_KEY};
pub use traits::{AccountBackend, BlobStore, PostBackend, SessionStore};
pub use types::{
    extension_for_mime,
    mime_for_name,
    Attachment,
    CreatePostBody,
    FeedScope,
    LikeOutcome,
    Post,
    PostAuthor,
    PostId,
    Preview,
    Profile,
    ProfileEdit,
    SignIn,
    SignInResponse,
    SignUp,
    SubmissionOutcome,
    SubmissionRequest,
    UploadResult,
};
