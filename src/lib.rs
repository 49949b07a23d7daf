pub mod core;
pub mod api;
pub mod uploaders;
pub mod publish;
pub mod composer;
pub mod detail;
pub mod config;

// 重新导出核心类型
pub use crate::core::{
    Attachment,
    PostError,
    PostId,
    Result,
    SubmissionOutcome,
    SubmissionRequest,
    UploadResult,
};

pub use publish::{
    CompletionEffects,
    CompletionWatcher,
    PostPublisher,
    SubmissionStore,
    UploadCoordinator,
    Viewer,
};
