mod coordinator;
mod publisher;
mod sequencer;
mod store;
mod watcher;

pub use coordinator::{UploadCoordinator, DEFAULT_PREFIX};
pub use publisher::PostPublisher;
pub use sequencer::{DispatchHandle, SubmissionSequencer};
pub use store::{SubmissionSnapshot, SubmissionStore};
pub use watcher::{
    CompletionEffects,
    CompletionWatcher,
    Observation,
    Viewer,
    WatchState,
    WatcherHandle,
};
