use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;
use crate::core::{PostError, PostId, SubmissionOutcome};

/// 共享的发布状态快照
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionSnapshot {
    /// 发布序号, 每次点击发布递增
    pub submission: u64,
    /// 是否有发布在进行中
    pub publishing: bool,
    /// 最近一次创建成功的帖子 id
    pub post_id: Option<PostId>,
    /// 最近一次失败的错误信息
    pub error: Option<String>,
    /// post_id / error 所属的发布序号
    pub outcome_submission: u64,
}

/// Observable submission state. The publish pipeline writes, watchers subscribe.
#[derive(Debug, Clone)]
pub struct SubmissionStore {
    state_tx: Arc<watch::Sender<SubmissionSnapshot>>,
}

impl Default for SubmissionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionStore {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(SubmissionSnapshot::default());
        Self {
            state_tx: Arc::new(state_tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionSnapshot> {
        self.state_tx.subscribe()
    }

    pub fn snapshot(&self) -> SubmissionSnapshot {
        self.state_tx.borrow().clone()
    }

    /// 开始一次新的发布, 返回发布序号
    pub fn begin(&self) -> u64 {
        let mut submission = 0;
        self.state_tx.send_modify(|state| {
            state.submission += 1;
            state.publishing = true;
            state.error = None;
            submission = state.submission;
        });
        debug!(submission, "submission started");
        submission
    }

    pub fn fulfill(&self, submission: u64, outcome: SubmissionOutcome) -> bool {
        self.state_tx.send_if_modified(|state| {
            if state.submission != submission {
                return false;
            }
            state.publishing = false;
            state.post_id = Some(outcome.post_id);
            state.error = None;
            state.outcome_submission = submission;
            true
        })
    }

    pub fn reject(&self, submission: u64, error: &PostError) -> bool {
        let message = error.to_string();
        self.state_tx.send_if_modified(|state| {
            if state.submission != submission {
                return false;
            }
            state.publishing = false;
            state.error = Some(message);
            state.outcome_submission = submission;
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_clears_error_but_keeps_last_post() {
        let store = SubmissionStore::new();
        let first = store.begin();
        assert!(store.fulfill(first, SubmissionOutcome { post_id: PostId::new("p1") }));

        let second = store.begin();
        assert!(store.reject(second, &PostError::rejected(500, "boom")));
        let third = store.begin();

        let snapshot = store.snapshot();
        assert_eq!(third, 3);
        assert!(snapshot.publishing);
        assert!(snapshot.error.is_none());
        assert_eq!(snapshot.post_id, Some(PostId::new("p1")));
    }

    #[test]
    fn test_outdated_submission_is_ignored() {
        let store = SubmissionStore::new();
        let first = store.begin();
        let _second = store.begin();

        assert!(!store.fulfill(first, SubmissionOutcome { post_id: PostId::new("late") }));
        assert!(store.snapshot().post_id.is_none());
        assert!(store.snapshot().publishing);
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let store = SubmissionStore::new();
        let mut rx = store.subscribe();

        let submission = store.begin();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().publishing);

        store.fulfill(submission, SubmissionOutcome { post_id: PostId::new("p9") });
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().post_id, Some(PostId::new("p9")));
        assert_eq!(rx.borrow().outcome_submission, submission);
    }

    #[test]
    fn test_outcome_keeps_its_submission() {
        let store = SubmissionStore::new();
        let first = store.begin();
        store.fulfill(first, SubmissionOutcome { post_id: PostId::new("p1") });
        let second = store.begin();

        // 新一轮开始后 post_id 仍属于上一轮
        let snapshot = store.snapshot();
        assert_eq!(snapshot.submission, second);
        assert_eq!(snapshot.outcome_submission, first);

        store.reject(second, &PostError::rejected(500, "boom"));
        assert_eq!(store.snapshot().outcome_submission, second);
    }
}
