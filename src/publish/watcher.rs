use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use crate::core::{FeedScope, PostError, PostId, Result};
use super::store::SubmissionSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// 尚未发布
    Idle,
    /// 请求已发出, 等待帖子 id
    Submitting,
    /// 收到新的帖子 id, 即将收尾
    Completed,
    /// 本次发布已结束(成功或失败)
    Settled,
}

/// 每次状态更新的判定结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Unchanged,
    Started {
        submission: u64,
    },
    Completed {
        post_id: PostId,
    },
    Failed {
        error: String,
    },
    /// 非发布中收到的帖子 id, 忽略
    Stale {
        post_id: PostId,
    },
}

/// 当前登录用户以及正在浏览的主页
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub username: String,
    pub viewed_profile: Option<String>,
}

impl Viewer {
    /// 正在看自己的主页时只刷新自己的帖子, 否则刷新全部
    pub fn refresh_scope(&self) -> FeedScope {
        match &self.viewed_profile {
            Some(profile) if *profile == self.username => FeedScope::Profile(self.username.clone()),
            _ => FeedScope::All,
        }
    }
}

/// 发布结束后对 UI 的副作用
#[async_trait]
pub trait CompletionEffects: Send + Sync {
    async fn close_dialog(&self);

    async fn refresh_feed(&self, scope: FeedScope);

    /// 发布失败, 对话框保持打开
    async fn report_failure(&self, message: &str);
}

/// Reacts to submission snapshots and fires completion effects once per submission.
#[derive(Debug)]
pub struct CompletionWatcher {
    state: WatchState,
    tracked_submission: u64,
    last_post_id: Option<PostId>,
    loading: bool,
}

impl Default for CompletionWatcher {
    fn default() -> Self {
        Self::from_snapshot(&SubmissionSnapshot::default())
    }
}

impl CompletionWatcher {
    /// 以当前快照为基线, 之前的发布和帖子 id 都不会触发完成
    pub fn from_snapshot(snapshot: &SubmissionSnapshot) -> Self {
        Self {
            state: WatchState::Idle,
            tracked_submission: snapshot.submission,
            last_post_id: snapshot.post_id.clone(),
            loading: false,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn observe(&mut self, snapshot: &SubmissionSnapshot) -> Observation {
        let mut started = false;
        if snapshot.submission > self.tracked_submission {
            self.tracked_submission = snapshot.submission;
            self.state = WatchState::Submitting;
            self.loading = true;
            started = true;
            debug!(submission = snapshot.submission, "watcher -> Submitting");
        }

        let fresh_post_id = snapshot
            .post_id
            .as_ref()
            .filter(|id| !id.is_empty() && self.last_post_id.as_ref() != Some(*id))
            .cloned();
        if let Some(post_id) = &fresh_post_id {
            self.last_post_id = Some(post_id.clone());
        }

        // 合并的快照里可能还是上一轮的结果
        let outcome_is_current = snapshot.outcome_submission == self.tracked_submission;

        if self.state == WatchState::Submitting {
            if !outcome_is_current {
                if let Some(post_id) = &fresh_post_id {
                    debug!(%post_id, submission = snapshot.outcome_submission, "post id belongs to an earlier submission");
                }
            } else if let Some(error) = &snapshot.error {
                // 出错时不能进入 Completed
                self.state = WatchState::Settled;
                self.loading = false;
                return Observation::Failed { error: error.clone() };
            } else if let Some(post_id) = fresh_post_id {
                self.state = WatchState::Completed;
                return Observation::Completed { post_id };
            }
        } else if let Some(post_id) = fresh_post_id {
            debug!(%post_id, state = ?self.state, "ignoring stale post id");
            return Observation::Stale { post_id };
        }

        if started {
            Observation::Started { submission: snapshot.submission }
        } else {
            Observation::Unchanged
        }
    }

    /// Completed -> Settled
    pub fn settle(&mut self) {
        if self.state == WatchState::Completed {
            self.state = WatchState::Settled;
            self.loading = false;
        }
    }

    /// Run the watcher until the store is dropped.
    pub fn spawn(
        mut state_rx: watch::Receiver<SubmissionSnapshot>,
        viewer: Viewer,
        effects: Arc<dyn CompletionEffects>,
    ) -> WatcherHandle {
        // 最大缓存 64 个事件
        let (event_tx, _) = broadcast::channel(64);
        let mut watcher = Self::from_snapshot(&state_rx.borrow_and_update());

        let join_handle = tokio::spawn({
            let event_tx = event_tx.clone();
            async move {
                while state_rx.changed().await.is_ok() {
                    let snapshot = state_rx.borrow_and_update().clone();
                    let observation = watcher.observe(&snapshot);

                    match &observation {
                        Observation::Unchanged | Observation::Stale { .. } => continue,
                        Observation::Started { .. } => {}
                        Observation::Completed { post_id } => {
                            watcher.settle();
                            info!(%post_id, "post published");
                            effects.close_dialog().await;
                            effects.refresh_feed(viewer.refresh_scope()).await;
                        }
                        Observation::Failed { error } => {
                            warn!(%error, "publish failed");
                            effects.report_failure(error).await;
                        }
                    }

                    let _ = event_tx.send(observation);
                }
                debug!("submission store closed, watcher exiting");
            }
        });

        WatcherHandle {
            event_tx,
            join_handle,
        }
    }
}

pub struct WatcherHandle {
    event_tx: broadcast::Sender<Observation>,
    join_handle: JoinHandle<()>,
}

impl WatcherHandle {
    /// 订阅事件, 只会收到 Started/Completed/Failed
    pub fn subscribe(&self) -> broadcast::Receiver<Observation> {
        self.event_tx.subscribe()
    }

    /// Wait for the watcher to exit. It exits once every store handle is dropped.
    pub async fn join(self) -> Result<()> {
        self.join_handle
            .await
            .map_err(|err| PostError::internal_error(format!("Watcher panic: {}", err)))
    }

    pub fn abort(&self) {
        self.join_handle.abort();
    }
}
