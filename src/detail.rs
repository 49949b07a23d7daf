//! Like/comment state of an opened post.

use tracing::debug;
use crate::core::{LikeOutcome, Post, PostBackend, Result, SessionStore, ACCESS_TOKEN_KEY};

#[derive(Debug, Clone)]
pub struct PostDetail {
    post: Post,
    liked: bool,
    last_like: Option<LikeOutcome>,
    comment: String,
    emoji_picker_open: bool,
}

impl PostDetail {
    /// `viewer_id` 在点赞列表里时初始为已点赞
    pub fn new(post: Post, viewer_id: Option<&str>) -> Self {
        let liked = viewer_id
            .map(|id| post.likes.iter().any(|like| like == id))
            .unwrap_or(false);

        Self {
            post,
            liked,
            last_like: None,
            comment: String::new(),
            emoji_picker_open: false,
        }
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    pub fn is_liked(&self) -> bool {
        self.liked
    }

    /// 最近一次点赞响应属于本帖且不为空时优先使用
    pub fn likes(&self) -> &[String] {
        match &self.last_like {
            Some(outcome) if outcome.post_id == self.post.post_id && !outcome.likes.is_empty() => &outcome.likes,
            _ => &self.post.likes,
        }
    }

    pub fn like_count(&self) -> usize {
        self.likes().len()
    }

    /// Record a like response, possibly for another post.
    pub fn apply_like(&mut self, outcome: LikeOutcome) {
        self.last_like = Some(outcome);
    }

    pub async fn toggle_like(&mut self, backend: &dyn PostBackend, session: &dyn SessionStore) -> Result<()> {
        self.liked = !self.liked;
        let token = session.get(ACCESS_TOKEN_KEY);

        match backend.toggle_like(token.as_deref(), &self.post.post_id).await {
            Ok(outcome) => {
                debug!(post_id = %outcome.post_id, likes = outcome.likes.len(), "like toggled");
                self.apply_like(outcome);
                Ok(())
            }
            Err(err) => {
                self.liked = !self.liked;
                Err(err)
            }
        }
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    pub fn toggle_emoji_picker(&mut self) -> bool {
        self.emoji_picker_open = !self.emoji_picker_open;
        self.emoji_picker_open
    }

    pub fn push_emoji(&mut self, emoji: &str) {
        self.comment.push_str(emoji);
        self.emoji_picker_open = false;
    }
}
