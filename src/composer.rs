//! Draft state of the "create post" dialog.

use crate::core::{Attachment, Preview};
use crate::publish::Observation;

/// 创建帖子的三个步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// 选择文件
    Select,
    /// 预览/裁剪
    Preview,
    /// 填写文案
    Caption,
}

impl Step {
    pub fn value(&self) -> u8 {
        match self {
            Step::Select => 1,
            Step::Preview => 2,
            Step::Caption => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Step::Select | Step::Caption => "Create new post",
            Step::Preview => "Crop",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Composer {
    step: Step,
    attachments: Vec<Attachment>,
    previews: Vec<Preview>,
    caption: String,
    emoji_picker_open: bool,
    loading: bool,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

impl Composer {
    pub fn new() -> Self {
        Self {
            step: Step::Select,
            attachments: Vec::new(),
            previews: Vec::new(),
            caption: String::new(),
            emoji_picker_open: false,
            loading: false,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn previews(&self) -> &[Preview] {
        &self.previews
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// 多于一张时才显示轮播指示器
    pub fn show_indicators(&self) -> bool {
        self.previews.len() > 1
    }

    /// Replace the selection and jump to the preview step.
    pub fn select_files(&mut self, attachments: Vec<Attachment>) {
        self.previews = attachments.iter().map(Preview::of).collect();
        self.attachments = attachments;
        self.step = Step::Preview;
    }

    pub fn can_go_next(&self) -> bool {
        self.step == Step::Preview
    }

    pub fn can_go_previous(&self) -> bool {
        self.step != Step::Select
    }

    pub fn next(&mut self) -> Step {
        if self.can_go_next() {
            self.step = Step::Caption;
        }
        self.step
    }

    pub fn previous(&mut self) -> Step {
        self.step = match self.step {
            Step::Select | Step::Preview => Step::Select,
            Step::Caption => Step::Preview,
        };
        self.step
    }

    pub fn set_caption(&mut self, caption: impl Into<String>) {
        self.caption = caption.into();
    }

    pub fn toggle_emoji_picker(&mut self) -> bool {
        self.emoji_picker_open = !self.emoji_picker_open;
        self.emoji_picker_open
    }

    pub fn emoji_picker_open(&self) -> bool {
        self.emoji_picker_open
    }

    /// 追加表情并收起选择器
    pub fn push_emoji(&mut self, emoji: &str) {
        self.caption.push_str(emoji);
        self.emoji_picker_open = false;
    }

    /// 由 watcher 的事件驱动 loading, 发布中不能重复提交
    pub fn observe(&mut self, observation: &Observation) {
        match observation {
            Observation::Started { .. } => self.loading = true,
            Observation::Completed { .. } | Observation::Failed { .. } => self.loading = false,
            Observation::Unchanged | Observation::Stale { .. } => {}
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn can_post(&self) -> bool {
        self.step == Step::Caption && !self.loading
    }

    /// Hand the attachments and caption over to the publisher.
    /// Previews stay with the draft for display until it is dropped.
    pub fn take_submission(&mut self) -> (Vec<Attachment>, String) {
        (std::mem::take(&mut self.attachments), self.caption.clone())
    }
}
