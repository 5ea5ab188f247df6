use crate::{
    api::{ApiError, NewPost, Post},
    pages::{
        PageView,
        markup::{Head, escape},
    },
};

pub const TITLE_INPUT_ID: &str = "post-title";
pub const EDITOR_ID: &str = "post-editor";
pub const PUBLISH_ACTION: &str = "publish";
pub const CANCEL_ACTION: &str = "cancel";

/// The post editor. All state is local until the post is published.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewPostPage {
    title: String,
    content: String,
    submitting: bool,
}

impl NewPostPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Stores the editor's HTML.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Starts a submission and returns the request to send.
    ///
    /// Returns `None` while a previous submission is still in flight.
    pub fn begin_submit(&mut self) -> Option<NewPost> {
        if self.submitting {
            return None;
        }
        self.submitting = true;
        Some(NewPost::from_draft(&self.title, &self.content))
    }

    /// Ends the submission. The fields are kept on failure so the user can retry.
    pub fn finish_submit(&mut self, result: Result<Post, ApiError>) -> Option<Post> {
        self.submitting = false;
        match result {
            Ok(post) => Some(post),
            Err(e) => {
                log::error!("Failed to create post: {}", e);
                None
            }
        }
    }
}

impl PageView for NewPostPage {
    fn head(&self) -> Head {
        Head::titled("创建新文章 - 博客系统").name("description", "使用富文本编辑器创建新的博客文章")
    }

    fn render(&self) -> String {
        let (disabled, label) = if self.submitting {
            (" disabled", "发布中...")
        } else {
            ("", "发布文章")
        };
        format!(
            concat!(
                r#"<section class="card editor-card">"#,
                r#"<header class="card-header"><h1 class="card-title">创建新文章</h1></header>"#,
                r#"<div class="card-content">"#,
                r#"<input type="text" id="{title_id}" class="input title-input" placeholder="输入文章标题" value="{title}">"#,
                // the editor holds the author's own markup
                r#"<div id="{editor_id}" class="rich-editor" contenteditable="true" data-placeholder="开始写作...">{content}</div>"#,
                r#"<div class="form-actions">"#,
                r#"<button type="button" class="button button-outline" data-action="{cancel}">取消</button>"#,
                r#"<button type="button" class="button" data-action="{publish}"{disabled}>{label}</button>"#,
                "</div></div></section>"
            ),
            title_id = TITLE_INPUT_ID,
            title = escape(&self.title),
            editor_id = EDITOR_ID,
            content = self.content,
            cancel = CANCEL_ACTION,
            publish = PUBLISH_ACTION,
            disabled = disabled,
            label = label,
        )
    }
}
