use crate::domain::model::{Comment, Post};
use crate::domain::query::{
    active_comment_count, comments_for_post, compute_stats, post_options, ListQuery, Stats,
};

/// プロセス内で保持するアプリケーション状態
///
/// スナップショットは変更系の操作のたびに丸ごと取り直す。
/// 編集中のIDは種別ごとに1件だけ保持し、新しい編集開始で上書きされる。
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub posts: Vec<Post>,
    pub comments: Vec<Comment>,
    pub query: ListQuery,
    pub editing_post: Option<String>,
    pub editing_comment: Option<String>,
}

impl AppState {
    /// 現在の問い合わせ条件を適用した投稿一覧
    pub fn visible_posts(&self) -> Vec<&Post> {
        self.query.apply(&self.posts)
    }

    pub fn stats(&self) -> Stats {
        compute_stats(&self.posts, &self.comments)
    }

    pub fn find_post(&self, id: &str) -> Option<&Post> {
        self.posts.iter().find(|post| post.id == id)
    }

    pub fn find_comment(&self, id: &str) -> Option<&Comment> {
        self.comments.iter().find(|comment| comment.id == id)
    }

    /// コメント先として有効な（公開中の）投稿か
    pub fn is_active_post(&self, id: &str) -> bool {
        self.find_post(id).is_some_and(|post| !post.is_deleted)
    }

    pub fn comment_count(&self, post_id: &str) -> usize {
        active_comment_count(&self.comments, post_id)
    }

    pub fn comments_for_post(&self, post_id: &str) -> Vec<&Comment> {
        comments_for_post(&self.comments, post_id)
    }

    pub fn post_options(&self) -> Vec<&Post> {
        post_options(&self.posts)
    }
}
