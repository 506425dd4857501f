use super::notify::Notifier;
use super::state::AppState;
use crate::domain::model::{Comment, CommentDraft, Post, PostDraft, Resource};
use crate::domain::query::{FilterMode, SortKey, Stats};
use crate::domain::repository::{CommentRepository, PostRepository, Repository};
use crate::infra::api::http::HttpClient;
use crate::types::{AppResult, ValidationError};
use std::sync::Arc;

/// 画面操作に対応するコマンドハンドラ群
///
/// リポジトリと表示層の間に立ち、アプリケーション状態を専有する。
/// 各コマンドはリクエストを1回だけ送信し、失敗時は状態を変更せずに
/// エラーを通知してそのまま返す（自動リトライなし）。
/// 変更が成功した場合は対象コレクションのスナップショットを取り直す。
pub struct Coordinator<C: HttpClient, N: Notifier> {
    posts: PostRepository<C>,
    comments: CommentRepository<C>,
    notifier: N,
    state: AppState,
}

impl<C: HttpClient, N: Notifier> Coordinator<C, N> {
    pub fn new(client: Arc<C>, notifier: N) -> Self {
        Self {
            posts: Repository::new(Arc::clone(&client)),
            comments: Repository::new(client),
            notifier,
            state: AppState::default(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn visible_posts(&self) -> Vec<&Post> {
        self.state.visible_posts()
    }

    pub fn stats(&self) -> Stats {
        self.state.stats()
    }

    // --- 一覧条件 ---

    pub fn set_filter(&mut self, mode: FilterMode) {
        self.state.query.mode = mode;
    }

    pub fn set_search<T: Into<String>>(&mut self, term: T) {
        self.state.query.search = term.into();
    }

    pub fn set_sort(&mut self, key: SortKey) {
        self.state.query.sort = key;
    }

    // --- スナップショット ---

    /// 投稿とコメントの両方を取り直す
    pub async fn refresh(&mut self) -> AppResult<()> {
        self.refresh_posts().await?;
        self.refresh_comments().await
    }

    pub async fn refresh_posts(&mut self) -> AppResult<()> {
        let result = self.posts.list().await;
        self.state.posts = self.report(result)?;
        tracing::debug!(count = self.state.posts.len(), "投稿スナップショットを更新");
        Ok(())
    }

    pub async fn refresh_comments(&mut self) -> AppResult<()> {
        let result = self.comments.list().await;
        self.state.comments = self.report(result)?;
        tracing::debug!(count = self.state.comments.len(), "コメントスナップショットを更新");
        Ok(())
    }

    // --- 投稿 ---

    /// 投稿の編集を開始し、フォーム初期値を返す
    pub fn begin_edit_post(&mut self, id: &str) -> AppResult<PostDraft> {
        let result: AppResult<PostDraft> = self
            .state
            .find_post(id)
            .map(PostDraft::from)
            .ok_or_else(|| ValidationError::unknown_entity(Post::LABEL, id).into());
        let draft = self.report(result)?;
        self.state.editing_post = Some(id.to_string());
        Ok(draft)
    }

    pub fn cancel_post_edit(&mut self) {
        self.state.editing_post = None;
    }

    /// 編集中なら全置換、そうでなければ新規作成する
    pub async fn save_post(&mut self, draft: PostDraft) -> AppResult<Post> {
        let (result, message) = match self.state.editing_post.clone() {
            Some(id) => (self.replace_post(&id, &draft).await, "投稿を更新しました"),
            None => (self.posts.create(&draft).await, "投稿を作成しました"),
        };
        let post = self.report(result)?;

        tracing::info!(id = %post.id, "投稿を保存");
        self.state.editing_post = None;
        self.notifier.success(message);
        self.refresh_posts_after_write().await;
        Ok(post)
    }

    async fn replace_post(&self, id: &str, draft: &PostDraft) -> AppResult<Post> {
        Post::validate_draft(draft)?;
        let existing = self
            .state
            .find_post(id)
            .ok_or_else(|| ValidationError::unknown_entity(Post::LABEL, id))?;
        self.posts.replace(existing, draft).await
    }

    pub async fn soft_delete_post(&mut self, id: &str) -> AppResult<Post> {
        let result = self.posts.soft_delete(id).await;
        let post = self.report(result)?;

        tracing::info!(id = %post.id, "投稿を論理削除");
        self.notifier.success("投稿を削除しました");
        self.refresh_posts_after_write().await;
        Ok(post)
    }

    pub async fn restore_post(&mut self, id: &str) -> AppResult<Post> {
        let result = self.posts.restore(id).await;
        let post = self.report(result)?;

        tracing::info!(id = %post.id, "投稿を復元");
        self.notifier.success("投稿を復元しました");
        self.refresh_posts_after_write().await;
        Ok(post)
    }

    /// 閲覧数を1増やす（現在値は直近のスナップショットから読む）
    pub async fn increment_views(&mut self, id: &str) -> AppResult<Post> {
        let result = self.posts.increment_views(id, &self.state.posts).await;
        let post = self.report(result)?;

        tracing::info!(id = %post.id, views = post.views, "閲覧数を更新");
        self.refresh_posts_after_write().await;
        Ok(post)
    }

    // --- コメント ---

    /// コメントの編集を開始し、フォーム初期値を返す
    pub fn begin_edit_comment(&mut self, id: &str) -> AppResult<CommentDraft> {
        let result: AppResult<CommentDraft> = self
            .state
            .find_comment(id)
            .map(CommentDraft::from)
            .ok_or_else(|| ValidationError::unknown_entity(Comment::LABEL, id).into());
        let draft = self.report(result)?;
        self.state.editing_comment = Some(id.to_string());
        Ok(draft)
    }

    pub fn cancel_comment_edit(&mut self) {
        self.state.editing_comment = None;
    }

    /// 編集中なら全置換、そうでなければ新規作成する
    pub async fn save_comment(&mut self, draft: CommentDraft) -> AppResult<Comment> {
        let (result, message) = match self.state.editing_comment.clone() {
            Some(id) => (
                self.replace_comment(&id, &draft).await,
                "コメントを更新しました",
            ),
            None => (self.create_comment(&draft).await, "コメントを送信しました"),
        };
        let comment = self.report(result)?;

        tracing::info!(id = %comment.id, post_id = %comment.post_id, "コメントを保存");
        self.state.editing_comment = None;
        self.notifier.success(message);
        self.refresh_comments_after_write().await;
        Ok(comment)
    }

    /// 投稿にコメントを直接追加する（編集状態には影響しない）
    pub async fn quick_comment(&mut self, post_id: &str, text: &str) -> AppResult<Comment> {
        let draft = CommentDraft::from_form(post_id, text);
        let result = self.create_comment(&draft).await;
        let comment = self.report(result)?;

        tracing::info!(id = %comment.id, post_id = %comment.post_id, "コメントを追加");
        self.notifier.success("コメントを送信しました");
        self.refresh_comments_after_write().await;
        Ok(comment)
    }

    async fn create_comment(&self, draft: &CommentDraft) -> AppResult<Comment> {
        self.check_comment_target(draft)?;
        self.comments.create(draft).await
    }

    async fn replace_comment(&self, id: &str, draft: &CommentDraft) -> AppResult<Comment> {
        self.check_comment_target(draft)?;
        let existing = self
            .state
            .find_comment(id)
            .ok_or_else(|| ValidationError::unknown_entity(Comment::LABEL, id))?;
        self.comments.replace(existing, draft).await
    }

    // 入力検証の後、コメント先が公開中の投稿かを確認する
    fn check_comment_target(&self, draft: &CommentDraft) -> AppResult<()> {
        Comment::validate_draft(draft)?;
        if !self.state.is_active_post(draft.post_id.trim()) {
            return Err(ValidationError::unknown_post(draft.post_id.trim()).into());
        }
        Ok(())
    }

    pub async fn soft_delete_comment(&mut self, id: &str) -> AppResult<Comment> {
        let result = self.comments.soft_delete(id).await;
        let comment = self.report(result)?;

        tracing::info!(id = %comment.id, "コメントを論理削除");
        self.notifier.success("コメントを削除しました");
        self.refresh_comments_after_write().await;
        Ok(comment)
    }

    pub async fn restore_comment(&mut self, id: &str) -> AppResult<Comment> {
        let result = self.comments.restore(id).await;
        let comment = self.report(result)?;

        tracing::info!(id = %comment.id, "コメントを復元");
        self.notifier.success("コメントを復元しました");
        self.refresh_comments_after_write().await;
        Ok(comment)
    }

    // --- 内部処理 ---

    // 書き込み自体は成功しているため、再取得の失敗は通知のみで結果は返す
    async fn refresh_posts_after_write(&mut self) {
        if self.refresh_posts().await.is_err() {
            tracing::warn!("書き込み後の投稿スナップショット更新に失敗");
        }
    }

    async fn refresh_comments_after_write(&mut self) {
        if self.refresh_comments().await.is_err() {
            tracing::warn!("書き込み後のコメントスナップショット更新に失敗");
        }
    }

    fn report<T>(&self, result: AppResult<T>) -> AppResult<T> {
        if let Err(error) = &result {
            tracing::warn!(error = %error, kind = ?error.kind(), "操作に失敗");
            self.notifier.error(error);
        }
        result
    }
}
