use super::model::{iso_timestamp, Post, Resource};
use crate::infra::api::http::{HttpClient, HttpMethod};
use crate::types::{AppResult, NetworkError, ValidationError};
use chrono::Utc;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::marker::PhantomData;
use std::sync::Arc;

// パス組み立て専用のダミーのベースURL
const PATH_BASE: &str = "http://localhost/";

/// 論理削除規約に従うRESTリソースのリポジトリ
///
/// レコードを物理削除することはなく、削除は`isDeleted`/`deletedAt`の更新で表現する。
/// 前提条件の検証はリクエスト送信前に行い、違反時は一切通信しない。
pub struct Repository<R: Resource, C: HttpClient> {
    client: Arc<C>,
    _resource: PhantomData<fn() -> R>,
}

/// 投稿リポジトリ
pub type PostRepository<C> = Repository<Post, C>;
/// コメントリポジトリ
pub type CommentRepository<C> = Repository<super::model::Comment, C>;

impl<R: Resource, C: HttpClient> Clone for Repository<R, C> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.client))
    }
}

impl<R: Resource, C: HttpClient> Repository<R, C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }

    fn collection_path() -> String {
        format!("/{}", R::NAME)
    }

    // IDはパスセグメントとしてパーセントエンコードする（`a/b`や`1?x`で別リソースを指さない）
    fn item_path(id: &str) -> AppResult<String> {
        if id.trim().is_empty() {
            return Err(ValidationError::unknown_entity(R::LABEL, id).into());
        }
        let invalid = || ValidationError::unknown_entity(R::LABEL, id);
        let mut url = Url::parse(PATH_BASE).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .clear()
            .push(R::NAME)
            .push(id);
        Ok(url.path().to_string())
    }

    /// コレクション全体を取得する（ページングなし）
    pub async fn list(&self) -> AppResult<Vec<R>> {
        self.send(HttpMethod::Get, &Self::collection_path(), None)
            .await
    }

    /// 新規作成する（`isDeleted=false`、`createdAt=updatedAt=now`）
    pub async fn create(&self, draft: &R::Draft) -> AppResult<R> {
        R::validate_draft(draft)?;
        let body = R::creation_body(draft, Utc::now());
        self.send(HttpMethod::Post, &Self::collection_path(), Some(&body))
            .await
    }

    /// 既存レコードを下書きの内容で全置換する（`updatedAt`は現在時刻）
    pub async fn replace(&self, existing: &R, draft: &R::Draft) -> AppResult<R> {
        R::validate_draft(draft)?;
        let path = Self::item_path(existing.id())?;
        let body = existing.replacement_body(draft, Utc::now());
        self.send(HttpMethod::Put, &path, Some(&body)).await
    }

    /// 指定フィールドのみをマージ更新する
    pub async fn patch(&self, id: &str, fields: Value) -> AppResult<R> {
        let path = Self::item_path(id)?;
        self.send(HttpMethod::Patch, &path, Some(&fields)).await
    }

    /// 論理削除する
    pub async fn soft_delete(&self, id: &str) -> AppResult<R> {
        self.patch(
            id,
            json!({
                "isDeleted": true,
                "deletedAt": iso_timestamp(Utc::now()),
            }),
        )
        .await
    }

    /// 論理削除を取り消す（`updatedAt`/`createdAt`は変更しない）
    pub async fn restore(&self, id: &str) -> AppResult<R> {
        self.patch(
            id,
            json!({
                "isDeleted": false,
                "deletedAt": null,
            }),
        )
        .await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> AppResult<T> {
        let value = self.client.send_json(method, path, body).await?;
        let decoded = serde_json::from_value(value).map_err(|e| {
            NetworkError::transport(
                method.as_str(),
                path,
                format!("{}のデコードに失敗: {}", R::LABEL, e),
            )
        })?;
        Ok(decoded)
    }
}

impl<C: HttpClient> Repository<Post, C> {
    /// 閲覧数を1増やす
    ///
    /// 現在値はスナップショットから読むため、スナップショットが古い場合は
    /// 他の書き込みを上書きしうる（アトミックな加算ではない）。
    pub async fn increment_views(&self, id: &str, snapshot: &[Post]) -> AppResult<Post> {
        let current = snapshot
            .iter()
            .find(|post| post.id == id)
            .ok_or_else(|| ValidationError::unknown_entity(Post::LABEL, id))?;

        let views = current
            .views
            .checked_add(1)
            .ok_or_else(|| ValidationError::invalid_views(format!("{} + 1", current.views)))?;

        self.patch(
            id,
            json!({
                "views": views,
                "updatedAt": iso_timestamp(Utc::now()),
            }),
        )
        .await
    }
}
