use crate::types::ValidationError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

// 投稿エンティティ（RESTストアの`posts`コレクション）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_views")]
    pub views: u64,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub deleted_at: Option<DateTime<Utc>>,
}

// コメントエンティティ（RESTストアの`comments`コレクション）
// postIdは参照整合性を保証しない（投稿を削除してもコメントは残る）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub post_id: String,
    pub text: String,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// 投稿フォームの入力値
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostDraft {
    pub title: String,
    pub views: u64,
}

impl PostDraft {
    pub fn new<T: Into<String>>(title: T, views: u64) -> Self {
        Self {
            title: title.into(),
            views,
        }
    }

    /// フォームの文字列入力から下書きを作成する
    /// 閲覧数が空欄の場合は0とし、数値でない場合は検証エラーとする
    pub fn from_form(title: &str, views: &str) -> Result<Self, ValidationError> {
        let views = views.trim();
        let views = if views.is_empty() {
            0
        } else {
            views
                .parse::<u64>()
                .map_err(|_| ValidationError::invalid_views(views))?
        };
        Ok(Self::new(title.trim(), views))
    }
}

impl From<&Post> for PostDraft {
    fn from(post: &Post) -> Self {
        Self::new(post.title.clone(), post.views)
    }
}

/// コメントフォームの入力値
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentDraft {
    pub post_id: String,
    pub text: String,
}

impl CommentDraft {
    pub fn new<P: Into<String>, T: Into<String>>(post_id: P, text: T) -> Self {
        Self {
            post_id: post_id.into(),
            text: text.into(),
        }
    }

    /// フォームの文字列入力から下書きを作成する（前後の空白を除去）
    pub fn from_form(post_id: &str, text: &str) -> Self {
        Self::new(post_id.trim(), text.trim())
    }
}

impl From<&Comment> for CommentDraft {
    fn from(comment: &Comment) -> Self {
        Self::new(comment.post_id.clone(), comment.text.clone())
    }
}

/// 論理削除規約に従うRESTリソースの共通インターフェース
///
/// `NAME`はコレクションのパス（`/posts`）に、
/// `Draft`はフォームから受け取る編集可能フィールドに対応する。
pub trait Resource: DeserializeOwned + Clone + Send + Sync {
    /// コレクション名
    const NAME: &'static str;
    /// 表示用の名称
    const LABEL: &'static str;

    type Draft: Send + Sync;

    fn id(&self) -> &str;
    fn is_deleted(&self) -> bool;
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    /// 作成・置換の前提条件を検証する
    fn validate_draft(draft: &Self::Draft) -> Result<(), ValidationError>;

    /// 新規作成時に送信するボディ
    fn creation_body(draft: &Self::Draft, now: DateTime<Utc>) -> Value;

    /// 全置換時に送信するボディ
    /// 作成日時と削除状態は既存のレコードから引き継ぐ
    fn replacement_body(&self, draft: &Self::Draft, now: DateTime<Utc>) -> Value;

    /// `isDeleted == true ⇔ deletedAt != null` を満たすか
    fn has_consistent_deletion(&self) -> bool {
        self.is_deleted() == self.deleted_at().is_some()
    }
}

impl Resource for Post {
    const NAME: &'static str = "posts";
    const LABEL: &'static str = "投稿";

    type Draft = PostDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn validate_draft(draft: &PostDraft) -> Result<(), ValidationError> {
        if draft.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(())
    }

    fn creation_body(draft: &PostDraft, now: DateTime<Utc>) -> Value {
        let now = iso_timestamp(now);
        json!({
            "title": draft.title.trim(),
            "views": draft.views,
            "isDeleted": false,
            "createdAt": now,
            "updatedAt": now,
        })
    }

    fn replacement_body(&self, draft: &PostDraft, now: DateTime<Utc>) -> Value {
        json!({
            "id": self.id,
            "title": draft.title.trim(),
            "views": draft.views,
            "isDeleted": self.is_deleted,
            "createdAt": self.created_at.map(iso_timestamp),
            "updatedAt": iso_timestamp(now),
            "deletedAt": self.deleted_at.map(iso_timestamp),
        })
    }
}

impl Resource for Comment {
    const NAME: &'static str = "comments";
    const LABEL: &'static str = "コメント";

    type Draft = CommentDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn validate_draft(draft: &CommentDraft) -> Result<(), ValidationError> {
        if draft.post_id.trim().is_empty() {
            return Err(ValidationError::MissingPostId);
        }
        if draft.text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        Ok(())
    }

    fn creation_body(draft: &CommentDraft, now: DateTime<Utc>) -> Value {
        let now = iso_timestamp(now);
        json!({
            "postId": draft.post_id.trim(),
            "text": draft.text.trim(),
            "isDeleted": false,
            "createdAt": now,
            "updatedAt": now,
        })
    }

    fn replacement_body(&self, draft: &CommentDraft, now: DateTime<Utc>) -> Value {
        json!({
            "id": self.id,
            "postId": draft.post_id.trim(),
            "text": draft.text.trim(),
            "isDeleted": self.is_deleted,
            "createdAt": self.created_at.map(iso_timestamp),
            "updatedAt": iso_timestamp(now),
            "deletedAt": self.deleted_at.map(iso_timestamp),
        })
    }
}

/// `2024-01-01T00:00:00.000Z`形式のタイムスタンプ文字列
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// json-serverは数値IDと文字列IDのどちらも返しうるため、文字列に正規化する
fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

// 日時が欠落・null・RFC3339以外の場合は未設定として扱う
// （json-serverの初期データには日時を持たないレコードがある）
fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|at| at.with_timezone(&Utc)))
}

// viewsが欠落・nullの場合は0として扱う
fn deserialize_views<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}
