use super::model::{Comment, Post};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

// 削除状態による絞り込みモード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    All,
    /// 論理削除されていないもの
    Active,
    /// 論理削除済みのもの
    Deleted,
}

// 一覧の並び順
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// 入力順を維持
    #[default]
    None,
    /// 閲覧数の降順
    Views,
    /// タイトルの昇順
    Title,
}

impl FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "deleted" => Ok(Self::Deleted),
            other => Err(format!("不明なフィルター: {}", other)),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "views" => Ok(Self::Views),
            "title" => Ok(Self::Title),
            other => Err(format!("不明な並び順: {}", other)),
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Deleted => "deleted",
        };
        f.write_str(name)
    }
}

/// 一覧表示用の問い合わせ条件
///
/// 適用順は「削除状態 → タイトル検索 → 並び替え」で固定。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub mode: FilterMode,
    pub search: String,
    pub sort: SortKey,
}

impl ListQuery {
    pub fn apply<'a>(&self, posts: &'a [Post]) -> Vec<&'a Post> {
        let filtered = filter_by_state(posts, self.mode);
        let searched = search_by_title(filtered, &self.search);
        sort_posts(searched, self.sort)
    }
}

/// 投稿・コメントの統計情報
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total: usize,
    pub active: usize,
    pub deleted: usize,
    /// 論理削除されていないコメントの件数
    pub total_comments: usize,
    pub total_views: u64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "投稿: 全{}件（公開{}件、削除済み{}件） / コメント: {}件 / 総閲覧数: {}",
            self.total, self.active, self.deleted, self.total_comments, self.total_views
        )
    }
}

/// 削除状態で投稿を絞り込む
pub fn filter_by_state<'a, I>(posts: I, mode: FilterMode) -> Vec<&'a Post>
where
    I: IntoIterator<Item = &'a Post>,
{
    posts
        .into_iter()
        .filter(|post| match mode {
            FilterMode::All => true,
            FilterMode::Active => !post.is_deleted,
            FilterMode::Deleted => post.is_deleted,
        })
        .collect()
}

/// タイトルの部分一致（大文字小文字を区別しない）で絞り込む
/// 検索語が空の場合は入力をそのまま返す
pub fn search_by_title<'a, I>(posts: I, term: &str) -> Vec<&'a Post>
where
    I: IntoIterator<Item = &'a Post>,
{
    let term = term.to_lowercase();
    posts
        .into_iter()
        .filter(|post| term.is_empty() || post.title.to_lowercase().contains(&term))
        .collect()
}

/// 投稿を並び替える（安定ソート、同順位は入力順を維持）
pub fn sort_posts(mut posts: Vec<&Post>, key: SortKey) -> Vec<&Post> {
    match key {
        SortKey::None => {}
        SortKey::Views => posts.sort_by(|a, b| b.views.cmp(&a.views)),
        SortKey::Title => posts.sort_by(|a, b| locale_compare(&a.title, &b.title)),
    }
    posts
}

/// ロケールを考慮した文字列比較
///
/// 発音区別符号と大文字小文字を無視した基底文字の順序を優先する
/// （`Ă`・`Á`は`A`、`Đ`は`D`と同じ位置）。
/// 基底文字が同じ場合は符号付きの文字を後にし、さらに同じ場合は小文字を先にする。
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(&base_letters(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| b.cmp(a))
}

// NFD分解して結合文字を取り除いた小文字列（đは分解されないため個別にdへ寄せる）
fn base_letters(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c == 'đ' { 'd' } else { c })
        .collect()
}

/// 指定投稿に紐づく、削除されていないコメントの件数
pub fn active_comment_count(comments: &[Comment], post_id: &str) -> usize {
    comments
        .iter()
        .filter(|comment| comment.post_id == post_id && !comment.is_deleted)
        .count()
}

/// 指定投稿に紐づく、削除されていないコメント（スナップショット順）
pub fn comments_for_post<'a>(comments: &'a [Comment], post_id: &str) -> Vec<&'a Comment> {
    comments
        .iter()
        .filter(|comment| comment.post_id == post_id && !comment.is_deleted)
        .collect()
}

/// コメント先として選択できる投稿（公開中のものをタイトル順）
pub fn post_options(posts: &[Post]) -> Vec<&Post> {
    sort_posts(filter_by_state(posts, FilterMode::Active), SortKey::Title)
}

/// スナップショットから統計情報を計算する
pub fn compute_stats(posts: &[Post], comments: &[Comment]) -> Stats {
    let deleted = posts.iter().filter(|post| post.is_deleted).count();

    Stats {
        total: posts.len(),
        active: posts.len() - deleted,
        deleted,
        total_comments: comments.iter().filter(|comment| !comment.is_deleted).count(),
        // 上限を超える場合はu64::MAXで頭打ちにする
        total_views: posts
            .iter()
            .map(|post| post.views)
            .fold(0u64, u64::saturating_add),
    }
}
