pub mod model;
pub mod query;
pub mod repository;

// 公開APIの再エクスポート

// model.rsから
pub use model::{Comment, CommentDraft, Post, PostDraft, Resource};

// query.rsから
pub use query::{
    active_comment_count, comments_for_post, compute_stats, filter_by_state, post_options,
    search_by_title, sort_posts, FilterMode, ListQuery, SortKey, Stats,
};

// repository.rsから
pub use repository::{CommentRepository, PostRepository, Repository};
