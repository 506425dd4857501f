//! 投稿とコメントを管理するRESTクライアント
//!
//! 汎用的なRESTストア（json-serverなど）上の`posts`/`comments`コレクションに対して、
//! 論理削除規約に従ったCRUDと、取得したスナップショットに対する
//! 絞り込み・検索・並び替え・集計を提供します。

pub mod app;
pub mod domain;
pub mod infra;
pub mod types;
