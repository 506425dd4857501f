//! 型定義モジュール
//!
//! アプリケーション全体で使用される共通的な型定義を管理します。
//! - エラー型: 通信エラー・検証エラーとその表示用分類
//! - 設定型: RESTストアの接続先

pub mod config;
pub mod error;

// 便利な再エクスポート
pub use config::{AppConfig, ConfigError, ConfigResult};
pub use error::{
    AppError, AppResult, ErrorKind, NetworkError, NetworkResult, ValidationError,
};
