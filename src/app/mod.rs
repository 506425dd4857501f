//! アプリケーション層
//!
//! - `state`: スナップショットと画面状態
//! - `notify`: 表示層への通知
//! - `coordinator`: 画面操作に対応するコマンドハンドラ

pub mod coordinator;
pub mod notify;
pub mod state;

pub use coordinator::Coordinator;
pub use notify::{ConsoleNotifier, Notification, Notifier, RecordingNotifier};
pub use state::AppState;
