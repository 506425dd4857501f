use crate::types::{AppError, ErrorKind};
use std::sync::Mutex;

/// 操作結果をユーザーに伝える表示層のインターフェース
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, error: &AppError);
}

/// 端末に結果を表示する通知実装
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str) {
        tracing::info!(detail = message, "操作成功");
        println!("✅ {}", message);
    }

    fn error(&self, error: &AppError) {
        let label = match error.kind() {
            ErrorKind::Validation => "入力エラー",
            ErrorKind::Status | ErrorKind::Transport => "サーバーとの通信に失敗しました",
        };
        tracing::warn!(error = %error, "操作失敗");
        eprintln!("❌ {}: {}", label, error);
    }
}

/// 通知内容
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Success(String),
    Error(AppError),
}

/// テスト用の通知記録
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Notification> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn errors(&self) -> Vec<AppError> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Notification::Error(error) => Some(error),
                Notification::Success(_) => None,
            })
            .collect()
    }

    fn push(&self, event: Notification) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.push(Notification::Success(message.to_string()));
    }

    fn error(&self, error: &AppError) {
        self.push(Notification::Error(error.clone()));
    }
}
