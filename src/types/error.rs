use thiserror::Error;

/// リモートコレクションとの通信で発生するエラー型
/// 非2xxのHTTPステータスと、接続・タイムアウト・解析などの転送レベルの失敗を区別する
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// サーバーが非2xxのステータスを返した
    #[error("HTTPステータスエラー: {method} {path} -> {status}")]
    Status {
        method: String,
        path: String,
        status: u16,
    },

    /// 接続失敗、タイムアウト、レスポンス解析失敗
    #[error("通信エラー: {method} {path} - {message}")]
    Transport {
        method: String,
        path: String,
        message: String,
    },
}

impl NetworkError {
    /// ステータスエラーを作成
    pub fn status<M: Into<String>, P: Into<String>>(method: M, path: P, status: u16) -> Self {
        Self::Status {
            method: method.into(),
            path: path.into(),
            status,
        }
    }

    /// 転送エラーを作成
    pub fn transport<M: Into<String>, P: Into<String>, S: Into<String>>(
        method: M,
        path: P,
        message: S,
    ) -> Self {
        Self::Transport {
            method: method.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// HTTPステータスコードを取得（転送エラーの場合はNone）
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }
}

/// 入力値の検証エラー型
/// ネットワークI/Oの前に検出され、リクエストは一切送信されない
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 投稿タイトルが空
    #[error("投稿のタイトルを入力してください")]
    EmptyTitle,

    /// コメント本文が空
    #[error("コメントの本文を入力してください")]
    EmptyText,

    /// コメントの投稿IDが未指定
    #[error("コメント先の投稿を選択してください")]
    MissingPostId,

    /// 閲覧数が数値として解釈できない
    #[error("閲覧数が不正です: {value}")]
    InvalidViews { value: String },

    /// コメント先の投稿がスナップショット上に存在しない、または削除済み
    #[error("コメント先の投稿が見つかりません: {post_id}")]
    UnknownPost { post_id: String },

    /// 指定IDのエンティティがスナップショット上に存在しない
    #[error("{resource}が見つかりません: {id}")]
    UnknownEntity { resource: String, id: String },
}

impl ValidationError {
    /// 閲覧数エラーを作成
    pub fn invalid_views<V: Into<String>>(value: V) -> Self {
        Self::InvalidViews {
            value: value.into(),
        }
    }

    /// 投稿不明エラーを作成
    pub fn unknown_post<P: Into<String>>(post_id: P) -> Self {
        Self::UnknownPost {
            post_id: post_id.into(),
        }
    }

    /// エンティティ不明エラーを作成
    pub fn unknown_entity<R: Into<String>, I: Into<String>>(resource: R, id: I) -> Self {
        Self::UnknownEntity {
            resource: resource.into(),
            id: id.into(),
        }
    }
}

/// 表示層向けのエラー分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Status,
    Transport,
}

/// リポジトリとコーディネーターが返すエラー型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl AppError {
    /// 表示用のエラー分類を取得
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Network(NetworkError::Status { .. }) => ErrorKind::Status,
            Self::Network(NetworkError::Transport { .. }) => ErrorKind::Transport,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// 通信エラーのResult型エイリアス
pub type NetworkResult<T> = std::result::Result<T, NetworkError>;

/// アプリケーションエラーのResult型エイリアス
pub type AppResult<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_classification() {
        let validation: AppError = ValidationError::EmptyTitle.into();
        let status: AppError = NetworkError::status("GET", "/posts", 404).into();
        let transport: AppError =
            NetworkError::transport("GET", "/posts", "connection refused").into();

        assert_eq!(validation.kind(), ErrorKind::Validation);
        assert_eq!(status.kind(), ErrorKind::Status);
        assert_eq!(transport.kind(), ErrorKind::Transport);
        assert!(validation.is_validation());
        assert!(!status.is_validation());
    }

    #[test]
    fn test_error_messages() {
        let err = NetworkError::status("PATCH", "/posts/1", 500);
        assert_eq!(err.to_string(), "HTTPステータスエラー: PATCH /posts/1 -> 500");
        assert_eq!(err.status_code(), Some(500));

        let err = NetworkError::transport("GET", "/comments", "timeout");
        assert!(err.to_string().contains("timeout"));
        assert_eq!(err.status_code(), None);

        // AppErrorは内側のメッセージをそのまま表示する
        let app: AppError = ValidationError::unknown_post("42").into();
        assert_eq!(app.to_string(), "コメント先の投稿が見つかりません: 42");
    }
}
