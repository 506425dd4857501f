use crate::types::{NetworkError, NetworkResult};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// RESTストアに対して使用するHTTPメソッド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTPクライアントの抽象化トレイト
///
/// このトレイトは、実際のHTTP通信とモック実装の両方を
/// 統一的に扱えるようにするためのインターフェースです。
/// 失敗は一度だけ報告され、リトライは行いません。
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// `base_url + path`へJSONリクエストを送信し、JSONレスポンスを返す
    ///
    /// # Arguments
    /// * `method` - HTTPメソッド
    /// * `path` - `/posts/1`のようなリソースパス
    /// * `body` - 送信するJSONボディ（GETではNone）
    ///
    /// # Errors
    /// * 非2xxステータスは`NetworkError::Status`（ボディは解析しない）
    /// * 接続失敗・タイムアウト・JSON解析失敗は`NetworkError::Transport`
    async fn send_json(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> NetworkResult<Value>;
}

/// `reqwest` を使用した本番用のHTTPクライアント実装
pub struct ReqwestHttpClient {
    client: Client,
    base_url: String,
}

impl ReqwestHttpClient {
    /// 指定したベースURLに接続するHTTPクライアントを作成
    pub fn new<U: Into<String>>(base_url: U) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send_json(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> NetworkResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(method = %method, %url, "RESTリクエスト送信");

        let mut request = self
            .client
            .request(method.to_reqwest(), &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(method = %method, %url, error = %e, "RESTリクエストの送信に失敗");
            NetworkError::transport(method.as_str(), path, e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(method = %method, %url, status = status.as_u16(), "非2xxレスポンス");
            return Err(NetworkError::status(method.as_str(), path, status.as_u16()));
        }

        response.json::<Value>().await.map_err(|e| {
            tracing::warn!(method = %method, %url, error = %e, "レスポンスJSONの解析に失敗");
            NetworkError::transport(
                method.as_str(),
                path,
                format!("レスポンスJSONの解析に失敗: {}", e),
            )
        })
    }
}

/// モッククライアントが受け取ったリクエストの記録
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
}

/// テスト用のモックHTTPクライアント
///
/// この実装はテスト時にDIされ、実際のHTTPリクエストを行わずに
/// 登録順にレスポンスやエラーを返します。受け取ったリクエストは記録されます。
#[derive(Default)]
pub struct MockHttpClient {
    responses: Mutex<VecDeque<NetworkResult<Value>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 成功レスポンスを追加する（ビルダー形式）
    pub fn with_response(self, response: Value) -> Self {
        self.push_response(response);
        self
    }

    /// エラーレスポンスを追加する（ビルダー形式）
    pub fn with_error(self, error: NetworkError) -> Self {
        self.push_error(error);
        self
    }

    pub fn push_response(&self, response: Value) {
        lock(&self.responses).push_back(Ok(response));
    }

    pub fn push_error(&self, error: NetworkError) {
        lock(&self.responses).push_back(Err(error));
    }

    /// これまでに受け取ったリクエストの一覧
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send_json(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> NetworkResult<Value> {
        lock(&self.requests).push(RecordedRequest {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });

        let next = lock(&self.responses).pop_front();
        next.unwrap_or_else(|| {
            Err(NetworkError::transport(
                method.as_str(),
                path,
                "モックレスポンスが未設定です",
            ))
        })
    }
}

// テスト中にパニックしたスレッドがあってもモックの記録は読めるようにする
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
