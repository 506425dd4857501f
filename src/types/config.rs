use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

/// 既定の設定ファイル名（カレントディレクトリに存在する場合のみ読み込む）
pub const DEFAULT_CONFIG_FILE: &str = "postboard.yaml";

/// APIのベースURLを上書きする環境変数
pub const API_URL_ENV: &str = "POSTBOARD_API_URL";

/// ローカルのモックRESTサーバー（json-server）の既定URL
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// 設定関連のエラー型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 設定値が不正
    #[error("設定値が不正です: {reason}")]
    InvalidValue { reason: String },

    /// 明示的に指定された設定ファイルが見つからない
    #[error("設定ファイルが見つかりません: {path}")]
    MissingConfigFile { path: String },

    /// 設定ファイルの読み込み・解析に失敗
    #[error("設定ファイルの解析に失敗: {path} - {message}")]
    Parse { path: String, message: String },
}

impl ConfigError {
    /// 不正な設定値エラーを作成
    pub fn invalid_value<R: Into<String>>(reason: R) -> Self {
        Self::InvalidValue {
            reason: reason.into(),
        }
    }

    /// 設定ファイル不足エラーを作成
    pub fn missing_config_file<P: Into<String>>(path: P) -> Self {
        Self::MissingConfigFile { path: path.into() }
    }

    /// 設定ファイル解析エラーを作成
    pub fn parse<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// 設定エラーのResult型エイリアス
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// YAMLファイルの構造に対応する型（全項目省略可）
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    api_url: Option<String>,
}

/// アプリケーション設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// RESTストアのベースURL（末尾の`/`は除去済み）
    pub api_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl AppConfig {
    /// 既定値 → 設定ファイル → 環境変数 → 明示指定 の順で設定を解決する
    ///
    /// `config_path`が指定された場合はファイルの存在が必須。
    /// 未指定の場合は`postboard.yaml`があれば読み込む。
    pub fn load(config_path: Option<&str>, api_url_override: Option<&str>) -> ConfigResult<Self> {
        let env_url = std::env::var(API_URL_ENV).ok();
        Self::resolve(
            config_path,
            DEFAULT_CONFIG_FILE,
            env_url.as_deref(),
            api_url_override,
        )
    }

    fn resolve(
        config_path: Option<&str>,
        default_file: &str,
        env_url: Option<&str>,
        api_url_override: Option<&str>,
    ) -> ConfigResult<Self> {
        let mut config = Self::default();

        match config_path {
            Some(path) => {
                if !Path::new(path).exists() {
                    return Err(ConfigError::missing_config_file(path));
                }
                config.merge_file(path)?;
            }
            None => {
                if Path::new(default_file).exists() {
                    config.merge_file(default_file)?;
                }
            }
        }

        // 空の環境変数は未設定として扱う
        if let Some(url) = env_url.filter(|url| !url.trim().is_empty()) {
            config.api_url = url.to_string();
        }

        if let Some(url) = api_url_override {
            config.api_url = url.to_string();
        }

        config.api_url = normalize_api_url(&config.api_url)?;
        Ok(config)
    }

    fn merge_file(&mut self, path: &str) -> ConfigResult<()> {
        let reader = File::open(path)
            .map(BufReader::new)
            .map_err(|e| ConfigError::parse(path, e.to_string()))?;
        let file: ConfigFile =
            serde_yaml::from_reader(reader).map_err(|e| ConfigError::parse(path, e.to_string()))?;
        if let Some(url) = file.api_url {
            self.api_url = url;
        }
        Ok(())
    }
}

/// ベースURLを検証し、末尾の`/`を取り除く
pub fn normalize_api_url(url: &str) -> ConfigResult<String> {
    let trimmed = url.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::invalid_value(format!(
            "api_urlはhttp://またはhttps://で始まる必要があります: {}",
            url
        )));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
