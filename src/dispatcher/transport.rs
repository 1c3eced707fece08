//! HTTP トランスポート境界
//!
//! ディスパッチャ本体はこの trait 越しにしかネットワークへ触れない。
//! テストではスクリプト化したフェイクを注入する。

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// HTTP メソッド（本システムが使うもののみ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
}

/// 1 リクエスト分の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    /// HTTP メソッド
    pub method: Method,
    /// 完全な URL
    pub url: String,
    /// 追加ヘッダ
    pub headers: HashMap<String, String>,
}

impl RequestConfig {
    /// GET リクエストの設定を作る
    #[must_use]
    pub fn get(url: String) -> Self {
        Self { method: Method::Get, url, headers: HashMap::new() }
    }
}

/// トランスポート層の応答（2xx のみ）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP ステータスコード
    pub status: u16,
    /// JSON ボディ
    pub body: serde_json::Value,
}

/// トランスポート層の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// 2xx 以外のステータス応答
    #[error("request failed with status {status}")]
    Status {
        /// HTTP ステータスコード
        status: u16,
        /// `Retry-After` ヘッダの秒数（あれば）
        retry_after: Option<u64>,
    },
    /// 接続・タイムアウト等のネットワーク失敗
    #[error("network error: {0}")]
    Network(String),
}

impl TransportError {
    /// サーバーからのレートリミット通知かどうか
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Status { status: 429, .. })
    }

    /// レートリミット応答が運ぶ `Retry-After` 秒数
    #[must_use]
    pub const fn retry_after(&self) -> Option<u64> {
        match self {
            Self::Status { retry_after, .. } => *retry_after,
            Self::Network(_) => None,
        }
    }
}

/// HTTP 呼び出しの境界
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// リクエストを 1 回だけ発行する。再試行はディスパッチャの責務
    async fn send(&self, config: &RequestConfig) -> Result<TransportResponse, TransportError>;
}

/// reqwest による本番トランスポート
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, config: &RequestConfig) -> Result<TransportResponse, TransportError> {
        let mut request = match config.method {
            Method::Get => self.client.get(&config.url),
            Method::Post => self.client.post(&config.url),
        };
        for (name, value) in &config.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response =
            request.send().await.map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok());
            return Err(TransportError::Status { status: status.as_u16(), retry_after });
        }

        let body = response.json().await.map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(TransportResponse { status: status.as_u16(), body })
    }
}
