//! PriipCloud API クライアント
//!
//! エンドポイントの組み立てと応答のデコードだけを担当する。実行制御
//! （同時実行数・再試行・レートリミット）はすべてディスパッチャ側。

use tokio::time::Duration;

use super::FetchError;
use super::types::{
    LanguageEntryDto,
    PoolKeyDto,
};
use crate::dispatcher::{
    FactoryOptions,
    HttpTransport,
    RequestConfig,
    RequestFactory,
    RequestOptions,
    Transport,
    ValueProvider,
};

/// 取得オーケストレーションが使う API クライアント
pub struct ApiClient<T: Transport> {
    factory: RequestFactory<T>,
    origin: String,
}

impl ApiClient<HttpTransport> {
    /// 本番トランスポートでクライアントを作る
    #[must_use]
    pub fn new(origin: String, access_token: &str) -> Self {
        Self::with_transport(HttpTransport::default(), origin, access_token)
    }
}

impl<T: Transport> ApiClient<T> {
    /// 任意のトランスポートでクライアントを作る（テスト用の注入口）
    #[must_use]
    pub fn with_transport(transport: T, origin: String, access_token: &str) -> Self {
        let factory = RequestFactory::new(
            transport,
            FactoryOptions {
                id: "PriipCloud".to_string(),
                auth_header: Some(ValueProvider::Static(format!("Bearer {access_token}"))),
                max_ongoing_requests: Some(ValueProvider::Static(5)),
                max_attempts: Some(ValueProvider::Static(3)),
                rate_limit_safety_period: Duration::from_millis(1000),
            },
        );
        Self { factory, origin }
    }

    /// プール内の全キーを一覧する
    pub(super) async fn fetch_pool_keys(&self, pool_id: i64) -> Result<Vec<PoolKeyDto>, FetchError> {
        let url = format!("{}/priip/api/translation/keys/pool/{pool_id}.json", self.origin);
        let response =
            self.factory.request(RequestConfig::get(url), RequestOptions::default()).await?;
        serde_json::from_value(response.body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    /// 1 キー分の言語別コンテンツを取得する
    ///
    /// 応答は要求した言語リストと位置で対応し、欠けた言語は `null` で届く。
    pub(super) async fn fetch_key_languages(
        &self,
        key_id: i64,
        langs: &[String],
    ) -> Result<Vec<Option<LanguageEntryDto>>, FetchError> {
        let query =
            langs.iter().map(|lang| format!("langId={lang}")).collect::<Vec<_>>().join("&");
        let url = format!("{}/priip/api/translation/key/{key_id}/languages?{query}", self.origin);
        let response =
            self.factory.request(RequestConfig::get(url), RequestOptions::default()).await?;
        serde_json::from_value(response.body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}
