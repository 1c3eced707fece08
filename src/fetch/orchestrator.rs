//! プール・キー単位のファンアウト取得
//!
//! プール一覧 → キーごとの言語別コンテンツの順で取得し、要求された
//! フィルタをプール一覧の時点で適用する。同時実行の上限はディスパッチャ
//! が面倒をみるため、ここでは論理的な並行度を制限しない。

use std::collections::BTreeMap;

use futures::future::try_join_all;

use super::FetchError;
use super::client::ApiClient;
use super::types::{
    LanguageVersion,
    PoolKeyDto,
    TranslationData,
    TranslationKey,
};
use crate::dispatcher::Transport;
use crate::types::CancellationToken;

/// 取得フェーズに必要なオプション一式
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// キーを探索するプール ID
    pub pool_ids: Vec<i64>,
    /// 取得する言語コード
    pub langs: Vec<String>,
    /// キー名での絞り込み（`None` で全件）
    pub filter_tk_names: Option<Vec<String>>,
    /// キー ID での絞り込み（`None` で全件）
    pub filter_tk_ids: Option<Vec<i64>>,
}

/// マークアップを合成ルートで包む
///
/// プラットフォームはルート要素の無い断片を返すため、パース前に必ず
/// `<root>` で包んで単一ルートの文書にする。
fn wrap_root(text: &str) -> String {
    format!("<root>{text}</root>")
}

/// 要求された全プールの全キーとその言語別コンテンツを取得する
pub async fn fetch_all_tks<T: Transport>(
    client: &ApiClient<T>,
    options: &FetchOptions,
    cancellation: &CancellationToken,
) -> Result<Vec<TranslationKey>, FetchError> {
    let pools = options
        .pool_ids
        .iter()
        .map(|&pool_id| fetch_pool(client, options, cancellation, pool_id));
    let keys = try_join_all(pools).await?.into_iter().flatten().collect();
    Ok(keys)
}

/// 取得だけを行い、キャッシュとして保存できる生データを返す
pub async fn fetch_translation_data<T: Transport>(
    client: &ApiClient<T>,
    options: &FetchOptions,
    cancellation: &CancellationToken,
) -> Result<TranslationData, FetchError> {
    let data = fetch_all_tks(client, options, cancellation).await?;
    Ok(TranslationData { data })
}

async fn fetch_pool<T: Transport>(
    client: &ApiClient<T>,
    options: &FetchOptions,
    cancellation: &CancellationToken,
    pool_id: i64,
) -> Result<Vec<TranslationKey>, FetchError> {
    if cancellation.is_cancelled() {
        return Err(FetchError::Cancelled);
    }

    let listed = client.fetch_pool_keys(pool_id).await?;
    if cancellation.is_cancelled() {
        return Err(FetchError::Cancelled);
    }
    tracing::debug!(pool_id, keys = listed.len(), "Fetched pool key listing");

    let selected = listed.into_iter().filter(|item| {
        options.filter_tk_names.as_ref().is_none_or(|names| names.contains(&item.name))
            && options
                .filter_tk_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(&item.translation_key_id))
    });

    let futures = selected.map(|item| fetch_key(client, options, cancellation, pool_id, item));
    try_join_all(futures).await
}

async fn fetch_key<T: Transport>(
    client: &ApiClient<T>,
    options: &FetchOptions,
    cancellation: &CancellationToken,
    pool_id: i64,
    item: PoolKeyDto,
) -> Result<TranslationKey, FetchError> {
    if cancellation.is_cancelled() {
        return Err(FetchError::Cancelled);
    }
    tracing::debug!(name = %item.name, id = item.translation_key_id, "Fetching key languages");

    let entries = client.fetch_key_languages(item.translation_key_id, &options.langs).await?;
    if cancellation.is_cancelled() {
        return Err(FetchError::Cancelled);
    }

    let mut languages = BTreeMap::new();
    let mut entries = entries.into_iter();
    for lang in &options.langs {
        let entry = entries.next().flatten().unwrap_or_default();
        languages.insert(
            lang.clone(),
            LanguageVersion {
                markup: entry.text.map(|text| wrap_root(&text)),
                last_modified: entry.last_modified,
            },
        );
    }

    Ok(TranslationKey {
        id: item.translation_key_id,
        name: item.name,
        pool_id,
        last_modified: item.last_modified,
        master: wrap_root(item.text.as_deref().unwrap_or_default()),
        languages,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use googletest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::dispatcher::{
        RequestConfig,
        TransportError,
        TransportResponse,
    };

    /// URL のパターンで応答を返すフェイク
    struct RoutedTransport;

    #[async_trait]
    impl Transport for RoutedTransport {
        async fn send(
            &self,
            config: &RequestConfig,
        ) -> Result<TransportResponse, TransportError> {
            let body = if config.url.contains("/keys/pool/7.json") {
                json!([
                    {"name": "greeting", "translationKeyId": 11, "text": "<span data-tag-name=\"A\"/>"},
                    {"name": "farewell", "translationKeyId": 12, "text": ""},
                ])
            } else if config.url.contains("/key/11/languages") || config.url.contains("/key/12/languages") {
                // EN はコンテンツあり、DE は欠落
                json!([{"text": "<span data-tag-name=\"A\"/>"}, null])
            } else {
                json!([])
            };
            Ok(TransportResponse { status: 200, body })
        }
    }

    fn client() -> ApiClient<RoutedTransport> {
        ApiClient::with_transport(RoutedTransport, "http://origin".to_string(), "token")
    }

    fn options() -> FetchOptions {
        FetchOptions {
            pool_ids: vec![7],
            langs: vec!["EN".to_string(), "DE".to_string()],
            filter_tk_names: None,
            filter_tk_ids: None,
        }
    }

    #[googletest::test]
    #[tokio::test]
    async fn test_fetch_wraps_markup_and_maps_languages_positionally() {
        let keys =
            fetch_all_tks(&client(), &options(), &CancellationToken::new()).await.unwrap();

        assert_that!(keys.len(), eq(2));
        let greeting = keys.iter().find(|key| key.name == "greeting").unwrap();
        expect_that!(greeting.id, eq(11));
        expect_that!(greeting.pool_id, eq(7));
        expect_that!(greeting.master.as_str(), eq("<root><span data-tag-name=\"A\"/></root>"));
        // 位置対応: EN は包まれたマークアップ、DE は欠落のまま
        expect_that!(
            greeting.languages.get("EN").unwrap().markup.as_deref(),
            some(eq("<root><span data-tag-name=\"A\"/></root>"))
        );
        expect_that!(greeting.languages.get("DE").unwrap().markup.as_deref(), none());
    }

    #[googletest::test]
    #[tokio::test]
    async fn test_filters_are_applied_to_the_listing() {
        let mut by_name = options();
        by_name.filter_tk_names = Some(vec!["greeting".to_string()]);
        let keys =
            fetch_all_tks(&client(), &by_name, &CancellationToken::new()).await.unwrap();
        assert_that!(keys.len(), eq(1));
        expect_that!(keys.first().unwrap().name.as_str(), eq("greeting"));

        let mut by_id = options();
        by_id.filter_tk_ids = Some(vec![12]);
        let keys =
            fetch_all_tks(&client(), &by_id, &CancellationToken::new()).await.unwrap();
        assert_that!(keys.len(), eq(1));
        expect_that!(keys.first().unwrap().id, eq(12));
    }

    #[tokio::test]
    async fn test_cancellation_stops_the_fetch() {
        let cancellation = CancellationToken::new();
        cancellation.cancel();

        let result = fetch_all_tks(&client(), &options(), &cancellation).await;

        assert!(matches!(result, Err(FetchError::Cancelled)));
    }

    #[googletest::test]
    #[tokio::test]
    async fn test_translation_data_round_trips_through_json() {
        let data =
            fetch_translation_data(&client(), &options(), &CancellationToken::new())
                .await
                .unwrap();

        let serialized = serde_json::to_string(&data).unwrap();
        let restored: TranslationData = serde_json::from_str(&serialized).unwrap();

        expect_that!(restored, eq(&data));
    }
}
