//! ルーターとハンドラ
//!
//! 検証失敗は 400、それ以外のパイプライン失敗は 500 に写像する。成功時は
//! 要求フォーマットに対応するコンテンツタイプで整形済みレポートを返す。

use axum::extract::State;
use axum::http::{
    HeaderMap,
    StatusCode,
    header,
};
use axum::response::{
    IntoResponse,
    Json,
    Response,
};
use axum::routing::{
    get,
    post,
};
use axum::Router;
use serde::Serialize;

use crate::check::{
    PipelineError,
    check_translations,
};
use crate::config::CheckOptions;
use crate::types::ALL_LANGS;

/// サーバー起動時に注入される実行環境設定
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// プラットフォームのオリジン（`TRANSLATION_ORIGIN`）
    pub origin: String,
}

/// ルーターを構築する
#[must_use]
pub fn create_router(config: AppConfig) -> Router {
    Router::new()
        .route("/translation-checker/all-langs", get(all_langs))
        .route("/translation-checker/execute", post(execute))
        .with_state(config)
}

#[derive(Debug, Serialize)]
struct AllLangsResponse {
    langs: Vec<&'static str>,
}

/// 対応言語の一覧
async fn all_langs() -> Json<AllLangsResponse> {
    Json(AllLangsResponse { langs: ALL_LANGS.to_vec() })
}

/// エラーを HTTP ステータスへ写像する応答
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip)]
    status: StatusCode,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<PipelineError> for ErrorResponse {
    fn from(error: PipelineError) -> Self {
        let status = match &error {
            PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { error: error.to_string(), status }
    }
}

/// チェックを実行し、整形済みレポートを返す
///
/// アクセストークンは `Authorization` ヘッダから、オリジンはサーバーの
/// 環境から取る。ボディ側の指定は上書きされる。
async fn execute(
    State(config): State<AppConfig>,
    headers: HeaderMap,
    Json(mut options): Json<CheckOptions>,
) -> Result<Response, ErrorResponse> {
    if let Some(auth) = headers.get(header::AUTHORIZATION).and_then(|value| value.to_str().ok()) {
        options.access_token = auth.trim_start_matches("Bearer ").to_string();
    }
    options.origin = config.origin.clone();

    let output = check_translations(&options).await?;
    Ok(([(header::CONTENT_TYPE, output.content_type())], output.data).into_response())
}
