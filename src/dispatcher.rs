//! レートリミット対応のリクエストディスパッチャ
//!
//! 同一オリジンへの全 HTTP 呼び出しを 1 つのキューに集め、同時実行数の
//! 上限・失敗時の再試行・429 応答によるグローバルバックオフを一括で
//! 面倒みる。
/// キューと実行制御
mod factory;
/// HTTP トランスポート境界
mod transport;

pub use factory::{
    FactoryError,
    FactoryOptions,
    RequestFactory,
    RequestOptions,
    ValueProvider,
};
pub use transport::{
    HttpTransport,
    Method,
    RequestConfig,
    Transport,
    TransportError,
    TransportResponse,
};
