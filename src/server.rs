//! ホスティング用 HTTP エンドポイント
/// ルーターとハンドラ
mod handlers;

pub use handlers::{
    AppConfig,
    create_router,
};
