//! 実行オプションの定義・検証・既定値
/// オプションと検証エラーの型
mod types;
/// 検証と既定値の適用
mod validate;

pub use types::{
    CheckOptions,
    OptionsError,
    OutputFormat,
    ValidationError,
};
