//! 同時実行数とレートリミットを制御するリクエストキュー
//!
//! 投入されたタスクは決して同期実行されない。ドレインステップが投入時と
//! 各タスクの完了後に走り、空きスロットとバックオフ期限を確認してから
//! 先頭タスクを実行に移す。キュー・実行中カウント・バックオフ期限は
//! ファクトリインスタンスごとの状態で、プロセス全体では共有しない。

use std::collections::VecDeque;
use std::fmt;
use std::sync::{
    Arc,
    Mutex,
    MutexGuard,
    PoisonError,
};

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::time::{
    Duration,
    Instant,
    sleep_until,
};

use super::transport::{
    RequestConfig,
    Transport,
    TransportError,
    TransportResponse,
};

/// `Retry-After` が無い・不正なときに適用するバックオフ
const DEFAULT_RATE_LIMIT_MILLIS: u64 = 5000;
/// Authorization ヘッダ名
const AUTHORIZATION: &str = "Authorization";

/// 静的な値、または遅延評価される供給関数
///
/// 認証ヘッダや同時実行上限のように、呼び出しのたびに外部から取り直す
/// 可能性のある設定値を表す。
pub enum ValueProvider<T> {
    /// 固定値
    Static(T),
    /// 必要になった時点で呼ばれる供給関数
    Dynamic(Box<dyn Fn() -> BoxFuture<'static, T> + Send + Sync>),
}

impl<T: Clone> ValueProvider<T> {
    async fn resolve(&self) -> T {
        match self {
            Self::Static(value) => value.clone(),
            Self::Dynamic(supplier) => supplier().await,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ValueProvider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// ファクトリ構築時の設定
#[derive(Debug)]
pub struct FactoryOptions {
    /// 診断用の識別子（ログに載る）
    pub id: String,
    /// Authorization ヘッダ値の供給元
    ///
    /// リクエスト側で既にヘッダが設定されている場合は解決すらしない。
    pub auth_header: Option<ValueProvider<String>>,
    /// 同時実行リクエスト数の上限。`None` で無制限
    pub max_ongoing_requests: Option<ValueProvider<usize>>,
    /// 失敗時の最大試行回数。`None`・0 は 1 として扱う
    pub max_attempts: Option<ValueProvider<u32>>,
    /// レートリミット解除後に追加で待つ安全マージン
    pub rate_limit_safety_period: Duration,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            auth_header: None,
            max_ongoing_requests: None,
            max_attempts: None,
            rate_limit_safety_period: Duration::from_millis(500),
        }
    }
}

/// リクエスト投入時のオプション
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestOptions {
    /// キューの先頭へ割り込むかどうか
    pub priority: bool,
}

/// ディスパッチャ経由のリクエストの失敗
#[derive(Debug, Error)]
pub enum FactoryError {
    /// 試行回数を使い切った末の失敗。元のエラーをそのまま運ぶ
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// 完了前に内部チャネルが失われた
    #[error("request was dropped before completion")]
    Dropped,
}

struct QueuedTask {
    config: RequestConfig,
    failed_attempts: u32,
    done: oneshot::Sender<Result<TransportResponse, FactoryError>>,
}

struct FactoryState {
    queue: VecDeque<QueuedTask>,
    ongoing: usize,
    rate_limit_until: Option<Instant>,
}

struct FactoryInner<T> {
    options: FactoryOptions,
    transport: T,
    state: Mutex<FactoryState>,
}

/// 同一オリジンへの全リクエストを制御するディスパッチャ
///
/// クローンは同じキューを共有する。1 インスタンスは 1 つの取得
/// オーケストレーションに所有され、無関係な実行間で暗黙共有しない。
pub struct RequestFactory<T: Transport> {
    inner: Arc<FactoryInner<T>>,
}

impl<T: Transport> Clone for RequestFactory<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T: Transport> RequestFactory<T> {
    /// ディスパッチャを作成する
    #[must_use]
    pub fn new(transport: T, options: FactoryOptions) -> Self {
        let state =
            FactoryState { queue: VecDeque::new(), ongoing: 0, rate_limit_until: None };
        Self { inner: Arc::new(FactoryInner { options, transport, state: Mutex::new(state) }) }
    }

    /// リクエストをキューへ投入し、完了を待つ
    ///
    /// `priority` 指定時はキューの先頭へ割り込む（優先タスク同士では
    /// 後から投入したものが先）。それ以外は末尾に並ぶ。
    pub async fn request(
        &self,
        config: RequestConfig,
        options: RequestOptions,
    ) -> Result<TransportResponse, FactoryError> {
        let (done, receiver) = oneshot::channel();
        let task = QueuedTask { config, failed_attempts: 0, done };
        {
            let mut state = self.lock_state();
            if options.priority {
                state.queue.push_front(task);
            } else {
                state.queue.push_back(task);
            }
        }
        self.trigger_next();

        receiver.await.map_err(|_| FactoryError::Dropped)?
    }

    /// ドレインステップを 1 回分、非同期にスケジュールする
    fn trigger_next(&self) {
        let factory = self.clone();
        let _join = tokio::spawn(async move { factory.trigger().await });
    }

    /// ドレインステップ本体
    async fn trigger(&self) {
        // レートリミット中は期限まで一切デキューしない
        self.wait_for_rate_limit().await;

        let Some(mut task) = self.dequeue().await else {
            return;
        };

        // Authorization ヘッダが未設定の場合だけここで解決して付与する
        if !task.config.headers.contains_key(AUTHORIZATION) {
            if let Some(provider) = &self.inner.options.auth_header {
                let value = provider.resolve().await;
                task.config.headers.insert(AUTHORIZATION.to_string(), value);
            }
        }

        // デキュー後に期限が動いた可能性があるため、発行直前にもう一度待つ
        self.wait_for_rate_limit().await;

        let outcome = self.inner.transport.send(&task.config).await;
        self.settle(task, outcome).await;

        {
            let mut state = self.lock_state();
            state.ongoing = state.ongoing.saturating_sub(1);
        }
        // 呼び出し側が次の投入を待っていなくてもキューを動かし続ける
        self.trigger_next();
    }

    /// 空きスロットがあれば先頭タスクを取り出し、実行中カウントを増やす
    async fn dequeue(&self) -> Option<QueuedTask> {
        {
            let state = self.lock_state();
            if state.queue.is_empty() {
                return None;
            }
        }

        // 上限は動的に供給されることがあるため、ロックの外で解決する
        let max_ongoing = match &self.inner.options.max_ongoing_requests {
            Some(provider) => Some(provider.resolve().await),
            None => None,
        };

        let mut state = self.lock_state();
        if let Some(max) = max_ongoing {
            if state.ongoing >= max {
                return None;
            }
        }
        let task = state.queue.pop_front()?;
        state.ongoing += 1;
        Some(task)
    }

    /// 実行結果に応じてタスクを完了・再キューする
    async fn settle(&self, mut task: QueuedTask, outcome: Result<TransportResponse, TransportError>) {
        match outcome {
            Ok(response) => {
                let _ = task.done.send(Ok(response));
            }
            Err(error) if error.is_rate_limited() => {
                // 429 は試行回数を消費せず、バックオフ後に先頭から再試行する
                self.apply_rate_limit(error.retry_after());
                self.lock_state().queue.push_front(task);
            }
            Err(error) => {
                task.failed_attempts += 1;
                let max_attempts = match &self.inner.options.max_attempts {
                    Some(provider) => provider.resolve().await.max(1),
                    None => 1,
                };
                if task.failed_attempts >= max_attempts {
                    let _ = task.done.send(Err(FactoryError::Transport(error)));
                } else {
                    // 再試行は新しい作業より先に実行する
                    self.lock_state().queue.push_front(task);
                }
            }
        }
    }

    /// `Retry-After` からバックオフ期限を更新する。期限は単調にしか動かない
    fn apply_rate_limit(&self, retry_after_secs: Option<u64>) {
        let millis = match retry_after_secs {
            Some(secs) if secs > 0 => secs.saturating_mul(1000),
            _ => DEFAULT_RATE_LIMIT_MILLIS,
        };
        let candidate = Instant::now() + Duration::from_millis(millis);

        let mut state = self.lock_state();
        if state.rate_limit_until.is_none_or(|until| until < candidate) {
            state.rate_limit_until =
                Some(candidate + self.inner.options.rate_limit_safety_period);
            tracing::warn!(
                factory_id = %self.inner.options.id,
                retry_millis = millis,
                "Applying rate limit to request factory"
            );
        }
    }

    /// バックオフ期限が未来にある間は待機する
    async fn wait_for_rate_limit(&self) {
        loop {
            let deadline = self.lock_state().rate_limit_until;
            match deadline {
                Some(until) if until > Instant::now() => sleep_until(until).await,
                _ => return,
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, FactoryState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
