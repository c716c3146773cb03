//! アプリケーション設定

use std::time::Duration as StdDuration;

use chrono::Duration;

/// サービス全体の調整値
///
/// `Default` は本番想定の値を返す。
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 共有アクセスキー
    pub access_key: String,
    /// セッションの絶対有効期間
    pub session_duration: Duration,
    /// 照合ループの周期
    pub cleanup_interval: StdDuration,
    /// これを超えて無活動だと表示上 idle になる
    pub idle_threshold: Duration,
    /// これを超えて無活動だとセッションを強制終了する
    pub max_idle_time: Duration,
    /// 画像アップロードの上限バイト数
    pub max_upload_size: usize,
    /// 保持するメッセージ件数の上限
    pub history_limit: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            access_key: "test".to_string(), // change in prod!
            session_duration: Duration::hours(5),
            cleanup_interval: StdDuration::from_secs(30),
            idle_threshold: Duration::seconds(3),
            max_idle_time: Duration::seconds(60),
            max_upload_size: 5 * 1024 * 1024,
            history_limit: 500,
        }
    }
}
