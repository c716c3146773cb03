//! Presence Reconciler
//!
//! 一定周期で在席状態を照合する常駐タスク。1 回の tick は次を順に行う:
//!
//! 1. アイドル終了パス: 活動記録が無い、または max_idle_time を超えて
//!    無活動のユーザーのセッションを終了する
//! 2. 失効パス: 絶対期限を過ぎたセッションを取り除く
//! 3. 取り除いたユーザーの痕跡削除（メッセージと画像）を背景タスクへ積む
//! 4. ロースターを無条件に配信し直し、孤児メッセージを掃除する。
//!    アクティブなユーザーが 1 人もいなければ全メッセージが消える
//!
//! collaborator のエラーは tick を止めない。Reconciler 自体は
//! プロセスの生存期間じゅう動き続け、停止する手段を持たない。
//!
//! ## ロック規律
//!
//! アイドル判定は Tracker のスナップショットに対して行うので、
//! Registry と Tracker のロックを同時に保持する経路は存在しない。
//! 両方に触る操作は常に Registry → Tracker の順で逐次に行う。

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::domain::{ResourceCleaner, UserId};
use crate::infrastructure::{ActivityTracker, SessionRegistry};

use super::broadcast_roster::BroadcastRosterUseCase;

pub struct PresenceReconciler {
    registry: Arc<SessionRegistry>,
    activity: Arc<ActivityTracker>,
    roster: Arc<BroadcastRosterUseCase>,
    cleaner: Arc<dyn ResourceCleaner>,
    max_idle_time: Duration,
    cleanup_interval: StdDuration,
    /// tick が積んだ掃除タスクの置き場
    ///
    /// 終わったタスクは次の tick の冒頭で回収する。テストは
    /// `drain_cleanup_tasks` で完了を待てる。
    cleanup_tasks: Mutex<JoinSet<()>>,
}

impl PresenceReconciler {
    pub fn new(
        registry: Arc<SessionRegistry>,
        activity: Arc<ActivityTracker>,
        roster: Arc<BroadcastRosterUseCase>,
        cleaner: Arc<dyn ResourceCleaner>,
        max_idle_time: Duration,
        cleanup_interval: StdDuration,
    ) -> Self {
        Self {
            registry,
            activity,
            roster,
            cleaner,
            max_idle_time,
            cleanup_interval,
            cleanup_tasks: Mutex::new(JoinSet::new()),
        }
    }

    /// プロセスの生存期間じゅう動き続ける照合ループ
    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.cleanup_interval);
        // interval は生成直後に 1 回発火するので読み捨てる
        // （最初の照合は 1 周期後）
        ticker.tick().await;
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// 1 回分の照合
    pub async fn tick(&self) {
        self.reap_finished_cleanups().await;

        self.terminate_idle_sessions().await;
        self.cleanup_expired_sessions().await;

        // UI の取りこぼし防止のため、削除が無くても毎 tick 配信し直す
        self.roster.execute().await;

        let active = self.registry.active_user_ids().await;
        self.cleaner.purge_orphans(&active).await;
    }

    /// アイドル終了パス
    ///
    /// Tracker を先にスナップショットし、Registry の排他ロック 1 回で
    /// 対象セッションを取り除いてから、Tracker の記録を別のロックで消す。
    async fn terminate_idle_sessions(&self) {
        let last_seen = self.activity.snapshot().await;
        let removed = self
            .registry
            .remove_idle(&last_seen, self.max_idle_time)
            .await;
        if removed.is_empty() {
            return;
        }
        self.activity.forget_all(&removed).await;
        self.spawn_cleanup(removed).await;
    }

    /// 失効パス
    async fn cleanup_expired_sessions(&self) {
        let removed = self.registry.remove_expired().await;
        if removed.is_empty() {
            return;
        }
        for user_id in &removed {
            tracing::info!("Session expired for user {}", user_id.short());
        }
        self.activity.forget_all(&removed).await;
        self.spawn_cleanup(removed).await;
    }

    /// 取り除いたユーザー群の痕跡削除を背景タスクに積む
    ///
    /// tick 本体もロースター配信もこのタスクを待たない。パスごとに
    /// 1 タスクで、中ではユーザーを順に処理して最後に履歴を刈り込む。
    async fn spawn_cleanup(&self, user_ids: Vec<UserId>) {
        let cleaner = self.cleaner.clone();
        let mut cleanup_tasks = self.cleanup_tasks.lock().await;
        cleanup_tasks.spawn(async move {
            for user_id in &user_ids {
                cleaner.purge_user(user_id).await;
            }
            cleaner.prune_history().await;
        });
    }

    /// 終わった掃除タスクを回収する
    async fn reap_finished_cleanups(&self) {
        let mut cleanup_tasks = self.cleanup_tasks.lock().await;
        while cleanup_tasks.try_join_next().is_some() {}
    }

    /// 積まれている掃除タスクをすべて待つ（テスト用の同期点）
    pub async fn drain_cleanup_tasks(&self) {
        let mut cleanup_tasks = self.cleanup_tasks.lock().await;
        while cleanup_tasks.join_next().await.is_some() {}
    }
}
