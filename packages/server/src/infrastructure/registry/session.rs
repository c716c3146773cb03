//! Session Registry
//!
//! セッション ID → セッションのインメモリ台帳。セッションのライフサイクル
//! （発行・検証・削除・失効）はすべてこの型の操作を通して行う。
//!
//! ## 並行性
//!
//! 台帳全体を 1 つの `RwLock` で保護する。書き込み系（create / remove /
//! remove_expired / remove_idle）は排他ロック、読み取り系（validate /
//! snapshot / active_user_ids）は共有ロックを取る。ロックはマップ操作の
//! 間だけ保持し、I/O やブロードキャストをまたいで保持しない。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use tomarigi_shared::time::Clock;

use crate::domain::{Session, SessionId, UserId};

pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Session>>,
    clock: Arc<dyn Clock>,
    session_duration: Duration,
}

impl SessionRegistry {
    pub fn new(clock: Arc<dyn Clock>, session_duration: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock,
            session_duration,
        }
    }

    /// 新しいセッションを発行して登録する
    pub async fn create(&self, user_id: UserId) -> Session {
        let session = Session::new(user_id, self.clock.now(), self.session_duration);
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session.clone());
        session
    }

    /// セッションを検証する
    ///
    /// 期限切れのセッションは、Reconciler がまだ物理削除していなくても
    /// 「存在しない」ものとして扱う（遅延失効）。状態は変更しない。
    pub async fn validate(&self, session_id: &SessionId) -> Option<Session> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(session_id)?;
        if session.is_expired(self.clock.now()) {
            return None;
        }
        Some(session.clone())
    }

    /// セッションを削除する（冪等）
    pub async fn remove(&self, session_id: &SessionId) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id);
    }

    /// 有効なセッションを作成時刻の昇順で返す
    ///
    /// ロースターの並び順はこのスナップショットがそのまま決める。
    pub async fn snapshot(&self) -> Vec<Session> {
        let now = self.clock.now();
        let sessions = self.sessions.read().await;
        let mut active: Vec<Session> = sessions
            .values()
            .filter(|s| !s.is_expired(now))
            .cloned()
            .collect();
        active.sort_by_key(|s| s.created_at);
        active
    }

    /// 有効なセッションを持つユーザー ID を返す
    pub async fn active_user_ids(&self) -> Vec<UserId> {
        let now = self.clock.now();
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .filter(|s| !s.is_expired(now))
            .map(|s| s.user_id.clone())
            .collect()
    }

    /// 絶対期限を過ぎたセッションを 1 回の排他ロックで取り除き、
    /// 影響を受けたユーザー ID を返す
    pub async fn remove_expired(&self) -> Vec<UserId> {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;
        let doomed: Vec<SessionId> = sessions
            .values()
            .filter(|s| s.is_expired(now))
            .map(|s| s.id.clone())
            .collect();
        let mut removed = Vec::with_capacity(doomed.len());
        for session_id in doomed {
            if let Some(session) = sessions.remove(&session_id) {
                removed.push(session.user_id);
            }
        }
        removed
    }

    /// 活動記録が無い、または `max_idle_time` を超えて無活動のユーザーの
    /// セッションを 1 回の排他ロックで取り除き、ユーザー ID を返す
    ///
    /// `last_seen` は Tracker の時点スナップショット。Registry と Tracker
    /// のロックを同時に保持しないため、呼び出し側が先に取得して渡す。
    pub async fn remove_idle(
        &self,
        last_seen: &HashMap<UserId, DateTime<Utc>>,
        max_idle_time: Duration,
    ) -> Vec<UserId> {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;
        let doomed: Vec<(SessionId, UserId)> = sessions
            .values()
            .filter(|s| match last_seen.get(&s.user_id) {
                None => true,
                Some(t) => now.signed_duration_since(*t) > max_idle_time,
            })
            .map(|s| (s.id.clone(), s.user_id.clone()))
            .collect();
        for (session_id, user_id) in &doomed {
            sessions.remove(session_id);
            match last_seen.get(user_id) {
                Some(t) => tracing::info!(
                    "Terminating idle session for user {} (idle for {}s)",
                    user_id.short(),
                    now.signed_duration_since(*t).num_seconds(),
                ),
                None => tracing::info!(
                    "Terminating session for user {} (no recorded activity)",
                    user_id.short(),
                ),
            }
        }
        doomed.into_iter().map(|(_, user_id)| user_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tomarigi_shared::time::FixedClock;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn create_test_registry() -> (Arc<FixedClock>, SessionRegistry) {
        let clock = Arc::new(FixedClock::new(base_time()));
        let registry = SessionRegistry::new(clock.clone(), Duration::hours(5));
        (clock, registry)
    }

    #[tokio::test]
    async fn test_create_and_validate() {
        // テスト項目: 発行したセッションが検証を通る
        // given (前提条件):
        let (_clock, registry) = create_test_registry();

        // when (操作):
        let session = registry.create(UserId::generate()).await;
        let validated = registry.validate(&session.id).await;

        // then (期待する結果):
        assert_eq!(validated, Some(session));
    }

    #[tokio::test]
    async fn test_validate_unknown_session() {
        // テスト項目: 存在しないセッション ID の検証は absent になる
        // given (前提条件):
        let (_clock, registry) = create_test_registry();

        // when (操作):
        let validated = registry.validate(&SessionId::generate()).await;

        // then (期待する結果):
        assert_eq!(validated, None);
    }

    #[tokio::test]
    async fn test_validate_lazy_expiry() {
        // テスト項目: 期限を過ぎたセッションは物理削除前でも absent になる
        // given (前提条件):
        let (clock, registry) = create_test_registry();
        let session = registry.create(UserId::generate()).await;

        // when (操作): 期限の 1 分後まで進める（remove は呼ばない）
        clock.advance(Duration::hours(5) + Duration::minutes(1));

        // then (期待する結果):
        assert_eq!(registry.validate(&session.id).await, None);
    }

    #[tokio::test]
    async fn test_validate_just_before_expiry() {
        // テスト項目: 期限の直前まではセッションが有効
        // given (前提条件):
        let (clock, registry) = create_test_registry();
        let session = registry.create(UserId::generate()).await;

        // when (操作): 4 時間 59 分まで進める
        clock.advance(Duration::hours(4) + Duration::minutes(59));

        // then (期待する結果):
        assert!(registry.validate(&session.id).await.is_some());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        // テスト項目: remove を 2 回呼んでもエラーにならず状態も変わらない
        // given (前提条件):
        let (_clock, registry) = create_test_registry();
        let session = registry.create(UserId::generate()).await;

        // when (操作):
        registry.remove(&session.id).await;
        registry.remove(&session.id).await;

        // then (期待する結果):
        assert_eq!(registry.validate(&session.id).await, None);
        assert!(registry.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_ordered_by_creation_time() {
        // テスト項目: スナップショットが作成時刻の昇順で返る
        // given (前提条件):
        let (clock, registry) = create_test_registry();
        let first = registry.create(UserId::generate()).await;
        clock.advance(Duration::seconds(10));
        let second = registry.create(UserId::generate()).await;
        clock.advance(Duration::seconds(10));
        let third = registry.create(UserId::generate()).await;

        // when (操作):
        let snapshot = registry.snapshot().await;

        // then (期待する結果):
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].id, first.id);
        assert_eq!(snapshot[1].id, second.id);
        assert_eq!(snapshot[2].id, third.id);
    }

    #[tokio::test]
    async fn test_snapshot_excludes_expired_sessions() {
        // テスト項目: 期限切れのセッションはスナップショットに出ない
        // given (前提条件):
        let (clock, registry) = create_test_registry();
        let old = registry.create(UserId::generate()).await;
        clock.advance(Duration::hours(5) + Duration::minutes(1));
        let fresh = registry.create(UserId::generate()).await;

        // when (操作):
        let snapshot = registry.snapshot().await;

        // then (期待する結果):
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, fresh.id);
        assert_ne!(snapshot[0].id, old.id);
    }

    #[tokio::test]
    async fn test_remove_expired_returns_affected_users() {
        // テスト項目: 失効パスが期限切れセッションだけを取り除く
        // given (前提条件):
        let (clock, registry) = create_test_registry();
        let old = registry.create(UserId::generate()).await;
        clock.advance(Duration::hours(5) + Duration::minutes(1));
        let fresh = registry.create(UserId::generate()).await;

        // when (操作):
        let removed = registry.remove_expired().await;

        // then (期待する結果):
        assert_eq!(removed, vec![old.user_id]);
        assert!(registry.validate(&fresh.id).await.is_some());
    }

    #[tokio::test]
    async fn test_remove_idle_terminates_inactive_users() {
        // テスト項目: 無活動のユーザーのセッションだけが終了する
        // given (前提条件):
        let (clock, registry) = create_test_registry();
        let idle = registry.create(UserId::generate()).await;
        let active = registry.create(UserId::generate()).await;

        let mut last_seen = HashMap::new();
        last_seen.insert(idle.user_id.clone(), clock.now());
        clock.advance(Duration::seconds(61));
        last_seen.insert(active.user_id.clone(), clock.now());

        // when (操作):
        let removed = registry.remove_idle(&last_seen, Duration::seconds(60)).await;

        // then (期待する結果):
        assert_eq!(removed, vec![idle.user_id]);
        assert_eq!(registry.validate(&idle.id).await, None);
        assert!(registry.validate(&active.id).await.is_some());
    }

    #[tokio::test]
    async fn test_remove_idle_terminates_users_without_record() {
        // テスト項目: 活動記録の無いユーザーのセッションも終了する
        // given (前提条件):
        let (_clock, registry) = create_test_registry();
        let session = registry.create(UserId::generate()).await;

        // when (操作): 空の Tracker スナップショットを渡す
        let removed = registry
            .remove_idle(&HashMap::new(), Duration::seconds(60))
            .await;

        // then (期待する結果):
        assert_eq!(removed, vec![session.user_id]);
        assert!(registry.snapshot().await.is_empty());
    }
}
