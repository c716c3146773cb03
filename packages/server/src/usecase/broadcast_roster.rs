//! UseCase: ロースター配信
//!
//! Registry のスナップショットと Tracker の最終活動時刻から現在の
//! ロースターを組み立て、描画して全接続へ配信する。ロースターは常に
//! 全量（差分ではない）なので、どの呼び出し元から何度流れても冪等。

use std::sync::Arc;

use chrono::Duration;

use tomarigi_shared::time::Clock;

use crate::domain::{RosterEntry, RosterRenderer, UserStatus};
use crate::infrastructure::{ActivityTracker, BroadcastHub, SessionRegistry};

pub struct BroadcastRosterUseCase {
    registry: Arc<SessionRegistry>,
    activity: Arc<ActivityTracker>,
    hub: Arc<BroadcastHub>,
    renderer: Arc<dyn RosterRenderer>,
    clock: Arc<dyn Clock>,
    idle_threshold: Duration,
}

impl BroadcastRosterUseCase {
    pub fn new(
        registry: Arc<SessionRegistry>,
        activity: Arc<ActivityTracker>,
        hub: Arc<BroadcastHub>,
        renderer: Arc<dyn RosterRenderer>,
        clock: Arc<dyn Clock>,
        idle_threshold: Duration,
    ) -> Self {
        Self {
            registry,
            activity,
            hub,
            renderer,
            clock,
            idle_threshold,
        }
    }

    /// 現在のロースターを組み立てる（セッション作成時刻の昇順）
    pub async fn build(&self) -> Vec<RosterEntry> {
        let now = self.clock.now();
        let sessions = self.registry.snapshot().await;
        let mut entries = Vec::with_capacity(sessions.len());
        for session in sessions {
            let last_activity = self.activity.last_seen(&session.user_id).await;
            entries.push(RosterEntry {
                user_id: session.user_id,
                status: UserStatus::derive(last_activity, now, self.idle_threshold),
            });
        }
        entries
    }

    /// ロースターを描画して全接続へ配信する
    pub async fn execute(&self) {
        let entries = self.build().await;
        let payload = self.renderer.render(&entries);
        self.hub.broadcast(&payload).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tokio::sync::mpsc;
    use tomarigi_shared::time::FixedClock;

    use crate::domain::UserId;

    /// ロースターを "user:status" のカンマ区切りに描画するテスト用 renderer
    struct PlainRenderer;

    impl RosterRenderer for PlainRenderer {
        fn render(&self, entries: &[RosterEntry]) -> String {
            entries
                .iter()
                .map(|e| format!("{}:{}", e.user_id.short(), e.status.as_str()))
                .collect::<Vec<_>>()
                .join(",")
        }
    }

    struct TestFixture {
        clock: Arc<FixedClock>,
        registry: Arc<SessionRegistry>,
        activity: Arc<ActivityTracker>,
        hub: Arc<BroadcastHub>,
        usecase: BroadcastRosterUseCase,
    }

    fn create_test_fixture() -> TestFixture {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        ));
        let registry = Arc::new(SessionRegistry::new(clock.clone(), Duration::hours(5)));
        let activity = Arc::new(ActivityTracker::new(clock.clone()));
        let hub = Arc::new(BroadcastHub::new());
        let usecase = BroadcastRosterUseCase::new(
            registry.clone(),
            activity.clone(),
            hub.clone(),
            Arc::new(PlainRenderer),
            clock.clone(),
            Duration::seconds(3),
        );
        TestFixture {
            clock,
            registry,
            activity,
            hub,
            usecase,
        }
    }

    #[tokio::test]
    async fn test_build_orders_entries_by_session_creation() {
        // テスト項目: ロースターがセッション作成時刻の昇順になる
        // given (前提条件):
        let fixture = create_test_fixture();
        let first = fixture.registry.create(UserId::generate()).await;
        fixture.clock.advance(Duration::seconds(1));
        let second = fixture.registry.create(UserId::generate()).await;

        // when (操作):
        let entries = fixture.usecase.build().await;

        // then (期待する結果):
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].user_id, first.user_id);
        assert_eq!(entries[1].user_id, second.user_id);
    }

    #[tokio::test]
    async fn test_build_derives_status_per_user() {
        // テスト項目: 活動記録の有無と経過時間からステータスが決まる
        // given (前提条件):
        let fixture = create_test_fixture();
        let idle = fixture.registry.create(UserId::generate()).await;
        let fresh = fixture.registry.create(UserId::generate()).await;
        fixture.activity.touch(&idle.user_id).await;
        fixture.clock.advance(Duration::seconds(10));
        fixture.activity.touch(&fresh.user_id).await;

        // when (操作):
        let entries = fixture.usecase.build().await;

        // then (期待する結果):
        assert_eq!(entries[0].status, UserStatus::Idle);
        assert_eq!(entries[1].status, UserStatus::Online);
    }

    #[tokio::test]
    async fn test_broadcast_payload_is_pure_function_of_state() {
        // テスト項目: 同じ状態からの 2 回の配信でペイロードが一致する
        // given (前提条件):
        let fixture = create_test_fixture();
        let session = fixture.registry.create(UserId::generate()).await;
        fixture.activity.touch(&session.user_id).await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        fixture.hub.register(tx).await;

        // when (操作):
        fixture.usecase.execute().await;
        fixture.usecase.execute().await;

        // then (期待する結果):
        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first, second);
        assert!(first.contains(session.user_id.short()));
    }
}
