//! UseCase: 在席統計
//!
//! /api/status 向けの `{total, online, idle, near_timeout}` を導出する。
//! near_timeout は「idle のうち、強制終了まで残り 2 分を切ったユーザー」。

use std::sync::Arc;

use chrono::Duration;

use tomarigi_shared::time::Clock;

use crate::domain::PresenceStats;
use crate::infrastructure::{ActivityTracker, SessionRegistry};

/// 強制終了の何分前から near_timeout と数えるか
const NEAR_TIMEOUT_MARGIN_MINUTES: i64 = 2;

pub struct PresenceStatsUseCase {
    registry: Arc<SessionRegistry>,
    activity: Arc<ActivityTracker>,
    clock: Arc<dyn Clock>,
    idle_threshold: Duration,
    max_idle_time: Duration,
}

impl PresenceStatsUseCase {
    pub fn new(
        registry: Arc<SessionRegistry>,
        activity: Arc<ActivityTracker>,
        clock: Arc<dyn Clock>,
        idle_threshold: Duration,
        max_idle_time: Duration,
    ) -> Self {
        Self {
            registry,
            activity,
            clock,
            idle_threshold,
            max_idle_time,
        }
    }

    pub async fn execute(&self) -> PresenceStats {
        let now = self.clock.now();
        let sessions = self.registry.snapshot().await;
        let near_timeout_threshold =
            self.max_idle_time - Duration::minutes(NEAR_TIMEOUT_MARGIN_MINUTES);

        let mut stats = PresenceStats {
            total: sessions.len(),
            online: 0,
            idle: 0,
            near_timeout: 0,
        };

        for session in sessions {
            match self.activity.last_seen(&session.user_id).await {
                None => stats.online += 1,
                Some(last_activity) => {
                    let inactive = now.signed_duration_since(last_activity);
                    if inactive > self.idle_threshold {
                        stats.idle += 1;
                        if inactive > near_timeout_threshold {
                            stats.near_timeout += 1;
                        }
                    } else {
                        stats.online += 1;
                    }
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tomarigi_shared::time::FixedClock;

    use crate::domain::UserId;

    struct TestFixture {
        clock: Arc<FixedClock>,
        registry: Arc<SessionRegistry>,
        activity: Arc<ActivityTracker>,
        usecase: PresenceStatsUseCase,
    }

    /// idle_threshold 3 分、max_idle_time 10 分の構成で組み立てる
    fn create_test_fixture() -> TestFixture {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        ));
        let registry = Arc::new(SessionRegistry::new(clock.clone(), Duration::hours(5)));
        let activity = Arc::new(ActivityTracker::new(clock.clone()));
        let usecase = PresenceStatsUseCase::new(
            registry.clone(),
            activity.clone(),
            clock.clone(),
            Duration::minutes(3),
            Duration::minutes(10),
        );
        TestFixture {
            clock,
            registry,
            activity,
            usecase,
        }
    }

    #[tokio::test]
    async fn test_stats_empty() {
        // テスト項目: セッションが無ければ全カウントが 0 になる
        // given (前提条件):
        let fixture = create_test_fixture();

        // when (操作):
        let stats = fixture.usecase.execute().await;

        // then (期待する結果):
        assert_eq!(
            stats,
            PresenceStats {
                total: 0,
                online: 0,
                idle: 0,
                near_timeout: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_stats_counts_user_without_record_as_online() {
        // テスト項目: 活動記録が無いユーザーは online に数えられる
        // given (前提条件):
        let fixture = create_test_fixture();
        fixture.registry.create(UserId::generate()).await;

        // when (操作):
        let stats = fixture.usecase.execute().await;

        // then (期待する結果):
        assert_eq!(stats.total, 1);
        assert_eq!(stats.online, 1);
        assert_eq!(stats.idle, 0);
    }

    #[tokio::test]
    async fn test_stats_buckets_online_idle_and_near_timeout() {
        // テスト項目: online / idle / near_timeout が正しく振り分けられる
        // given (前提条件): 3 ユーザーの最終活動をずらして記録する
        let fixture = create_test_fixture();
        let near_timeout = fixture.registry.create(UserId::generate()).await;
        let idle = fixture.registry.create(UserId::generate()).await;
        let online = fixture.registry.create(UserId::generate()).await;

        // near_timeout: 9 分無活動（閾値 10 - 2 = 8 分を超える）
        fixture.activity.touch(&near_timeout.user_id).await;
        fixture.clock.advance(Duration::minutes(4));
        // idle: 5 分無活動（3 分は超えるが 8 分には届かない）
        fixture.activity.touch(&idle.user_id).await;
        fixture.clock.advance(Duration::minutes(5));
        // online: 活動したばかり
        fixture.activity.touch(&online.user_id).await;

        // when (操作):
        let stats = fixture.usecase.execute().await;

        // then (期待する結果):
        assert_eq!(stats.total, 3);
        assert_eq!(stats.online, 1);
        assert_eq!(stats.idle, 2);
        assert_eq!(stats.near_timeout, 1);
    }
}
