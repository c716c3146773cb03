//! UseCase: チャット履歴の取得
//!
//! 現在アクティブなユーザーのメッセージだけを古い順で返す。退出済み
//! ユーザーの行が掃除より先に画面へ出ないよう、毎回 Registry の
//! スナップショットで絞り込む。

use std::sync::Arc;

use crate::domain::{MessageRepository, RepositoryError, StoredMessage, UserId};
use crate::infrastructure::SessionRegistry;

pub struct FetchHistoryUseCase {
    registry: Arc<SessionRegistry>,
    messages: Arc<dyn MessageRepository>,
    history_limit: i64,
}

impl FetchHistoryUseCase {
    pub fn new(
        registry: Arc<SessionRegistry>,
        messages: Arc<dyn MessageRepository>,
        history_limit: i64,
    ) -> Self {
        Self {
            registry,
            messages,
            history_limit,
        }
    }

    pub async fn execute(&self) -> Result<Vec<StoredMessage>, RepositoryError> {
        let user_ids: Vec<UserId> = self
            .registry
            .snapshot()
            .await
            .into_iter()
            .map(|s| s.user_id)
            .collect();
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.messages
            .recent_for_users(&user_ids, self.history_limit)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use tokio::sync::Mutex;
    use tomarigi_shared::time::FixedClock;

    use crate::domain::NewMessage;

    /// recent_for_users の呼び出しを記録して固定の履歴を返すテスト用 Repository
    struct RecordingRepository {
        queried_user_ids: Mutex<Vec<Vec<UserId>>>,
        history: Vec<StoredMessage>,
    }

    impl RecordingRepository {
        fn new(history: Vec<StoredMessage>) -> Self {
            Self {
                queried_user_ids: Mutex::new(Vec::new()),
                history,
            }
        }
    }

    #[async_trait]
    impl MessageRepository for RecordingRepository {
        async fn insert(&self, _message: NewMessage) -> Result<StoredMessage, RepositoryError> {
            unreachable!("insert is not used by FetchHistoryUseCase")
        }

        async fn recent_for_users(
            &self,
            user_ids: &[UserId],
            _limit: i64,
        ) -> Result<Vec<StoredMessage>, RepositoryError> {
            self.queried_user_ids.lock().await.push(user_ids.to_vec());
            Ok(self.history.clone())
        }
    }

    fn create_test_registry() -> Arc<SessionRegistry> {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        ));
        Arc::new(SessionRegistry::new(clock, Duration::hours(5)))
    }

    #[tokio::test]
    async fn test_fetch_history_skips_query_without_active_users() {
        // テスト項目: アクティブなユーザーがいなければ DB に問い合わせない
        // given (前提条件):
        let registry = create_test_registry();
        let repository = Arc::new(RecordingRepository::new(Vec::new()));
        let usecase = FetchHistoryUseCase::new(registry, repository.clone(), 500);

        // when (操作):
        let messages = usecase.execute().await.unwrap();

        // then (期待する結果):
        assert!(messages.is_empty());
        assert!(repository.queried_user_ids.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_history_queries_active_user_ids() {
        // テスト項目: アクティブなユーザー ID だけで履歴を問い合わせる
        // given (前提条件):
        let registry = create_test_registry();
        let session = registry.create(UserId::generate()).await;
        let repository = Arc::new(RecordingRepository::new(Vec::new()));
        let usecase = FetchHistoryUseCase::new(registry, repository.clone(), 500);

        // when (操作):
        usecase.execute().await.unwrap();

        // then (期待する結果):
        let queried = repository.queried_user_ids.lock().await;
        assert_eq!(queried.as_slice(), &[vec![session.user_id]]);
    }
}
