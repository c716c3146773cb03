//! リソース掃除のインターフェース

use async_trait::async_trait;

use super::session::UserId;

/// 退出・失効したユーザーの痕跡を消す collaborator
///
/// Reconciler とログアウト処理から呼ばれる。すべて best-effort で、
/// 失敗はログに残すだけで呼び出し側へは伝播しない（1 ユーザーの失敗が
/// 他のユーザーの掃除や次の tick を妨げない）。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceCleaner: Send + Sync {
    /// 該当ユーザーのメッセージと画像ファイルを削除する
    async fn purge_user(&self, user_id: &UserId);

    /// アクティブでないユーザーのメッセージを削除する
    ///
    /// アクティブなユーザーが 1 人もいなければ全メッセージを消す。
    async fn purge_orphans(&self, active_user_ids: &[UserId]);

    /// 履歴上限を超えた古いメッセージを削除する
    async fn prune_history(&self);
}
