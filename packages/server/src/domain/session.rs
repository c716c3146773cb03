//! セッションと識別子の値オブジェクト

use chrono::{DateTime, Duration, Utc};

use tomarigi_shared::id::generate_token;

/// セッション ID のバイト長（hex で 32 文字、128 bit）
const SESSION_ID_BYTES: usize = 16;

/// ユーザー ID のバイト長（hex で 16 文字）
const USER_ID_BYTES: usize = 8;

/// 画面に表示する短縮 ID の文字数
const SHORT_ID_CHARS: usize = 8;

/// セッション ID（クッキーに載る不透明なランダムトークン）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// 新しいセッション ID を生成する
    pub fn generate() -> Self {
        Self(generate_token(SESSION_ID_BYTES))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    /// クッキーから受け取った値を包む
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// ユーザー ID
///
/// 1 つの論理セッションの間、再接続をまたいで同じ値が使われる匿名識別子。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    /// 新しいユーザー ID を生成する
    pub fn generate() -> Self {
        Self(generate_token(USER_ID_BYTES))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 画面表示とログに使う短縮 ID（先頭 8 文字）
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(SHORT_ID_CHARS)]
    }
}

impl From<String> for UserId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 認証済みのブラウザタブ／端末 1 つに対応する時限セッション
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// 新しいセッションを組み立てる（期限は now + duration）
    pub fn new(user_id: UserId, now: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            id: SessionId::generate(),
            user_id,
            created_at: now,
            expires_at: now + duration,
        }
    }

    /// 絶対期限を過ぎているか（遅延失効の判定に使う）
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
