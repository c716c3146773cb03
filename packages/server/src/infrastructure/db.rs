//! データベース接続とスキーマ初期化

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// プールに持つ最大接続数
const MAX_CONNECTIONS: u32 = 25;

/// 接続プールを作成する
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
}

/// messages テーブルとインデックスを用意する（冪等）
pub async fn setup_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS messages ( \
             id SERIAL PRIMARY KEY, \
             username VARCHAR(255) NOT NULL, \
             content TEXT NOT NULL, \
             user_id VARCHAR(255) NOT NULL, \
             image_path VARCHAR(255), \
             created_at TIMESTAMPTZ NOT NULL DEFAULT NOW() \
         )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_user_id ON messages(user_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_created_at ON messages(created_at DESC)")
        .execute(pool)
        .await?;

    tracing::info!("Database schema ready");
    Ok(())
}
