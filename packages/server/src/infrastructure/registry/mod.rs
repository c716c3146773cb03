//! インメモリの在席ストア
//!
//! - `session`: セッション ID → セッションの台帳（Session Registry）
//! - `activity`: ユーザー ID → 最終活動時刻の記録（Activity Tracker）
//!
//! 2 つのストアは意図的に別々のロックを持つ。在席の読み出しが
//! セッションの変更を待たされないようにするためで、両方に触る操作は
//! 常に Registry → Tracker の順で、ロックを同時に保持せずに行う。

pub mod activity;
pub mod session;

pub use activity::ActivityTracker;
pub use session::SessionRegistry;
