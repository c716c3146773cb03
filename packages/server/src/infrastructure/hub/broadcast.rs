//! Broadcast Hub
//!
//! ## 責務
//!
//! - 接続中クライアントの sender 集合を管理する（register / unregister）
//! - 全接続への配信（broadcast）と、配信順序を保証する ingress チャンネル
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われる。
//! 各接続には専用の pusher タスクが付き、sender チャンネルの内容を
//! 到着順に sink へ流す。1 つの接続への書き込みはそのタスクだけが行う
//! ので、並行する複数のブロードキャストの断片が混ざることはない。
//!
//! 死んだ接続は次に書き込んだときの送信エラーで検出し、同じ配信パスの
//! 中でそのまま取り除く（遅延検出）。ハートビートは持たない。

use std::collections::HashMap;

use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

/// Hub 内で接続を識別する ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

pub struct BroadcastHub {
    /// 接続中クライアントの sender 集合
    connections: Mutex<HashMap<ConnectionId, mpsc::UnboundedSender<String>>>,
    /// 他のプロデューサーが接続集合に触れずに配信を依頼するための入口
    ingress_tx: mpsc::UnboundedSender<String>,
    /// run() が取り出して排出する受け口
    ingress_rx: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        let (ingress_tx, ingress_rx) = mpsc::unbounded_channel();
        Self {
            connections: Mutex::new(HashMap::new()),
            ingress_tx,
            ingress_rx: Mutex::new(Some(ingress_rx)),
        }
    }

    /// 接続を登録して ID を返す
    pub async fn register(&self, sender: mpsc::UnboundedSender<String>) -> ConnectionId {
        let connection_id = ConnectionId::generate();
        let mut connections = self.connections.lock().await;
        connections.insert(connection_id, sender);
        tracing::debug!(
            "Connection {} registered to hub ({} total)",
            connection_id,
            connections.len(),
        );
        connection_id
    }

    /// 接続を登録解除する（冪等）
    pub async fn unregister(&self, connection_id: ConnectionId) {
        let mut connections = self.connections.lock().await;
        if connections.remove(&connection_id).is_some() {
            tracing::debug!(
                "Connection {} unregistered from hub ({} left)",
                connection_id,
                connections.len(),
            );
        }
    }

    /// 全接続へ payload を配信する
    ///
    /// 送信に失敗した接続は同じ配信パスの中でそのまま取り除く。
    pub async fn broadcast(&self, payload: &str) {
        let mut connections = self.connections.lock().await;
        let mut dead: Vec<ConnectionId> = Vec::new();
        for (connection_id, sender) in connections.iter() {
            if sender.send(payload.to_string()).is_err() {
                dead.push(*connection_id);
            }
        }
        for connection_id in dead {
            connections.remove(&connection_id);
            tracing::debug!("Dropped dead connection {} during broadcast", connection_id);
        }
    }

    /// ingress チャンネル経由で配信を依頼する
    ///
    /// run() が到着順に配信するので、この経路同士の順序は保たれる。
    pub fn submit(&self, payload: String) {
        if self.ingress_tx.send(payload).is_err() {
            tracing::warn!("Hub dispatcher is gone; dropping broadcast payload");
        }
    }

    /// ingress チャンネルを排出し、到着順に broadcast する常駐タスク
    pub async fn run(&self) {
        let mut ingress_rx = match self.ingress_rx.lock().await.take() {
            Some(ingress_rx) => ingress_rx,
            None => {
                tracing::warn!("Hub dispatcher started twice; ignoring");
                return;
            }
        };
        while let Some(payload) = ingress_rx.recv().await {
            self.broadcast(&payload).await;
        }
    }

    /// 現在の接続数
    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}
