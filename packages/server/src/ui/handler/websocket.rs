//! WebSocket connection handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Extension,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::sync::mpsc;

use crate::domain::Session;

use super::super::{state::AppState, template};

/// 失効通知を送ってからソケットを閉じるまでの猶予
const EXPIRY_NOTICE_GRACE: Duration = Duration::from_millis(100);

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> impl IntoResponse {
    state.activity.touch(&session.user_id).await;
    ws.on_upgrade(move |socket| handle_socket(socket, state, session))
}

/// Spawns a task that drains the per-connection channel into the WebSocket sink.
///
/// 1 つの接続への書き込みはこのタスクだけが行う。チャンネルの到着順に
/// 流すので、並行するブロードキャストの断片が混ざらない。
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, session: Session) {
    let (sender, receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();

    let connection_id = state.hub.register(tx.clone()).await;
    tracing::info!("User {} connected over WebSocket", session.user_id.short());

    // 新しい接続にも現在のロースターが映るよう、全員に配信し直す
    state.roster.execute().await;

    let mut send_task = pusher_loop(rx, sender);
    let mut recv_task = tokio::spawn(read_loop(receiver, state.clone(), session.clone(), tx));

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.hub.unregister(connection_id).await;
    tracing::info!("User {} disconnected", session.user_id.short());
    state.roster.execute().await;
}

/// クライアントからのフレームを読み続けるループ
///
/// 内容は使わない（サーバーからの push 専用プロトコル）。フレームが
/// 届くたびにセッションを再検証し、失効していたらこの接続にだけ
/// 失効通知を送って閉じる。読み取りエラーはこの接続だけを終わらせる。
async fn read_loop(
    mut receiver: SplitStream<WebSocket>,
    state: Arc<AppState>,
    session: Session,
    tx: mpsc::UnboundedSender<String>,
) {
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(
                    "WebSocket read error for user {}: {}",
                    session.user_id.short(),
                    e,
                );
                break;
            }
        }

        if state.registry.validate(&session.id).await.is_none() {
            // 一度だけ通知し、届くだけの猶予を置いてから閉じる
            let _ = tx.send(template::fragment::session_expired());
            tokio::time::sleep(EXPIRY_NOTICE_GRACE).await;
            tracing::info!(
                "Closing connection for expired session of user {}",
                session.user_id.short(),
            );
            break;
        }
    }
}
