//! セッション認可ミドルウェア

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap,
        header::{COOKIE, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::domain::SessionId;

use super::state::AppState;

/// セッションクッキーの名前
pub const SESSION_COOKIE: &str = "session_id";

/// Cookie ヘッダから session_id の値を取り出す
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// Set-Cookie 用の値を組み立てる（max_age が負ならクッキー削除）
pub fn session_cookie(value: &str, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={value}; Max-Age={max_age_secs}; Path=/; HttpOnly")
}

/// 保護ルートの認可ミドルウェア
///
/// クッキーのセッションを Registry で検証し（遅延失効込み）、通った
/// リクエストには Session を extension として渡す。検証に失敗したら
/// ログイン画面へ戻す。
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(raw_id) = session_id_from_headers(request.headers()) else {
        return Redirect::to("/?error=no_session").into_response();
    };

    let session_id = SessionId::from(raw_id);
    let Some(session) = state.registry.validate(&session_id).await else {
        // 失効済みクッキーは消してからログイン画面へ戻す
        let mut response = Redirect::to("/?error=session_expired").into_response();
        if let Ok(cookie) = session_cookie("", -1).parse() {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
        return response;
    };

    request.extensions_mut().insert(session);
    next.run(request).await
}
