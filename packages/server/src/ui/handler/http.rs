//! HTTP endpoint handlers.

use std::sync::Arc;

use axum::{
    Extension, Form, Json,
    extract::{Multipart, Query, State},
    http::{StatusCode, header::SET_COOKIE},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::domain::Session;
use crate::usecase::{AuthError, OutgoingMessage, SendMessageError, UploadedImage};

use super::super::{middleware::session_cookie, state::AppState, template};

/// Query parameters for the greeter page
#[derive(Debug, Deserialize)]
pub struct GreeterQuery {
    pub error: Option<String>,
}

/// ログイン（greeter）ページ
pub async fn greeter(Query(query): Query<GreeterQuery>) -> Html<String> {
    Html(template::greeter_page(query.error.as_deref()))
}

/// Form fields for /auth
#[derive(Debug, Deserialize)]
pub struct AuthForm {
    #[serde(default)]
    pub access_key: String,
}

/// アクセスキー認証
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    Form(form): Form<AuthForm>,
) -> Response {
    match state.authenticate.execute(&form.access_key).await {
        Ok(session) => {
            let max_age = state.config.session_duration.num_seconds();
            let cookie = session_cookie(session.id.as_str(), max_age);
            ([(SET_COOKIE, cookie)], Redirect::to("/chat")).into_response()
        }
        Err(AuthError::InvalidKey) => Redirect::to("/?error=invalid_key").into_response(),
    }
}

/// チャット画面
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Response {
    state.activity.touch(&session.user_id).await;

    let messages = match state.fetch_history.execute().await {
        Ok(messages) => messages,
        Err(e) => {
            tracing::error!("Failed to load chat history: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };
    let roster = state.roster.build().await;
    Html(template::chat_page(&messages, &session.user_id, &roster)).into_response()
}

/// メッセージ送信（multipart フォーム）
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    multipart: Multipart,
) -> Response {
    let outgoing = match read_outgoing(multipart).await {
        Ok(outgoing) => outgoing,
        Err(response) => return response,
    };

    match state.send_message.execute(&session, outgoing).await {
        Ok(stored) => {
            // 新着メッセージは ingress 経由で到着順に配信される
            state.hub.submit(template::fragment::message_append(&stored));
            state.roster.execute().await;
            Html(template::fragment::input_reset()).into_response()
        }
        Err(e) => send_message_error(e),
    }
}

/// multipart フォームを OutgoingMessage に読み下す
async fn read_outgoing(mut multipart: Multipart) -> Result<OutgoingMessage, Response> {
    let mut outgoing = OutgoingMessage {
        username: String::new(),
        content: String::new(),
        image: None,
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Malformed multipart request: {}", e);
                return Err((StatusCode::BAD_REQUEST, "Malformed form data").into_response());
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("username") => outgoing.username = read_text_field(field).await?,
            Some("chat_message") => outgoing.content = read_text_field(field).await?,
            Some("image") => {
                let ext = extension_of(field.file_name());
                let data = match field.bytes().await {
                    // 画像未選択でも空の image フィールドが届く
                    Ok(bytes) if bytes.is_empty() => continue,
                    Ok(bytes) => bytes.to_vec(),
                    Err(e) => {
                        tracing::warn!("Failed to read uploaded file: {}", e);
                        return Err(
                            (StatusCode::BAD_REQUEST, "Malformed form data").into_response()
                        );
                    }
                };
                outgoing.image = Some(UploadedImage { data, ext });
            }
            _ => {}
        }
    }

    Ok(outgoing)
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, Response> {
    field.text().await.map_err(|e| {
        tracing::warn!("Failed to read form field: {}", e);
        (StatusCode::BAD_REQUEST, "Malformed form data").into_response()
    })
}

/// 元ファイル名から "." 付きの拡張子を取り出す（無ければ ".jpg"）
fn extension_of(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| format!(".{ext}"))
        .unwrap_or_else(|| ".jpg".to_string())
}

fn send_message_error(err: SendMessageError) -> Response {
    match err {
        SendMessageError::SessionExpired => {
            (StatusCode::UNAUTHORIZED, "Session expired").into_response()
        }
        SendMessageError::EmptyMessage => {
            (StatusCode::BAD_REQUEST, "Message cannot be empty").into_response()
        }
        SendMessageError::FileTooLarge(_) => {
            (StatusCode::BAD_REQUEST, "File too large (max 5MB)").into_response()
        }
        SendMessageError::InvalidImage => {
            (StatusCode::BAD_REQUEST, "Invalid image format").into_response()
        }
        SendMessageError::Storage(e) => {
            tracing::error!("Failed to store message: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response()
        }
        SendMessageError::Upload(e) => {
            tracing::error!("Failed to save upload: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error saving file").into_response()
        }
    }
}

/// ログアウト
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Response {
    state.logout.execute(&session).await;
    let cookie = session_cookie("", -1);
    ([(SET_COOKIE, cookie)], Redirect::to("/")).into_response()
}

/// 顔文字ピッカー
pub async fn kaomoji_picker() -> Html<String> {
    Html(template::kaomoji::picker())
}

/// Form fields for /add-emoji
#[derive(Debug, Deserialize)]
pub struct AddKaomojiForm {
    #[serde(default)]
    pub chat_message: String,
    #[serde(default)]
    pub emoji: String,
}

/// 入力中のメッセージに顔文字を追記した入力欄を返す
pub async fn add_kaomoji(Form(form): Form<AddKaomojiForm>) -> Html<String> {
    let content = format!("{}{}", form.chat_message, form.emoji);
    Html(template::fragment::message_input(&content))
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// 在席統計エンドポイント
pub async fn presence_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let stats = state.stats.execute().await;
    Json(serde_json::json!({
        "total": stats.total,
        "online": stats.online,
        "idle": stats.idle,
        "near_timeout": stats.near_timeout,
        "idle_threshold": format!("{}s", state.config.idle_threshold.num_seconds()),
        "max_idle_time": format!("{}s", state.config.max_idle_time.num_seconds()),
    }))
}
