//! Server-rendered HTML pages and fragments.
//!
//! htmx の out-of-band swap を前提にした素朴な文字列組み立て。
//! テンプレートエンジンは使わず、描画はすべて純関数で行う。

pub mod formatter;
pub mod fragment;
pub mod kaomoji;

use crate::domain::{RosterEntry, StoredMessage, UserId};

/// HTML の特殊文字をエスケープする
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// ログイン（greeter）ページ
pub fn greeter_page(error: Option<&str>) -> String {
    let banner = match error {
        Some("invalid_key") => r#"<div class="error-message">Invalid access key.</div>"#,
        Some("no_session") => r#"<div class="error-message">Please sign in first.</div>"#,
        Some("session_expired") => {
            r#"<div class="error-message">Your session has expired. Please sign in again.</div>"#
        }
        _ => "",
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>tomarigi</title>
<link rel="stylesheet" href="/static/greeter.css">
</head>
<body>
<main class="greeter">
<h1>tomarigi</h1>
<p class="tagline">an ephemeral perch</p>
{banner}
<form method="post" action="/auth">
<input type="password" name="access_key" placeholder="Access key" autocomplete="off" autofocus>
<button type="submit">Enter</button>
</form>
</main>
</body>
</html>
"#
    )
}

/// チャットページ
///
/// WebSocket からの OOB フラグメントが差し替える要素（#messages、
/// #user-list、.user-count、#error-container）をここで用意する。
pub fn chat_page(
    messages: &[StoredMessage],
    current_user: &UserId,
    roster: &[RosterEntry],
) -> String {
    let message_items: String = messages.iter().map(fragment::message_item).collect();
    let roster_items: String = roster.iter().map(|e| fragment::roster_item(e)).collect();

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>tomarigi</title>
<link rel="stylesheet" href="/static/chat.css">
<script src="https://unpkg.com/htmx.org@1.9.12"></script>
<script src="https://unpkg.com/htmx.org@1.9.12/dist/ext/ws.js"></script>
</head>
<body hx-ext="ws" ws-connect="/ws">
<div id="error-container"></div>
<div class="chat-layout">
<aside class="sidebar">
<div class="user-count">{count} online</div>
<div id="user-list">{roster_items}</div>
<div class="you">you: {short_id}</div>
<form method="post" action="/logout"><button type="submit" class="leave-button">Leave</button></form>
</aside>
<main class="chat-main">
<div id="messages">{message_items}</div>
<form id="message-form" hx-post="/send-message" hx-encoding="multipart/form-data" hx-swap="none">
<input id="username-input" name="username" placeholder="Anon" autocomplete="off">
<input id="message-input" name="chat_message" placeholder="Type your message..." autocomplete="off" value="">
<button type="button" id="attach-button" title="Attach image">&#128206;</button>
<input type="file" id="file-input" name="image" accept="image/*" style="display: none;">
<div id="file-preview"></div>
<button type="button" hx-get="/emojis" hx-target="#emoji-picker" hx-swap="innerHTML" title="Kaomoji">&#9786;</button>
<div id="emoji-picker"></div>
<button type="submit">Send</button>
</form>
</main>
</div>
<script src="/static/chat.js"></script>
</body>
</html>
"##,
        count = roster.len(),
        short_id = escape_html(current_user.short()),
    )
}
