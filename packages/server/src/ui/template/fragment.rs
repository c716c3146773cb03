//! WebSocket で配信する htmx out-of-band フラグメント

use crate::domain::{RosterEntry, RosterRenderer, StoredMessage};

use super::{escape_html, formatter};

/// ロースターを htmx OOB フラグメントに描画する `RosterRenderer` 実装
pub struct HtmxRosterRenderer;

impl RosterRenderer for HtmxRosterRenderer {
    fn render(&self, entries: &[RosterEntry]) -> String {
        roster(entries)
    }
}

/// ロースター全体の OOB 更新（#user-list の中身と人数表示）
pub fn roster(entries: &[RosterEntry]) -> String {
    let mut html = String::from(r#"<div hx-swap-oob="innerHTML:#user-list">"#);
    for entry in entries {
        html.push_str(&roster_item(entry));
    }
    html.push_str("</div>");
    html.push_str(&format!(
        r#"<div hx-swap-oob="innerHTML:.user-count">{} online</div>"#,
        entries.len()
    ));
    html
}

/// ロースター 1 行分
pub fn roster_item(entry: &RosterEntry) -> String {
    format!(
        r#"<div class="user-item" title="Session ID: {id}"><span class="user-status user-status-{status}"></span><span class="user-id">{short}</span></div>"#,
        id = escape_html(entry.user_id.as_str()),
        status = entry.status.as_str(),
        short = escape_html(entry.user_id.short()),
    )
}

/// 新着メッセージの OOB 追記
pub fn message_append(message: &StoredMessage) -> String {
    format!(
        r#"<div hx-swap-oob="beforeend:#messages">{}</div>"#,
        message_item(message)
    )
}

/// メッセージ 1 件分（>>N 参照のアンカー先になる id を持つ）
pub fn message_item(message: &StoredMessage) -> String {
    let image = match &message.image_path {
        Some(path) => format!(
            r#"<img class="message-image" src="{}" loading="lazy">"#,
            escape_html(path)
        ),
        None => String::new(),
    };
    format!(
        r#"<div class="message" id="p{id}"><span class="message-username">{username}</span><span class="message-user-id">{short}</span><span class="message-time">{time}</span><div class="message-content">{content}</div>{image}</div>"#,
        id = message.id,
        username = escape_html(&message.username),
        short = escape_html(message.user_id.short()),
        time = message.created_at.format("%H:%M:%S"),
        content = formatter::format_content(&message.content),
    )
}

/// セッション失効の通知（該当接続にだけ送られる）
pub fn session_expired() -> String {
    concat!(
        r#"<div hx-swap-oob="innerHTML:#error-container">"#,
        r#"<div class="error-message">Your session has expired. Please <a href="/" class="error-link">refresh the page</a> to continue.</div>"#,
        r#"</div>"#,
    )
    .to_string()
}

/// 送信成功後に入力欄を初期化するレスポンス
pub fn input_reset() -> String {
    concat!(
        r#"<input id="message-input" name="chat_message" placeholder="Type your message..." autocomplete="off" value="" hx-swap-oob="true">"#,
        r#"<input type="file" id="file-input" name="image" accept="image/*" style="display: none;" hx-swap-oob="true">"#,
        r#"<div id="file-preview" hx-swap-oob="outerHTML"></div>"#,
        r#"<div id="emoji-picker" hx-swap-oob="innerHTML"></div>"#,
    )
    .to_string()
}

/// メッセージ入力欄（顔文字追記後の置き換え用）
pub fn message_input(value: &str) -> String {
    format!(
        r#"<input name="chat_message" id="message-input" placeholder="Type your message..." autocomplete="off" value="{}">"#,
        escape_html(value)
    )
}
