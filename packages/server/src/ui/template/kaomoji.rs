//! 顔文字ピッカー

use super::escape_html;

/// ピッカーに並べる顔文字
const KAOMOJI: &[&str] = &[
    "(´・ω・`)",
    "(＾▽＾)",
    "(・_・;)",
    "orz",
    "(≧▽≦)",
    "m(_ _)m",
    "(￣ー￣)",
    "Σ(・□・；)",
    "(T_T)",
    "┐(´д`)┌",
    "(｀・ω・´)",
    "(*´ω`*)",
];

/// 顔文字ピッカーのフラグメント
///
/// 各ボタンは入力中の本文ごと /add-emoji へ送り、顔文字を追記した
/// 入力欄を受け取って置き換える。
pub fn picker() -> String {
    let mut html = String::from(r#"<div class="kaomoji-grid">"#);
    for kaomoji in KAOMOJI {
        html.push_str(&format!(
            r##"<button type="button" class="kaomoji-button" hx-post="/add-emoji" hx-target="#message-input" hx-swap="outerHTML" hx-include="#message-input" hx-vals='{{"emoji": "{value}"}}'>{label}</button>"##,
            value = escape_html(kaomoji),
            label = escape_html(kaomoji),
        ));
    }
    html.push_str("</div>");
    html
}
