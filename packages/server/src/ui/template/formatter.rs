//! メッセージ本文のテキスト装飾
//!
//! 行単位で greentext / bluetext を付け、>>N 参照と URL をリンク化し、
//! インライン装飾（コード・赤字・スポイラー・太字・斜体）を適用する。
//! 装飾の置換はエスケープ済みの文字列に対して行う。

use std::sync::LazyLock;

use regex::Regex;

use super::escape_html;

static POST_REFERENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">>\d+").unwrap());

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"((?:\w+://)[\w./%\-:=#?&]+)").unwrap());

/// インライン装飾（順序に意味がある: ** は * より先に処理する）
static EFFECTS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new("`(.+?)`").unwrap(), "<code>$1</code>"),
        (
            Regex::new("==(.+?)==").unwrap(),
            r#"<span class="redtext">$1</span>"#,
        ),
        (
            Regex::new("%%(.+?)%%").unwrap(),
            r#"<span class="spoiler">$1</span>"#,
        ),
        (Regex::new(r"\*\*(.+?)\*\*").unwrap(), "<b>$1</b>"),
        (Regex::new(r"\*(.+?)\*").unwrap(), "<i>$1</i>"),
    ]
});

/// メッセージ本文を表示用 HTML へ変換する
pub fn format_content(content: &str) -> String {
    let lines: Vec<String> = content
        .split('\n')
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.starts_with('>') && !trimmed.starts_with(">>") {
                format!(r#"<span class="greentext">{}</span>"#, escape_html(line))
            } else if trimmed.starts_with('<') {
                format!(r#"<span class="bluetext">{}</span>"#, escape_html(line))
            } else {
                format_line_with_references(line)
            }
        })
        .collect();
    lines.join("<br>")
}

/// >>N 参照をアンカーにしつつ、残りをエスケープして装飾する
///
/// 参照をいったんプレースホルダへ逃がしてから全体をエスケープし、
/// 最後に組み立て済みのアンカーを戻す。
fn format_line_with_references(line: &str) -> String {
    const PLACEHOLDER: &str = "{{POST_REF}}";

    let mut anchors: Vec<String> = Vec::new();
    let with_placeholders = POST_REFERENCE.replace_all(line, |caps: &regex::Captures<'_>| {
        let reference = &caps[0];
        let post_id = &reference[2..];
        anchors.push(format!(
            r##"<a href="#p{id}" class="post-reference">{text}</a>"##,
            id = escape_html(post_id),
            text = escape_html(reference),
        ));
        PLACEHOLDER.to_string()
    });

    let mut escaped = escape_html(&with_placeholders);
    for anchor in anchors {
        escaped = escaped.replacen(PLACEHOLDER, &anchor, 1);
    }

    apply_text_effects(&escaped)
}

fn apply_text_effects(line: &str) -> String {
    let mut line = URL.replace_all(line, r#"<a href="$1">$1</a>"#).to_string();
    for (pattern, replacement) in EFFECTS.iter() {
        line = pattern.replace_all(&line, *replacement).to_string();
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_escaped() {
        // テスト項目: 装飾の無い本文がエスケープだけされて返る
        // given (前提条件):

        // when (操作):
        let html = format_content("hello <world>");

        // then (期待する結果):
        assert_eq!(html, "hello &lt;world&gt;");
    }

    #[test]
    fn test_greentext_line() {
        // テスト項目: ">" で始まる行が greentext になる
        // given (前提条件):

        // when (操作):
        let html = format_content("> implying");

        // then (期待する結果):
        assert_eq!(
            html,
            r#"<span class="greentext">&gt; implying</span>"#
        );
    }

    #[test]
    fn test_bluetext_line() {
        // テスト項目: "<" で始まる行が bluetext になる
        // given (前提条件):

        // when (操作):
        let html = format_content("< take it back");

        // then (期待する結果):
        assert_eq!(
            html,
            r#"<span class="bluetext">&lt; take it back</span>"#
        );
    }

    #[test]
    fn test_post_reference_becomes_anchor() {
        // テスト項目: >>N がアンカーになり、greentext にはならない
        // given (前提条件):

        // when (操作):
        let html = format_content(">>42 nice");

        // then (期待する結果):
        assert_eq!(
            html,
            r##"<a href="#p42" class="post-reference">&gt;&gt;42</a> nice"##
        );
    }

    #[test]
    fn test_url_is_linked() {
        // テスト項目: URL がリンクになる
        // given (前提条件):

        // when (操作):
        let html = format_content("see https://example.com/page?q=1");

        // then (期待する結果):
        assert_eq!(
            html,
            r#"see <a href="https://example.com/page?q=1">https://example.com/page?q=1</a>"#
        );
    }

    #[test]
    fn test_inline_effects() {
        // テスト項目: コード・太字・斜体・赤字・スポイラーが変換される
        // given (前提条件):

        // when (操作):

        // then (期待する結果):
        assert_eq!(format_content("`code`"), "<code>code</code>");
        assert_eq!(format_content("**bold**"), "<b>bold</b>");
        assert_eq!(format_content("*italic*"), "<i>italic</i>");
        assert_eq!(
            format_content("==red=="),
            r#"<span class="redtext">red</span>"#
        );
        assert_eq!(
            format_content("%%spoiler%%"),
            r#"<span class="spoiler">spoiler</span>"#
        );
    }

    #[test]
    fn test_bold_wins_over_italic() {
        // テスト項目: ** が * より先に解釈される
        // given (前提条件):

        // when (操作):
        let html = format_content("**strong** and *soft*");

        // then (期待する結果):
        assert_eq!(html, "<b>strong</b> and <i>soft</i>");
    }

    #[test]
    fn test_multiline_joined_with_br() {
        // テスト項目: 改行が <br> になり、行ごとに装飾される
        // given (前提条件):

        // when (操作):
        let html = format_content("first\n> second");

        // then (期待する結果):
        assert_eq!(
            html,
            r#"first<br><span class="greentext">&gt; second</span>"#
        );
    }

    #[test]
    fn test_script_injection_is_neutralized() {
        // テスト項目: タグの注入が常にエスケープされる
        // given (前提条件):

        // when (操作):
        let html = format_content("<script>alert(1)</script> hi");

        // then (期待する結果): 行頭 "<" なので bluetext 化され、中身は実体参照になる
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
