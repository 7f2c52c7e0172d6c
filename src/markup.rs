// Plain text to the minimal HTML the note service stores as note bodies.

/// Four non-breaking spaces stand in for a tab.
const TAB_HTML: &str = "&nbsp;&nbsp;&nbsp;&nbsp;";

/// Convert raw text into escaped HTML, keeping line breaks and spacing
/// visible. Escaping runs first so the inserted entities are not escaped
/// again.
pub fn text_to_html(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "");
    html_escape::encode_safe(&text)
        .replace('\n', "<br>")
        .replace(' ', "&nbsp;")
        .replace('\t', TAB_HTML)
}
