//! Server-side rendering of the chat page.
//!
//! User entries are shown abridged: pasted text is cut to
//! [`USER_PREVIEW_CHARS`] characters, and PDF entries show only their
//! file-name line plus a collapsible preview of the extracted text.
//! Assistant entries are Markdown; raw HTML inside them is displayed as text,
//! never interpreted. Links keep their target only for `http`, `https` and
//! `mailto` (or relative) URLs, and images are reduced to their alt text.

use crate::chat::PDF_MESSAGE_PREFIX;
use crate::pipeline::model::{Device, ModelChoice};
use crate::pipeline::summarize::truncate_chars;
use crate::session::Session;
use crate::transcript::{Message, Role};
use html_escape::encode_text;
use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};
use std::fmt::Write;

/// Pasted text longer than this is cut in the transcript view.
pub const USER_PREVIEW_CHARS: usize = 200;

/// Length of the collapsible preview under a PDF entry.
pub const PDF_PREVIEW_CHARS: usize = 500;

/// Everything the page needs.
pub struct PageView<'a> {
    pub session: &'a Session,
    pub device: Device,
    /// Load status of the selected model: `Err` carries the load error text.
    pub model_status: Result<(), String>,
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; display: flex; min-height: 100vh; }
aside { width: 280px; padding: 20px; background: #fafafa; border-right: 1px solid #ddd; }
main { flex: 1; padding: 20px 40px 60px; max-width: 960px; }
header { display: flex; justify-content: space-between; align-items: center; }
.info { background: #e8f0fe; padding: 8px 12px; border-radius: 6px; margin: 8px 0; }
.success { background: #e6f4ea; padding: 8px 12px; border-radius: 6px; margin: 8px 0; }
.error { background: #fdecea; padding: 8px 12px; border-radius: 6px; margin: 8px 0; white-space: pre-wrap; }
.chat-container { display: flex; flex-direction: column; gap: 10px; padding: 10px 0; }
.user-message { background-color: #e3f2fd; padding: 12px; border-radius: 10px; margin: 10px 0; border-left: 4px solid #2196F3; white-space: pre-wrap; }
.bot-message { background-color: #f5f5f5; padding: 12px; border-radius: 10px; margin: 10px 0; border-left: 4px solid #4CAF50; }
.bot-message strong { color: #2e7d32; }
textarea { width: 100%; min-height: 140px; box-sizing: border-box; }
"#;

/// Render the full page.
pub fn render(view: &PageView<'_>) -> String {
    let mut out = String::with_capacity(8 * 1024);
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str("<title>Article Summarizer Bot</title>\n<style>");
    out.push_str(STYLE);
    out.push_str("</style>\n</head>\n<body>\n");

    render_sidebar(&mut out, view);

    out.push_str("<main>\n<header>\n<h1>🤖 Article Summarizer Bot</h1>\n");
    out.push_str(
        "<form method=\"post\" action=\"/reset\"><button type=\"submit\">🔄 New chat</button></form>\n",
    );
    out.push_str("</header>\n");
    out.push_str("<p>Send me your articles or upload a PDF to summarize them automatically!</p>\n<hr>\n");

    out.push_str("<h3>📄 Upload a PDF</h3>\n");
    out.push_str(
        "<form method=\"post\" action=\"/upload\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"file\" accept=\".pdf,application/pdf\">\n\
         <button type=\"submit\">Summarize PDF</button>\n</form>\n<hr>\n",
    );

    out.push_str("<div class=\"chat-container\">\n");
    for message in view.session.transcript.messages() {
        render_message(&mut out, message);
    }
    out.push_str("</div>\n");

    out.push_str("<h3>✍️ Or type your text directly</h3>\n");
    out.push_str(
        "<form method=\"post\" action=\"/message\">\n\
         <textarea name=\"text\" placeholder=\"📝 Paste your article here...\"></textarea>\n\
         <button type=\"submit\">Send</button>\n</form>\n",
    );
    out.push_str("</main>\n</body>\n</html>\n");
    out
}

fn render_sidebar(out: &mut String, view: &PageView<'_>) {
    let selected = view.session.model;
    out.push_str("<aside>\n<h2>⚙️ Settings</h2>\n");
    out.push_str("<form method=\"post\" action=\"/model\">\n<label for=\"model\">Model:</label>\n");
    out.push_str("<select id=\"model\" name=\"model\" onchange=\"this.form.submit()\">\n");
    for choice in ModelChoice::ALL {
        let _ = writeln!(
            out,
            "<option value=\"{}\"{}>{}</option>",
            choice.slug(),
            if choice == selected { " selected" } else { "" },
            encode_text(choice.label())
        );
    }
    out.push_str("</select>\n<noscript><button type=\"submit\">Apply</button></noscript>\n</form>\n");

    let _ = writeln!(out, "<div class=\"info\">📱 Device: {}</div>", view.device);
    out.push_str("<div class=\"info\">ℹ️ Using the model's default decoding parameters</div>\n");
    match &view.model_status {
        Ok(()) => {
            let _ = writeln!(
                out,
                "<div class=\"success\">✅ {} loaded!</div>",
                encode_text(selected.label())
            );
        }
        Err(e) => {
            let _ = writeln!(out, "<div class=\"error\">❌ {}</div>", encode_text(e));
        }
    }

    out.push_str(
        "<form method=\"post\" action=\"/session/end\"><button type=\"submit\">End session</button></form>\n",
    );
    out.push_str("</aside>\n");
}

fn render_message(out: &mut String, message: &Message) {
    match message.role {
        Role::User => {
            out.push_str("<div class=\"user-message\">👤 ");
            render_user_content(out, &message.content);
            out.push_str("</div>\n");
        }
        Role::Assistant => {
            out.push_str("<div class=\"bot-message\">🤖 ");
            out.push_str(&markdown_to_html(&message.content));
            out.push_str("</div>\n");
        }
    }
}

fn render_user_content(out: &mut String, content: &str) {
    if content.starts_with(PDF_MESSAGE_PREFIX) {
        let (title, body) = content.split_once("\n\n").unwrap_or((content, ""));
        out.push_str(&encode_text(title));
        if !body.is_empty() {
            out.push_str("<details><summary>📖 Content preview</summary>");
            out.push_str(&encode_text(&abridge(body, PDF_PREVIEW_CHARS)));
            out.push_str("</details>");
        }
    } else {
        out.push_str(&encode_text(&abridge(content, USER_PREVIEW_CHARS)));
    }
}

/// First `limit` characters, with `...` appended when something was cut.
pub fn abridge(text: &str, limit: usize) -> String {
    let cut = truncate_chars(text, limit);
    if cut.len() < text.len() {
        format!("{cut}...")
    } else {
        cut.to_string()
    }
}

/// Markdown to HTML with embedded raw HTML shown as literal text.
pub fn markdown_to_html(markdown: &str) -> String {
    // One entry per open link: whether its tags are kept.
    let mut open_links: Vec<bool> = Vec::new();
    let events = Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH).filter_map(|event| {
        match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Some(Event::Text(raw)),
            Event::Start(Tag::Link { ref dest_url, .. }) => {
                let keep = is_safe_url(dest_url);
                open_links.push(keep);
                keep.then_some(event)
            }
            Event::End(TagEnd::Link) => open_links.pop().unwrap_or(false).then_some(event),
            Event::Start(Tag::Image { .. }) | Event::End(TagEnd::Image) => None,
            other => Some(other),
        }
    });
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

/// Relative URLs and `http`, `https` or `mailto` ones.
fn is_safe_url(url: &str) -> bool {
    let cleaned: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    let Some((scheme, _)) = cleaned.split_once(':') else {
        return true;
    };
    // A colon after the first path, query or fragment delimiter is not a scheme.
    if scheme.contains(['/', '?', '#']) {
        return true;
    }
    matches!(scheme, "http" | "https" | "mailto")
}
