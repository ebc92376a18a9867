//! Minimal HTML-to-text extraction shared by every non-feed, non-filing
//! adapter. No third-party HTML parser — intentionally simple, "good
//! enough" text for downstream scoring and contextualization.

fn truncate_byte_boundary(s: &str, max_bytes: usize) -> usize {
    if s.len() <= max_bytes {
        return s.len();
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}

/// Strips tags, collapses whitespace, and drops `<script>`, `<style>`,
/// `<nav>`, `<header>`, `<footer>` blocks.
pub fn html_to_text(html: &str, max_chars: usize) -> String {
    let mut cleaned = String::with_capacity(html.len());
    let mut skip_depth: usize = 0;
    let mut chars = html.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '<' {
            let mut tag_chars = Vec::new();
            let is_close = chars.peek() == Some(&'/');
            if is_close {
                chars.next();
            }

            while let Some(&c) = chars.peek() {
                if c == '>' || c == ' ' || c == '/' {
                    break;
                }
                tag_chars.push(c);
                chars.next();
            }
            let tag_name: String = tag_chars.into_iter().collect::<String>().to_ascii_lowercase();

            while let Some(&c) = chars.peek() {
                if c == '>' {
                    chars.next();
                    break;
                }
                chars.next();
            }

            let strip_tags = ["script", "style", "nav", "header", "footer", "noscript", "svg"];
            if strip_tags.contains(&tag_name.as_str()) {
                if is_close {
                    skip_depth = skip_depth.saturating_sub(1);
                } else {
                    skip_depth += 1;
                }
                continue;
            }

            if skip_depth > 0 {
                continue;
            }

            let block_tags = [
                "p", "div", "br", "h1", "h2", "h3", "h4", "h5", "h6", "li", "tr", "td", "th",
                "article", "section", "main",
            ];
            if block_tags.contains(&tag_name.as_str()) {
                cleaned.push('\n');
            }
        } else if skip_depth == 0 {
            cleaned.push(ch);
        }
    }

    let cleaned = cleaned
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ");

    let mut result = String::with_capacity(cleaned.len().min(max_chars + 64));
    let mut prev_was_space = true;
    let mut consecutive_newlines = 0u32;
    for ch in cleaned.chars() {
        if ch == '\n' {
            consecutive_newlines += 1;
            if consecutive_newlines <= 2 {
                result.push('\n');
            }
            prev_was_space = true;
        } else if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
            consecutive_newlines = 0;
        } else {
            result.push(ch);
            prev_was_space = false;
            consecutive_newlines = 0;
        }
        if result.len() >= max_chars {
            break;
        }
    }

    let trimmed = result.trim().to_string();
    if trimmed.len() > max_chars {
        let safe_end = truncate_byte_boundary(&trimmed, max_chars);
        let end = trimmed[..safe_end].rfind(' ').unwrap_or(safe_end);
        format!("{}…", &trimmed[..end])
    } else {
        trimmed
    }
}

/// Pulls `<title>`, interesting `<meta>` tags, and `application/ld+json`
/// blocks — the data that survives JS-heavy single-page apps where the
/// rendered body is empty boilerplate.
pub fn extract_structured_data(html: &str) -> String {
    let mut lines: Vec<String> = Vec::new();

    if let Some(start) = html.to_ascii_lowercase().find("<title") {
        if let Some(gt) = html[start..].find('>') {
            let after = start + gt + 1;
            if let Some(end) = html[after..].find("</") {
                let title = html[after..after + end].trim();
                if !title.is_empty() && title.len() < 500 {
                    lines.push(format!("Title: {title}"));
                }
            }
        }
    }

    let lower = html.to_ascii_lowercase();
    let interesting_attrs = [
        "og:title",
        "og:description",
        "og:type",
        "description",
        "twitter:title",
        "twitter:description",
    ];
    let price_keywords = ["price", "amount", "stock", "ticker", "quote"];

    let mut search_from = 0;
    while let Some(pos) = lower[search_from..].find("<meta") {
        let abs_pos = search_from + pos;
        let tag_end = match html[abs_pos..].find('>') {
            Some(e) => abs_pos + e,
            None => break,
        };
        let tag = &html[abs_pos..=tag_end];
        let tag_lower = &lower[abs_pos..=tag_end];

        let attr_val = |attr: &str| -> Option<&str> {
            let needle = format!("{attr}=\"");
            tag_lower.find(&needle).and_then(|i| {
                let start = i + needle.len();
                tag[start..].find('"').map(|end| tag[start..start + end].trim())
            })
        };

        let name = attr_val("name").or_else(|| attr_val("property")).unwrap_or("");
        let content = attr_val("content").unwrap_or("");

        if !content.is_empty() && content.len() < 500 {
            let name_lower = name.to_ascii_lowercase();
            let is_interesting = interesting_attrs.iter().any(|a| name_lower == *a)
                || price_keywords.iter().any(|kw| name_lower.contains(kw));
            if is_interesting {
                lines.push(format!("meta[{name}]: {content}"));
            }
        }

        search_from = tag_end + 1;
    }

    let ld_marker = "application/ld+json";
    let mut ld_from = 0;
    while let Some(pos) = lower[ld_from..].find(ld_marker) {
        let abs_pos = ld_from + pos;
        let script_body_start = match html[abs_pos..].find('>') {
            Some(e) => abs_pos + e + 1,
            None => break,
        };
        let script_body_end = match lower[script_body_start..].find("</script") {
            Some(e) => script_body_start + e,
            None => break,
        };
        let json_str = html[script_body_start..script_body_end].trim();
        if !json_str.is_empty() && json_str.len() < 8000 {
            if let Ok(val) = serde_json::from_str::<serde_json::Value>(json_str) {
                let summary = summarise_ld_json(&val);
                if !summary.is_empty() {
                    lines.push(format!("LD+JSON: {summary}"));
                }
            }
        }
        ld_from = script_body_end + 1;
    }

    lines.join("\n")
}

fn summarise_ld_json(val: &serde_json::Value) -> String {
    if let Some(graph) = val.get("@graph").and_then(|g| g.as_array()) {
        let summaries: Vec<String> = graph
            .iter()
            .filter_map(|item| {
                let s = summarise_ld_json(item);
                if s.is_empty() {
                    None
                } else {
                    Some(s)
                }
            })
            .take(3)
            .collect();
        return summaries.join(" | ");
    }

    let mut parts: Vec<String> = Vec::new();
    let type_val = val.get("@type").and_then(|t| t.as_str()).unwrap_or("");
    if !type_val.is_empty() {
        parts.push(format!("type={type_val}"));
    }
    for key in &[
        "name",
        "headline",
        "description",
        "tickerSymbol",
        "price",
        "priceCurrency",
        "url",
        "datePublished",
    ] {
        if let Some(v) = val.get(*key) {
            let text = match v {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                _ => continue,
            };
            if !text.is_empty() && text.len() < 300 {
                parts.push(format!("{key}={text}"));
            }
        }
    }
    if parts.len() <= 1 {
        return String::new();
    }
    parts.join("; ")
}

/// Extract outbound `href` URLs from an HTML document body — used by the
/// resource-list-page detector and expander in `scoutdesk-gatherer`.
pub fn extract_links(html: &str) -> Vec<String> {
    let mut urls = Vec::new();
    let lower = html.to_ascii_lowercase();
    let mut search_from = 0;
    while let Some(pos) = lower[search_from..].find("href=\"") {
        let abs = search_from + pos + "href=\"".len();
        if let Some(end) = html[abs..].find('"') {
            let url = html[abs..abs + end].trim();
            if url.starts_with("http://") || url.starts_with("https://") {
                urls.push(url.to_string());
            }
            search_from = abs + end;
        } else {
            break;
        }
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_and_style_content() {
        let html = "<html><style>.x{color:red}</style><body><p>Hello <b>world</b></p></body></html>";
        let text = html_to_text(html, 1000);
        assert!(text.contains("Hello"));
        assert!(!text.contains("color:red"));
    }

    #[test]
    fn extracts_title_and_ld_json() {
        let html = r#"<html><head><title>Acme Inc</title>
            <script type="application/ld+json">{"@type":"Organization","name":"Acme"}</script>
            </head><body></body></html>"#;
        let structured = extract_structured_data(html);
        assert!(structured.contains("Title: Acme Inc"));
        assert!(structured.contains("Acme"));
    }

    #[test]
    fn extract_links_finds_absolute_hrefs() {
        let html = r#"<a href="https://example.com/a">a</a><a href="/relative">b</a>"#;
        let links = extract_links(html);
        assert_eq!(links, vec!["https://example.com/a".to_string()]);
    }
}
