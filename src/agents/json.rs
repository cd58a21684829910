//! JSON extraction from model output.

/// Isolate the JSON object in a model reply.
///
/// Replies in JSON mode are usually the bare object, but some arrive fenced
/// (`` ```json ``) or wrapped in prose. Returns a slice of `text`: the body
/// of the first fence when it holds an object, else the span from the first
/// `{` to the last `}`, else the trimmed input. Nothing is validated here;
/// callers parse the result strictly.
pub fn extract_json_object(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return trimmed;
    }
    if let Some(body) = fenced_body(trimmed).filter(|body| body.starts_with('{')) {
        return body;
    }
    object_span(trimmed).unwrap_or(trimmed)
}

/// Contents of the first ```` ``` ```` block, without its info string.
fn fenced_body(text: &str) -> Option<&str> {
    let rest = &text[text.find("```")? + 3..];
    let rest = match rest.find('\n') {
        Some(nl) if rest[..nl].chars().all(|c| c.is_ascii_alphanumeric()) => &rest[nl + 1..],
        _ => rest,
    };
    let close = rest.find("```")?;
    Some(rest[..close].trim())
}

fn object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
