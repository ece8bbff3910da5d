//! Tolerant parsing of structured data out of freeform model output.
//!
//! Both the type detector and the multi-intent strategy ask the model for
//! JSON and both must survive the model ignoring the instructions: fenced
//! code blocks, leading chatter, trailing explanations. The salvage
//! functions strip known wrapper markup, cut the text down to the outermost
//! JSON boundaries, and hand the rest to serde. Callers supply the
//! documented default when salvage yields `None`.

use serde_json::Value;

/// Remove surrounding markdown code-fence markup, if any.
pub fn strip_code_fences(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Best-effort extraction of a JSON object from model output.
pub fn salvage_json_object(raw: &str) -> Option<Value> {
    let cleaned = strip_code_fences(raw);

    let candidate = match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if end > start => &cleaned[start..=end],
        _ => cleaned,
    };

    let value: Value = serde_json::from_str(candidate).ok()?;
    value.is_object().then_some(value)
}

/// Best-effort extraction of a JSON array of strings from model output.
/// Returns `None` if the payload is not an array or any element is not a
/// string.
pub fn salvage_string_array(raw: &str) -> Option<Vec<String>> {
    let cleaned = strip_code_fences(raw);

    let candidate = match (cleaned.find('['), cleaned.rfind(']')) {
        (Some(start), Some(end)) if end > start => &cleaned[start..=end],
        _ => cleaned,
    };

    let value: Value = serde_json::from_str(candidate).ok()?;
    let items = value.as_array()?;

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(item.as_str()?.to_string());
    }
    Some(out)
}
