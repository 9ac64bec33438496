//! Small utilities shared by the playground and the tools.

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use agent_land_model::ModelId;
use chrono::{DateTime, Local};
use regex::Regex;
use serde_json::{Map, Value};
use uuid::Uuid;

const PLACEHOLDER_KEYS: [&str; 5] = [
    "your_api_key_here",
    "your_openai_api_key_here",
    "your_anthropic_api_key_here",
    "sk-placeholder",
    "api_key_placeholder",
];

static JSON_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    // Both patterns are literals known to compile.
    #[allow(clippy::unwrap_used)]
    [
        Regex::new(r"\{[^{}]*\}").unwrap(),
        Regex::new(r"(?s)\{.*\}").unwrap(),
    ]
});

/// Returns a random UUID.
pub fn generate_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Returns an id like `conv_20250101_120000_1a2b3c4d`.
pub fn generate_conversation_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!(
        "conv_{}_{}",
        Local::now().format("%Y%m%d_%H%M%S"),
        &uuid[..8]
    )
}

/// Follows `keys` through nested objects.
pub fn safe_get_nested<'a>(data: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().try_fold(data, |current, key| current.as_object()?.get(*key))
}

/// Flattens nested objects, joining keys with `separator`.
pub fn flatten_dict(data: &Map<String, Value>, separator: &str) -> Map<String, Value> {
    let mut flat = Map::new();
    flatten_into(&mut flat, data, "", separator);
    flat
}

fn flatten_into(
    flat: &mut Map<String, Value>,
    data: &Map<String, Value>,
    prefix: &str,
    separator: &str,
) {
    for (key, value) in data {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}{separator}{key}")
        };
        match value {
            Value::Object(nested) => flatten_into(flat, nested, &key, separator),
            other => {
                flat.insert(key, other.clone());
            }
        }
    }
}

/// Merges objects left to right. Nested objects present on both sides are
/// merged too; anything else is overwritten.
pub fn merge_dicts<'a, I>(dicts: I) -> Map<String, Value>
where
    I: IntoIterator<Item = &'a Map<String, Value>>,
{
    let mut merged = Map::new();
    for dict in dicts {
        for (key, value) in dict {
            match (merged.get_mut(key), value) {
                (Some(Value::Object(existing)), Value::Object(incoming)) => {
                    *existing = merge_dicts([&*existing, incoming]);
                }
                _ => {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
    }
    merged
}

/// Trims `text`, drops characters outside `allowed_chars`, then cuts it
/// to `max_length` characters.
pub fn sanitize_string(
    text: &str,
    max_length: Option<usize>,
    allowed_chars: Option<&str>,
) -> String {
    let chars = text
        .trim()
        .chars()
        .filter(|c| allowed_chars.is_none_or(|allowed| allowed.contains(*c)));
    match max_length {
        Some(max) => chars.take(max).collect(),
        None => chars.collect(),
    }
}

/// Formats a local time, now if `dt` is `None`.
pub fn format_timestamp(dt: Option<DateTime<Local>>, format: &str) -> String {
    dt.unwrap_or_else(Local::now).format(format).to_string()
}

/// Splits `provider:model`. Without a colon the provider is `unknown`.
#[inline]
pub fn parse_model_string(model: &str) -> ModelId {
    ModelId::parse(model)
}

/// Checks that an API key is long enough and not a known placeholder.
pub fn validate_api_key(api_key: Option<&str>, min_length: usize) -> bool {
    let Some(key) = api_key.map(str::trim) else {
        return false;
    };
    key.chars().count() >= min_length
        && !PLACEHOLDER_KEYS
            .iter()
            .any(|placeholder| placeholder.eq_ignore_ascii_case(key))
}

/// Awaits `fut`, giving up after `timeout`.
pub async fn run_with_timeout<F: Future>(fut: F, timeout: Duration) -> Option<F::Output> {
    tokio::time::timeout(timeout, fut).await.ok()
}

/// Cuts `text` to at most `max_length` characters, ending with `suffix`
/// when cut.
pub fn truncate_text(text: &str, max_length: usize, suffix: &str) -> String {
    if text.chars().count() <= max_length {
        return text.to_owned();
    }
    let keep = max_length.saturating_sub(suffix.chars().count());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(suffix);
    truncated
}

/// Returns the first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Finds the first JSON object embedded in free text.
///
/// Flat objects are tried first, then the widest brace-delimited span.
pub fn extract_json_from_text(text: &str) -> Option<Map<String, Value>> {
    JSON_PATTERNS.iter().find_map(|pattern| {
        pattern
            .find_iter(text)
            .find_map(|m| serde_json::from_str(m.as_str()).ok())
    })
}

/// Jaccard similarity of the lower-cased words of two texts.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let words = |text: &str| -> HashSet<String> {
        text.split_whitespace().map(str::to_lowercase).collect()
    };
    let (a, b) = (words(a), words(b));
    let union = a.union(&b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

/// Upper-cases the first letter of every word and lower-cases the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_ids() {
        let session = generate_session_id();
        assert_eq!(Uuid::parse_str(&session).unwrap().get_version_num(), 4);

        let conv = generate_conversation_id();
        let re = Regex::new(r"^conv_\d{8}_\d{6}_[0-9a-f]{8}$").unwrap();
        assert!(re.is_match(&conv), "{conv}");
    }

    #[test]
    fn test_nested_access() {
        let data = json!({"a": {"b": {"c": 1}}, "x": [1]});
        assert_eq!(safe_get_nested(&data, &["a", "b", "c"]), Some(&json!(1)));
        assert_eq!(safe_get_nested(&data, &["a", "z"]), None);
        assert_eq!(safe_get_nested(&data, &["x", "0"]), None);
        assert_eq!(safe_get_nested(&data, &[]), Some(&data));
    }

    #[test]
    fn test_flatten_and_merge() {
        let data = json!({"a": {"b": 1, "c": {"d": 2}}, "e": 3});
        let flat = flatten_dict(data.as_object().unwrap(), ".");
        assert_eq!(Value::Object(flat), json!({"a.b": 1, "a.c.d": 2, "e": 3}));

        let left = json!({"a": {"x": 1, "y": 1}, "b": 1});
        let right = json!({"a": {"y": 2}, "b": {"z": 1}});
        let merged = merge_dicts([left.as_object().unwrap(), right.as_object().unwrap()]);
        assert_eq!(
            Value::Object(merged),
            json!({"a": {"x": 1, "y": 2}, "b": {"z": 1}})
        );
    }

    #[test]
    fn test_text_helpers() {
        assert_eq!(sanitize_string("  héllo world ", Some(5), None), "héllo");
        assert_eq!(sanitize_string("a-b_c!", None, Some("abc_")), "ab_c");
        assert_eq!(truncate_text("short", 10, "..."), "short");
        assert_eq!(truncate_text("abcdefghijkl", 10, "..."), "abcdefg...");
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 5), "hi");
        assert_eq!(title_case("hello WORLD-wide"), "Hello World-Wide");

        let id = parse_model_string("openai:gpt-4o");
        assert_eq!((id.provider.as_str(), id.name.as_str()), ("openai", "gpt-4o"));
        assert_eq!(parse_model_string("gpt-4o").provider, "unknown");
    }

    #[test]
    fn test_validate_api_key() {
        assert!(validate_api_key(Some("sk-abcdefghijkl"), 10));
        assert!(!validate_api_key(Some("short"), 10));
        assert!(!validate_api_key(Some(" YOUR_API_KEY_HERE "), 10));
        assert!(!validate_api_key(None, 10));
    }

    #[test]
    fn test_extract_json() {
        let text = r#"Sure! Here it is: {"name": "Ada", "age": 36} Hope it helps."#;
        let value = extract_json_from_text(text).unwrap();
        assert_eq!(value["name"], "Ada");

        let nested = r#"result: {"a": {"b": [1, 2]}} done"#;
        assert_eq!(
            Value::Object(extract_json_from_text(nested).unwrap()),
            json!({"a": {"b": [1, 2]}})
        );
        assert_eq!(extract_json_from_text("no json here"), None);
    }

    #[test]
    fn test_similarity() {
        assert_eq!(text_similarity("The cat", "the CAT"), 1.0);
        assert_eq!(text_similarity("a b", "b c"), 1.0 / 3.0);
        assert_eq!(text_similarity("", "x"), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_with_timeout() {
        assert_eq!(run_with_timeout(async { 7 }, Duration::from_secs(1)).await, Some(7));
        let slow = tokio::time::sleep(Duration::from_secs(5));
        assert_eq!(run_with_timeout(slow, Duration::from_secs(1)).await, None);
    }
}
