use once_cell::sync::Lazy;
use regex::Regex;

static FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)```(?:sqlite|sql)?[ \t]*\n?(.*?)```").unwrap()
});

/// Pull the sql out of a model reply, dropping markdown fences the model was told not to emit.
pub fn extract_sql(reply: &str) -> String {
    let text = reply.trim();

    let text = match FENCE_REGEX.captures(text) {
        Some(captures) => captures.get(1).map(|m| m.as_str()).unwrap_or(text),
        None => text,
    };

    text.trim().to_string()
}
