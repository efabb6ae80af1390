// src/utils/html.rs

/// Clean HTML content using the ammonia library.
///
/// Whitelist-based: safe tags (like <b>, <p>) are kept, dangerous tags
/// (like <script>, <iframe>) and event attributes are stripped.
/// Applied to free text that teachers author and students later view.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Sanitizes an optional text field, keeping `None` as is.
pub fn clean_optional(input: Option<&str>) -> Option<String> {
    input.map(clean_html)
}
