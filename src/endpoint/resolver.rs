//! Base URL resolution from raw configuration values.

/// Domain suffix for short platform-assigned service names.
const PLATFORM_DOMAIN: &str = "onrender.com";

/// Resolve a raw configuration value into a fully-qualified base URL.
///
/// - absent or blank: `fallback`
/// - explicit `http://` / `https://` scheme: unchanged
/// - no `.` (a bare service name): `https://{raw}.onrender.com`
/// - anything else is a domain: `https://{raw}`
pub fn resolve(raw: Option<&str>, fallback: &str) -> String {
    let raw = match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return fallback.to_string(),
    };

    if raw.starts_with("http://") || raw.starts_with("https://") {
        return raw.to_string();
    }

    if !raw.contains('.') {
        return format!("https://{}.{}", raw, PLATFORM_DOMAIN);
    }

    format!("https://{}", raw)
}
