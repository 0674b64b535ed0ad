//! Respondent identity as reported by the authenticating proxy.

/// Proxy headers carrying the signed-in user, in order of preference.
pub const IDENTITY_HEADERS: [&str; 5] = [
    "remote-user",
    "x-forwarded-user",
    "x-remote-user",
    "x-ms-client-principal-name",
    "x-ms-client-principal",
];

/// Normalizes `user@domain` into `domain\user`; other forms are kept trimmed.
pub fn normalize_identifier(raw: &str) -> String {
    let raw = raw.trim();
    if raw.contains('@') && !raw.contains('\\') {
        if let Some((user, domain)) = raw.split_once('@') {
            if !user.is_empty() && !domain.is_empty() {
                return format!("{}\\{}", domain, user);
            }
        }
    }
    raw.to_string()
}

/// First non-blank identity header, normalized.
pub fn identifier_from_headers<F>(header: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    IDENTITY_HEADERS
        .iter()
        .filter_map(|name| header(name))
        .find(|value| !value.trim().is_empty())
        .map(|value| normalize_identifier(&value))
}

/// Identity of the local desktop session, for development setups without a
/// proxy: `USERDOMAIN\USERNAME`, else `COMPUTERNAME\USER` (or `LOGNAME`).
pub fn identifier_from_env<F>(var: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| var(name).filter(|v| !v.is_empty());

    if let (Some(user), Some(domain)) = (non_empty("USERNAME"), non_empty("USERDOMAIN")) {
        return Some(format!("{}\\{}", domain, user));
    }
    let user = non_empty("USER").or_else(|| non_empty("LOGNAME"));
    match (user, non_empty("COMPUTERNAME")) {
        (Some(user), Some(host)) => Some(format!("{}\\{}", host, user)),
        _ => None,
    }
}

/// Account name without the domain prefix.
pub fn username_part(identifier: &str) -> &str {
    identifier.rsplit('\\').next().unwrap_or(identifier)
}
