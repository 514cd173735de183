//! `%(name)s` placeholder expansion for rule templates.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Named placeholder or an escaped percent sign.
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%\((?P<name>[A-Za-z_][A-Za-z0-9_]*)\)s|%%").unwrap());

/// Expand `%(name)s` placeholders in `template`.
///
/// `%%` becomes a literal `%`. Placeholders with no binding in `vars` are
/// left as written, so expansion never fails.
///
/// # Examples
/// ```
/// use ispmap::template::expand;
///
/// let rule = expand("//%(proxy)s=*", &[("proxy", "steam.cdn.on.net")]);
/// assert_eq!(rule, "//steam.cdn.on.net=*");
/// ```
pub fn expand(template: &str, vars: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match caps.name("name") {
            Some(name) => vars
                .iter()
                .find(|(key, _)| *key == name.as_str())
                .map(|(_, value)| (*value).to_string())
                .unwrap_or_else(|| caps[0].to_string()),
            None => "%".to_string(),
        })
        .into_owned()
}

/// Check whether `template` references the placeholder `name`.
pub fn references(template: &str, name: &str) -> bool {
    PLACEHOLDER
        .captures_iter(template)
        .any(|caps| caps.name("name").map(|n| n.as_str()) == Some(name))
}
