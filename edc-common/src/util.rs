//! Secret masking for logs and printed commands.

/// Keys whose values are replaced with `***` by [`mask_sensitive`].
///
/// Matching is on `KEY=`, `KEY: ` and `--flag ` forms, case-insensitive.
const SENSITIVE_KEYS: &[&str] = &[
    "PROVIDER_API_KEY",
    "CONSUMER_API_KEY",
    "API_KEY",
    "X-Api-Key",
    "Authorization",
    "password",
    "postgresPassword",
    "token",
    "secret",
];

/// Returns the end offset of the value starting at `s[0]`.
///
/// A value runs until unquoted whitespace; quotes and backslash escapes
/// are honoured.
fn value_end(s: &str) -> usize {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (c, quote) {
            ('\\', _) => escaped = true,
            (q, Some(open)) if q == open => quote = None,
            (_, Some(_)) => {}
            ('"' | '\'', None) => quote = Some(c),
            (w, None) if w.is_whitespace() => return i,
            _ => {}
        }
    }
    s.len()
}

/// Mask sensitive values in a command line or header dump before it is
/// logged or printed.
pub fn mask_sensitive(text: &str) -> String {
    let mut result = text.to_string();

    for key in SENSITIVE_KEYS {
        for separator in ["=", ": ", " "] {
            let needle = format!("{key}{separator}");
            let flag_form = separator == " ";
            let needle = if flag_form { format!("--{needle}") } else { needle };

            let mut search_start = 0;
            loop {
                let lower = result.to_ascii_lowercase();
                let Some(found) = lower[search_start..].find(&needle.to_ascii_lowercase()) else {
                    break;
                };
                let key_start = search_start + found;

                // API_KEY must not match the tail of PROVIDER_API_KEY.
                let at_boundary = key_start == 0
                    || !result[..key_start]
                        .chars()
                        .next_back()
                        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
                let value_start = key_start + needle.len();
                if !at_boundary {
                    search_start = value_start;
                    continue;
                }

                let end = value_start + value_end(&result[value_start..]);
                if &result[value_start..end] != "***" {
                    result.replace_range(value_start..end, "***");
                }
                search_start = value_start + 3;
                if search_start >= result.len() {
                    break;
                }
            }
        }
    }

    result
}

/// Whether a flag or key name (`--token`, `password`) names a secret.
pub fn is_sensitive_key(name: &str) -> bool {
    let name = name.trim_start_matches('-');
    SENSITIVE_KEYS
        .iter()
        .any(|key| key.eq_ignore_ascii_case(name))
}

/// Shorten a secret for display: first two characters then `***`.
pub fn redact(secret: &str) -> String {
    if secret.chars().count() <= 4 {
        return "***".to_string();
    }
    let prefix: String = secret.chars().take(2).collect();
    format!("{prefix}***")
}
