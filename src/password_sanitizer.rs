use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static URL_CREDENTIALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([a-zA-Z][a-zA-Z0-9+.-]*://[^:/@\s]+):([^@\s]+)@")
        .expect("credential pattern is valid")
});

static PASSWORD_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"password=([^\s&]+)").expect("password pattern is valid"));

/// Sanitize a connection URL by removing the password
pub fn sanitize_connection_url(url: &str) -> String {
    if url.contains("://") {
        if let Ok(parsed) = Url::parse(url) {
            let mut sanitized = parsed.clone();
            if parsed.password().is_some()
                && sanitized.set_password(Some("[REDACTED]")).is_err()
            {
                return sanitize_text_for_logging(url);
            }
            // URL-decode the final result to make [REDACTED] readable in logs
            let redacted = sanitized.to_string().replace("%5BREDACTED%5D", "[REDACTED]");
            // Query parameters may carry a password too
            return sanitize_text_for_logging(&redacted);
        }
        return sanitize_text_for_logging(url);
    }

    // Simple connection string format: user:password@host:port/db
    if let Some((user_pass, rest)) = url.split_once('@') {
        if let Some((user, _)) = user_pass.split_once(':') {
            return format!("{user}:[REDACTED]@{rest}");
        }
    }

    url.to_string()
}

/// Redact credentials of any URLs embedded in free text, such as driver error messages
pub fn sanitize_text_for_logging(text: &str) -> String {
    let sanitized = URL_CREDENTIALS.replace_all(text, "$1:[REDACTED]@");
    PASSWORD_PARAM
        .replace_all(&sanitized, "password=[REDACTED]")
        .to_string()
}
