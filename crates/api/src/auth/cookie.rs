pub const TOKEN_COOKIE: &str = "token";

pub fn build_token_cookie(
    raw_token: &str,
    max_age_secs: u64,
    cookie_domain: &Option<String>,
    secure: bool,
) -> String {
    // Cross-site frontends need SameSite=None, which browsers only accept with Secure
    let secure_flag = if secure { "; Secure" } else { "" };
    let same_site = if secure { "None" } else { "Lax" };

    let mut cookie = format!(
        "{}={}; HttpOnly{}; SameSite={}; Path=/; Max-Age={}",
        TOKEN_COOKIE, raw_token, secure_flag, same_site, max_age_secs
    );

    if let Some(domain) = cookie_domain {
        cookie.push_str(&format!("; Domain={}", domain));
    }

    cookie
}

pub fn build_clear_cookie(cookie_domain: &Option<String>, secure: bool) -> String {
    build_token_cookie("", 0, cookie_domain, secure)
}

pub fn extract_token(cookie_header: &str) -> Option<String> {
    for part in cookie_header.split(';') {
        let trimmed = part.trim();
        if let Some(value) = trimmed
            .strip_prefix(TOKEN_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
        {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}
