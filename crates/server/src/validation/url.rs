use url::Url;

/// Accepts absolute http(s) links such as a live demo or repository URL.
///
/// Returns the trimmed input rather than the parser's serialization so that
/// links are stored the way the author typed them.
pub fn validate_link(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|_| anyhow::anyhow!("invalid URL"))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(anyhow::anyhow!("only http(s) URLs are supported")),
    }

    match url.host_str() {
        Some(host) if host.contains('.') || host == "localhost" => {}
        _ => return Err(anyhow::anyhow!("URL must include a host name")),
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert_eq!(
            validate_link(" https://github.com/example/repo ").unwrap(),
            "https://github.com/example/repo"
        );
        assert!(validate_link("http://example.com").is_ok());
        assert!(validate_link("http://localhost:3000/demo").is_ok());
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(validate_link("ftp://example.com/file").is_err());
        assert!(validate_link("javascript:alert(1)").is_err());
    }

    #[test]
    fn test_rejects_relative_and_hostless() {
        assert!(validate_link("/projects/demo").is_err());
        assert!(validate_link("not a url").is_err());
        assert!(validate_link("https://intranet").is_err());
    }
}
