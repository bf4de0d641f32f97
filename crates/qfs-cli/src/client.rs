pub fn auth(builder: reqwest::RequestBuilder, token: Option<&String>) -> reqwest::RequestBuilder {
    match token {
        Some(t) => builder.bearer_auth(t),
        None => builder,
    }
}

/// Build an API URL from the console base URL.
pub fn api_url(console_url: &str, path: &str) -> String {
    format!("{}/api{}", console_url.trim_end_matches('/'), path)
}

pub fn host_path(host: &str, rest: &str) -> String {
    format!("/hosts/{}{}", urlencoding::encode(host), rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_trims_slash() {
        assert_eq!(
            api_url("http://localhost:18090/", "/whoami"),
            "http://localhost:18090/api/whoami"
        );
    }

    #[test]
    fn test_host_path_encodes() {
        assert_eq!(host_path("srv 1", "/filesystems"), "/hosts/srv%201/filesystems");
    }
}
