//! Image URL recovery for CDN proxies.
//!
//! Image CDNs such as the one behind Substack serve
//! `https://cdn.host/image/fetch/<transforms>/https%3A%2F%2Forigin/a.jpg`.
//! The origin URL is recovered by decoding the embedded payload.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static PROXY_FETCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/image/fetch/(?:[^/]+/)*?(https?%3A%2F%2F[^/?#&\s]+)")
        .expect("proxy fetch regex should compile")
});

static ENCODED_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(https?%3A%2F%2F[^/?#&\s]+)").expect("encoded URL regex should compile"));

/// Resolve the URL to emit for an image `src`.
///
/// Proxy URLs are unwrapped to the embedded origin URL; a payload that does
/// not decode leaves `src` as is. Spaces are percent-encoded.
pub fn resolve_image_url(src: &str) -> String {
    let resolved = recover_proxied_url(src).unwrap_or_else(|| src.to_string());
    resolved.replace(' ', "%20")
}

fn recover_proxied_url(src: &str) -> Option<String> {
    let path = url_path(src);
    let payload = PROXY_FETCH
        .captures(&path)
        .or_else(|| ENCODED_URL.captures(&path))
        .and_then(|caps| caps.get(1))?
        .as_str();

    decode_component(payload)
}

/// Path of `src`, without query or fragment. Relative sources are cut at the
/// first `?` or `#`.
fn url_path(src: &str) -> String {
    match Url::parse(src) {
        Ok(url) => url.path().to_string(),
        Err(_) => src.split(['?', '#']).next().unwrap_or_default().to_string(),
    }
}

/// Percent-decode a URL component, rejecting malformed escapes and
/// invalid UTF-8.
fn decode_component(encoded: &str) -> Option<String> {
    let bytes = encoded.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            if !hex.iter().all(u8::is_ascii_hexdigit) {
                return None;
            }
        }
    }

    urlencoding::decode(encoded).ok().map(|s| s.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        "https://cdn.example/image/fetch/w_200/https%3A%2F%2Fphotos.example.com%2Fa.jpg",
        "https://photos.example.com/a.jpg"
    )]
    #[case(
        "https://substackcdn.com/image/fetch/w_1456,c_limit,f_auto/https%3A%2F%2Fbucket.s3.amazonaws.com%2Fimg%2Fb.png",
        "https://bucket.s3.amazonaws.com/img/b.png"
    )]
    #[case("https://img.example/p/https%3A%2F%2Forigin.example%2Fc.gif", "https://origin.example/c.gif")]
    #[case(
        "https://proxy.example/resize?u=https%3A%2F%2Forigin.example%2Fc.gif&w=3",
        "https://proxy.example/resize?u=https%3A%2F%2Forigin.example%2Fc.gif&w=3"
    )]
    #[case("/image/fetch/w_1/https%3A%2F%2Forigin.example%2Fd.png?x=1", "https://origin.example/d.png")]
    #[case("https://example.com/plain.jpg", "https://example.com/plain.jpg")]
    #[case("https://example.com/my photo.jpg", "https://example.com/my%20photo.jpg")]
    fn test_resolve_image_url(#[case] src: &str, #[case] expected: &str) {
        assert_eq!(resolve_image_url(src), expected);
    }

    #[test]
    fn test_malformed_payload_keeps_original() {
        let src = "https://cdn.example/image/fetch/https%3A%2F%2Fbad.example%2F%zz.jpg";
        assert_eq!(resolve_image_url(src), src);
    }

    #[test]
    fn test_invalid_utf8_payload_keeps_original() {
        let src = "https://cdn.example/image/fetch/https%3A%2F%2Fbad.example%2F%FF.jpg";
        assert_eq!(resolve_image_url(src), src);
    }

    #[test]
    fn test_url_path() {
        assert_eq!(url_path("https://a.example/x/y?q=https%3A%2F%2Fb#f"), "/x/y");
        assert_eq!(url_path("img/a.png?w=2"), "img/a.png");
    }

    #[test]
    fn test_decode_component() {
        assert_eq!(decode_component("a%20b").as_deref(), Some("a b"));
        assert_eq!(decode_component("a%2").as_deref(), None);
    }
}
