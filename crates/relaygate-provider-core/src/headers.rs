pub type Headers = Vec<(String, String)>;

/// Headers that only make sense on a single transport leg.
pub const HOP_BY_HOP_HEADERS: [&str; 11] = [
    "host",
    "content-length",
    "transfer-encoding",
    "accept-encoding",
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "upgrade",
];

pub fn header_set(headers: &mut Headers, name: impl Into<String>, value: impl Into<String>) {
    let name = name.into();
    let value = value.into();
    if let Some((_, v)) = headers
        .iter_mut()
        .find(|(k, _)| k.eq_ignore_ascii_case(&name))
    {
        *v = value;
        return;
    }
    headers.push((name, value));
}

pub fn header_get<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|hop| hop.eq_ignore_ascii_case(name))
}

/// Outbound header set for a vendor call.
///
/// Drops hop-by-hop headers and the `reserved` names the provider sets itself,
/// then forces `accept-encoding: identity` so the body arrives uncompressed.
pub fn filter_request_headers(inbound: &Headers, reserved: &[&str]) -> Headers {
    let mut out: Headers = inbound
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name))
        .filter(|(name, _)| !reserved.iter().any(|r| r.eq_ignore_ascii_case(name)))
        .cloned()
        .collect();
    header_set(&mut out, "accept-encoding", "identity");
    out
}

/// Vendor response headers safe to write back to the client.
pub fn filter_response_headers(upstream: &Headers) -> Headers {
    upstream
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name) && !name.eq_ignore_ascii_case("content-encoding"))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn request_filter_drops_hop_by_hop_in_any_case() {
        let inbound = headers(&[
            ("Host", "localhost:3000"),
            ("CONTENT-LENGTH", "12"),
            ("Transfer-Encoding", "chunked"),
            ("Accept-Encoding", "gzip, br"),
            ("Connection", "keep-alive"),
            ("Keep-Alive", "timeout=5"),
            ("Proxy-Authenticate", "x"),
            ("proxy-authorization", "x"),
            ("TE", "trailers"),
            ("Trailer", "x"),
            ("Upgrade", "h2c"),
            ("X-Client", "continue"),
        ]);
        let out = filter_request_headers(&inbound, &[]);
        assert!(out.iter().all(|(name, value)| {
            !is_hop_by_hop(name) || (name == "accept-encoding" && value == "identity")
        }));
        assert_eq!(header_get(&out, "x-client"), Some("continue"));
        assert_eq!(header_get(&out, "accept-encoding"), Some("identity"));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn request_filter_drops_reserved_names() {
        let inbound = headers(&[
            ("Authorization", "Bearer client"),
            ("Cohere-Version", "old"),
            ("User-Agent", "ua"),
        ]);
        let out = filter_request_headers(&inbound, &["authorization", "cohere-version"]);
        assert_eq!(header_get(&out, "authorization"), None);
        assert_eq!(header_get(&out, "cohere-version"), None);
        assert_eq!(header_get(&out, "user-agent"), Some("ua"));
    }

    #[test]
    fn response_filter_also_drops_content_encoding() {
        let upstream = headers(&[
            ("Content-Type", "text/event-stream"),
            ("Content-Encoding", "gzip"),
            ("Transfer-Encoding", "chunked"),
            ("x-request-id", "abc"),
        ]);
        let out = filter_response_headers(&upstream);
        assert_eq!(
            out,
            headers(&[("Content-Type", "text/event-stream"), ("x-request-id", "abc")])
        );
    }

    #[test]
    fn header_helpers_are_case_insensitive() {
        let mut h = headers(&[("X-A", "1"), ("x-a", "2")]);
        header_set(&mut h, "x-A", "3");
        assert_eq!(header_get(&h, "X-a"), Some("3"));
        assert_eq!(h.len(), 2);
    }
}
