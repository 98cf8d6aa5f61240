use url::Url;

/// An absolute URL with a scheme and a host, e.g. `https://example.com/a.jpg`
pub fn parse_absolute_url(input: &str) -> Option<Url> {
    let url = Url::parse(input.trim()).ok()?;
    if url.cannot_be_a_base() || !url.has_host() {
        return None;
    }
    Some(url)
}

pub fn is_absolute_url(input: &str) -> bool {
    parse_absolute_url(input).is_some()
}

/// Last path segment of a URL, falling back to its host for bare domains
pub fn url_basename(input: &str) -> Option<String> {
    let url = parse_absolute_url(input)?;
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| s.to_string());

    segment.or_else(|| url.host_str().map(|h| h.to_string()))
}
