use crate::UrlError;
use url::Url;

/// Extracts the domain name from a URL string
///
/// The host portion of the URL is returned in lowercase. This is the name used
/// as the partition key for outgoing requests, so two URLs on the same host
/// always yield the same name.
///
/// # Arguments
///
/// * `url` - The URL string to extract the domain from
///
/// # Returns
///
/// * `Ok(String)` - The lowercase domain/host
/// * `Err(UrlError)` - The URL could not be parsed or has no host
///
/// # Examples
///
/// ```
/// use frontier_worker::url::parse_domain;
///
/// assert_eq!(parse_domain("https://example.com/path").unwrap(), "example.com");
/// assert_eq!(parse_domain("http://Blog.EXAMPLE.com:8080/").unwrap(), "blog.example.com");
/// assert!(parse_domain("not a url").is_err());
/// ```
pub fn parse_domain(url: &str) -> Result<String, UrlError> {
    let parsed = Url::parse(url).map_err(|e| UrlError::Parse(format!("{}: {}", url, e)))?;
    parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_lowercase())
        .ok_or_else(|| UrlError::MissingDomain(url.to_string()))
}
