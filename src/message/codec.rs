use crate::message::{IncomingMessage, Request};
use crate::CodecError;

/// Encoding contract between the worker and the bus
///
/// Implementations must be deterministic: the same value always encodes to the
/// same bytes.
pub trait Codec: Send + Sync {
    /// Decodes one incoming payload into a typed message
    fn decode(&self, payload: &[u8]) -> Result<IncomingMessage, CodecError>;

    /// Encodes a request for the outgoing topic
    fn encode_request(&self, request: &Request) -> Result<Vec<u8>, CodecError>;
}

/// JSON codec, one object per message
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn decode(&self, payload: &[u8]) -> Result<IncomingMessage, CodecError> {
        if payload.is_empty() {
            return Err(CodecError::Empty);
        }
        Ok(serde_json::from_slice(payload)?)
    }

    fn encode_request(&self, request: &Request) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(request)?)
    }
}

impl JsonCodec {
    /// Decodes a request from the outgoing topic, as a fetcher would
    pub fn decode_request(&self, payload: &[u8]) -> Result<Request, CodecError> {
        if payload.is_empty() {
            return Err(CodecError::Empty);
        }
        Ok(serde_json::from_slice(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ErrorInfo, Link, Response};

    #[test]
    fn test_decode_add_seeds() {
        let payload = br#"{"type": "add_seeds", "seeds": [{"url": "https://a.example/"}, {"url": "https://b.example/", "meta": {"fingerprint": "fp-b"}}]}"#;
        let msg = JsonCodec.decode(payload).unwrap();

        match msg {
            IncomingMessage::AddSeeds { seeds } => {
                assert_eq!(seeds.len(), 2);
                assert_eq!(seeds[0].url, "https://a.example/");
                assert_eq!(seeds[0].method, "GET");
                assert_eq!(seeds[1].fingerprint(), "fp-b");
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_decode_page_crawled_with_short_field() {
        let payload = br#"{"type": "page_crawled", "r": {"url": "http://a.example/p", "status_code": 200}, "links": [{"url": "http://x.example/1"}]}"#;
        let msg = JsonCodec.decode(payload).unwrap();

        assert_eq!(
            msg,
            IncomingMessage::PageCrawled {
                response: Response::new("http://a.example/p", 200),
                links: vec![Link::new("http://x.example/1")],
            }
        );
    }

    #[test]
    fn test_decode_page_crawled_with_long_field() {
        let payload =
            br#"{"type": "page_crawled", "response": {"url": "http://a.example/p"}, "links": []}"#;
        let msg = JsonCodec.decode(payload).unwrap();
        assert_eq!(msg.kind(), "page_crawled");
    }

    #[test]
    fn test_decode_request_error() {
        let payload = br#"{"type": "request_error", "r": {"url": "http://a.example/"}, "error": "DNS lookup failed"}"#;
        let msg = JsonCodec.decode(payload).unwrap();

        assert_eq!(
            msg,
            IncomingMessage::RequestError {
                request: Request::new("http://a.example/"),
                error: ErrorInfo::new("DNS lookup failed"),
            }
        );
    }

    #[test]
    fn test_decode_unknown_type_is_error() {
        let payload = br#"{"type": "offset_committed", "offset": 5}"#;
        assert!(matches!(
            JsonCodec.decode(payload),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_missing_fields_is_error() {
        assert!(JsonCodec.decode(br#"{"type": "add_seeds"}"#).is_err());
        assert!(JsonCodec
            .decode(br#"{"type": "request_error", "r": {"url": "http://a/"}}"#)
            .is_err());
        assert!(JsonCodec.decode(br#"{"seeds": []}"#).is_err());
    }

    #[test]
    fn test_decode_garbage_and_empty() {
        assert!(matches!(
            JsonCodec.decode(b"\xff\xfe not json"),
            Err(CodecError::Malformed(_))
        ));
        assert!(matches!(JsonCodec.decode(b""), Err(CodecError::Empty)));
    }

    #[test]
    fn test_encode_request_is_readable_by_fetchers() {
        let request = Request::new("https://example.com/page").with_fingerprint();
        let bytes = JsonCodec.encode_request(&request).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["url"], "https://example.com/page");
        assert_eq!(value["method"], "GET");
        assert_eq!(value["meta"]["fingerprint"], request.fingerprint());

        assert_eq!(JsonCodec.decode_request(&bytes).unwrap(), request);
    }
}
