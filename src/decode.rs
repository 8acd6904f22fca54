//! Response body decoding according to `content-encoding`.

use bytes::Bytes;
use http::header::CONTENT_ENCODING;
use http::HeaderMap;
use std::io::{self, Read};

#[derive(Debug, thiserror::Error)]
#[error("failed to decode {encoding} body: {message}")]
pub(crate) struct DecodeError {
    pub(crate) encoding: String,
    pub(crate) message: String,
}

impl DecodeError {
    fn new(encoding: &str, message: impl Into<String>) -> Self {
        Self {
            encoding: encoding.to_owned(),
            message: message.into(),
        }
    }
}

fn read_all<R: Read>(mut reader: R, encoding: &str) -> Result<Vec<u8>, DecodeError> {
    let mut decoded = Vec::new();
    reader
        .read_to_end(&mut decoded)
        .map_err(|error: io::Error| DecodeError::new(encoding, error.to_string()))?;
    Ok(decoded)
}

/// Undoes every coding listed in `content-encoding`, last applied first.
///
/// A missing header or `identity` passes the body through untouched.
pub(crate) fn decode_body(mut body: Bytes, headers: &HeaderMap) -> Result<Bytes, DecodeError> {
    let Some(content_encoding) = headers.get(CONTENT_ENCODING) else {
        return Ok(body);
    };
    if body.is_empty() {
        return Ok(body);
    }
    let content_encoding = content_encoding
        .to_str()
        .map_err(|error| DecodeError::new("content-encoding", error.to_string()))?;
    let mut encodings = content_encoding
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect::<Vec<_>>();

    while let Some(encoding) = encodings.pop() {
        let decoded = match encoding.to_ascii_lowercase().as_str() {
            "identity" => continue,
            "gzip" | "x-gzip" => read_all(flate2::read::GzDecoder::new(body.as_ref()), encoding)?,
            "deflate" => read_all(flate2::read::ZlibDecoder::new(body.as_ref()), encoding)?,
            "br" => read_all(brotli::Decompressor::new(body.as_ref(), 4096), encoding)?,
            other => return Err(DecodeError::new(other, "unsupported content-encoding")),
        };
        body = Bytes::from(decoded);
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use http::HeaderValue;
    use std::io::Write;

    const PAYLOAD: &str = r#"{"result": "OK"}"#;

    fn headers(encoding: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static(encoding));
        headers
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn brotli(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut writer = brotli::CompressorWriter::new(&mut out, 4096, 11, 22);
            writer.write_all(data).unwrap();
        }
        out
    }

    #[test]
    fn test_no_encoding_passes_through() {
        let body = Bytes::from_static(PAYLOAD.as_bytes());
        let decoded = decode_body(body.clone(), &HeaderMap::new()).unwrap();
        assert_eq!(decoded, body);

        let decoded = decode_body(body.clone(), &headers("identity")).unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn test_every_encoding_yields_the_same_text() {
        let cases = [
            ("gzip", gzip(PAYLOAD.as_bytes())),
            ("deflate", deflate(PAYLOAD.as_bytes())),
            ("br", brotli(PAYLOAD.as_bytes())),
        ];

        for (encoding, encoded) in cases {
            let decoded = decode_body(Bytes::from(encoded), &headers(encoding)).unwrap();
            assert_eq!(decoded.as_ref(), PAYLOAD.as_bytes(), "encoding {}", encoding);
        }
    }

    #[test]
    fn test_stacked_encodings_are_undone_in_reverse() {
        let encoded = brotli(&gzip(PAYLOAD.as_bytes()));
        let decoded = decode_body(Bytes::from(encoded), &headers("gzip, br")).unwrap();
        assert_eq!(decoded.as_ref(), PAYLOAD.as_bytes());
    }

    #[test]
    fn test_corrupt_body_is_an_error() {
        let err = decode_body(Bytes::from_static(b"plainly not gzip"), &headers("gzip"))
            .unwrap_err();
        assert_eq!(err.encoding, "gzip");
        assert!(err.to_string().starts_with("failed to decode gzip body"));
    }

    #[test]
    fn test_unknown_encoding_is_an_error() {
        let err = decode_body(Bytes::from_static(b"data"), &headers("compress")).unwrap_err();
        assert_eq!(err.message, "unsupported content-encoding");
    }
}
