//! Classify HTTP status and transport errors into retry policy error kinds.

use super::error::ChunkError;
use super::policy::ErrorKind;

/// Server faults that are worth retrying; every other status is permanent.
const RETRIABLE_STATUS_CODES: [u32; 4] = [500, 502, 503, 504];

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> ErrorKind {
    if RETRIABLE_STATUS_CODES.contains(&code) {
        ErrorKind::RetriableServer(code as u16)
    } else {
        ErrorKind::Fatal
    }
}

/// Classify a curl error for retry decisions.
///
/// Anything that happened on the wire is retriable: the resumable protocol lets
/// us pick up from the last acknowledged byte. Only misuse of curl itself
/// (bad option, bad URL) is fatal.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_url_malformed()
        || e.is_unsupported_protocol()
        || e.is_bad_function_argument()
        || e.is_unknown_option()
        || e.is_out_of_memory()
    {
        return ErrorKind::Fatal;
    }
    ErrorKind::RetriableTransport
}

/// Classify an upload request error into an ErrorKind.
pub fn classify(e: &ChunkError) -> ErrorKind {
    match e {
        ChunkError::Curl(ce) => classify_curl_error(ce),
        ChunkError::Io(_) | ChunkError::NoProgress { .. } => ErrorKind::RetriableTransport,
        ChunkError::Http { status, .. } => classify_http_status(*status),
        ChunkError::Malformed(_) => ErrorKind::Fatal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_5xx_transients_retriable() {
        for code in [500, 502, 503, 504] {
            assert_eq!(
                classify_http_status(code),
                ErrorKind::RetriableServer(code as u16)
            );
        }
    }

    #[test]
    fn http_4xx_and_other_5xx_fatal() {
        for code in [400, 401, 403, 404, 429, 501, 505] {
            assert_eq!(classify_http_status(code), ErrorKind::Fatal, "code {code}");
        }
    }

    #[test]
    fn curl_timeout_and_connect_retriable() {
        // CURLE_OPERATION_TIMEDOUT = 28, CURLE_COULDNT_CONNECT = 7, CURLE_COULDNT_RESOLVE_HOST = 6
        for code in [28, 7, 6, 56] {
            let e = curl::Error::new(code);
            assert_eq!(classify_curl_error(&e), ErrorKind::RetriableTransport);
        }
    }

    #[test]
    fn curl_malformed_url_fatal() {
        // CURLE_URL_MALFORMAT = 3
        let e = curl::Error::new(3);
        assert_eq!(classify_curl_error(&e), ErrorKind::Fatal);
    }

    #[test]
    fn io_error_retriable_malformed_fatal() {
        let io = ChunkError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ));
        assert_eq!(classify(&io), ErrorKind::RetriableTransport);
        let bad = ChunkError::Malformed("no Location header".into());
        assert_eq!(classify(&bad), ErrorKind::Fatal);
    }

    #[test]
    fn http_error_goes_through_status() {
        let e = ChunkError::Http {
            status: 503,
            body: String::new(),
        };
        assert!(classify(&e).is_retriable());
        let e = ChunkError::Http {
            status: 403,
            body: "quotaExceeded".into(),
        };
        assert!(!classify(&e).is_retriable());
    }
}
