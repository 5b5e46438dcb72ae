//! Turning a local proxy file into a server-acknowledged proxy list

use crate::error::{SessionError, SessionResult};
use crate::session::api::{ProxyApi, UploadRequest, UploadResponse};
use crate::session::models::ProxyAddress;

/// Proxy list accepted by the parse endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedList {
    pub proxies: Vec<ProxyAddress>,
    /// Count reported by the server
    pub count: usize,
}

/// Uploads proxy files. Holds no state of its own; the session controller
/// decides what to keep.
pub struct UploadController;

impl UploadController {
    /// Decode file bytes as UTF-8 text, dropping a leading byte order mark
    pub fn decode(bytes: &[u8]) -> SessionResult<String> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| SessionError::Upload(format!("file is not valid UTF-8: {}", e)))?;
        Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
    }

    /// Submit file bytes to the parse endpoint. A decode failure issues no
    /// request; otherwise exactly one request is made and never retried.
    pub async fn submit<A>(api: &A, bytes: &[u8]) -> SessionResult<UploadedList>
    where
        A: ProxyApi + ?Sized,
    {
        let content = Self::decode(bytes)?;
        let response = api.upload(UploadRequest { content }).await?;
        Self::accept(response)
    }

    /// Validate the endpoint's reply
    pub fn accept(response: UploadResponse) -> SessionResult<UploadedList> {
        if !response.success {
            return Err(SessionError::Upload("server rejected the file".to_string()));
        }

        let proxies = response.proxies.unwrap_or_default();
        if proxies.is_empty() {
            return Err(SessionError::Upload("no proxies found in file".to_string()));
        }

        let count = response.count.unwrap_or(proxies.len());
        Ok(UploadedList { proxies, count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::FakeApi;

    #[test]
    fn test_decode_strips_bom() {
        let text = UploadController::decode("\u{feff}1.2.3.4:8080\n".as_bytes()).unwrap();
        assert_eq!(text, "1.2.3.4:8080\n");
    }

    #[test]
    fn test_decode_rejects_binary() {
        let err = UploadController::decode(&[0xff, 0xfe, 0x00, 0xc3]).unwrap_err();
        assert!(matches!(err, SessionError::Upload(_)));
    }

    #[test]
    fn test_accept_rejects_unsuccessful() {
        let err = UploadController::accept(UploadResponse::default()).unwrap_err();
        assert!(matches!(err, SessionError::Upload(_)));
    }

    #[test]
    fn test_accept_rejects_empty_list() {
        let response = UploadResponse {
            success: true,
            proxies: Some(Vec::new()),
            count: Some(0),
        };
        assert!(UploadController::accept(response).is_err());
    }

    #[test]
    fn test_accept_uses_server_count() {
        let response = UploadResponse {
            success: true,
            proxies: Some(vec!["1.2.3.4:8080".to_string()]),
            count: None,
        };
        let list = UploadController::accept(response).unwrap();
        assert_eq!(list.count, 1);
    }

    #[tokio::test]
    async fn test_submit_sends_one_request() {
        let api = FakeApi::accepting(&["1.2.3.4:8080", "5.6.7.8:3128"]);
        let list = UploadController::submit(&api, b"1.2.3.4:8080\n5.6.7.8:3128\n")
            .await
            .unwrap();

        assert_eq!(list.proxies, vec!["1.2.3.4:8080", "5.6.7.8:3128"]);
        assert_eq!(list.count, 2);
        assert_eq!(api.uploads(), vec!["1.2.3.4:8080\n5.6.7.8:3128\n".to_string()]);
    }

    #[tokio::test]
    async fn test_submit_decode_error_sends_nothing() {
        let api = FakeApi::accepting(&["1.2.3.4:8080"]);
        assert!(UploadController::submit(&api, &[0xff, 0xff]).await.is_err());
        assert!(api.uploads().is_empty());
    }
}
