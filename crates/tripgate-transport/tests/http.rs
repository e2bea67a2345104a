//! Integration tests for the HTTP backend.
//!
//! Each test starts a one-shot HTTP server on a local socket that answers
//! with a canned status and body, then checks how `HttpApi` maps it onto
//! `TransportError`.

#[cfg(feature = "http")]
mod http {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use tripgate_protocol::{LoginRequest, VerificationStatus};
    use tripgate_transport::{AuthApi, HttpApi, TransportError, VerificationApi};

    /// Serves exactly one request with `status` and `body`.
    ///
    /// Returns the base URL to point `HttpApi` at and a handle yielding
    /// the raw request head the server received.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = listener.local_addr().expect("should have an address");

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("should accept");
            let head = read_request(&mut socket).await;

            let response = format!(
                "HTTP/1.1 {status}\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("should write response");
            socket.shutdown().await.ok();
            head
        });

        (format!("http://{addr}"), handle)
    }

    /// Reads the request head and drains its body.
    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.expect("should read");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let head = text[..end].to_owned();
                let length = head
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    return head;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn credentials() -> LoginRequest {
        LoginRequest {
            email: "ana@stays.io".into(),
            password: "wrong".into(),
        }
    }

    // =====================================================================
    // Success
    // =====================================================================

    #[tokio::test]
    async fn test_me_data_envelope_unwraps_and_sends_bearer() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"data":{"user":{"id":"u-1","role":"AGENT"}}}"#,
        )
        .await;

        let payload = HttpApi::new(base).me("tok-1").await.unwrap();

        assert_eq!(payload.as_value()["user"]["id"], "u-1");
        let head = server.await.unwrap();
        assert!(head.starts_with("GET /auth/me "));
        assert!(head.to_ascii_lowercase().contains("authorization: bearer tok-1"));
    }

    #[tokio::test]
    async fn test_status_null_data_is_none() {
        let (base, _server) = serve_once("200 OK", r#"{"data":null}"#).await;

        let status = HttpApi::new(base).status("tok-1").await.unwrap();

        assert_eq!(status, None);
    }

    #[tokio::test]
    async fn test_status_data_carries_status() {
        let (base, _server) =
            serve_once("200 OK", r#"{"data":{"status":"PENDING"}}"#).await;

        let status = HttpApi::new(base).status("tok-1").await.unwrap();

        assert_eq!(status.and_then(|s| s.status), Some(VerificationStatus::Pending));
    }

    // =====================================================================
    // Failures
    // =====================================================================

    #[tokio::test]
    async fn test_login_401_is_rejected_with_server_message() {
        let (base, _server) = serve_once(
            "401 Unauthorized",
            r#"{"error":true,"message":"Invalid email or password"}"#,
        )
        .await;

        let err = HttpApi::new(base).login(&credentials()).await.unwrap_err();

        assert_eq!(
            err,
            TransportError::Rejected {
                status: Some(401),
                message: "Invalid email or password".into(),
            }
        );
        assert!(!err.is_unauthorized());
        assert_eq!(err.user_message(), "Invalid email or password");
    }

    #[tokio::test]
    async fn test_me_401_is_unauthorized() {
        let (base, _server) = serve_once(
            "401 Unauthorized",
            r#"{"error":true,"message":"jwt expired"}"#,
        )
        .await;

        let err = HttpApi::new(base).me("stale").await.unwrap_err();

        assert_eq!(err, TransportError::Unauthorized);
    }

    #[tokio::test]
    async fn test_error_envelope_is_rejected_with_message() {
        let (base, _server) = serve_once(
            "409 Conflict",
            r#"{"error":"conflict","message":"Verification already submitted"}"#,
        )
        .await;

        let err = HttpApi::new(base).status("tok-1").await.unwrap_err();

        assert_eq!(
            err,
            TransportError::Rejected {
                status: Some(409),
                message: "Verification already submitted".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_non_json_server_error_is_rejected() {
        let (base, _server) =
            serve_once("502 Bad Gateway", "<html>upstream down</html>").await;

        let err = HttpApi::new(base).me("tok-1").await.unwrap_err();

        assert_eq!(
            err,
            TransportError::Rejected {
                status: Some(502),
                message: "Bad Gateway".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_bad_success_body_is_decode_error() {
        let (base, _server) = serve_once("200 OK", "not json").await;

        let err = HttpApi::new(base).me("tok-1").await.unwrap_err();

        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Bind then drop, so nothing is listening on the port.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = HttpApi::new(format!("http://{addr}"))
            .login(&credentials())
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Network(_)));
    }
}
