//! Admin API client against a canned HTTP responder.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use big2_client::infrastructure::admin_api::{AdminApi, AdminApiError, NewAnnouncement};
use big2_core::domain::toast::Severity;

// ── Fake HTTP server ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Recorded {
    request_line: String,
    headers: String,
    body: String,
}

/// Serves one canned response per connection and records each request.
struct FakeHttp {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeHttp {
    async fn start(route: fn(&str) -> (u16, Vec<&'static str>, String)) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(respond(stream, route, Arc::clone(&recorded)));
            }
        });
        Self { addr, requests }
    }

    fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn respond(
    mut stream: TcpStream,
    route: fn(&str) -> (u16, Vec<&'static str>, String),
    requests: Arc<Mutex<Vec<Recorded>>>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let (head, body) = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).to_string();
        let Some(split) = text.find("\r\n\r\n") else { continue };
        let head = text[..split].to_string();
        let length = head
            .lines()
            .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(|v| v.trim().to_string()))
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);
        let body = text[split + 4..].to_string();
        if body.len() >= length {
            break (head, body);
        }
    };

    let (request_line, headers) = head.split_once("\r\n").unwrap_or((&head, ""));
    let (status, extra_headers, payload) = route(request_line);
    requests.lock().unwrap().push(Recorded {
        request_line: request_line.to_string(),
        headers: headers.to_ascii_lowercase(),
        body,
    });

    let mut response = format!("HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n", payload.len());
    for header in extra_headers {
        response.push_str(header);
        response.push_str("\r\n");
    }
    response.push_str("\r\n");
    response.push_str(&payload);
    stream.write_all(response.as_bytes()).await.unwrap();
    let _ = stream.shutdown().await;
}

fn admin_routes(request_line: &str) -> (u16, Vec<&'static str>, String) {
    match request_line {
        l if l.starts_with("POST /admin/api/login ") => {
            (200, vec!["Set-Cookie: admin_session=s3cret; Path=/; HttpOnly"], r#"{"ok":true}"#.into())
        }
        l if l.starts_with("GET /admin/api/rooms ") => (
            200,
            vec![],
            r#"{"rooms":[{"name":"Friday","playerCount":2,"status":"waiting","players":[{"name":"Alice"},{"name":"Bot 1"}]}]}"#
                .into(),
        ),
        l if l.starts_with("POST /admin/api/rooms/close ") => (403, vec![], r#"{"message":"Unauthorized"}"#.into()),
        l if l.starts_with("POST /admin/api/announcement ") => (
            200,
            vec![],
            r#"{"announcement":{"message":"Restart at 5","type":"warning","expiresAt":1700000030000}}"#.into(),
        ),
        _ => (500, vec![], "<html>oops</html>".into()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_cookie_is_sent_with_later_requests() {
    // Arrange
    let server = FakeHttp::start(admin_routes).await;
    let api = AdminApi::new(&server.base_url()).unwrap();

    // Act
    api.login("hunter2").await.unwrap();
    let rooms = api.rooms().await.unwrap();

    // Assert
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].name, "Friday");
    assert_eq!(rooms[0].player_count, 2);
    assert_eq!(rooms[0].players[1].name, "Bot 1");

    let requests = server.requests();
    assert!(requests[0].body.contains(r#""password":"hunter2""#));
    assert!(requests[1].request_line.starts_with("GET /admin/api/rooms "));
    assert!(requests[1].headers.contains("admin_session=s3cret"));
}

#[tokio::test]
async fn test_error_body_message_is_surfaced() {
    let server = FakeHttp::start(admin_routes).await;
    let api = AdminApi::new(&server.base_url()).unwrap();

    let err = api.close_room("Friday").await.unwrap_err();

    assert!(matches!(err, AdminApiError::Server { status: 403, .. }));
    assert_eq!(err.to_string(), "Unauthorized");
    let body = &server.requests()[0].body;
    assert!(body.contains(r#""roomName":"Friday""#));
    assert!(body.contains("Room closed by admin for maintenance."));
}

#[tokio::test]
async fn test_non_json_error_falls_back_to_generic_message() {
    let server = FakeHttp::start(admin_routes).await;
    let api = AdminApi::new(&server.base_url()).unwrap();

    let err = api.players().await.unwrap_err();

    assert_eq!(err.to_string(), "Request failed.");
}

#[tokio::test]
async fn test_publish_announcement_sends_default_duration() {
    // Arrange
    let server = FakeHttp::start(admin_routes).await;
    let api = AdminApi::new(&server.base_url()).unwrap();

    // Act
    let published = api
        .publish_announcement(&NewAnnouncement::new("Restart at 5", Severity::Warning))
        .await
        .unwrap()
        .expect("announcement echoed back");

    // Assert
    assert_eq!(published.severity, Severity::Warning);
    assert_eq!(published.expires_at, Some(1_700_000_030_000));
    let body = &server.requests()[0].body;
    assert!(body.contains(r#""durationMs":30000"#));
    assert!(body.contains(r#""type":"warning""#));
}
