//! Integration tests for the download pipeline
//!
//! Media is served by wiremock and written into temporary directories.

use std::path::Path;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use webber::config::Config;
use webber::crawler::build_http_client;
use webber::download::{DownloadOutcome, DownloadRequest, Downloader};
use webber::MediaKind;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration with a short backoff so retry tests stay fast
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.download.retry_backoff_ms = 10;
    config.download.video_retry_backoff_ms = 10;
    config.download.timeout_secs = 5;
    config
}

fn create_downloader(config: &Config) -> Downloader {
    let client = build_http_client(&config.user_agent).expect("Failed to build client");
    Downloader::new(client, config)
}

fn create_request(config: &Config, kind: MediaKind, dir: &TempDir) -> DownloadRequest {
    let mut request = DownloadRequest::from_config(config, kind);
    request.destination = dir.path().join(kind.folder_name());
    request
}

async fn serve_bytes(server: &MockServer, file_path: &str, body: &[u8], expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(file_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .expect(expected_hits)
        .mount(server)
        .await;
}

/// Serves `chunks` with chunked transfer encoding and no Content-Length
///
/// Returns the base URL. Every connection gets the same response.
async fn serve_chunked(chunks: usize, chunk_size: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let head = "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\n\
                            Transfer-Encoding: chunked\r\nConnection: close\r\n\r\n";
                if socket.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                let body = vec![9u8; chunk_size];
                for _ in 0..chunks {
                    let mut frame = format!("{:x}\r\n", chunk_size).into_bytes();
                    frame.extend_from_slice(&body);
                    frame.extend_from_slice(b"\r\n");
                    // The client hangs up once the limit is crossed
                    if socket.write_all(&frame).await.is_err() {
                        return;
                    }
                    socket.flush().await.ok();
                }
                socket.write_all(b"0\r\n\r\n").await.ok();
            });
        }
    });

    format!("http://{}", addr)
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("Failed to read downloaded file")
}

#[tokio::test]
async fn test_allowed_extensions_filter() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    serve_bytes(&mock_server, "/a.png", b"png-bytes", 1).await;
    serve_bytes(&mock_server, "/b.jpg", b"jpg-bytes", 0).await;

    let config = create_test_config();
    let dir = TempDir::new().unwrap();
    let mut request = create_request(&config, MediaKind::Image, &dir);
    request.allowed_extensions = Some(vec![".png".to_string()]);

    let urls = vec![format!("{}/a.png", base_url), format!("{}/b.jpg", base_url)];
    let summary = create_downloader(&config)
        .download_all(&urls, &request)
        .await
        .unwrap();

    assert_eq!(summary.successful, 1);
    assert_eq!(summary.filtered, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(read(&request.destination.join("a.png")), "png-bytes");
    assert!(!request.destination.join("b.jpg").exists());
}

#[tokio::test]
async fn test_declared_size_over_limit_is_skipped_without_retry() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    serve_bytes(&mock_server, "/huge.png", &[7u8; 2048], 1).await;

    let config = create_test_config();
    let dir = TempDir::new().unwrap();
    let mut request = create_request(&config, MediaKind::Image, &dir);
    request.max_size_bytes = 1024;

    let summary = create_downloader(&config)
        .download_all(&[format!("{}/huge.png", base_url)], &request)
        .await
        .unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.successful, 0);
    assert_eq!(summary.failed, 0);
    assert!(!request.destination.join("huge.png").exists());
    assert!(!request.destination.join("huge.png.part").exists());
}

#[tokio::test]
async fn test_size_exactly_at_limit_is_downloaded() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    serve_bytes(&mock_server, "/edge.gif", &[1u8; 1024], 1).await;

    let config = create_test_config();
    let dir = TempDir::new().unwrap();
    let mut request = create_request(&config, MediaKind::Image, &dir);
    request.max_size_bytes = 1024;

    let outcome = create_downloader(&config)
        .download_one(&format!("{}/edge.gif", base_url), &request)
        .await;

    assert!(matches!(outcome, DownloadOutcome::Downloaded { bytes: 1024, .. }));
}

#[tokio::test]
async fn test_streamed_body_over_limit_is_skipped() {
    let base_url = serve_chunked(4, 1024).await;

    let config = create_test_config();
    let dir = TempDir::new().unwrap();
    let mut request = create_request(&config, MediaKind::Image, &dir);
    request.max_size_bytes = 2000;

    let outcome = create_downloader(&config)
        .download_one(&format!("{}/stream.png", base_url), &request)
        .await;

    match outcome {
        DownloadOutcome::SkippedTooLarge { size, limit } => {
            assert!(size > 2000, "stopped at {} bytes", size);
            assert!(size < 4096, "read the whole body ({} bytes)", size);
            assert_eq!(limit, 2000);
        }
        other => panic!("expected SkippedTooLarge, got {:?}", other),
    }
    assert!(!request.destination.join("stream.png").exists());
    assert!(!request.destination.join("stream.png.part").exists());
}

#[tokio::test]
async fn test_streamed_body_within_limit_is_downloaded() {
    let base_url = serve_chunked(2, 512).await;

    let config = create_test_config();
    let dir = TempDir::new().unwrap();
    let mut request = create_request(&config, MediaKind::Image, &dir);
    request.max_size_bytes = 2000;

    let summary = create_downloader(&config)
        .download_all(&[format!("{}/small.png", base_url)], &request)
        .await
        .unwrap();

    assert_eq!(summary.successful, 1);
    let written = std::fs::metadata(request.destination.join("small.png")).unwrap();
    assert_eq!(written.len(), 1024);
}

#[tokio::test]
async fn test_download_one_creates_missing_destination() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    serve_bytes(&mock_server, "/first.svg", b"<svg/>", 1).await;

    let config = create_test_config();
    let dir = TempDir::new().unwrap();
    let mut request = create_request(&config, MediaKind::Vector, &dir);
    request.destination = dir.path().join("nested").join("vectors");
    assert!(!request.destination.exists());

    let outcome = create_downloader(&config)
        .download_one(&format!("{}/first.svg", base_url), &request)
        .await;

    assert!(matches!(outcome, DownloadOutcome::Downloaded { bytes: 6, .. }));
    assert_eq!(read(&request.destination.join("first.svg")), "<svg/>");
}

#[tokio::test]
async fn test_retry_exhaustion_counts_failure() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    Mock::given(method("GET"))
        .and(path("/flaky.png"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_config();
    let dir = TempDir::new().unwrap();
    let request = create_request(&config, MediaKind::Image, &dir);
    assert_eq!(request.retry_count, 3);

    let summary = create_downloader(&config)
        .download_all(&[format!("{}/flaky.png", base_url)], &request)
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.successful, 0);
    assert!(!request.destination.join("flaky.png").exists());
}

#[tokio::test]
async fn test_retry_then_success() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    Mock::given(method("GET"))
        .and(path("/slow.woff"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    serve_bytes(&mock_server, "/slow.woff", b"font", 1).await;

    let config = create_test_config();
    let dir = TempDir::new().unwrap();
    let request = create_request(&config, MediaKind::Font, &dir);

    let summary = create_downloader(&config)
        .download_all(&[format!("{}/slow.woff", base_url)], &request)
        .await
        .unwrap();

    assert_eq!(summary.successful, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(read(&request.destination.join("slow.woff")), "font");
}

#[tokio::test]
async fn test_second_run_replaces_existing_file() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    Mock::given(method("GET"))
        .and(path("/photo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_string("first"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/photo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_string("second"))
        .mount(&mock_server)
        .await;

    let config = create_test_config();
    let dir = TempDir::new().unwrap();
    let request = create_request(&config, MediaKind::Image, &dir);
    let downloader = create_downloader(&config);
    let urls = vec![format!("{}/photo.png", base_url)];

    let first = downloader.download_all(&urls, &request).await.unwrap();
    assert_eq!(first.successful, 1);
    assert_eq!(first.replaced, 0);

    let second = downloader.download_all(&urls, &request).await.unwrap();
    assert_eq!(second.successful, 1);
    assert_eq!(second.replaced, 1);
    assert_eq!(read(&request.destination.join("photo.png")), "second");
}

#[tokio::test]
async fn test_failed_download_keeps_previous_file() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    Mock::given(method("GET"))
        .and(path("/keep.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let config = create_test_config();
    let dir = TempDir::new().unwrap();
    let request = create_request(&config, MediaKind::Image, &dir);
    std::fs::create_dir_all(&request.destination).unwrap();
    std::fs::write(request.destination.join("keep.png"), "old").unwrap();

    let summary = create_downloader(&config)
        .download_all(&[format!("{}/keep.png", base_url)], &request)
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.replaced, 0);
    assert_eq!(read(&request.destination.join("keep.png")), "old");
}

#[tokio::test]
async fn test_extensionless_video_gets_default_extension() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    serve_bytes(&mock_server, "/stream", b"video", 1).await;

    let config = create_test_config();
    let dir = TempDir::new().unwrap();
    let request = create_request(&config, MediaKind::Video, &dir);

    let summary = create_downloader(&config)
        .download_all(&[format!("{}/stream", base_url)], &request)
        .await
        .unwrap();

    assert_eq!(summary.successful, 1);
    assert_eq!(read(&request.destination.join("stream.mp4")), "video");
    assert_eq!(summary.destination, request.destination);
}
