//! Handler-level tests using tower::ServiceExt::oneshot.
//!
//! Tests the full Axum router without binding a TCP listener. Upstream
//! fetches go through a stub fetcher, so nothing here touches the network.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use relive::config::Config;
use relive::error::{ReliveError, Result};
use relive::fetch::ManifestFetcher;
use relive::server::build_router_with_state;
use relive::server::state::AppState;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

/// Stub upstream: a fixed URL → body map.
struct StubFetcher {
    bodies: HashMap<String, String>,
}

impl StubFetcher {
    fn new(bodies: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            bodies: bodies
                .iter()
                .map(|(url, body)| (url.to_string(), body.to_string()))
                .collect(),
        })
    }
}

#[async_trait]
impl ManifestFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| ReliveError::upstream("404", format!("no stub for {url}")))
    }
}

fn test_config() -> Config {
    Config {
        port: 0,
        fetch_timeout_secs: 10,
        tls: None,
    }
}

fn app(bodies: &[(&str, &str)]) -> axum::Router {
    let state = AppState::with_fetcher(test_config(), StubFetcher::new(bodies));
    build_router_with_state(state)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, String) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&body).to_string())
}

const MASTER_URL: &str = "http://origin.test/master.m3u8";

const MASTER: &str = "\
#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080
1080p.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=2500000,RESOLUTION=1280x720
720p.m3u8
";

fn media(segment_count: usize) -> String {
    let mut body = String::from("#EXTM3U\n#EXT-X-TARGETDURATION:10\n");
    for i in 0..segment_count {
        body.push_str(&format!("#EXTINF:10.0,\nseg{i}.ts\n"));
    }
    body
}

// ── Health ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_200_with_empty_body() {
    let (status, body) = get(app(&[]), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let (status, _) = get(app(&[]), "/nonexistent").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Response headers ────────────────────────────────────────────────────────

#[tokio::test]
async fn playlist_responses_carry_hls_content_type_and_cors() {
    let media3 = media(3);
    let app = app(&[(MASTER_URL, MASTER), ("http://origin.test/1080p.m3u8", &media3)]);

    let req = Request::builder()
        .uri("/vod.m3u8?stream=http://origin.test/master.m3u8&variant=0")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(
        headers.get("content-type").unwrap(),
        "application/vnd.apple.mpegurl"
    );
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
    assert_eq!(headers.get("access-control-allow-headers").unwrap(), "Range");
    assert_eq!(
        headers.get("access-control-expose-headers").unwrap(),
        "Content-Length, Content-Range"
    );
}

// ── VOD ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn vod_passthrough_without_duration() {
    let media3 = media(3);
    let app = app(&[(MASTER_URL, MASTER), ("http://origin.test/1080p.m3u8", &media3)]);

    let (status, body) = get(
        app,
        "/vod.m3u8?stream=http://origin.test/master.m3u8&variant=0",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.matches("#EXTINF").count(), 3);
    assert!(body.contains("#EXT-X-TARGETDURATION:10"));
    assert!(body.contains("#EXT-X-PLAYLIST-TYPE:VOD"));
    assert!(body.contains("#EXT-X-ENDLIST"));
    assert!(!body.contains("#EXT-X-DISCONTINUITY"));
}

#[tokio::test]
async fn vod_loops_to_requested_duration() {
    // 2 x 10s source fitted to 35s: s0 s1 s0 s1 with one wrap marker.
    let media2 = media(2);
    let app = app(&[(MASTER_URL, MASTER), ("http://origin.test/1080p.m3u8", &media2)]);

    let (status, body) = get(
        app,
        "/vod.m3u8?stream=http://origin.test/master.m3u8&variant=0&duration=35",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.matches("#EXTINF").count(), 4);
    assert_eq!(body.matches("#EXT-X-DISCONTINUITY\n").count(), 1);
    assert!(body.contains("#EXT-X-ENDLIST"));

    // The discontinuity marker sits directly above the third segment.
    let lines: Vec<&str> = body.lines().collect();
    let disc = lines
        .iter()
        .position(|l| *l == "#EXT-X-DISCONTINUITY")
        .unwrap();
    assert!(lines[disc + 1].starts_with("#EXTINF"));
    assert!(lines[disc + 2].ends_with("seg0.ts"));
}

#[tokio::test]
async fn vod_injects_interval_ad_breaks() {
    // Six 10s segments, break [30, 45).
    let media6 = media(6);
    let app = app(&[(MASTER_URL, MASTER), ("http://origin.test/1080p.m3u8", &media6)]);

    let (status, body) = get(
        app,
        "/vod.m3u8?stream=http://origin.test/master.m3u8&variant=0&ad=interval,15,30",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let lines: Vec<&str> = body.lines().collect();
    let cue_out = lines.iter().position(|l| *l == "#EXT-X-CUE-OUT:15").unwrap();
    assert!(lines[cue_out + 2].ends_with("seg3.ts"));
    assert!(body.contains("#EXT-X-CUE-OUT-CONT:10.0/15"));
    assert!(body.contains("#EXT-X-CUE-IN"));
}

// ── Live ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn live_initial_window() {
    let media4 = media(4);
    let app = app(&[(MASTER_URL, MASTER), ("http://origin.test/1080p.m3u8", &media4)]);

    let (status, body) = get(
        app,
        "/live.m3u8?stream=http://origin.test/master.m3u8&variant=0&start=1700000000000&now=1700000000000",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.matches("#EXTINF").count(), 3);
    assert!(body.contains("seg0.ts"));
    assert!(body.contains("seg2.ts"));
    assert!(!body.contains("seg3.ts"));
    assert!(body.contains("#EXT-X-MEDIA-SEQUENCE:0"));
    assert!(body.contains("#EXT-X-DISCONTINUITY-SEQUENCE:0"));
    assert!(body.contains("#EXT-X-START:TIME-OFFSET=0.0"));
    assert!(!body.contains("#EXT-X-ENDLIST"));
}

#[tokio::test]
async fn live_window_size_parameter_is_honored() {
    let media4 = media(4);
    let app = app(&[(MASTER_URL, MASTER), ("http://origin.test/1080p.m3u8", &media4)]);

    let (status, body) = get(
        app,
        "/live.m3u8?stream=http://origin.test/master.m3u8&variant=0&start=1700000000000&now=1700000000000&windowSize=2",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.matches("#EXTINF").count(), 2);
}

// ── Master rewrite ──────────────────────────────────────────────────────────

#[tokio::test]
async fn live_master_request_rewrites_variants() {
    let app = app(&[(MASTER_URL, MASTER)]);

    let (status, body) = get(
        app,
        "/live.m3u8?stream=http://origin.test/master.m3u8&start=1700000000000",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("BANDWIDTH=5000000"));
    assert!(body.contains("BANDWIDTH=2500000"));
    assert!(body.contains("/live.m3u8?variant=0"));
    assert!(body.contains("/live.m3u8?variant=1"));
    assert!(body.contains("start=1700000000000"));
    // The upstream rendition URIs must be gone.
    assert!(!body.contains("\n1080p.m3u8"));
    assert!(!body.contains("\n720p.m3u8"));
}

#[tokio::test]
async fn vod_master_request_propagates_duration_and_ad() {
    let app = app(&[(MASTER_URL, MASTER)]);

    let (status, body) = get(
        app,
        "/vod.m3u8?stream=http://origin.test/master.m3u8&duration=60&ad=interval,15,30",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("/vod.m3u8?variant=0"));
    assert!(body.contains("duration=60"));
    assert!(body.contains("ad=interval%2C15%2C30"));
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upstream_miss_maps_to_500_with_message() {
    let app = app(&[]);

    let (status, body) = get(
        app,
        "/vod.m3u8?stream=http://origin.test/missing.m3u8&variant=0",
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("404"));
}

#[tokio::test]
async fn unknown_registry_name_maps_to_500() {
    let (status, body) = get(app(&[]), "/vod.m3u8?stream=no-such-stream").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("no-such-stream"));
}

#[tokio::test]
async fn malformed_ad_config_maps_to_500() {
    let media3 = media(3);
    let app = app(&[(MASTER_URL, MASTER), ("http://origin.test/1080p.m3u8", &media3)]);

    let (status, body) = get(
        app,
        "/vod.m3u8?stream=http://origin.test/master.m3u8&variant=0&ad=cron,15,30",
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("ad"));
}

#[tokio::test]
async fn variant_out_of_range_maps_to_500() {
    let app = app(&[(MASTER_URL, MASTER)]);

    let (status, body) = get(
        app,
        "/vod.m3u8?stream=http://origin.test/master.m3u8&variant=9",
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("variant index 9"));
}

#[tokio::test]
async fn loopback_stream_url_is_rejected_with_400() {
    let (status, body) = get(app(&[]), "/vod.m3u8?stream=http://127.0.0.1/evil.m3u8").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("rejected"));
}

// ── Metrics ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn metrics_endpoint_exposes_request_counters() {
    let app = app(&[]);
    // Drive a playlist request first so the counters exist.
    let (_, _) = get(app.clone(), "/vod.m3u8?stream=no-such-stream").await;
    let (status, body) = get(app, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("relive_requests_total"));
}
