use crate::error::{ReliveError, Result};
use crate::hls::encoder;
use crate::hls::playlist::PlaylistKind;
use crate::metrics;
use crate::server::handlers::{now_epoch_ms, playlist_response, resolve_stream};
use crate::server::state::AppState;
use crate::transform::ads::{inject_ad_breaks, AdConfig};
use crate::transform::live::{slide_window, LiveWindow, DEFAULT_WINDOW_SIZE};
use crate::transform::master::{rewrite_master, Mode, RewriteQuery};
use crate::upstream;
use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct LiveParams {
    pub stream: Option<String>,
    pub variant: Option<usize>,
    /// Wall-clock stream start, epoch ms. Defaults to now.
    pub start: Option<i64>,
    /// Wall-clock "now", epoch ms. Only meant for deterministic testing.
    pub now: Option<i64>,
    #[serde(rename = "windowSize")]
    pub window_size: Option<usize>,
    pub ad: Option<String>,
}

/// Serve a simulated-live playlist: a sliding window over the looped
/// upstream VOD source. Without a `variant` index the upstream master is
/// rewritten to re-enter this endpoint per rendition, pinning `start` so
/// every rendition shares the same timeline.
pub async fn serve_live(
    Query(params): Query<LiveParams>,
    State(state): State<AppState>,
) -> Result<Response> {
    let started = Instant::now();
    match render_live(&params, &state).await {
        Ok(body) => {
            metrics::record_request("live", 200);
            metrics::record_duration("live", started);
            Ok(playlist_response(body))
        }
        Err(e) => {
            if matches!(e, ReliveError::Upstream { .. }) {
                metrics::record_upstream_error();
            }
            metrics::record_request("live", e.status().as_u16());
            metrics::record_duration("live", started);
            Err(e)
        }
    }
}

async fn render_live(params: &LiveParams, state: &AppState) -> Result<String> {
    let stream_url = resolve_stream(params.stream.as_deref())?;
    let ad = params.ad.as_deref().map(AdConfig::parse).transpose()?;

    let now_ms = params.now.unwrap_or_else(now_epoch_ms);
    let start_ms = params.start.unwrap_or(now_ms);
    let window_size = params.window_size.unwrap_or(DEFAULT_WINDOW_SIZE);

    info!(
        "live request: stream={} variant={:?} start={} now={} window={}",
        stream_url, params.variant, start_ms, now_ms, window_size
    );

    let root =
        upstream::master_playlist(state.fetcher.as_ref(), &state.cache, &stream_url).await?;

    let media = match (root.kind, params.variant) {
        (PlaylistKind::Master, None) => {
            let rewritten = rewrite_master(
                &root,
                Mode::Live,
                &RewriteQuery {
                    stream: params.stream.as_deref(),
                    start_ms: Some(start_ms),
                    duration: None,
                    ad: params.ad.as_deref(),
                },
            );
            return Ok(encoder::encode(&rewritten));
        }
        (PlaylistKind::Master, Some(index)) => {
            upstream::media_playlist(state.fetcher.as_ref(), &state.cache, &stream_url, index)
                .await?
        }
        (PlaylistKind::Media, _) => root,
    };

    let LiveWindow {
        mut playlist,
        start_offset,
    } = slide_window(&media, start_ms, now_ms, window_size);

    if let Some(config) = &ad {
        inject_ad_breaks(&mut playlist.segments, config, start_offset);
    }
    Ok(encoder::encode(&playlist))
}
