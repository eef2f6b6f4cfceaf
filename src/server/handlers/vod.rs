use crate::error::Result;
use crate::hls::encoder;
use crate::hls::playlist::PlaylistKind;
use crate::metrics;
use crate::server::handlers::{playlist_response, resolve_stream};
use crate::server::state::AppState;
use crate::transform::ads::{inject_ad_breaks, AdConfig};
use crate::transform::master::{rewrite_master, Mode, RewriteQuery};
use crate::transform::vod::fit_to_duration;
use crate::upstream;
use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct VodParams {
    pub stream: Option<String>,
    pub variant: Option<usize>,
    pub duration: Option<f64>,
    pub ad: Option<String>,
}

/// Serve a VOD playlist, looped to the requested duration when one is
/// given. Without a `variant` index the upstream master is rewritten to
/// re-enter this endpoint per rendition.
pub async fn serve_vod(
    Query(params): Query<VodParams>,
    State(state): State<AppState>,
) -> Result<Response> {
    let started = Instant::now();
    match render_vod(&params, &state).await {
        Ok(body) => {
            metrics::record_request("vod", 200);
            metrics::record_duration("vod", started);
            Ok(playlist_response(body))
        }
        Err(e) => {
            if matches!(e, crate::error::ReliveError::Upstream { .. }) {
                metrics::record_upstream_error();
            }
            metrics::record_request("vod", e.status().as_u16());
            metrics::record_duration("vod", started);
            Err(e)
        }
    }
}

async fn render_vod(params: &VodParams, state: &AppState) -> Result<String> {
    let stream_url = resolve_stream(params.stream.as_deref())?;
    let ad = params.ad.as_deref().map(AdConfig::parse).transpose()?;

    info!(
        "vod request: stream={} variant={:?} duration={:?} ad={:?}",
        stream_url, params.variant, params.duration, params.ad
    );

    let root =
        upstream::master_playlist(state.fetcher.as_ref(), &state.cache, &stream_url).await?;

    let media = match (root.kind, params.variant) {
        (PlaylistKind::Master, None) => {
            let rewritten = rewrite_master(
                &root,
                Mode::Vod,
                &RewriteQuery {
                    stream: params.stream.as_deref(),
                    start_ms: None,
                    duration: params.duration,
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

    let mut fitted = fit_to_duration(&media, params.duration);
    if let Some(config) = &ad {
        inject_ad_breaks(&mut fitted.segments, config, 0.0);
    }
    Ok(encoder::encode(&fitted))
}
