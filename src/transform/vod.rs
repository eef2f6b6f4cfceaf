//! VOD fitter: loop a source playlist until it covers a target duration.

use crate::hls::playlist::Playlist;
use crate::hls::tag::names;

/// Produce a VOD playlist at least `target` seconds long by repeating the
/// source segments, marking a discontinuity at every wrap. Without a
/// target (or without segments) the source passes through with only the
/// VOD finalization applied. The last appended segment may overshoot the
/// target; it is never truncated.
pub fn fit_to_duration(source: &Playlist, target: Option<f64>) -> Playlist {
    let mut out = source.clone();

    if let Some(target) = target {
        if !source.segments.is_empty() {
            let len = source.segments.len();
            let mut segments = Vec::new();
            let mut total = 0.0f64;
            let mut i = 0usize;

            while total < target {
                let mut segment = source.segments[i % len].clone();
                if i >= len && i % len == 0 {
                    segment.mark_discontinuity();
                }
                total += segment.duration;
                segments.push(segment);
                i += 1;
            }

            out.segments = segments;
        }
    }

    finalize_vod(&mut out);
    out
}

/// Set the closing VOD tags, updating existing tags in place.
fn finalize_vod(playlist: &mut Playlist) {
    let target_duration = playlist.max_segment_duration().ceil() as u64;
    playlist.set_tag_value(names::TARGETDURATION, target_duration.to_string());
    playlist.set_tag_value(names::PLAYLIST_TYPE, "VOD");
    playlist.ensure_tag(names::ENDLIST);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hls::parser::parse;
    use crate::hls::tag::Tag;

    fn source(durations: &[f64]) -> Playlist {
        let mut body = String::from("#EXTM3U\n#EXT-X-TARGETDURATION:10\n");
        for (i, d) in durations.iter().enumerate() {
            body.push_str(&format!("#EXTINF:{d},\nseg{i}.ts\n"));
        }
        parse(&body, "http://origin.test/hls/index.m3u8").unwrap()
    }

    #[test]
    fn passthrough_without_target_gets_vod_tags() {
        let fitted = fit_to_duration(&source(&[10.0, 10.0, 10.0]), None);

        assert_eq!(fitted.segments.len(), 3);
        assert_eq!(
            fitted.tag(names::TARGETDURATION).map(Tag::raw),
            Some("#EXT-X-TARGETDURATION:10")
        );
        assert_eq!(
            fitted.tag(names::PLAYLIST_TYPE).map(Tag::raw),
            Some("#EXT-X-PLAYLIST-TYPE:VOD")
        );
        assert!(fitted.has_tag(names::ENDLIST));
        assert!(fitted.segments.iter().all(|s| !s.discontinuity));
    }

    #[test]
    fn loops_and_extends_to_target() {
        // 2 x 10s source, 35s target: s0 s1 s0 s1 with one wrap marker.
        let fitted = fit_to_duration(&source(&[10.0, 10.0]), Some(35.0));

        assert_eq!(fitted.segments.len(), 4);
        let uris: Vec<&str> = fitted.segments.iter().map(|s| s.uri.as_str()).collect();
        assert_eq!(
            uris,
            vec![
                "http://origin.test/hls/seg0.ts",
                "http://origin.test/hls/seg1.ts",
                "http://origin.test/hls/seg0.ts",
                "http://origin.test/hls/seg1.ts",
            ]
        );
        let marked: Vec<usize> = fitted
            .segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.discontinuity)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(marked, vec![2]);
        assert!(fitted.has_tag(names::ENDLIST));
    }

    #[test]
    fn total_duration_covers_target_without_truncation() {
        let src = source(&[10.0, 7.0, 4.0]);
        for target in [0.0, 5.0, 21.0, 22.0, 60.0] {
            let fitted = fit_to_duration(&src, Some(target));
            assert!(
                fitted.total_duration() >= target,
                "target {target} not covered"
            );
            assert!(
                fitted.total_duration() < target + 10.0,
                "target {target} overshoots by a full loop"
            );
        }
    }

    #[test]
    fn discontinuity_count_matches_wraps() {
        let src = source(&[10.0, 10.0, 10.0]);
        let fitted = fit_to_duration(&src, Some(95.0));

        // 10 segments, 3-segment source: wraps before index 3, 6, 9.
        assert_eq!(fitted.segments.len(), 10);
        let marks = fitted.segments.iter().filter(|s| s.discontinuity).count();
        assert_eq!(marks, (fitted.segments.len() - 1) / src.segments.len());
    }

    #[test]
    fn empty_source_only_finalizes() {
        let fitted = fit_to_duration(&source(&[]), Some(30.0));

        assert!(fitted.segments.is_empty());
        assert_eq!(
            fitted.tag(names::TARGETDURATION).map(Tag::raw),
            Some("#EXT-X-TARGETDURATION:0")
        );
        assert!(fitted.has_tag(names::ENDLIST));
    }

    #[test]
    fn existing_playlist_type_is_updated_in_place() {
        let mut src = source(&[10.0]);
        src.tags.push(Tag::parse("#EXT-X-PLAYLIST-TYPE:EVENT"));
        let fitted = fit_to_duration(&src, None);

        let types: Vec<&Tag> = fitted
            .tags
            .iter()
            .filter(|t| t.name() == names::PLAYLIST_TYPE)
            .collect();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].raw(), "#EXT-X-PLAYLIST-TYPE:VOD");
    }
}
