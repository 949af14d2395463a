//! End-to-end session behavior against the synthetic device: the
//! acquire/replace lifecycle, live width adjustment, dimension reporting,
//! and error display.

use resolens::source::SyntheticProfile;
use resolens::types::{AspectConstrain, Constrain, Preset, VideoConstraints};
use resolens::{PreviewSession, PreviewState, ScaleMode, SessionError, SessionOptions, VideoTrack};
use std::time::Duration;

/// A synthetic device large enough to grant every preset.
fn full_range_session() -> PreviewSession {
    let synthetic = SyntheticProfile::default().with_native(7680, 4320);
    PreviewSession::new(SessionOptions::synthetic_only().with_synthetic(synthetic))
}

/// A synthetic device with a 4K-class ceiling, on which the largest
/// presets fail the way small webcams do.
fn limited_session() -> PreviewSession {
    PreviewSession::new(SessionOptions::synthetic_only())
}

#[tokio::test]
async fn every_preset_replaces_the_previous_stream() {
    let session = full_range_session();
    let mut previous_track: Option<VideoTrack> = None;

    for preset in Preset::all() {
        session.request_preset(preset).await.unwrap();

        if let Some(old) = previous_track.take() {
            assert!(
                old.ended(),
                "{preset}: the previous stream's track must be stopped"
            );
        }

        assert_eq!(session.preview(), PreviewState::Visible);
        let track = session.video_track().expect("acquired track");
        let settings = track.settings().expect("live track has settings");
        let constraints = preset.constraints();
        assert_eq!(constraints.width, Some(Constrain::Exact(settings.width)));
        assert_eq!(constraints.height, Some(Constrain::Exact(settings.height)));

        previous_track = Some(track);
    }
}

#[tokio::test]
async fn width_readout_reflects_exact_requests() {
    let session = full_range_session();
    session.request_preset(Preset::Hd).await.unwrap();
    assert_eq!(session.width_readout(), Some(1280));
}

#[tokio::test]
async fn width_readout_reflects_lower_bounds() {
    let session = full_range_session();
    session
        .request_stream(VideoConstraints::at_least(600, 400))
        .await
        .unwrap();
    assert_eq!(session.width_readout(), Some(600));
    // The granted mode is the closest fit above the bound.
    let settings = session.video_track().unwrap().settings().unwrap();
    assert_eq!((settings.width, settings.height), (640, 480));
}

#[tokio::test]
async fn aspect_lock_constrains_the_observed_ratio() {
    let session = full_range_session();
    session.request_preset(Preset::Vga).await.unwrap();

    session.apply_width(320, true).await.unwrap();

    let constraints = session.video_track().unwrap().constraints();
    assert_eq!(constraints.width, Some(Constrain::Exact(320)));
    match constraints.aspect_ratio {
        Some(AspectConstrain::Exact(ratio)) => {
            assert!(
                (ratio - 640.0 / 480.0).abs() < 1e-9,
                "aspect should be the observed 640/480, got {ratio}"
            );
        }
        other => panic!("expected exact aspect constraint, got {other:?}"),
    }
}

#[tokio::test]
async fn without_aspect_lock_only_width_is_constrained() {
    let session = full_range_session();
    session.request_preset(Preset::Vga).await.unwrap();

    session.apply_width(320, false).await.unwrap();

    let constraints = session.video_track().unwrap().constraints();
    assert_eq!(constraints.width, Some(Constrain::Exact(320)));
    assert_eq!(constraints.height, None);
    assert_eq!(constraints.aspect_ratio, None);
}

#[tokio::test]
async fn failed_acquisition_keeps_the_preview_hidden() {
    let session = limited_session();

    let err = session.request_preset(Preset::EightK).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Media(resolens::MediaError::Overconstrained(_))
    ));

    assert_eq!(session.preview(), PreviewState::Hidden);
    let message = session.error_message().expect("failure must be displayed");
    assert!(message.contains("get_user_media"));
    assert!(message.contains("Overconstrained"));
}

#[tokio::test]
async fn failed_acquisition_still_stops_the_previous_stream() {
    let session = limited_session();
    session.request_preset(Preset::Vga).await.unwrap();
    let old_track = session.video_track().unwrap();

    let _ = session.request_preset(Preset::EightK).await;

    assert!(old_track.ended());
    assert_eq!(session.preview(), PreviewState::Hidden);
}

#[tokio::test]
async fn successful_acquisition_clears_the_error_display() {
    let session = limited_session();
    let _ = session.request_preset(Preset::EightK).await;
    assert!(session.error_message().is_some());

    session.request_preset(Preset::Vga).await.unwrap();
    assert_eq!(session.error_message(), None);
    assert_eq!(session.preview(), PreviewState::Visible);
}

#[tokio::test]
async fn repeated_observations_do_not_log_again() {
    let session = full_range_session();
    session.request_preset(Preset::Vga).await.unwrap();
    assert_eq!(session.dimension_report_count(), 1);

    // Resize polls with unchanged dimensions stay quiet.
    session.tick();
    session.tick();
    session.tick();
    assert_eq!(session.dimension_report_count(), 1);

    // An adjustment that changes the actual size logs exactly once more.
    session.apply_width(320, false).await.unwrap();
    assert_eq!(session.dimension_report_count(), 2);
    session.tick();
    assert_eq!(session.dimension_report_count(), 2);
}

#[tokio::test]
async fn failed_adjustment_reports_and_keeps_the_readout() {
    let session = full_range_session();
    session.request_preset(Preset::Hd).await.unwrap();
    assert_eq!(session.width_readout(), Some(1280));

    let err = session.apply_width(5000, false).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Media(resolens::MediaError::Overconstrained(_))
    ));

    let message = session.error_message().expect("failure must be displayed");
    assert!(message.contains("apply_constraints"));
    assert!(message.contains("Overconstrained"));

    // The readout and the granted mode are untouched.
    assert_eq!(session.width_readout(), Some(1280));
    let settings = session.video_track().unwrap().settings().unwrap();
    assert_eq!((settings.width, settings.height), (1280, 720));
    assert_eq!(session.preview(), PreviewState::Visible);
}

#[tokio::test]
async fn adjustment_without_a_stream_is_rejected() {
    let session = full_range_session();
    let err = session.apply_width(320, false).await.unwrap_err();
    assert_eq!(err, SessionError::NoActiveStream);
    assert_eq!(session.error_message(), None);
}

#[tokio::test]
async fn superseded_acquisition_is_discarded() {
    let synthetic = SyntheticProfile::default()
        .with_native(7680, 4320)
        .with_open_latency_ms(150);
    let session =
        PreviewSession::new(SessionOptions::synthetic_only().with_synthetic(synthetic));

    let first = {
        let session = session.clone();
        tokio::spawn(async move { session.request_preset(Preset::FullHd).await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    let second = {
        let session = session.clone();
        tokio::spawn(async move { session.request_preset(Preset::Qvga).await })
    };

    let (first, second) = futures::future::join(first, second).await;
    first.unwrap().unwrap();
    second.unwrap().unwrap();

    // Only the later request's stream is installed.
    let settings = session.video_track().unwrap().settings().unwrap();
    assert_eq!((settings.width, settings.height), (320, 240));
    assert_eq!(session.width_readout(), Some(320));
    assert_eq!(session.preview(), PreviewState::Visible);
}

#[tokio::test]
async fn stale_failure_is_not_displayed() {
    let synthetic = SyntheticProfile::default().with_open_latency_ms(150);
    let session =
        PreviewSession::new(SessionOptions::synthetic_only().with_synthetic(synthetic));

    // Will fail (8K exceeds the default ceiling), but only after a newer
    // request has started.
    let first = {
        let session = session.clone();
        tokio::spawn(async move { session.request_preset(Preset::EightK).await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    let second = {
        let session = session.clone();
        tokio::spawn(async move { session.request_preset(Preset::Vga).await })
    };

    let (first, second) = futures::future::join(first, second).await;
    assert!(first.unwrap().is_err());
    second.unwrap().unwrap();

    assert_eq!(session.error_message(), None);
    assert_eq!(session.preview(), PreviewState::Visible);
}

#[tokio::test]
async fn capture_delivers_frames_at_the_granted_size() {
    let session = full_range_session();
    session.request_preset(Preset::Qvga).await.unwrap();

    let frame = session.capture_frame().await.unwrap();
    assert_eq!((frame.width, frame.height), (320, 240));
    assert_eq!(frame.data.len(), 320 * 240 * 3);
    assert!(frame.is_valid());
}

#[tokio::test]
async fn release_hides_and_stops_everything() {
    let session = full_range_session();
    session.request_preset(Preset::Vga).await.unwrap();
    let track = session.video_track().unwrap();

    session.release();

    assert!(track.ended());
    assert_eq!(session.preview(), PreviewState::Hidden);
    assert_eq!(session.dimensions(), None);
    assert_eq!(
        session.capture_frame().await.unwrap_err(),
        SessionError::NoActiveStream
    );
}

#[tokio::test]
async fn scale_mode_is_presentation_only() {
    let session = full_range_session();
    session.request_preset(Preset::Vga).await.unwrap();
    let before = session.video_track().unwrap().settings().unwrap();

    session.set_scale_mode(ScaleMode::Fixed);
    assert_eq!(session.scale_mode(), ScaleMode::Fixed);

    // Toggling display sizing never touches the track.
    let after = session.video_track().unwrap().settings().unwrap();
    assert_eq!(before, after);
    session.set_scale_mode(ScaleMode::Auto);
    assert_eq!(session.scale_mode(), ScaleMode::Auto);
}
