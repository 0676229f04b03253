use mirror_landing::page::{
    animation::{AnimationWindow, Easing, FrameIndex, FrameSelector, Progress},
    gate::UnlockGate,
    sampler::{FlushOutcome, SampleOutcome, SamplerSettings, ScrollSample, ScrollSampler},
};

fn window() -> AnimationWindow {
    AnimationWindow::new(400.0, 2000.0).unwrap()
}

fn unlocked_gate() -> UnlockGate {
    let mut gate = UnlockGate::new(0.0);
    gate.unlock();
    gate
}

#[test]
fn test_scroll_before_window_shows_first_frame() {
    let selector = FrameSelector::new(120, Easing::OutCubic);
    for scroll_y in [-50.0, 0.0, 399.0, 400.0] {
        let progress = window().progress_at(scroll_y);
        assert_eq!(progress, Progress::START);
        assert_eq!(selector.frame_for(progress), FrameIndex::FIRST);
    }
}

#[test]
fn test_scroll_past_window_shows_last_frame() {
    let selector = FrameSelector::new(120, Easing::OutCubic);
    for scroll_y in [2400.0, 2401.0, 1e9] {
        let progress = window().progress_at(scroll_y);
        assert_eq!(progress, Progress::END);
        assert_eq!(selector.frame_for(progress), FrameIndex::new(120).unwrap());
    }
}

#[test]
fn test_frame_index_is_monotonic_in_scroll() {
    for easing in [Easing::Linear, Easing::OutCubic, Easing::InOutCubic] {
        let selector = FrameSelector::new(150, easing);
        let mut previous = FrameIndex::FIRST;
        for step in 0..=3000 {
            let frame = selector.frame_for(window().progress_at(step as f64));
            assert!(frame >= previous, "{easing:?} went backwards at {step}");
            assert!(frame.get() >= 1 && frame.get() <= 150);
            previous = frame;
        }
    }
}

#[test]
fn test_out_cubic_front_loads_frames() {
    let selector = FrameSelector::new(100, Easing::OutCubic);
    // 1 - 0.5^3 = 0.875
    assert_eq!(
        selector.frame_for(Progress::new(0.5)),
        FrameIndex::new(88).unwrap()
    );
    assert_eq!(Easing::OutCubic.apply(0.0), 0.0);
    assert_eq!(Easing::OutCubic.apply(1.0), 1.0);
}

#[test]
fn test_invalid_window_is_rejected() {
    assert!(AnimationWindow::new(0.0, 0.0).is_err());
    assert!(AnimationWindow::new(0.0, -10.0).is_err());
    assert!(AnimationWindow::new(f64::NAN, 10.0).is_err());
    assert!(AnimationWindow::new(0.0, f64::INFINITY).is_err());
}

#[test]
fn test_locked_gate_produces_no_progress() {
    let gate = UnlockGate::new(300.0);
    let mut sampler = ScrollSampler::new(window(), SamplerSettings::default());
    let samples = (0..50).map(|i| ScrollSample::new(i as f64 * 100.0, i as f64 * 20.0));

    assert_eq!(sampler.progress_iter(&gate, samples).count(), 0);
    assert_eq!(sampler.offer(&gate, 1000.0), SampleOutcome::Ignored);
    assert!(!sampler.has_pending());
}

#[test]
fn test_sampler_coalesces_to_latest_sample() {
    let gate = unlocked_gate();
    let mut sampler = ScrollSampler::new(
        window(),
        SamplerSettings {
            min_interval_ms: 16.0,
            threshold_px: 1.0,
        },
    );

    let samples = vec![
        ScrollSample::new(400.0, 0.0),
        ScrollSample::new(600.0, 4.0),
        ScrollSample::new(800.0, 8.0),
        ScrollSample::new(1400.0, 12.0),
    ];
    let emitted: Vec<f64> = sampler
        .progress_iter(&gate, samples)
        .map(Progress::value)
        .collect();
    assert_eq!(emitted, vec![0.0]);

    // The last one is still waiting and goes out with the next flush.
    assert!(sampler.has_pending());
    assert_eq!(
        sampler.flush(20.0),
        FlushOutcome::Emitted(Progress::new(0.5))
    );
    assert_eq!(sampler.flush(40.0), FlushOutcome::Idle);
}

#[test]
fn test_sampler_rate_limits_emissions() {
    let gate = unlocked_gate();
    let mut sampler = ScrollSampler::new(window(), SamplerSettings::default());
    let samples = (0..=60).map(|i| ScrollSample::new(400.0 + i as f64 * 10.0, i as f64 * 4.0));

    // 240 ms of samples at one per 4 ms: at most one emission per ~16.7 ms.
    let count = sampler.progress_iter(&gate, samples).count();
    assert!(count <= 15, "{count} emissions");
    assert!(count >= 10, "{count} emissions");
}

#[test]
fn test_sampler_flush_now_ignores_interval() {
    let gate = unlocked_gate();
    let mut sampler = ScrollSampler::new(window(), SamplerSettings::default());

    sampler.offer(&gate, 400.0);
    assert!(matches!(sampler.flush(0.0), FlushOutcome::Emitted(_)));
    sampler.offer(&gate, 2400.0);
    assert_eq!(sampler.flush(1.0), FlushOutcome::Deferred);
    assert_eq!(sampler.flush_now(1.0), Some(Progress::END));
    assert_eq!(sampler.flush_now(2.0), None);
}
