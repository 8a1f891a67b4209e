//! Render-path integration tests: segment length, phase continuity and
//! channel mapping, driven through the public engine API.

mod helpers;

use approx::assert_relative_eq;
use helpers::tolerances::*;
use helpers::*;
use proptest::prelude::*;
use std::f64::consts::TAU;
use vibra::prelude::*;

/// N=6, identity mapping, 2000 Hz, 200 Hz carrier, one 10 ms command.
#[test]
fn test_end_to_end_protocol_example() {
    let (engine, mut renderer) = manual_engine(6, TEST_SAMPLE_RATE, TEST_CARRIER);
    assert_eq!(renderer.channels(), 6);

    let receipt = engine
        .receive(r#"{"duration":10,"amplitudes":[1,0,0,0,0,0],"timestamp":1000}"#)
        .unwrap();
    assert_eq!(receipt.samples, 20);

    let increment = renderer.phase_increment();
    assert_relative_eq!(increment, 0.6283185307179586, epsilon = 1e-12);

    let out = renderer.render(30).to_vec();
    assert_eq!(out.len(), 30 * 6);

    let col0 = column(&out, 6, 0);
    for k in 0..20 {
        assert_relative_eq!(col0[k], carrier(0.0, increment, k), epsilon = FLOAT_EPSILON);
    }
    for channel in 1..6 {
        assert_is_silent(&column(&out, 6, channel), 0.0, "zero-amplitude column");
    }
    assert_is_silent(&out[20 * 6..], 0.0, "trailing frames");
    assert_eq!(engine.queue_len(), 0);
}

#[test]
fn test_phase_continuity_across_segments_and_blocks() {
    let (engine, mut renderer) = manual_engine(1, 8000.0, 250.0);

    // 1 ms = 8 samples; amplitudes vary per segment, the carrier must not.
    let amplitudes = [1.0, 0.5, -0.75, 2.0, 0.25];
    for (i, &a) in amplitudes.iter().enumerate() {
        engine.receive(&message(1.0, &[a], i as f64)).unwrap();
    }
    let total = 8 * amplitudes.len();

    let mut rendered = Vec::new();
    for block in [3, 7, 1, 13, 16] {
        rendered.extend_from_slice(renderer.render(block));
    }
    assert_eq!(rendered.len(), total);

    let increment = renderer.phase_increment();
    for (n, &sample) in rendered.iter().enumerate() {
        let amplitude = amplitudes[n / 8] as f32;
        assert_relative_eq!(
            sample,
            amplitude * carrier(0.0, increment, n),
            epsilon = DSP_EPSILON
        );
    }

    let expected_phase = (total as f64 * increment).rem_euclid(TAU);
    assert_relative_eq!(renderer.phase(), expected_phase, epsilon = 1e-9);
}

#[test]
fn test_phase_freezes_over_silence_gap() {
    let (engine, mut renderer) = manual_engine(1, 1000.0, 100.0);
    let increment = renderer.phase_increment();

    engine.receive(&message(3.0, &[1.0], 0.0)).unwrap();
    renderer.render(10);
    let frozen = renderer.phase();
    assert_relative_eq!(frozen, 3.0 * increment, epsilon = 1e-12);

    renderer.render(100);
    assert_eq!(renderer.phase(), frozen);

    engine.receive(&message(4.0, &[1.0], 200.0)).unwrap();
    let out = renderer.render(4).to_vec();
    for (n, &sample) in out.iter().enumerate() {
        assert_relative_eq!(sample, carrier(frozen, increment, n), epsilon = FLOAT_EPSILON);
    }
}

#[test]
fn test_mapping_routes_only_to_mapped_columns() {
    let (engine, mut renderer) = manual_engine_with(
        VibraEngine::builder()
            .actuators(3)
            .sample_rate(4000.0)
            .carrier_frequency(250.0)
            .mapping(vec![5, 3, 0]),
    );
    assert_eq!(renderer.channels(), 6);

    engine.receive(&message(2.0, &[0.9, 0.5, 0.25], 0.0)).unwrap();
    let out = renderer.render(8).to_vec();
    let increment = renderer.phase_increment();

    let expected = |gain: f32| -> Vec<f32> {
        (0..8).map(|n| gain * carrier(0.0, increment, n)).collect()
    };
    assert_signals_equal(&column(&out, 6, 5), &expected(0.9), FLOAT_EPSILON, "actuator 0");
    assert_signals_equal(&column(&out, 6, 3), &expected(0.5), FLOAT_EPSILON, "actuator 1");
    assert_signals_equal(&column(&out, 6, 0), &expected(0.25), FLOAT_EPSILON, "actuator 2");
    for unmapped in [1, 2, 4] {
        assert_is_silent(&column(&out, 6, unmapped), 0.0, "unmapped column");
    }
}

#[test]
fn test_device_wider_than_mapping() {
    let (engine, mut renderer) = manual_engine_with(
        VibraEngine::builder()
            .actuators(2)
            .sample_rate(2000.0)
            .carrier_frequency(200.0)
            .device_channels(8),
    );
    engine.receive(&message(5.0, &[1.0, 1.0], 0.0)).unwrap();

    let out = renderer.render(10).to_vec();
    assert_eq!(out.len(), 80);
    for channel in 2..8 {
        assert_is_silent(&column(&out, 8, channel), 0.0, "extra device channel");
    }
}

#[test]
fn test_amplitudes_are_not_clipped() {
    let (engine, mut renderer) = manual_engine(1, 1000.0, 250.0);
    engine.receive(&message(4.0, &[3.5], 0.0)).unwrap();

    // 250 Hz at 1 kHz: sample 1 sits on the carrier peak.
    let out = renderer.render(4).to_vec();
    assert_relative_eq!(out[1], 3.5, epsilon = FLOAT_EPSILON);
}

#[test]
fn test_stats_track_render_activity() {
    let (engine, mut renderer) = manual_engine(1, 2000.0, 200.0);
    engine.receive(&message(5.0, &[1.0], 0.0)).unwrap();
    engine.receive(&message(5.0, &[1.0], 1.0)).unwrap();
    renderer.render(32);

    let stats = engine.stats_snapshot();
    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.segments_completed, 2);
    assert_eq!(stats.frames_rendered, 32);
    assert_eq!(stats.silent_frames, 12);
}

proptest! {
    /// Total segment duration D yields exactly D content frames, then silence.
    #[test]
    fn prop_render_length_matches_segment_total(
        durations in prop::collection::vec(0u64..40, 1..8),
        blocks in prop::collection::vec(1usize..64, 1..16),
    ) {
        let (engine, mut renderer) = manual_engine(2, 1000.0, 90.0);
        for (i, &samples) in durations.iter().enumerate() {
            // 1 ms per sample at 1 kHz.
            let duration = samples.max(1) as f64;
            engine.receive(&message(duration, &[1.0, 0.0], i as f64)).unwrap();
        }
        let total: usize = durations.iter().map(|&d| d.max(1) as usize).sum();

        let mut filled = 0usize;
        let mut rendered = Vec::new();
        let mut blocks = blocks.into_iter().cycle();
        while rendered.len() / 2 < total + 16 {
            let frames = blocks.next().unwrap_or(1);
            let mut buffer = vec![1.0f32; frames * 2];
            filled += renderer.render_into(&mut buffer);
            rendered.extend_from_slice(&buffer);
        }

        prop_assert_eq!(filled, total);
        prop_assert!(column(&rendered, 2, 1).iter().all(|&s| s == 0.0));
        prop_assert!(rendered[total * 2..].iter().all(|&s| s == 0.0));
        prop_assert_eq!(engine.queue_len(), 0);
    }
}
