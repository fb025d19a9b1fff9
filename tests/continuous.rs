mod common;

use common::{PlxBuilder, SlowSpec, expected_slow_mv};
use plx_rs::{ChannelType, Error, GapFill, Recording, Result};
use std::fs;

/// Deterministic raw sample for (channel, channel-rate sample index).
fn raw(ch: i16, g: u64) -> i16 {
    ((g % 1024) as i16) - 512 + ch * 3
}

/// A 1 kHz analog recording with `nchans` channels and `seconds` of data in
/// 100-sample chunks.
fn analog_recording(nchans: i32, seconds: usize) -> PlxBuilder {
    let mut b = PlxBuilder::new();
    for ch in 0..nchans {
        b.slow.push(SlowSpec::analog(ch, 1000));
    }
    let channels: Vec<i16> = (0..nchans as i16).collect();
    b.add_regular_continuous(&channels, 0, 40, 100, seconds * 10, raw);
    b
}

#[test]
fn test_resolved_shape_and_values() -> Result<()> {
    // 1000 Hz, 10 enabled channels, 60 seconds of data
    let path = analog_recording(10, 60).write_temp("cont_shape.plx");
    let recording = Recording::open(&path)?;

    let info = recording.resolve_continuous(ChannelType::Analog, 10.0, 10.5, None)?;
    assert_eq!(info.shape(), (500, 10));
    assert_eq!(info.channel_numbers(), (0..10).collect::<Vec<i32>>());

    let mut out = vec![0.0f64; 500 * 10];
    info.read(&mut out)?;

    // Row i holds base-rate sample 10000 + i for every channel
    for (row, g) in [(0usize, 10_000u64), (250, 10_250), (499, 10_499)] {
        for ch in 0..10 {
            let expect = expected_slow_mv(raw(ch as i16, g), 1, 1);
            let got = out[row * 10 + ch];
            assert!(
                (got - expect).abs() < 1e-12,
                "row {row} ch {ch}: {got} != {expect}"
            );
        }
    }

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn test_full_scale_maps_to_max_magnitude() -> Result<()> {
    let mut b = PlxBuilder::new();
    b.slow.push(SlowSpec::analog(0, 1000));
    // Full-scale positive ADC code on every sample
    b.add_regular_continuous(&[0], 0, 40, 100, 5, |_, _| 2048);

    let path = b.write_temp("cont_fullscale.plx");
    let recording = Recording::open(&path)?;

    let info = recording.resolve_continuous(ChannelType::Analog, 0.0, 0.1, Some(&[0]))?;
    let mut out = vec![0.0f64; info.num_samples()];
    info.read(&mut out)?;

    // gain 1, preamp 1: a full-scale code is exactly the declared 5000 mV
    for &v in &out {
        assert_eq!(v, 5000.0);
    }

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn test_chunked_reads_concatenate() -> Result<()> {
    let path = analog_recording(3, 5).write_temp("cont_chunked.plx");
    let recording = Recording::open(&path)?;

    let whole = recording.resolve_continuous(ChannelType::Analog, 1.0, 3.0, None)?;
    let mut one = vec![0.0f64; whole.num_samples() * whole.num_channels()];
    whole.read(&mut one)?;

    let first = recording.resolve_continuous(ChannelType::Analog, 1.0, 2.0, None)?;
    let second = recording.resolve_continuous(ChannelType::Analog, 2.0, 3.0, None)?;
    let mut two = vec![0.0f64; one.len()];
    let split = first.num_samples() * first.num_channels();
    first.read(&mut two[..split])?;
    second.read(&mut two[split..])?;

    assert_eq!(one, two);

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn test_empty_channel_selection_fails() -> Result<()> {
    let path = analog_recording(2, 1).write_temp("cont_empty_sel.plx");
    let recording = Recording::open(&path)?;

    match recording.resolve_continuous(ChannelType::Analog, 0.0, 0.5, Some(&[])) {
        Err(Error::ChannelNotFound(_)) => {}
        other => panic!("expected ChannelNotFound, got {other:?}"),
    }

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn test_absent_and_disabled_channels_fail() -> Result<()> {
    let mut b = analog_recording(2, 1);
    b.slow.push(SlowSpec {
        enabled: false,
        ..SlowSpec::analog(7, 1000)
    });
    let path = b.write_temp("cont_bad_chan.plx");
    let recording = Recording::open(&path)?;

    match recording.resolve_continuous(ChannelType::Analog, 0.0, 0.5, Some(&[0, 99])) {
        Err(Error::ChannelNotFound(_)) => {}
        other => panic!("expected ChannelNotFound for absent channel, got {other:?}"),
    }
    match recording.resolve_continuous(ChannelType::Analog, 0.0, 0.5, Some(&[7])) {
        Err(Error::ChannelNotFound(_)) => {}
        other => panic!("expected ChannelNotFound for disabled channel, got {other:?}"),
    }
    // Wrong category for a perfectly valid analog channel
    match recording.resolve_continuous(ChannelType::Lfp, 0.0, 0.5, Some(&[0])) {
        Err(Error::ChannelNotFound(_) | Error::OutOfRange { .. }) => {}
        other => panic!("expected failure for wrong category, got {other:?}"),
    }

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn test_window_validation() -> Result<()> {
    let path = analog_recording(1, 2).write_temp("cont_windows.plx");
    let recording = Recording::open(&path)?;

    match recording.resolve_continuous(ChannelType::Analog, 1.0, 1.0, None) {
        Err(Error::EmptyTimeRange { .. }) => {}
        other => panic!("expected EmptyTimeRange, got {other:?}"),
    }
    match recording.resolve_continuous(ChannelType::Analog, 1.5, 0.5, None) {
        Err(Error::EmptyTimeRange { .. }) => {}
        other => panic!("expected EmptyTimeRange, got {other:?}"),
    }
    // Entirely past the end of the 2-second recording
    match recording.resolve_continuous(ChannelType::Analog, 100.0, 101.0, None) {
        Err(Error::OutOfRange { .. }) => {}
        other => panic!("expected OutOfRange, got {other:?}"),
    }
    // A spike category is not continuous
    match recording.resolve_continuous(ChannelType::Spike, 0.0, 1.0, None) {
        Err(Error::WrongChannelType { .. }) => {}
        other => panic!("expected WrongChannelType, got {other:?}"),
    }

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn test_gap_fill_policies() -> Result<()> {
    let mut b = PlxBuilder::new();
    b.slow.push(SlowSpec::analog(0, 1000));
    // 0.2 s of data, a 0.3 s pause, then 0.2 s more
    b.add_regular_continuous(&[0], 0, 40, 100, 2, |_, _| 100);
    b.add_regular_continuous(&[0], 20_000, 40, 100, 2, |_, _| 100);

    let path = b.write_temp("cont_gaps.plx");
    let recording = Recording::open(&path)?;

    let info = recording.resolve_continuous(ChannelType::Analog, 0.0, 0.7, Some(&[0]))?;
    let mut out = vec![-1.0f64; info.num_samples()];
    info.read(&mut out)?;
    assert_eq!(info.num_samples(), 700);
    let data = expected_slow_mv(100, 1, 1);
    assert_eq!(out[0], data);
    assert_eq!(out[199], data);
    assert_eq!(out[200], 0.0); // default zero fill inside the pause
    assert_eq!(out[499], 0.0);
    assert_eq!(out[500], data);
    assert_eq!(out[699], data);

    let mut info = recording.resolve_continuous(ChannelType::Analog, 0.0, 0.7, Some(&[0]))?;
    info.set_gap_fill(GapFill::Nan);
    info.read(&mut out)?;
    assert!(out[350].is_nan());
    assert_eq!(out[100], data);

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn test_mixed_rates_decimate_to_coarsest() -> Result<()> {
    let mut b = PlxBuilder::new();
    b.slow.push(SlowSpec::analog(0, 1000));
    b.slow.push(SlowSpec::analog(1, 2000));
    // Same wall-clock coverage: 1 s each, different chunk shapes
    b.add_regular_continuous(&[0], 0, 40, 100, 10, raw);
    b.add_regular_continuous(&[1], 0, 20, 200, 10, raw);

    let path = b.write_temp("cont_rates.plx");
    let recording = Recording::open(&path)?;

    let info = recording.resolve_continuous(ChannelType::Analog, 0.2, 0.7, None)?;
    // Coarsest requested rate wins: 1000 Hz over half a second
    assert_eq!(info.shape(), (500, 2));

    let mut out = vec![0.0f64; 500 * 2];
    info.read(&mut out)?;
    for (row, s) in [(0usize, 200u64), (123, 323), (499, 699)] {
        // Channel 0 is already on the base grid
        let expect0 = expected_slow_mv(raw(0, s), 1, 1);
        assert!((out[row * 2] - expect0).abs() < 1e-12);
        // Channel 1 is decimated 2:1 onto it
        let expect1 = expected_slow_mv(raw(1, s * 2), 1, 1);
        assert!((out[row * 2 + 1] - expect1).abs() < 1e-12);
    }

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn test_output_buffer_too_small() -> Result<()> {
    let path = analog_recording(2, 1).write_temp("cont_small_buf.plx");
    let recording = Recording::open(&path)?;

    let info = recording.resolve_continuous(ChannelType::Analog, 0.0, 0.5, None)?;
    let mut out = vec![0.0f64; 10];
    match info.read(&mut out) {
        Err(Error::TooShortBuffer { .. }) => {}
        other => panic!("expected TooShortBuffer, got {other:?}"),
    }

    fs::remove_file(&path)?;
    Ok(())
}
