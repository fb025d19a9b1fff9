mod common;

use common::{EventSpec, PlxBuilder, SpikeSpec, expected_spike_mv};
use plx_rs::{ChannelType, Error, Recording, Result};
use std::fs;

#[test]
fn test_strobed_events_at_regular_cadence() -> Result<()> {
    let mut b = PlxBuilder::new();
    b.event.push(EventSpec {
        name: "Strobed",
        channel: 257,
    });
    // One strobed event every 100 ms for 10 seconds
    for k in 0..100u64 {
        b.event_block(k * 4000, 257, k as i16);
    }

    let path = b.write_temp("disc_cadence.plx");
    let recording = Recording::open(&path)?;

    let info = recording.resolve_discrete(ChannelType::Event, 0.0, 1.0, None, None)?;
    assert_eq!(info.num_records(), 10);

    let events = info.read()?;
    assert_eq!(events.len(), 10);
    for (k, ev) in events.iter().enumerate() {
        assert_eq!(ev.channel, 257);
        assert_eq!(ev.unit, k as i32); // strobe value
        assert!((ev.timestamp - k as f64 * 0.1).abs() < 1e-9);
        assert!(ev.waveform.is_none());
    }
    for pair in events.windows(2) {
        assert!(pair[0].ticks < pair[1].ticks);
    }

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn test_spike_channel_and_unit_filters() -> Result<()> {
    let mut b = PlxBuilder::new();
    for ch in 1..=2 {
        b.spike.push(SpikeSpec {
            name: "SPK",
            channel: ch,
            gain: 1,
        });
    }
    b.spike_block(1000, 1, 0, vec![10; 8]);
    b.spike_block(2000, 1, 1, vec![20; 8]);
    b.spike_block(3000, 2, 1, vec![30; 8]);
    b.spike_block(4000, 2, 2, vec![40; 8]);

    let path = b.write_temp("disc_filters.plx");
    let recording = Recording::open(&path)?;

    let all = recording.resolve_discrete(ChannelType::Spike, 0.0, 1.0, None, None)?;
    assert_eq!(all.num_records(), 4);

    let ch1 = recording.resolve_discrete(ChannelType::Spike, 0.0, 1.0, Some(&[1]), None)?;
    assert_eq!(ch1.num_records(), 2);

    let unit1 = recording.resolve_discrete(ChannelType::Spike, 0.0, 1.0, None, Some(&[1]))?;
    let records = unit1.read()?;
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|s| s.unit == 1));

    let both =
        recording.resolve_discrete(ChannelType::Spike, 0.0, 1.0, Some(&[2]), Some(&[2]))?;
    assert_eq!(both.num_records(), 1);

    match recording.resolve_discrete(ChannelType::Spike, 0.0, 1.0, Some(&[9]), None) {
        Err(Error::ChannelNotFound(_)) => {}
        other => panic!("expected ChannelNotFound, got {other:?}"),
    }
    match recording.resolve_discrete(ChannelType::Spike, 0.0, 1.0, Some(&[]), None) {
        Err(Error::ChannelNotFound(_)) => {}
        other => panic!("expected ChannelNotFound, got {other:?}"),
    }

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn test_waveforms_only_on_request() -> Result<()> {
    let mut b = PlxBuilder::new();
    b.spike.push(SpikeSpec {
        name: "SPK",
        channel: 1,
        gain: 2,
    });
    b.spike_block(500, 1, 0, vec![-512, 0, 512, 1024]);

    let path = b.write_temp("disc_waveforms.plx");
    let recording = Recording::open(&path)?;

    let info = recording.resolve_discrete(ChannelType::Spike, 0.0, 1.0, None, None)?;
    let bare = info.read()?;
    assert!(bare[0].waveform.is_none());

    let mut info = recording.resolve_discrete(ChannelType::Spike, 0.0, 1.0, None, None)?;
    info.set_include_waveforms(true);
    let full = info.read()?;
    let wf = full[0].waveform.as_ref().expect("waveform requested");
    assert_eq!(wf.len(), 4);
    for (sample, &raw) in wf.iter().zip(&[-512i16, 0, 512, 1024]) {
        let expect = expected_spike_mv(raw, 2);
        assert!((sample - expect).abs() < 1e-12);
    }

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn test_record_ordering_within_one_tick() -> Result<()> {
    let mut b = PlxBuilder::new();
    for ch in 1..=3 {
        b.spike.push(SpikeSpec {
            name: "SPK",
            channel: ch,
            gain: 1,
        });
    }
    b.sort_blocks = false;
    // Same tick, channels written out of order
    b.spike_block(100, 3, 0, vec![0; 4]);
    b.spike_block(100, 1, 1, vec![0; 4]);
    b.spike_block(100, 1, 0, vec![0; 4]);
    b.spike_block(100, 2, 0, vec![0; 4]);
    b.spike_block(200, 1, 0, vec![0; 4]);

    let path = b.write_temp("disc_ordering.plx");
    let recording = Recording::open(&path)?;

    let info = recording.resolve_discrete(ChannelType::Spike, 0.0, 1.0, None, None)?;
    let records = info.read()?;
    let key: Vec<(u64, i32, i32)> = records
        .iter()
        .map(|s| (s.ticks, s.channel, s.unit))
        .collect();
    assert_eq!(
        key,
        vec![(100, 1, 0), (100, 1, 1), (100, 2, 0), (100, 3, 0), (200, 1, 0)]
    );

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn test_discrete_window_validation() -> Result<()> {
    let mut b = PlxBuilder::new();
    b.spike.push(SpikeSpec {
        name: "SPK",
        channel: 1,
        gain: 1,
    });
    b.spike_block(40_000, 1, 0, vec![0; 4]);

    let path = b.write_temp("disc_windows.plx");
    let recording = Recording::open(&path)?;

    match recording.resolve_discrete(ChannelType::Spike, 2.0, 2.0, None, None) {
        Err(Error::EmptyTimeRange { .. }) => {}
        other => panic!("expected EmptyTimeRange, got {other:?}"),
    }
    match recording.resolve_discrete(ChannelType::Spike, 100.0, 200.0, None, None) {
        Err(Error::OutOfRange { .. }) => {}
        other => panic!("expected OutOfRange, got {other:?}"),
    }
    match recording.resolve_discrete(ChannelType::Analog, 0.0, 1.0, None, None) {
        Err(Error::WrongChannelType { .. }) => {}
        other => panic!("expected WrongChannelType, got {other:?}"),
    }
    // An in-coverage window between spikes is a valid empty result
    let spike_at_one_second =
        recording.resolve_discrete(ChannelType::Spike, 0.5, 1.5, None, None)?;
    assert_eq!(spike_at_one_second.num_records(), 1);

    fs::remove_file(&path)?;
    Ok(())
}
