mod common;

use common::{PlxBuilder, SlowSpec};
use plx_rs::{ChannelType, PlxIndex, Recording, Result};
use std::fs;

#[test]
fn test_chunks_coalesce_into_frames() -> Result<()> {
    let mut b = PlxBuilder::new();
    for ch in 0..4 {
        b.slow.push(SlowSpec::analog(ch, 1000));
    }
    // 5 chunks, each one block per channel: 20 blocks, 5 frames
    b.add_regular_continuous(&[0, 1, 2, 3], 0, 40, 100, 5, |ch, g| (g as i16) + ch);

    let path = b.write_temp("index_coalesce.plx");
    let recording = Recording::open(&path)?;
    let set = recording.index().frames(ChannelType::Analog);

    assert_eq!(set.len(), 5);
    assert_eq!(set.blocks, 20);
    assert_eq!(set.channels, vec![0, 1, 2, 3]);
    for (i, frame) in set.frames().iter().enumerate() {
        assert_eq!(frame.ts, i as u64 * 4000);
        assert_eq!(frame.nblocks, 4);
        assert_eq!(frame.samples, 100);
        assert_eq!(frame.duration, 4000);
        // 4 blocks of 16-byte header + 200 payload bytes
        assert_eq!(frame.end - frame.begin, 4 * 216);
    }

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn test_per_channel_sample_totals() -> Result<()> {
    let mut b = PlxBuilder::new();
    b.slow.push(SlowSpec::analog(0, 1000));
    b.slow.push(SlowSpec::analog(1, 1000));
    b.add_regular_continuous(&[0, 1], 0, 40, 250, 8, |_, g| g as i16);

    let path = b.write_temp("index_totals.plx");
    let recording = Recording::open(&path)?;
    let set = recording.index().frames(ChannelType::Analog);

    // Concatenating per-frame sample runs reproduces the full per-channel
    // count: each frame contributes `samples` per channel, no overlap, no
    // omission
    let per_channel: u64 = set.frames().iter().map(|f| f.samples as u64).sum();
    assert_eq!(per_channel, 2000);
    assert_eq!(set.samples, per_channel * 2);

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn test_gap_starts_new_frame() -> Result<()> {
    let mut b = PlxBuilder::new();
    b.slow.push(SlowSpec::analog(0, 1000));
    // Two runs of perfect cadence separated by an acquisition pause
    b.add_regular_continuous(&[0], 0, 40, 100, 3, |_, g| g as i16);
    b.add_regular_continuous(&[0], 1_000_000, 40, 100, 2, |_, g| g as i16);

    let path = b.write_temp("index_gap.plx");
    let recording = Recording::open(&path)?;
    let set = recording.index().frames(ChannelType::Analog);

    assert_eq!(set.len(), 5);
    let ts: Vec<u64> = set.frames().iter().map(|f| f.ts).collect();
    assert_eq!(ts, vec![0, 4000, 8000, 1_000_000, 1_004_000]);

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn test_find_overlapping_is_exact() -> Result<()> {
    let mut b = PlxBuilder::new();
    b.slow.push(SlowSpec::analog(0, 1000));
    b.add_regular_continuous(&[0], 0, 40, 100, 10, |_, g| g as i16);

    let path = b.write_temp("index_overlap.plx");
    let recording = Recording::open(&path)?;
    let set = recording.index().frames(ChannelType::Analog);

    // [4000, 12000) ticks covers frames 1 and 2 exactly
    let hit = set.find_overlapping(4000, 12_000);
    assert_eq!(hit.len(), 2);
    assert_eq!(hit[0].ts, 4000);
    assert_eq!(hit[1].ts, 8000);

    // Touching a frame's last tick includes it; its end tick does not
    assert_eq!(set.find_overlapping(7999, 8000).len(), 1);
    assert_eq!(set.find_overlapping(8000, 8001).len(), 1);
    assert_eq!(set.find_overlapping(8000, 8001)[0].ts, 8000);

    // Ascending, no duplicates across the whole set
    let all = set.find_overlapping(0, u64::MAX);
    assert_eq!(all.len(), 10);
    for pair in all.windows(2) {
        assert!(pair[0].ts < pair[1].ts);
    }

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn test_discrete_frames_group_same_timestamp_bursts() -> Result<()> {
    let mut b = PlxBuilder::new();
    for ch in 1..=3 {
        b.spike.push(common::SpikeSpec {
            name: "SPK",
            channel: ch,
            gain: 1,
        });
    }
    // Three spikes on different channels at the same tick, then one alone
    b.spike_block(500, 1, 0, vec![0; 8]);
    b.spike_block(500, 2, 0, vec![0; 8]);
    b.spike_block(500, 3, 1, vec![0; 8]);
    b.spike_block(700, 1, 0, vec![0; 8]);

    let path = b.write_temp("index_bursts.plx");
    let recording = Recording::open(&path)?;
    let set = recording.index().frames(ChannelType::Spike);

    assert_eq!(set.len(), 2);
    assert_eq!(set.frames()[0].nblocks, 3);
    assert_eq!(set.frames()[0].duration, 0);
    assert_eq!(set.frames()[1].nblocks, 1);

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn test_index_json_roundtrip() -> Result<()> {
    let mut b = PlxBuilder::new();
    b.slow.push(SlowSpec::analog(0, 1000));
    b.add_regular_continuous(&[0], 0, 40, 100, 6, |_, g| g as i16);
    b.event_block(123, 257, 42);
    b.event.push(common::EventSpec {
        name: "Strobed",
        channel: 257,
    });

    let path = b.write_temp("index_roundtrip.plx");
    let index_path = std::env::temp_dir().join("plx_rs_index_roundtrip.json");
    let index_path = index_path.to_str().unwrap();

    let recording = Recording::open(&path)?;
    recording.index().save_to_file(index_path)?;

    let loaded = PlxIndex::load_from_file(index_path)?;
    assert_eq!(loaded.file_size, recording.index().file_size);
    assert_eq!(loaded.data_start, recording.index().data_start);
    for &cat in &ChannelType::ALL {
        let a = recording.index().frames(cat);
        let b = loaded.frames(cat);
        assert_eq!(a.frames(), b.frames());
        assert_eq!(a.blocks, b.blocks);
        assert_eq!(a.samples, b.samples);
        assert_eq!(a.channels, b.channels);
    }

    fs::remove_file(&path)?;
    fs::remove_file(index_path)?;
    Ok(())
}

#[test]
fn test_non_monotonic_blocks_are_counted_not_fatal() -> Result<()> {
    let mut b = PlxBuilder::new();
    b.slow.push(SlowSpec::analog(0, 1000));
    b.sort_blocks = false;
    b.continuous_block(8000, 0, vec![0; 100]);
    b.continuous_block(4000, 0, vec![0; 100]); // runs backwards
    b.continuous_block(12_000, 0, vec![0; 100]);

    let path = b.write_temp("index_backwards.plx");
    let recording = Recording::open(&path)?;
    let set = recording.index().frames(ChannelType::Analog);

    assert_eq!(set.non_monotonic, 1);
    // The offending block is still indexed
    assert_eq!(set.len(), 3);
    assert_eq!(set.blocks, 3);

    fs::remove_file(&path)?;
    Ok(())
}
