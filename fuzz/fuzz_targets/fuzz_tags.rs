#![no_main]

use libfuzzer_sys::fuzz_target;
use fuzz_statsd::{format_metrics, MetricsSnapshot, PacketWriter, TagSet, MAX_PACKET_SIZE, MAX_TAGS_LEN};
use std::time::{Duration, Instant};

// Fuzz target focusing on arbitrary banner and version strings in the tag suffix
fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let mid = text.len() / 2;
    let (banner, version) = if text.is_char_boundary(mid) {
        text.split_at(mid)
    } else {
        (text.as_ref(), "")
    };

    let tags = TagSet::dogstatsd(banner, version);
    assert!(tags.suffix().len() <= MAX_TAGS_LEN);

    let start = Instant::now();
    let snapshot = MetricsSnapshot {
        queue_cycle: data.len() as u64,
        execs_done: 1_000,
        ..MetricsSnapshot::new(start)
    };

    let mut buf = [0u8; MAX_PACKET_SIZE];
    let mut writer = PacketWriter::new(&mut buf);
    format_metrics(&mut writer, &snapshot, start + Duration::from_secs(1), "fuzzing", &tags);
    assert!(writer.len() <= MAX_PACKET_SIZE);
    if !writer.is_truncated() {
        assert_eq!(writer.as_bytes().iter().filter(|b| **b == b'\n').count(), 20);
    }
});
