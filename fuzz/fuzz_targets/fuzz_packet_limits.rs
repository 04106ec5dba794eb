#![no_main]

use libfuzzer_sys::fuzz_target;
use fuzz_statsd::{format_metrics, MetricsSnapshot, PacketWriter, TagSet, MAX_PACKET_SIZE};
use std::time::Instant;

// Fuzz target focusing on packet size limits and truncation
fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    // First 2 bytes pick the buffer size, 0 to MAX_PACKET_SIZE
    let capacity = usize::from(u16::from_le_bytes([data[0], data[1]])) % (MAX_PACKET_SIZE + 1);
    let tags = if data[2] % 2 == 0 {
        TagSet::empty()
    } else {
        TagSet::dogstatsd(&String::from_utf8_lossy(&data[3..]), "4.00c")
    };

    let start = Instant::now();
    let snapshot = MetricsSnapshot::new(start);

    let mut full = [0u8; MAX_PACKET_SIZE];
    let mut full_writer = PacketWriter::new(&mut full);
    format_metrics(&mut full_writer, &snapshot, start, "fuzzing", &tags);

    let mut buf = vec![0u8; capacity];
    let mut writer = PacketWriter::new(&mut buf);
    format_metrics(&mut writer, &snapshot, start, "fuzzing", &tags);

    assert!(writer.len() <= capacity);
    // a truncated packet is a prefix of the untruncated one
    assert!(full_writer.as_bytes().starts_with(writer.as_bytes()));
});
