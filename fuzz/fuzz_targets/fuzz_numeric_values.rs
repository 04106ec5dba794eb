#![no_main]

use libfuzzer_sys::fuzz_target;
use fuzz_statsd::{format_metrics, MetricsSnapshot, PacketWriter, TagSet, MAX_PACKET_SIZE};
use std::time::{Duration, Instant};

fn read_u64(data: &[u8], index: usize) -> u64 {
    let mut bytes = [0u8; 8];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = data.get(index * 8 + i).copied().unwrap_or(0);
    }
    u64::from_le_bytes(bytes)
}

// Fuzz target focusing on extreme counter values and elapsed times
fuzz_target!(|data: &[u8]| {
    let start = Instant::now();
    let snapshot = MetricsSnapshot {
        queue_cycle: read_u64(data, 0),
        cycles_wo_finds: read_u64(data, 1),
        execs_done: read_u64(data, 2),
        paths_total: read_u64(data, 3) as u32,
        unique_crashes: read_u64(data, 4),
        total_crashes: read_u64(data, 5),
        edges_found: read_u64(data, 6) as u32,
        ..MetricsSnapshot::new(start)
    };
    let now = start + Duration::from_millis(read_u64(data, 7) % 1_000_000_000);

    let mut buf = [0u8; MAX_PACKET_SIZE];
    let mut writer = PacketWriter::new(&mut buf);
    format_metrics(&mut writer, &snapshot, now, "fuzzing", &TagSet::empty());

    let text = std::str::from_utf8(writer.as_bytes()).unwrap();
    let rate = text
        .lines()
        .find_map(|line| line.strip_prefix("fuzzing.execs_per_sec:"))
        .unwrap();
    let (_, decimals) = rate.trim_end_matches("|g").split_once('.').unwrap();
    assert_eq!(decimals.len(), 2);
});
