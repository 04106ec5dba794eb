use fuzz_statsd::{
    Endpoint, MetricsSnapshot, SocketFactory, StatsdError, StatsdOptions, StatsdReporter,
    StatsdResult, TagSet, TagsFlavor, Writer,
};
use std::io;
use std::net::SocketAddrV4;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Shared state of the recording sockets, inspected by the tests
#[derive(Default)]
pub struct Recorder {
    packets: Vec<(SocketAddrV4, String)>,
    sockets_opened: usize,
    sockets_closed: usize,
    failures_left: usize,
}

/// A socket that records every datagram instead of sending it
pub struct RecordingSocket {
    recorder: Arc<Mutex<Recorder>>,
}

impl Writer for RecordingSocket {
    fn write(&self, buf: &[u8], destination: SocketAddrV4) -> io::Result<usize> {
        let mut recorder = self.recorder.lock().unwrap();
        if recorder.failures_left > 0 {
            recorder.failures_left -= 1;
            return Err(io::Error::from(io::ErrorKind::ConnectionRefused));
        }
        let text = String::from_utf8(buf.to_vec()).unwrap();
        recorder.packets.push((destination, text));
        Ok(buf.len())
    }

    fn close(self) -> io::Result<()> {
        self.recorder.lock().unwrap().sockets_closed += 1;
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingFactory {
    recorder: Arc<Mutex<Recorder>>,
}

impl RecordingFactory {
    fn fail_next_sends(&self, count: usize) {
        self.recorder.lock().unwrap().failures_left = count;
    }

    fn packets(&self) -> Vec<(SocketAddrV4, String)> {
        self.recorder.lock().unwrap().packets.clone()
    }

    fn sockets_opened(&self) -> usize {
        self.recorder.lock().unwrap().sockets_opened
    }

    fn sockets_closed(&self) -> usize {
        self.recorder.lock().unwrap().sockets_closed
    }
}

impl SocketFactory for RecordingFactory {
    type Socket = RecordingSocket;

    fn open(&self) -> io::Result<RecordingSocket> {
        self.recorder.lock().unwrap().sockets_opened += 1;
        Ok(RecordingSocket {
            recorder: Arc::clone(&self.recorder),
        })
    }
}

/// A factory whose collector never resolves
pub struct UnresolvableFactory {
    inner: RecordingFactory,
}

impl SocketFactory for UnresolvableFactory {
    type Socket = RecordingSocket;

    fn open(&self) -> io::Result<RecordingSocket> {
        self.inner.open()
    }

    fn resolve(&self, endpoint: &Endpoint) -> StatsdResult<SocketAddrV4> {
        Err(StatsdError::Resolve {
            host: endpoint.host().to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        })
    }
}

fn fuzzing_snapshot(start: Instant) -> MetricsSnapshot {
    MetricsSnapshot {
        queue_cycle: 5,
        execs_done: 100_000,
        paths_total: 42,
        unique_crashes: 0,
        ..MetricsSnapshot::new(start)
    }
}

// ============================================================================
// Tests for custom sockets
// ============================================================================

#[test]
fn test_scenario_lines() {
    let factory = RecordingFactory::default();
    let mut reporter =
        StatsdReporter::with_factory(&StatsdOptions::default(), TagSet::empty(), factory.clone());

    let start = Instant::now();
    let sent = reporter
        .send_metrics_at(&fuzzing_snapshot(start), start + Duration::from_secs(10))
        .unwrap();

    let packets = factory.packets();
    assert_eq!(packets.len(), 1);
    let (destination, text) = &packets[0];
    assert_eq!(destination.to_string(), "127.0.0.1:8125");
    assert_eq!(text.len(), sent);

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 20);
    assert!(lines.contains(&"fuzzing.cycle_done:4|g"));
    assert!(lines.contains(&"fuzzing.execs_per_sec:10000.00|g"));
    assert!(lines.contains(&"fuzzing.paths_total:42|g"));
}

#[test]
fn test_tagged_lines() {
    let factory = RecordingFactory::default();
    let options = StatsdOptions {
        tags_flavor: TagsFlavor::Dogstatsd,
        ..StatsdOptions::default()
    };
    let tags = TagSet::for_flavor(options.tags_flavor, "libxml2", "4.00c");
    let mut reporter = StatsdReporter::with_factory(&options, tags, factory.clone());

    let start = Instant::now();
    reporter
        .send_metrics_at(&fuzzing_snapshot(start), start + Duration::from_secs(10))
        .unwrap();

    let (_, text) = &factory.packets()[0];
    assert!(text.contains("fuzzing.cycle_done:4|g|#banner:libxml2,afl_version:4.00c\n"));
    assert!(text
        .lines()
        .all(|line| line.ends_with("|#banner:libxml2,afl_version:4.00c")));
}

#[test]
fn test_send_failure_recovers_on_next_cycle() {
    let factory = RecordingFactory::default();
    let mut reporter =
        StatsdReporter::with_factory(&StatsdOptions::default(), TagSet::empty(), factory.clone());
    let snapshot = fuzzing_snapshot(Instant::now());

    reporter.send_metrics(&snapshot).unwrap();
    assert_eq!(factory.sockets_opened(), 1);

    factory.fail_next_sends(1);
    let err = reporter.send_metrics(&snapshot).unwrap_err();
    assert!(matches!(err, StatsdError::SendFailed(_)));
    assert_eq!(factory.sockets_closed(), 1);
    assert_eq!(factory.sockets_opened(), 1);

    reporter.send_metrics(&snapshot).unwrap();
    assert_eq!(factory.sockets_opened(), 2);
    assert_eq!(factory.packets().len(), 2);
}

#[test]
fn test_repeated_failures_never_fatal() {
    let factory = RecordingFactory::default();
    let mut reporter =
        StatsdReporter::with_factory(&StatsdOptions::default(), TagSet::empty(), factory.clone());
    let snapshot = fuzzing_snapshot(Instant::now());

    factory.fail_next_sends(5);
    for _ in 0..5 {
        let err = reporter.send_metrics(&snapshot).unwrap_err();
        assert!(!err.is_fatal());
    }
    // every failed cycle opened a fresh socket and closed it again
    assert_eq!(factory.sockets_opened(), 5);
    assert_eq!(factory.sockets_closed(), 5);

    reporter.send_metrics(&snapshot).unwrap();
    assert_eq!(factory.packets().len(), 1);
}

#[test]
fn test_unresolvable_host_is_fatal() {
    let inner = RecordingFactory::default();
    let options = StatsdOptions {
        host: Some("collector.invalid".to_string()),
        ..StatsdOptions::default()
    };
    let mut reporter = StatsdReporter::with_factory(
        &options,
        TagSet::empty(),
        UnresolvableFactory {
            inner: inner.clone(),
        },
    );

    let err = reporter
        .send_metrics(&fuzzing_snapshot(Instant::now()))
        .unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("collector.invalid"));
    assert!(inner.packets().is_empty());
    assert!(!reporter.is_connected());
}

#[test]
fn test_port_override_with_default_host() {
    let factory = RecordingFactory::default();
    let options = StatsdOptions::from_lookup(|key| (key == "AFL_STATSD_PORT").then(|| "9999".to_string()));
    let mut reporter = StatsdReporter::with_factory(&options, TagSet::empty(), factory.clone());

    reporter
        .send_metrics(&fuzzing_snapshot(Instant::now()))
        .unwrap();
    assert_eq!(
        reporter.destination().map(|addr| addr.to_string()),
        Some("127.0.0.1:9999".to_string())
    );
    assert_eq!(factory.packets()[0].0.port(), 9999);
}
