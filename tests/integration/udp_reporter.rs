use fuzz_statsd::{
    MetricsSnapshot, SharedStatsdReporter, StatsdError, StatsdOptions, StatsdReporter, TagsFlavor,
};
use std::net::UdpSocket;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

// ============================================================================
// Helper functions to reduce test code duplication
// ============================================================================

/// Binds a receiver on an ephemeral localhost port
fn bind_receiver() -> (UdpSocket, u16) {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("couldn't bind to address");
    socket
        .set_read_timeout(Some(Duration::from_secs(2)))
        .expect("set_read_timeout failed");
    let port = socket.local_addr().unwrap().port();
    (socket, port)
}

/// Collects all datagrams until the read timeout expires
fn spawn_udp_receiver(socket: UdpSocket) -> JoinHandle<Vec<String>> {
    std::thread::spawn(move || {
        let mut buf = [0; 10000];
        let mut received = Vec::<String>::new();

        while let Ok((number_of_bytes, _)) = socket.recv_from(&mut buf) {
            let filled_buf = &buf[..number_of_bytes];
            received.push(String::from_utf8(filled_buf.to_vec()).unwrap());
        }
        received
    })
}

fn options_for(port: u16, tags_flavor: TagsFlavor) -> StatsdOptions {
    StatsdOptions {
        port: Some(port),
        tags_flavor,
        ..StatsdOptions::default()
    }
}

// ============================================================================
// UDP tests
// ============================================================================

#[test]
fn test_one_datagram_per_send() {
    let (socket, port) = bind_receiver();
    let receiver = spawn_udp_receiver(socket);

    let mut reporter = StatsdReporter::new(&options_for(port, TagsFlavor::None), "run", "4.00c");
    let start = Instant::now();
    let mut snapshot = MetricsSnapshot::new(start);
    for cycle in 1..=3 {
        snapshot.queue_cycle = cycle;
        reporter.send_metrics(&snapshot).unwrap();
    }

    let received = receiver.join().unwrap();
    assert_eq!(received.len(), 3);
    for (i, packet) in received.iter().enumerate() {
        assert_eq!(packet.lines().count(), 20);
        assert!(packet.starts_with(&format!("fuzzing.cycle_done:{i}|g\n")));
        assert!(!packet.contains("|#"));
    }
}

#[test]
fn test_dogstatsd_over_udp() {
    let (socket, port) = bind_receiver();
    let receiver = spawn_udp_receiver(socket);

    let mut reporter =
        StatsdReporter::new(&options_for(port, TagsFlavor::Dogstatsd), "libpng", "4.00c");
    reporter
        .send_metrics(&MetricsSnapshot::new(Instant::now()))
        .unwrap();

    let received = receiver.join().unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0]
        .lines()
        .all(|line| line.ends_with("|g|#banner:libpng,afl_version:4.00c")));
}

#[test]
fn test_shared_reporter_across_threads() {
    let (socket, port) = bind_receiver();
    let receiver = spawn_udp_receiver(socket);

    let shared = Arc::new(SharedStatsdReporter::new(StatsdReporter::new(
        &options_for(port, TagsFlavor::None),
        "run",
        "4.00c",
    )));
    let start = Instant::now();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || {
                let mut sent = 0;
                for _ in 0..10 {
                    match shared.send_metrics(&MetricsSnapshot::new(start)) {
                        Ok(_) => sent += 1,
                        Err(StatsdError::SocketUnavailable) => {}
                        Err(err) => panic!("unexpected error: {err}"),
                    }
                }
                sent
            })
        })
        .collect();

    let sent: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert!(sent > 0);

    let received = receiver.join().unwrap();
    assert_eq!(received.len(), sent);
}
