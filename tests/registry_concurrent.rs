//! Many threads race to register: exactly one selection is installed whole.

mod common;

use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use common::{touch_all_slots, Tagged};
use rest_client::metrics::{self, RegisterMetrics};

const THREADS: usize = 16;

#[test]
fn test_concurrent_registration_installs_one_selection() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|tag| {
            let log = log.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let t = Tagged { tag, log };
                let selection = RegisterMetrics::default()
                    .with_request_latency(t.clone())
                    .with_request_result(t.clone())
                    .with_request_throttle(t.clone())
                    .with_request_throttle_latency(t);
                barrier.wait();
                metrics::register(selection);
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    assert!(metrics::is_registered());

    touch_all_slots();
    let seen = log.lock().unwrap().clone();
    assert_eq!(seen.len(), 4);
    let winner = seen[0].0;
    assert!(winner < THREADS);
    assert_eq!(
        seen,
        vec![
            (winner, "latency"),
            (winner, "result"),
            (winner, "throttle"),
            (winner, "throttle_latency"),
        ]
    );

    // Stable afterwards, even with another round of registrations.
    log.lock().unwrap().clear();
    let late = Tagged {
        tag: THREADS + 1,
        log: log.clone(),
    };
    metrics::register(RegisterMetrics::default().with_request_latency(late));
    touch_all_slots();
    assert!(log.lock().unwrap().iter().all(|(tag, _)| *tag == winner));
}
