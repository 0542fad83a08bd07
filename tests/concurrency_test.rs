//! Concurrency tests for the driver
//!
//! Verifies that concurrent callers never lose updates and that interruption while waiting
//! for the statistics lock surfaces as `Restart` without side effects.

use booga::driver::DriverFacade;
use booga::entropy::OsEntropy;
use booga::terminate::RecordingTerminator;
use booga::{BoogaError, Caller, Interrupt};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

fn driver() -> Arc<DriverFacade> {
    Arc::new(
        DriverFacade::builder()
            .entropy(OsEntropy)
            .terminator(RecordingTerminator::new())
            .poll_interval(Duration::from_millis(1))
            .build()
            .unwrap(),
    )
}

#[test]
fn test_concurrent_single_byte_reads() {
    const THREADS: usize = 8;
    const READS: usize = 1_000;

    let driver = driver();
    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let driver = Arc::clone(&driver);
            thread::spawn(move || {
                let caller = Caller::new(t as u32);
                let handle = driver.open_device(&caller, (t % 4) as u32).unwrap();
                for _ in 0..READS {
                    assert_eq!(driver.read_device(&caller, handle, 1).unwrap().len(), 1);
                }
                driver.close_device(handle);
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let stats = driver.snapshot(&Caller::new(0)).unwrap();
    assert_eq!(stats.total_reads(), (THREADS * READS) as u64);
    assert_eq!(stats.bytes_read(), (THREADS * READS) as u64);
    let opens: u64 = (0..4).map(|m| stats.open_count(m)).sum();
    assert_eq!(opens, THREADS as u64);
}

#[test]
fn test_concurrent_mixed_reads_and_writes() {
    const THREADS: usize = 6;
    const OPS: usize = 500;

    let driver = driver();
    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let driver = Arc::clone(&driver);
            thread::spawn(move || {
                let caller = Caller::new(t as u32);
                let handle = driver.open_device(&caller, (t % 3) as u32).unwrap();
                for _ in 0..OPS {
                    driver.read_device(&caller, handle, 3).unwrap();
                    driver.write_device(&caller, handle, &[0u8; 2]).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let stats = driver.snapshot(&Caller::new(0)).unwrap();
    assert_eq!(stats.total_reads(), (THREADS * OPS) as u64);
    assert_eq!(stats.bytes_read(), (THREADS * OPS * 3) as u64);
    assert_eq!(stats.bytes_written(), (THREADS * OPS * 2) as u64);
}

#[test]
fn test_interrupted_read_restarts_and_applies_nothing() {
    let driver = driver();
    let setup = Caller::new(1);
    let handle = driver.open_device(&setup, 0).unwrap();
    let before = driver.snapshot(&setup).unwrap();

    // Hold the statistics lock from another thread until told to let go.
    let (locked_tx, locked_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let holder = {
        let driver = Arc::clone(&driver);
        thread::spawn(move || {
            driver
                .stats()
                .with_lock(&Interrupt::new(), |_| {
                    locked_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                })
                .unwrap();
        })
    };
    locked_rx.recv().unwrap();

    let interrupt = Interrupt::new();
    let reader = {
        let driver = Arc::clone(&driver);
        let caller = Caller::with_interrupt(2, interrupt.clone());
        thread::spawn(move || driver.read_device(&caller, handle, 10))
    };
    thread::sleep(Duration::from_millis(20));
    interrupt.raise();

    let err = reader.join().unwrap().unwrap_err();
    assert_eq!(err, BoogaError::Restart);
    assert!(err.is_retryable());

    release_tx.send(()).unwrap();
    holder.join().unwrap();
    assert_eq!(driver.snapshot(&setup).unwrap(), before);

    // The caller retries once the interruption is acknowledged.
    interrupt.clear();
    let retry = Caller::with_interrupt(2, interrupt);
    assert_eq!(driver.read_device(&retry, handle, 10).unwrap().len(), 10);
    assert_eq!(driver.snapshot(&setup).unwrap().bytes_read(), 10);
}
