//! Integration tests for the booga driver facade
//!
//! These tests drive `DriverFacade` the way a host dispatch layer would: open minors, read
//! and write through handles, close them, and check the shared statistics and report.

use booga::driver::DriverFacade;
use booga::entropy::{ScriptedEntropy, SeededEntropy};
use booga::terminate::RecordingTerminator;
use booga::{BoogaError, Caller, Response, TERMINATE_MINOR};
use std::sync::Arc;

fn driver_with(entropy: ScriptedEntropy) -> (DriverFacade, Arc<RecordingTerminator>) {
    let terminator = Arc::new(RecordingTerminator::new());
    let driver = DriverFacade::builder()
        .entropy(entropy)
        .terminator_arc(terminator.clone())
        .build()
        .unwrap();
    (driver, terminator)
}

// =============================================================================
// Open
// =============================================================================

#[test]
fn test_open_every_valid_minor() {
    let (driver, _) = driver_with(ScriptedEntropy::constant(0));
    let caller = Caller::new(100);

    for minor in 0..4u32 {
        let before = driver.snapshot(&caller).unwrap().open_count(minor as usize);
        driver.open_device(&caller, minor).unwrap();
        let after = driver.snapshot(&caller).unwrap().open_count(minor as usize);
        assert_eq!(after, before + 1, "minor {minor}");
    }
}

#[test]
fn test_open_invalid_minor_changes_nothing() {
    let (driver, _) = driver_with(ScriptedEntropy::constant(0));
    let caller = Caller::new(100);
    let before = driver.snapshot(&caller).unwrap();

    for minor in [4u32, 5, 15, 16, u32::MAX] {
        assert!(matches!(
            driver.open_device(&caller, minor),
            Err(BoogaError::NoSuchDevice { .. })
        ));
    }

    assert_eq!(driver.snapshot(&caller).unwrap(), before);
}

// =============================================================================
// Read
// =============================================================================

#[test]
fn test_read_lengths_are_exact() {
    let (driver, _) = driver_with(ScriptedEntropy::new([0, 1, 2, 3, 0x80, 0xff]));
    let caller = Caller::new(100);
    let handle = driver.open_device(&caller, 1).unwrap();

    let mut expected_bytes = 0u64;
    for (i, len) in [0usize, 1, 13, 14, 15, 16, 28, 100, 4096].into_iter().enumerate() {
        let before = driver.snapshot(&caller).unwrap();
        let bytes = driver.read_device(&caller, handle, len).unwrap();
        let after = driver.snapshot(&caller).unwrap();

        assert_eq!(bytes.len(), len);
        expected_bytes += len as u64;
        assert_eq!(after.bytes_read(), expected_bytes);
        assert_eq!(after.total_reads(), before.total_reads() + 1);
        assert_eq!(after.total_reads(), i as u64 + 1);

        let bumped: Vec<Response> = Response::ALL
            .into_iter()
            .filter(|r| after.response_count(*r) != before.response_count(*r))
            .collect();
        assert_eq!(bumped.len(), 1, "exactly one response counter moves per read");
        assert_eq!(after.response_count(bumped[0]), before.response_count(bumped[0]) + 1);
    }
}

#[test]
fn test_read_content_is_truncated_repetition() {
    for (byte, response) in [
        (0u8, Response::Booga),
        (1, Response::Googoo),
        (2, Response::Neka),
        (3, Response::Wooga),
    ] {
        let (driver, _) = driver_with(ScriptedEntropy::constant(byte));
        let caller = Caller::new(100);
        let handle = driver.open_device(&caller, 0).unwrap();
        let text = response.text().as_bytes();

        for len in [text.len() - 1, text.len(), text.len() + 1, 3 * text.len(), 3 * text.len() + 5] {
            let bytes = driver.read_device(&caller, handle, len).unwrap();
            let expected: Vec<u8> = text.iter().copied().cycle().take(len).collect();
            assert_eq!(bytes, expected, "{response:?} len {len}");
        }

        let stats = driver.snapshot(&caller).unwrap();
        assert_eq!(stats.response_count(response), 5);
    }
}

#[test]
fn test_seeded_entropy_is_reproducible() {
    let read_all = || {
        let driver = DriverFacade::builder()
            .entropy(SeededEntropy::new(9))
            .terminator(RecordingTerminator::new())
            .build()
            .unwrap();
        let caller = Caller::new(1);
        let handle = driver.open_device(&caller, 0).unwrap();
        (0..20)
            .map(|_| driver.read_device(&caller, handle, 20).unwrap())
            .collect::<Vec<_>>()
    };
    assert_eq!(read_all(), read_all());
}

// =============================================================================
// Write
// =============================================================================

#[test]
fn test_write_to_terminate_minor() {
    let (driver, terminator) = driver_with(ScriptedEntropy::constant(0));
    let caller = Caller::new(4242);
    let handle = driver.open_device(&caller, TERMINATE_MINOR as u32).unwrap();

    for i in 1..=3 {
        assert_eq!(driver.write_device(&caller, handle, &[1u8; 64]).unwrap(), 0);
        assert_eq!(terminator.count(), i, "one termination per write");
    }
    assert_eq!(driver.snapshot(&caller).unwrap().bytes_written(), 0);
    assert!(terminator.requested_pids().iter().all(|&pid| pid == 4242));
}

#[test]
fn test_write_to_other_minors_never_terminates() {
    let (driver, terminator) = driver_with(ScriptedEntropy::constant(0));
    let caller = Caller::new(1);

    let mut total = 0u64;
    for minor in 0..3u32 {
        let handle = driver.open_device(&caller, minor).unwrap();
        let len = 7 * (minor as usize + 1);
        assert_eq!(driver.write_device(&caller, handle, &vec![0u8; len]).unwrap(), len);
        total += len as u64;
        assert_eq!(driver.snapshot(&caller).unwrap().bytes_written(), total);
    }
    assert_eq!(terminator.count(), 0);
}

// =============================================================================
// Close and report
// =============================================================================

#[test]
fn test_double_close_is_noop() {
    let (driver, _) = driver_with(ScriptedEntropy::constant(0));
    let caller = Caller::new(1);
    let handle = driver.open_device(&caller, 2).unwrap();
    let before = driver.snapshot(&caller).unwrap();

    driver.close_device(handle);
    driver.close_device(handle);

    assert_eq!(driver.snapshot(&caller).unwrap(), before);
}

#[test]
fn test_report_after_mixed_sequence() {
    let (driver, _) = driver_with(ScriptedEntropy::new([0, 1, 2]));
    let caller = Caller::new(1);

    let first = driver.open_device(&caller, 0).unwrap();
    let second = driver.open_device(&caller, 0).unwrap();
    let third = driver.open_device(&caller, 1).unwrap();

    driver.read_device(&caller, first, 5).unwrap();
    driver.read_device(&caller, second, 20).unwrap();
    driver.read_device(&caller, third, 7).unwrap();
    driver.write_device(&caller, first, &[0u8; 10]).unwrap();

    let stats = driver.snapshot(&caller).unwrap();
    assert_eq!(stats.open_count(0), 2);
    assert_eq!(stats.open_count(1), 1);
    assert_eq!(stats.open_count(2), 0);
    assert_eq!(stats.open_count(3), 0);
    assert_eq!(stats.bytes_written(), 10);
    assert_eq!(stats.total_reads(), 3);
    assert_eq!(stats.bytes_read(), 32);

    let report = driver.get_report(&caller).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], "bytes read = 32");
    assert_eq!(lines[1], "bytes written = 10");
    assert_eq!(lines[2], "number of opens:");
    assert_eq!(lines[3], "\t/dev/booga0 = 2 times");
    assert_eq!(lines[4], "\t/dev/booga1 = 1 times");
    assert_eq!(lines[5], "\t/dev/booga2 = 0 times");
    assert_eq!(lines[6], "\t/dev/booga3 = 0 times");
    assert_eq!(lines[7], "strings output:");
    assert_eq!(lines[8], "\tbooga! booga! = 1 times");
    assert_eq!(lines[9], "\tgoogoo! gaagaa! = 1 times");
    assert_eq!(lines[10], "\tneka! maka! = 1 times");
    assert_eq!(lines[11], "\twooga! wooga! = 0 times");
}

#[test]
fn test_fresh_drivers_are_isolated() {
    let (a, _) = driver_with(ScriptedEntropy::constant(0));
    let (b, _) = driver_with(ScriptedEntropy::constant(0));
    let caller = Caller::new(1);

    a.open_device(&caller, 0).unwrap();
    assert_eq!(b.snapshot(&caller).unwrap().open_count(0), 0);
}
