use std::sync::Arc;

use super::choreography::Intent::{Read, Write};
use super::choreography::Status::{Locked, Unlocked, Waiting};
use super::choreography::{Choreography, Intent};
use super::init_logger;
use crate::{Error, Lock};

fn choreograph(intents: &[Intent]) -> (Arc<Lock>, Choreography) {
    init_logger();
    let lock = Arc::new(Lock::new());
    let mut choreography = Choreography::new(&lock, intents);
    choreography.lock_in_order();
    (lock, choreography)
}

#[test]
fn cannot_unlock_while_another_writes() {
    let (lock, group) = choreograph(&[Write]);
    group.assert_statuses(&[Locked]);

    assert_eq!(lock.unlock(), Err(Error::NotHeld));
    assert!(lock.is_locked());
    group.assert_statuses(&[Locked]);
    group.finish();
}

#[test]
fn cannot_unlock_while_another_reads() {
    let (lock, group) = choreograph(&[Read]);
    group.assert_statuses(&[Locked]);

    assert_eq!(lock.unlock(), Err(Error::NotHeld));
    assert!(lock.is_shared());
    group.finish();
}

#[test]
fn writers_are_serialized() {
    let (_lock, mut group) = choreograph(&[Write, Write, Write]);
    group.assert_statuses(&[Locked, Waiting, Waiting]);

    group.complete(0);
    group.assert_statuses(&[Unlocked, Locked, Waiting]);

    group.complete(1);
    group.assert_statuses(&[Unlocked, Unlocked, Locked]);
    group.finish();
}

#[test]
fn writer_blocks_many_readers() {
    let mut intents = vec![Write];
    intents.extend([Read; 9]);
    let (lock, mut group) = choreograph(&intents);

    let mut expected = vec![Locked];
    expected.extend([Waiting; 9]);
    group.assert_statuses(&expected);

    group.complete(0);
    expected[0] = Unlocked;
    expected[1..].fill(Locked);
    group.assert_statuses(&expected);
    assert!(lock.is_shared());
    group.finish();
}

#[test]
fn writer_blocks_readers() {
    let (_lock, mut group) = choreograph(&[Write, Read, Read]);
    group.assert_statuses(&[Locked, Waiting, Waiting]);

    group.complete(0);
    group.assert_statuses(&[Unlocked, Locked, Locked]);
    group.finish();
}

#[test]
fn pending_writer_after_pending_reader() {
    let (_lock, mut group) = choreograph(&[Write, Read, Write]);
    group.assert_statuses(&[Locked, Waiting, Waiting]);

    group.complete(0);
    group.assert_statuses(&[Unlocked, Locked, Waiting]);

    group.complete(1);
    group.assert_statuses(&[Unlocked, Unlocked, Locked]);
    group.finish();
}

#[test]
fn pending_reader_queued_after_last_pending_writer() {
    let (_lock, mut group) = choreograph(&[Write, Read, Write, Read]);
    group.assert_statuses(&[Locked, Waiting, Waiting, Waiting]);

    group.complete(0);
    group.assert_statuses(&[Unlocked, Locked, Waiting, Waiting]);

    group.complete(1);
    group.assert_statuses(&[Unlocked, Unlocked, Locked, Waiting]);

    group.complete(2);
    group.assert_statuses(&[Unlocked, Unlocked, Unlocked, Locked]);
    group.finish();
}

#[test]
fn reader_blocks_writer() {
    let (_lock, mut group) = choreograph(&[Read, Write]);
    group.assert_statuses(&[Locked, Waiting]);

    group.complete(0);
    group.assert_statuses(&[Unlocked, Locked]);
    group.finish();
}

#[test]
fn readers_share() {
    let (_lock, mut group) = choreograph(&[Read, Read, Read]);
    group.assert_statuses(&[Locked, Locked, Locked]);

    group.complete(0);
    group.complete(2);
    group.assert_statuses(&[Unlocked, Locked, Unlocked]);
    group.finish();
}

#[test]
fn writer_waits_for_all_readers() {
    let (_lock, mut group) = choreograph(&[Read, Read, Write]);
    group.assert_statuses(&[Locked, Locked, Waiting]);

    group.complete(0);
    group.assert_statuses(&[Unlocked, Locked, Waiting]);

    group.complete(1);
    group.assert_statuses(&[Unlocked, Unlocked, Locked]);
    group.finish();
}

#[test]
fn pending_writer_blocks_new_reader() {
    let (_lock, mut group) = choreograph(&[Read, Write, Read]);
    group.assert_statuses(&[Locked, Waiting, Waiting]);

    group.complete(0);
    group.assert_statuses(&[Unlocked, Locked, Waiting]);

    group.complete(1);
    group.assert_statuses(&[Unlocked, Unlocked, Locked]);
    group.finish();
}

#[test]
fn writer_waits_for_whole_reader_batch() {
    let (_lock, mut group) = choreograph(&[Write, Read, Read, Write, Read]);
    group.assert_statuses(&[Locked, Waiting, Waiting, Waiting, Waiting]);

    group.complete(0);
    group.assert_statuses(&[Unlocked, Locked, Locked, Waiting, Waiting]);

    group.complete(2);
    group.assert_statuses(&[Unlocked, Locked, Unlocked, Waiting, Waiting]);

    group.complete(1);
    group.assert_statuses(&[Unlocked, Unlocked, Unlocked, Locked, Waiting]);

    group.complete(3);
    group.assert_statuses(&[Unlocked, Unlocked, Unlocked, Unlocked, Locked]);
    group.finish();
}

#[test]
fn reentrant_write_keeps_exclusivity() {
    init_logger();
    let lock = Arc::new(Lock::new());
    assert!(lock.lock_write().is_ok());

    let mut group = Choreography::new(&lock, &[Read]);
    group.lock_in_order();
    group.assert_statuses(&[Waiting]);

    assert!(lock.lock_write().is_ok());
    group.assert_statuses(&[Waiting]);

    assert!(lock.unlock().is_ok());
    group.assert_statuses(&[Waiting]);

    assert!(lock.unlock().is_ok());
    group.assert_statuses(&[Locked]);
    group.finish();
}

#[test]
fn read_under_write_keeps_exclusivity() {
    init_logger();
    let lock = Arc::new(Lock::new());
    assert!(lock.lock_write().is_ok());
    lock.lock_read();
    lock.lock_read();

    let mut group = Choreography::new(&lock, &[Read]);
    group.lock_in_order();
    group.assert_statuses(&[Waiting]);

    for _ in 0..2 {
        assert!(lock.unlock().is_ok());
        group.assert_statuses(&[Waiting]);
    }

    assert!(lock.unlock().is_ok());
    group.assert_statuses(&[Locked]);
    group.finish();
}

#[test]
fn read_under_write_with_others_queued() {
    init_logger();
    let lock = Arc::new(Lock::new());
    assert!(lock.lock_write().is_ok());

    let mut group = Choreography::new(&lock, &[Read, Write]);
    group.lock_in_order();
    group.assert_statuses(&[Waiting, Waiting]);

    lock.lock_read();
    assert!(lock.is_locked());
    assert!(!lock.is_shared());
    group.assert_statuses(&[Waiting, Waiting]);

    assert!(lock.unlock().is_ok());
    group.assert_statuses(&[Waiting, Waiting]);
    assert!(lock.unlock().is_ok());
    group.assert_statuses(&[Locked, Waiting]);
    group.finish();
}

#[test]
fn reentrant_read_keeps_lock() {
    init_logger();
    let lock = Arc::new(Lock::new());
    lock.lock_read();

    let mut group = Choreography::new(&lock, &[Write]);
    group.lock_in_order();
    group.assert_statuses(&[Waiting]);

    // The pending writer does not block a thread that already reads.
    lock.lock_read();
    group.assert_statuses(&[Waiting]);

    assert!(lock.unlock().is_ok());
    group.assert_statuses(&[Waiting]);

    assert!(lock.unlock().is_ok());
    group.assert_statuses(&[Locked]);
    group.finish();
}

#[test]
fn reentrant_read_allows_other_readers() {
    init_logger();
    let lock = Arc::new(Lock::new());
    lock.lock_read();
    lock.lock_read();

    let mut group = Choreography::new(&lock, &[Read]);
    group.lock_in_order();
    group.assert_statuses(&[Locked]);

    assert!(lock.unlock().is_ok());
    assert!(lock.unlock().is_ok());
    group.finish();
}

#[test]
fn reenter_read_while_others_read() {
    init_logger();
    let lock = Arc::new(Lock::new());
    lock.lock_read();

    let mut group = Choreography::new(&lock, &[Read]);
    group.lock_in_order();
    group.assert_statuses(&[Locked]);

    lock.lock_read();
    assert!(lock.unlock().is_ok());
    assert!(lock.unlock().is_ok());
    assert_eq!(lock.unlock(), Err(Error::NotHeld));
    group.assert_statuses(&[Locked]);
    group.finish();
}
