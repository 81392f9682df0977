//! Real OS signal delivery through an installed gate.
//!
//! Signals are process-wide, so everything lives in a single test.

#![cfg(unix)]

use std::time::Duration;

use intervald::action::ActionError;
use intervald::lifecycle::{CancelFlag, CancelSource, SignalGate, StopCause};
use intervald::scheduler::{IntervalRunner, TokioClock};
use intervald::{Interval, Reason};

fn raise(signo: i32) {
    // SAFETY: raise only delivers a signal to the calling thread; the gate
    // has replaced the default disposition for every signal we send.
    let rc = unsafe { libc::raise(signo) };
    assert_eq!(rc, 0, "raise({signo}) failed");
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(200)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_signals_drive_the_runner() {
    let flag = CancelFlag::new();
    let gate = SignalGate::install(flag.clone()).unwrap();

    // Unrecognized classes are logged and ignored.
    raise(libc::SIGUSR1);
    raise(libc::SIGHUP);
    settle().await;
    assert_eq!(gate.requested_reason(), None);

    let runner = IntervalRunner::new(TokioClock::new(), Interval::new(0.1).unwrap())
        .with_slice_bound(Duration::from_millis(50));
    let mut ticks = 0u64;
    let mut action = || -> Result<(), ActionError> {
        ticks += 1;
        Ok(())
    };
    let signaller = async {
        tokio::time::sleep(Duration::from_millis(350)).await;
        raise(libc::SIGQUIT);
    };

    let (termination, ()) = tokio::join!(runner.run(&mut action, &gate), signaller);

    assert_eq!(termination.cause, StopCause::Signal(Reason::Quit));
    assert_eq!(termination.exit_status().code(), libc::SIGQUIT);
    assert!(ticks >= 2, "only {ticks} ticks ran");

    // Later signals do not replace the recorded reason.
    raise(libc::SIGTERM);
    settle().await;
    assert_eq!(flag.reason(), Some(Reason::Quit));
}
