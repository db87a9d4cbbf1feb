//! Bounded-wait dual-stream drain loop.
//!
//! Reading stdout to completion before touching stderr deadlocks as soon as
//! the child blocks on a full stderr pipe. This loop instead races a single
//! bounded read over both streams each iteration and drains whichever is
//! ready first, so neither pipe can stay full for longer than one poll
//! interval and a one-sided producer is drained at full speed, never paced
//! by its idle sibling.
//!
//! Termination needs both halves of one condition in the same iteration:
//! the child's exit status is available AND neither stream produced within
//! the poll window (a quiescent pass). Exit status alone is not enough — the
//! status can land slightly before the last buffered output flush — and
//! quiescence alone would hang forever on a child that stays silent without
//! exiting.

use std::process::ExitStatus;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout};
use tokio::time::timeout;
use tracing::{debug, trace};

const READ_CHUNK: usize = 8192;

/// Drains a child's stdout and stderr to completion.
///
/// `poll` bounds each read race and the pacing of exit-status checks; after
/// the child exits, the call returns within a small multiple of `poll`. The
/// total wait is unbounded while the child lives — callers own any
/// end-to-end deadline.
///
/// Requires the child to have been spawned with both streams piped.
pub async fn drain_child(
    mut child: Child,
    poll: std::time::Duration,
) -> std::io::Result<(Vec<u8>, Vec<u8>, ExitStatus)> {
    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();
    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();
    let mut out_chunk = [0u8; READ_CHUNK];
    let mut err_chunk = [0u8; READ_CHUNK];
    let mut exit_status: Option<ExitStatus> = None;

    loop {
        match next_event(&mut stdout, &mut stderr, &mut out_chunk, &mut err_chunk, poll).await? {
            Event::Stdout(n) => {
                stdout_buf.extend_from_slice(&out_chunk[..n]);
                trace!(stdout = stdout_buf.len(), "drained stdout chunk");
                continue;
            }
            Event::Stderr(n) => {
                stderr_buf.extend_from_slice(&err_chunk[..n]);
                trace!(stderr = stderr_buf.len(), "drained stderr chunk");
                continue;
            }
            // A stream closed; the other may still hold data, so this is
            // not a quiescent pass.
            Event::Eof => continue,
            Event::Idle => {}
        }

        // Quiescent pass: exit only if the child has also reported its
        // exit status by now.
        if exit_status.is_none() {
            exit_status = child.try_wait()?;
        }
        if let Some(status) = exit_status {
            debug!(
                ?status,
                stdout = stdout_buf.len(),
                stderr = stderr_buf.len(),
                "child exited and streams quiescent"
            );
            return Ok((stdout_buf, stderr_buf, status));
        }
    }
}

enum Event {
    Stdout(usize),
    Stderr(usize),
    Eof,
    Idle,
}

enum Raced {
    Out(std::io::Result<usize>),
    Err(std::io::Result<usize>),
}

// Races one bounded read over whichever streams are still open, so a ready
// stream never waits on an idle one. `read` is cancel safe: the losing
// branch and a timed-out race have consumed nothing.
async fn next_event(
    stdout: &mut Option<ChildStdout>,
    stderr: &mut Option<ChildStderr>,
    out_chunk: &mut [u8],
    err_chunk: &mut [u8],
    poll: std::time::Duration,
) -> std::io::Result<Event> {
    let race = async {
        match (stdout.as_mut(), stderr.as_mut()) {
            (Some(out), Some(err)) => tokio::select! {
                r = out.read(out_chunk) => Raced::Out(r),
                r = err.read(err_chunk) => Raced::Err(r),
            },
            (Some(out), None) => Raced::Out(out.read(out_chunk).await),
            (None, Some(err)) => Raced::Err(err.read(err_chunk).await),
            // Both streams closed; only the exit status remains, and the
            // timeout paces its checks.
            (None, None) => std::future::pending().await,
        }
    };
    match timeout(poll, race).await {
        Ok(Raced::Out(Ok(0))) => {
            *stdout = None;
            Ok(Event::Eof)
        }
        Ok(Raced::Err(Ok(0))) => {
            *stderr = None;
            Ok(Event::Eof)
        }
        Ok(Raced::Out(Ok(n))) => Ok(Event::Stdout(n)),
        Ok(Raced::Err(Ok(n))) => Ok(Event::Stderr(n)),
        Ok(Raced::Out(Err(e)) | Raced::Err(Err(e))) => Err(e),
        Err(_) => Ok(Event::Idle),
    }
}
