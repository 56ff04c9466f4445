//! The bidirectional byte pump between one matched pair.
//!
//! Two independently spawned copy activities run concurrently, one per
//! direction. Whichever finishes first forces the other to finish too by
//! shutting down both underlying sockets for reading and writing, so a
//! blocked read returns an error promptly instead of waiting for its own
//! peer to hang up (spec.md §4.4 / §9).

use std::os::unix::io::{AsRawFd, RawFd};

use tokio::io;
use tokio::sync::mpsc;

use crate::registry::PendingHalf;

/// Copies bytes both ways between `upstream` and `downstream` until one side
/// closes or errors, then tears down the other side, then returns only once
/// both copy activities have exited.
///
/// `upstream` and `downstream` carry whatever bytes the header parser
/// already buffered ahead of the raw socket (spec.md's "pre-buffered bytes"
/// requirement); splitting them with [`tokio::io::split`] rather than
/// re-wrapping the raw streams preserves that prefix.
pub async fn run(upstream: PendingHalf, downstream: PendingHalf) {
    let upstream_fd = upstream.conn.get_ref().as_raw_fd();
    let downstream_fd = downstream.conn.get_ref().as_raw_fd();

    let (mut u_read, mut u_write) = io::split(upstream.conn);
    let (mut d_read, mut d_write) = io::split(downstream.conn);

    // Capacity 2: neither direction blocks posting its completion, even if
    // both finish before either is drained.
    let (done_tx, mut done_rx) = mpsc::channel::<&'static str>(2);

    let tx = done_tx.clone();
    let upstream_to_downstream = tokio::spawn(async move {
        let result = io::copy(&mut u_read, &mut d_write).await;
        let _ = tx.send(if result.is_ok() { "upstream-eof" } else { "transport-error" }).await;
    });
    let downstream_to_upstream = tokio::spawn(async move {
        let result = io::copy(&mut d_read, &mut u_write).await;
        let _ = done_tx
            .send(if result.is_ok() { "downstream-eof" } else { "transport-error" })
            .await;
    });

    // Wait for the first side to finish, then force the other closed.
    let reason = done_rx.recv().await.unwrap_or("transport-error");
    shutdown_both(upstream_fd);
    shutdown_both(downstream_fd);

    // Wait for the second side to notice and finish.
    let _ = done_rx.recv().await;

    // Only after both tasks have actually returned do we release the
    // connections; awaiting the handles (rather than just the channel)
    // guarantees no reference to either stream survives this call.
    let _ = tokio::join!(upstream_to_downstream, downstream_to_upstream);

    tracing::info!(reason, "pipe-closed");
}

/// Shuts a socket down for both reading and writing by its raw descriptor,
/// independent of whichever Rust-level handle currently owns it. This is
/// what makes the other direction's in-flight `read()` return promptly
/// instead of waiting on its own peer.
fn shutdown_both(fd: RawFd) {
    // SAFETY: `fd` was read from a live `UnixStream` moments earlier and is
    // still owned by this pair; `shutdown` on an already-shut-down socket is
    // a harmless no-op and never invalidates the descriptor.
    unsafe {
        libc::shutdown(fd, libc::SHUT_RDWR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::UnixStream;

    async fn pending(direction: Direction) -> (PendingHalf, UnixStream) {
        let (inner, peer) = UnixStream::pair().unwrap();
        (PendingHalf::new(BufReader::new(inner), direction), peer)
    }

    #[tokio::test]
    async fn forwards_bytes_both_ways_until_close() {
        let (up, mut up_peer) = pending(Direction::Upstream).await;
        let (down, mut down_peer) = pending(Direction::Downstream).await;

        let engine = tokio::spawn(run(up, down));

        up_peer.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        down_peer.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        down_peer.write_all(b"pong!").await.unwrap();
        let mut buf = [0u8; 5];
        up_peer.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"pong!");

        // Closing one peer must unblock the whole engine, including the
        // still-running opposite-direction copy.
        drop(up_peer);
        drop(down_peer);
        tokio::time::timeout(std::time::Duration::from_secs(5), engine)
            .await
            .expect("pipe engine must exit promptly after one side closes")
            .unwrap();
    }

    #[tokio::test]
    async fn one_sided_close_tears_down_the_other_direction() {
        let (up, up_peer) = pending(Direction::Upstream).await;
        let (down, mut down_peer) = pending(Direction::Downstream).await;

        let engine = tokio::spawn(run(up, down));

        // The downstream peer never closes on its own; only the upstream
        // side hanging up should be enough to tear the whole pair down.
        drop(up_peer);

        tokio::time::timeout(std::time::Duration::from_secs(5), engine)
            .await
            .expect("pipe engine must exit after only one side closes")
            .unwrap();

        // The downstream peer's read must now observe EOF/error too.
        let mut buf = [0u8; 1];
        let _ = down_peer.read(&mut buf).await;
    }
}
