// UDP receive loop and relay lifecycle.
//
// Architecture: one receive-loop thread plus a per-match worker.
//
// - **Receive loop** (`run_relay`): the only caller of `recv_from`. Decodes
//   each datagram and dispatches it. While no match is active, registration
//   probes (`Join`, position probes) go to `MatchCoordinator::register` and
//   everything else is ignored. Once a match is active, every decoded
//   datagram is forwarded over an `mpsc` channel to the match worker.
// - **Match worker** (one per match): drains the channel and calls
//   `MatchCoordinator::handle_message`. It exits when it processes the
//   message that ends the match; the receive loop joins it before starting
//   the next registration cycle, so a worker's lifetime is exactly one
//   match.
//
// The two threads share the coordinator's single state mutex. The receive
// loop never holds it while blocked in `recv_from`, and neither thread
// holds it while sending; the coordinator snapshots endpoints first.
//
// Shutdown: `RelayHandle::stop` flips `keep_running`; the receive loop's
// short read timeout guarantees the flag is observed, and dropping the
// worker's sender ends the worker.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use duel_protocol::{ClientMessage, codec};
use log::{debug, error, info};

use crate::coordinator::{MatchCoordinator, MatchOutcome, RegisterOutcome};
use crate::dispatch::Dispatcher;

/// In-match event handed from the receive loop to the match worker.
struct MatchEvent {
    from: SocketAddr,
    message: ClientMessage,
}

/// How long the receive loop blocks before rechecking the stop flag.
const RECV_TIMEOUT: Duration = Duration::from_millis(100);

/// Handle returned by `start_relay` to control the running server.
pub struct RelayHandle {
    keep_running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RelayHandle {
    /// Signal the relay to stop and wait for it to shut down.
    pub fn stop(self) {
        self.keep_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread {
            let _ = handle.join();
        }
    }
}

/// Configuration for starting a relay server.
pub struct RelayConfig {
    pub port: u16,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self { port: 12345 }
    }
}

/// Start the relay on a background thread. Returns a handle for stopping it
/// and the actual bound address (useful when port 0 is used to let the OS
/// pick a free port).
pub fn start_relay(config: RelayConfig) -> io::Result<(RelayHandle, SocketAddr)> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, config.port))?;
    let addr = socket.local_addr()?;
    socket.set_read_timeout(Some(RECV_TIMEOUT))?;

    let keep_running = Arc::new(AtomicBool::new(true));
    let keep_running_clone = keep_running.clone();

    let thread = thread::spawn(move || {
        run_relay(socket, keep_running_clone);
    });

    info!("relay listening on {addr}");
    Ok((
        RelayHandle {
            keep_running,
            thread: Some(thread),
        },
        addr,
    ))
}

/// Main receive loop. Runs until `keep_running` is set to false or the
/// listening socket fails (the fatal transport case).
fn run_relay(socket: UdpSocket, keep_running: Arc<AtomicBool>) {
    let socket = Arc::new(socket);
    let coordinator = Arc::new(MatchCoordinator::new(Dispatcher::new(socket.clone())));
    let mut worker: Option<MatchWorker> = None;
    let mut buf = [0u8; codec::MAX_DATAGRAM_SIZE];

    while keep_running.load(Ordering::SeqCst) {
        let (len, peer) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(e) => {
                error!("receive failed on the listening socket: {e}");
                break;
            }
        };

        // Per-datagram errors end here; only the transport error above is fatal.
        let mut message = match codec::decode_client(&buf[..len]) {
            Ok(message) => message,
            Err(e) => {
                debug!("dropped datagram from {peer}: {e}");
                continue;
            }
        };

        if coordinator.is_active() {
            if let Some(active) = &worker {
                match active.tx.send(MatchEvent { from: peer, message }) {
                    Ok(()) => continue,
                    // The worker ended the match between our phase check and
                    // the send; recover the event for the paths below.
                    Err(mpsc::SendError(event)) => message = event.message,
                }
            }
        }

        // No active match: reap a finished worker before the next cycle.
        if let Some(finished) = worker.take() {
            finished.join();
        }

        match message {
            ClientMessage::Join | ClientMessage::Position { .. } => {
                if coordinator.register(peer) == RegisterOutcome::MatchStarted {
                    worker = Some(MatchWorker::spawn(coordinator.clone()));
                }
            }
            other => {
                debug!("ignored pre-match message from {peer}: {other:?}");
            }
        }
    }

    if let Some(active) = worker.take() {
        active.join();
    }
}

/// A match worker thread and the channel feeding it.
struct MatchWorker {
    tx: Sender<MatchEvent>,
    handle: thread::JoinHandle<()>,
}

impl MatchWorker {
    fn spawn(coordinator: Arc<MatchCoordinator>) -> Self {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            match_worker(rx, coordinator);
        });
        Self { tx, handle }
    }

    /// Close the channel and wait for the worker to finish.
    fn join(self) {
        drop(self.tx);
        let _ = self.handle.join();
    }
}

/// Per-match processing loop: runs until the match ends or the channel
/// closes (relay shutdown).
fn match_worker(rx: Receiver<MatchEvent>, coordinator: Arc<MatchCoordinator>) {
    while let Ok(event) = rx.recv() {
        if coordinator.handle_message(event.from, event.message) == MatchOutcome::Ended {
            break;
        }
    }
}
