// Broadcast dispatcher: fans a datagram out to every registered endpoint.
//
// Wraps the shared UDP socket. Sends to each endpoint independently: a
// failed send is logged at warn and never prevents the remaining sends or
// aborts the datagram being processed (the remote peer may simply be gone).
// Callers must not hold the coordinator's state lock while calling in here:
// they snapshot the endpoint list first, release, then send.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;

use log::warn;

/// Sends relay frames; shared by the receive loop and the match worker.
#[derive(Clone)]
pub struct Dispatcher {
    socket: Arc<UdpSocket>,
}

impl Dispatcher {
    pub fn new(socket: Arc<UdpSocket>) -> Self {
        Self { socket }
    }

    /// Send one frame to one endpoint. Failures are logged and swallowed.
    pub fn send_to(&self, payload: &[u8], endpoint: SocketAddr) {
        if let Err(e) = self.socket.send_to(payload, endpoint) {
            warn!("send to {endpoint} failed: {e}");
        }
    }

    /// Send one frame to every endpoint, independently. Returns the
    /// per-endpoint result; failures are logged here and otherwise ignored
    /// by every production caller.
    pub fn broadcast(
        &self,
        payload: &[u8],
        endpoints: &[SocketAddr],
    ) -> Vec<(SocketAddr, io::Result<usize>)> {
        endpoints
            .iter()
            .map(|&endpoint| {
                let result = self.socket.send_to(payload, endpoint);
                if let Err(e) = &result {
                    warn!("broadcast to {endpoint} failed: {e}");
                }
                (endpoint, result)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn bind() -> UdpSocket {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();
        socket
    }

    fn recv_text(socket: &UdpSocket) -> String {
        let mut buf = [0u8; 1024];
        let (len, _) = socket.recv_from(&mut buf).unwrap();
        String::from_utf8(buf[..len].to_vec()).unwrap()
    }

    #[test]
    fn broadcast_reaches_every_endpoint() {
        let dispatcher = Dispatcher::new(Arc::new(bind()));
        let a = bind();
        let b = bind();

        let results = dispatcher.broadcast(
            b"StartGame",
            &[a.local_addr().unwrap(), b.local_addr().unwrap()],
        );

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, r)| r.is_ok()));
        assert_eq!(recv_text(&a), "StartGame");
        assert_eq!(recv_text(&b), "StartGame");
    }

    #[test]
    fn one_failed_send_does_not_stop_the_rest() {
        let dispatcher = Dispatcher::new(Arc::new(bind()));
        let b = bind();
        // An IPv6 destination from an IPv4 socket fails at send time.
        let unreachable: SocketAddr = "[::1]:9".parse().unwrap();

        let results = dispatcher.broadcast(b"EndGame", &[unreachable, b.local_addr().unwrap()]);

        assert!(results[0].1.is_err());
        assert!(results[1].1.is_ok());
        assert_eq!(recv_text(&b), "EndGame");
    }
}
