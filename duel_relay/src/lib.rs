// duel_relay: UDP match relay for 1v1 duels.
//
// The relay is a thin message broker: it registers the first two endpoints
// that probe it, assigns them roles 1 and 2, starts the match when both
// slots fill, and fans every in-match update out to both participants. It
// never runs game logic; hit detection, health, and timers all stay on the
// clients.
//
// Module overview:
// - `session.rs`:     Session registry: endpoint-to-role map, liveness,
//                     the reset that separates one match from the next.
// - `coordinator.rs`: Match state machine and per-role state snapshots,
//                     behind the one mutex the whole relay shares.
// - `dispatch.rs`:    Broadcast dispatcher over the shared UDP socket.
// - `server.rs`:      The receive loop, the per-match worker thread, and
//                     the `start_relay` lifecycle API.
// - `client.rs`:      Minimal UDP client used by embedding callers and the
//                     integration tests.
//
// Dependencies: `duel_protocol` (shared message types and codec).
//
// The relay can run as a standalone binary (`main.rs`) or be embedded in a
// host process via the library API (`start_relay`).

pub mod client;
pub mod coordinator;
pub mod dispatch;
pub mod server;
pub mod session;

pub use server::start_relay;
