// Session registry for the relay.
//
// Tracks the (at most two) endpoints participating in the current match and
// the role each one holds. The registry is a plain data structure: no I/O,
// no locking, no logging. The coordinator owns one behind its state mutex
// and is the only caller of the mutating methods. Every failure is a
// returned value; nothing here panics or throws for control flow.
//
// Role assignment: the first unseen endpoint gets role 1, the second role 2.
// Sessions are only ever removed all at once, via `reset()`, which the
// coordinator invokes exactly at match end, so the next registration cycle
// starts again at role 1.

use std::net::SocketAddr;

use duel_protocol::PlayerRole;

/// Most participants a match can hold.
pub const MAX_SESSIONS: usize = 2;

/// One registered participant. The endpoint is the durable identity for the
/// lifetime of the match; `alive` flips to false on a death notification and
/// stays false until the registry is reset.
#[derive(Clone, Debug)]
pub struct ClientSession {
    pub endpoint: SocketAddr,
    pub role: PlayerRole,
    pub alive: bool,
}

/// Value-returned outcome of a registration attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registration {
    /// Unseen endpoint, slot available: a fresh role was assigned.
    New(PlayerRole),
    /// The endpoint already holds this role; nothing changed.
    Existing(PlayerRole),
    /// Both slots are taken by other endpoints; the caller must not reply.
    Rejected,
}

/// The session set for the current match.
#[derive(Debug, Default)]
pub struct Registry {
    sessions: Vec<ClientSession>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint. Idempotent for a previously-seen endpoint;
    /// assigns the next free role only while the registry is not full.
    pub fn register(&mut self, endpoint: SocketAddr) -> Registration {
        if let Some(session) = self.sessions.iter().find(|s| s.endpoint == endpoint) {
            return Registration::Existing(session.role);
        }
        let role = match self.sessions.len() {
            0 => PlayerRole::One,
            1 => PlayerRole::Two,
            _ => return Registration::Rejected,
        };
        self.sessions.push(ClientSession {
            endpoint,
            role,
            alive: true,
        });
        Registration::New(role)
    }

    pub fn is_full(&self) -> bool {
        self.sessions.len() == MAX_SESSIONS
    }

    /// Snapshot of all registered endpoints, in role order. The caller may
    /// not assume liveness beyond the snapshot instant.
    pub fn endpoints(&self) -> Vec<SocketAddr> {
        self.sessions.iter().map(|s| s.endpoint).collect()
    }

    /// The role held by an endpoint, if it is registered.
    pub fn role_of(&self, endpoint: SocketAddr) -> Option<PlayerRole> {
        self.sessions
            .iter()
            .find(|s| s.endpoint == endpoint)
            .map(|s| s.role)
    }

    /// Whether a role is registered and still alive.
    pub fn is_live(&self, role: PlayerRole) -> bool {
        self.sessions.iter().any(|s| s.role == role && s.alive)
    }

    pub fn mark_dead(&mut self, role: PlayerRole) {
        if let Some(session) = self.sessions.iter_mut().find(|s| s.role == role) {
            session.alive = false;
        }
    }

    /// Clear all sessions. Coordinator-only, at match end.
    pub fn reset(&mut self) {
        self.sessions.clear();
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    #[test]
    fn assigns_roles_in_order() {
        let mut registry = Registry::new();
        assert_eq!(registry.register(endpoint(1000)), Registration::New(PlayerRole::One));
        assert!(!registry.is_full());
        assert_eq!(registry.register(endpoint(1001)), Registration::New(PlayerRole::Two));
        assert!(registry.is_full());
    }

    #[test]
    fn register_is_idempotent_per_endpoint() {
        let mut registry = Registry::new();
        registry.register(endpoint(1000));
        assert_eq!(
            registry.register(endpoint(1000)),
            Registration::Existing(PlayerRole::One)
        );
        assert_eq!(registry.len(), 1);

        registry.register(endpoint(1001));
        assert_eq!(
            registry.register(endpoint(1000)),
            Registration::Existing(PlayerRole::One)
        );
        assert_eq!(
            registry.register(endpoint(1001)),
            Registration::Existing(PlayerRole::Two)
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn third_endpoint_rejected_while_first_two_remain() {
        let mut registry = Registry::new();
        registry.register(endpoint(1000));
        registry.register(endpoint(1001));
        assert_eq!(registry.register(endpoint(1002)), Registration::Rejected);
        // The rejection changed nothing.
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.role_of(endpoint(1002)), None);
    }

    #[test]
    fn endpoints_snapshot_in_role_order() {
        let mut registry = Registry::new();
        registry.register(endpoint(1001));
        registry.register(endpoint(1000));
        assert_eq!(registry.endpoints(), vec![endpoint(1001), endpoint(1000)]);
    }

    #[test]
    fn mark_dead_clears_liveness_but_keeps_the_session() {
        let mut registry = Registry::new();
        registry.register(endpoint(1000));
        assert!(registry.is_live(PlayerRole::One));

        registry.mark_dead(PlayerRole::One);
        assert!(!registry.is_live(PlayerRole::One));
        assert_eq!(registry.role_of(endpoint(1000)), Some(PlayerRole::One));
    }

    #[test]
    fn reset_starts_a_fresh_role_cycle() {
        let mut registry = Registry::new();
        registry.register(endpoint(1000));
        registry.register(endpoint(1001));
        registry.reset();

        assert!(registry.is_empty());
        // A previously-seen endpoint is a stranger after reset.
        assert_eq!(registry.register(endpoint(1001)), Registration::New(PlayerRole::One));
    }

    #[test]
    fn unknown_role_queries_are_value_returned() {
        let registry = Registry::new();
        assert!(!registry.is_live(PlayerRole::Two));
        assert_eq!(registry.role_of(endpoint(1000)), None);
    }
}
