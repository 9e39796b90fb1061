//! Player Registry
//!
//! Owns the roster. Records are kept in registration order so that
//! scoreboards and mention lists come out in a stable order.

use crate::player::Player;
use crate::types::PlayerName;

/// Result of a registration request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// A new record was created
    Registered,
    /// An existing, opted-out record was opted back in
    Reregistered,
    /// Nothing changed
    AlreadyRegistered,
}

/// Result of a deregistration request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeregisterOutcome {
    /// Registration flag cleared, data retained
    Deregistered,
    /// Second deregistration: the record was purged
    DataDeleted { removed: Player },
    /// No record exists for the name
    NotFound,
}

/// The set of player records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerRegistry {
    players: Vec<Player>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_players(players: Vec<Player>) -> Self {
        let mut registry = Self::new();
        for player in players {
            // First record wins if a snapshot ever carried duplicates
            if registry.find(player.name()).is_none() {
                registry.players.push(player);
            }
        }
        registry
    }

    /// Register a player, creating the record on first use
    pub fn register(&mut self, name: &PlayerName) -> RegisterOutcome {
        match self.find_mut(name) {
            Some(player) if player.is_registered() => RegisterOutcome::AlreadyRegistered,
            Some(player) => {
                player.set_registered(true);
                RegisterOutcome::Reregistered
            }
            None => {
                self.players.push(Player::new(name.clone()));
                RegisterOutcome::Registered
            }
        }
    }

    /// Opt a player out; a second call while opted out purges the record
    pub fn deregister(&mut self, name: &PlayerName) -> DeregisterOutcome {
        let Some(index) = self.players.iter().position(|p| p.name() == name) else {
            return DeregisterOutcome::NotFound;
        };

        if self.players[index].is_registered() {
            self.players[index].set_registered(false);
            DeregisterOutcome::Deregistered
        } else {
            let removed = self.players.remove(index);
            DeregisterOutcome::DataDeleted { removed }
        }
    }

    pub fn find(&self, name: &PlayerName) -> Option<&Player> {
        self.players.iter().find(|p| p.name() == name)
    }

    pub(crate) fn find_mut(&mut self, name: &PlayerName) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.name() == name)
    }

    /// All records, registered or not
    pub fn all(&self) -> &[Player] {
        &self.players
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    pub fn registered(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_registered())
    }

    /// Registered players that have not reported this round
    pub fn pending(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_pending())
    }

    pub fn registered_count(&self) -> usize {
        self.registered().count()
    }

    pub fn has_registered(&self) -> bool {
        self.players.iter().any(Player::is_registered)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> PlayerName {
        PlayerName::new(s)
    }

    #[test]
    fn test_register_twice_is_noop() {
        let mut registry = PlayerRegistry::new();
        assert_eq!(registry.register(&name("alice")), RegisterOutcome::Registered);
        assert_eq!(
            registry.register(&name("alice")),
            RegisterOutcome::AlreadyRegistered
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_deregister_then_deregister_purges() {
        let mut registry = PlayerRegistry::new();
        registry.register(&name("alice"));

        assert_eq!(
            registry.deregister(&name("alice")),
            DeregisterOutcome::Deregistered
        );
        assert_eq!(registry.len(), 1);
        assert!(!registry.find(&name("alice")).unwrap().is_registered());

        match registry.deregister(&name("alice")) {
            DeregisterOutcome::DataDeleted { removed } => {
                assert_eq!(removed.name().as_str(), "alice")
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(registry.is_empty());
        assert_eq!(
            registry.deregister(&name("alice")),
            DeregisterOutcome::NotFound
        );
    }

    #[test]
    fn test_reregister_keeps_data() {
        let mut registry = PlayerRegistry::new();
        registry.register(&name("alice"));
        registry.find_mut(&name("alice")).unwrap().record_win();
        registry.deregister(&name("alice"));

        assert_eq!(
            registry.register(&name("alice")),
            RegisterOutcome::Reregistered
        );
        assert_eq!(registry.find(&name("alice")).unwrap().win_count(), 1);
    }

    #[test]
    fn test_find_does_not_create() {
        let registry = PlayerRegistry::new();
        assert!(registry.find(&name("ghost")).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_pending_and_registered_views() {
        let mut registry = PlayerRegistry::new();
        registry.register(&name("alice"));
        registry.register(&name("bob"));
        registry.register(&name("carol"));
        registry.deregister(&name("carol"));
        registry.find_mut(&name("alice")).unwrap().record_score(3);

        let pending: Vec<_> = registry.pending().map(|p| p.name().to_string()).collect();
        assert_eq!(pending, vec!["bob"]);
        assert_eq!(registry.registered_count(), 2);
        assert!(registry.has_registered());
    }
}
