//! Per-game membership as seen by one command.

use std::collections::HashMap;

use database::StoreTransaction;
use types::{canonical_name, GameId, PlayerStatus, RosterEntry, RosterMember};
use uuid::Uuid;

use crate::error::EngineResult;

/// A snapshot of a game's roster taken inside the command's transaction.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    members: Vec<RosterMember>,
}

impl Roster {
    pub fn new(members: Vec<RosterMember>) -> Self {
        Self { members }
    }

    pub async fn load(tx: &mut dyn StoreTransaction, game: GameId) -> EngineResult<Self> {
        Ok(Self::new(tx.roster(game, None).await?))
    }

    /// Looks a member up by a raw mention such as `@Bob`.
    pub fn find(&self, name: &str) -> Option<&RosterMember> {
        let name = canonical_name(name);
        self.members.iter().find(|m| m.name() == name)
    }

    pub fn member(&self, player: Uuid) -> Option<&RosterMember> {
        self.members.iter().find(|m| m.player.id == player)
    }

    pub fn members(&self) -> &[RosterMember] {
        &self.members
    }

    pub fn living(&self) -> impl Iterator<Item = &RosterMember> {
        self.with_status(PlayerStatus::Alive)
    }

    pub fn living_count(&self) -> usize {
        self.living().count()
    }

    pub fn dead(&self) -> impl Iterator<Item = &RosterMember> {
        self.with_status(PlayerStatus::Dead)
    }

    pub fn mods(&self) -> impl Iterator<Item = &RosterMember> {
        self.with_status(PlayerStatus::Mod)
    }

    pub fn placeholder(&self, status: PlayerStatus) -> Option<&RosterMember> {
        self.with_status(status).next()
    }

    pub fn is_placeholder(&self, player: Uuid) -> bool {
        self.member(player)
            .is_some_and(|m| m.entry.status.is_placeholder())
    }

    pub fn is_mod(&self, name: &str) -> bool {
        self.find(name).is_some_and(|m| m.entry.is_mod())
    }

    /// The roster as it stood at the start of `day`: players who died on that
    /// day or later are alive again. `deaths` maps each dead player to the day
    /// they died.
    pub fn as_of(&self, day: u32, deaths: &HashMap<Uuid, u32>) -> Roster {
        let mut members = self.members.clone();
        for member in &mut members {
            let died = deaths.get(&member.player.id);
            if member.entry.status == PlayerStatus::Dead && died.is_some_and(|d| *d >= day) {
                member.entry.status = PlayerStatus::Alive;
            }
        }
        Roster::new(members)
    }

    fn with_status(&self, status: PlayerStatus) -> impl Iterator<Item = &RosterMember> {
        self.members.iter().filter(move |m| m.entry.status == status)
    }

    /// Keeps the snapshot in step with a write made through the transaction.
    pub(crate) fn replace(&mut self, entry: RosterEntry) {
        if let Some(member) = self
            .members
            .iter_mut()
            .find(|m| m.player.id == entry.player_id)
        {
            member.entry = entry;
        }
    }
}

/// Puts `display_name` on the roster with `status`, creating the player on first mention.
pub async fn add_player(
    tx: &mut dyn StoreTransaction,
    game: GameId,
    display_name: &str,
    status: PlayerStatus,
) -> EngineResult<RosterMember> {
    let player = tx.find_or_create_player(display_name).await?;
    let entry = tx
        .find_or_create_roster_entry(game, player.id, status)
        .await?;
    Ok(RosterMember { entry, player })
}

/// Sets a member's status and writes it back.
pub async fn set_status(
    tx: &mut dyn StoreTransaction,
    roster: &mut Roster,
    player: Uuid,
    status: PlayerStatus,
) -> EngineResult<()> {
    if let Some(member) = roster.member(player) {
        let mut entry = member.entry.clone();
        entry.status = status;
        tx.update_roster_entry(&entry).await?;
        roster.replace(entry);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::Player;

    fn member(name: &str, status: PlayerStatus) -> RosterMember {
        let player = Player::new(name);
        RosterMember {
            entry: RosterEntry::new(GameId::new(1), player.id, status),
            player,
        }
    }

    #[test]
    fn test_living_excludes_placeholders_and_mods() {
        let roster = Roster::new(vec![
            member("Mod", PlayerStatus::Mod),
            member("unvote", PlayerStatus::UnvotePlaceholder),
            member("nolynch", PlayerStatus::NolynchPlaceholder),
            member("Alice", PlayerStatus::Alive),
            member("Bob", PlayerStatus::Dead),
        ]);

        assert_eq!(roster.living_count(), 1);
        assert_eq!(roster.dead().count(), 1);
        assert!(roster.is_mod("@mod"));
        assert!(!roster.is_mod("alice"));
    }

    #[test]
    fn test_find_accepts_mentions() {
        let roster = Roster::new(vec![member("Alice", PlayerStatus::Alive)]);
        let alice = roster.find("@ALICE!").expect("alice is on the roster");
        assert_eq!(alice.player.display_name, "Alice");
        assert!(roster.find("bob").is_none());
    }

    #[test]
    fn test_as_of_revives_later_deaths() {
        let alice = member("Alice", PlayerStatus::Alive);
        let bob = member("Bob", PlayerStatus::Dead);
        let carol = member("Carol", PlayerStatus::Dead);
        let deaths = HashMap::from([(bob.player.id, 1), (carol.player.id, 2)]);
        let roster = Roster::new(vec![alice, bob, carol]);

        assert_eq!(roster.as_of(1, &deaths).living_count(), 3);
        assert_eq!(roster.as_of(2, &deaths).living_count(), 2);
        assert_eq!(roster.as_of(3, &deaths).living_count(), 1);
        assert_eq!(roster.living_count(), 1);
    }
}
