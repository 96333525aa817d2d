#![allow(dead_code)]

use std::sync::Arc;

use database::{GameStore, MemoryStore};
use engine::{Engine, EngineConfig, EngineError, Notification, RecordingNotifier, VoteReport};
use types::{Command, CommandKind, GameId, Game};

pub const MOD: &str = "Dreadpirate";

pub struct Harness {
    pub engine: Arc<Engine>,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub game: GameId,
    post: i64,
}

impl Harness {
    pub fn new(game: i64) -> Self {
        Self::with_config(game, EngineConfig::default())
    }

    pub fn with_config(game: i64, config: EngineConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let engine = Engine::new(store.clone(), notifier.clone(), Arc::new(config));
        Self {
            engine: Arc::new(engine),
            store,
            notifier,
            game: GameId::new(game),
            post: 0,
        }
    }

    pub fn next_post(&mut self) -> i64 {
        self.post += 1;
        self.post
    }

    pub async fn run(
        &mut self,
        actor: &str,
        kind: CommandKind,
        args: &[&str],
    ) -> Result<Vec<Notification>, EngineError> {
        let post = self.next_post();
        self.engine
            .handle(Command::new(self.game, post, actor, kind, args))
            .await
    }

    pub async fn ok(&mut self, actor: &str, kind: CommandKind, args: &[&str]) -> Vec<Notification> {
        match self.run(actor, kind, args).await {
            Ok(notifications) => notifications,
            Err(err) => panic!("{kind} by {actor} failed: {err}"),
        }
    }

    /// Prepares the game, joins `players` and starts day 1.
    pub async fn started(game: i64, players: &[&str]) -> Self {
        let mut harness = Self::new(game);
        harness.setup(players).await;
        harness
    }

    pub async fn setup(&mut self, players: &[&str]) {
        self.ok(MOD, CommandKind::Prepare, &[]).await;
        for player in players {
            self.ok(player, CommandKind::Join, &[]).await;
        }
        self.ok(MOD, CommandKind::Start, &[]).await;
    }

    pub async fn votes_today(&mut self) -> VoteReport {
        let notifications = self.ok(MOD, CommandKind::ListVotes, &[]).await;
        match notifications.into_iter().next() {
            Some(Notification::Votes { mut reports }) => reports.remove(0),
            other => panic!("Expected a vote report, got {other:?}"),
        }
    }

    pub fn votes_for(report: &VoteReport, target: &str) -> u32 {
        report
            .lines
            .iter()
            .find(|line| line.target == target)
            .map_or(0, |line| line.votes)
    }

    pub async fn game_state(&self) -> Game {
        let mut tx = self.store.begin().await.expect("Failed to begin");
        tx.game(self.game)
            .await
            .expect("Failed to read game")
            .expect("Game exists")
    }
}
