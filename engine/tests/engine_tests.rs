mod common;

use std::sync::Arc;

use common::{Harness, MOD};
use database::{DatabaseConfig, SqliteStore};
use engine::{
    Engine, EngineConfig, EngineError, GameSeed, Missing, Notification, RecordingNotifier,
    Rejection,
};
use types::{Command, CommandKind, GameId};

#[tokio::test]
async fn test_successful_commands_are_emitted() {
    let mut h = Harness::new(1234);
    h.ok(MOD, CommandKind::Prepare, &["Mafia", "Five"]).await;
    h.ok("Alice", CommandKind::Join, &[]).await;
    h.ok("Bob", CommandKind::Join, &[]).await;
    h.ok("Carol", CommandKind::Join, &[]).await;
    h.ok(MOD, CommandKind::Start, &[]).await;

    let emitted = h.notifier.for_game(h.game);
    assert_eq!(
        emitted,
        vec![
            Notification::GameCreated {
                name: "Mafia Five".to_string(),
            },
            Notification::Joined {
                player: "Alice".to_string(),
            },
            Notification::Joined {
                player: "Bob".to_string(),
            },
            Notification::Joined {
                player: "Carol".to_string(),
            },
            Notification::GameStarted { day: 1 },
            Notification::DayStarted {
                day: 1,
                living: 3,
                to_lynch: 2,
            },
        ]
    );
}

#[tokio::test]
async fn test_rejection_rolls_back_partial_writes() {
    let mut h = Harness::started(1, &["Alice", "Bob", "Carol", "Dave", "Eve"]).await;
    let vote = Command::new(h.game, 100, "Alice", CommandKind::Vote, &["Bob"]);
    h.engine.handle(vote.clone()).await.expect("First vote counts");

    // The replay withdraws the first vote before colliding with it.
    let replay = h.engine.handle(vote).await;
    assert!(matches!(replay, Err(EngineError::Conflict(_))));

    let last = h.notifier.for_game(h.game).pop();
    assert!(matches!(
        last,
        Some(Notification::Rejected { ref command, .. }) if command == "vote"
    ));

    let report = h.votes_today().await;
    assert_eq!(Harness::votes_for(&report, "Bob"), 1);
    assert_eq!(report.lines[0].voters[0].retracted_in, None);
}

#[tokio::test]
async fn test_rejections_name_their_reason() {
    let mut h = Harness::started(2, &["Alice", "Bob"]).await;

    let missing = h.run("Alice", CommandKind::Vote, &[]).await;
    assert!(matches!(
        missing,
        Err(EngineError::Validation(Rejection::MissingArgument("target")))
    ));

    let emitted = h.notifier.for_game(h.game);
    match emitted.last() {
        Some(Notification::Rejected { command, reason }) => {
            assert_eq!(command, "vote");
            assert!(reason.contains("target"));
        }
        other => panic!("Expected a rejection, got {other:?}"),
    }

    let nowhere = h
        .engine
        .handle(Command::new(GameId::new(77), 1, "Alice", CommandKind::Vote, &["Bob"]))
        .await;
    assert!(matches!(
        nowhere,
        Err(EngineError::NotFound(Missing::Game(id))) if id == GameId::new(77)
    ));
}

#[tokio::test]
async fn test_seed_games_is_idempotent() {
    let config = EngineConfig {
        games: vec![GameSeed {
            id: GameId::new(42),
            name: Some("Seeded".to_string()),
            mods: vec![MOD.to_string()],
            players: vec!["Alice".to_string(), "Bob".to_string(), "Carol".to_string()],
        }],
        ..EngineConfig::default()
    };
    let mut h = Harness::with_config(42, config);

    assert_eq!(h.engine.seed_games().await.expect("Failed to seed"), 1);
    assert_eq!(h.engine.seed_games().await.expect("Failed to reseed"), 0);

    let started = h.ok(MOD, CommandKind::Start, &[]).await;
    assert_eq!(
        started[1],
        Notification::DayStarted {
            day: 1,
            living: 3,
            to_lynch: 2,
        }
    );

    let voted = h.ok("Alice", CommandKind::Vote, &["Bob"]).await;
    assert_eq!(voted.len(), 1);
    h.ok("Alice", CommandKind::Vote, &["unvote"]).await;
    assert_eq!(Harness::votes_for(&h.votes_today().await, "Bob"), 0);
}

const NINE: [&str; 9] = [
    "Ann", "Ben", "Cat", "Dan", "Eli", "Fay", "Gus", "Hal", "Ivy",
];

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_games_stay_consistent() {
    let store = Arc::new(database::MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let engine = Arc::new(Engine::new(
        store,
        notifier.clone(),
        Arc::new(EngineConfig::default()),
    ));

    let games = [GameId::new(1), GameId::new(2)];
    for game in games {
        let mut post = 0;
        let mut next = |actor: &str, kind: CommandKind| {
            post += 1;
            Command::new(game, post, actor, kind, &[])
        };
        engine.handle(next(MOD, CommandKind::Prepare)).await.expect("prepare");
        for player in NINE {
            engine.handle(next(player, CommandKind::Join)).await.expect("join");
        }
        engine.handle(next(MOD, CommandKind::Start)).await.expect("start");
    }

    let mut handles = Vec::new();
    for game in games {
        for (i, voter) in NINE[..4].iter().enumerate() {
            let engine = engine.clone();
            let command = Command::new(game, 100 + i as i64, voter, CommandKind::Vote, &["Ivy"]);
            handles.push(tokio::spawn(async move { engine.handle(command).await }));
        }
    }
    for handle in handles {
        handle
            .await
            .expect("Task panicked")
            .expect("Vote rejected");
    }

    for game in games {
        let listed = engine
            .handle(Command::new(game, 200, MOD, CommandKind::ListVotes, &[]))
            .await
            .expect("list-votes");
        match &listed[0] {
            Notification::Votes { reports } => {
                assert_eq!(Harness::votes_for(&reports[0], "Ivy"), 4);
                assert_eq!(reports[0].not_voting.len(), 5);
            }
            other => panic!("Expected vote reports, got {other:?}"),
        }
    }
    assert!(!notifier
        .emitted()
        .iter()
        .any(|(_, _, n)| matches!(n, Notification::Lynched { .. })));
}

#[tokio::test]
async fn test_engine_over_sqlite() {
    let pool = DatabaseConfig::in_memory()
        .create_pool()
        .await
        .expect("Failed to create pool");
    let store = SqliteStore::new(pool);
    store.run_migrations().await.expect("Failed to migrate");
    let notifier = Arc::new(RecordingNotifier::new());
    let engine = Engine::new(
        Arc::new(store),
        notifier.clone(),
        Arc::new(EngineConfig::default()),
    );

    let game = GameId::new(5150);
    let script: [(&str, CommandKind, &[&str]); 9] = [
        (MOD, CommandKind::Prepare, &[]),
        ("Alice", CommandKind::Join, &[]),
        ("Bob", CommandKind::Join, &[]),
        ("Carol", CommandKind::Join, &[]),
        ("Dave", CommandKind::Join, &[]),
        (MOD, CommandKind::Start, &[]),
        ("Alice", CommandKind::Vote, &["Dave"]),
        ("Bob", CommandKind::Vote, &["@dave"]),
        ("Carol", CommandKind::Vote, &["DAVE"]),
    ];
    for (post, (actor, kind, args)) in script.into_iter().enumerate() {
        engine
            .handle(Command::new(game, post as i64 + 1, actor, kind, args))
            .await
            .unwrap_or_else(|err| panic!("{kind} by {actor} failed: {err}"));
    }

    assert!(notifier.for_game(game).contains(&Notification::Lynched {
        target: "Dave".to_string(),
        day: 1,
    }));

    let late = engine
        .handle(Command::new(game, 20, "Alice", CommandKind::Vote, &["Bob"]))
        .await;
    assert!(matches!(late, Err(EngineError::Validation(Rejection::NotDay))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_games_on_sqlite_file() {
    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("mafia.db");
    let pool = DatabaseConfig::new(path.to_string_lossy())
        .create_pool()
        .await
        .expect("Failed to create pool");
    let store = SqliteStore::new(pool);
    store.run_migrations().await.expect("Failed to migrate");
    let engine = Arc::new(Engine::new(
        Arc::new(store),
        Arc::new(RecordingNotifier::new()),
        Arc::new(EngineConfig::default()),
    ));

    let games: Vec<GameId> = (1..=6).map(GameId::new).collect();
    for &game in &games {
        let mut post = 0;
        let mut next = |actor: &str, kind: CommandKind| {
            post += 1;
            Command::new(game, post, actor, kind, &[])
        };
        engine.handle(next(MOD, CommandKind::Prepare)).await.expect("prepare");
        for player in NINE {
            engine.handle(next(player, CommandKind::Join)).await.expect("join");
        }
        engine.handle(next(MOD, CommandKind::Start)).await.expect("start");
    }

    let mut handles = Vec::new();
    for &game in &games {
        for (i, voter) in NINE[..4].iter().enumerate() {
            let engine = engine.clone();
            let command = Command::new(game, 100 + i as i64, voter, CommandKind::Vote, &["Ivy"]);
            handles.push(tokio::spawn(async move { engine.handle(command).await }));
        }
    }
    for handle in handles {
        handle
            .await
            .expect("Task panicked")
            .expect("Vote rejected");
    }

    for &game in &games {
        let listed = engine
            .handle(Command::new(game, 200, MOD, CommandKind::ListVotes, &[]))
            .await
            .expect("list-votes");
        match &listed[0] {
            Notification::Votes { reports } => {
                assert_eq!(Harness::votes_for(&reports[0], "Ivy"), 4);
            }
            other => panic!("Expected vote reports, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_finished_game_still_rejects_after_lock_release() {
    let mut h = Harness::started(3, &["Alice", "Bob", "Carol"]).await;
    h.ok(MOD, CommandKind::Abandon, &[]).await;

    let late = h.run("Alice", CommandKind::Vote, &["Bob"]).await;
    assert!(matches!(
        late,
        Err(EngineError::Validation(Rejection::GameOver(_)))
    ));
}
