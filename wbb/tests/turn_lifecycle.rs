//! Game-level tests driving `handle_query` through a whole match.
//!
//! These tests replay the sequence of calls a game server makes:
//! `gameInit`, several `round`s, then `death`, and verify what the bot sends
//! back to the server and what it keeps on disk in between.

use std::fs;

use wbb::core::geometry::Position;
use wbb::core::target::Target;
use wbb::io::server::ServerMethod;
use wbb::io::state_store::{StatePaths, load_state};
use wbb::strategy::{Hunter, Sentry, TurnHandler};
use wbb::test_support::{ScriptedServer, TEST_KEY, TestArena};
use wbb::turn::{LIB_VERSION, TurnError, handle_query};

const URL: &str = "url=http%3A%2F%2Farena.test%2Fwbb%2Farena.php";

/// Full match with the sentry:
///
/// 1. `gameInit` announces a cheaper scan and a server URL.
/// 2. Round 1: nothing in the first cone; the sweep advances.
/// 3. Round 2: a bot appears in the second cone and is shot.
/// 4. `death`: the state file disappears and stays gone.
#[test]
fn sentry_plays_a_full_match() {
    let arena = TestArena::new().expect("arena");
    let paths = StatePaths::new(arena.path(), "match-1", TEST_KEY);
    let server = ScriptedServer::new(vec![
        ScriptedServer::scan_reply(&[]),
        ScriptedServer::scan_reply(&[(10.0, 120.0, 55)]),
        ScriptedServer::fire_reply(1),
    ]);

    let init = arena.query(
        "match-1",
        "gameInit",
        "serverURL=http%3A%2F%2Farena.test%2Fwbb%2Farena.php&scanCost=5&scanDegrees=10",
    );
    let reply = handle_query(&arena.config, &init, &Sentry, &server).expect("init");
    assert_eq!(reply.body, format!("0.1-{LIB_VERSION}"));

    // Round 1 relies on the URL stored at init.
    let round1 = arena.query("match-1", "round", "x=200&y=200&energy=40&armor=10");
    let reply = handle_query(&arena.config, &round1, &Sentry, &server).expect("round 1");
    assert!(reply.body.is_empty());
    let state = load_state(&paths.state_path).expect("state after round 1");
    assert_eq!(state.vars.get("sweep"), Some(&serde_json::json!(10.0)));

    let round2 = arena.query(
        "match-1",
        "round",
        &format!("x=200&y=200&energy=40&armor=10&{URL}"),
    );
    handle_query(&arena.config, &round2, &Sentry, &server).expect("round 2");

    let calls = server.calls();
    let methods: Vec<ServerMethod> = calls.iter().map(|call| call.method).collect();
    assert_eq!(
        methods,
        vec![ServerMethod::Scan, ServerMethod::Scan, ServerMethod::Fire]
    );
    assert_eq!(calls[0].param("degree"), Some("0"));
    assert_eq!(calls[1].param("degree"), Some("10"));
    // 40 energy minus the announced scan cost of 5.
    assert_eq!(calls[2].param("energy"), Some("35"));
    assert_eq!(calls[2].endpoint.url, "http://arena.test/wbb/arena.php");
    assert_eq!(calls[2].endpoint.client_key, TEST_KEY);
    assert_eq!(calls[2].endpoint.game_id, "match-1");
    assert_eq!(server.remaining_replies(), 0);

    let death = arena.query("match-1", "death", "");
    handle_query(&arena.config, &death, &Sentry, &server).expect("death");
    assert!(!paths.state_path.exists(), "death must not re-create state");

    let log = fs::read_to_string(&paths.log_path).expect("bot log");
    assert!(log.contains("Bot died, removing state file"));
    assert!(!log.contains(&format!("serverKey={TEST_KEY}")));
}

/// The hunter remembers its quarry by absolute position and re-aims after
/// moving.
#[test]
fn hunter_tracks_quarry_across_rounds() {
    let arena = TestArena::new().expect("arena");
    let paths = StatePaths::new(arena.path(), "match-2", TEST_KEY);
    let server = ScriptedServer::new(vec![
        // Round 1: spotted far to the south, drive then shoot.
        ScriptedServer::scan_reply(&[(90.0, 500.0, 20)]),
        String::new(),
        ScriptedServer::fire_reply(0),
        // Round 2: look straight at the remembered position, still there.
        ScriptedServer::scan_reply(&[(90.0, 150.0, 12)]),
        ScriptedServer::fire_reply(1),
    ]);
    let hunter = Hunter::default();

    let init = arena.query("match-2", "gameInit", "serverURL=http%3A%2F%2Farena.test");
    handle_query(&arena.config, &init, &hunter, &server).expect("init");

    let round1 = arena.query("match-2", "round", "x=0&y=0&energy=400&armor=10");
    handle_query(&arena.config, &round1, &hunter, &server).expect("round 1");

    let state = load_state(&paths.state_path).expect("state");
    let quarry: Target =
        serde_json::from_value(state.vars["quarry"].clone()).expect("quarry stored");
    assert_eq!(quarry.position, Position::new(0, 500));

    // The server reports the bot where the drive left it.
    let round2 = arena.query("match-2", "round", "x=0&y=350&energy=400&armor=10");
    handle_query(&arena.config, &round2, &hunter, &server).expect("round 2");

    let calls = server.calls();
    assert_eq!(calls[1].method, ServerMethod::Drive);
    assert_eq!(calls[1].param("direction"), Some("4"));
    assert_eq!(calls[1].param("distance"), Some("350"));
    assert_eq!(calls[3].method, ServerMethod::Scan);
    assert_eq!(calls[3].param("degree"), Some("90"));
    assert_eq!(calls[4].method, ServerMethod::Fire);
}

/// A failing handler still persists the variables it set before failing.
#[test]
fn handler_failure_keeps_variables() {
    struct Flaky;

    impl TurnHandler for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn description(&self) -> &'static str {
            "fails after remembering something"
        }

        fn take_turn(&self, bot: &mut wbb::bot::Bot<'_>) -> anyhow::Result<()> {
            bot.set("seen", true)?;
            bot.scan(0.0)?;
            Ok(())
        }
    }

    let arena = TestArena::new().expect("arena");
    let paths = StatePaths::new(arena.path(), "match-3", TEST_KEY);
    // No scripted replies: the scan fails.
    let server = ScriptedServer::default();

    let round = arena.query("match-3", "round", &format!("x=1&y=1&energy=9&armor=1&{URL}"));
    let err = handle_query(&arena.config, &round, &Flaky, &server).expect_err("scan fails");
    assert!(matches!(err, TurnError::Failed(_)));
    assert!(format!("{err:#}").contains("flaky turn handler"));

    let state = load_state(&paths.state_path).expect("state saved anyway");
    assert_eq!(state.vars.get("seen"), Some(&serde_json::json!(true)));
    let log = fs::read_to_string(&paths.log_path).expect("bot log");
    assert!(log.contains("[error] ERROR: "));
}

/// Corrupt state is discarded instead of failing the round.
#[test]
fn corrupt_state_starts_fresh() {
    let arena = TestArena::new().expect("arena");
    let paths = StatePaths::new(arena.path(), "match-4", TEST_KEY);
    fs::write(&paths.state_path, "{not json").expect("write corrupt state");
    let server = ScriptedServer::new(vec![ScriptedServer::scan_reply(&[])]);

    let round = arena.query("match-4", "round", &format!("x=1&y=1&energy=9&armor=1&{URL}"));
    handle_query(&arena.config, &round, &Sentry, &server).expect("round");

    let state = load_state(&paths.state_path).expect("state rewritten");
    assert_eq!(state.vars.get("sweep"), Some(&serde_json::json!(10.0)));
}
