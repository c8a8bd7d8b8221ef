//! Integration tests for the scoring store.
//!
//! These tests:
//! 1. Drive the public `Database` API the way an application would
//! 2. Check the single active tournament rule under random activation runs
//! 3. Verify delete cascades by counting rows left in every child table
//!
//! Run with:
//! ```sh
//! cargo test --test integration_test
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusqlite::Connection;
use std::thread;
use tempfile::NamedTempFile;
use uuid::Uuid;

use golf_scoring_db::models::{NewGroup, NewHole, NewPlayer, NewTournament, Tournament};
use golf_scoring_db::store::APP_LOGO_URL;
use golf_scoring_db::{Database, StoreError};

// =============================================================================
// Test Configuration
// =============================================================================

/// Random seed for reproducible activation sequences
const RANDOM_SEED: u64 = 42;

/// Operations per randomized activation run
const ACTIVATION_STEPS: usize = 200;

/// Activations each thread performs when two handles compete
const RIVAL_ACTIVATIONS: usize = 50;

/// Pars and stroke indexes of a par 72 course, holes 1 to 18
const PARS: [u8; 18] = [4, 4, 3, 5, 4, 4, 3, 4, 5, 4, 4, 3, 5, 4, 4, 3, 4, 5];
const STROKE_INDEXES: [u8; 18] = [7, 1, 17, 11, 3, 13, 15, 5, 9, 8, 2, 18, 12, 4, 14, 16, 6, 10];

// =============================================================================
// Fixtures
// =============================================================================

fn full_course() -> Vec<NewHole> {
    PARS.iter()
        .zip(STROKE_INDEXES.iter())
        .enumerate()
        .map(|(i, (&par, &si))| NewHole::new(i as u8 + 1, par, si))
        .collect()
}

/// A tournament with a full course, two entrants in one group, and a
/// complete card for each of them
struct Event {
    tournament: Tournament,
    players: Vec<Uuid>,
    group: Uuid,
}

fn seed_event(db: &mut Database, name: &str, players: &[Uuid]) -> Event {
    let tournament = db
        .create_tournament(&NewTournament::new(name, 2024, "Fairway Park"))
        .unwrap();
    let holes = db.add_holes(tournament.id, &full_course()).unwrap();
    let group = db.create_group(tournament.id, &NewGroup::new(1)).unwrap();

    for (i, &player) in players.iter().enumerate() {
        db.enter_player(tournament.id, player).unwrap();
        db.add_group_member(group.id, player, i == 0).unwrap();
        for hole in &holes {
            db.record_score(tournament.id, player, hole.id, hole.par as u32 + 1)
                .unwrap();
        }
    }

    Event {
        tournament,
        players: players.to_vec(),
        group: group.id,
    }
}

fn count_where(conn: &Connection, table: &str, column: &str, id: Uuid) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = ?1", table, column);
    conn.query_row(&sql, [id.to_string()], |row| row.get(0))
        .expect("count query failed")
}

fn active_ids(db: &Database) -> Vec<Uuid> {
    db.list_tournaments()
        .unwrap()
        .into_iter()
        .filter(|t| t.is_active)
        .map(|t| t.id)
        .collect()
}

// =============================================================================
// Single Active Tournament
// =============================================================================

#[test]
fn test_random_activation_sequences_keep_one_active() {
    let mut db = Database::open_in_memory().unwrap();
    let mut rng = StdRng::seed_from_u64(RANDOM_SEED);

    let mut ids: Vec<Uuid> = Vec::new();
    for i in 0..5 {
        let t = db
            .create_tournament(&NewTournament::new(format!("Event {}", i), 2020 + i, "Links"))
            .unwrap();
        ids.push(t.id);
    }

    let mut expected: Option<Uuid> = None;
    for step in 0..ACTIVATION_STEPS {
        let target = ids[rng.gen_range(0..ids.len())];
        match rng.gen_range(0..4) {
            0 => {
                db.activate_tournament(target).unwrap();
                expected = Some(target);
            }
            1 => {
                db.deactivate_tournament(target).unwrap();
                if expected == Some(target) {
                    expected = None;
                }
            }
            2 => {
                let mut t = db.get_tournament(target).unwrap();
                t.is_active = rng.gen_bool(0.5);
                let make_active = t.is_active;
                db.update_tournament(&t).unwrap();
                if make_active {
                    expected = Some(target);
                } else if expected == Some(target) {
                    expected = None;
                }
            }
            _ => {
                let new = NewTournament::new(format!("Pop-up {}", step), 2024, "Links");
                let new = if rng.gen_bool(0.5) { new.active() } else { new };
                let created = db.create_tournament(&new).unwrap();
                if created.is_active {
                    expected = Some(created.id);
                }
                ids.push(created.id);
            }
        }

        let active = active_ids(&db);
        assert!(active.len() <= 1, "step {}: {} active tournaments", step, active.len());
        assert_eq!(active.first().copied(), expected, "step {}", step);
    }
}

#[test]
fn test_activate_a_then_b() {
    let mut db = Database::open_in_memory().unwrap();
    let a = db
        .create_tournament(&NewTournament::new("A", 2024, "Links"))
        .unwrap();
    let b = db
        .create_tournament(&NewTournament::new("B", 2024, "Links"))
        .unwrap();

    db.activate_tournament(a.id).unwrap();
    assert_eq!(active_ids(&db), vec![a.id]);

    db.activate_tournament(b.id).unwrap();
    assert!(!db.get_tournament(a.id).unwrap().is_active);
    assert!(db.get_tournament(b.id).unwrap().is_active);
}

#[test]
fn test_two_handles_on_one_file_keep_one_active() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let path = temp_file.path().to_path_buf();

    let mut first = Database::open(&path).unwrap();
    let mut second = Database::open(&path).unwrap();

    let a = first
        .create_tournament(&NewTournament::new("North", 2024, "Links"))
        .unwrap()
        .id;
    let b = second
        .create_tournament(&NewTournament::new("South", 2024, "Links"))
        .unwrap()
        .id;

    for step in 0..10 {
        let expected = if step % 2 == 0 {
            first.activate_tournament(a).unwrap();
            a
        } else {
            second.activate_tournament(b).unwrap();
            b
        };
        assert_eq!(active_ids(&first), vec![expected], "step {}", step);
        assert_eq!(active_ids(&second), vec![expected], "step {}", step);
    }

    // Same rivalry from two threads at once
    let rivals: Vec<_> = [(first, a), (second, b)]
        .into_iter()
        .map(|(mut db, id)| {
            thread::spawn(move || {
                for _ in 0..RIVAL_ACTIVATIONS {
                    db.activate_tournament(id).unwrap();
                    assert_eq!(active_ids(&db).len(), 1);
                }
                db
            })
        })
        .collect();

    for rival in rivals {
        let db = rival.join().expect("activation thread panicked");
        let active = active_ids(&db);
        assert_eq!(active.len(), 1);
        assert!(active[0] == a || active[0] == b);
    }
}

// =============================================================================
// Holes
// =============================================================================

#[test]
fn test_hole_number_bounds() {
    let mut db = Database::open_in_memory().unwrap();
    let t = db
        .create_tournament(&NewTournament::new("Open", 2024, "Links"))
        .unwrap();

    let err = db.add_hole(t.id, &NewHole::new(19, 4, 1)).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let stored = db.add_holes(t.id, &full_course()).unwrap();
    assert_eq!(stored.len(), 18);
    assert_eq!(stored.iter().map(|h| h.par as u32).sum::<u32>(), 72);
}

#[test]
fn test_raw_out_of_range_insert_hits_check_constraint() {
    let mut db = Database::open_in_memory().unwrap();
    let t = db
        .create_tournament(&NewTournament::new("Open", 2024, "Links"))
        .unwrap();

    let err: StoreError = db
        .connection()
        .execute(
            "INSERT INTO holes (id, tournament_id, hole_number, par, stroke_index, created_at, updated_at)
             VALUES (?1, ?2, 19, 4, 1, '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
            [Uuid::new_v4().to_string(), t.id.to_string()],
        )
        .unwrap_err()
        .into();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[test]
fn test_duplicate_hole_leaves_first_untouched() {
    let mut db = Database::open_in_memory().unwrap();
    let t = db
        .create_tournament(&NewTournament::new("Open", 2024, "Links"))
        .unwrap();

    let first = db.add_hole(t.id, &NewHole::new(1, 4, 7)).unwrap();
    let err = db.add_hole(t.id, &NewHole::new(1, 3, 2)).unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)));

    assert_eq!(db.get_hole(first.id).unwrap(), first);
    assert_eq!(db.list_holes(t.id).unwrap().len(), 1);
}

// =============================================================================
// Cascades
// =============================================================================

#[test]
fn test_delete_tournament_cascades() {
    let mut db = Database::open_in_memory().unwrap();
    let p1 = db.create_player(&NewPlayer::new("Ana", 9.0)).unwrap().id;
    let p2 = db.create_player(&NewPlayer::new("Ben", 15.0)).unwrap().id;

    let doomed = seed_event(&mut db, "Doomed", &[p1, p2]);
    let kept = seed_event(&mut db, "Kept", &[p1, p2]);

    db.delete_tournament(doomed.tournament.id).unwrap();

    let conn = db.connection();
    let tid = doomed.tournament.id;
    for table in ["holes", "tournament_players", "groups", "scores"] {
        assert_eq!(count_where(conn, table, "tournament_id", tid), 0, "{} left behind", table);
    }
    assert_eq!(count_where(conn, "group_players", "group_id", doomed.group), 0);

    // The other tournament is intact
    let kid = kept.tournament.id;
    assert_eq!(count_where(conn, "holes", "tournament_id", kid), 18);
    assert_eq!(count_where(conn, "scores", "tournament_id", kid), 36);
    assert_eq!(count_where(conn, "group_players", "group_id", kept.group), 2);
    assert_eq!(db.list_players().unwrap().len(), 2);
}

#[test]
fn test_delete_player_cascades() {
    let mut db = Database::open_in_memory().unwrap();
    let gone = db.create_player(&NewPlayer::new("Gone", 20.0)).unwrap().id;
    let stays = db.create_player(&NewPlayer::new("Stays", 4.0)).unwrap().id;
    let event = seed_event(&mut db, "Open", &[gone, stays]);

    db.delete_player(gone).unwrap();

    let conn = db.connection();
    for table in ["tournament_players", "group_players", "scores"] {
        assert_eq!(count_where(conn, table, "player_id", gone), 0, "{} left behind", table);
    }
    assert_eq!(count_where(conn, "tournament_players", "player_id", stays), 1);
    assert_eq!(count_where(conn, "group_players", "player_id", stays), 1);
    assert_eq!(count_where(conn, "scores", "player_id", stays), 18);
    assert_eq!(event.players.len(), 2);
}

#[test]
fn test_delete_hole_removes_its_scores_only() {
    let mut db = Database::open_in_memory().unwrap();
    let p = db.create_player(&NewPlayer::new("Ana", 9.0)).unwrap().id;
    let event = seed_event(&mut db, "Open", &[p]);

    let hole = db.hole_by_number(event.tournament.id, 5).unwrap();
    db.delete_hole(hole.id).unwrap();

    assert_eq!(count_where(db.connection(), "scores", "hole_id", hole.id), 0);
    assert_eq!(db.list_scores(event.tournament.id).unwrap().len(), 17);
}

// =============================================================================
// Scores
// =============================================================================

#[test]
fn test_duplicate_score_then_update() {
    let mut db = Database::open_in_memory().unwrap();
    let p = db.create_player(&NewPlayer::new("Ana", 9.0)).unwrap().id;
    let event = seed_event(&mut db, "Open", &[p]);
    let hole = db.hole_by_number(event.tournament.id, 1).unwrap();

    let err = db
        .record_score(event.tournament.id, p, hole.id, 3)
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)));

    let existing = db
        .list_scores(event.tournament.id)
        .unwrap()
        .into_iter()
        .find(|s| s.hole_id == hole.id)
        .unwrap();
    let updated = db.update_score(existing.id, 3).unwrap();
    assert_eq!(updated.gross_score, 3);
    assert_eq!(updated.id, existing.id);
}

// =============================================================================
// Settings
// =============================================================================

#[test]
fn test_settings_seed_survives_reopen() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let path = temp_file.path().to_path_buf();

    {
        let db = Database::open(&path).unwrap();
        assert_eq!(db.get_setting(APP_LOGO_URL).unwrap().unwrap().value, "");
        db.set_setting(APP_LOGO_URL, "https://club.example/logo.svg")
            .unwrap();
    }

    // Opening again re-runs the seed
    let db = Database::open(&path).unwrap();
    assert_eq!(db.seed_default_settings().unwrap(), 0);

    let rows = db.list_settings().unwrap();
    let logos: Vec<_> = rows.iter().filter(|s| s.key == APP_LOGO_URL).collect();
    assert_eq!(logos.len(), 1);
    assert_eq!(logos[0].value, "https://club.example/logo.svg");
}

// =============================================================================
// Leaderboard
// =============================================================================

#[test]
fn test_leaderboard_from_store() {
    let mut db = Database::open_in_memory().unwrap();
    let low = db.create_player(&NewPlayer::new("Low", 0.0)).unwrap().id;
    let high = db.create_player(&NewPlayer::new("High", 18.0)).unwrap().id;
    let event = seed_event(&mut db, "Medal", &[low, high]);
    db.activate_tournament(event.tournament.id).unwrap();

    let active = db.active_tournament().unwrap().unwrap();
    let board = db.leaderboard(active.id).unwrap();

    assert_eq!(board.total_par, 72);
    // Both shot 90; the 18 handicapper nets back to level par
    assert_eq!(board.rows[0].player_name, "High");
    assert_eq!(board.rows[0].net_to_par, 0);
    assert_eq!(board.rows[0].display_position(), "1");
    assert_eq!(board.rows[1].player_name, "Low");
    assert_eq!(board.rows[1].net_to_par, 18);
    assert_eq!(board.rows[1].display_position(), "2");
}
