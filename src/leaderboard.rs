//! Tournament leaderboard with gross and handicap-adjusted totals.
//!
//! Handicap strokes follow the World Handicap System: a player's course
//! handicap is derived from their handicap index, the tournament's slope
//! and course rating, and the total par of its holes. Strokes are then
//! allocated hole by hole in stroke index order.
//!
//! The course rating is an 18 hole figure. A tournament with fewer holes
//! stored gets the handicap index and course rating scaled by its share of
//! a full round, and strokes are spread over the holes it actually has.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Hole, Player, Score, Tournament, STANDARD_SLOPE};
use crate::store::Database;
use crate::validation::HOLES_PER_ROUND;

#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    pub tournament: Tournament,
    pub total_par: u32,
    pub rows: Vec<LeaderboardRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    /// `None` for entrants without a score yet
    pub position: Option<u32>,
    pub tied: bool,
    pub player_id: Uuid,
    pub player_name: String,
    pub handicap_index: f64,
    pub course_handicap: i32,
    /// Holes with a recorded score
    pub thru: u32,
    pub gross: u32,
    pub gross_to_par: i32,
    pub net: i32,
    pub net_to_par: i32,
}

impl LeaderboardRow {
    /// Position as shown on a board: "1", "T3", or "-" before teeing off
    pub fn display_position(&self) -> String {
        match (self.position, self.tied) {
            (None, _) => "-".to_string(),
            (Some(p), true) => format!("T{}", p),
            (Some(p), false) => p.to_string(),
        }
    }
}

/// Course handicap over `hole_count` holes, rounded to the nearest whole
/// stroke. With all 18 holes this is the plain WHS formula.
pub fn course_handicap(
    handicap_index: f64,
    slope_rating: f64,
    course_rating: f64,
    total_par: u32,
    hole_count: usize,
) -> i32 {
    if hole_count == 0 {
        return 0;
    }
    let share = hole_count.min(HOLES_PER_ROUND as usize) as f64 / HOLES_PER_ROUND as f64;
    let raw = handicap_index * share * slope_rating / STANDARD_SLOPE
        + (course_rating * share - total_par as f64);
    raw.round() as i32
}

/// Strokes a player with `course_handicap` receives on the hole ranked
/// `rank` (1 = hardest) among `hole_count` holes. Plus handicaps give
/// strokes back, easiest holes first.
pub fn strokes_received(course_handicap: i32, rank: usize, hole_count: usize) -> i32 {
    if hole_count == 0 {
        return 0;
    }
    let holes = hole_count as i32;
    let rank = rank as i32;
    let whole = course_handicap.abs() / holes;
    let extra = course_handicap.abs() % holes;

    if course_handicap >= 0 {
        whole + i32::from(rank <= extra)
    } else {
        -(whole + i32::from(rank > holes - extra))
    }
}

/// Rank of each hole in stroke index order, ties broken by hole number.
/// On a full course with distinct stroke indexes the rank is the index.
fn allocation_ranks(holes: &[Hole]) -> HashMap<Uuid, usize> {
    let mut ordered: Vec<&Hole> = holes.iter().collect();
    ordered.sort_by_key(|h| (h.stroke_index, h.hole_number));
    ordered
        .into_iter()
        .enumerate()
        .map(|(i, h)| (h.id, i + 1))
        .collect()
}

/// Build one entrant's row from their scores
fn score_entrant(
    player: &Player,
    course_handicap: i32,
    holes: &HashMap<Uuid, &Hole>,
    ranks: &HashMap<Uuid, usize>,
    scores: &[&Score],
) -> LeaderboardRow {
    let mut row = LeaderboardRow {
        position: None,
        tied: false,
        player_id: player.id,
        player_name: player.name.clone(),
        handicap_index: player.handicap_index,
        course_handicap,
        thru: 0,
        gross: 0,
        gross_to_par: 0,
        net: 0,
        net_to_par: 0,
    };

    let mut par_played: i32 = 0;
    let mut strokes: i32 = 0;
    for score in scores {
        let (Some(hole), Some(&rank)) = (holes.get(&score.hole_id), ranks.get(&score.hole_id))
        else {
            continue;
        };
        row.thru += 1;
        row.gross += score.gross_score;
        par_played += hole.par as i32;
        strokes += strokes_received(course_handicap, rank, holes.len());
    }

    row.gross_to_par = row.gross as i32 - par_played;
    row.net = row.gross as i32 - strokes;
    row.net_to_par = row.net - par_played;
    row
}

fn compare_rows(a: &LeaderboardRow, b: &LeaderboardRow) -> Ordering {
    // Entrants without scores sink to the bottom
    (a.thru == 0)
        .cmp(&(b.thru == 0))
        .then(a.net_to_par.cmp(&b.net_to_par))
        .then(a.gross_to_par.cmp(&b.gross_to_par))
        .then_with(|| a.player_name.cmp(&b.player_name))
}

/// Sort rows and assign shared positions on equal net to par
pub fn rank(rows: &mut [LeaderboardRow]) {
    rows.sort_by(compare_rows);

    let scored: Vec<i32> = rows
        .iter()
        .filter(|r| r.thru > 0)
        .map(|r| r.net_to_par)
        .collect();

    for row in rows.iter_mut().filter(|r| r.thru > 0) {
        let ahead = scored.iter().filter(|&&n| n < row.net_to_par).count();
        let level = scored.iter().filter(|&&n| n == row.net_to_par).count();
        row.position = Some(ahead as u32 + 1);
        row.tied = level > 1;
    }
}

/// Compute a leaderboard from raw rows, without touching the database
pub fn compute(
    tournament: Tournament,
    holes: &[Hole],
    entrants: &[Player],
    scores: &[Score],
) -> Leaderboard {
    let total_par: u32 = holes.iter().map(|h| h.par as u32).sum();
    let hole_map: HashMap<Uuid, &Hole> = holes.iter().map(|h| (h.id, h)).collect();
    let ranks = allocation_ranks(holes);

    let mut by_player: HashMap<Uuid, Vec<&Score>> = HashMap::new();
    for score in scores {
        by_player.entry(score.player_id).or_default().push(score);
    }

    let mut rows: Vec<LeaderboardRow> = entrants
        .iter()
        .map(|player| {
            let ch = course_handicap(
                player.handicap_index,
                tournament.slope_rating,
                tournament.course_rating,
                total_par,
                holes.len(),
            );
            let cards = by_player.get(&player.id).map(Vec::as_slice).unwrap_or(&[]);
            score_entrant(player, ch, &hole_map, &ranks, cards)
        })
        .collect();

    rank(&mut rows);

    Leaderboard {
        tournament,
        total_par,
        rows,
    }
}

impl Database {
    /// Leaderboard of every entrant of the tournament
    pub fn leaderboard(&self, tournament_id: Uuid) -> Result<Leaderboard> {
        let tournament = self.get_tournament(tournament_id)?;
        let holes = self.list_holes(tournament_id)?;
        let entrants = self.list_entrants(tournament_id)?;
        let scores = self.list_scores(tournament_id)?;

        Ok(compute(tournament, &holes, &entrants, &scores))
    }
}
