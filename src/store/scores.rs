use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{now, uuid_column, Database};
use crate::error::{Result, StoreError};
use crate::models::Score;
use crate::validation;

const SCORE_COLUMNS: &str =
    "id, tournament_id, player_id, hole_id, gross_score, created_at, updated_at";

fn score_from_row(row: &Row) -> rusqlite::Result<Score> {
    Ok(Score {
        id: uuid_column(row, "id")?,
        tournament_id: uuid_column(row, "tournament_id")?,
        player_id: uuid_column(row, "player_id")?,
        hole_id: uuid_column(row, "hole_id")?,
        gross_score: row.get("gross_score")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// A score's hole has to be one of the tournament's own holes
fn check_hole_belongs(conn: &Connection, tournament_id: Uuid, hole_id: Uuid) -> Result<()> {
    let owner: Option<String> = conn
        .query_row(
            "SELECT tournament_id FROM holes WHERE id = ?1",
            [hole_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    match owner {
        None => Err(StoreError::not_found("hole", hole_id)),
        Some(owner) if owner != tournament_id.to_string() => Err(StoreError::Validation(format!(
            "hole {} does not belong to tournament {}",
            hole_id, tournament_id
        ))),
        Some(_) => Ok(()),
    }
}

fn fetch_score(conn: &Connection, id: Uuid) -> Result<Score> {
    let sql = format!("SELECT {} FROM scores WHERE id = ?1", SCORE_COLUMNS);
    conn.query_row(&sql, [id.to_string()], score_from_row)
        .optional()?
        .ok_or_else(|| StoreError::not_found("score", id))
}

impl Database {
    /// Record a new gross score. A second score for the same
    /// (tournament, player, hole) is rejected as a duplicate.
    pub fn record_score(
        &self,
        tournament_id: Uuid,
        player_id: Uuid,
        hole_id: Uuid,
        gross_score: u32,
    ) -> Result<Score> {
        validation::gross_score(gross_score).map_err(StoreError::Validation)?;
        check_hole_belongs(&self.conn, tournament_id, hole_id)?;

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO scores (id, tournament_id, player_id, hole_id, gross_score, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                id.to_string(),
                tournament_id.to_string(),
                player_id.to_string(),
                hole_id.to_string(),
                gross_score,
                now()
            ],
        )?;

        fetch_score(&self.conn, id)
    }

    /// Replace the gross score of an existing row
    pub fn update_score(&self, score_id: Uuid, gross_score: u32) -> Result<Score> {
        validation::gross_score(gross_score).map_err(StoreError::Validation)?;

        let updated = self.conn.execute(
            "UPDATE scores SET gross_score = ?2, updated_at = ?3 WHERE id = ?1",
            params![score_id.to_string(), gross_score, now()],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found("score", score_id));
        }
        fetch_score(&self.conn, score_id)
    }

    /// Record a score, or overwrite the existing one for the same hole
    pub fn upsert_score(
        &self,
        tournament_id: Uuid,
        player_id: Uuid,
        hole_id: Uuid,
        gross_score: u32,
    ) -> Result<Score> {
        validation::gross_score(gross_score).map_err(StoreError::Validation)?;
        check_hole_belongs(&self.conn, tournament_id, hole_id)?;

        let ts = now();
        let sql = format!(
            "INSERT INTO scores (id, tournament_id, player_id, hole_id, gross_score, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT (tournament_id, player_id, hole_id)
             DO UPDATE SET gross_score = excluded.gross_score, updated_at = excluded.updated_at
             RETURNING {}",
            SCORE_COLUMNS
        );
        let score = self.conn.query_row(
            &sql,
            params![
                Uuid::new_v4().to_string(),
                tournament_id.to_string(),
                player_id.to_string(),
                hole_id.to_string(),
                gross_score,
                ts
            ],
            score_from_row,
        )?;
        Ok(score)
    }

    pub fn delete_score(&self, score_id: Uuid) -> Result<()> {
        let removed = self
            .conn
            .execute("DELETE FROM scores WHERE id = ?1", [score_id.to_string()])?;
        if removed == 0 {
            return Err(StoreError::not_found("score", score_id));
        }
        Ok(())
    }

    /// Every score of a tournament, grouped by player then hole number
    pub fn list_scores(&self, tournament_id: Uuid) -> Result<Vec<Score>> {
        let columns = SCORE_COLUMNS
            .split(", ")
            .map(|c| format!("s.{c} AS {c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM scores s
             JOIN holes h ON h.id = s.hole_id
             WHERE s.tournament_id = ?1
             ORDER BY s.player_id, h.hole_number",
            columns
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let scores = stmt
            .query_map([tournament_id.to_string()], score_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(scores)
    }

    /// One player's card as (hole number, gross score) pairs
    pub fn player_card(&self, tournament_id: Uuid, player_id: Uuid) -> Result<Vec<(u8, u32)>> {
        let mut stmt = self.conn.prepare(
            "SELECT h.hole_number, s.gross_score FROM scores s
             JOIN holes h ON h.id = s.hole_id
             WHERE s.tournament_id = ?1 AND s.player_id = ?2
             ORDER BY h.hole_number",
        )?;
        let card = stmt
            .query_map(
                params![tournament_id.to_string(), player_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(card)
    }
}
