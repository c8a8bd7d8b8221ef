use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::players::{player_from_row, PLAYER_COLUMNS};
use super::{now, uuid_column, Database};
use crate::error::{Result, StoreError};
use crate::models::{Player, TournamentPlayer};

fn entry_from_row(row: &Row) -> rusqlite::Result<TournamentPlayer> {
    Ok(TournamentPlayer {
        id: uuid_column(row, "id")?,
        tournament_id: uuid_column(row, "tournament_id")?,
        player_id: uuid_column(row, "player_id")?,
        created_at: row.get("created_at")?,
    })
}

impl Database {
    /// Enter a player into a tournament. Entering twice is a duplicate.
    pub fn enter_player(&self, tournament_id: Uuid, player_id: Uuid) -> Result<TournamentPlayer> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO tournament_players (id, tournament_id, player_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                id.to_string(),
                tournament_id.to_string(),
                player_id.to_string(),
                now()
            ],
        )?;

        self.conn
            .query_row(
                "SELECT id, tournament_id, player_id, created_at
                 FROM tournament_players WHERE id = ?1",
                [id.to_string()],
                entry_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found("entry", id))
    }

    /// Remove a player's entry. Scores already recorded are kept.
    pub fn withdraw_player(&self, tournament_id: Uuid, player_id: Uuid) -> Result<()> {
        let removed = self.conn.execute(
            "DELETE FROM tournament_players WHERE tournament_id = ?1 AND player_id = ?2",
            params![tournament_id.to_string(), player_id.to_string()],
        )?;
        if removed == 0 {
            return Err(StoreError::NotFound {
                entity: "entry",
                id: format!("{}/{}", tournament_id, player_id),
            });
        }
        Ok(())
    }

    pub fn is_entered(&self, tournament_id: Uuid, player_id: Uuid) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM tournament_players WHERE tournament_id = ?1 AND player_id = ?2",
                params![tournament_id.to_string(), player_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Players entered in a tournament, ordered by name
    pub fn list_entrants(&self, tournament_id: Uuid) -> Result<Vec<Player>> {
        let columns = PLAYER_COLUMNS
            .split(", ")
            .map(|c| format!("p.{c} AS {c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM players p
             JOIN tournament_players tp ON tp.player_id = p.id
             WHERE tp.tournament_id = ?1
             ORDER BY p.name, p.id",
            columns
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let players = stmt
            .query_map([tournament_id.to_string()], player_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(players)
    }
}
