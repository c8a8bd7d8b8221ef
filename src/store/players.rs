use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::{now, uuid_column, Database};
use crate::error::{Result, StoreError};
use crate::models::{NewPlayer, Player};
use crate::schema::tables::PLAYERS;
use crate::validation;

pub(super) const PLAYER_COLUMNS: &str =
    "id, name, handicap_index, handicap_reference, bio, photo_url, created_at, updated_at";

pub(super) fn player_from_row(row: &Row) -> rusqlite::Result<Player> {
    Ok(Player {
        id: uuid_column(row, "id")?,
        name: row.get("name")?,
        handicap_index: row.get("handicap_index")?,
        handicap_reference: row.get("handicap_reference")?,
        bio: row.get("bio")?,
        photo_url: row.get("photo_url")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl Database {
    pub fn create_player(&self, new: &NewPlayer) -> Result<Player> {
        validation::new_player(new).map_err(StoreError::Validation)?;

        let id = Uuid::new_v4();
        let ts = now();
        self.conn.execute(
            "INSERT INTO players (id, name, handicap_index, handicap_reference, bio, photo_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                id.to_string(),
                new.name.trim(),
                new.handicap_index,
                new.handicap_reference,
                new.bio,
                new.photo_url,
                ts
            ],
        )?;

        self.get_player(id)
    }

    pub fn get_player(&self, id: Uuid) -> Result<Player> {
        let sql = format!("SELECT {} FROM players WHERE id = ?1", PLAYER_COLUMNS);
        self.conn
            .query_row(&sql, [id.to_string()], player_from_row)
            .optional()?
            .ok_or_else(|| StoreError::not_found("player", id))
    }

    /// All players ordered by name
    pub fn list_players(&self) -> Result<Vec<Player>> {
        let sql = format!("SELECT {} FROM players ORDER BY name, id", PLAYER_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let players = stmt
            .query_map([], player_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(players)
    }

    /// Write back every mutable field of `player`, refreshing `updated_at`
    pub fn update_player(&self, player: &Player) -> Result<Player> {
        validation::non_blank("name", &player.name).map_err(StoreError::Validation)?;
        validation::handicap_index(player.handicap_index).map_err(StoreError::Validation)?;

        let updated = self.conn.execute(
            "UPDATE players
             SET name = ?2, handicap_index = ?3, handicap_reference = ?4, bio = ?5,
                 photo_url = ?6, updated_at = ?7
             WHERE id = ?1",
            params![
                player.id.to_string(),
                player.name.trim(),
                player.handicap_index,
                player.handicap_reference,
                player.bio,
                player.photo_url,
                now()
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found("player", player.id));
        }

        self.get_player(player.id)
    }

    /// Remove a player along with their entries, group memberships and scores
    pub fn delete_player(&self, id: Uuid) -> Result<()> {
        self.delete_by_id(&PLAYERS, "player", id)
    }
}
