use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;
use uuid::Uuid;

use super::{now, uuid_column, Database};
use crate::error::{Result, StoreError};
use crate::models::{Group, GroupPlayer, NewGroup};
use crate::schema::tables::GROUPS;
use crate::validation;

const GROUP_COLUMNS: &str =
    "id, tournament_id, group_number, name, tee_time, pin, created_at, updated_at";
const MEMBER_COLUMNS: &str = "id, group_id, player_id, is_scorer, created_at";

/// Attempts at drawing a pin not yet used in the tournament
const PIN_ATTEMPTS: usize = 32;

fn group_from_row(row: &Row) -> rusqlite::Result<Group> {
    Ok(Group {
        id: uuid_column(row, "id")?,
        tournament_id: uuid_column(row, "tournament_id")?,
        group_number: row.get("group_number")?,
        name: row.get("name")?,
        tee_time: row.get("tee_time")?,
        pin: row.get("pin")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn member_from_row(row: &Row) -> rusqlite::Result<GroupPlayer> {
    Ok(GroupPlayer {
        id: uuid_column(row, "id")?,
        group_id: uuid_column(row, "group_id")?,
        player_id: uuid_column(row, "player_id")?,
        is_scorer: row.get("is_scorer")?,
        created_at: row.get("created_at")?,
    })
}

fn pin_in_use(conn: &Connection, tournament_id: Uuid, pin: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM groups WHERE tournament_id = ?1 AND pin = ?2 LIMIT 1",
            params![tournament_id.to_string(), pin],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Draw a random four digit pin that no other group of the tournament holds
fn generate_pin(conn: &Connection, tournament_id: Uuid) -> Result<String> {
    let mut rng = rand::thread_rng();
    for _ in 0..PIN_ATTEMPTS {
        let pin = format!("{:04}", rng.gen_range(0..10_000));
        if !pin_in_use(conn, tournament_id, &pin)? {
            return Ok(pin);
        }
    }
    Err(StoreError::Validation(format!(
        "could not generate a free pin for tournament {}",
        tournament_id
    )))
}

fn fetch_member(conn: &Connection, group_id: Uuid, player_id: Uuid) -> Result<GroupPlayer> {
    let sql = format!(
        "SELECT {} FROM group_players WHERE group_id = ?1 AND player_id = ?2",
        MEMBER_COLUMNS
    );
    conn.query_row(
        &sql,
        params![group_id.to_string(), player_id.to_string()],
        member_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::NotFound {
        entity: "group member",
        id: format!("{}/{}", group_id, player_id),
    })
}

/// Make `player_id` the only scorer of the group
fn assign_scorer(conn: &Connection, group_id: Uuid, player_id: Uuid) -> Result<()> {
    conn.execute(
        "UPDATE group_players SET is_scorer = (player_id = ?2) WHERE group_id = ?1",
        params![group_id.to_string(), player_id.to_string()],
    )?;
    Ok(())
}

impl Database {
    /// Create a group. Without an explicit pin a free one is generated.
    pub fn create_group(&self, tournament_id: Uuid, new: &NewGroup) -> Result<Group> {
        validation::new_group(new).map_err(StoreError::Validation)?;

        let pin = match &new.pin {
            Some(pin) => pin.trim().to_string(),
            None => generate_pin(&self.conn, tournament_id)?,
        };

        let id = Uuid::new_v4();
        let ts = now();
        self.conn.execute(
            "INSERT INTO groups (id, tournament_id, group_number, name, tee_time, pin, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                id.to_string(),
                tournament_id.to_string(),
                new.group_number,
                new.name,
                new.tee_time,
                pin,
                ts
            ],
        )?;

        self.get_group(id)
    }

    pub fn get_group(&self, id: Uuid) -> Result<Group> {
        let sql = format!("SELECT {} FROM groups WHERE id = ?1", GROUP_COLUMNS);
        self.conn
            .query_row(&sql, [id.to_string()], group_from_row)
            .optional()?
            .ok_or_else(|| StoreError::not_found("group", id))
    }

    /// Groups of a tournament ordered by group number
    pub fn list_groups(&self, tournament_id: Uuid) -> Result<Vec<Group>> {
        let sql = format!(
            "SELECT {} FROM groups WHERE tournament_id = ?1 ORDER BY group_number",
            GROUP_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let groups = stmt
            .query_map([tournament_id.to_string()], group_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(groups)
    }

    /// Look up a group by its join pin. Pins are not unique by constraint;
    /// when several groups share one, the lowest group number wins.
    pub fn find_group_by_pin(&self, tournament_id: Uuid, pin: &str) -> Result<Option<Group>> {
        let sql = format!(
            "SELECT {} FROM groups WHERE tournament_id = ?1 AND pin = ?2
             ORDER BY group_number LIMIT 1",
            GROUP_COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, params![tournament_id.to_string(), pin.trim()], group_from_row)
            .optional()?)
    }

    pub fn update_group(&self, group: &Group) -> Result<Group> {
        validation::new_group(&NewGroup {
            group_number: group.group_number,
            name: group.name.clone(),
            tee_time: group.tee_time,
            pin: Some(group.pin.clone()),
        })
        .map_err(StoreError::Validation)?;

        let updated = self.conn.execute(
            "UPDATE groups SET group_number = ?2, name = ?3, tee_time = ?4, pin = ?5, updated_at = ?6
             WHERE id = ?1",
            params![
                group.id.to_string(),
                group.group_number,
                group.name,
                group.tee_time,
                group.pin.trim(),
                now()
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found("group", group.id));
        }
        self.get_group(group.id)
    }

    /// Remove a group and its memberships
    pub fn delete_group(&self, id: Uuid) -> Result<()> {
        self.delete_by_id(&GROUPS, "group", id)
    }

    /// Put a player in a group. Adding them as scorer demotes any existing
    /// scorer of the group.
    pub fn add_group_member(
        &mut self,
        group_id: Uuid,
        player_id: Uuid,
        is_scorer: bool,
    ) -> Result<GroupPlayer> {
        let tx = self.write_transaction()?;
        tx.execute(
            "INSERT INTO group_players (id, group_id, player_id, is_scorer, created_at)
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![
                Uuid::new_v4().to_string(),
                group_id.to_string(),
                player_id.to_string(),
                now()
            ],
        )?;
        if is_scorer {
            assign_scorer(&tx, group_id, player_id)?;
        }
        let member = fetch_member(&tx, group_id, player_id)?;
        tx.commit()?;

        debug!(%group_id, %player_id, is_scorer, "added group member");
        Ok(member)
    }

    pub fn remove_group_member(&self, group_id: Uuid, player_id: Uuid) -> Result<()> {
        let removed = self.conn.execute(
            "DELETE FROM group_players WHERE group_id = ?1 AND player_id = ?2",
            params![group_id.to_string(), player_id.to_string()],
        )?;
        if removed == 0 {
            return Err(StoreError::NotFound {
                entity: "group member",
                id: format!("{}/{}", group_id, player_id),
            });
        }
        Ok(())
    }

    /// Make an existing member the group's sole scorer
    pub fn set_group_scorer(&mut self, group_id: Uuid, player_id: Uuid) -> Result<GroupPlayer> {
        let tx = self.write_transaction()?;
        // Fails with NotFound before touching anyone else's flag
        fetch_member(&tx, group_id, player_id)?;
        assign_scorer(&tx, group_id, player_id)?;
        let member = fetch_member(&tx, group_id, player_id)?;
        tx.commit()?;
        Ok(member)
    }

    /// Memberships of a group, scorer first
    pub fn list_group_members(&self, group_id: Uuid) -> Result<Vec<GroupPlayer>> {
        let sql = format!(
            "SELECT {} FROM group_players WHERE group_id = ?1
             ORDER BY is_scorer DESC, created_at, id",
            MEMBER_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let members = stmt
            .query_map([group_id.to_string()], member_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(members)
    }
}
