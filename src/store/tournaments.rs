use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;
use uuid::Uuid;

use super::{now, uuid_column, Database};
use crate::error::{Result, StoreError};
use crate::models::{NewTournament, Tournament, TournamentStatus};
use crate::schema::tables::TOURNAMENTS;
use crate::validation;

const TOURNAMENT_COLUMNS: &str = "id, name, year, course_name, slope_rating, course_rating, \
     start_date, end_date, is_active, status, logo_url, created_at, updated_at";

fn tournament_from_row(row: &Row) -> rusqlite::Result<Tournament> {
    Ok(Tournament {
        id: uuid_column(row, "id")?,
        name: row.get("name")?,
        year: row.get("year")?,
        course_name: row.get("course_name")?,
        slope_rating: row.get("slope_rating")?,
        course_rating: row.get("course_rating")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        is_active: row.get("is_active")?,
        status: row.get("status")?,
        logo_url: row.get("logo_url")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Force every tournament other than `keep` to inactive.
///
/// Must run in the same transaction as the write that marks `keep` active,
/// and before it, so the partial unique index on `is_active` never sees
/// two active rows.
fn demote_other_tournaments(conn: &Connection, keep: Uuid, ts: DateTime<Utc>) -> Result<usize> {
    let demoted = conn.execute(
        "UPDATE tournaments SET is_active = 0, updated_at = ?2
         WHERE is_active = 1 AND id <> ?1",
        params![keep.to_string(), ts],
    )?;
    if demoted > 0 {
        info!(%keep, demoted, "deactivated other tournaments");
    }
    Ok(demoted)
}

fn fetch_tournament(conn: &Connection, id: Uuid) -> Result<Tournament> {
    let sql = format!("SELECT {} FROM tournaments WHERE id = ?1", TOURNAMENT_COLUMNS);
    conn.query_row(&sql, [id.to_string()], tournament_from_row)
        .optional()?
        .ok_or_else(|| StoreError::not_found("tournament", id))
}

impl Database {
    /// Insert a tournament. When it is created active, every other
    /// tournament is deactivated in the same transaction.
    pub fn create_tournament(&mut self, new: &NewTournament) -> Result<Tournament> {
        validation::new_tournament(new).map_err(StoreError::Validation)?;

        let id = Uuid::new_v4();
        let ts = now();
        let tx = self.write_transaction()?;

        if new.is_active {
            demote_other_tournaments(&tx, id, ts)?;
        }

        tx.execute(
            "INSERT INTO tournaments (id, name, year, course_name, slope_rating, course_rating,
                 start_date, end_date, is_active, status, logo_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
            params![
                id.to_string(),
                new.name.trim(),
                new.year,
                new.course_name,
                new.slope_rating,
                new.course_rating,
                new.start_date,
                new.end_date,
                new.is_active,
                new.status,
                new.logo_url,
                ts
            ],
        )?;

        let tournament = fetch_tournament(&tx, id)?;
        tx.commit()?;

        info!(%id, name = %tournament.name, active = tournament.is_active, "created tournament");
        Ok(tournament)
    }

    pub fn get_tournament(&self, id: Uuid) -> Result<Tournament> {
        fetch_tournament(&self.conn, id)
    }

    /// All tournaments, most recent year first
    pub fn list_tournaments(&self) -> Result<Vec<Tournament>> {
        let sql = format!(
            "SELECT {} FROM tournaments ORDER BY year DESC, name, id",
            TOURNAMENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let tournaments = stmt
            .query_map([], tournament_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tournaments)
    }

    /// The one active tournament, if any
    pub fn active_tournament(&self) -> Result<Option<Tournament>> {
        let sql = format!(
            "SELECT {} FROM tournaments WHERE is_active = 1",
            TOURNAMENT_COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, [], tournament_from_row)
            .optional()?)
    }

    /// Write back every mutable field of `tournament`. If it is marked
    /// active, all others are deactivated within the same transaction.
    pub fn update_tournament(&mut self, tournament: &Tournament) -> Result<Tournament> {
        validation::tournament_fields(
            &tournament.name,
            tournament.year,
            tournament.slope_rating,
            tournament.start_date,
            tournament.end_date,
        )
        .map_err(StoreError::Validation)?;

        let ts = now();
        let tx = self.write_transaction()?;

        if tournament.is_active {
            demote_other_tournaments(&tx, tournament.id, ts)?;
        }

        let updated = tx.execute(
            "UPDATE tournaments
             SET name = ?2, year = ?3, course_name = ?4, slope_rating = ?5, course_rating = ?6,
                 start_date = ?7, end_date = ?8, is_active = ?9, status = ?10, logo_url = ?11,
                 updated_at = ?12
             WHERE id = ?1",
            params![
                tournament.id.to_string(),
                tournament.name.trim(),
                tournament.year,
                tournament.course_name,
                tournament.slope_rating,
                tournament.course_rating,
                tournament.start_date,
                tournament.end_date,
                tournament.is_active,
                tournament.status,
                tournament.logo_url,
                ts
            ],
        )?;
        // Dropping `tx` here rolls back the demotion as well
        if updated == 0 {
            return Err(StoreError::not_found("tournament", tournament.id));
        }

        let stored = fetch_tournament(&tx, tournament.id)?;
        tx.commit()?;
        Ok(stored)
    }

    /// Make `id` the single active tournament
    pub fn activate_tournament(&mut self, id: Uuid) -> Result<Tournament> {
        let ts = now();
        let tx = self.write_transaction()?;

        demote_other_tournaments(&tx, id, ts)?;
        let updated = tx.execute(
            "UPDATE tournaments SET is_active = 1, updated_at = ?2 WHERE id = ?1",
            params![id.to_string(), ts],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found("tournament", id));
        }

        let tournament = fetch_tournament(&tx, id)?;
        tx.commit()?;

        info!(%id, name = %tournament.name, "activated tournament");
        Ok(tournament)
    }

    /// Clear the active flag on `id`. Other tournaments are untouched.
    pub fn deactivate_tournament(&self, id: Uuid) -> Result<Tournament> {
        let updated = self.conn.execute(
            "UPDATE tournaments SET is_active = 0, updated_at = ?2 WHERE id = ?1",
            params![id.to_string(), now()],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found("tournament", id));
        }
        self.get_tournament(id)
    }

    pub fn set_tournament_status(&self, id: Uuid, status: TournamentStatus) -> Result<Tournament> {
        let updated = self.conn.execute(
            "UPDATE tournaments SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.to_string(), status, now()],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found("tournament", id));
        }
        self.get_tournament(id)
    }

    /// Remove a tournament with its holes, entries, groups and scores
    pub fn delete_tournament(&self, id: Uuid) -> Result<()> {
        self.delete_by_id(&TOURNAMENTS, "tournament", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_count(db: &Database) -> i64 {
        db.connection()
            .query_row(
                "SELECT COUNT(*) FROM tournaments WHERE is_active = 1",
                [],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn test_activate_switches_active_tournament() {
        let mut db = Database::open_in_memory().unwrap();
        let a = db
            .create_tournament(&NewTournament::new("Spring Cup", 2024, "Old Course"))
            .unwrap();
        let b = db
            .create_tournament(&NewTournament::new("Autumn Cup", 2024, "New Course"))
            .unwrap();

        db.activate_tournament(a.id).unwrap();
        db.activate_tournament(b.id).unwrap();

        assert!(!db.get_tournament(a.id).unwrap().is_active);
        assert!(db.get_tournament(b.id).unwrap().is_active);
        assert_eq!(db.active_tournament().unwrap().unwrap().id, b.id);
        assert_eq!(active_count(&db), 1);
    }

    #[test]
    fn test_create_active_demotes_existing() {
        let mut db = Database::open_in_memory().unwrap();
        let first = db
            .create_tournament(&NewTournament::new("First", 2023, "Links").active())
            .unwrap();
        let second = db
            .create_tournament(&NewTournament::new("Second", 2024, "Links").active())
            .unwrap();

        assert!(!db.get_tournament(first.id).unwrap().is_active);
        assert!(second.is_active);
        assert_eq!(active_count(&db), 1);
    }

    #[test]
    fn test_inactive_write_has_no_side_effect() {
        let mut db = Database::open_in_memory().unwrap();
        let active = db
            .create_tournament(&NewTournament::new("Live", 2024, "Links").active())
            .unwrap();
        let mut other = db
            .create_tournament(&NewTournament::new("Later", 2025, "Links"))
            .unwrap();

        other.course_name = "Parkland".to_string();
        db.update_tournament(&other).unwrap();

        let still_active = db.get_tournament(active.id).unwrap();
        assert!(still_active.is_active);
        assert_eq!(still_active.updated_at, active.updated_at);
    }

    #[test]
    fn test_update_setting_active_demotes_others() {
        let mut db = Database::open_in_memory().unwrap();
        let a = db
            .create_tournament(&NewTournament::new("A", 2024, "Links").active())
            .unwrap();
        let mut b = db
            .create_tournament(&NewTournament::new("B", 2024, "Links"))
            .unwrap();

        b.is_active = true;
        b.status = TournamentStatus::Active;
        let b = db.update_tournament(&b).unwrap();

        assert!(b.is_active);
        assert_eq!(b.status, TournamentStatus::Active);
        assert!(!db.get_tournament(a.id).unwrap().is_active);
    }

    #[test]
    fn test_failed_activation_rolls_back_demotion() {
        let mut db = Database::open_in_memory().unwrap();
        let a = db
            .create_tournament(&NewTournament::new("A", 2024, "Links").active())
            .unwrap();

        let err = db.activate_tournament(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(db.get_tournament(a.id).unwrap().is_active);

        let mut ghost = a.clone();
        ghost.id = Uuid::new_v4();
        assert!(db.update_tournament(&ghost).is_err());
        assert!(db.get_tournament(a.id).unwrap().is_active);
    }

    #[test]
    fn test_raw_second_active_row_is_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        db.create_tournament(&NewTournament::new("A", 2024, "Links").active())
            .unwrap();
        let b = db
            .create_tournament(&NewTournament::new("B", 2024, "Links"))
            .unwrap();

        let err: StoreError = db
            .connection()
            .execute(
                "UPDATE tournaments SET is_active = 1 WHERE id = ?1",
                [b.id.to_string()],
            )
            .unwrap_err()
            .into();
        assert!(err.is_duplicate());
    }

    #[test]
    fn test_status_and_deactivate() {
        let mut db = Database::open_in_memory().unwrap();
        let t = db
            .create_tournament(&NewTournament::new("A", 2024, "Links").active())
            .unwrap();

        let t = db
            .set_tournament_status(t.id, TournamentStatus::Completed)
            .unwrap();
        assert_eq!(t.status, TournamentStatus::Completed);

        let t = db.deactivate_tournament(t.id).unwrap();
        assert!(!t.is_active);
        assert!(db.active_tournament().unwrap().is_none());
    }

    #[test]
    fn test_invalid_year_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let err = db
            .create_tournament(&NewTournament::new("Ancient", 1850, "Links"))
            .unwrap_err();
        assert!(err.is_validation());
    }
}
