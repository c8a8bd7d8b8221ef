use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::warn;
use uuid::Uuid;

use super::{now, uuid_column, Database};
use crate::error::{Result, StoreError};
use crate::models::{Hole, NewHole};
use crate::schema::tables::HOLES;
use crate::validation;

pub(super) const HOLE_COLUMNS: &str =
    "id, tournament_id, hole_number, par, stroke_index, created_at, updated_at";

pub(super) fn hole_from_row(row: &Row) -> rusqlite::Result<Hole> {
    Ok(Hole {
        id: uuid_column(row, "id")?,
        tournament_id: uuid_column(row, "tournament_id")?,
        hole_number: row.get("hole_number")?,
        par: row.get("par")?,
        stroke_index: row.get("stroke_index")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn insert_hole(conn: &Connection, tournament_id: Uuid, new: &NewHole) -> Result<Hole> {
    validation::new_hole(new).map_err(StoreError::Validation)?;

    let id = Uuid::new_v4();
    let ts = now();
    conn.execute(
        "INSERT INTO holes (id, tournament_id, hole_number, par, stroke_index, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            id.to_string(),
            tournament_id.to_string(),
            new.hole_number,
            new.par,
            new.stroke_index,
            ts
        ],
    )?;

    fetch_hole(conn, id)
}

fn fetch_hole(conn: &Connection, id: Uuid) -> Result<Hole> {
    let sql = format!("SELECT {} FROM holes WHERE id = ?1", HOLE_COLUMNS);
    conn.query_row(&sql, [id.to_string()], hole_from_row)
        .optional()?
        .ok_or_else(|| StoreError::not_found("hole", id))
}

fn shared_stroke_indexes(conn: &Connection, tournament_id: Uuid) -> Result<Vec<u8>> {
    let mut stmt = conn.prepare(
        "SELECT stroke_index FROM holes WHERE tournament_id = ?1
         GROUP BY stroke_index HAVING COUNT(*) > 1
         ORDER BY stroke_index",
    )?;
    let shared = stmt
        .query_map([tournament_id.to_string()], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<u8>>>()?;
    Ok(shared)
}

/// Stroke indexes are only range-checked, so a course may end up with two
/// holes sharing one. Storage allows it; make it visible in the logs.
fn warn_on_shared_stroke_index(conn: &Connection, tournament_id: Uuid) -> Result<()> {
    let shared = shared_stroke_indexes(conn, tournament_id)?;
    if !shared.is_empty() {
        warn!(%tournament_id, ?shared, "stroke index used by more than one hole");
    }
    Ok(())
}

impl Database {
    pub fn add_hole(&self, tournament_id: Uuid, new: &NewHole) -> Result<Hole> {
        let hole = insert_hole(&self.conn, tournament_id, new)?;
        warn_on_shared_stroke_index(&self.conn, tournament_id)?;
        Ok(hole)
    }

    /// Insert several holes at once; either all are stored or none are
    pub fn add_holes(&mut self, tournament_id: Uuid, holes: &[NewHole]) -> Result<Vec<Hole>> {
        let tx = self.write_transaction()?;
        let stored = holes
            .iter()
            .map(|new| insert_hole(&tx, tournament_id, new))
            .collect::<Result<Vec<_>>>()?;
        warn_on_shared_stroke_index(&tx, tournament_id)?;
        tx.commit()?;
        Ok(stored)
    }

    pub fn get_hole(&self, id: Uuid) -> Result<Hole> {
        fetch_hole(&self.conn, id)
    }

    pub fn hole_by_number(&self, tournament_id: Uuid, hole_number: u8) -> Result<Hole> {
        let sql = format!(
            "SELECT {} FROM holes WHERE tournament_id = ?1 AND hole_number = ?2",
            HOLE_COLUMNS
        );
        self.conn
            .query_row(&sql, params![tournament_id.to_string(), hole_number], hole_from_row)
            .optional()?
            .ok_or_else(|| StoreError::NotFound {
                entity: "hole",
                id: format!("{} #{}", tournament_id, hole_number),
            })
    }

    /// Holes of a tournament in playing order
    pub fn list_holes(&self, tournament_id: Uuid) -> Result<Vec<Hole>> {
        let sql = format!(
            "SELECT {} FROM holes WHERE tournament_id = ?1 ORDER BY hole_number",
            HOLE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let holes = stmt
            .query_map([tournament_id.to_string()], hole_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(holes)
    }

    pub fn update_hole(&self, hole: &Hole) -> Result<Hole> {
        validation::new_hole(&NewHole::new(hole.hole_number, hole.par, hole.stroke_index))
            .map_err(StoreError::Validation)?;

        let updated = self.conn.execute(
            "UPDATE holes SET hole_number = ?2, par = ?3, stroke_index = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                hole.id.to_string(),
                hole.hole_number,
                hole.par,
                hole.stroke_index,
                now()
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found("hole", hole.id));
        }

        warn_on_shared_stroke_index(&self.conn, hole.tournament_id)?;
        self.get_hole(hole.id)
    }

    /// Remove a hole and every score recorded on it
    pub fn delete_hole(&self, id: Uuid) -> Result<()> {
        self.delete_by_id(&HOLES, "hole", id)
    }

    /// Stroke indexes assigned to more than one hole of the tournament
    pub fn duplicate_stroke_indexes(&self, tournament_id: Uuid) -> Result<Vec<u8>> {
        shared_stroke_indexes(&self.conn, tournament_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewTournament;

    fn setup() -> (Database, Uuid) {
        let mut db = Database::open_in_memory().unwrap();
        let t = db
            .create_tournament(&NewTournament::new("Open", 2024, "Links"))
            .unwrap();
        (db, t.id)
    }

    #[test]
    fn test_hole_number_range() {
        let (db, tid) = setup();
        let err = db.add_hole(tid, &NewHole::new(19, 4, 1)).unwrap_err();
        assert!(err.is_validation());

        for n in 1..=18 {
            db.add_hole(tid, &NewHole::new(n, 4, n)).unwrap();
        }
        assert_eq!(db.list_holes(tid).unwrap().len(), 18);
    }

    #[test]
    fn test_duplicate_hole_number_rejected() {
        let (db, tid) = setup();
        let first = db.add_hole(tid, &NewHole::new(7, 3, 15)).unwrap();

        let err = db.add_hole(tid, &NewHole::new(7, 5, 2)).unwrap_err();
        assert!(err.is_duplicate());

        let holes = db.list_holes(tid).unwrap();
        assert_eq!(holes, vec![first]);
    }

    #[test]
    fn test_add_holes_is_all_or_nothing() {
        let (mut db, tid) = setup();
        let batch = [NewHole::new(1, 4, 5), NewHole::new(2, 5, 1), NewHole::new(2, 3, 9)];
        assert!(db.add_holes(tid, &batch).is_err());
        assert!(db.list_holes(tid).unwrap().is_empty());

        let stored = db.add_holes(tid, &batch[..2]).unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn test_shared_stroke_index_is_permitted_and_reported() {
        let (db, tid) = setup();
        db.add_hole(tid, &NewHole::new(1, 4, 3)).unwrap();
        db.add_hole(tid, &NewHole::new(2, 4, 3)).unwrap();
        db.add_hole(tid, &NewHole::new(3, 4, 4)).unwrap();

        assert_eq!(db.duplicate_stroke_indexes(tid).unwrap(), vec![3]);
    }

    #[test]
    fn test_unknown_tournament_is_foreign_key_error() {
        let (db, _) = setup();
        let err = db.add_hole(Uuid::new_v4(), &NewHole::new(1, 4, 1)).unwrap_err();
        assert!(matches!(err, StoreError::ForeignKey(_)));
    }

    #[test]
    fn test_update_hole_checks_par() {
        let (db, tid) = setup();
        let mut hole = db.add_hole(tid, &NewHole::new(1, 4, 1)).unwrap();
        hole.par = 6;
        assert!(db.update_hole(&hole).unwrap_err().is_validation());

        hole.par = 5;
        assert_eq!(db.update_hole(&hole).unwrap().par, 5);
        assert_eq!(db.hole_by_number(tid, 1).unwrap().par, 5);
    }
}
