//! Row types for every table in the store.
//!
//! `New*` structs carry the caller-supplied fields of an insert; the full
//! structs mirror a stored row. Updates take a full struct back, so a
//! caller reads a row, mutates the public fields and writes it again.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub handicap_index: f64,
    pub handicap_reference: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewPlayer {
    pub name: String,
    pub handicap_index: f64,
    pub handicap_reference: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
}

impl NewPlayer {
    pub fn new(name: impl Into<String>, handicap_index: f64) -> Self {
        Self {
            name: name.into(),
            handicap_index,
            ..Default::default()
        }
    }
}

/// Tournament lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    #[default]
    Upcoming,
    Active,
    Completed,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStatus::Upcoming => "upcoming",
            TournamentStatus::Active => "active",
            TournamentStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(TournamentStatus::Upcoming),
            "active" => Ok(TournamentStatus::Active),
            "completed" => Ok(TournamentStatus::Completed),
            other => Err(format!("Unknown tournament status: {}", other)),
        }
    }
}

impl ToSql for TournamentStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TournamentStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: Uuid,
    pub name: String,
    pub year: i32,
    pub course_name: String,
    pub slope_rating: f64,
    pub course_rating: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub status: TournamentStatus,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTournament {
    pub name: String,
    pub year: i32,
    pub course_name: String,
    pub slope_rating: f64,
    pub course_rating: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub status: TournamentStatus,
    pub logo_url: Option<String>,
}

/// Neutral slope rating; a course of average difficulty for a bogey golfer.
pub const STANDARD_SLOPE: f64 = 113.0;

impl NewTournament {
    pub fn new(name: impl Into<String>, year: i32, course_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            year,
            course_name: course_name.into(),
            slope_rating: STANDARD_SLOPE,
            course_rating: 72.0,
            start_date: None,
            end_date: None,
            is_active: false,
            status: TournamentStatus::Upcoming,
            logo_url: None,
        }
    }

    pub fn active(self) -> Self {
        Self {
            is_active: true,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hole {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub hole_number: u8,
    pub par: u8,
    pub stroke_index: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHole {
    pub hole_number: u8,
    pub par: u8,
    pub stroke_index: u8,
}

impl NewHole {
    pub fn new(hole_number: u8, par: u8, stroke_index: u8) -> Self {
        Self {
            hole_number,
            par,
            stroke_index,
        }
    }
}

/// A player's entry into a tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentPlayer {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub player_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub group_number: u32,
    pub name: Option<String>,
    pub tee_time: Option<NaiveTime>,
    pub pin: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGroup {
    pub group_number: u32,
    pub name: Option<String>,
    pub tee_time: Option<NaiveTime>,
    /// Generated when absent
    pub pin: Option<String>,
}

impl NewGroup {
    pub fn new(group_number: u32) -> Self {
        Self {
            group_number,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPlayer {
    pub id: Uuid,
    pub group_id: Uuid,
    pub player_id: Uuid,
    pub is_scorer: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub player_id: Uuid,
    pub hole_id: Uuid,
    pub gross_score: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSetting {
    pub id: Uuid,
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
