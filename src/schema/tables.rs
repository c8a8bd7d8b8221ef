//! Table schema definitions for the tournament scoring store

use super::types::*;

// =============================================================================
// Independent Tables (no FK dependencies)
// =============================================================================

pub static PLAYERS: TableSchema = TableSchema {
    name: "players",
    columns: &[
        Column::required("id", ColumnType::Uuid),
        Column::required("name", ColumnType::Text).checked("length(trim(name)) > 0"),
        Column::required("handicap_index", ColumnType::Real)
            .with_default("0.0")
            .checked("handicap_index BETWEEN -10.0 AND 54.0"),
        Column::new("handicap_reference", ColumnType::Text),
        Column::new("bio", ColumnType::Text),
        Column::new("photo_url", ColumnType::Text),
        Column::required("created_at", ColumnType::Timestamp),
        Column::required("updated_at", ColumnType::Timestamp),
    ],
    foreign_keys: &[],
    unique: &[],
    indexes: &[Index::on("idx_players_name", &["name"])],
};

pub static TOURNAMENTS: TableSchema = TableSchema {
    name: "tournaments",
    columns: &[
        Column::required("id", ColumnType::Uuid),
        Column::required("name", ColumnType::Text).checked("length(trim(name)) > 0"),
        Column::required("year", ColumnType::Integer).checked("year BETWEEN 1900 AND 2200"),
        Column::required("course_name", ColumnType::Text),
        Column::required("slope_rating", ColumnType::Real)
            .with_default("113")
            .checked("slope_rating BETWEEN 55 AND 155"),
        Column::required("course_rating", ColumnType::Real).with_default("72.0"),
        Column::new("start_date", ColumnType::Date),
        Column::new("end_date", ColumnType::Date),
        Column::required("is_active", ColumnType::Boolean)
            .with_default("0")
            .checked("is_active IN (0, 1)"),
        Column::required("status", ColumnType::Text)
            .with_default("'upcoming'")
            .checked("status IN ('upcoming', 'active', 'completed')"),
        Column::new("logo_url", ColumnType::Text),
        Column::required("created_at", ColumnType::Timestamp),
        Column::required("updated_at", ColumnType::Timestamp),
    ],
    foreign_keys: &[],
    unique: &[],
    // Storage-level backstop for the single active tournament rule
    indexes: &[Index::unique("idx_tournaments_single_active", &["is_active"])
        .filtered("is_active = 1")],
};

pub static APP_SETTINGS: TableSchema = TableSchema {
    name: "app_settings",
    columns: &[
        Column::required("id", ColumnType::Uuid),
        Column::required("key", ColumnType::Text),
        Column::required("value", ColumnType::Text).with_default("''"),
        Column::required("created_at", ColumnType::Timestamp),
        Column::required("updated_at", ColumnType::Timestamp),
    ],
    foreign_keys: &[],
    unique: &[&["key"]],
    indexes: &[],
};

// =============================================================================
// Tournament children
// =============================================================================

pub static HOLES: TableSchema = TableSchema {
    name: "holes",
    columns: &[
        Column::required("id", ColumnType::Uuid),
        Column::required("tournament_id", ColumnType::Uuid),
        Column::required("hole_number", ColumnType::Integer)
            .checked("hole_number BETWEEN 1 AND 18"),
        Column::required("par", ColumnType::Integer).checked("par BETWEEN 3 AND 5"),
        // Range only: two holes may share a stroke index
        Column::required("stroke_index", ColumnType::Integer)
            .checked("stroke_index BETWEEN 1 AND 18"),
        Column::required("created_at", ColumnType::Timestamp),
        Column::required("updated_at", ColumnType::Timestamp),
    ],
    foreign_keys: &[ForeignKey::new("tournament_id", "tournaments")],
    unique: &[&["tournament_id", "hole_number"]],
    indexes: &[],
};

pub static TOURNAMENT_PLAYERS: TableSchema = TableSchema {
    name: "tournament_players",
    columns: &[
        Column::required("id", ColumnType::Uuid),
        Column::required("tournament_id", ColumnType::Uuid),
        Column::required("player_id", ColumnType::Uuid),
        Column::required("created_at", ColumnType::Timestamp),
    ],
    foreign_keys: &[
        ForeignKey::new("tournament_id", "tournaments"),
        ForeignKey::new("player_id", "players"),
    ],
    unique: &[&["tournament_id", "player_id"]],
    indexes: &[Index::on("idx_tournament_players_player_id", &["player_id"])],
};

pub static GROUPS: TableSchema = TableSchema {
    name: "groups",
    columns: &[
        Column::required("id", ColumnType::Uuid),
        Column::required("tournament_id", ColumnType::Uuid),
        Column::required("group_number", ColumnType::Integer).checked("group_number >= 1"),
        Column::new("name", ColumnType::Text),
        Column::new("tee_time", ColumnType::Time),
        Column::required("pin", ColumnType::Text),
        Column::required("created_at", ColumnType::Timestamp),
        Column::required("updated_at", ColumnType::Timestamp),
    ],
    foreign_keys: &[ForeignKey::new("tournament_id", "tournaments")],
    unique: &[&["tournament_id", "group_number"]],
    indexes: &[Index::on("idx_groups_pin", &["tournament_id", "pin"])],
};

pub static GROUP_PLAYERS: TableSchema = TableSchema {
    name: "group_players",
    columns: &[
        Column::required("id", ColumnType::Uuid),
        Column::required("group_id", ColumnType::Uuid),
        Column::required("player_id", ColumnType::Uuid),
        Column::required("is_scorer", ColumnType::Boolean)
            .with_default("0")
            .checked("is_scorer IN (0, 1)"),
        Column::required("created_at", ColumnType::Timestamp),
    ],
    foreign_keys: &[
        ForeignKey::new("group_id", "groups"),
        ForeignKey::new("player_id", "players"),
    ],
    unique: &[&["group_id", "player_id"]],
    indexes: &[Index::on("idx_group_players_player_id", &["player_id"])],
};

pub static SCORES: TableSchema = TableSchema {
    name: "scores",
    columns: &[
        Column::required("id", ColumnType::Uuid),
        Column::required("tournament_id", ColumnType::Uuid),
        Column::required("player_id", ColumnType::Uuid),
        Column::required("hole_id", ColumnType::Uuid),
        Column::required("gross_score", ColumnType::Integer).checked("gross_score >= 1"),
        Column::required("created_at", ColumnType::Timestamp),
        Column::required("updated_at", ColumnType::Timestamp),
    ],
    foreign_keys: &[
        ForeignKey::new("tournament_id", "tournaments"),
        ForeignKey::new("player_id", "players"),
        ForeignKey::new("hole_id", "holes"),
    ],
    unique: &[&["tournament_id", "player_id", "hole_id"]],
    indexes: &[
        Index::on("idx_scores_player_id", &["player_id"]),
        Index::on("idx_scores_hole_id", &["hole_id"]),
    ],
};

/// All table schemas in dependency order
pub static ALL_TABLES: &[&TableSchema] = &[
    // Wave 1: No dependencies
    &PLAYERS,
    &TOURNAMENTS,
    &APP_SETTINGS,
    // Wave 2: Tournament children
    &HOLES,
    &GROUPS,
    // Junction tables
    &TOURNAMENT_PLAYERS,
    &GROUP_PLAYERS,
    &SCORES,
];

/// Get table schema by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}

/// Get all table names
pub fn table_names() -> Vec<&'static str> {
    ALL_TABLES.iter().map(|t| t.name).collect()
}
