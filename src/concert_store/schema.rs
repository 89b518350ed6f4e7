//! SQLite schema for the concerts database.
//!
//! `note.user_id` points into the user database, so it is indexed but carries
//! no foreign key.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
    DEFAULT_TIMESTAMP_MS,
};
use rusqlite::Connection;

const ARTIST_TABLE: Table = Table {
    name: "artist",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
};

const VENUE_TABLE: Table = Table {
    name: "venue",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("city", &SqlType::Text, non_null = true),
        sqlite_column!("state", &SqlType::Text, non_null = true),
    ],
    indices: &[],
};

const ARTIST_FK: ForeignKey = ForeignKey {
    foreign_table: "artist",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const VENUE_FK: ForeignKey = ForeignKey {
    foreign_table: "venue",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const SHOW_TABLE: Table = Table {
    name: "show",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ARTIST_FK)
        ),
        sqlite_column!(
            "venue_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&VENUE_FK)
        ),
        sqlite_column!("show_date", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_show_artist", "artist_id"),
        ("idx_show_venue", "venue_id"),
    ],
};

const SHOW_FK: ForeignKey = ForeignKey {
    foreign_table: "show",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const NOTE_COLUMNS: &[Column<'static, &'static str>] = &[
    sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
    sqlite_column!("user_id", &SqlType::Integer, non_null = true),
    sqlite_column!(
        "show_id",
        &SqlType::Integer,
        non_null = true,
        foreign_key = Some(&SHOW_FK)
    ),
    sqlite_column!("title", &SqlType::Text, non_null = true),
    sqlite_column!("text", &SqlType::Text, non_null = true),
    sqlite_column!("photo", &SqlType::Text),
    sqlite_column!(
        "posted_date",
        &SqlType::Integer,
        non_null = true,
        default_value = Some(DEFAULT_TIMESTAMP_MS)
    ),
];

const NOTE_TABLE_V0: Table = Table {
    name: "note",
    columns: NOTE_COLUMNS,
    indices: &[("idx_note_show", "show_id")],
};

const NOTE_TABLE_V1: Table = Table {
    name: "note",
    columns: NOTE_COLUMNS,
    indices: &[
        ("idx_note_show", "show_id"),
        ("idx_note_user", "user_id"),
    ],
};

fn migrate_v0_to_v1(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("CREATE INDEX idx_note_user ON note(user_id);", [])?;
    Ok(())
}

pub const CONCERT_VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 0,
        tables: &[ARTIST_TABLE, VENUE_TABLE, SHOW_TABLE, NOTE_TABLE_V0],
        migration: None,
    },
    VersionedSchema {
        version: 1,
        tables: &[ARTIST_TABLE, VENUE_TABLE, SHOW_TABLE, NOTE_TABLE_V1],
        migration: Some(migrate_v0_to_v1),
    },
];
