//! Preset queries.

use std::collections::BTreeMap;

use novabridge_core::{PresetChannel, SonarPreset};
use rusqlite::types::Value;
use rusqlite::{Connection, Row, params};
use tracing::debug;

use crate::{DbError, DbResult, PresetDatabase};

/// Column names GG releases have used for the favorite flag.
const FAVORITE_COLUMNS: &[&str] = &["is_favorite", "favorite", "starred", "is_starred", "isfavorite"];

/// Preset ids are text in current releases but were integers in older ones.
fn id_from_value(value: Value) -> DbResult<String> {
    match value {
        Value::Text(text) => Ok(text),
        Value::Integer(id) => Ok(id.to_string()),
        other => Err(DbError::InvalidValue { column: "id", value: format!("{other:?}") }),
    }
}

fn preset_from_row(row: &Row<'_>) -> rusqlite::Result<(Value, String, i64)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn into_preset((id, name, vad): (Value, String, i64)) -> DbResult<SonarPreset> {
    let channel = PresetChannel::from_vad(vad)
        .ok_or_else(|| DbError::InvalidValue { column: "vad", value: vad.to_string() })?;
    Ok(SonarPreset { id: id_from_value(id)?, name, channel })
}

fn query_presets(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> DbResult<Vec<SonarPreset>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, preset_from_row)?.collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(into_preset).collect()
}

/// Find the favorite column in `configs`, if this release has one.
fn favorite_column(conn: &Connection) -> DbResult<Option<String>> {
    let mut stmt = conn.prepare("PRAGMA table_info(configs)")?;
    let columns = stmt.query_map([], |row| row.get::<_, String>(1))?.collect::<Result<Vec<_>, _>>()?;

    Ok(FAVORITE_COLUMNS.iter().find_map(|candidate| {
        columns.iter().find(|column| column.eq_ignore_ascii_case(candidate)).cloned()
    }))
}

impl PresetDatabase {
    /// All presets of a channel, ordered by name (case-insensitive).
    ///
    /// # Errors
    /// Returns an error if the database is missing or the query fails.
    pub fn list_presets(&self, channel: PresetChannel) -> DbResult<Vec<SonarPreset>> {
        let conn = self.connect()?;
        query_presets(
            &conn,
            r"SELECT id, name, vad FROM configs
              WHERE vad = ?
              ORDER BY name COLLATE NOCASE",
            params![channel.vad()],
        )
    }

    /// Favorite presets of a channel. Empty when the store has no favorite column.
    ///
    /// # Errors
    /// Returns an error if the database is missing or the query fails.
    pub fn list_favorite_presets(&self, channel: PresetChannel) -> DbResult<Vec<SonarPreset>> {
        let conn = self.connect()?;
        let Some(column) = favorite_column(&conn)? else {
            debug!("Sonar database has no favorite column");
            return Ok(Vec::new());
        };

        // The column name comes from the schema, never from the caller.
        let sql = format!(
            r#"SELECT id, name, vad FROM configs
               WHERE vad = ? AND "{column}" IN (1, '1', 'true')
               ORDER BY name COLLATE NOCASE"#
        );
        query_presets(&conn, &sql, params![channel.vad()])
    }

    /// Favorite presets for every preset channel.
    ///
    /// # Errors
    /// Returns an error if the database is missing or a query fails.
    pub fn favorite_presets_by_channel(
        &self,
    ) -> DbResult<BTreeMap<PresetChannel, Vec<SonarPreset>>> {
        PresetChannel::ALL
            .into_iter()
            .map(|channel| Ok((channel, self.list_favorite_presets(channel)?)))
            .collect()
    }

    /// The preset currently selected for a channel.
    ///
    /// # Errors
    /// Returns an error if the database is missing or the query fails.
    pub fn selected_preset(&self, channel: PresetChannel) -> DbResult<Option<SonarPreset>> {
        let conn = self.connect()?;
        let presets = query_presets(
            &conn,
            r"SELECT c.id, c.name, c.vad
              FROM selected_config s
              JOIN configs c ON c.id = s.config_id
              WHERE s.vad = ?
              LIMIT 1",
            params![channel.vad()],
        )?;
        Ok(presets.into_iter().next())
    }

    /// Find a preset of a channel by name (case-insensitive).
    ///
    /// # Errors
    /// Returns an error if the database is missing or the query fails.
    pub fn find_preset_by_name(
        &self,
        channel: PresetChannel,
        name: &str,
    ) -> DbResult<Option<SonarPreset>> {
        Ok(self.list_presets(channel)?.into_iter().find(|preset| preset.name_matches(name)))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::create_store;
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    fn test_db(favorite_column: Option<&str>) -> (TempDir, PresetDatabase) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.db");
        create_store(&path, favorite_column);
        (dir, PresetDatabase::new(path))
    }

    fn names(presets: &[SonarPreset]) -> Vec<&str> {
        presets.iter().map(|preset| preset.name.as_str()).collect()
    }

    #[test]
    fn test_list_presets_ordered_by_name() {
        let (_dir, db) = test_db(Some("is_favorite"));

        let presets = db.list_presets(PresetChannel::Gaming).unwrap();

        assert_eq!(names(&presets), ["Flat", "Footsteps"]);
        assert_eq!(presets[1].id, "id_1");
        assert_eq!(presets[1].channel, PresetChannel::Gaming);
        assert!(db.list_presets(PresetChannel::Aux).unwrap().is_empty());
    }

    #[test]
    fn test_favorites_detect_column() {
        let (_dir, db) = test_db(Some("Starred"));

        assert_eq!(names(&db.list_favorite_presets(PresetChannel::Gaming).unwrap()), ["Footsteps"]);
        // String '1' counts as favorite
        assert_eq!(names(&db.list_favorite_presets(PresetChannel::Chat).unwrap()), ["podcast"]);
    }

    #[test]
    fn test_favorites_without_column_are_empty() {
        let (_dir, db) = test_db(None);

        assert!(db.list_favorite_presets(PresetChannel::Gaming).unwrap().is_empty());
    }

    #[test]
    fn test_favorites_by_channel_covers_all_channels() {
        let (_dir, db) = test_db(Some("favorite"));

        let by_channel = db.favorite_presets_by_channel().unwrap();

        assert_eq!(by_channel.len(), PresetChannel::ALL.len());
        assert_eq!(names(&by_channel[&PresetChannel::Gaming]), ["Footsteps"]);
        assert!(by_channel[&PresetChannel::Media].is_empty());
    }

    #[test]
    fn test_selected_preset() {
        let (_dir, db) = test_db(Some("is_favorite"));

        let selected = db.selected_preset(PresetChannel::Gaming).unwrap().unwrap();

        assert_eq!(selected.id, "id_1");
        assert_eq!(selected.name, "Footsteps");
        assert_eq!(db.selected_preset(PresetChannel::Chat).unwrap(), None);
    }

    #[test]
    fn test_find_preset_by_name() {
        let (_dir, db) = test_db(None);

        let found = db.find_preset_by_name(PresetChannel::Gaming, "footsteps").unwrap();

        assert_eq!(found.map(|preset| preset.id).as_deref(), Some("id_1"));
        assert_eq!(db.find_preset_by_name(PresetChannel::Gaming, "nope").unwrap(), None);
    }

    #[test]
    fn test_integer_ids_are_stringified() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE configs (id INTEGER, name TEXT, vad INTEGER);
             INSERT INTO configs VALUES (42, 'Legacy', 6);",
        )
        .unwrap();
        drop(conn);

        let presets = PresetDatabase::new(path).list_presets(PresetChannel::Master).unwrap();

        assert_eq!(presets[0].id, "42");
    }

    #[test]
    fn test_unknown_vad_is_invalid_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE configs (id TEXT, name TEXT, vad INTEGER);
             CREATE TABLE selected_config (config_id TEXT, vad INTEGER);
             INSERT INTO configs VALUES ('x', 'Broken', 9);
             INSERT INTO selected_config VALUES ('x', 1);",
        )
        .unwrap();
        drop(conn);

        let err = PresetDatabase::new(path).selected_preset(PresetChannel::Gaming).unwrap_err();

        assert_matches!(err, DbError::InvalidValue { column: "vad", .. });
    }
}
