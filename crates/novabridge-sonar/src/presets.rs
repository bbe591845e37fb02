//! Preset store: reads presets from the GG database, selects them through Sonar.

use std::collections::BTreeMap;
use std::sync::Arc;

use novabridge_core::{PresetChannel, SonarPreset};
use novabridge_db::PresetDatabase;
use tracing::info;

use crate::client::SonarClient;
use crate::error::{SonarError, SonarResult};

pub struct PresetStore {
    db: PresetDatabase,
    client: Arc<SonarClient>,
}

impl PresetStore {
    #[must_use]
    pub fn new(db: PresetDatabase, client: Arc<SonarClient>) -> Self {
        Self { db, client }
    }

    #[must_use]
    pub fn database(&self) -> &PresetDatabase {
        &self.db
    }

    /// All presets of a channel, by name.
    ///
    /// # Errors
    /// Returns a config store error if the database cannot be read.
    pub fn list_presets(&self, channel: PresetChannel) -> SonarResult<Vec<SonarPreset>> {
        Ok(self.db.list_presets(channel)?)
    }

    /// Favorite presets of a channel.
    ///
    /// # Errors
    /// Returns a config store error if the database cannot be read.
    pub fn list_favorite_presets(&self, channel: PresetChannel) -> SonarResult<Vec<SonarPreset>> {
        Ok(self.db.list_favorite_presets(channel)?)
    }

    /// # Errors
    /// Returns a config store error if the database cannot be read.
    pub fn favorite_presets_by_channel(
        &self,
    ) -> SonarResult<BTreeMap<PresetChannel, Vec<SonarPreset>>> {
        Ok(self.db.favorite_presets_by_channel()?)
    }

    /// # Errors
    /// Returns a config store error if the database cannot be read.
    pub fn selected_preset(&self, channel: PresetChannel) -> SonarResult<Option<SonarPreset>> {
        Ok(self.db.selected_preset(channel)?)
    }

    /// Select a preset by id.
    ///
    /// # Errors
    /// Returns an error if Sonar is unreachable or rejects the selection.
    pub fn select_preset(&self, preset_id: &str) -> SonarResult<()> {
        self.client.select_preset(preset_id)
    }

    /// Select a channel's preset by name (case-insensitive) and return it.
    ///
    /// # Errors
    /// Returns [`SonarError::InvalidArgument`] if the channel has no preset
    /// with that name, or the selection error.
    pub fn select_preset_by_name(
        &self,
        channel: PresetChannel,
        name: &str,
    ) -> SonarResult<SonarPreset> {
        let preset = self.db.find_preset_by_name(channel, name)?.ok_or_else(|| {
            SonarError::InvalidArgument(format!(
                "no preset named '{name}' for channel '{}'",
                channel.display_name()
            ))
        })?;
        self.client.select_preset(&preset.id)?;
        info!(id = %preset.id, name = %preset.name, channel = %channel, "Selected preset");
        Ok(preset)
    }
}
