use bevy::prelude::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::*;
use crate::stats::{DayStats, PlayerStats};

// ═══════════════════════════════════════════════════════════════════════
// PUBLIC TYPES
// ═══════════════════════════════════════════════════════════════════════

pub const SAVE_VERSION: u32 = 1;
pub const SAVE_FILE: &str = "save.json";
pub const PREFERENCES_FILE: &str = "preferences.json";

/// Where save and preference files live. Insert one before adding the
/// plugin to redirect it (tests do).
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct SaveLocation {
    pub dir: PathBuf,
}

impl Default for SaveLocation {
    fn default() -> Self {
        Self {
            dir: saves_directory(),
        }
    }
}

impl SaveLocation {
    pub fn save_path(&self) -> PathBuf {
        self.dir.join(SAVE_FILE)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.dir.join(PREFERENCES_FILE)
    }
}

/// Only the stat stores are persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveFile {
    pub version: u32,
    pub player_stats: PlayerStats,
    pub day_stats: DayStats,
}

// ═══════════════════════════════════════════════════════════════════════
// EVENTS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Event, Debug, Clone, Copy, Default)]
pub struct SaveRequestEvent;

#[derive(Event, Debug, Clone, Copy, Default)]
pub struct LoadRequestEvent;

/// Sent by SavePlugin after a save completes (success or failure).
#[derive(Event, Debug, Clone)]
pub struct SaveCompleteEvent {
    pub success: bool,
    pub error_message: Option<String>,
}

/// Sent by SavePlugin after a load completes.
#[derive(Event, Debug, Clone)]
pub struct LoadCompleteEvent {
    pub success: bool,
    pub error_message: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct SavePlugin;

impl Plugin for SavePlugin {
    fn build(&self, app: &mut App) {
        let location = app
            .world()
            .get_resource::<SaveLocation>()
            .cloned()
            .unwrap_or_default();

        match read_preferences(&location.preferences_path()) {
            Ok(prefs) => {
                app.insert_resource(prefs);
            }
            Err(e) => {
                warn!("[Save] Preferences unreadable, using defaults: {}", e);
                app.init_resource::<Preferences>();
            }
        }

        app.insert_resource(location)
            .add_event::<SaveRequestEvent>()
            .add_event::<LoadRequestEvent>()
            .add_event::<SaveCompleteEvent>()
            .add_event::<LoadCompleteEvent>()
            .subscribe(autosave_on_calendar_end)
            .add_systems(
                Update,
                (handle_save_request, handle_load_request, persist_preferences),
            );
    }
}

// ═══════════════════════════════════════════════════════════════════════
// FILESYSTEM HELPERS
// ═══════════════════════════════════════════════════════════════════════

fn saves_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));
    exe_dir.join("saves")
}

fn ensure_dir(dir: &Path) -> Result<(), std::io::Error> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Pretty JSON, written to a temp file first, then renamed into place.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    if let Some(dir) = path.parent() {
        ensure_dir(dir).map_err(|e| format!("Could not create {}: {}", dir.display(), e))?;
    }
    let json =
        serde_json::to_string_pretty(value).map_err(|e| format!("Serialization failed: {}", e))?;

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &json)
        .map_err(|e| format!("Write failed for {}: {}", tmp_path.display(), e))?;
    fs::rename(&tmp_path, path).map_err(|e| format!("Rename failed: {}", e))?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let json = fs::read_to_string(path)
        .map_err(|e| format!("Read failed for {}: {}", path.display(), e))?;
    serde_json::from_str(&json).map_err(|e| format!("Deserialization failed: {}", e))
}

// ═══════════════════════════════════════════════════════════════════════
// SAVE / LOAD LOGIC
// ═══════════════════════════════════════════════════════════════════════

pub fn write_save(path: &Path, player: &PlayerStats, day: &DayStats) -> Result<(), String> {
    let file = SaveFile {
        version: SAVE_VERSION,
        player_stats: player.clone(),
        day_stats: day.clone(),
    };
    write_json(path, &file)
}

pub fn read_save(path: &Path) -> Result<SaveFile, String> {
    if !path.exists() {
        return Err(format!("No save at {}", path.display()));
    }
    let file: SaveFile = read_json(path)?;

    // Version check: future versions can migrate here.
    if file.version != SAVE_VERSION {
        warn!(
            "[Save] Save has version {} but current version is {}. Attempting to load anyway.",
            file.version, SAVE_VERSION
        );
    }
    Ok(file)
}

/// A missing file is a first run, not an error.
pub fn read_preferences(path: &Path) -> Result<Preferences, String> {
    if !path.exists() {
        return Ok(Preferences::default());
    }
    read_json(path)
}

pub fn write_preferences(path: &Path, prefs: &Preferences) -> Result<(), String> {
    write_json(path, prefs)
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

fn handle_save_request(
    mut save_events: EventReader<SaveRequestEvent>,
    mut complete_events: EventWriter<SaveCompleteEvent>,
    location: Res<SaveLocation>,
    player: Res<PlayerStats>,
    day: Res<DayStats>,
) {
    // Several requests in one frame would write the same data.
    if save_events.read().count() == 0 {
        return;
    }

    let path = location.save_path();
    info!("[Save] Saving to {}...", path.display());
    match write_save(&path, &player, &day) {
        Ok(()) => {
            info!("[Save] Save succeeded.");
            complete_events.send(SaveCompleteEvent {
                success: true,
                error_message: None,
            });
        }
        Err(e) => {
            warn!("[Save] Save FAILED: {}", e);
            complete_events.send(SaveCompleteEvent {
                success: false,
                error_message: Some(e),
            });
        }
    }
}

fn handle_load_request(
    mut load_events: EventReader<LoadRequestEvent>,
    mut complete_events: EventWriter<LoadCompleteEvent>,
    location: Res<SaveLocation>,
    mut player: ResMut<PlayerStats>,
    mut day: ResMut<DayStats>,
) {
    if load_events.read().count() == 0 {
        return;
    }

    let path = location.save_path();
    info!("[Save] Loading from {}...", path.display());
    match read_save(&path) {
        Ok(file) => {
            player.restore_from(&file.player_stats);
            day.restore_from(&file.day_stats);
            info!(
                "[Save] Load succeeded: day {}, money {}",
                player.get(PlayerTracking::Day),
                money_to_string(player.get(PlayerTracking::Money))
            );
            complete_events.send(LoadCompleteEvent {
                success: true,
                error_message: None,
            });
        }
        Err(e) => {
            warn!("[Save] Load FAILED: {}", e);
            complete_events.send(LoadCompleteEvent {
                success: false,
                error_message: Some(e),
            });
        }
    }
}

fn persist_preferences(prefs: Res<Preferences>, location: Res<SaveLocation>) {
    if !prefs.is_changed() || prefs.is_added() {
        return;
    }
    match write_preferences(&location.preferences_path(), &prefs) {
        Ok(()) => debug!("[Save] Preferences written"),
        Err(e) => warn!("[Save] Preferences not written: {}", e),
    }
}

/// Autosave once the calendar has turned to the next day.
fn autosave_on_calendar_end(
    In(StateEnd(state)): In<StateEnd>,
    mut save_writer: EventWriter<SaveRequestEvent>,
) {
    if state == GameState::Calendar {
        info!("[Save] Autosaving at end of day");
        save_writer.send(SaveRequestEvent);
    }
}
