use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::PathBuf,
};

use serde_json::{Map, Value};

use crate::{FollowMeError, Mode, ModeStates, Result, SequenceState, Settings};

/// Storage key of the settings document.
pub const SETTINGS_KEY: &str = "followMeAppSettings";
/// Storage key of the per-mode state document.
pub const STATE_KEY: &str = "followMeAppState";

/// String key/value storage, the shape of browser-local storage.
pub trait Storage {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Volatile storage used by tests and by front ends that opt out of
/// persistence.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an entry without going through the trainer.
    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Stores every key as `<key>.json` inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Uses `root` as the storage directory, creating it when missing.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path(key)) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

/// Everything the persistent store hands back on load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub settings: Settings,
    pub states: ModeStates,
}

/// Reads and writes the two persisted documents over a [`Storage`] backend.
#[derive(Debug)]
pub struct PersistentStore<S> {
    storage: S,
    saves: usize,
}

impl<S: Storage> PersistentStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage, saves: 0 }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Number of successful [`save`](Self::save) calls so far.
    pub fn saves(&self) -> usize {
        self.saves
    }

    /// Loads both documents merged over the defaults. Unreadable or corrupted
    /// data is wiped and replaced by defaults.
    pub fn load(&mut self) -> Snapshot {
        match self.try_load() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(%err, "persisted state is unreadable, falling back to defaults");
                self.wipe();
                Snapshot::default()
            }
        }
    }

    fn try_load(&self) -> Result<Snapshot> {
        let settings = match self.storage.read(SETTINGS_KEY)? {
            Some(raw) => load_settings(&raw)?,
            None => Settings::default(),
        };
        let states = match self.storage.read(STATE_KEY)? {
            Some(raw) => load_states(&raw)?,
            None => ModeStates::default(),
        };
        Ok(Snapshot { settings, states })
    }

    fn wipe(&mut self) {
        for key in [SETTINGS_KEY, STATE_KEY] {
            if let Err(err) = self.storage.remove(key) {
                tracing::warn!(%err, key, "failed to remove corrupted entry");
            }
        }
    }

    /// Writes both documents.
    pub fn save(&mut self, settings: &Settings, states: &ModeStates) -> Result<()> {
        let settings = serde_json::to_string(settings)?;
        let states = serde_json::to_string(states)?;
        self.storage.write(SETTINGS_KEY, &settings)?;
        self.storage.write(STATE_KEY, &states)?;
        self.saves += 1;
        Ok(())
    }

    /// Removes both documents.
    pub fn clear(&mut self) -> Result<()> {
        self.storage.remove(SETTINGS_KEY)?;
        self.storage.remove(STATE_KEY)
    }
}

fn parse_object(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str(raw)? {
        Value::Object(map) => Ok(map),
        _ => Err(FollowMeError::msg("persisted document is not a JSON object")),
    }
}

/// Overlays `loaded` on top of `defaults`, key by key.
fn shallow_merge(defaults: Value, loaded: Map<String, Value>) -> Result<Value> {
    let Value::Object(mut merged) = defaults else {
        return Err(FollowMeError::msg("defaults must serialize to a JSON object"));
    };
    merged.extend(loaded);
    Ok(Value::Object(merged))
}

fn load_settings(raw: &str) -> Result<Settings> {
    let mut loaded = parse_object(raw)?;
    for key in Settings::RETIRED_KEYS {
        loaded.remove(*key);
    }
    let merged = shallow_merge(serde_json::to_value(Settings::default())?, loaded)?;
    let mut settings: Settings = serde_json::from_value(merged)?;
    settings.normalize();
    Ok(settings)
}

fn load_states(raw: &str) -> Result<ModeStates> {
    let mut loaded = parse_object(raw)?;
    for key in ModeStates::RETIRED_KEYS {
        loaded.remove(*key);
    }

    let mut states = ModeStates::default();
    for mode in Mode::ALL {
        let Some(entry) = loaded.remove(mode.key()) else {
            continue;
        };
        let Value::Object(entry) = entry else {
            return Err(FollowMeError::msg(format!("state of `{mode}` is not an object")));
        };
        let merged = shallow_merge(serde_json::to_value(SequenceState::initial(mode))?, entry)?;
        let mut state: SequenceState = serde_json::from_value(merged)?;
        state.normalize(mode);
        *states.get_mut(mode) = state;
    }
    Ok(states)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn read(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn write(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(FollowMeError::msg("quota exceeded"))
        }

        fn remove(&mut self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn empty_storage_loads_defaults() {
        let mut store = PersistentStore::new(MemoryStorage::new());
        assert_eq!(store.load(), Snapshot::default());
    }

    #[test]
    fn round_trips_settings_and_state() {
        let mut settings = Settings::default();
        settings.current_mode = Mode::Piano;
        settings.set_speed(Mode::Piano, 1.25);
        settings.chunk_size = 2;

        let mut states = ModeStates::default();
        states.bananas.set_sequence_count(2);
        states.bananas.push("4", 25).unwrap();
        states.bananas.push("7", 25).unwrap();
        states.rounds15.push("12", 1).unwrap();
        states.rounds15.advance_round();

        let mut store = PersistentStore::new(MemoryStorage::new());
        store.save(&settings, &states).unwrap();
        assert_eq!(store.saves(), 1);

        let mut reloaded = PersistentStore::new(store.storage().clone());
        let snapshot = reloaded.load();
        assert_eq!(snapshot.settings, settings);
        assert_eq!(snapshot.states, states);
    }

    #[test]
    fn merges_missing_fields_and_prunes_retired_ones() {
        let storage = MemoryStorage::new()
            .with_entry(
                SETTINGS_KEY,
                r#"{"isDarkMode":false,"isFollowsAutoplayEnabled":true,"currentMode":"follows"}"#,
            )
            .with_entry(
                STATE_KEY,
                r#"{"piano":{"sequences":[["C","D"]],"nextSequenceIndex":2},"follows":{"sequences":[]}}"#,
            );
        let mut store = PersistentStore::new(storage);
        let snapshot = store.load();

        assert!(!snapshot.settings.dark_mode);
        assert_eq!(snapshot.settings.current_mode, Mode::Bananas);
        assert_eq!(snapshot.settings.chunk_size, 3);
        assert_eq!(snapshot.states.piano.sequences.len(), 4);
        assert_eq!(snapshot.states.piano.sequences[0], vec!["C", "D"]);
        assert_eq!(snapshot.states.piano.sequence_count, 1);
        assert_eq!(snapshot.states.rounds15, SequenceState::initial(Mode::Rounds15));

        store
            .save(&snapshot.settings, &snapshot.states)
            .unwrap();
        let saved = store.storage().get(SETTINGS_KEY).unwrap();
        assert!(!saved.contains("isFollowsAutoplayEnabled"));
        assert!(!store.storage().get(STATE_KEY).unwrap().contains("follows"));
    }

    #[test]
    fn corrupted_documents_are_wiped() {
        let storage = MemoryStorage::new()
            .with_entry(SETTINGS_KEY, "{not json")
            .with_entry(STATE_KEY, "{}");
        let mut store = PersistentStore::new(storage);

        assert_eq!(store.load(), Snapshot::default());
        assert!(store.storage().get(SETTINGS_KEY).is_none());
        assert!(store.storage().get(STATE_KEY).is_none());
    }

    #[test]
    fn wrongly_typed_fields_count_as_corruption() {
        let storage =
            MemoryStorage::new().with_entry(SETTINGS_KEY, r#"{"followsChunkSize":"big"}"#);
        let mut store = PersistentStore::new(storage);

        assert_eq!(store.load().settings, Settings::default());
        assert!(store.storage().get(SETTINGS_KEY).is_none());
    }

    #[test]
    fn failed_saves_are_reported_and_not_counted() {
        let mut store = PersistentStore::new(BrokenStorage);
        let err = store
            .save(&Settings::default(), &ModeStates::default())
            .unwrap_err();
        assert!(format!("{err}").contains("quota"));
        assert_eq!(store.saves(), 0);
    }

    #[test]
    fn file_storage_reads_back_writes() {
        let dir = std::env::temp_dir().join(format!("follow-me-store-{}", std::process::id()));
        let mut storage = FileStorage::open(&dir).unwrap();

        assert_eq!(storage.read("missing").unwrap(), None);
        storage.write("key", "{\"a\":1}").unwrap();
        assert_eq!(storage.read("key").unwrap().as_deref(), Some("{\"a\":1}"));
        storage.remove("key").unwrap();
        storage.remove("key").unwrap();
        assert_eq!(storage.read("key").unwrap(), None);

        let _ = fs::remove_dir_all(&dir);
    }
}
