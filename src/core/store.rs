use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use directories::ProjectDirs;
use redb::{Database, ReadableTable, TableDefinition};
use tracing::{info, warn};

use crate::config;
use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{CreateNoteRequest, Note, NoteType, NoteUpdate, WindowSize};

/// Redb table holding the note records.
/// Key: note id, Value: JSON-serialized Note
const NOTES_TABLE: TableDefinition<i64, &str> = TableDefinition::new("notes");

/// Redb table holding store-level counters.
const META_TABLE: TableDefinition<&str, i64> = TableDefinition::new("meta");

const NEXT_ID_KEY: &str = "next_id";

/// Storage trait for note persistence
trait NoteStorage: Send + Sync {
    fn save_note(&self, note: &Note) -> AppResult<()>;
    fn remove_note(&self, id: i64) -> AppResult<bool>;
    fn load_note(&self, id: i64) -> AppResult<Option<Note>>;
    fn load_notes(&self) -> AppResult<Vec<Note>>;
    fn next_id(&self) -> AppResult<i64>;
    fn save_next_id(&self, next: i64) -> AppResult<()>;
}

/// Redb-based storage implementation
struct RedbStorage {
    db: Mutex<Database>,
}

impl RedbStorage {
    fn new() -> AppResult<Self> {
        let proj_dirs = ProjectDirs::from("com", "stickyboard", "sticky-board")
            .ok_or_else(|| AppError::Storage("Failed to get project directories".to_string()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .map_err(|e| AppError::Storage(format!("Failed to create data directory: {}", e)))?;

        Self::open(&data_dir.join("notes.redb"))
    }

    fn open(path: &Path) -> AppResult<Self> {
        let db = Database::create(path)
            .map_err(|e| AppError::Storage(format!("Failed to open database: {}", e)))?;

        // Initialize tables so first reads see them
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| AppError::Storage(format!("Failed to begin write: {}", e)))?;
            {
                let _notes = write_txn
                    .open_table(NOTES_TABLE)
                    .map_err(|e| AppError::Storage(format!("Failed to open table: {}", e)))?;
                let _meta = write_txn
                    .open_table(META_TABLE)
                    .map_err(|e| AppError::Storage(format!("Failed to open table: {}", e)))?;
            }
            write_txn
                .commit()
                .map_err(|e| AppError::Storage(format!("Failed to commit: {}", e)))?;
        }

        Ok(Self { db: Mutex::new(db) })
    }

    fn lock_db(&self) -> std::sync::MutexGuard<'_, Database> {
        match self.db.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("[NoteStore] database mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl NoteStorage for RedbStorage {
    fn save_note(&self, note: &Note) -> AppResult<()> {
        let db = self.lock_db();
        let write_txn = db
            .begin_write()
            .map_err(|e| AppError::Storage(format!("Failed to begin write: {}", e)))?;
        {
            let mut table = write_txn
                .open_table(NOTES_TABLE)
                .map_err(|e| AppError::Storage(format!("Failed to open table: {}", e)))?;

            let serialized = serde_json::to_string(note)?;
            table
                .insert(note.id, serialized.as_str())
                .map_err(|e| AppError::Storage(format!("Failed to insert: {}", e)))?;
        }
        write_txn
            .commit()
            .map_err(|e| AppError::Storage(format!("Failed to commit: {}", e)))?;
        Ok(())
    }

    fn remove_note(&self, id: i64) -> AppResult<bool> {
        let db = self.lock_db();
        let write_txn = db
            .begin_write()
            .map_err(|e| AppError::Storage(format!("Failed to begin write: {}", e)))?;
        let removed = {
            let mut table = write_txn
                .open_table(NOTES_TABLE)
                .map_err(|e| AppError::Storage(format!("Failed to open table: {}", e)))?;
            let removed = table
                .remove(id)
                .map_err(|e| AppError::Storage(format!("Failed to remove: {}", e)))?
                .is_some();
            removed
        };
        write_txn
            .commit()
            .map_err(|e| AppError::Storage(format!("Failed to commit: {}", e)))?;
        Ok(removed)
    }

    fn load_note(&self, id: i64) -> AppResult<Option<Note>> {
        let db = self.lock_db();
        let read_txn = db
            .begin_read()
            .map_err(|e| AppError::Storage(format!("Failed to begin read: {}", e)))?;
        let table = read_txn
            .open_table(NOTES_TABLE)
            .map_err(|e| AppError::Storage(format!("Failed to open table: {}", e)))?;

        let entry = table
            .get(id)
            .map_err(|e| AppError::Storage(format!("Failed to read entry: {}", e)))?;

        match entry {
            Some(value) => {
                let note: Note = serde_json::from_str(value.value())?;
                Ok(Some(note))
            }
            None => Ok(None),
        }
    }

    fn load_notes(&self) -> AppResult<Vec<Note>> {
        let db = self.lock_db();
        let read_txn = db
            .begin_read()
            .map_err(|e| AppError::Storage(format!("Failed to begin read: {}", e)))?;
        let table = read_txn
            .open_table(NOTES_TABLE)
            .map_err(|e| AppError::Storage(format!("Failed to open table: {}", e)))?;

        let mut notes = Vec::new();
        let iter = table
            .iter()
            .map_err(|e| AppError::Storage(format!("Failed to create iterator: {}", e)))?;
        for entry in iter {
            let (_, value) =
                entry.map_err(|e| AppError::Storage(format!("Failed to read entry: {}", e)))?;
            let note: Note = serde_json::from_str(value.value())?;
            notes.push(note);
        }
        Ok(notes)
    }

    fn next_id(&self) -> AppResult<i64> {
        let db = self.lock_db();
        let read_txn = db
            .begin_read()
            .map_err(|e| AppError::Storage(format!("Failed to begin read: {}", e)))?;
        let table = read_txn
            .open_table(META_TABLE)
            .map_err(|e| AppError::Storage(format!("Failed to open table: {}", e)))?;

        let entry = table
            .get(NEXT_ID_KEY)
            .map_err(|e| AppError::Storage(format!("Failed to read entry: {}", e)))?;
        Ok(entry.map(|v| v.value()).unwrap_or(1))
    }

    fn save_next_id(&self, next: i64) -> AppResult<()> {
        let db = self.lock_db();
        let write_txn = db
            .begin_write()
            .map_err(|e| AppError::Storage(format!("Failed to begin write: {}", e)))?;
        {
            let mut table = write_txn
                .open_table(META_TABLE)
                .map_err(|e| AppError::Storage(format!("Failed to open table: {}", e)))?;
            table
                .insert(NEXT_ID_KEY, next)
                .map_err(|e| AppError::Storage(format!("Failed to insert: {}", e)))?;
        }
        write_txn
            .commit()
            .map_err(|e| AppError::Storage(format!("Failed to commit: {}", e)))?;
        Ok(())
    }
}

/// In-memory storage (fallback when the database cannot be opened, and the
/// storage used by tests)
struct InMemoryStorage {
    inner: Mutex<MemoryState>,
}

struct MemoryState {
    notes: Vec<Note>,
    next_id: i64,
}

impl InMemoryStorage {
    fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryState {
                notes: Vec::new(),
                next_id: 1,
            }),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl NoteStorage for InMemoryStorage {
    fn save_note(&self, note: &Note) -> AppResult<()> {
        let mut state = self.lock_state();
        match state.notes.iter_mut().find(|n| n.id == note.id) {
            Some(existing) => *existing = note.clone(),
            None => state.notes.push(note.clone()),
        }
        Ok(())
    }

    fn remove_note(&self, id: i64) -> AppResult<bool> {
        let mut state = self.lock_state();
        let before = state.notes.len();
        state.notes.retain(|n| n.id != id);
        Ok(state.notes.len() != before)
    }

    fn load_note(&self, id: i64) -> AppResult<Option<Note>> {
        let state = self.lock_state();
        Ok(state.notes.iter().find(|n| n.id == id).cloned())
    }

    fn load_notes(&self) -> AppResult<Vec<Note>> {
        let state = self.lock_state();
        Ok(state.notes.clone())
    }

    fn next_id(&self) -> AppResult<i64> {
        Ok(self.lock_state().next_id)
    }

    fn save_next_id(&self, next: i64) -> AppResult<()> {
        self.lock_state().next_id = next;
        Ok(())
    }
}

/// Durable note collection, source of truth across process restarts.
///
/// Every operation persists before returning; note counts are small and
/// human-paced, so synchronous durability wins over throughput.
pub struct NoteStore {
    storage: Arc<dyn NoteStorage>,
}

impl NoteStore {
    /// Open the store in the per-user data directory, falling back to a
    /// non-durable in-memory store if the database cannot be opened.
    pub fn new() -> Self {
        let storage: Arc<dyn NoteStorage> = match RedbStorage::new() {
            Ok(s) => Arc::new(s),
            Err(e) => {
                warn!("[NoteStore] failed to open database: {}, using in-memory fallback", e);
                Arc::new(InMemoryStorage::new())
            }
        };
        Self { storage }
    }

    /// Open a store backed by a database at an explicit path.
    pub fn open(path: &Path) -> AppResult<Self> {
        Ok(Self {
            storage: Arc::new(RedbStorage::open(path)?),
        })
    }

    /// Non-durable store; id assignment and defaults behave identically.
    pub fn in_memory() -> Self {
        Self {
            storage: Arc::new(InMemoryStorage::new()),
        }
    }

    pub fn get_all(&self) -> Vec<Note> {
        let mut notes = self.storage.load_notes().unwrap_or_else(|e| {
            warn!("[NoteStore] failed to load notes: {}", e);
            Vec::new()
        });
        notes.sort_by_key(|n| n.id);
        notes
    }

    pub fn get(&self, id: i64) -> Option<Note> {
        self.storage.load_note(id).unwrap_or_else(|e| {
            warn!("[NoteStore] failed to load note {}: {}", id, e);
            None
        })
    }

    /// Assign the next id, apply defaults, persist, and return the full
    /// record. Ids are strictly increasing and never reused; the counter is
    /// bumped in the same store so it survives restarts.
    pub fn create(&self, request: CreateNoteRequest) -> AppResult<Note> {
        let id = self.storage.next_id()?;
        let now = Utc::now();

        let note_type = request
            .note_type
            .unwrap_or_else(|| NoteType::infer(&request.content));
        let size = WindowSize::new(
            request.width.unwrap_or(config::DEFAULT_NOTE_SIZE),
            request.height.unwrap_or(config::DEFAULT_NOTE_SIZE),
        )
        .clamped();

        let note = Note {
            id,
            note_type,
            content: request.content,
            position_x: request.position_x.unwrap_or(config::DEFAULT_NOTE_POSITION),
            position_y: request.position_y.unwrap_or(config::DEFAULT_NOTE_POSITION),
            width: size.width,
            height: size.height,
            color: request.color,
            created_by: request.created_by,
            created_at: now,
            updated_at: now,
        };

        self.storage.save_note(&note)?;
        self.storage.save_next_id(id + 1)?;
        info!("[NoteStore] created note {}", id);
        Ok(note)
    }

    /// Merge partial fields into an existing record. Returns `None` for an
    /// unknown id; a deleted note racing with a late update is expected.
    pub fn update(&self, id: i64, updates: NoteUpdate) -> AppResult<Option<Note>> {
        let Some(mut note) = self.storage.load_note(id)? else {
            return Ok(None);
        };

        if let Some(content) = updates.content {
            note.note_type = updates
                .note_type
                .unwrap_or_else(|| NoteType::infer(&content));
            note.content = content;
        } else if let Some(note_type) = updates.note_type {
            note.note_type = note_type;
        }
        if let Some(x) = updates.position_x {
            note.position_x = x;
        }
        if let Some(y) = updates.position_y {
            note.position_y = y;
        }
        if updates.width.is_some() || updates.height.is_some() {
            let size = WindowSize::new(
                updates.width.unwrap_or(note.width),
                updates.height.unwrap_or(note.height),
            )
            .clamped();
            note.width = size.width;
            note.height = size.height;
        }
        if let Some(color) = updates.color {
            note.color = Some(color);
        }
        if let Some(created_by) = updates.created_by {
            note.created_by = Some(created_by);
        }
        note.updated_at = Utc::now();

        self.storage.save_note(&note)?;
        Ok(Some(note))
    }

    /// Remove a record. No-op (returns false) for unknown ids.
    pub fn delete(&self, id: i64) -> AppResult<bool> {
        let removed = self.storage.remove_note(id)?;
        if removed {
            info!("[NoteStore] deleted note {}", id);
        }
        Ok(removed)
    }

    /// Write-through target of overlay drags.
    pub fn update_position(&self, id: i64, x: i32, y: i32) -> AppResult<()> {
        let Some(mut note) = self.storage.load_note(id)? else {
            return Ok(());
        };
        note.position_x = x;
        note.position_y = y;
        note.updated_at = Utc::now();
        self.storage.save_note(&note)
    }

    /// Write-through target of overlay resizes; clamped before writing.
    pub fn update_size(&self, id: i64, width: u32, height: u32) -> AppResult<()> {
        let Some(mut note) = self.storage.load_note(id)? else {
            return Ok(());
        };
        let size = WindowSize::new(width, height).clamped();
        note.width = size.width;
        note.height = size.height;
        note.updated_at = Utc::now();
        self.storage.save_note(&note)
    }
}

impl Default for NoteStore {
    fn default() -> Self {
        Self::new()
    }
}
