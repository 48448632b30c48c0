#[cfg(test)]
use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};

use crate::model::{Assignment, Role, Submission, User};

pub const KEY_STUDENTS: &str = "students";
pub const KEY_ADMINS: &str = "admins";
pub const KEY_ASSIGNMENTS: &str = "assignments";
pub const KEY_CURRENT_USER: &str = "currentUser";

pub const STORE_FILE: &str = "joineazy.sqlite3";

/// Injected storage port: a flat key/value namespace holding one JSON
/// document per collection. The daemon runs against the sqlite-backed
/// implementation; tests run against the in-memory one.
pub trait Storage {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&mut self, key: &str) -> anyhow::Result<()>;
}

pub struct SqliteStorage {
    conn: Connection,
}

pub fn open_storage(workspace: &Path) -> anyhow::Result<SqliteStorage> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(STORE_FILE);
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    Ok(SqliteStorage { conn })
}

impl Storage for SqliteStorage {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |r| r.get(0))
            .optional()?;
        Ok(value)
    }

    fn write(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.conn.execute(
            "INSERT INTO kv(key, value) VALUES(?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            (key, value),
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?", [key])?;
        Ok(())
    }
}

/// In-memory port for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

#[cfg(test)]
impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Owns the three record collections and the persisted identity. Every
/// mutation is a full-collection read/modify/write; the workspace is assumed
/// single-writer, last writer wins.
pub struct RecordStore {
    storage: Box<dyn Storage>,
}

impl RecordStore {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        RecordStore { storage }
    }

    /// First-run seeding. Writes the demo dataset under any collection key
    /// that is absent; never overwrites existing data.
    pub fn initialize(&mut self) -> anyhow::Result<()> {
        let mut seeded = false;
        if self.storage.read(KEY_STUDENTS)?.is_none() {
            self.write_json(KEY_STUDENTS, &seed_students())?;
            seeded = true;
        }
        if self.storage.read(KEY_ADMINS)?.is_none() {
            self.write_json(KEY_ADMINS, &seed_admins())?;
            seeded = true;
        }
        if self.storage.read(KEY_ASSIGNMENTS)?.is_none() {
            self.write_json(KEY_ASSIGNMENTS, &seed_assignments())?;
            seeded = true;
        }
        if seeded {
            tracing::info!("seeded workspace with demo roster and assignments");
        }
        Ok(())
    }

    pub fn students(&self) -> anyhow::Result<Vec<User>> {
        self.read_json(KEY_STUDENTS)
            .map(|v| v.unwrap_or_else(seed_students))
    }

    pub fn admins(&self) -> anyhow::Result<Vec<User>> {
        self.read_json(KEY_ADMINS)
            .map(|v| v.unwrap_or_else(seed_admins))
    }

    pub fn assignments(&self) -> anyhow::Result<Vec<Assignment>> {
        self.read_json(KEY_ASSIGNMENTS)
            .map(|v| v.unwrap_or_else(seed_assignments))
    }

    pub fn save_students(&mut self, all: &[User]) -> anyhow::Result<()> {
        self.write_json(KEY_STUDENTS, all)
    }

    pub fn save_admins(&mut self, all: &[User]) -> anyhow::Result<()> {
        self.write_json(KEY_ADMINS, all)
    }

    pub fn save_assignments(&mut self, all: &[Assignment]) -> anyhow::Result<()> {
        self.write_json(KEY_ASSIGNMENTS, all)
    }

    pub fn current_user(&self) -> anyhow::Result<Option<User>> {
        self.read_json(KEY_CURRENT_USER)
    }

    pub fn save_current_user(&mut self, user: &User) -> anyhow::Result<()> {
        self.write_json(KEY_CURRENT_USER, user)
    }

    pub fn clear_current_user(&mut self) -> anyhow::Result<()> {
        self.storage.remove(KEY_CURRENT_USER)
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        match self.storage.read(key)? {
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .with_context(|| format!("stored value under {} is invalid JSON", key))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn write_json<T: serde::Serialize + ?Sized>(&mut self, key: &str, value: &T) -> anyhow::Result<()> {
        let raw = serde_json::to_string(value)
            .with_context(|| format!("failed to serialize value for {}", key))?;
        self.storage.write(key, &raw)
    }
}

fn user(id: &str, name: &str, email: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        role,
    }
}

fn slot(student_id: &str, submitted_at: Option<&str>) -> Submission {
    Submission {
        student_id: student_id.to_string(),
        submitted: submitted_at.is_some(),
        submitted_at: submitted_at.map(|s| s.to_string()),
    }
}

pub fn seed_students() -> Vec<User> {
    vec![
        user("s1", "Alice Johnson", "alice@example.com", Role::Student),
        user("s2", "Bob Smith", "bob@example.com", Role::Student),
        user("s3", "Carol White", "carol@example.com", Role::Student),
    ]
}

pub fn seed_admins() -> Vec<User> {
    vec![user("a1", "Prof. David Lee", "david@example.com", Role::Admin)]
}

pub fn seed_assignments() -> Vec<Assignment> {
    vec![
        Assignment {
            id: "assign1".to_string(),
            title: "React Basics".to_string(),
            description: "Build a simple React component with hooks".to_string(),
            due_date: "2025-11-05".to_string(),
            drive_link: "https://drive.google.com/folder/1".to_string(),
            created_by: "a1".to_string(),
            created_at: "2025-10-28".to_string(),
            submissions: vec![
                slot("s1", Some("2025-10-31")),
                slot("s2", None),
                slot("s3", Some("2025-10-30")),
            ],
        },
        Assignment {
            id: "assign2".to_string(),
            title: "Tailwind CSS Project".to_string(),
            description: "Create a responsive dashboard using Tailwind CSS".to_string(),
            due_date: "2025-11-10".to_string(),
            drive_link: "https://drive.google.com/folder/2".to_string(),
            created_by: "a1".to_string(),
            created_at: "2025-10-25".to_string(),
            submissions: vec![
                slot("s1", None),
                slot("s2", Some("2025-10-29")),
                slot("s3", None),
            ],
        },
        Assignment {
            id: "assign3".to_string(),
            title: "JavaScript Advanced Concepts".to_string(),
            description: "Implement closures, async/await, and promises".to_string(),
            due_date: "2025-11-15".to_string(),
            drive_link: "https://drive.google.com/folder/3".to_string(),
            created_by: "a1".to_string(),
            created_at: "2025-10-20".to_string(),
            submissions: vec![
                slot("s1", Some("2025-10-28")),
                slot("s2", Some("2025-10-27")),
                slot("s3", Some("2025-10-26")),
            ],
        },
    ]
}
