use super::{PersistenceError, PersistenceResult, ProjectStore};
use crate::{Activity, Project, ProjectMetadata};
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::Mutex;

pub struct SqliteProjectStore {
    connection: Mutex<Connection>,
}

impl SqliteProjectStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS project_metadata (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                metadata_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS activities (
                position INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                activity_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> PersistenceResult<std::sync::MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::InvalidData("sqlite connection lock poisoned".into()))
    }

    fn save_metadata(
        tx: &rusqlite::Transaction,
        metadata: &ProjectMetadata,
    ) -> PersistenceResult<()> {
        let json = serde_json::to_string(metadata)?;
        tx.execute("DELETE FROM project_metadata", [])?;
        tx.execute(
            "INSERT INTO project_metadata (id, metadata_json) VALUES (1, ?1)",
            params![json],
        )?;
        Ok(())
    }

    fn save_activities(tx: &rusqlite::Transaction, project: &Project) -> PersistenceResult<()> {
        tx.execute("DELETE FROM activities", [])?;
        let mut stmt =
            tx.prepare("INSERT INTO activities (position, name, activity_json) VALUES (?1, ?2, ?3)")?;
        for (position, activity) in project.activities().iter().enumerate() {
            let json = serde_json::to_string(activity)?;
            stmt.execute(params![position as i64, activity.name, json])?;
        }
        Ok(())
    }
}

impl ProjectStore for SqliteProjectStore {
    fn save_project(&self, project: &Project) -> PersistenceResult<()> {
        super::validate_project(project)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::save_metadata(&tx, project.metadata())?;
        Self::save_activities(&tx, project)?;
        tx.commit()?;
        Ok(())
    }

    fn load_project(&self) -> PersistenceResult<Option<Project>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT metadata_json FROM project_metadata WHERE id = 1")?;
        let metadata_json: Option<String> = stmt.query_row([], |row| row.get(0)).optional()?;

        let Some(metadata_json) = metadata_json else {
            return Ok(None);
        };
        let metadata: ProjectMetadata = serde_json::from_str(&metadata_json)?;

        let mut stmt = conn.prepare("SELECT activity_json FROM activities ORDER BY position ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut activities = Vec::new();
        for json in rows {
            let activity: Activity = serde_json::from_str(&json?)?;
            activities.push(activity);
        }

        Ok(Some(Project::from_parts(metadata, activities)?))
    }
}
