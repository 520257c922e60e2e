//! Reminder repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide keyed CRUD over the `reminders` table.
//! - Expose the `load` contract the scheduling service reads before
//!   re-registering alarms.
//!
//! # Invariants
//! - `create_reminder` validates its draft before inserting.
//! - Ids come from `AUTOINCREMENT` and are never reused after deletion.
//! - Read paths reject malformed persisted flags instead of masking them.

use crate::db::DbError;
use crate::model::recurrence::RecurrenceDays;
use crate::model::reminder::{Reminder, ReminderDraft, ReminderId, ReminderValidationError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const REMINDER_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    fire_at_ms,
    anchor_ms,
    is_completed,
    recurrence_days
FROM reminders";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for reminder persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Validation(ReminderValidationError),
    Db(DbError),
    NotFound(ReminderId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "reminder not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted reminder data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ReminderValidationError> for RepoError {
    fn from(value: ReminderValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing reminders.
#[derive(Debug, Clone, Default)]
pub struct ReminderListQuery {
    /// Skip completed reminders.
    pub only_pending: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Keyed reminder store.
pub trait ReminderRepository {
    /// Inserts a validated draft and returns the stored record with its new id.
    fn create_reminder(&self, draft: &ReminderDraft) -> RepoResult<Reminder>;
    /// Replaces all mutable fields of the row keyed by `reminder.id`.
    fn update_reminder(&self, reminder: &Reminder) -> RepoResult<()>;
    fn get_reminder(&self, id: ReminderId) -> RepoResult<Option<Reminder>>;
    /// Lists reminders ordered by `fire_at_ms ASC, id ASC`.
    fn list_reminders(&self, query: &ReminderListQuery) -> RepoResult<Vec<Reminder>>;
    fn delete_reminder(&self, id: ReminderId) -> RepoResult<()>;
    /// Records the instant of the currently registered series alarm.
    /// The anchor is left untouched.
    fn set_fire_at(&self, id: ReminderId, fire_at_ms: i64) -> RepoResult<()>;
}

/// SQLite-backed reminder repository.
pub struct SqliteReminderRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReminderRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ReminderRepository for SqliteReminderRepository<'_> {
    fn create_reminder(&self, draft: &ReminderDraft) -> RepoResult<Reminder> {
        draft.validate()?;

        self.conn.execute(
            "INSERT INTO reminders (
                title,
                description,
                fire_at_ms,
                anchor_ms,
                is_completed,
                recurrence_days
            ) VALUES (?1, ?2, ?3, ?3, 0, ?4);",
            params![
                draft.title.as_str(),
                draft.description.as_str(),
                draft.fire_at_ms,
                draft.recurrence.to_tags(),
            ],
        )?;

        Ok(Reminder::from_draft(self.conn.last_insert_rowid(), draft))
    }

    fn update_reminder(&self, reminder: &Reminder) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE reminders
             SET
                title = ?1,
                description = ?2,
                fire_at_ms = ?3,
                anchor_ms = ?4,
                is_completed = ?5,
                recurrence_days = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?7;",
            params![
                reminder.title.as_str(),
                reminder.description.as_str(),
                reminder.fire_at_ms,
                reminder.anchor_ms,
                bool_to_int(reminder.is_completed),
                reminder.recurrence.to_tags(),
                reminder.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(reminder.id));
        }

        Ok(())
    }

    fn get_reminder(&self, id: ReminderId) -> RepoResult<Option<Reminder>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REMINDER_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_reminder_row(row)?));
        }

        Ok(None)
    }

    fn list_reminders(&self, query: &ReminderListQuery) -> RepoResult<Vec<Reminder>> {
        let mut sql = format!("{REMINDER_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if query.only_pending {
            sql.push_str(" AND is_completed = 0");
        }

        sql.push_str(" ORDER BY fire_at_ms ASC, id ASC");

        match (query.limit, query.offset) {
            (Some(limit), offset) => {
                sql.push_str(" LIMIT ? OFFSET ?");
                bind_values.push(Value::Integer(i64::from(limit)));
                bind_values.push(Value::Integer(i64::from(offset)));
            }
            (None, 0) => {}
            (None, offset) => {
                sql.push_str(" LIMIT -1 OFFSET ?");
                bind_values.push(Value::Integer(i64::from(offset)));
            }
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut reminders = Vec::new();

        while let Some(row) = rows.next()? {
            reminders.push(parse_reminder_row(row)?);
        }

        Ok(reminders)
    }

    fn delete_reminder(&self, id: ReminderId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM reminders WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn set_fire_at(&self, id: ReminderId, fire_at_ms: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE reminders
             SET
                fire_at_ms = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?2;",
            params![fire_at_ms, id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn parse_reminder_row(row: &Row<'_>) -> RepoResult<Reminder> {
    let id: ReminderId = row.get("id")?;

    let is_completed = match row.get::<_, i64>("is_completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_completed value `{other}` in reminders.is_completed for id {id}"
            )));
        }
    };

    // Unknown day tags degrade to one-shot rather than failing the read.
    let recurrence_text: String = row.get("recurrence_days")?;

    Ok(Reminder {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        fire_at_ms: row.get("fire_at_ms")?,
        anchor_ms: row.get("anchor_ms")?,
        is_completed,
        recurrence: RecurrenceDays::parse_tags(&recurrence_text),
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
