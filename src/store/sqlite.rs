//! SQLite store.
//!
//! Timestamps are stored as fixed-width RFC 3339 text in UTC with
//! millisecond precision, so string order is time order. Decimals are
//! stored as text.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, TransactionBehavior, params};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::calculation::{ClockEvent, ClockTransition, ShiftState};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    GeoLocation, RecurringTemplate, Role, Schedule, ScheduleOrigin, Shift, ShiftStatus, TimeEntry,
    TimeEntryType, Worker,
};

use super::{ScheduleQuery, ShiftQuery, ShiftStore, TransitionFn, stale_edit};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS workers (
        id                  TEXT PRIMARY KEY,
        org_id              TEXT NOT NULL,
        name                TEXT NOT NULL,
        role                TEXT NOT NULL,
        is_active           INTEGER NOT NULL DEFAULT 1,
        pin                 TEXT,
        pay_rate            TEXT,
        recurring_template  TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_workers_org ON workers(org_id);

    CREATE TABLE IF NOT EXISTS shifts (
        id           TEXT PRIMARY KEY,
        worker_id    TEXT NOT NULL REFERENCES workers(id),
        start_time   TEXT NOT NULL,
        end_time     TEXT,
        status       TEXT NOT NULL CHECK (status IN ('active', 'completed')),
        total_hours  TEXT
    );
    CREATE UNIQUE INDEX IF NOT EXISTS idx_shifts_one_active
        ON shifts(worker_id) WHERE status = 'active';
    CREATE INDEX IF NOT EXISTS idx_shifts_worker_start
        ON shifts(worker_id, start_time DESC);

    CREATE TABLE IF NOT EXISTS time_entries (
        id           TEXT PRIMARY KEY,
        shift_id     TEXT NOT NULL REFERENCES shifts(id),
        entry_type   TEXT NOT NULL,
        timestamp    TEXT NOT NULL,
        location_lat REAL,
        location_lng REAL
    );
    CREATE INDEX IF NOT EXISTS idx_time_entries_shift ON time_entries(shift_id, timestamp);

    CREATE TABLE IF NOT EXISTS schedules (
        id          TEXT PRIMARY KEY,
        worker_id   TEXT NOT NULL REFERENCES workers(id),
        start_time  TEXT NOT NULL,
        end_time    TEXT NOT NULL,
        notes       TEXT,
        origin      TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_schedules_worker_start ON schedules(worker_id, start_time);
";

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        EngineError::persistence(err.to_string())
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

/// Maps a unique-index violation on the active-shift index to a state error.
fn active_conflict(worker_id: &str, err: rusqlite::Error) -> EngineError {
    if is_constraint_violation(&err) {
        EngineError::InvalidStateTransition {
            worker_id: worker_id.to_string(),
            state: "active".to_string(),
            attempted: "open a second shift".to_string(),
        }
    } else {
        err.into()
    }
}

fn ts(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(text: &str) -> EngineResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| EngineError::persistence(format!("bad timestamp '{}': {}", text, e)))
}

fn parse_decimal(text: &str) -> EngineResult<Decimal> {
    Decimal::from_str(text)
        .map_err(|e| EngineError::persistence(format!("bad decimal '{}': {}", text, e)))
}

fn parse_enum<T: FromStr<Err = String>>(text: &str) -> EngineResult<T> {
    T::from_str(text).map_err(EngineError::persistence)
}

struct WorkerRow {
    id: String,
    org_id: String,
    name: String,
    role: String,
    is_active: bool,
    pin: Option<String>,
    pay_rate: Option<String>,
    recurring_template: Option<String>,
}

impl WorkerRow {
    const COLUMNS: &'static str =
        "id, org_id, name, role, is_active, pin, pay_rate, recurring_template";

    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            org_id: row.get(1)?,
            name: row.get(2)?,
            role: row.get(3)?,
            is_active: row.get(4)?,
            pin: row.get(5)?,
            pay_rate: row.get(6)?,
            recurring_template: row.get(7)?,
        })
    }

    fn into_worker(self) -> EngineResult<Worker> {
        // An unreadable template is treated as no template at all.
        let recurring_template = self.recurring_template.and_then(|text| {
            RecurringTemplate::parse(&text)
                .inspect_err(|e| {
                    tracing::warn!(worker_id = %self.id, error = %e, "Ignoring unreadable template")
                })
                .ok()
        });
        Ok(Worker {
            role: parse_enum::<Role>(&self.role)?,
            pay_rate: self.pay_rate.as_deref().map(parse_decimal).transpose()?,
            id: self.id,
            org_id: self.org_id,
            name: self.name,
            is_active: self.is_active,
            pin: self.pin,
            recurring_template,
        })
    }
}

struct ShiftRow {
    id: String,
    worker_id: String,
    start_time: String,
    end_time: Option<String>,
    status: String,
    total_hours: Option<String>,
}

impl ShiftRow {
    const COLUMNS: &'static str =
        "s.id, s.worker_id, s.start_time, s.end_time, s.status, s.total_hours";

    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            worker_id: row.get(1)?,
            start_time: row.get(2)?,
            end_time: row.get(3)?,
            status: row.get(4)?,
            total_hours: row.get(5)?,
        })
    }

    fn into_shift(self) -> EngineResult<Shift> {
        Ok(Shift::restore(
            self.id,
            self.worker_id,
            parse_ts(&self.start_time)?,
            self.end_time.as_deref().map(parse_ts).transpose()?,
            parse_enum::<ShiftStatus>(&self.status)?,
            self.total_hours.as_deref().map(parse_decimal).transpose()?,
        ))
    }
}

struct ScheduleRow {
    id: String,
    worker_id: String,
    start_time: String,
    end_time: String,
    notes: Option<String>,
    origin: String,
}

impl ScheduleRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            worker_id: row.get(1)?,
            start_time: row.get(2)?,
            end_time: row.get(3)?,
            notes: row.get(4)?,
            origin: row.get(5)?,
        })
    }

    fn into_schedule(self) -> EngineResult<Schedule> {
        Ok(Schedule {
            id: self.id,
            worker_id: self.worker_id,
            start_time: parse_ts(&self.start_time)?,
            end_time: parse_ts(&self.end_time)?,
            notes: self.notes,
            origin: parse_enum::<ScheduleOrigin>(&self.origin)?,
        })
    }
}

/// A [`ShiftStore`] backed by SQLite.
///
/// Transitions run inside a `BEGIN IMMEDIATE` transaction, and the
/// `idx_shifts_one_active` partial unique index rejects a second active
/// shift even from another process writing the same database file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) a database file and applies the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA busy_timeout=5000; PRAGMA journal_mode=WAL;")?;
        info!(path = %path.display(), "Opened SQLite store");
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> EngineResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wraps an existing connection, applying the schema. Safe to call on
    /// an already initialized database.
    pub fn from_connection(conn: Connection) -> EngineResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> EngineResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| EngineError::persistence("sqlite connection lock poisoned"))
    }

    fn active_shift_on(conn: &Connection, worker_id: &str) -> EngineResult<Option<Shift>> {
        let sql = format!(
            "SELECT {} FROM shifts s WHERE s.worker_id = ?1 AND s.status = 'active'",
            ShiftRow::COLUMNS
        );
        conn.query_row(&sql, params![worker_id], ShiftRow::read)
            .optional()?
            .map(ShiftRow::into_shift)
            .transpose()
    }

    fn shift_on(conn: &Connection, shift_id: &str) -> EngineResult<Option<Shift>> {
        let sql = format!("SELECT {} FROM shifts s WHERE s.id = ?1", ShiftRow::COLUMNS);
        conn.query_row(&sql, params![shift_id], ShiftRow::read)
            .optional()?
            .map(ShiftRow::into_shift)
            .transpose()
    }

    fn insert_shift_on(conn: &Connection, shift: &Shift) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO shifts (id, worker_id, start_time, end_time, status, total_hours)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                shift.id,
                shift.worker_id,
                ts(shift.start_time()),
                shift.end_time().map(ts),
                shift.status().as_str(),
                shift.total_hours().map(|h| h.to_string()),
            ],
        )
    }

    fn update_shift_on(conn: &Connection, shift: &Shift) -> rusqlite::Result<usize> {
        conn.execute(
            "UPDATE shifts SET start_time = ?2, end_time = ?3, status = ?4, total_hours = ?5
             WHERE id = ?1",
            params![
                shift.id,
                ts(shift.start_time()),
                shift.end_time().map(ts),
                shift.status().as_str(),
                shift.total_hours().map(|h| h.to_string()),
            ],
        )
    }

    fn insert_entry_on(conn: &Connection, entry: &TimeEntry) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO time_entries (id, shift_id, entry_type, timestamp, location_lat, location_lng)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.id,
                entry.shift_id,
                entry.entry_type.as_str(),
                ts(entry.timestamp),
                entry.location.map(|l| l.lat),
                entry.location.map(|l| l.lng),
            ],
        )
    }
}

impl ShiftStore for SqliteStore {
    fn save_worker(&self, worker: &Worker) -> EngineResult<()> {
        self.lock()?.execute(
            "INSERT INTO workers (id, org_id, name, role, is_active, pin, pay_rate, recurring_template)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                org_id = excluded.org_id, name = excluded.name, role = excluded.role,
                is_active = excluded.is_active, pin = excluded.pin, pay_rate = excluded.pay_rate,
                recurring_template = excluded.recurring_template",
            params![
                worker.id,
                worker.org_id,
                worker.name,
                worker.role.to_string(),
                worker.is_active,
                worker.pin,
                worker.pay_rate.map(|r| r.to_string()),
                worker.recurring_template.as_ref().map(RecurringTemplate::to_json),
            ],
        )?;
        Ok(())
    }

    fn get_worker(&self, org_id: &str, worker_id: &str) -> EngineResult<Option<Worker>> {
        let sql = format!(
            "SELECT {} FROM workers WHERE id = ?1 AND org_id = ?2",
            WorkerRow::COLUMNS
        );
        self.lock()?
            .query_row(&sql, params![worker_id, org_id], WorkerRow::read)
            .optional()?
            .map(WorkerRow::into_worker)
            .transpose()
    }

    fn list_workers(&self, org_id: &str) -> EngineResult<Vec<Worker>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM workers WHERE org_id = ?1 ORDER BY id",
            WorkerRow::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![org_id], WorkerRow::read)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(WorkerRow::into_worker).collect()
    }

    fn active_shift(&self, worker_id: &str) -> EngineResult<Option<Shift>> {
        let conn = self.lock()?;
        Self::active_shift_on(&conn, worker_id)
    }

    fn apply_transition(
        &self,
        worker_id: &str,
        decide: &mut TransitionFn<'_>,
    ) -> EngineResult<ClockTransition> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let state = ShiftState::from_active(Self::active_shift_on(&tx, worker_id)?);
        // Returning early drops `tx`, which rolls back.
        let transition = decide(&state)?;

        match transition.event {
            ClockEvent::ClockedIn => {
                Self::insert_shift_on(&tx, &transition.shift)
                    .map_err(|e| active_conflict(worker_id, e))?;
            }
            ClockEvent::ClockedOut => {
                if Self::update_shift_on(&tx, &transition.shift)? == 0 {
                    return Err(EngineError::not_found("shift", transition.shift.id.clone()));
                }
            }
        }
        Self::insert_entry_on(&tx, &transition.entry)?;
        tx.commit()?;

        debug!(worker_id, shift_id = %transition.shift.id, event = ?transition.event, "Applied transition");
        Ok(transition)
    }

    fn insert_shift(&self, shift: &Shift) -> EngineResult<()> {
        let conn = self.lock()?;
        Self::insert_shift_on(&conn, shift)
            .map_err(|e| active_conflict(&shift.worker_id, e))?;
        Ok(())
    }

    fn update_shift(&self, previous: &Shift, shift: &Shift) -> EngineResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let stored = Self::shift_on(&tx, &shift.id)?
            .ok_or_else(|| EngineError::not_found("shift", shift.id.clone()))?;
        if stored != *previous {
            return Err(stale_edit(&stored));
        }
        Self::update_shift_on(&tx, shift).map_err(|e| active_conflict(&shift.worker_id, e))?;
        tx.commit()?;
        Ok(())
    }

    fn get_shift(&self, org_id: &str, shift_id: &str) -> EngineResult<Option<Shift>> {
        let sql = format!(
            "SELECT {} FROM shifts s JOIN workers w ON w.id = s.worker_id
             WHERE s.id = ?1 AND w.org_id = ?2",
            ShiftRow::COLUMNS
        );
        self.lock()?
            .query_row(&sql, params![shift_id, org_id], ShiftRow::read)
            .optional()?
            .map(ShiftRow::into_shift)
            .transpose()
    }

    fn list_shifts(&self, query: &ShiftQuery) -> EngineResult<Vec<Shift>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM shifts s JOIN workers w ON w.id = s.worker_id
             WHERE w.org_id = ?1
               AND (?2 IS NULL OR s.worker_id = ?2)
               AND (?3 IS NULL OR s.status = ?3)
               AND (?4 IS NULL OR s.start_time >= ?4)
               AND (?5 IS NULL OR s.start_time <= ?5)
             ORDER BY s.start_time DESC
             LIMIT ?6",
            ShiftRow::COLUMNS
        );
        let limit = query
            .limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
            .unwrap_or(-1);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![
                    query.org_id,
                    query.worker_id,
                    query.status.map(ShiftStatus::as_str),
                    query.from.map(ts),
                    query.to.map(ts),
                    limit,
                ],
                ShiftRow::read,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(ShiftRow::into_shift).collect()
    }

    fn time_entries(&self, shift_id: &str) -> EngineResult<Vec<TimeEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, shift_id, entry_type, timestamp, location_lat, location_lng
             FROM time_entries WHERE shift_id = ?1 ORDER BY timestamp",
        )?;
        let rows = stmt
            .query_map(params![shift_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                    row.get::<_, Option<f64>>(5)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, shift_id, entry_type, timestamp, lat, lng)| {
                Ok(TimeEntry {
                    id,
                    shift_id,
                    entry_type: parse_enum::<TimeEntryType>(&entry_type)?,
                    timestamp: parse_ts(&timestamp)?,
                    location: lat.zip(lng).map(|(lat, lng)| GeoLocation { lat, lng }),
                })
            })
            .collect()
    }

    fn insert_schedules(&self, schedules: &[Schedule]) -> EngineResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO schedules (id, worker_id, start_time, end_time, notes, origin)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for schedule in schedules {
                stmt.execute(params![
                    schedule.id,
                    schedule.worker_id,
                    ts(schedule.start_time),
                    ts(schedule.end_time),
                    schedule.notes,
                    schedule.origin.as_str(),
                ])?;
            }
        }
        tx.commit()?;
        debug!(count = schedules.len(), "Inserted schedules");
        Ok(())
    }

    fn delete_schedule(&self, org_id: &str, schedule_id: &str) -> EngineResult<()> {
        let deleted = self.lock()?.execute(
            "DELETE FROM schedules WHERE id = ?1
               AND worker_id IN (SELECT id FROM workers WHERE org_id = ?2)",
            params![schedule_id, org_id],
        )?;
        if deleted == 0 {
            return Err(EngineError::not_found("schedule", schedule_id));
        }
        Ok(())
    }

    fn list_schedules(&self, query: &ScheduleQuery) -> EngineResult<Vec<Schedule>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT s.id, s.worker_id, s.start_time, s.end_time, s.notes, s.origin
             FROM schedules s JOIN workers w ON w.id = s.worker_id
             WHERE w.org_id = ?1
               AND (?2 IS NULL OR s.worker_id = ?2)
               AND (?3 IS NULL OR s.start_time >= ?3)
               AND (?4 IS NULL OR s.start_time <= ?4)
             ORDER BY s.start_time ASC",
        )?;
        let rows = stmt
            .query_map(
                params![
                    query.org_id,
                    query.worker_id,
                    query.from.map(ts),
                    query.to.map(ts),
                ],
                ScheduleRow::read,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(ScheduleRow::into_schedule).collect()
    }
}
