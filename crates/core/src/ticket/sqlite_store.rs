//! SQLite-backed ticket store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::{
    ClaimedFilter, Comment, NewComment, NewTicket, Ticket, TicketChange, TicketError,
    TicketFilter, TicketId, TicketStatus, TicketStore, TicketUpdate, TicketWithComments,
};

const TICKET_COLUMNS: &str =
    "id, title, description, what_ive_tried, posted_by, claimed_by, status, created_at, updated_at";

/// SQLite-backed ticket store.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
}

impl SqliteTicketStore {
    /// Create a new SQLite ticket store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, TicketError> {
        let conn = Connection::open(path).map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite ticket store (useful for testing).
    pub fn in_memory() -> Result<Self, TicketError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TicketError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS tickets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                what_ive_tried TEXT,
                posted_by TEXT NOT NULL,
                claimed_by TEXT,
                status TEXT NOT NULL DEFAULT 'OPEN',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);
            CREATE INDEX IF NOT EXISTS idx_tickets_posted_by ON tickets(posted_by);
            CREATE INDEX IF NOT EXISTS idx_tickets_claimed_by ON tickets(claimed_by);

            CREATE TABLE IF NOT EXISTS ticket_categories (
                ticket_id INTEGER NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
                category TEXT NOT NULL,
                PRIMARY KEY (ticket_id, category)
            );

            CREATE TABLE IF NOT EXISTS ticket_comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticket_id INTEGER NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
                posted_by TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_ticket_comments_ticket ON ticket_comments(ticket_id);
            "#,
        )
        .map_err(db_err)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, TicketError> {
        self.conn
            .lock()
            .map_err(|_| TicketError::Database("connection mutex poisoned".to_string()))
    }

    fn build_where_clause(filter: &TicketFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str().to_string()));
        }

        match filter.claimed {
            Some(ClaimedFilter::Yes) => conditions.push("claimed_by IS NOT NULL"),
            Some(ClaimedFilter::No) => conditions.push("claimed_by IS NULL"),
            Some(ClaimedFilter::Other(_)) => conditions.push("0 = 1"),
            None => {}
        }

        if let Some(ref posted_by) = filter.posted_by {
            conditions.push("posted_by = ?");
            params.push(Box::new(posted_by.clone()));
        }

        if let Some(ref claimed_by) = filter.claimed_by {
            conditions.push("claimed_by = ?");
            params.push(Box::new(claimed_by.clone()));
        }

        if let Some(ref category) = filter.category {
            conditions.push(
                "EXISTS (SELECT 1 FROM ticket_categories c WHERE c.ticket_id = tickets.id AND c.category = ?)",
            );
            params.push(Box::new(category.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }
}

fn db_err(e: rusqlite::Error) -> TicketError {
    TicketError::Database(e.to_string())
}

fn parse_timestamp(
    row: &rusqlite::Row,
    idx: usize,
    name: &str,
) -> rusqlite::Result<DateTime<Utc>> {
    let value: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::InvalidColumnType(idx, name.to_string(), rusqlite::types::Type::Text)
        })
}

fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
    let status_str: String = row.get(6)?;
    let status = TicketStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(6, "status".to_string(), rusqlite::types::Type::Text)
    })?;

    Ok(Ticket {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        what_ive_tried: row.get(3)?,
        posted_by: row.get(4)?,
        claimed_by: row.get(5)?,
        status,
        categories: Vec::new(),
        created_at: parse_timestamp(row, 7, "created_at")?,
        updated_at: parse_timestamp(row, 8, "updated_at")?,
    })
}

fn row_to_comment(row: &rusqlite::Row) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        ticket_id: row.get(1)?,
        posted_by: row.get(2)?,
        content: row.get(3)?,
        created_at: parse_timestamp(row, 4, "created_at")?,
    })
}

fn load_categories(conn: &Connection, id: TicketId) -> Result<Vec<String>, TicketError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT category FROM ticket_categories WHERE ticket_id = ? ORDER BY category",
        )
        .map_err(db_err)?;
    let rows = stmt
        .query_map(params![id], |row| row.get(0))
        .map_err(db_err)?;
    rows.collect::<rusqlite::Result<Vec<String>>>()
        .map_err(db_err)
}

fn replace_categories(
    conn: &Connection,
    id: TicketId,
    categories: &[String],
) -> Result<(), TicketError> {
    conn.execute(
        "DELETE FROM ticket_categories WHERE ticket_id = ?",
        params![id],
    )
    .map_err(db_err)?;

    for category in categories {
        conn.execute(
            "INSERT OR IGNORE INTO ticket_categories (ticket_id, category) VALUES (?, ?)",
            params![id, category],
        )
        .map_err(db_err)?;
    }

    Ok(())
}

fn fetch_ticket(conn: &Connection, id: TicketId) -> Result<Option<Ticket>, TicketError> {
    let sql = format!("SELECT {} FROM tickets WHERE id = ?", TICKET_COLUMNS);
    let ticket = conn
        .query_row(&sql, params![id], row_to_ticket)
        .optional()
        .map_err(db_err)?;

    match ticket {
        Some(mut ticket) => {
            ticket.categories = load_categories(conn, ticket.id)?;
            Ok(Some(ticket))
        }
        None => Ok(None),
    }
}

fn query_tickets(
    conn: &Connection,
    where_clause: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Ticket>, TicketError> {
    let sql = format!(
        "SELECT {} FROM tickets {} ORDER BY id ASC",
        TICKET_COLUMNS, where_clause
    );

    let mut stmt = conn.prepare(&sql).map_err(db_err)?;
    let rows = stmt.query_map(params, row_to_ticket).map_err(db_err)?;

    let mut tickets = Vec::new();
    for row_result in rows {
        let mut ticket = row_result.map_err(db_err)?;
        ticket.categories = load_categories(conn, ticket.id)?;
        tickets.push(ticket);
    }

    Ok(tickets)
}

impl TicketStore for SqliteTicketStore {
    fn find(&self) -> Result<Vec<Ticket>, TicketError> {
        let conn = self.lock()?;
        query_tickets(&conn, "", &[])
    }

    fn find_by(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::build_where_clause(filter);
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        query_tickets(&conn, &where_clause, param_refs.as_slice())
    }

    fn add(&self, ticket: NewTicket, categories: &[String]) -> Result<Ticket, TicketError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;

        let now = Utc::now().to_rfc3339();
        tx.execute(
            "INSERT INTO tickets (title, description, what_ive_tried, posted_by, claimed_by, status, created_at, updated_at) VALUES (?, ?, ?, ?, NULL, ?, ?, ?)",
            params![
                ticket.title,
                ticket.description,
                ticket.what_ive_tried,
                ticket.posted_by,
                TicketStatus::Open.as_str(),
                now,
                now,
            ],
        )
        .map_err(db_err)?;

        let id = tx.last_insert_rowid();
        replace_categories(&tx, id, categories)?;

        let created = fetch_ticket(&tx, id)?.ok_or(TicketError::NotFound(id))?;
        tx.commit().map_err(db_err)?;

        Ok(created)
    }

    fn update(
        &self,
        id: TicketId,
        update: TicketUpdate,
        categories: Option<&[String]>,
        requester: &str,
    ) -> Result<Ticket, TicketError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;

        debug!(ticket_id = id, requester, "Updating ticket content");

        let affected = tx
            .execute(
                "UPDATE tickets SET title = COALESCE(?1, title), description = COALESCE(?2, description), what_ive_tried = COALESCE(?3, what_ive_tried), updated_at = ?4 WHERE id = ?5",
                params![
                    update.title,
                    update.description,
                    update.what_ive_tried,
                    Utc::now().to_rfc3339(),
                    id,
                ],
            )
            .map_err(db_err)?;

        if affected == 0 {
            return Err(TicketError::NotFound(id));
        }

        if let Some(categories) = categories {
            replace_categories(&tx, id, categories)?;
        }

        let updated = fetch_ticket(&tx, id)?.ok_or(TicketError::NotFound(id))?;
        tx.commit().map_err(db_err)?;

        Ok(updated)
    }

    fn assert_change(&self, id: TicketId, change: TicketChange) -> Result<Ticket, TicketError> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();

        let affected = match &change {
            TicketChange::SetClaimant(user_id) => conn.execute(
                "UPDATE tickets SET claimed_by = ?1, updated_at = ?2 WHERE id = ?3",
                params![user_id, now, id],
            ),
            TicketChange::ClearClaimant => conn.execute(
                "UPDATE tickets SET claimed_by = NULL, updated_at = ?1 WHERE id = ?2",
                params![now, id],
            ),
            TicketChange::SetStatus(status) => conn.execute(
                "UPDATE tickets SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), now, id],
            ),
        }
        .map_err(db_err)?;

        if affected == 0 {
            return Err(TicketError::NotFound(id));
        }

        fetch_ticket(&conn, id)?.ok_or(TicketError::NotFound(id))
    }

    fn remove(&self, id: TicketId, requester: &str) -> Result<usize, TicketError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM tickets WHERE id = ? AND posted_by = ?",
            params![id, requester],
        )
        .map_err(db_err)
    }

    fn find_by_id(&self, id: TicketId) -> Result<Option<Ticket>, TicketError> {
        let conn = self.lock()?;
        fetch_ticket(&conn, id)
    }

    fn find_by_id_with_comments(
        &self,
        id: TicketId,
    ) -> Result<Option<TicketWithComments>, TicketError> {
        let conn = self.lock()?;

        let Some(ticket) = fetch_ticket(&conn, id)? else {
            return Ok(None);
        };

        let mut stmt = conn
            .prepare(
                "SELECT id, ticket_id, posted_by, content, created_at FROM ticket_comments WHERE ticket_id = ? ORDER BY created_at ASC, id ASC",
            )
            .map_err(db_err)?;
        let comments = stmt
            .query_map(params![id], row_to_comment)
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<Comment>>>()
            .map_err(db_err)?;

        Ok(Some(TicketWithComments { ticket, comments }))
    }

    fn add_comment(&self, id: TicketId, comment: NewComment) -> Result<Comment, TicketError> {
        let conn = self.lock()?;

        let exists = conn
            .query_row("SELECT 1 FROM tickets WHERE id = ?", params![id], |_| Ok(()))
            .optional()
            .map_err(db_err)?;
        if exists.is_none() {
            return Err(TicketError::NotFound(id));
        }

        let now = Utc::now();
        conn.execute(
            "INSERT INTO ticket_comments (ticket_id, posted_by, content, created_at) VALUES (?, ?, ?, ?)",
            params![id, comment.posted_by, comment.content, now.to_rfc3339()],
        )
        .map_err(db_err)?;

        Ok(Comment {
            id: conn.last_insert_rowid(),
            ticket_id: id,
            posted_by: comment.posted_by,
            content: comment.content,
            created_at: now,
        })
    }

    fn count_by_status(&self) -> Result<Vec<(TicketStatus, u64)>, TicketError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare("SELECT status, COUNT(*) FROM tickets GROUP BY status ORDER BY status")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| {
                let status: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((status, count))
            })
            .map_err(db_err)?;

        let mut counts = Vec::new();
        for row_result in rows {
            let (status, count) = row_result.map_err(db_err)?;
            let status = TicketStatus::parse(&status).ok_or_else(|| {
                TicketError::Database(format!("Unknown ticket status {:?}", status))
            })?;
            counts.push((status, count as u64));
        }

        Ok(counts)
    }
}
