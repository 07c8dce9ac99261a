//! Roster provider contract and local SQLite roster cache.
//!
//! # Responsibility
//! - Define the read-only roster seam consumed by follow-up targeting.
//! - Persist a local copy of members synced from the remote roster service.
//!
//! # Invariants
//! - Member ids are non-blank and unique.
//! - `list_members` order is stable: last name, first name, id.

use crate::model::attendance::AttendanceValidationError;
use crate::model::member::{Member, MemberId};
use crate::repo::attendance_repo::{bool_to_int, ensure_table_ready, RepoError, RepoResult};
use log::debug;
use rusqlite::{params, Connection, Row};

const MEMBER_SELECT_SQL: &str = "SELECT
    id,
    first_name,
    last_name,
    phone_primary,
    is_active,
    area_id,
    leader_id
FROM members";

/// Inbound roster seam. Implementations own member data.
pub trait RosterProvider {
    /// Returns every known member, active or not.
    fn list_members(&self) -> RepoResult<Vec<Member>>;
}

impl RosterProvider for Vec<Member> {
    fn list_members(&self) -> RepoResult<Vec<Member>> {
        Ok(self.clone())
    }
}

/// SQLite-backed roster cache.
pub struct SqliteRosterRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRosterRepository<'conn> {
    /// Constructs a roster repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(
            conn,
            "members",
            &[
                "id",
                "first_name",
                "last_name",
                "phone_primary",
                "is_active",
                "area_id",
                "leader_id",
            ],
        )?;
        Ok(Self { conn })
    }

    /// Inserts or replaces one member by id.
    pub fn upsert_member(&self, member: &Member) -> RepoResult<MemberId> {
        let id = member.id.trim();
        if id.is_empty() {
            return Err(AttendanceValidationError::BlankMemberId.into());
        }

        self.conn.execute(
            "INSERT INTO members (
                id,
                first_name,
                last_name,
                phone_primary,
                is_active,
                area_id,
                leader_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                phone_primary = excluded.phone_primary,
                is_active = excluded.is_active,
                area_id = excluded.area_id,
                leader_id = excluded.leader_id,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                id,
                member.first_name.as_str(),
                member.last_name.as_str(),
                member.phone_primary.as_deref(),
                bool_to_int(member.is_active),
                member.area_id.as_deref(),
                member.leader_id.as_deref(),
            ],
        )?;

        debug!("event=roster_upsert module=roster status=ok active={}", member.is_active);
        Ok(id.to_string())
    }

    /// Gets one member by id.
    pub fn get_member(&self, id: &str) -> RepoResult<Option<Member>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEMBER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.trim()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_member_row(row)?));
        }

        Ok(None)
    }
}

impl RosterProvider for SqliteRosterRepository<'_> {
    fn list_members(&self) -> RepoResult<Vec<Member>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEMBER_SELECT_SQL}
             ORDER BY last_name COLLATE NOCASE ASC,
                      first_name COLLATE NOCASE ASC,
                      id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row)?);
        }

        Ok(members)
    }
}

fn parse_member_row(row: &Row<'_>) -> RepoResult<Member> {
    let is_active = match row.get::<_, i64>("is_active")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_active value `{other}` in members.is_active"
            )));
        }
    };

    Ok(Member {
        id: row.get("id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        phone_primary: row.get("phone_primary")?,
        is_active,
        area_id: row.get("area_id")?,
        leader_id: row.get("leader_id")?,
    })
}
