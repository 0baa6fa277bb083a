use crate::Database;
use crate::models::MemberRow;
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    pub fn create_member(&self, username: &str, email: &str, password_hash: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO member (username, email, password) VALUES (?1, ?2, ?3)",
                (username, email, password_hash),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_member_by_username(&self, username: &str) -> Result<Option<MemberRow>> {
        self.with_conn(|conn| query_member(conn, "username", username))
    }

    pub fn get_member_by_email(&self, email: &str) -> Result<Option<MemberRow>> {
        self.with_conn(|conn| query_member(conn, "email", email))
    }
}

fn query_member(conn: &Connection, column: &str, value: &str) -> Result<Option<MemberRow>> {
    // `column` is one of our own identifiers, never caller input.
    let sql = format!(
        "SELECT id, username, email, password, created_at, updated_at FROM member WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(MemberRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                created_at: row.get(4)?,
                updated_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    #[test]
    fn create_and_fetch_member() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .create_member("alice", "alice@example.com", "$2b$12$hash")
            .unwrap();
        assert!(id > 0);

        let by_name = db.get_member_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.email, "alice@example.com");
        assert_eq!(by_name.password, "$2b$12$hash");

        let by_email = db.get_member_by_email("alice@example.com").unwrap().unwrap();
        assert_eq!(by_email.username, "alice");

        assert!(db.get_member_by_username("bob").unwrap().is_none());
    }

    #[test]
    fn username_and_email_are_unique() {
        let db = Database::open_in_memory().unwrap();
        db.create_member("alice", "alice@example.com", "h").unwrap();

        assert!(db.create_member("alice", "other@example.com", "h").is_err());
        assert!(db.create_member("other", "alice@example.com", "h").is_err());
    }

    #[test]
    fn migrations_are_idempotent_across_reopen() {
        let db = Database::open_in_memory().unwrap();
        // Running the migration list again on the same connection is a no-op.
        db.with_conn(|conn| crate::migrations::run(conn)).unwrap();
        db.create_member("alice", "alice@example.com", "h").unwrap();
    }
}
