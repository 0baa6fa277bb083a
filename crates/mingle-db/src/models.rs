/// Database row types — these map directly to SQLite rows.

pub struct MemberRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
    pub updated_at: String,
}
