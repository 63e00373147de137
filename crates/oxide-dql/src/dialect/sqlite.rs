use super::Dialect;

/// SQLite: modern releases support `RETURNING`; boolean literals are plain
/// `TRUE`/`FALSE` aliases for `1`/`0`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite3"
    }
}
