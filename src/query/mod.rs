use std::convert::TryFrom;

use diesel::prelude::*;
use diesel::result::Error as DieselError;

pub(crate) mod combo;
pub(crate) mod dish;
pub(crate) mod employee;
pub(crate) mod image;
pub(crate) mod ingredient;
pub(crate) mod menu;
pub(crate) mod store;
pub(crate) mod supplier;

no_arg_sql_function!(
    last_insert_id,
    diesel::sql_types::Unsigned<diesel::sql_types::BigInt>
);

/// Id of the row the last `INSERT` on this connection created.
pub(crate) fn inserted_id(conn: &MysqlConnection) -> QueryResult<i32> {
    let id: u64 = diesel::select(last_insert_id).get_result(conn)?;
    i32::try_from(id).map_err(|e| DieselError::DeserializationError(Box::new(e)))
}

/// `LIKE` pattern matching `keyword` anywhere, with wildcards in the
/// keyword itself escaped.
pub(crate) fn contains(keyword: &str) -> String {
    let escaped = keyword
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_keyword_matches_everything() {
        assert_eq!(contains(""), "%%");
        assert_eq!(contains("  "), "%%");
    }

    #[test]
    fn wildcards_in_keywords_are_literal() {
        assert_eq!(contains("50%"), "%50\\%%");
        assert_eq!(contains("a_b"), "%a\\_b%");
        assert_eq!(contains("burger"), "%burger%");
    }
}
