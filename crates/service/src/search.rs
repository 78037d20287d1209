//! Case-insensitive substring search over a fixed set of text columns.

use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, IntoColumnRef, LikeExpr};
use sea_orm::Condition;

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// `LOWER(col) LIKE '%term%'` OR-combined across `columns`.
pub fn any_column_contains<C>(term: &str, columns: impl IntoIterator<Item = C>) -> Condition
where
    C: IntoColumnRef,
{
    let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
    columns.into_iter().fold(Condition::any(), |cond, col| {
        cond.add(Expr::expr(Func::lower(Expr::col(col))).like(LikeExpr::new(pattern.clone()).escape('\\')))
    })
}

/// In-memory counterpart of [`any_column_contains`].
pub fn matches_any<'a>(term: &str, values: impl IntoIterator<Item = Option<&'a str>>) -> bool {
    let needle = term.to_lowercase();
    values
        .into_iter()
        .flatten()
        .any(|v| v.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn in_memory_match_is_case_insensitive_and_skips_nulls() {
        assert!(matches_any("PHO", [Some("Phone"), None]));
        assert!(matches_any("gadget", [Some("Phone"), Some("a small Gadget")]));
        assert!(!matches_any("tablet", [Some("Phone"), None]));
        assert!(matches_any("50%", [Some("now 50% off")]));
    }
}
