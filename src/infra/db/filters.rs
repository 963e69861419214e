//! Translation of validated search queries into SQL predicates.

use sqlx::{Postgres, QueryBuilder};

use crate::application::search::{FilterField, FilterQuery, FilterValue, SearchScope};

/// Append ` AND ...` clauses for `query` to a statement whose `WHERE` is
/// already open. Every value is bound; only column names from the closed
/// [`FilterField`] set are written into the SQL text.
pub fn push_filter_predicate(
    qb: &mut QueryBuilder<'_, Postgres>,
    scope: SearchScope,
    alias: &str,
    query: &FilterQuery,
) {
    for constraint in &query.constraints {
        qb.push(" AND ");
        push_column(qb, alias, constraint.field);
        qb.push(" = ");
        match &constraint.value {
            FilterValue::Integer(value) => qb.push_bind(*value),
            FilterValue::Boolean(value) => qb.push_bind(*value),
            FilterValue::Text(value) => qb.push_bind(value.clone()),
        };
    }

    if query.full_text.is_empty() {
        return;
    }

    let pattern = format!("%{}%", escape_like(&query.full_text));
    qb.push(" AND (");
    for (index, column) in scope.text_columns().iter().enumerate() {
        if index > 0 {
            qb.push(" OR ");
        }
        if scope == SearchScope::Posts {
            qb.push(format!(
                "EXISTS (SELECT 1 FROM jsonb_each_text({alias}.{column}) AS f WHERE f.value ILIKE "
            ));
            qb.push_bind(pattern.clone());
            qb.push(")");
        } else {
            qb.push(format!("{alias}.{column} ILIKE "));
            qb.push_bind(pattern.clone());
        }
    }
    qb.push(")");
}

fn push_column(qb: &mut QueryBuilder<'_, Postgres>, alias: &str, field: FilterField) {
    // Top-level pages are stored with a NULL parent but filtered as `parent_id:0`.
    if field == FilterField::ParentId {
        qb.push(format!("COALESCE({alias}.parent_id, 0)"));
    } else {
        qb.push(format!("{alias}.{}", field.column()));
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
