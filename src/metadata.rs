//! Catalog queries behind `\dt`, `\dv`, `\ds`, `\di` and `\d`
//!
//! The database product is sniffed from the connection's product name and
//! each listing is answered with a vendor-specific query. Unknown products
//! fall back to `information_schema`.

use crate::commands::special::Listing;
use crate::error::{SqlToolError, SqlToolResult};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vendor {
    Sqlite,
    Generic,
}

impl Vendor {
    pub fn sniff(product_name: &str) -> Self {
        if product_name.to_ascii_lowercase().contains("sqlite") {
            Vendor::Sqlite
        } else {
            Vendor::Generic
        }
    }
}

/// A catalog query and how to display its result
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub sql: String,
    pub params: Vec<Value>,
    /// 1-based result columns to display; `None` shows all
    pub columns: Option<Vec<usize>>,
}

impl CatalogQuery {
    fn new(sql: &str) -> Self {
        CatalogQuery {
            sql: sql.to_string(),
            params: Vec::new(),
            columns: None,
        }
    }

    fn with_columns(mut self, columns: &[usize]) -> Self {
        self.columns = Some(columns.to_vec());
        self
    }

    /// Append `clause` and bind a LIKE pattern when a filter is given
    fn filtered(mut self, clause: &str, filter: Option<&str>, order: &str) -> Self {
        if let Some(filter) = filter {
            self.sql.push_str(clause);
            self.params.push(Value::Text(like_pattern(filter)));
        }
        self.sql.push_str(order);
        self
    }
}

/// A bare name matches as a substring; explicit wildcards are kept
fn like_pattern(filter: &str) -> String {
    if filter.contains(['%', '_']) {
        filter.to_string()
    } else {
        format!("%{}%", filter)
    }
}

/// Query for a `\dt`-style listing
pub fn listing_query(
    vendor: Vendor,
    listing: Listing,
    filter: Option<&str>,
) -> SqlToolResult<CatalogQuery> {
    let query = match (vendor, listing) {
        (Vendor::Sqlite, Listing::Tables) => CatalogQuery::new(
            "SELECT name AS table_name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .filtered(" AND name LIKE ?", filter, " ORDER BY name"),
        (Vendor::Sqlite, Listing::Views) => CatalogQuery::new(
            "SELECT name AS view_name FROM sqlite_master WHERE type = 'view'",
        )
        .filtered(" AND name LIKE ?", filter, " ORDER BY name"),
        (Vendor::Sqlite, Listing::Schemas) => {
            CatalogQuery::new("PRAGMA database_list").with_columns(&[2, 3])
        }
        (Vendor::Sqlite, Listing::Indexes) => CatalogQuery::new(
            "SELECT name AS index_name, tbl_name AS table_name FROM sqlite_master \
             WHERE type = 'index'",
        )
        .filtered(" AND tbl_name LIKE ?", filter, " ORDER BY tbl_name, name"),
        (Vendor::Generic, Listing::Tables) => CatalogQuery::new(
            "SELECT table_schema, table_name FROM information_schema.tables \
             WHERE table_type = 'BASE TABLE'",
        )
        .filtered(
            " AND table_name LIKE ?",
            filter,
            " ORDER BY table_schema, table_name",
        ),
        (Vendor::Generic, Listing::Views) => CatalogQuery::new(
            "SELECT table_schema, table_name FROM information_schema.views WHERE 1 = 1",
        )
        .filtered(
            " AND table_name LIKE ?",
            filter,
            " ORDER BY table_schema, table_name",
        ),
        (Vendor::Generic, Listing::Schemas) => CatalogQuery::new(
            "SELECT schema_name FROM information_schema.schemata ORDER BY schema_name",
        ),
        (Vendor::Generic, Listing::Indexes) => {
            return Err(SqlToolError::BadSpecialCommand {
                command: "di".to_string(),
                reason: "index listing is not available for this database".to_string(),
            })
        }
    };
    Ok(query)
}

/// Query describing the columns of `table`
pub fn describe_query(vendor: Vendor, table: &str) -> CatalogQuery {
    let mut query = match vendor {
        Vendor::Sqlite => {
            CatalogQuery::new("SELECT * FROM pragma_table_info(?)").with_columns(&[2, 3, 4, 6])
        }
        Vendor::Generic => CatalogQuery::new(
            "SELECT column_name, data_type, is_nullable FROM information_schema.columns \
             WHERE table_name = ? ORDER BY ordinal_position",
        ),
    };
    query.params.push(Value::Text(table.to_string()));
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_sniffing() {
        assert_eq!(Vendor::sniff("SQLite 3.45.0"), Vendor::Sqlite);
        assert_eq!(Vendor::sniff("PostgreSQL"), Vendor::Generic);
    }

    #[test]
    fn test_filtered_listing() {
        let q = listing_query(Vendor::Sqlite, Listing::Tables, Some("item")).unwrap();
        assert!(q.sql.contains("name LIKE ?"));
        assert!(q.sql.ends_with("ORDER BY name"));
        assert_eq!(q.params, vec![Value::Text("%item%".to_string())]);

        let q = listing_query(Vendor::Sqlite, Listing::Tables, None).unwrap();
        assert!(q.params.is_empty());
        assert!(!q.sql.contains("LIKE ?"));
    }

    #[test]
    fn test_describe_columns() {
        let q = describe_query(Vendor::Sqlite, "items");
        assert_eq!(q.columns, Some(vec![2, 3, 4, 6]));
        assert!(listing_query(Vendor::Generic, Listing::Indexes, None).is_err());
    }
}
