use std::fmt;

/// SQL type of a warehouse column.
///
/// Only the handful of types the star schema uses are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Variable-length text (`VARCHAR`).
    Varchar,
    /// 32-bit integer (`INT`).
    Int,
    /// 64-bit integer (`BIGINT`).
    BigInt,
    /// Arbitrary precision number (`DECIMAL`).
    Decimal,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sql = match self {
            ColumnType::Varchar => "varchar",
            ColumnType::Int => "int",
            ColumnType::BigInt => "bigint",
            ColumnType::Decimal => "decimal",
        };
        f.write_str(sql)
    }
}

/// A single column declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: &'static str,
    column_type: ColumnType,
    nullable: bool,
    primary_key: bool,
    identity: bool,
}

impl Column {
    /// A nullable column.
    pub const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            nullable: true,
            primary_key: false,
            identity: false,
        }
    }

    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Marks the column as the table's primary key. Implies `NOT NULL`.
    pub const fn primary_key(mut self) -> Self {
        self.nullable = false;
        self.primary_key = true;
        self
    }

    /// Marks the column as a warehouse generated surrogate key. Implies `NOT NULL`.
    pub const fn identity(mut self) -> Self {
        self.nullable = false;
        self.identity = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    #[cfg(test)]
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    #[cfg(test)]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    #[cfg(test)]
    pub fn is_identity(&self) -> bool {
        self.identity
    }

    fn render(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.column_type);
        sql.push_str(if self.nullable { " NULL" } else { " NOT NULL" });
        if self.identity {
            sql.push_str(" GENERATED ALWAYS AS IDENTITY");
        }
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        sql
    }
}

/// Warehouse table definition.
///
/// A table is a name plus an ordered list of columns. The definition is the
/// single source for both its `CREATE` and `DROP` statements, so the
/// declared shape and the executed DDL cannot drift apart.
///
/// # Example
///
/// ```
/// use warehouse::{Column, ColumnType, Table};
///
/// let table = Table::new(
///     "dim_song",
///     vec![
///         Column::new("song_id", ColumnType::Varchar).primary_key(),
///         Column::new("title", ColumnType::Varchar),
///     ],
/// );
/// assert!(table.create_sql().contains("song_id varchar NOT NULL PRIMARY KEY"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: &'static str,
    columns: Vec<Column>,
}

impl Table {
    /// Creates a new `Table`.
    ///
    /// # Arguments
    ///
    /// * `name` - The unqualified table name.
    /// * `columns` - Column declarations in the order they are created.
    pub fn new(name: &'static str, columns: Vec<Column>) -> Self {
        Self { name, columns }
    }

    /// Returns the name of the table.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the columns in declaration order.
    #[cfg(test)]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the primary key column name, if the table declares one.
    pub fn primary_key(&self) -> Option<&'static str> {
        self.columns
            .iter()
            .find(|c| c.is_primary_key())
            .map(Column::name)
    }

    /// Renders `CREATE TABLE IF NOT EXISTS` for this table.
    pub fn create_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("    {}", c.render()))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("CREATE TABLE IF NOT EXISTS {}\n(\n{}\n)", self.name, columns)
    }

    /// Renders `DROP TABLE IF EXISTS` for this table.
    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_identity_column() {
        let column = Column::new("songplay_id", ColumnType::Int).identity();
        assert_eq!(
            column.render(),
            "songplay_id int NOT NULL GENERATED ALWAYS AS IDENTITY"
        );
    }

    #[test]
    fn table_without_key_has_no_primary_key() {
        let table = Table::new("t", vec![Column::new("a", ColumnType::BigInt)]);
        assert_eq!(table.primary_key(), None);
        assert_eq!(table.create_sql(), "CREATE TABLE IF NOT EXISTS t\n(\n    a bigint NULL\n)");
        assert_eq!(table.drop_sql(), "DROP TABLE IF EXISTS t");
    }
}
