//! Column types and definitions recorded on a blueprint.

use serde::{Deserialize, Serialize};

use crate::sql::value::{Operand, Value};

/// Column data types with their type-specific parameters.
///
/// Each dialect maps these to its own type names; types an engine cannot
/// express fail at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ColumnType {
    Char { length: u32 },
    String { length: u32 },
    TinyText,
    Text,
    MediumText,
    LongText,
    TinyInteger,
    SmallInteger,
    MediumInteger,
    Integer,
    BigInteger,
    Float { total: u32, places: u32 },
    Double { total: Option<u32>, places: Option<u32> },
    Decimal { total: u32, places: u32 },
    Boolean,
    Enum { allowed: Vec<String> },
    Set { allowed: Vec<String> },
    Json,
    Jsonb,
    Date,
    DateTime { precision: Option<u32> },
    DateTimeTz { precision: Option<u32> },
    Time { precision: Option<u32> },
    TimeTz { precision: Option<u32> },
    Timestamp { precision: Option<u32> },
    TimestampTz { precision: Option<u32> },
    Year,
    Binary,
    Uuid,
    IpAddress,
    MacAddress,
}

impl ColumnType {
    /// Integer types that can carry an auto-increment modifier.
    pub fn is_serial(&self) -> bool {
        matches!(
            self,
            ColumnType::TinyInteger
                | ColumnType::SmallInteger
                | ColumnType::MediumInteger
                | ColumnType::Integer
                | ColumnType::BigInteger
        )
    }
}

/// A fluent index request on a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexMarker {
    /// Use the generated index name.
    Default,
    Named(String),
}

/// One column of a blueprint.
///
/// Modifiers are set through the chained `&mut` methods:
///
/// ```ignore
/// table.string("email", 255).nullable().unique();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(flatten)]
    pub kind: ColumnType,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub unsigned: bool,
    #[serde(default)]
    pub auto_increment: bool,
    pub default: Option<Operand>,
    /// Modify an existing column instead of adding one.
    #[serde(default)]
    pub change: bool,
    pub after: Option<String>,
    #[serde(default)]
    pub first: bool,
    pub comment: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub virtual_as: Option<String>,
    pub stored_as: Option<String>,
    #[serde(default)]
    pub persisted: bool,
    #[serde(default)]
    pub use_current: bool,
    #[serde(default)]
    pub use_current_on_update: bool,
    pub starting_value: Option<u64>,
    pub primary: Option<IndexMarker>,
    pub unique: Option<IndexMarker>,
    pub index: Option<IndexMarker>,
    pub spatial_index: Option<IndexMarker>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            unsigned: false,
            auto_increment: false,
            default: None,
            change: false,
            after: None,
            first: false,
            comment: None,
            charset: None,
            collation: None,
            virtual_as: None,
            stored_as: None,
            persisted: false,
            use_current: false,
            use_current_on_update: false,
            starting_value: None,
            primary: None,
            unique: None,
            index: None,
            spatial_index: None,
        }
    }

    /// Whether the value is computed from an expression.
    pub fn is_generated(&self) -> bool {
        self.virtual_as.is_some() || self.stored_as.is_some()
    }

    // =========================================================================
    // Modifiers
    // =========================================================================

    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }

    pub fn not_null(&mut self) -> &mut Self {
        self.nullable = false;
        self
    }

    pub fn unsigned(&mut self) -> &mut Self {
        self.unsigned = true;
        self
    }

    pub fn auto_increment(&mut self) -> &mut Self {
        self.auto_increment = true;
        self
    }

    /// Default value; booleans render as `'1'`/`'0'`.
    pub fn default(&mut self, value: impl Into<Value>) -> &mut Self {
        self.default = Some(Operand::Value(value.into()));
        self
    }

    /// Default given as a raw SQL expression.
    pub fn default_raw(&mut self, sql: impl Into<String>) -> &mut Self {
        self.default = Some(Operand::Raw(crate::sql::value::raw(sql)));
        self
    }

    /// Modify the existing column to match this definition.
    pub fn change(&mut self) -> &mut Self {
        self.change = true;
        self
    }

    /// Place after another column (MySQL).
    pub fn after(&mut self, column: impl Into<String>) -> &mut Self {
        self.after = Some(column.into());
        self
    }

    /// Place first in the table (MySQL).
    pub fn first(&mut self) -> &mut Self {
        self.first = true;
        self
    }

    pub fn comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn charset(&mut self, charset: impl Into<String>) -> &mut Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn collation(&mut self, collation: impl Into<String>) -> &mut Self {
        self.collation = Some(collation.into());
        self
    }

    pub fn virtual_as(&mut self, expression: impl Into<String>) -> &mut Self {
        self.virtual_as = Some(expression.into());
        self
    }

    pub fn stored_as(&mut self, expression: impl Into<String>) -> &mut Self {
        self.stored_as = Some(expression.into());
        self
    }

    /// Store a computed column (SQL Server).
    pub fn persisted(&mut self) -> &mut Self {
        self.persisted = true;
        self
    }

    /// Default to the current timestamp.
    pub fn use_current(&mut self) -> &mut Self {
        self.use_current = true;
        self
    }

    /// Refresh with the current timestamp on update (MySQL).
    pub fn use_current_on_update(&mut self) -> &mut Self {
        self.use_current_on_update = true;
        self
    }

    /// First value of an auto-increment column.
    pub fn starting_value(&mut self, value: u64) -> &mut Self {
        self.starting_value = Some(value);
        self
    }

    // =========================================================================
    // Fluent indexes
    // =========================================================================

    pub fn primary(&mut self) -> &mut Self {
        self.primary = Some(IndexMarker::Default);
        self
    }

    pub fn unique(&mut self) -> &mut Self {
        self.unique = Some(IndexMarker::Default);
        self
    }

    pub fn unique_named(&mut self, name: impl Into<String>) -> &mut Self {
        self.unique = Some(IndexMarker::Named(name.into()));
        self
    }

    pub fn index(&mut self) -> &mut Self {
        self.index = Some(IndexMarker::Default);
        self
    }

    pub fn index_named(&mut self, name: impl Into<String>) -> &mut Self {
        self.index = Some(IndexMarker::Named(name.into()));
        self
    }

    pub fn spatial_index(&mut self) -> &mut Self {
        self.spatial_index = Some(IndexMarker::Default);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_chain() {
        let mut column = ColumnDefinition::new("email", ColumnType::String { length: 255 });
        column.nullable().unique().comment("login");
        assert!(column.nullable);
        assert_eq!(column.unique, Some(IndexMarker::Default));
        assert_eq!(column.comment.as_deref(), Some("login"));
    }

    #[test]
    fn test_deserialize_flattened_type() {
        let column: ColumnDefinition = serde_json::from_str(
            r#"{"name": "title", "type": "string", "length": 100, "nullable": true}"#,
        )
        .unwrap();
        assert_eq!(column.kind, ColumnType::String { length: 100 });
        assert!(column.nullable);
        assert!(!column.change);
    }

    #[test]
    fn test_serial_types() {
        assert!(ColumnType::BigInteger.is_serial());
        assert!(!ColumnType::Decimal { total: 8, places: 2 }.is_serial());
    }
}
