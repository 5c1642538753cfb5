//! Column definitions.
//!
//! A [`ColumnDefinition`] describes one column of a table mutation: its name,
//! type and modifiers. Definitions are created by the [`Blueprint`] column
//! methods and tweaked through chained `&mut self` modifiers:
//!
//! ```rust
//! use oxide_blueprint_core::Blueprint;
//!
//! let blueprint = Blueprint::new("users", |table| {
//!     table.string("email").nullable().unique();
//!     table.integer("age").default_int(18).change();
//! });
//!
//! assert_eq!(blueprint.columns().len(), 2);
//! ```
//!
//! [`Blueprint`]: crate::Blueprint

use serde::{Deserialize, Serialize};

use crate::command::IndexKind;

/// Default length of `string` columns.
pub const DEFAULT_STRING_LENGTH: u32 = 255;

/// Dialect-independent column types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Variable-length string with a maximum length.
    String(u32),
    /// Fixed-length string.
    Char(u32),
    /// Unbounded text.
    Text,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    BigInteger,
    /// 16-bit integer.
    SmallInteger,
    /// 8-bit integer.
    TinyInteger,
    /// Boolean.
    Boolean,
    /// Single precision floating point.
    Float,
    /// Double precision floating point.
    Double,
    /// Exact numeric with precision and scale.
    Decimal(u8, u8),
    /// Date only.
    Date,
    /// Date and time.
    DateTime,
    /// Timestamp.
    Timestamp,
    /// Time only.
    Time,
    /// JSON document.
    Json,
    /// UUID.
    Uuid,
    /// Binary large object.
    Binary,
    /// A raw type name emitted verbatim by every dialect.
    Custom(String),
}

impl ColumnType {
    /// Returns true for the integer family (the types `unsigned` and
    /// `auto_increment` apply to).
    #[must_use]
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Integer | Self::BigInteger | Self::SmallInteger | Self::TinyInteger
        )
    }

    /// Returns true for types that carry a collation.
    #[must_use]
    pub fn is_string_like(&self) -> bool {
        matches!(self, Self::String(_) | Self::Char(_) | Self::Text)
    }
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    /// NULL default.
    Null,
    /// Boolean default.
    Bool(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// Raw SQL expression (e.g. `CURRENT_TIMESTAMP`), never quoted.
    Expression(String),
}

impl DefaultValue {
    /// Renders the value as a quoted literal, the way the grammars emit
    /// `default` clauses. Expressions stay raw.
    #[must_use]
    pub fn to_quoted_sql(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => format!("'{}'", u8::from(*b)),
            Self::Integer(i) => format!("'{i}'"),
            Self::Float(f) => format!("'{f}'"),
            Self::String(s) => quote_string(s),
            Self::Expression(expr) => expr.clone(),
        }
    }

    /// Renders the value as a bare SQL literal: numbers unquoted, booleans
    /// as `1`/`0`, strings quoted.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(b) => u8::from(*b).to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => quote_string(s),
            Self::Expression(expr) => expr.clone(),
        }
    }
}

/// Single-quotes a string literal, doubling embedded quotes.
#[must_use]
pub fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// An index requested from a column modifier such as `.unique()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnIndex {
    /// Kind of index.
    pub kind: IndexKind,
    /// Explicit name; inferred from the table and column when absent.
    #[serde(default)]
    pub name: Option<String>,
}

/// A column declared on a blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name.
    pub name: String,
    /// Column type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Whether NULL is allowed. Columns are NOT NULL unless marked.
    #[serde(default)]
    pub nullable: bool,
    /// Default value.
    #[serde(default)]
    pub default: Option<DefaultValue>,
    /// Collation token, emitted verbatim.
    #[serde(default)]
    pub collation: Option<String>,
    /// Unsigned integer.
    #[serde(default)]
    pub unsigned: bool,
    /// Auto-incrementing primary key.
    #[serde(default)]
    pub auto_increment: bool,
    /// Alters an existing column instead of adding a new one.
    #[serde(default)]
    pub change: bool,
    /// Column comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// Places the column after another one (MySQL only).
    #[serde(default)]
    pub after: Option<String>,
    /// Indexes requested through column modifiers.
    #[serde(default)]
    pub indexes: Vec<ColumnIndex>,
}

impl ColumnDefinition {
    /// Creates a NOT NULL column with no modifiers.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            default: None,
            collation: None,
            unsigned: false,
            auto_increment: false,
            change: false,
            comment: None,
            after: None,
            indexes: Vec::new(),
        }
    }

    /// Allows NULL values.
    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }

    /// Disallows NULL values (the default).
    pub fn not_null(&mut self) -> &mut Self {
        self.nullable = false;
        self
    }

    /// Sets an arbitrary default value.
    pub fn default_value(&mut self, value: DefaultValue) -> &mut Self {
        self.default = Some(value);
        self
    }

    /// Sets a boolean default value.
    pub fn default_bool(&mut self, value: bool) -> &mut Self {
        self.default_value(DefaultValue::Bool(value))
    }

    /// Sets an integer default value.
    pub fn default_int(&mut self, value: i64) -> &mut Self {
        self.default_value(DefaultValue::Integer(value))
    }

    /// Sets a string default value.
    pub fn default_str(&mut self, value: impl Into<String>) -> &mut Self {
        self.default_value(DefaultValue::String(value.into()))
    }

    /// Sets a raw SQL expression as default (e.g. `CURRENT_TIMESTAMP`).
    pub fn default_expr(&mut self, expr: impl Into<String>) -> &mut Self {
        self.default_value(DefaultValue::Expression(expr.into()))
    }

    /// Sets the collation.
    pub fn collation(&mut self, collation: impl Into<String>) -> &mut Self {
        self.collation = Some(collation.into());
        self
    }

    /// Marks an integer column unsigned.
    pub fn unsigned(&mut self) -> &mut Self {
        self.unsigned = true;
        self
    }

    /// Marks the column as an auto-incrementing primary key.
    pub fn auto_increment(&mut self) -> &mut Self {
        self.auto_increment = true;
        self
    }

    /// Sets the column comment.
    pub fn comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = Some(comment.into());
        self
    }

    /// Places the column after `column` (MySQL only).
    pub fn after(&mut self, column: impl Into<String>) -> &mut Self {
        self.after = Some(column.into());
        self
    }

    /// Marks the definition as a modification of an existing column.
    pub fn change(&mut self) -> &mut Self {
        self.change = true;
        self
    }

    /// Requests a unique index with an inferred name.
    pub fn unique(&mut self) -> &mut Self {
        self.push_index(IndexKind::Unique, None)
    }

    /// Requests a unique index with the given name.
    pub fn unique_named(&mut self, name: impl Into<String>) -> &mut Self {
        self.push_index(IndexKind::Unique, Some(name.into()))
    }

    /// Requests a plain index with an inferred name.
    pub fn index(&mut self) -> &mut Self {
        self.push_index(IndexKind::Index, None)
    }

    /// Requests a plain index with the given name.
    pub fn index_named(&mut self, name: impl Into<String>) -> &mut Self {
        self.push_index(IndexKind::Index, Some(name.into()))
    }

    /// Requests a primary key on this column.
    pub fn primary(&mut self) -> &mut Self {
        self.push_index(IndexKind::Primary, None)
    }

    fn push_index(&mut self, kind: IndexKind, name: Option<String>) -> &mut Self {
        self.indexes.push(ColumnIndex { kind, name });
        self
    }
}
