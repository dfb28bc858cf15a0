//! Text matching over product fields.
//!
//! User input never becomes a pattern language: `Substring` escapes `LIKE`
//! wildcards and `FullText` goes through `plainto_tsquery`, so a term like
//! `.*` or `100%` matches literally.

use sqlx::{Postgres, QueryBuilder};

use crate::models::Product;

/// A product column that text queries can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    Title,
    Description,
    Department,
    Category,
    Brand,
    Sku,
}

impl SearchField {
    /// Fields covered by free-text search.
    pub const ALL: [Self; 6] = [
        Self::Title,
        Self::Description,
        Self::Department,
        Self::Category,
        Self::Brand,
        Self::Sku,
    ];

    /// Column name in `catalog.product`.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Department => "department",
            Self::Category => "category",
            Self::Brand => "brand",
            Self::Sku => "sku",
        }
    }

    /// The field's value on a product, if any.
    #[must_use]
    pub fn value(self, product: &Product) -> Option<&str> {
        match self {
            Self::Title => Some(product.title.as_str()),
            Self::Description => product.description.as_deref(),
            Self::Department => product.department.as_deref(),
            Self::Category => product.category.as_deref(),
            Self::Brand => product.brand.as_deref(),
            Self::Sku => Some(product.sku.as_str()),
        }
    }
}

/// How a search term is matched, as selected by the `mode` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    Exact,
    #[default]
    Substring,
    FullText,
}

/// A text predicate over one or more product fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextQuery {
    /// Field equals the value exactly (case-sensitive).
    Exact { field: SearchField, value: String },
    /// Any field contains the needle, ignoring case.
    Substring {
        fields: Vec<SearchField>,
        needle: String,
    },
    /// Every word of `terms` appears as a word in the combined fields,
    /// ignoring case.
    FullText {
        fields: Vec<SearchField>,
        terms: String,
    },
}

impl TextQuery {
    /// Build a query in the given mode. `Exact` uses the first field.
    #[must_use]
    pub fn new(mode: MatchMode, fields: &[SearchField], term: &str) -> Self {
        match mode {
            MatchMode::Exact => Self::Exact {
                field: fields.first().copied().unwrap_or(SearchField::Title),
                value: term.to_owned(),
            },
            MatchMode::Substring => Self::Substring {
                fields: fields.to_vec(),
                needle: term.to_owned(),
            },
            MatchMode::FullText => Self::FullText {
                fields: fields.to_vec(),
                terms: term.to_owned(),
            },
        }
    }

    /// Case-insensitive substring match over the given fields.
    #[must_use]
    pub fn contains(fields: &[SearchField], needle: &str) -> Self {
        Self::new(MatchMode::Substring, fields, needle)
    }

    /// Evaluate against an in-memory product.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Self::Exact { field, value } => field.value(product) == Some(value.as_str()),
            Self::Substring { fields, needle } => {
                let needle = needle.to_lowercase();
                fields.iter().any(|field| {
                    field
                        .value(product)
                        .is_some_and(|v| v.to_lowercase().contains(&needle))
                })
            }
            Self::FullText { fields, terms } => {
                let words: Vec<String> = fields
                    .iter()
                    .filter_map(|field| field.value(product))
                    .flat_map(tokenize)
                    .collect();
                let mut wanted = tokenize(terms).peekable();
                wanted.peek().is_some() && wanted.all(|term| words.contains(&term))
            }
        }
    }

    /// Append this predicate to a SQL `WHERE` clause, binding user input.
    pub fn push_sql(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Self::Exact { field, value } => {
                builder.push(field.column());
                builder.push(" = ");
                builder.push_bind(value.clone());
            }
            Self::Substring { fields, needle } => {
                let pattern = format!("%{}%", escape_like(needle));
                builder.push("(");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        builder.push(" OR ");
                    }
                    builder.push(field.column());
                    builder.push(" ILIKE ");
                    builder.push_bind(pattern.clone());
                    builder.push(" ESCAPE '\\'");
                }
                if fields.is_empty() {
                    builder.push("FALSE");
                }
                builder.push(")");
            }
            Self::FullText { fields, terms } => {
                builder.push("to_tsvector('simple', ");
                if fields.is_empty() {
                    builder.push("''");
                }
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        builder.push(" || ' ' || ");
                    }
                    builder.push("coalesce(");
                    builder.push(field.column());
                    builder.push(", '')");
                }
                builder.push(") @@ plainto_tsquery('simple', ");
                builder.push_bind(terms.clone());
                builder.push(")");
            }
        }
    }
}

/// Escape `LIKE` metacharacters so the input matches literally.
#[must_use]
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}
