//! Sort keys.
//!
//! Sorting is declared as free-form `"field DIRECTION[, field DIRECTION]"`
//! text and parsed into typed terms so field names can be quoted and
//! directions validated before they reach a statement.

use std::fmt;

use crate::filter::quote_ident;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Some(Direction::Asc),
            "DESC" => Some(Direction::Desc),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortTerm {
    pub field: String,
    pub direction: Direction,
}

/// Ordered list of sort terms. The default is `id DESC`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    terms: Vec<SortTerm>,
}

impl Default for SortKey {
    fn default() -> Self {
        Self::by("id", Direction::Desc)
    }
}

impl SortKey {
    pub fn by(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            terms: vec![SortTerm {
                field: field.into(),
                direction,
            }],
        }
    }

    pub fn then(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.terms.push(SortTerm {
            field: field.into(),
            direction,
        });
        self
    }

    /// Parse `"createdAt DESC, id"` style text.
    ///
    /// A missing direction means ascending. Returns `None` when the text is
    /// empty or any term has more than two words or an unknown direction.
    pub fn parse(text: &str) -> Option<Self> {
        let mut terms = Vec::new();
        for part in text.split(',') {
            let mut words = part.split_whitespace();
            let field = words.next()?;
            let direction = match words.next() {
                Some(d) => Direction::parse(d)?,
                None => Direction::Asc,
            };
            if words.next().is_some() {
                return None;
            }
            terms.push(SortTerm {
                field: field.to_string(),
                direction,
            });
        }
        Some(Self { terms })
    }

    pub fn terms(&self) -> &[SortTerm] {
        &self.terms
    }

    /// Render the `ORDER BY` body with quoted identifiers.
    pub fn to_sql(&self) -> String {
        self.terms
            .iter()
            .map(|t| format!("{} {}", quote_ident(&t.field), t.direction.as_sql()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, t) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", t.field, t.direction.as_sql())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_id_desc() {
        assert_eq!(SortKey::default().to_string(), "id DESC");
    }

    #[test]
    fn parses_multiple_terms() {
        let key = SortKey::parse("isBest DESC, id desc").unwrap();
        assert_eq!(key.to_string(), "isBest DESC, id DESC");
        assert_eq!(key.to_sql(), "\"isBest\" DESC, \"id\" DESC");
    }

    #[test]
    fn missing_direction_is_ascending() {
        let key = SortKey::parse("likes").unwrap();
        assert_eq!(key.terms()[0].direction, Direction::Asc);
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(SortKey::parse("").is_none());
        assert!(SortKey::parse("id sideways").is_none());
        assert!(SortKey::parse("id DESC; DROP").is_none());
    }
}
