use sea_orm::DatabaseConnection;
use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, ResultEngine};

mod catalog;
mod ledger;
pub(crate) mod purchases;
pub(crate) mod reconcile;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// The block runs as its own async block, so an early `return Ok(...)` inside
/// it leaves the block, not the surrounding function, and still commits.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        match async { $body }.await {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// Normalize a catalog segment (department, semester or year).
///
/// Segments travel inside payment payloads delimited by `_`, so the
/// underscore is rejected here once instead of being escaped everywhere else.
fn normalize_segment(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} must not be empty"
        )));
    }
    if trimmed.contains('_') {
        return Err(EngineError::InvalidAmount(format!(
            "{label} must not contain '_'"
        )));
    }
    Ok(trimmed.nfc().collect())
}

/// Normalize a paper name. Names never enter payloads, so only emptiness is
/// rejected.
fn normalize_paper_name(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidAmount(
            "paper name must not be empty".to_string(),
        ));
    }
    Ok(trimmed.nfc().collect())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_is_trimmed() {
        assert_eq!(normalize_segment("  CSE ", "department").unwrap(), "CSE");
    }

    #[test]
    fn segment_rejects_underscore() {
        assert_eq!(
            normalize_segment("Sem_3", "semester").unwrap_err(),
            EngineError::InvalidAmount("semester must not contain '_'".to_string())
        );
    }

    #[test]
    fn segment_rejects_empty() {
        assert!(normalize_segment("   ", "year").is_err());
    }

    #[test]
    fn paper_name_allows_underscore() {
        assert_eq!(
            normalize_paper_name("Maths_Mid Sem").unwrap(),
            "Maths_Mid Sem"
        );
    }
}
