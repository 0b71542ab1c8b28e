//! Catalog rows: placeholders for empty branches and purchasable papers.
//!
//! The catalog is a three level hierarchy (department, semester, year) stored
//! as flat rows. A branch with no papers yet is represented by a placeholder
//! row tagged with its [`EntryKind`]; placeholders carry empty segments below
//! their level, an empty name and locator, and price 0. They never show up in
//! item listings and can never be purchased.

use sea_orm::entity::{ActiveValue, prelude::*};

use crate::{EngineError, ResultEngine};

/// Explicit tag for what a catalog row represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Department,
    Semester,
    Year,
    Paper,
}

impl EntryKind {
    /// Canonical string stored in the `kind` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Department => "department",
            Self::Semester => "semester",
            Self::Year => "year",
            Self::Paper => "paper",
        }
    }

    pub fn parse(value: &str) -> ResultEngine<Self> {
        match value {
            "department" => Ok(Self::Department),
            "semester" => Ok(Self::Semester),
            "year" => Ok(Self::Year),
            "paper" => Ok(Self::Paper),
            other => Err(EngineError::NotFound(format!("entry kind {other}"))),
        }
    }
}

/// A purchasable question paper.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paper {
    pub id: i64,
    pub department: String,
    pub semester: String,
    pub year: String,
    pub name: String,
    /// Opaque delivery handle. The engine never interprets it; the bot uses
    /// it as a Telegram file id.
    pub locator: String,
    /// Price in stars, never negative.
    pub price: i64,
}

impl From<Model> for Paper {
    fn from(value: Model) -> Self {
        Self {
            id: value.id,
            department: value.department,
            semester: value.semester,
            year: value.year,
            name: value.name,
            locator: value.locator,
            price: value.price,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "catalog_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub kind: String,
    pub department: String,
    pub semester: String,
    pub year: String,
    pub name: String,
    pub locator: String,
    pub price: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ownerships::Entity")]
    Ownerships,
}

impl Related<super::ownerships::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ownerships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Row for an empty branch at `kind` level. Segments below the level stay
/// empty.
pub(crate) fn placeholder(
    kind: EntryKind,
    department: &str,
    semester: &str,
    year: &str,
) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::NotSet,
        kind: ActiveValue::Set(kind.as_str().to_string()),
        department: ActiveValue::Set(department.to_string()),
        semester: ActiveValue::Set(semester.to_string()),
        year: ActiveValue::Set(year.to_string()),
        name: ActiveValue::Set(String::new()),
        locator: ActiveValue::Set(String::new()),
        price: ActiveValue::Set(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trip() {
        for kind in [
            EntryKind::Department,
            EntryKind::Semester,
            EntryKind::Year,
            EntryKind::Paper,
        ] {
            assert_eq!(EntryKind::parse(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(EntryKind::parse("__DEPT__").is_err());
    }
}
