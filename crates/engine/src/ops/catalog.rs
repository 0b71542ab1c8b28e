use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};

use crate::{
    EngineError, EntryKind, Paper, ResultEngine,
    catalog_entries::{self, placeholder},
};

use super::{Engine, normalize_paper_name, normalize_segment, with_tx};

impl Engine {
    /// Every department, in creation order.
    pub async fn departments(&self) -> ResultEngine<Vec<String>> {
        let rows: Vec<String> = catalog_entries::Entity::find()
            .select_only()
            .column(catalog_entries::Column::Department)
            .order_by_asc(catalog_entries::Column::Id)
            .into_tuple()
            .all(&self.database)
            .await?;

        Ok(distinct_in_order(rows))
    }

    /// Semesters under a department, in creation order.
    ///
    /// The department's own placeholder has an empty semester segment and is
    /// filtered out.
    pub async fn semesters(&self, department: &str) -> ResultEngine<Vec<String>> {
        let rows: Vec<String> = catalog_entries::Entity::find()
            .select_only()
            .column(catalog_entries::Column::Semester)
            .filter(catalog_entries::Column::Department.eq(department))
            .filter(catalog_entries::Column::Semester.ne(""))
            .order_by_asc(catalog_entries::Column::Id)
            .into_tuple()
            .all(&self.database)
            .await?;

        Ok(distinct_in_order(rows))
    }

    /// Years under a department and semester, in creation order.
    pub async fn years(&self, department: &str, semester: &str) -> ResultEngine<Vec<String>> {
        let rows: Vec<String> = catalog_entries::Entity::find()
            .select_only()
            .column(catalog_entries::Column::Year)
            .filter(catalog_entries::Column::Department.eq(department))
            .filter(catalog_entries::Column::Semester.eq(semester))
            .filter(catalog_entries::Column::Year.ne(""))
            .order_by_asc(catalog_entries::Column::Id)
            .into_tuple()
            .all(&self.database)
            .await?;

        Ok(distinct_in_order(rows))
    }

    /// Purchasable papers at a tuple, in creation order. Placeholders never
    /// appear here.
    pub async fn papers(
        &self,
        department: &str,
        semester: &str,
        year: &str,
    ) -> ResultEngine<Vec<Paper>> {
        self.papers_on(&self.database, department, semester, year)
            .await
    }

    /// Single paper lookup by id. Placeholder rows are invisible here.
    pub async fn paper(&self, paper_id: i64) -> ResultEngine<Paper> {
        self.paper_on(&self.database, paper_id).await
    }

    pub(crate) async fn papers_on<C: ConnectionTrait>(
        &self,
        db: &C,
        department: &str,
        semester: &str,
        year: &str,
    ) -> ResultEngine<Vec<Paper>> {
        let models = catalog_entries::Entity::find()
            .filter(catalog_entries::Column::Kind.eq(EntryKind::Paper.as_str()))
            .filter(catalog_entries::Column::Department.eq(department))
            .filter(catalog_entries::Column::Semester.eq(semester))
            .filter(catalog_entries::Column::Year.eq(year))
            .order_by_asc(catalog_entries::Column::Id)
            .all(db)
            .await?;

        Ok(models.into_iter().map(Paper::from).collect())
    }

    pub(crate) async fn paper_on<C: ConnectionTrait>(
        &self,
        db: &C,
        paper_id: i64,
    ) -> ResultEngine<Paper> {
        let model = catalog_entries::Entity::find_by_id(paper_id)
            .filter(catalog_entries::Column::Kind.eq(EntryKind::Paper.as_str()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("paper {paper_id}")))?;

        Ok(Paper::from(model))
    }

    /// Register an empty department.
    pub async fn new_department(&self, department: &str) -> ResultEngine<()> {
        let department = normalize_segment(department, "department")?;
        with_tx!(self, |db_tx| {
            let occupied = catalog_entries::Entity::find()
                .filter(catalog_entries::Column::Department.eq(department.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if occupied {
                return Err(EngineError::AlreadyExists(department));
            }

            placeholder(EntryKind::Department, &department, "", "")
                .insert(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Register an empty semester under a department.
    pub async fn new_semester(&self, department: &str, semester: &str) -> ResultEngine<()> {
        let department = normalize_segment(department, "department")?;
        let semester = normalize_segment(semester, "semester")?;
        with_tx!(self, |db_tx| {
            let occupied = catalog_entries::Entity::find()
                .filter(catalog_entries::Column::Department.eq(department.as_str()))
                .filter(catalog_entries::Column::Semester.eq(semester.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if occupied {
                return Err(EngineError::AlreadyExists(format!(
                    "{department}/{semester}"
                )));
            }

            placeholder(EntryKind::Semester, &department, &semester, "")
                .insert(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Register an empty year under a department and semester.
    pub async fn new_year(
        &self,
        department: &str,
        semester: &str,
        year: &str,
    ) -> ResultEngine<()> {
        let department = normalize_segment(department, "department")?;
        let semester = normalize_segment(semester, "semester")?;
        let year = normalize_segment(year, "year")?;
        with_tx!(self, |db_tx| {
            let occupied = catalog_entries::Entity::find()
                .filter(catalog_entries::Column::Department.eq(department.as_str()))
                .filter(catalog_entries::Column::Semester.eq(semester.as_str()))
                .filter(catalog_entries::Column::Year.eq(year.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if occupied {
                return Err(EngineError::AlreadyExists(format!(
                    "{department}/{semester}/{year}"
                )));
            }

            placeholder(EntryKind::Year, &department, &semester, &year)
                .insert(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Add a purchasable paper. The identity tuple must be free.
    pub async fn new_paper(
        &self,
        department: &str,
        semester: &str,
        year: &str,
        name: &str,
        locator: &str,
        price: i64,
    ) -> ResultEngine<Paper> {
        let department = normalize_segment(department, "department")?;
        let semester = normalize_segment(semester, "semester")?;
        let year = normalize_segment(year, "year")?;
        let name = normalize_paper_name(name)?;
        if price < 0 {
            return Err(EngineError::InvalidAmount(format!(
                "price must not be negative, got {price}"
            )));
        }

        with_tx!(self, |db_tx| {
            let taken = catalog_entries::Entity::find()
                .filter(catalog_entries::Column::Kind.eq(EntryKind::Paper.as_str()))
                .filter(catalog_entries::Column::Department.eq(department.as_str()))
                .filter(catalog_entries::Column::Semester.eq(semester.as_str()))
                .filter(catalog_entries::Column::Year.eq(year.as_str()))
                .filter(catalog_entries::Column::Name.eq(name.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(EngineError::AlreadyExists(name));
            }

            let model = catalog_entries::ActiveModel {
                id: ActiveValue::NotSet,
                kind: ActiveValue::Set(EntryKind::Paper.as_str().to_string()),
                department: ActiveValue::Set(department.clone()),
                semester: ActiveValue::Set(semester.clone()),
                year: ActiveValue::Set(year.clone()),
                name: ActiveValue::Set(name.clone()),
                locator: ActiveValue::Set(locator.to_string()),
                price: ActiveValue::Set(price),
            }
            .insert(&db_tx)
            .await?;

            Ok(Paper::from(model))
        })
    }

    /// Update the price of an existing paper.
    pub async fn set_paper_price(&self, paper_id: i64, price: i64) -> ResultEngine<()> {
        if price < 0 {
            return Err(EngineError::InvalidAmount(format!(
                "price must not be negative, got {price}"
            )));
        }

        with_tx!(self, |db_tx| {
            catalog_entries::Entity::find_by_id(paper_id)
                .filter(catalog_entries::Column::Kind.eq(EntryKind::Paper.as_str()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("paper {paper_id}")))?;

            let active = catalog_entries::ActiveModel {
                id: ActiveValue::Set(paper_id),
                price: ActiveValue::Set(price),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Delete a department and everything under it. Returns the number of
    /// rows removed. Ownership rows are untouched: buyers keep access to
    /// papers they already paid for.
    pub async fn prune_department(&self, department: &str) -> ResultEngine<u64> {
        let result = catalog_entries::Entity::delete_many()
            .filter(catalog_entries::Column::Department.eq(department))
            .exec(&self.database)
            .await?;
        Ok(result.rows_affected)
    }

    /// Delete a semester branch. Same ownership rules as
    /// [`prune_department`](Engine::prune_department).
    pub async fn prune_semester(&self, department: &str, semester: &str) -> ResultEngine<u64> {
        let result = catalog_entries::Entity::delete_many()
            .filter(catalog_entries::Column::Department.eq(department))
            .filter(catalog_entries::Column::Semester.eq(semester))
            .exec(&self.database)
            .await?;
        Ok(result.rows_affected)
    }

    /// Delete a year branch.
    pub async fn prune_year(
        &self,
        department: &str,
        semester: &str,
        year: &str,
    ) -> ResultEngine<u64> {
        let result = catalog_entries::Entity::delete_many()
            .filter(catalog_entries::Column::Department.eq(department))
            .filter(catalog_entries::Column::Semester.eq(semester))
            .filter(catalog_entries::Column::Year.eq(year))
            .exec(&self.database)
            .await?;
        Ok(result.rows_affected)
    }

    /// Delete a single paper by its identity tuple.
    pub async fn remove_paper(
        &self,
        department: &str,
        semester: &str,
        year: &str,
        name: &str,
    ) -> ResultEngine<u64> {
        let result = catalog_entries::Entity::delete_many()
            .filter(catalog_entries::Column::Kind.eq(EntryKind::Paper.as_str()))
            .filter(catalog_entries::Column::Department.eq(department))
            .filter(catalog_entries::Column::Semester.eq(semester))
            .filter(catalog_entries::Column::Year.eq(year))
            .filter(catalog_entries::Column::Name.eq(name))
            .exec(&self.database)
            .await?;
        Ok(result.rows_affected)
    }
}

/// Keep first occurrences, preserving order. The row sets are small enough
/// that the quadratic scan does not matter.
fn distinct_in_order(rows: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for row in rows {
        if !out.contains(&row) {
            out.push(row);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_keeps_first_occurrence_order() {
        let rows = vec![
            "CSE".to_string(),
            "ECE".to_string(),
            "CSE".to_string(),
            "ME".to_string(),
        ];
        assert_eq!(distinct_in_order(rows), vec!["CSE", "ECE", "ME"]);
    }
}
