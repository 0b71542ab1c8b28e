//! Catalog API endpoints: browsing for everyone, mutations for the admin
//! surface.

use api_types::catalog::{
    BranchNew, BranchQuery, DepartmentList, PaperList, PaperNew, PaperView, PriceUpdate, Prune,
    Pruned, SemesterList, YearList,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{ServerError, server::ServerState};

pub(crate) fn map_paper(paper: engine::Paper) -> PaperView {
    PaperView {
        id: paper.id,
        department: paper.department,
        semester: paper.semester,
        year: paper.year,
        name: paper.name,
        locator: paper.locator,
        price: paper.price,
    }
}

fn require<'q>(field: Option<&'q String>, name: &str) -> Result<&'q str, ServerError> {
    field
        .map(String::as_str)
        .ok_or_else(|| ServerError::Generic(format!("{name} is required")))
}

pub async fn list_departments(
    State(state): State<ServerState>,
) -> Result<Json<DepartmentList>, ServerError> {
    let departments = state.engine.departments().await?;
    Ok(Json(DepartmentList { departments }))
}

pub async fn list_semesters(
    State(state): State<ServerState>,
    Query(query): Query<BranchQuery>,
) -> Result<Json<SemesterList>, ServerError> {
    let department = require(query.department.as_ref(), "department")?;
    let semesters = state.engine.semesters(department).await?;
    Ok(Json(SemesterList { semesters }))
}

pub async fn list_years(
    State(state): State<ServerState>,
    Query(query): Query<BranchQuery>,
) -> Result<Json<YearList>, ServerError> {
    let department = require(query.department.as_ref(), "department")?;
    let semester = require(query.semester.as_ref(), "semester")?;
    let years = state.engine.years(department, semester).await?;
    Ok(Json(YearList { years }))
}

pub async fn list_papers(
    State(state): State<ServerState>,
    Query(query): Query<BranchQuery>,
) -> Result<Json<PaperList>, ServerError> {
    let department = require(query.department.as_ref(), "department")?;
    let semester = require(query.semester.as_ref(), "semester")?;
    let year = require(query.year.as_ref(), "year")?;
    let papers = state.engine.papers(department, semester, year).await?;
    Ok(Json(PaperList {
        papers: papers.into_iter().map(map_paper).collect(),
    }))
}

pub async fn branch_new(
    State(state): State<ServerState>,
    Json(payload): Json<BranchNew>,
) -> Result<StatusCode, ServerError> {
    match (payload.semester.as_deref(), payload.year.as_deref()) {
        (None, None) => state.engine.new_department(&payload.department).await?,
        (Some(semester), None) => {
            state
                .engine
                .new_semester(&payload.department, semester)
                .await?
        }
        (Some(semester), Some(year)) => {
            state
                .engine
                .new_year(&payload.department, semester, year)
                .await?
        }
        (None, Some(_)) => {
            return Err(ServerError::Generic(
                "year requires a semester".to_string(),
            ));
        }
    }

    Ok(StatusCode::CREATED)
}

pub async fn paper_new(
    State(state): State<ServerState>,
    Json(payload): Json<PaperNew>,
) -> Result<(StatusCode, Json<PaperView>), ServerError> {
    let price = payload.price.unwrap_or(engine::DEFAULT_PAPER_PRICE);
    let paper = state
        .engine
        .new_paper(
            &payload.department,
            &payload.semester,
            &payload.year,
            &payload.name,
            &payload.locator,
            price,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(map_paper(paper))))
}

pub async fn set_price(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<PriceUpdate>,
) -> Result<StatusCode, ServerError> {
    state.engine.set_paper_price(id, payload.price).await?;
    Ok(StatusCode::OK)
}

pub async fn prune(
    State(state): State<ServerState>,
    Json(payload): Json<Prune>,
) -> Result<Json<Pruned>, ServerError> {
    let removed = match (
        payload.semester.as_deref(),
        payload.year.as_deref(),
        payload.name.as_deref(),
    ) {
        (Some(semester), Some(year), Some(name)) => {
            state
                .engine
                .remove_paper(&payload.department, semester, year, name)
                .await?
        }
        (Some(semester), Some(year), None) => {
            state
                .engine
                .prune_year(&payload.department, semester, year)
                .await?
        }
        (Some(semester), None, None) => {
            state
                .engine
                .prune_semester(&payload.department, semester)
                .await?
        }
        (None, None, None) => state.engine.prune_department(&payload.department).await?,
        _ => {
            return Err(ServerError::Generic(
                "prune scope must be a prefix: department, then semester, then year, then name"
                    .to_string(),
            ));
        }
    };

    Ok(Json(Pruned { removed }))
}
