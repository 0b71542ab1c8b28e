//! Purchase, top-up and reconciliation endpoints.

use api_types::{
    purchase::{
        BulkPurchaseNew, BulkPurchaseResult, PurchaseNew, PurchaseResult, ReconcileNew,
        ReconcileResult,
    },
    wallet::{InvoiceView, TopUpNew},
};
use axum::{Extension, Json, extract::State};
use engine::{BulkOutcome, InvoiceRequest, PurchaseOutcome, ReconcileOutcome};

use crate::{
    ServerError,
    catalog::map_paper,
    server::{ServerState, TelegramUser},
};

fn map_invoice(invoice: InvoiceRequest) -> InvoiceView {
    InvoiceView {
        title: invoice.title,
        description: invoice.description,
        payload: invoice.payload,
        amount: invoice.amount,
    }
}

fn require_telegram(user: Option<Extension<TelegramUser>>) -> Result<i64, ServerError> {
    user.map(|Extension(TelegramUser(id))| id)
        .ok_or_else(|| ServerError::Generic("telegram-user-id header is required".to_string()))
}

pub async fn purchase(
    user: Option<Extension<TelegramUser>>,
    State(state): State<ServerState>,
    Json(payload): Json<PurchaseNew>,
) -> Result<Json<PurchaseResult>, ServerError> {
    let telegram_id = require_telegram(user)?;
    let outcome = state
        .engine
        .purchase_paper(telegram_id, payload.paper_id)
        .await?;

    let result = match outcome {
        PurchaseOutcome::AlreadyOwned { name, locator } => {
            PurchaseResult::AlreadyOwned { name, locator }
        }
        PurchaseOutcome::Purchased {
            name,
            locator,
            remaining_stars,
        } => PurchaseResult::Purchased {
            name,
            locator,
            remaining_stars,
        },
        PurchaseOutcome::InvoiceRequired(invoice) => PurchaseResult::InvoiceRequired {
            invoice: map_invoice(invoice),
        },
    };

    Ok(Json(result))
}

pub async fn purchase_bulk(
    user: Option<Extension<TelegramUser>>,
    State(state): State<ServerState>,
    Json(payload): Json<BulkPurchaseNew>,
) -> Result<Json<BulkPurchaseResult>, ServerError> {
    let telegram_id = require_telegram(user)?;
    let outcome = state
        .engine
        .purchase_bulk(
            telegram_id,
            &payload.department,
            &payload.semester,
            &payload.year,
        )
        .await?;

    let result = match outcome {
        BulkOutcome::AlreadyOwnedAll => BulkPurchaseResult::AlreadyOwnedAll,
        BulkOutcome::Purchased {
            papers,
            charged,
            remaining_stars,
        } => BulkPurchaseResult::Purchased {
            papers: papers.into_iter().map(map_paper).collect(),
            charged,
            remaining_stars,
        },
        BulkOutcome::InvoiceRequired(invoice) => BulkPurchaseResult::InvoiceRequired {
            invoice: map_invoice(invoice),
        },
    };

    Ok(Json(result))
}

pub async fn topup(
    user: Option<Extension<TelegramUser>>,
    State(state): State<ServerState>,
    Json(payload): Json<TopUpNew>,
) -> Result<Json<InvoiceView>, ServerError> {
    let telegram_id = require_telegram(user)?;
    let invoice = state.engine.top_up(telegram_id, payload.amount).await?;
    Ok(Json(map_invoice(invoice)))
}

pub async fn reconcile(
    user: Option<Extension<TelegramUser>>,
    State(state): State<ServerState>,
    Json(payload): Json<ReconcileNew>,
) -> Result<Json<ReconcileResult>, ServerError> {
    let telegram_id = require_telegram(user)?;
    let outcome = state
        .engine
        .reconcile(
            telegram_id,
            &payload.payload,
            payload.amount,
            &payload.charge_id,
        )
        .await?;

    let result = match outcome {
        ReconcileOutcome::Credited {
            amount,
            new_balance,
        } => ReconcileResult::Credited {
            amount,
            new_balance,
        },
        ReconcileOutcome::Granted { papers } => ReconcileResult::Granted {
            papers: papers.into_iter().map(map_paper).collect(),
        },
        ReconcileOutcome::Replayed => {
            tracing::warn!(
                "replayed payment charge ignored: {}",
                payload.charge_id
            );
            ReconcileResult::Replayed
        }
    };

    Ok(Json(result))
}
