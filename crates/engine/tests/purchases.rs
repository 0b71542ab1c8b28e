use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    BulkOutcome, Engine, EngineError, Paper, PurchaseOutcome, ReconcileOutcome,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn engine_with_file_db() -> (Engine, DatabaseConnection, String, std::path::PathBuf) {
    let root =
        std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    (engine, db, url, path)
}

async fn seed_paper(engine: &Engine, name: &str, price: i64) -> Paper {
    engine
        .new_paper("CSE", "Sem3", "2023", name, &format!("file-{name}"), price)
        .await
        .unwrap()
}

async fn fund(engine: &Engine, telegram_id: i64, stars: i64) -> i64 {
    let account = engine.get_or_create_account(telegram_id).await.unwrap();
    engine.credit(account.id, stars).await.unwrap();
    account.id
}

#[tokio::test]
async fn purchase_without_stars_yields_invoice() {
    let (engine, _db) = engine_with_db().await;
    let paper = seed_paper(&engine, "Maths", 5).await;

    let outcome = engine.purchase_paper(100, paper.id).await.unwrap();
    let PurchaseOutcome::InvoiceRequired(invoice) = outcome else {
        panic!("expected an invoice");
    };
    assert_eq!(invoice.payload, format!("single_paper_{}", paper.id));
    assert_eq!(invoice.amount, 5);

    // Nothing was granted or charged.
    let account = engine.account(100).await.unwrap();
    assert_eq!(account.stars, 0);
    assert!(engine.owned_papers(account.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn purchase_debits_and_grants_atomically() {
    let (engine, _db) = engine_with_db().await;
    let paper = seed_paper(&engine, "Maths", 5).await;
    let account_id = fund(&engine, 100, 12).await;

    let outcome = engine.purchase_paper(100, paper.id).await.unwrap();
    assert_eq!(
        outcome,
        PurchaseOutcome::Purchased {
            name: "Maths".to_string(),
            locator: "file-Maths".to_string(),
            remaining_stars: 7,
        }
    );

    let owned = engine.owned_papers(account_id).await.unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].paper.id, paper.id);
}

#[tokio::test]
async fn repeat_purchase_charges_nothing() {
    let (engine, _db) = engine_with_db().await;
    let paper = seed_paper(&engine, "Maths", 5).await;
    fund(&engine, 100, 12).await;

    engine.purchase_paper(100, paper.id).await.unwrap();
    let outcome = engine.purchase_paper(100, paper.id).await.unwrap();
    assert_eq!(
        outcome,
        PurchaseOutcome::AlreadyOwned {
            name: "Maths".to_string(),
            locator: "file-Maths".to_string(),
        }
    );
    assert_eq!(engine.account(100).await.unwrap().stars, 7);
}

#[tokio::test]
async fn purchase_of_missing_paper_fails() {
    let (engine, _db) = engine_with_db().await;
    fund(&engine, 100, 12).await;

    let err = engine.purchase_paper(100, 9999).await.unwrap_err();
    assert_eq!(err, EngineError::NotFound("paper 9999".to_string()));
    assert_eq!(engine.account(100).await.unwrap().stars, 12);
}

#[tokio::test]
async fn bulk_charges_discounted_total() {
    let (engine, _db) = engine_with_db().await;
    seed_paper(&engine, "Maths", 5).await;
    seed_paper(&engine, "Physics", 7).await;
    let account_id = fund(&engine, 100, 12).await;

    let outcome = engine
        .purchase_bulk(100, "CSE", "Sem3", "2023")
        .await
        .unwrap();
    let BulkOutcome::Purchased {
        papers,
        charged,
        remaining_stars,
    } = outcome
    else {
        panic!("expected a bulk purchase");
    };

    // (5 + 7) * 9 / 10, truncated.
    assert_eq!(charged, 10);
    assert_eq!(remaining_stars, 2);
    assert_eq!(papers.len(), 2);
    assert_eq!(engine.owned_papers(account_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn bulk_discounts_only_the_missing_papers() {
    let (engine, _db) = engine_with_db().await;
    let maths = seed_paper(&engine, "Maths", 5).await;
    seed_paper(&engine, "Physics", 7).await;
    fund(&engine, 100, 20).await;

    engine.purchase_paper(100, maths.id).await.unwrap();

    let outcome = engine
        .purchase_bulk(100, "CSE", "Sem3", "2023")
        .await
        .unwrap();
    let BulkOutcome::Purchased {
        papers, charged, ..
    } = outcome
    else {
        panic!("expected a bulk purchase");
    };

    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].name, "Physics");
    // 7 * 9 / 10, truncated.
    assert_eq!(charged, 6);
}

#[tokio::test]
async fn bulk_with_everything_owned_is_free() {
    let (engine, _db) = engine_with_db().await;
    let maths = seed_paper(&engine, "Maths", 5).await;
    fund(&engine, 100, 20).await;

    engine.purchase_paper(100, maths.id).await.unwrap();

    let outcome = engine
        .purchase_bulk(100, "CSE", "Sem3", "2023")
        .await
        .unwrap();
    assert_eq!(outcome, BulkOutcome::AlreadyOwnedAll);
    assert_eq!(engine.account(100).await.unwrap().stars, 15);
}

#[tokio::test]
async fn bulk_on_empty_tuple_fails() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .purchase_bulk(100, "CSE", "Sem3", "2023")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::EmptySet("CSE/Sem3/2023".to_string()));
}

#[tokio::test]
async fn bulk_without_stars_yields_invoice() {
    let (engine, _db) = engine_with_db().await;
    seed_paper(&engine, "Maths", 5).await;
    seed_paper(&engine, "Physics", 7).await;
    fund(&engine, 100, 3).await;

    let outcome = engine
        .purchase_bulk(100, "CSE", "Sem3", "2023")
        .await
        .unwrap();
    let BulkOutcome::InvoiceRequired(invoice) = outcome else {
        panic!("expected an invoice");
    };
    assert_eq!(invoice.payload, "bulk_purchase_CSE_Sem3_2023");
    assert_eq!(invoice.amount, 10);

    // The balance never goes negative.
    assert_eq!(engine.account(100).await.unwrap().stars, 3);
}

#[tokio::test]
async fn bulk_invoice_still_creates_the_account() {
    let (engine, _db) = engine_with_db().await;
    seed_paper(&engine, "Maths", 5).await;

    let outcome = engine
        .purchase_bulk(100, "CSE", "Sem3", "2023")
        .await
        .unwrap();
    assert!(matches!(outcome, BulkOutcome::InvoiceRequired(_)));

    // The account created on the way to the invoice survives the commit.
    assert_eq!(engine.account(100).await.unwrap().stars, 0);
}

#[tokio::test]
async fn failed_grant_rolls_the_debit_back() {
    let (engine, db) = engine_with_db().await;
    let paper = seed_paper(&engine, "Maths", 5).await;
    let account_id = fund(&engine, 100, 12).await;

    // Make the grant insert fail while ownership reads keep working, so the
    // purchase dies between the debit and the grant.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "CREATE TRIGGER block_grants BEFORE INSERT ON ownerships \
         BEGIN SELECT RAISE(ABORT, 'blocked'); END",
    ))
    .await
    .unwrap();

    let err = engine.purchase_paper(100, paper.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Database(_)));

    db.execute(Statement::from_string(
        db.get_database_backend(),
        "DROP TRIGGER block_grants",
    ))
    .await
    .unwrap();

    // All or nothing: the debit rolled back with the failed grant.
    assert_eq!(engine.account(100).await.unwrap().stars, 12);
    assert!(engine.owned_papers(account_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn top_up_creates_the_account_and_encodes_the_amount() {
    let (engine, _db) = engine_with_db().await;

    let invoice = engine.top_up(100, 50).await.unwrap();
    assert_eq!(invoice.payload, "topup_50");
    assert_eq!(invoice.amount, 50);

    // Visible with zero stars before the payment is confirmed.
    assert_eq!(engine.account(100).await.unwrap().stars, 0);

    assert!(matches!(
        engine.top_up(100, 0).await.unwrap_err(),
        EngineError::InvalidAmount(_)
    ));
    assert!(matches!(
        engine.top_up(100, -5).await.unwrap_err(),
        EngineError::InvalidAmount(_)
    ));
}

#[tokio::test]
async fn reconcile_topup_credits_once() {
    let (engine, _db) = engine_with_db().await;

    let outcome = engine
        .reconcile(100, "topup_100", 100, "charge-1")
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ReconcileOutcome::Credited {
            amount: 100,
            new_balance: 100,
        }
    );

    // Provider retries echo the same charge id; nothing moves twice.
    let outcome = engine
        .reconcile(100, "topup_100", 100, "charge-1")
        .await
        .unwrap();
    assert_eq!(outcome, ReconcileOutcome::Replayed);
    assert_eq!(engine.account(100).await.unwrap().stars, 100);
}

#[tokio::test]
async fn reconcile_single_paper_grants_without_touching_the_balance() {
    let (engine, _db) = engine_with_db().await;
    let paper = seed_paper(&engine, "Maths", 5).await;
    let account_id = fund(&engine, 100, 3).await;

    let outcome = engine
        .reconcile(100, &format!("single_paper_{}", paper.id), 5, "charge-1")
        .await
        .unwrap();
    let ReconcileOutcome::Granted { papers } = outcome else {
        panic!("expected a grant");
    };
    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].id, paper.id);

    assert_eq!(engine.account(100).await.unwrap().stars, 3);
    assert_eq!(engine.owned_papers(account_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn reconcile_bulk_grants_only_the_missing_papers() {
    let (engine, _db) = engine_with_db().await;
    let maths = seed_paper(&engine, "Maths", 5).await;
    seed_paper(&engine, "Physics", 7).await;
    fund(&engine, 100, 20).await;

    engine.purchase_paper(100, maths.id).await.unwrap();

    let outcome = engine
        .reconcile(100, "bulk_purchase_CSE_Sem3_2023", 6, "charge-1")
        .await
        .unwrap();
    let ReconcileOutcome::Granted { papers } = outcome else {
        panic!("expected a grant");
    };
    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].name, "Physics");
}

#[tokio::test]
async fn reconcile_rejects_malformed_payloads_before_the_ledger() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .reconcile(100, "buy_star_100", 100, "charge-1")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::MalformedPayload(_)));

    // No account was created and the charge id is still free.
    assert!(engine.account(100).await.is_err());
    let outcome = engine
        .reconcile(100, "topup_100", 100, "charge-1")
        .await
        .unwrap();
    assert!(matches!(outcome, ReconcileOutcome::Credited { .. }));
}

#[tokio::test]
async fn reconcile_of_a_pruned_paper_stays_retriable() {
    let (engine, _db) = engine_with_db().await;
    let paper = seed_paper(&engine, "Maths", 5).await;
    let payload = format!("single_paper_{}", paper.id);
    engine
        .remove_paper("CSE", "Sem3", "2023", "Maths")
        .await
        .unwrap();

    let err = engine
        .reconcile(100, &payload, 5, "charge-1")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotFound(format!("paper {}", paper.id)));

    // The failed attempt consumed nothing, so the same charge id can still
    // settle once the operator restores the paper.
    let restored = seed_paper(&engine, "Maths", 5).await;
    let outcome = engine
        .reconcile(
            100,
            &format!("single_paper_{}", restored.id),
            5,
            "charge-1",
        )
        .await
        .unwrap();
    assert!(matches!(outcome, ReconcileOutcome::Granted { .. }));
}

#[tokio::test]
async fn pruning_keeps_paid_ownership_rows() {
    let (engine, _db) = engine_with_db().await;
    let paper = seed_paper(&engine, "Maths", 5).await;
    let account_id = fund(&engine, 100, 12).await;

    engine.purchase_paper(100, paper.id).await.unwrap();
    engine.prune_department("CSE").await.unwrap();

    // The orphan row survives but has no paper to show.
    assert!(engine.owned_papers(account_id).await.unwrap().is_empty());
    assert_eq!(engine.account(100).await.unwrap().stars, 7);

    // Re-adding under the same tuple mints a fresh id, so it is not owned.
    let fresh = seed_paper(&engine, "Maths", 5).await;
    let outcome = engine.purchase_paper(100, fresh.id).await.unwrap();
    assert!(matches!(outcome, PurchaseOutcome::Purchased { .. }));
}

#[tokio::test]
async fn restart_engine_reads_same_state() {
    let (engine, db, url, path) = engine_with_file_db().await;
    let paper = seed_paper(&engine, "Maths", 5).await;
    let account_id = fund(&engine, 100, 12).await;
    engine.purchase_paper(100, paper.id).await.unwrap();

    drop(engine);
    drop(db);

    let db2 = Database::connect(&url).await.unwrap();
    let engine2 = Engine::builder()
        .database(db2.clone())
        .build()
        .await
        .unwrap();

    assert_eq!(engine2.account(100).await.unwrap().stars, 7);
    assert_eq!(engine2.owned_papers(account_id).await.unwrap().len(), 1);

    drop(db2);
    let _ = std::fs::remove_file(path);
}
