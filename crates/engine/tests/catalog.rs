use sea_orm::{Database, DatabaseConnection};

use engine::{Engine, EngineError};
use migration::MigratorTrait;

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

#[tokio::test]
async fn departments_list_in_creation_order() {
    let (engine, _db) = engine_with_db().await;

    engine.new_department("CSE").await.unwrap();
    engine.new_department("ECE").await.unwrap();

    assert_eq!(
        engine.departments().await.unwrap(),
        vec!["CSE".to_string(), "ECE".to_string()]
    );

    let err = engine.new_department("CSE").await.unwrap_err();
    assert_eq!(err, EngineError::AlreadyExists("CSE".to_string()));
}

#[tokio::test]
async fn placeholders_do_not_leak_into_child_listings() {
    let (engine, _db) = engine_with_db().await;

    engine.new_department("CSE").await.unwrap();
    assert!(engine.semesters("CSE").await.unwrap().is_empty());

    engine.new_semester("CSE", "Sem3").await.unwrap();
    assert_eq!(engine.semesters("CSE").await.unwrap(), vec!["Sem3"]);
    assert!(engine.years("CSE", "Sem3").await.unwrap().is_empty());

    engine.new_year("CSE", "Sem3", "2023").await.unwrap();
    assert_eq!(engine.years("CSE", "Sem3").await.unwrap(), vec!["2023"]);
    assert!(engine.papers("CSE", "Sem3", "2023").await.unwrap().is_empty());
}

#[tokio::test]
async fn new_paper_appears_only_in_its_tuple() {
    let (engine, _db) = engine_with_db().await;

    let paper = engine
        .new_paper("CSE", "Sem3", "2023", "Maths Mid Sem", "file-1", 5)
        .await
        .unwrap();
    assert_eq!(paper.name, "Maths Mid Sem");
    assert_eq!(paper.price, 5);

    let papers = engine.papers("CSE", "Sem3", "2023").await.unwrap();
    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].locator, "file-1");

    assert!(engine.papers("CSE", "Sem3", "2024").await.unwrap().is_empty());

    let err = engine
        .new_paper("CSE", "Sem3", "2023", "Maths Mid Sem", "file-2", 7)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::AlreadyExists("Maths Mid Sem".to_string()));
}

#[tokio::test]
async fn segments_are_validated_before_any_write() {
    let (engine, db) = engine_with_db().await;

    assert!(engine.new_department("Sem_3").await.is_err());
    assert!(engine.new_department("   ").await.is_err());
    assert!(
        engine
            .new_paper("CSE", "Sem3", "2023", "Maths", "file-1", -1)
            .await
            .is_err()
    );

    drop(db);
    assert!(engine.departments().await.unwrap().is_empty());
}

#[tokio::test]
async fn segments_are_trimmed_and_nfc_normalized() {
    let (engine, _db) = engine_with_db().await;

    engine.new_department("  CSE ").await.unwrap();
    assert_eq!(engine.departments().await.unwrap(), vec!["CSE"]);

    // "é" composed vs decomposed must collide on the same department.
    engine.new_department("G\u{e9}nie").await.unwrap();
    let err = engine.new_department("Ge\u{301}nie").await.unwrap_err();
    assert_eq!(err, EngineError::AlreadyExists("G\u{e9}nie".to_string()));
}

#[tokio::test]
async fn set_price_updates_existing_paper_only() {
    let (engine, _db) = engine_with_db().await;

    let paper = engine
        .new_paper("CSE", "Sem3", "2023", "Maths", "file-1", 5)
        .await
        .unwrap();

    engine.set_paper_price(paper.id, 8).await.unwrap();
    assert_eq!(engine.paper(paper.id).await.unwrap().price, 8);

    let err = engine.set_paper_price(9999, 8).await.unwrap_err();
    assert_eq!(err, EngineError::NotFound("paper 9999".to_string()));

    let err = engine.set_paper_price(paper.id, -1).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn prune_counts_every_removed_row() {
    let (engine, _db) = engine_with_db().await;

    engine.new_department("CSE").await.unwrap();
    engine.new_semester("CSE", "Sem3").await.unwrap();
    engine.new_year("CSE", "Sem3", "2023").await.unwrap();
    engine
        .new_paper("CSE", "Sem3", "2023", "Maths", "file-1", 5)
        .await
        .unwrap();
    engine
        .new_paper("CSE", "Sem3", "2023", "Physics", "file-2", 5)
        .await
        .unwrap();

    // Year placeholder plus two papers.
    let removed = engine.prune_year("CSE", "Sem3", "2023").await.unwrap();
    assert_eq!(removed, 3);
    assert!(engine.years("CSE", "Sem3").await.unwrap().is_empty());

    // Department and semester placeholders remain.
    let removed = engine.prune_department("CSE").await.unwrap();
    assert_eq!(removed, 2);
    assert!(engine.departments().await.unwrap().is_empty());
}

#[tokio::test]
async fn remove_paper_targets_one_identity_tuple() {
    let (engine, _db) = engine_with_db().await;

    engine
        .new_paper("CSE", "Sem3", "2023", "Maths", "file-1", 5)
        .await
        .unwrap();
    engine
        .new_paper("CSE", "Sem3", "2024", "Maths", "file-2", 5)
        .await
        .unwrap();

    let removed = engine
        .remove_paper("CSE", "Sem3", "2023", "Maths")
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert!(engine.papers("CSE", "Sem3", "2023").await.unwrap().is_empty());
    assert_eq!(engine.papers("CSE", "Sem3", "2024").await.unwrap().len(), 1);
}
