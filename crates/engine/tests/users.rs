mod common;

use engine::{CategoryDraft, EngineError, ExternalProfile, TransactionKind, UserRole};

fn profile(external_id: &str, email: &str) -> ExternalProfile {
    ExternalProfile {
        external_id: external_id.to_string(),
        name: "Alice".to_string(),
        email: email.to_string(),
    }
}

#[tokio::test]
async fn first_sign_in_creates_user_with_default_categories() {
    let engine = common::engine().await;

    let user = engine
        .sign_in_external(profile("g-1", "Alice@Example.com"))
        .await
        .unwrap();
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.google_id.as_deref(), Some("g-1"));
    assert_eq!(user.role, UserRole::User);

    let categories = engine.list_categories(user.id, None).await.unwrap();
    assert_eq!(categories.len(), 13);
    assert!(categories.iter().all(|c| c.is_default));

    let income = engine
        .list_categories(user.id, Some(TransactionKind::Income))
        .await
        .unwrap();
    assert_eq!(income.len(), 5);

    let again = engine
        .sign_in_external(profile("g-1", "alice@example.com"))
        .await
        .unwrap();
    assert_eq!(again.id, user.id);
    assert_eq!(engine.list_categories(user.id, None).await.unwrap().len(), 13);
    assert_eq!(engine.user(user.id).await.unwrap(), user);
}

#[tokio::test]
async fn sign_in_matches_by_email_when_external_id_differs() {
    let engine = common::engine().await;
    let first = engine
        .sign_in_external(profile("g-1", "alice@example.com"))
        .await
        .unwrap();
    let second = engine
        .sign_in_external(profile("g-2", "alice@example.com"))
        .await
        .unwrap();
    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn sign_in_requires_email() {
    let engine = common::engine().await;
    let err = engine.sign_in_external(profile("g-1", " ")).await.unwrap_err();
    assert_eq!(err, EngineError::Validation("email is required".to_string()));
}

#[tokio::test]
async fn category_names_are_unique_per_owner_and_type() {
    let engine = common::engine().await;
    let alice = common::user(&engine, "alice").await;
    let bob = common::user(&engine, "bob").await;

    let draft = CategoryDraft {
        name: "Educación".to_string(),
        kind: TransactionKind::Expense,
        color: None,
        icon: None,
    };
    let created = engine.create_category(alice, draft.clone()).await.unwrap();
    assert_eq!(created.color, "#6b7280");
    assert_eq!(created.icon, "💰");
    assert!(!created.is_default);

    let err = engine
        .create_category(
            alice,
            CategoryDraft {
                name: " educacion ".to_string(),
                ..draft.clone()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let err = engine
        .create_category(
            alice,
            CategoryDraft {
                name: "FOOD".to_string(),
                ..draft.clone()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let income = engine
        .create_category(
            alice,
            CategoryDraft {
                name: "Food".to_string(),
                kind: TransactionKind::Income,
                ..draft.clone()
            },
        )
        .await
        .unwrap();
    assert_eq!(income.kind, TransactionKind::Income);

    engine.create_category(bob, draft).await.unwrap();
}

#[tokio::test]
async fn delete_category_is_owner_scoped() {
    let engine = common::engine().await;
    let alice = common::user(&engine, "alice").await;
    let bob = common::user(&engine, "bob").await;

    let food = engine
        .list_categories(alice, Some(TransactionKind::Expense))
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.name == "Food")
        .unwrap();

    assert_eq!(
        engine.delete_category(bob, food.id).await.unwrap_err(),
        EngineError::KeyNotFound("category".to_string())
    );
    engine.delete_category(alice, food.id).await.unwrap();
    assert_eq!(engine.list_categories(alice, None).await.unwrap().len(), 12);
}
