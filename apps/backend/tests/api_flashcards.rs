//! Flashcard API tests.

mod common;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use common::TestContext;

/// Test a new card is appended after the visible cards.
#[tokio::test]
async fn test_create_flashcard_appends() {
    let ctx = TestContext::new().await;
    let created = ctx.create_set("Biology", &[("Q1", "A1"), ("Q2", "A2")]).await;
    let server = ctx.server();

    let response = server
        .post("/flashcards")
        .json(&json!({ "set_id": created.set.id, "question": "Q3", "answer": "A3" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["set_id"], created.set.id);
    assert_eq!(body["question"], "Q3");
    assert_eq!(body["order_index"], 2);
    assert_eq!(body["deleted_at"], Value::Null);
}

/// Test soft-deleted cards are ignored when picking the next slot.
#[tokio::test]
async fn test_create_after_deleting_last_card() {
    let ctx = TestContext::new().await;
    let created = ctx.create_set("Biology", &[("Q1", "A1"), ("Q2", "A2")]).await;
    ctx.db.delete_flashcard(created.flashcards[1].id).await.unwrap();
    let server = ctx.server();

    let response = server
        .post("/flashcards")
        .json(&json!({ "set_id": created.set.id, "question": "Q3", "answer": "A3" }))
        .await;

    let body: Value = response.json();
    assert_eq!(body["order_index"], 1);

    let cards = ctx.db.get_flashcards_by_set(created.set.id).await.unwrap();
    let order: Vec<i64> = cards.iter().map(|c| c.order_index).collect();
    assert_eq!(order, vec![0, 1]);
}

#[tokio::test]
async fn test_create_flashcard_missing_fields() {
    let ctx = TestContext::new().await;
    let created = ctx.create_set("Biology", &[]).await;
    let server = ctx.server();

    for body in [
        json!({ "question": "Q", "answer": "A" }),
        json!({ "set_id": created.set.id, "answer": "A" }),
        json!({ "set_id": created.set.id, "question": "Q", "answer": "  " }),
    ] {
        server
            .post("/flashcards")
            .json(&body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    assert_eq!(ctx.count_rows("flashcards").await, 0);
}

#[tokio::test]
async fn test_create_flashcard_unknown_set() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/flashcards")
        .json(&json!({ "set_id": 42, "question": "Q", "answer": "A" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

/// Test editing text leaves flip mode and progress untouched.
#[tokio::test]
async fn test_update_flashcard() {
    let ctx = TestContext::new().await;
    let created = ctx.create_set("Biology", &[("Q1", "A1")]).await;
    let card = &created.flashcards[0];
    ctx.db.mark_dont_know(created.set.id, card.id, true).await.unwrap();
    let server = ctx.server();

    let response = server
        .patch(&format!("/flashcards/{}", card.id))
        .json(&json!({ "question": "New Q", "answer": "New A" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["question"], "New Q");
    assert_eq!(body["answer"], "New A");
    assert_eq!(body["order_index"], 0);

    let set = ctx.db.get_set(created.set.id).await.unwrap().unwrap();
    assert!(!set.flip_mode);
    let progress = ctx.db.get_progress_by_set(created.set.id).await.unwrap();
    assert_eq!(progress.len(), 1);
    assert!(progress[0].dont_know);
}

#[tokio::test]
async fn test_update_flashcard_errors() {
    let ctx = TestContext::new().await;
    let created = ctx.create_set("Biology", &[("Q1", "A1")]).await;
    let server = ctx.server();

    server
        .patch(&format!("/flashcards/{}", created.flashcards[0].id))
        .json(&json!({ "question": "Only question" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .patch("/flashcards/999")
        .json(&json!({ "question": "Q", "answer": "A" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    ctx.db.delete_flashcard(created.flashcards[0].id).await.unwrap();
    server
        .patch(&format!("/flashcards/{}", created.flashcards[0].id))
        .json(&json!({ "question": "Q", "answer": "A" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

/// Test delete is soft and keeps study progress rows.
#[tokio::test]
async fn test_delete_flashcard_is_soft() {
    let ctx = TestContext::new().await;
    let created = ctx.create_set("Biology", &[("Q1", "A1"), ("Q2", "A2")]).await;
    let card = &created.flashcards[0];
    ctx.db.mark_dont_know(created.set.id, card.id, true).await.unwrap();
    let server = ctx.server();

    let response = server.delete(&format!("/flashcards/{}", card.id)).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, json!({ "success": true }));

    assert_eq!(ctx.count_rows("flashcards").await, 2);
    assert!(ctx.db.get_flashcard(card.id).await.unwrap().is_none());
    let visible = ctx.db.get_flashcards_by_set(created.set.id).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].question, "Q2");
    assert_eq!(ctx.count_rows("study_progress").await, 1);
}

#[tokio::test]
async fn test_delete_flashcard_is_idempotent() {
    let ctx = TestContext::new().await;
    let created = ctx.create_set("Biology", &[("Q1", "A1")]).await;
    let server = ctx.server();
    let path = format!("/flashcards/{}", created.flashcards[0].id);

    server.delete(&path).await.assert_status_ok();
    let first = ctx.db.pool().clone();
    let deleted_at: Option<String> =
        sqlx::query_scalar("SELECT deleted_at FROM flashcards WHERE id = ?1")
            .bind(created.flashcards[0].id)
            .fetch_one(&first)
            .await
            .unwrap();

    server.delete(&path).await.assert_status_ok();
    server.delete("/flashcards/999").await.assert_status_ok();

    let again: Option<String> =
        sqlx::query_scalar("SELECT deleted_at FROM flashcards WHERE id = ?1")
            .bind(created.flashcards[0].id)
            .fetch_one(&first)
            .await
            .unwrap();
    assert!(deleted_at.is_some());
    assert_eq!(deleted_at, again);
}
