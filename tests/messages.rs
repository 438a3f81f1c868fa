mod common;

use std::sync::Arc;

use common::*;
use serde_json::json;
use servihogar::firebase::DocumentStore;
use servihogar::messages::{MessageService, MESSAGES_COLLECTION};

fn message_service() -> (MessageService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    (MessageService::new(store.clone()), store)
}

#[tokio::test]
async fn send_then_list_received_round_trips() {
    let (messages, _store) = message_service();

    messages
        .send("uid-a".to_owned(), "uid-b".to_owned(), "hola".to_owned())
        .await
        .unwrap();

    let received = messages.list_received("uid-b").await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].sender_uid, "uid-a");
    assert_eq!(received[0].text, "hola");
    // write-time timestamp, "YYYY-MM-DD HH:MM:SS"
    assert_eq!(received[0].timestamp.len(), 19);
}

#[tokio::test]
async fn listing_filters_by_receiver() {
    let (messages, _store) = message_service();

    messages
        .send("uid-a".to_owned(), "uid-b".to_owned(), "para b".to_owned())
        .await
        .unwrap();
    messages
        .send("uid-a".to_owned(), "uid-c".to_owned(), "para c".to_owned())
        .await
        .unwrap();
    messages
        .send("uid-b".to_owned(), "uid-a".to_owned(), "para a".to_owned())
        .await
        .unwrap();

    let received = messages.list_received("uid-b").await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].text, "para b");

    assert!(messages.list_received("uid-z").await.unwrap().is_empty());
}

#[tokio::test]
async fn sending_never_validates_the_uids() {
    let (messages, store) = message_service();

    // neither uid exists anywhere; the append still succeeds
    messages
        .send("ghost-1".to_owned(), "ghost-2".to_owned(), "boo".to_owned())
        .await
        .unwrap();
    assert_eq!(store.len(MESSAGES_COLLECTION), 1);
}

#[tokio::test]
async fn malformed_documents_are_skipped() {
    let (messages, store) = message_service();

    messages
        .send("uid-a".to_owned(), "uid-b".to_owned(), "ok".to_owned())
        .await
        .unwrap();
    // a hand-written document missing `text`
    store
        .add(
            MESSAGES_COLLECTION,
            &json!({ "receiver_uid": "uid-b", "sender_uid": "uid-a" }),
        )
        .await
        .unwrap();

    let received = messages.list_received("uid-b").await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].text, "ok");
}
