//! End-to-end tests for the registry: every operation runs against a real
//! (in-memory) store, the same way the handlers drive it.

use std::sync::Arc;

use uuid::Uuid;

use roster_api::error::ApiError;
use roster_api::registry::Registry;
use roster_db::Database;
use roster_types::api::{
    ChangeProfileRequest, ChangeUserRequest, CreatePostRequest, CreateProfileRequest,
    CreateUserRequest,
};
use roster_types::models::User;

fn registry() -> Registry {
    let db = Database::open_in_memory().expect("in-memory database");
    Registry::new(Arc::new(db))
}

async fn create_user(registry: &Registry, first_name: &str) -> User {
    registry
        .create_user(CreateUserRequest {
            first_name: first_name.to_string(),
            last_name: "Tester".to_string(),
            email: format!("{}@example.com", first_name.to_lowercase()),
        })
        .await
        .expect("create user")
}

fn profile_request(user_id: Uuid) -> CreateProfileRequest {
    CreateProfileRequest {
        user_id,
        avatar: "avatar.png".into(),
        sex: "other".into(),
        birthday: 631_152_000,
        country: "NL".into(),
        street: "Kanaalweg".into(),
        city: "Utrecht".into(),
    }
}

fn post_request(user_id: Uuid, title: &str) -> CreatePostRequest {
    CreatePostRequest {
        user_id,
        title: title.to_string(),
        content: "Lorem ipsum".to_string(),
    }
}

#[tokio::test]
async fn created_user_has_fresh_id_and_no_subscribers() {
    let registry = registry();
    let alice = create_user(&registry, "Alice").await;
    let bob = create_user(&registry, "Bob").await;

    assert!(alice.subscribed_to_user_ids.is_empty());
    assert_ne!(alice.id, bob.id);

    let fetched = registry.user(alice.id).await.unwrap();
    assert_eq!(fetched.id, alice.id);
    assert_eq!(fetched.email, "alice@example.com");
}

#[tokio::test]
async fn get_missing_user_is_not_found() {
    let registry = registry();
    let err = registry.user(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn subscribe_lands_on_the_target_list() {
    let registry = registry();
    let alice = create_user(&registry, "Alice").await;
    let bob = create_user(&registry, "Bob").await;

    // Alice follows Bob: the edge shows up on Bob, not on Alice.
    let updated = registry.subscribe(alice.id, bob.id).await.unwrap();
    assert_eq!(updated.id, bob.id);
    assert_eq!(updated.subscribed_to_user_ids, vec![alice.id]);

    let alice_now = registry.user(alice.id).await.unwrap();
    assert!(alice_now.subscribed_to_user_ids.is_empty());
}

#[tokio::test]
async fn subscribe_twice_is_idempotent() {
    let registry = registry();
    let alice = create_user(&registry, "Alice").await;
    let bob = create_user(&registry, "Bob").await;

    registry.subscribe(alice.id, bob.id).await.unwrap();
    let second = registry.subscribe(alice.id, bob.id).await.unwrap();

    assert_eq!(second.subscribed_to_user_ids, vec![alice.id]);
}

#[tokio::test]
async fn subscribe_requires_both_users() {
    let registry = registry();
    let alice = create_user(&registry, "Alice").await;

    let err = registry.subscribe(alice.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));

    let err = registry.subscribe(Uuid::new_v4(), alice.id).await.unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
}

#[tokio::test]
async fn unsubscribe_restores_the_previous_list() {
    let registry = registry();
    let alice = create_user(&registry, "Alice").await;
    let bob = create_user(&registry, "Bob").await;
    let carol = create_user(&registry, "Carol").await;

    registry.subscribe(alice.id, carol.id).await.unwrap();
    registry.subscribe(bob.id, carol.id).await.unwrap();

    let updated = registry.unsubscribe(bob.id, carol.id).await.unwrap();
    assert_eq!(updated.subscribed_to_user_ids, vec![alice.id]);
}

#[tokio::test]
async fn unsubscribe_without_subscription_is_bad_request() {
    let registry = registry();
    let alice = create_user(&registry, "Alice").await;
    let bob = create_user(&registry, "Bob").await;

    let err = registry.unsubscribe(alice.id, bob.id).await.unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));

    let err = registry.unsubscribe(alice.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
}

#[tokio::test]
async fn change_user_patches_only_the_given_fields() {
    let registry = registry();
    let alice = create_user(&registry, "Alice").await;

    let changed = registry
        .change_user(
            alice.id,
            ChangeUserRequest {
                email: Some("new@example.com".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(changed.email, "new@example.com");
    assert_eq!(changed.first_name, "Alice");
}

#[tokio::test]
async fn change_missing_user_is_bad_request() {
    let registry = registry();
    let err = registry
        .change_user(Uuid::new_v4(), ChangeUserRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
}

#[tokio::test]
async fn delete_missing_user_is_bad_request() {
    // NotFound-shaped condition deliberately surfaced as a bad-request
    // signal, matching the rest of the delete/change taxonomy.
    let registry = registry();
    let err = registry.delete_user(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
}

#[tokio::test]
async fn delete_user_removes_it_from_every_subscriber_list() {
    let registry = registry();
    let alice = create_user(&registry, "Alice").await;
    let bob = create_user(&registry, "Bob").await;

    registry.subscribe(alice.id, bob.id).await.unwrap();
    let bob_before = registry.user(bob.id).await.unwrap();
    assert_eq!(bob_before.subscribed_to_user_ids, vec![alice.id]);

    registry.delete_user(alice.id).await.unwrap();

    let bob_after = registry.user(bob.id).await.unwrap();
    assert!(bob_after.subscribed_to_user_ids.is_empty());
}

#[tokio::test]
async fn delete_user_cascades_posts_and_profile() {
    let registry = registry();
    let alice = create_user(&registry, "Alice").await;

    let profile = registry.create_profile(profile_request(alice.id)).await.unwrap();
    let post_a = registry.create_post(post_request(alice.id, "first")).await.unwrap();
    let post_b = registry.create_post(post_request(alice.id, "second")).await.unwrap();

    registry.delete_user(alice.id).await.unwrap();

    assert!(matches!(
        registry.user(alice.id).await.unwrap_err(),
        ApiError::NotFound(_)
    ));
    assert!(matches!(
        registry.profile(profile.id).await.unwrap_err(),
        ApiError::NotFound(_)
    ));
    assert!(matches!(
        registry.post(post_a.id).await.unwrap_err(),
        ApiError::NotFound(_)
    ));
    assert!(matches!(
        registry.post(post_b.id).await.unwrap_err(),
        ApiError::NotFound(_)
    ));
    assert!(registry.list_posts().await.unwrap().is_empty());
}

#[tokio::test]
async fn deleted_user_is_returned_with_its_pre_delete_list() {
    let registry = registry();
    let alice = create_user(&registry, "Alice").await;
    let bob = create_user(&registry, "Bob").await;

    registry.subscribe(bob.id, alice.id).await.unwrap();

    let deleted = registry.delete_user(alice.id).await.unwrap();
    assert_eq!(deleted.id, alice.id);
    assert_eq!(deleted.subscribed_to_user_ids, vec![bob.id]);

    // Bob survives untouched.
    registry.user(bob.id).await.unwrap();
}

#[tokio::test]
async fn self_subscription_is_allowed_and_cleaned_up() {
    let registry = registry();
    let alice = create_user(&registry, "Alice").await;
    let bob = create_user(&registry, "Bob").await;

    let updated = registry.subscribe(alice.id, alice.id).await.unwrap();
    assert_eq!(updated.subscribed_to_user_ids, vec![alice.id]);

    registry.delete_user(alice.id).await.unwrap();
    let bob_after = registry.user(bob.id).await.unwrap();
    assert!(bob_after.subscribed_to_user_ids.is_empty());
}

#[tokio::test]
async fn list_users_materializes_every_subscriber_list() {
    let registry = registry();
    let alice = create_user(&registry, "Alice").await;
    let bob = create_user(&registry, "Bob").await;
    let carol = create_user(&registry, "Carol").await;

    registry.subscribe(alice.id, carol.id).await.unwrap();
    registry.subscribe(bob.id, carol.id).await.unwrap();

    let users = registry.list_users().await.unwrap();
    assert_eq!(users.len(), 3);

    let carol_listed = users.iter().find(|u| u.id == carol.id).unwrap();
    assert_eq!(carol_listed.subscribed_to_user_ids, vec![alice.id, bob.id]);

    let alice_listed = users.iter().find(|u| u.id == alice.id).unwrap();
    assert!(alice_listed.subscribed_to_user_ids.is_empty());
}

#[tokio::test]
async fn a_user_gets_at_most_one_profile() {
    let registry = registry();
    let alice = create_user(&registry, "Alice").await;

    registry.create_profile(profile_request(alice.id)).await.unwrap();
    let err = registry
        .create_profile(profile_request(alice.id))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
}

#[tokio::test]
async fn owned_records_require_an_existing_user() {
    let registry = registry();

    let err = registry
        .create_profile(profile_request(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));

    let err = registry
        .create_post(post_request(Uuid::new_v4(), "orphan"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
}

#[tokio::test]
async fn change_profile_patches_fields() {
    let registry = registry();
    let alice = create_user(&registry, "Alice").await;
    let profile = registry.create_profile(profile_request(alice.id)).await.unwrap();

    let changed = registry
        .change_profile(
            profile.id,
            ChangeProfileRequest {
                city: Some("Rotterdam".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(changed.city, "Rotterdam");
    assert_eq!(changed.country, "NL");

    let err = registry
        .change_profile(Uuid::new_v4(), ChangeProfileRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
}

#[tokio::test]
async fn delete_post_returns_the_deleted_record() {
    let registry = registry();
    let alice = create_user(&registry, "Alice").await;
    let post = registry.create_post(post_request(alice.id, "bye")).await.unwrap();

    let deleted = registry.delete_post(post.id).await.unwrap();
    assert_eq!(deleted.id, post.id);
    assert_eq!(deleted.title, "bye");

    let err = registry.delete_post(post.id).await.unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
}
