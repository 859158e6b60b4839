use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, NaiveDateTime, Utc};
use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tracing::warn;
use uuid::Uuid;

use roster_db::Database;
use roster_db::models::{PostPatch, PostRow, ProfilePatch, ProfileRow, UserPatch, UserRow};
use roster_types::api::{
    ChangePostRequest, ChangeProfileRequest, ChangeUserRequest, CreatePostRequest,
    CreateProfileRequest, CreateUserRequest,
};
use roster_types::models::{Post, Profile, User};

use crate::error::ApiError;

/// Business rules for user records and the subscription graph, layered on
/// an explicitly injected record store. Cascade consistency (no dangling
/// edges, posts or profiles after a user delete) lives here — the store
/// itself only refuses to break referential integrity, it never cleans up.
pub struct Registry {
    db: Arc<Database>,
}

enum SubscribeOutcome {
    MissingTarget,
    MissingSubscriber,
    Done(UserRow, Vec<String>),
}

enum UnsubscribeOutcome {
    MissingTarget,
    NotSubscribed,
    Done(UserRow, Vec<String>),
}

enum CreateProfileOutcome {
    MissingUser,
    AlreadyExists,
    Done(ProfileRow),
}

impl Registry {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Run a store call on the blocking pool, off the async runtime.
    async fn blocking<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| ApiError::Internal(anyhow!("blocking task join error: {e}")))?
            .map_err(ApiError::Internal)
    }

    // -- Users --

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let (rows, pairs) = self
            .blocking(|db| {
                let rows = db.list_users()?;
                let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
                let pairs = db.subscriber_ids_for_targets(&ids)?;
                Ok((rows, pairs))
            })
            .await?;

        let mut subscribers: HashMap<String, Vec<String>> = HashMap::new();
        for (target_id, subscriber_id) in pairs {
            subscribers.entry(target_id).or_default().push(subscriber_id);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let subs = subscribers.remove(&row.id).unwrap_or_default();
                user_from_row(row, subs)
            })
            .collect())
    }

    pub async fn user(&self, id: Uuid) -> Result<User, ApiError> {
        let key = id.to_string();
        let found = self
            .blocking(move |db| {
                let Some(row) = db.get_user(&key)? else {
                    return Ok(None);
                };
                let subs = db.subscriber_ids(&row.id)?;
                Ok(Some((row, subs)))
            })
            .await?;

        let (row, subs) =
            found.ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
        Ok(user_from_row(row, subs))
    }

    pub async fn create_user(&self, req: CreateUserRequest) -> Result<User, ApiError> {
        let key = Uuid::new_v4().to_string();
        let row = self
            .blocking(move |db| {
                db.insert_user(&key, &req.first_name, &req.last_name, &req.email)?;
                db.get_user(&key)?
                    .ok_or_else(|| anyhow!("user {key} vanished after insert"))
            })
            .await?;

        Ok(user_from_row(row, vec![]))
    }

    pub async fn change_user(&self, id: Uuid, req: ChangeUserRequest) -> Result<User, ApiError> {
        let key = id.to_string();
        let patch = UserPatch {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
        };

        let updated = self
            .blocking(move |db| {
                if !db.update_user(&key, &patch)? {
                    return Ok(None);
                }
                let Some(row) = db.get_user(&key)? else {
                    return Ok(None);
                };
                let subs = db.subscriber_ids(&key)?;
                Ok(Some((row, subs)))
            })
            .await?;

        let (row, subs) =
            updated.ok_or_else(|| ApiError::BadRequest(format!("cannot change user {id}")))?;
        Ok(user_from_row(row, subs))
    }

    /// Deletes a user together with everything that references them:
    /// their posts, their profile, and every subscription edge touching
    /// them. The cleanup steps run as independent blocking tasks and are
    /// all joined before the user row itself is removed, so once this
    /// returns no record anywhere still mentions the deleted id.
    pub async fn delete_user(&self, id: Uuid) -> Result<User, ApiError> {
        let key = id.to_string();

        // Snapshot before teardown; this is what the caller gets back.
        let found = self
            .blocking({
                let key = key.clone();
                move |db| {
                    let Some(row) = db.get_user(&key)? else {
                        return Ok(None);
                    };
                    let subs = db.subscriber_ids(&key)?;
                    Ok(Some((row, subs)))
                }
            })
            .await?;
        let (row, subs) =
            found.ok_or_else(|| ApiError::BadRequest(format!("user {id} not found")))?;
        let snapshot = user_from_row(row, subs);

        let (post_ids, profile_id, followed_targets) = self
            .blocking({
                let key = key.clone();
                move |db| {
                    let post_ids: Vec<String> =
                        db.posts_by_user(&key)?.into_iter().map(|p| p.id).collect();
                    let profile_id = db.profile_by_user(&key)?.map(|p| p.id);
                    let followed_targets = db.targets_followed_by(&key)?;
                    Ok((post_ids, profile_id, followed_targets))
                }
            })
            .await?;

        let mut cleanups: Vec<JoinHandle<anyhow::Result<()>>> = Vec::new();

        for post_id in post_ids {
            let db = self.db.clone();
            cleanups.push(tokio::task::spawn_blocking(move || {
                db.delete_post(&post_id)?;
                Ok(())
            }));
        }

        if let Some(profile_id) = profile_id {
            let db = self.db.clone();
            cleanups.push(tokio::task::spawn_blocking(move || {
                db.delete_profile(&profile_id)?;
                Ok(())
            }));
        }

        // One independent removal per user whose list contains the id.
        for target_id in followed_targets {
            let db = self.db.clone();
            let subscriber_id = key.clone();
            cleanups.push(tokio::task::spawn_blocking(move || {
                db.delete_edge(&subscriber_id, &target_id)?;
                Ok(())
            }));
        }

        // The user's own subscriber list, stored as incoming edges.
        {
            let db = self.db.clone();
            let target_id = key.clone();
            cleanups.push(tokio::task::spawn_blocking(move || {
                db.delete_edges_to(&target_id)?;
                Ok(())
            }));
        }

        // Every cleanup must land before the user row goes; any failure
        // fails the whole delete rather than silently leaving strays.
        for joined in join_all(cleanups).await {
            joined
                .map_err(|e| ApiError::Internal(anyhow!("cascade task join error: {e}")))?
                .map_err(ApiError::Internal)?;
        }

        let removed = self.blocking(move |db| db.delete_user(&key)).await?;
        if !removed {
            return Err(ApiError::BadRequest(format!("user {id} not found")));
        }

        Ok(snapshot)
    }

    /// `subscriber` (the path id) starts following `target` (the body
    /// user id); the edge lands on the target's subscriber list.
    /// Subscribing twice is a no-op, not an error.
    pub async fn subscribe(&self, subscriber: Uuid, target: Uuid) -> Result<User, ApiError> {
        let subscriber_key = subscriber.to_string();
        let target_key = target.to_string();

        let outcome = self
            .blocking(move |db| {
                let Some(target_row) = db.get_user(&target_key)? else {
                    return Ok(SubscribeOutcome::MissingTarget);
                };
                if db.get_user(&subscriber_key)?.is_none() {
                    return Ok(SubscribeOutcome::MissingSubscriber);
                }
                if !db.edge_exists(&subscriber_key, &target_key)? {
                    db.insert_edge(&subscriber_key, &target_key)?;
                }
                let subs = db.subscriber_ids(&target_key)?;
                Ok(SubscribeOutcome::Done(target_row, subs))
            })
            .await?;

        match outcome {
            SubscribeOutcome::MissingTarget => Err(ApiError::BadRequest(format!(
                "target user {target} not found"
            ))),
            SubscribeOutcome::MissingSubscriber => Err(ApiError::BadRequest(format!(
                "subscriber {subscriber} not found"
            ))),
            SubscribeOutcome::Done(row, subs) => Ok(user_from_row(row, subs)),
        }
    }

    pub async fn unsubscribe(&self, subscriber: Uuid, target: Uuid) -> Result<User, ApiError> {
        let subscriber_key = subscriber.to_string();
        let target_key = target.to_string();

        let outcome = self
            .blocking(move |db| {
                let Some(target_row) = db.get_user(&target_key)? else {
                    return Ok(UnsubscribeOutcome::MissingTarget);
                };
                if !db.delete_edge(&subscriber_key, &target_key)? {
                    return Ok(UnsubscribeOutcome::NotSubscribed);
                }
                let subs = db.subscriber_ids(&target_key)?;
                Ok(UnsubscribeOutcome::Done(target_row, subs))
            })
            .await?;

        match outcome {
            UnsubscribeOutcome::MissingTarget => Err(ApiError::BadRequest(format!(
                "target user {target} not found"
            ))),
            UnsubscribeOutcome::NotSubscribed => Err(ApiError::BadRequest(format!(
                "user {subscriber} is not subscribed to {target}"
            ))),
            UnsubscribeOutcome::Done(row, subs) => Ok(user_from_row(row, subs)),
        }
    }

    // -- Profiles --

    pub async fn list_profiles(&self) -> Result<Vec<Profile>, ApiError> {
        let rows = self.blocking(|db| db.list_profiles()).await?;
        Ok(rows.into_iter().map(profile_from_row).collect())
    }

    pub async fn profile(&self, id: Uuid) -> Result<Profile, ApiError> {
        let key = id.to_string();
        let row = self.blocking(move |db| db.get_profile(&key)).await?;
        let row = row.ok_or_else(|| ApiError::NotFound(format!("profile {id} not found")))?;
        Ok(profile_from_row(row))
    }

    pub async fn create_profile(&self, req: CreateProfileRequest) -> Result<Profile, ApiError> {
        let key = Uuid::new_v4().to_string();
        let user_id = req.user_id;
        let user_key = user_id.to_string();

        let outcome = self
            .blocking(move |db| {
                if db.get_user(&user_key)?.is_none() {
                    return Ok(CreateProfileOutcome::MissingUser);
                }
                if db.profile_by_user(&user_key)?.is_some() {
                    return Ok(CreateProfileOutcome::AlreadyExists);
                }
                db.insert_profile(
                    &key,
                    &user_key,
                    &req.avatar,
                    &req.sex,
                    req.birthday,
                    &req.country,
                    &req.street,
                    &req.city,
                )?;
                let row = db
                    .get_profile(&key)?
                    .ok_or_else(|| anyhow!("profile {key} vanished after insert"))?;
                Ok(CreateProfileOutcome::Done(row))
            })
            .await?;

        match outcome {
            CreateProfileOutcome::MissingUser => {
                Err(ApiError::BadRequest(format!("user {user_id} not found")))
            }
            CreateProfileOutcome::AlreadyExists => Err(ApiError::BadRequest(format!(
                "user {user_id} already has a profile"
            ))),
            CreateProfileOutcome::Done(row) => Ok(profile_from_row(row)),
        }
    }

    pub async fn change_profile(
        &self,
        id: Uuid,
        req: ChangeProfileRequest,
    ) -> Result<Profile, ApiError> {
        let key = id.to_string();
        let patch = ProfilePatch {
            avatar: req.avatar,
            sex: req.sex,
            birthday: req.birthday,
            country: req.country,
            street: req.street,
            city: req.city,
        };

        let updated = self
            .blocking(move |db| {
                if !db.update_profile(&key, &patch)? {
                    return Ok(None);
                }
                db.get_profile(&key)
            })
            .await?;

        let row =
            updated.ok_or_else(|| ApiError::BadRequest(format!("cannot change profile {id}")))?;
        Ok(profile_from_row(row))
    }

    pub async fn delete_profile(&self, id: Uuid) -> Result<Profile, ApiError> {
        let key = id.to_string();
        let removed = self
            .blocking(move |db| {
                let Some(row) = db.get_profile(&key)? else {
                    return Ok(None);
                };
                db.delete_profile(&key)?;
                Ok(Some(row))
            })
            .await?;

        let row = removed.ok_or_else(|| ApiError::BadRequest(format!("profile {id} not found")))?;
        Ok(profile_from_row(row))
    }

    // -- Posts --

    pub async fn list_posts(&self) -> Result<Vec<Post>, ApiError> {
        let rows = self.blocking(|db| db.list_posts()).await?;
        Ok(rows.into_iter().map(post_from_row).collect())
    }

    pub async fn post(&self, id: Uuid) -> Result<Post, ApiError> {
        let key = id.to_string();
        let row = self.blocking(move |db| db.get_post(&key)).await?;
        let row = row.ok_or_else(|| ApiError::NotFound(format!("post {id} not found")))?;
        Ok(post_from_row(row))
    }

    pub async fn create_post(&self, req: CreatePostRequest) -> Result<Post, ApiError> {
        let key = Uuid::new_v4().to_string();
        let user_id = req.user_id;
        let user_key = user_id.to_string();

        let created = self
            .blocking(move |db| {
                if db.get_user(&user_key)?.is_none() {
                    return Ok(None);
                }
                db.insert_post(&key, &user_key, &req.title, &req.content)?;
                let row = db
                    .get_post(&key)?
                    .ok_or_else(|| anyhow!("post {key} vanished after insert"))?;
                Ok(Some(row))
            })
            .await?;

        let row = created.ok_or_else(|| ApiError::BadRequest(format!("user {user_id} not found")))?;
        Ok(post_from_row(row))
    }

    pub async fn change_post(&self, id: Uuid, req: ChangePostRequest) -> Result<Post, ApiError> {
        let key = id.to_string();
        let patch = PostPatch {
            title: req.title,
            content: req.content,
        };

        let updated = self
            .blocking(move |db| {
                if !db.update_post(&key, &patch)? {
                    return Ok(None);
                }
                db.get_post(&key)
            })
            .await?;

        let row = updated.ok_or_else(|| ApiError::BadRequest(format!("cannot change post {id}")))?;
        Ok(post_from_row(row))
    }

    pub async fn delete_post(&self, id: Uuid) -> Result<Post, ApiError> {
        let key = id.to_string();
        let removed = self
            .blocking(move |db| {
                let Some(row) = db.get_post(&key)? else {
                    return Ok(None);
                };
                db.delete_post(&key)?;
                Ok(Some(row))
            })
            .await?;

        let row = removed.ok_or_else(|| ApiError::BadRequest(format!("post {id} not found")))?;
        Ok(post_from_row(row))
    }
}

fn user_from_row(row: UserRow, subscriber_ids: Vec<String>) -> User {
    let id = parse_id(&row.id, "user id");
    let created_at = parse_created_at(&row.created_at, &row.id);
    User {
        id,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        subscribed_to_user_ids: subscriber_ids
            .iter()
            .map(|raw| parse_id(raw, "subscriber id"))
            .collect(),
        created_at,
    }
}

fn profile_from_row(row: ProfileRow) -> Profile {
    let id = parse_id(&row.id, "profile id");
    let user_id = parse_id(&row.user_id, "profile user id");
    let created_at = parse_created_at(&row.created_at, &row.id);
    Profile {
        id,
        user_id,
        avatar: row.avatar,
        sex: row.sex,
        birthday: row.birthday,
        country: row.country,
        street: row.street,
        city: row.city,
        created_at,
    }
}

fn post_from_row(row: PostRow) -> Post {
    let id = parse_id(&row.id, "post id");
    let user_id = parse_id(&row.user_id, "post user id");
    let created_at = parse_created_at(&row.created_at, &row.id);
    Post {
        id,
        user_id,
        title: row.title,
        content: row.content,
        created_at,
    }
}

fn parse_id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {what} '{raw}': {e}");
        Uuid::default()
    })
}

fn parse_created_at(raw: &str, id: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without
            // timezone. Parse as naive UTC and convert.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{raw}' on '{id}': {e}");
            DateTime::default()
        })
}
