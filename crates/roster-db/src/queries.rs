use crate::Database;
use crate::models::{PostPatch, PostRow, ProfilePatch, ProfileRow, UserPatch, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn insert_user(&self, id: &str, first_name: &str, last_name: &str, email: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, first_name, last_name, email) VALUES (?1, ?2, ?3, ?4)",
                (id, first_name, last_name, email),
            )?;
            Ok(())
        })
    }

    pub fn get_user(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, first_name, last_name, email, created_at FROM users ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([], user_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Returns false if the id is unknown. Absent patch fields keep the
    /// stored value.
    pub fn update_user(&self, id: &str, patch: &UserPatch) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET
                    first_name = COALESCE(?2, first_name),
                    last_name  = COALESCE(?3, last_name),
                    email      = COALESCE(?4, email)
                 WHERE id = ?1",
                rusqlite::params![id, patch.first_name, patch.last_name, patch.email],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_user(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }

    // -- Profiles --

    #[allow(clippy::too_many_arguments)]
    pub fn insert_profile(
        &self,
        id: &str,
        user_id: &str,
        avatar: &str,
        sex: &str,
        birthday: i64,
        country: &str,
        street: &str,
        city: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO profiles (id, user_id, avatar, sex, birthday, country, street, city)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![id, user_id, avatar, sex, birthday, country, street, city],
            )?;
            Ok(())
        })
    }

    pub fn get_profile(&self, id: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&profile_select("id = ?1"))?;
            let row = stmt.query_row([id], profile_row).optional()?;
            Ok(row)
        })
    }

    pub fn list_profiles(&self) -> Result<Vec<ProfileRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, avatar, sex, birthday, country, street, city, created_at
                 FROM profiles ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([], profile_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// 0..1 — user_id is UNIQUE in the schema.
    pub fn profile_by_user(&self, user_id: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&profile_select("user_id = ?1"))?;
            let row = stmt.query_row([user_id], profile_row).optional()?;
            Ok(row)
        })
    }

    pub fn update_profile(&self, id: &str, patch: &ProfilePatch) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE profiles SET
                    avatar   = COALESCE(?2, avatar),
                    sex      = COALESCE(?3, sex),
                    birthday = COALESCE(?4, birthday),
                    country  = COALESCE(?5, country),
                    street   = COALESCE(?6, street),
                    city     = COALESCE(?7, city)
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    patch.avatar,
                    patch.sex,
                    patch.birthday,
                    patch.country,
                    patch.street,
                    patch.city
                ],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_profile(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute("DELETE FROM profiles WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }

    // -- Posts --

    pub fn insert_post(&self, id: &str, user_id: &str, title: &str, content: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO posts (id, user_id, title, content) VALUES (?1, ?2, ?3, ?4)",
                (id, user_id, title, content),
            )?;
            Ok(())
        })
    }

    pub fn get_post(&self, id: &str) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, title, content, created_at FROM posts WHERE id = ?1",
            )?;
            let row = stmt.query_row([id], post_row).optional()?;
            Ok(row)
        })
    }

    pub fn list_posts(&self) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, title, content, created_at FROM posts ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([], post_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn posts_by_user(&self, user_id: &str) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, title, content, created_at FROM posts
                 WHERE user_id = ?1 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([user_id], post_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_post(&self, id: &str, patch: &PostPatch) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE posts SET
                    title   = COALESCE(?2, title),
                    content = COALESCE(?3, content)
                 WHERE id = ?1",
                rusqlite::params![id, patch.title, patch.content],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_post(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }

    // -- Subscription edges --

    pub fn edge_exists(&self, subscriber_id: &str, target_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM subscriptions WHERE subscriber_id = ?1 AND target_id = ?2",
                    [subscriber_id, target_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn insert_edge(&self, subscriber_id: &str, target_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO subscriptions (subscriber_id, target_id) VALUES (?1, ?2)",
                [subscriber_id, target_id],
            )?;
            Ok(())
        })
    }

    pub fn delete_edge(&self, subscriber_id: &str, target_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM subscriptions WHERE subscriber_id = ?1 AND target_id = ?2",
                [subscriber_id, target_id],
            )?;
            Ok(removed > 0)
        })
    }

    /// Ids of the users following `target_id`, in subscription order.
    pub fn subscriber_ids(&self, target_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT subscriber_id FROM subscriptions WHERE target_id = ?1 ORDER BY rowid",
            )?;
            let ids = stmt
                .query_map([target_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    /// Batch-fetch subscriber lists for a set of targets, as
    /// (target_id, subscriber_id) pairs in subscription order.
    pub fn subscriber_ids_for_targets(&self, target_ids: &[String]) -> Result<Vec<(String, String)>> {
        if target_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=target_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT target_id, subscriber_id FROM subscriptions
                 WHERE target_id IN ({}) ORDER BY rowid",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = target_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let pairs = stmt
                .query_map(params.as_slice(), |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(pairs)
        })
    }

    /// Reverse-edge scan: ids of the users whose subscriber list contains
    /// `subscriber_id`, i.e. everyone this user follows.
    pub fn targets_followed_by(&self, subscriber_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT target_id FROM subscriptions WHERE subscriber_id = ?1 ORDER BY rowid",
            )?;
            let ids = stmt
                .query_map([subscriber_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    /// Drops every edge pointing at `target_id` — the stored form of the
    /// user's own subscriber list, removed when the user is removed.
    pub fn delete_edges_to(&self, target_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute("DELETE FROM subscriptions WHERE target_id = ?1", [target_id])?;
            Ok(removed)
        })
    }
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn
        .prepare("SELECT id, first_name, last_name, email, created_at FROM users WHERE id = ?1")?;

    let row = stmt.query_row([id], user_row).optional()?;

    Ok(row)
}

fn user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn profile_select(filter: &str) -> String {
    format!(
        "SELECT id, user_id, avatar, sex, birthday, country, street, city, created_at
         FROM profiles WHERE {filter}"
    )
}

fn profile_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        avatar: row.get(2)?,
        sex: row.get(3)?,
        birthday: row.get(4)?,
        country: row.get(5)?,
        street: row.get(6)?,
        city: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn post_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
