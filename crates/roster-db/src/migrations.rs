use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            first_name  TEXT NOT NULL,
            last_name   TEXT NOT NULL,
            email       TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS profiles (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL UNIQUE REFERENCES users(id),
            avatar      TEXT NOT NULL,
            sex         TEXT NOT NULL,
            birthday    INTEGER NOT NULL,
            country     TEXT NOT NULL,
            street      TEXT NOT NULL,
            city        TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS posts (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            title       TEXT NOT NULL,
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_posts_user
            ON posts(user_id);

        -- One directed follow edge per (subscriber, target) pair. A user's
        -- subscriber list is the set of edges pointing at them, in rowid
        -- (insertion) order. No ON DELETE CASCADE: removing a user's edges,
        -- posts and profile is the registry's job and must be observable
        -- before the user row itself goes away.
        CREATE TABLE IF NOT EXISTS subscriptions (
            subscriber_id  TEXT NOT NULL REFERENCES users(id),
            target_id      TEXT NOT NULL REFERENCES users(id),
            created_at     TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (subscriber_id, target_id)
        );

        CREATE INDEX IF NOT EXISTS idx_subscriptions_target
            ON subscriptions(target_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
