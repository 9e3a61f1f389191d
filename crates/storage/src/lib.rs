use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use arogya_core::{Language, Subscriber};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

/// Broadcast audience. Subscribing an existing phone updates its language
/// and keeps its position.
pub trait SubscriberRepository: Send + Sync {
    async fn add(&self, phone: &str, lang: Language) -> Result<Subscriber>;
    async fn list_all(&self) -> Result<Vec<Subscriber>>;
    async fn list_by_language(&self, lang: Language) -> Result<Vec<Subscriber>>;
    async fn count(&self) -> Result<usize>;
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SubscriberRepository for MemoryStore {
    async fn add(&self, phone: &str, lang: Language) -> Result<Subscriber> {
        let mut guard = self.subscribers.write();
        if let Some(existing) = guard.iter_mut().find(|sub| sub.phone == phone) {
            existing.lang = lang;
            return Ok(existing.clone());
        }

        let subscriber = Subscriber {
            phone: phone.to_string(),
            lang,
            subscribed_at: Utc::now(),
        };
        guard.push(subscriber.clone());
        Ok(subscriber)
    }

    async fn list_all(&self) -> Result<Vec<Subscriber>> {
        Ok(self.subscribers.read().clone())
    }

    async fn list_by_language(&self, lang: Language) -> Result<Vec<Subscriber>> {
        Ok(self
            .subscribers
            .read()
            .iter()
            .filter(|sub| sub.lang == lang)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.subscribers.read().len())
    }
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url {}", database_url))?
            .create_if_missing(true);

        // Every connection to `:memory:` is its own database, and closing the
        // only one drops every row. Keep exactly one alive for the pool's life.
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("failed connecting to sqlite at {}", database_url))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS subscribers (
              phone TEXT PRIMARY KEY,
              lang TEXT NOT NULL,
              subscribed_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch(&self, lang: Option<Language>) -> Result<Vec<Subscriber>> {
        let rows = match lang {
            Some(lang) => {
                sqlx::query(
                    r#"
                    SELECT phone, lang, subscribed_at
                    FROM subscribers
                    WHERE lang = ?1
                    ORDER BY rowid
                    "#,
                )
                .bind(lang.as_code())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT phone, lang, subscribed_at
                    FROM subscribers
                    ORDER BY rowid
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        let subscribers = rows
            .into_iter()
            .map(|row| Subscriber {
                phone: row.get("phone"),
                lang: Language::from_code(row.get::<String, _>("lang").as_str())
                    .unwrap_or(Language::En),
                subscribed_at: row
                    .get::<String, _>("subscribed_at")
                    .parse::<DateTime<Utc>>()
                    .unwrap_or_else(|_| Utc::now()),
            })
            .collect();

        Ok(subscribers)
    }
}

impl SubscriberRepository for SqliteStore {
    async fn add(&self, phone: &str, lang: Language) -> Result<Subscriber> {
        let row = sqlx::query(
            r#"
            INSERT INTO subscribers (phone, lang, subscribed_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(phone) DO UPDATE SET
              lang=excluded.lang
            RETURNING subscribed_at
            "#,
        )
        .bind(phone)
        .bind(lang.as_code())
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        Ok(Subscriber {
            phone: phone.to_string(),
            lang,
            subscribed_at: row
                .get::<String, _>("subscribed_at")
                .parse()
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    async fn list_all(&self) -> Result<Vec<Subscriber>> {
        self.fetch(None).await
    }

    async fn list_by_language(&self, lang: Language) -> Result<Vec<Subscriber>> {
        self.fetch(Some(lang)).await
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscribers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as usize)
    }
}

#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub async fn sqlite(database_url: &str) -> Result<Self> {
        let sqlite = SqliteStore::connect(database_url).await?;
        Ok(Self::Sqlite(sqlite))
    }

    /// SQLite when a database url is configured, memory otherwise.
    pub async fn from_database_url(database_url: Option<&str>) -> Result<Self> {
        match database_url {
            Some(url) => Self::sqlite(url).await,
            None => Ok(Self::memory()),
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Store::Memory(_) => "memory",
            Store::Sqlite(_) => "sqlite",
        }
    }
}

impl SubscriberRepository for Store {
    async fn add(&self, phone: &str, lang: Language) -> Result<Subscriber> {
        match self {
            Store::Memory(store) => store.add(phone, lang).await,
            Store::Sqlite(store) => store.add(phone, lang).await,
        }
    }

    async fn list_all(&self) -> Result<Vec<Subscriber>> {
        match self {
            Store::Memory(store) => store.list_all().await,
            Store::Sqlite(store) => store.list_all().await,
        }
    }

    async fn list_by_language(&self, lang: Language) -> Result<Vec<Subscriber>> {
        match self {
            Store::Memory(store) => store.list_by_language(lang).await,
            Store::Sqlite(store) => store.list_by_language(lang).await,
        }
    }

    async fn count(&self) -> Result<usize> {
        match self {
            Store::Memory(store) => store.count().await,
            Store::Sqlite(store) => store.count().await,
        }
    }
}
