use crate::models::{Author, AuthorName, Book, Isbn};
use crate::store::{AuthorRepository, BookRepository, Store, UnitOfWork};
use anyhow::Context;
use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{FromRow, Row, SqlitePool};
use std::str::FromStr;
use std::time::Duration;

pub static MIGRATOR: Migrator = sqlx::migrate!();

#[derive(Debug, Clone)]
pub struct Sqlite {
    pool: SqlitePool,
}

impl Sqlite {
    pub async fn new(path: &str, max_connections: u32) -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::from_str(path)
            .with_context(|| format!("Invalid database path {path}"))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await
            .with_context(|| format!("Failed to open database at {path}"))?;

        Self::migrate(pool).await
    }

    /// Private in-memory database. Pinned to one connection, since each
    /// SQLite connection to `:memory:` sees its own database.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(opts)
            .await
            .context("Failed to open in-memory database")?;

        Self::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> anyhow::Result<Self> {
        MIGRATOR
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for Sqlite {
    type Tx = SqliteTx;

    async fn begin(&self) -> anyhow::Result<SqliteTx> {
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        Ok(SqliteTx(tx))
    }

    async fn begin_write(&self) -> anyhow::Result<SqliteTx> {
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .context("Failed to begin write transaction")?;
        Ok(SqliteTx(tx))
    }
}

#[derive(Debug)]
pub struct SqliteTx(sqlx::Transaction<'static, sqlx::Sqlite>);

#[async_trait]
impl UnitOfWork for SqliteTx {
    async fn commit(self) -> anyhow::Result<()> {
        self.0
            .commit()
            .await
            .context("Failed to commit transaction")
    }
}

impl<'r> FromRow<'r, SqliteRow> for Author {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id = row.try_get("id")?;
        let name: &str = row.try_get("name")?;
        let age = row.try_get("age")?;
        let description = row.try_get("description")?;
        let image = row.try_get("image")?;

        let name = AuthorName::new_unchecked(name);
        Ok(Self::new(Some(id), name, age, description, image))
    }
}

impl<'r> FromRow<'r, SqliteRow> for Book {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let isbn: &str = row.try_get("isbn")?;
        let title = row.try_get("title")?;
        let description = row.try_get("description")?;
        let image = row.try_get("image")?;

        let author_id = row.try_get("author_id")?;
        let author_name: &str = row.try_get("author_name")?;
        let author = Author::new(
            Some(author_id),
            AuthorName::new_unchecked(author_name),
            row.try_get("author_age")?,
            row.try_get("author_description")?,
            row.try_get("author_image")?,
        );

        let isbn = Isbn::new_unchecked(isbn);
        Ok(Self::new(isbn, title, description, image, author))
    }
}

#[async_trait]
impl AuthorRepository for SqliteTx {
    async fn find_author(&mut self, id: i64) -> anyhow::Result<Option<Author>> {
        sqlx::query_as("SELECT id, name, age, description, image FROM author WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.0)
            .await
            .with_context(|| format!(r#"Failed to retrieve author with id "{id}""#))
    }

    async fn author_exists(&mut self, id: i64) -> anyhow::Result<bool> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM author WHERE id = ?)")
            .bind(id)
            .fetch_one(&mut *self.0)
            .await
            .with_context(|| format!(r#"Failed to check author with id "{id}""#))
    }

    async fn save_author(&mut self, author: &Author) -> anyhow::Result<Author> {
        let query = match author.id() {
            None => sqlx::query_as(
                "INSERT INTO author (name, age, description, image) VALUES (?, ?, ?, ?) \
                 RETURNING id, name, age, description, image",
            ),
            Some(id) => sqlx::query_as(
                "INSERT INTO author (id, name, age, description, image) VALUES (?, ?, ?, ?, ?) \
                 ON CONFLICT (id) DO UPDATE SET name = excluded.name, age = excluded.age, \
                 description = excluded.description, image = excluded.image \
                 RETURNING id, name, age, description, image",
            )
            .bind(id),
        };

        query
            .bind(author.name().as_str())
            .bind(author.age())
            .bind(author.description())
            .bind(author.image())
            .fetch_one(&mut *self.0)
            .await
            .with_context(|| format!(r#"Failed to save author with name "{}""#, author.name()))
    }

    async fn delete_author(&mut self, id: i64) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM author WHERE id = ?")
            .bind(id)
            .execute(&mut *self.0)
            .await
            .with_context(|| format!(r#"Failed to delete author with id "{id}""#))?;

        Ok(())
    }

    async fn find_all_authors(&mut self) -> anyhow::Result<Vec<Author>> {
        sqlx::query_as("SELECT id, name, age, description, image FROM author ORDER BY id")
            .fetch_all(&mut *self.0)
            .await
            .context("Failed to retrieve all authors")
    }
}

#[async_trait]
impl BookRepository for SqliteTx {
    async fn find_book(&mut self, isbn: &Isbn) -> anyhow::Result<Option<Book>> {
        sqlx::query_as(
            "SELECT b.isbn, b.title, b.description, b.image, a.id AS author_id, \
             a.name AS author_name, a.age AS author_age, a.description AS author_description, \
             a.image AS author_image \
             FROM book b JOIN author a ON a.id = b.author_id WHERE b.isbn = ?",
        )
        .bind(isbn.as_str())
        .fetch_optional(&mut *self.0)
        .await
        .with_context(|| format!(r#"Failed to retrieve book with isbn "{isbn}""#))
    }

    async fn book_exists(&mut self, isbn: &Isbn) -> anyhow::Result<bool> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM book WHERE isbn = ?)")
            .bind(isbn.as_str())
            .fetch_one(&mut *self.0)
            .await
            .with_context(|| format!(r#"Failed to check book with isbn "{isbn}""#))
    }

    async fn save_book(&mut self, book: &Book) -> anyhow::Result<Book> {
        let author_id = book
            .author()
            .id()
            .with_context(|| format!(r#"Book "{}" references an author without id"#, book.isbn()))?;

        sqlx::query(
            "INSERT INTO book (isbn, title, description, image, author_id) VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT (isbn) DO UPDATE SET title = excluded.title, \
             description = excluded.description, image = excluded.image, \
             author_id = excluded.author_id",
        )
        .bind(book.isbn().as_str())
        .bind(book.title())
        .bind(book.description())
        .bind(book.image())
        .bind(author_id)
        .execute(&mut *self.0)
        .await
        .with_context(|| format!(r#"Failed to save book with isbn "{}""#, book.isbn()))?;

        Ok(book.clone())
    }

    async fn delete_book(&mut self, isbn: &Isbn) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM book WHERE isbn = ?")
            .bind(isbn.as_str())
            .execute(&mut *self.0)
            .await
            .with_context(|| format!(r#"Failed to delete book with isbn "{isbn}""#))?;

        Ok(())
    }

    async fn find_books(&mut self, author_id: Option<i64>) -> anyhow::Result<Vec<Book>> {
        sqlx::query_as(
            "SELECT b.isbn, b.title, b.description, b.image, a.id AS author_id, \
             a.name AS author_name, a.age AS author_age, a.description AS author_description, \
             a.image AS author_image \
             FROM book b JOIN author a ON a.id = b.author_id \
             WHERE ? IS NULL OR b.author_id = ? ORDER BY b.isbn",
        )
        .bind(author_id)
        .bind(author_id)
        .fetch_all(&mut *self.0)
        .await
        .context("Failed to retrieve books")
    }
}
