use crate::models::{Author, Book, Isbn};
use async_trait::async_trait;

/// Handle to the backing store. Every operation runs inside one [`UnitOfWork`].
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    type Tx: UnitOfWork;

    async fn begin(&self) -> anyhow::Result<Self::Tx>;

    /// Like `begin`, but takes the write lock up front so a read followed by a
    /// write cannot be invalidated by a concurrent writer.
    async fn begin_write(&self) -> anyhow::Result<Self::Tx>;
}

/// A single logical transaction. Dropping it without `commit` discards its writes.
#[async_trait]
pub trait UnitOfWork: AuthorRepository + BookRepository + Send {
    async fn commit(self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait AuthorRepository: Send {
    async fn find_author(&mut self, id: i64) -> anyhow::Result<Option<Author>>;

    async fn author_exists(&mut self, id: i64) -> anyhow::Result<bool>;

    /// Inserts when the author has no id (assigning one), otherwise replaces the record in full.
    async fn save_author(&mut self, author: &Author) -> anyhow::Result<Author>;

    /// No-op for unknown ids. Removes every book owned by the author.
    async fn delete_author(&mut self, id: i64) -> anyhow::Result<()>;

    async fn find_all_authors(&mut self) -> anyhow::Result<Vec<Author>>;
}

#[async_trait]
pub trait BookRepository: Send {
    async fn find_book(&mut self, isbn: &Isbn) -> anyhow::Result<Option<Book>>;

    async fn book_exists(&mut self, isbn: &Isbn) -> anyhow::Result<bool>;

    /// Inserts or fully replaces the record keyed by the book's ISBN.
    async fn save_book(&mut self, book: &Book) -> anyhow::Result<Book>;

    async fn delete_book(&mut self, isbn: &Isbn) -> anyhow::Result<()>;

    async fn find_books(&mut self, author_id: Option<i64>) -> anyhow::Result<Vec<Book>>;
}
