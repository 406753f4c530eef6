use crate::models::{
    Author, AuthorUpdateRequest, Book, BookSummary, BookUpdateRequest, CreateAuthorError, Isbn,
    SavedBook, StoreError, UpdateAuthorError, UpdateBookError, UpsertBookError,
};
use crate::store::{AuthorRepository, BookRepository, Store, UnitOfWork};

#[derive(Debug, Clone)]
pub struct AuthorService<S> {
    store: S,
}

impl<S: Store> AuthorService<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Persists a new author. Callers must leave the id unset; the store assigns it.
    pub async fn create(&self, author: Author) -> Result<Author, CreateAuthorError> {
        if let Some(id) = author.id() {
            return Err(CreateAuthorError::InvalidInput { id });
        }

        let mut tx = self.store.begin_write().await?;
        let saved = tx.save_author(&author).await?;
        tx.commit().await?;

        tracing::info!(id = ?saved.id(), name = %saved.name(), "created author");
        Ok(saved)
    }

    pub async fn list(&self) -> Result<Vec<Author>, StoreError> {
        let mut tx = self.store.begin().await?;
        let authors = tx.find_all_authors().await?;
        Ok(authors)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Author>, StoreError> {
        let mut tx = self.store.begin().await?;
        let author = tx.find_author(id).await?;
        tracing::debug!(id, found = author.is_some(), "looked up author");
        Ok(author)
    }

    /// Replaces every field of the author at `id`. Any id carried by `author` is ignored.
    pub async fn full_update(&self, id: i64, author: Author) -> Result<Author, UpdateAuthorError> {
        let mut tx = self.store.begin_write().await?;
        if !tx.author_exists(id).await? {
            return Err(UpdateAuthorError::NotFound { id });
        }

        let saved = tx.save_author(&author.with_id(id)).await?;
        tx.commit().await?;

        tracing::info!(id, "replaced author");
        Ok(saved)
    }

    pub async fn partial_update(
        &self,
        id: i64,
        update: &AuthorUpdateRequest,
    ) -> Result<Author, UpdateAuthorError> {
        let mut tx = self.store.begin_write().await?;
        let existing = tx
            .find_author(id)
            .await?
            .ok_or(UpdateAuthorError::NotFound { id })?;

        let saved = tx.save_author(&update.apply_to(existing)).await?;
        tx.commit().await?;

        tracing::info!(id, "updated author");
        Ok(saved)
    }

    /// Removes the author and every book it owns. Unknown ids are ignored.
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut tx = self.store.begin_write().await?;
        tx.delete_author(id).await?;
        tx.commit().await?;

        tracing::info!(id, "deleted author");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct BookService<S> {
    store: S,
}

impl<S: Store> BookService<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates the book at `isbn` or replaces it in full, reporting which happened.
    pub async fn create_or_update(
        &self,
        isbn: Isbn,
        summary: BookSummary,
    ) -> Result<SavedBook, UpsertBookError> {
        let author_id = summary.author_id();

        let mut tx = self.store.begin_write().await?;
        let author = tx
            .find_author(author_id)
            .await?
            .ok_or(UpsertBookError::AuthorNotFound { id: author_id })?;
        if author.id().is_none() {
            tracing::error!(author_id, "stored author has no id");
            return Err(UpsertBookError::InvalidAuthor);
        }

        let created = !tx.book_exists(&isbn).await?;
        let book = tx.save_book(&summary.into_book(isbn, author)).await?;
        tx.commit().await?;

        tracing::info!(isbn = %book.isbn(), author_id, created, "saved book");
        Ok(SavedBook { book, created })
    }

    /// All books, or only those owned by `author_id` when given.
    pub async fn list(&self, author_id: Option<i64>) -> Result<Vec<Book>, StoreError> {
        let mut tx = self.store.begin().await?;
        let books = tx.find_books(author_id).await?;
        Ok(books)
    }

    pub async fn get(&self, isbn: &Isbn) -> Result<Option<Book>, StoreError> {
        let mut tx = self.store.begin().await?;
        let book = tx.find_book(isbn).await?;
        tracing::debug!(%isbn, found = book.is_some(), "looked up book");
        Ok(book)
    }

    pub async fn partial_update(
        &self,
        isbn: &Isbn,
        update: &BookUpdateRequest,
    ) -> Result<Book, UpdateBookError> {
        let mut tx = self.store.begin_write().await?;
        let existing = tx
            .find_book(isbn)
            .await?
            .ok_or_else(|| UpdateBookError::NotFound { isbn: isbn.clone() })?;

        let saved = tx.save_book(&update.apply_to(existing)).await?;
        tx.commit().await?;

        tracing::info!(%isbn, "updated book");
        Ok(saved)
    }

    pub async fn delete(&self, isbn: &Isbn) -> Result<(), StoreError> {
        let mut tx = self.store.begin_write().await?;
        tx.delete_book(isbn).await?;
        tx.commit().await?;

        tracing::info!(%isbn, "deleted book");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthorName;
    use crate::sqlite::Sqlite;

    const BOOK_A_ISBN: &str = "978-089-230342-0777";

    fn author_a() -> Author {
        Author::new(
            None,
            AuthorName::new_unchecked("Nelson"),
            30,
            "Nelson".into(),
            "nelson.jpg".into(),
        )
    }

    fn author_b() -> Author {
        Author::new(
            None,
            AuthorName::new_unchecked("Don Joe"),
            65,
            "Some other description".into(),
            "sol-maria.jpeg".into(),
        )
    }

    fn summary_a(author_id: i64) -> BookSummary {
        BookSummary::new(
            "Test Book A".into(),
            "A description...".into(),
            "nelson.jpg".into(),
            author_id,
        )
    }

    fn summary_b(author_id: i64) -> BookSummary {
        BookSummary::new(
            "Test Book B".into(),
            "Another description...".into(),
            "another-image.jpeg".into(),
            author_id,
        )
    }

    fn isbn(raw: &str) -> Isbn {
        Isbn::new(raw).unwrap()
    }

    async fn services() -> (AuthorService<Sqlite>, BookService<Sqlite>) {
        let store = Sqlite::in_memory().await.unwrap();
        (AuthorService::new(store.clone()), BookService::new(store))
    }

    #[tokio::test]
    async fn create_persists_author_with_new_id() {
        let (authors, _) = services().await;

        let saved = authors.create(author_a()).await.unwrap();
        let id = saved.id().expect("store assigns an id");

        let recalled = authors.get(id).await.unwrap();
        assert_eq!(recalled, Some(author_a().with_id(id)));
    }

    #[tokio::test]
    async fn create_rejects_author_with_id() {
        let (authors, _) = services().await;

        let err = authors.create(author_a().with_id(999)).await.unwrap_err();
        assert!(matches!(err, CreateAuthorError::InvalidInput { id: 999 }));
        assert!(authors.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_returns_saved_authors() {
        let (authors, _) = services().await;
        assert!(authors.list().await.unwrap().is_empty());

        let a = authors.create(author_a()).await.unwrap();
        let b = authors.create(author_b()).await.unwrap();
        assert_eq!(authors.list().await.unwrap(), vec![a, b]);
    }

    #[tokio::test]
    async fn get_returns_none_for_unknown_author() {
        let (authors, _) = services().await;
        assert_eq!(authors.get(999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn full_update_replaces_author_and_forces_id() {
        let (authors, _) = services().await;
        let id = authors.create(author_a()).await.unwrap().id().unwrap();

        let result = authors
            .full_update(id, author_b().with_id(12345))
            .await
            .unwrap();
        assert_eq!(result, author_b().with_id(id));
        assert_eq!(authors.get(id).await.unwrap(), Some(author_b().with_id(id)));
        assert_eq!(authors.get(12345).await.unwrap(), None);
    }

    #[tokio::test]
    async fn full_update_fails_for_unknown_author() {
        let (authors, _) = services().await;

        let err = authors.full_update(999, author_b()).await.unwrap_err();
        assert!(matches!(err, UpdateAuthorError::NotFound { id: 999 }));
    }

    #[tokio::test]
    async fn partial_update_fails_for_unknown_author() {
        let (authors, _) = services().await;

        let mut update = AuthorUpdateRequest::new();
        update.set_name(AuthorName::new_unchecked("Nelson"));
        let err = authors.partial_update(999, &update).await.unwrap_err();
        assert!(matches!(err, UpdateAuthorError::NotFound { id: 999 }));
    }

    #[tokio::test]
    async fn partial_update_with_no_fields_returns_unchanged_author() {
        let (authors, _) = services().await;
        let existing = authors.create(author_a()).await.unwrap();

        let updated = authors
            .partial_update(existing.id().unwrap(), &AuthorUpdateRequest::new())
            .await
            .unwrap();
        assert_eq!(updated, existing);
    }

    #[tokio::test]
    async fn partial_update_changes_only_given_fields() {
        let (authors, _) = services().await;
        let id = authors.create(author_a()).await.unwrap().id().unwrap();

        let mut update = AuthorUpdateRequest::new();
        update.set_age(50);
        update.set_description("Rust backend".into());
        let updated = authors.partial_update(id, &update).await.unwrap();

        let expected = Author::new(
            Some(id),
            AuthorName::new_unchecked("Nelson"),
            50,
            "Rust backend".into(),
            "nelson.jpg".into(),
        );
        assert_eq!(updated, expected);
        assert_eq!(authors.get(id).await.unwrap(), Some(expected));
    }

    #[tokio::test]
    async fn partial_update_twice_matches_once() {
        let (authors, _) = services().await;
        let id = authors.create(author_a()).await.unwrap().id().unwrap();

        let mut update = AuthorUpdateRequest::new();
        update.set_image("Kotlin.jpg".into());
        let once = authors.partial_update(id, &update).await.unwrap();
        let twice = authors.partial_update(id, &update).await.unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn delete_removes_author_and_ignores_unknown_ids() {
        let (authors, books) = services().await;
        let id = authors.create(author_a()).await.unwrap().id().unwrap();
        books
            .create_or_update(isbn(BOOK_A_ISBN), summary_a(id))
            .await
            .unwrap();

        authors.delete(id).await.unwrap();
        assert_eq!(authors.get(id).await.unwrap(), None);
        assert_eq!(books.get(&isbn(BOOK_A_ISBN)).await.unwrap(), None);

        authors.delete(999).await.unwrap();
    }

    #[tokio::test]
    async fn upsert_fails_when_author_does_not_exist() {
        let (_, books) = services().await;

        let err = books
            .create_or_update(isbn(BOOK_A_ISBN), summary_a(999))
            .await
            .unwrap_err();
        assert!(matches!(err, UpsertBookError::AuthorNotFound { id: 999 }));
        assert_eq!(books.get(&isbn(BOOK_A_ISBN)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn upsert_creates_then_replaces_book() {
        let (authors, books) = services().await;
        let author = authors.create(author_a()).await.unwrap();
        let id = author.id().unwrap();

        let first = books
            .create_or_update(isbn(BOOK_A_ISBN), summary_a(id))
            .await
            .unwrap();
        assert!(first.created);
        assert_eq!(first.book.author(), &author);
        assert_eq!(
            books.get(&isbn(BOOK_A_ISBN)).await.unwrap(),
            Some(first.book)
        );

        let second = books
            .create_or_update(isbn(BOOK_A_ISBN), summary_b(id))
            .await
            .unwrap();
        assert!(!second.created);

        let stored = books.get(&isbn(BOOK_A_ISBN)).await.unwrap().unwrap();
        assert_eq!(stored.title(), "Test Book B");
        assert_eq!(stored.description(), "Another description...");
        assert_eq!(stored.image(), "another-image.jpeg");
    }

    #[tokio::test]
    async fn list_filters_books_by_author() {
        let (authors, books) = services().await;
        assert!(books.list(Some(1)).await.unwrap().is_empty());

        let nelson = authors.create(author_a()).await.unwrap().id().unwrap();
        let don = authors.create(author_b()).await.unwrap().id().unwrap();
        let a = books
            .create_or_update(isbn("978-0-0000-0001"), summary_a(nelson))
            .await
            .unwrap()
            .book;
        let b = books
            .create_or_update(isbn("978-0-0000-0002"), summary_b(don))
            .await
            .unwrap()
            .book;

        assert_eq!(books.list(Some(nelson)).await.unwrap(), vec![a.clone()]);
        assert_eq!(books.list(Some(don)).await.unwrap(), vec![b.clone()]);
        assert_eq!(books.list(None).await.unwrap(), vec![a, b]);
    }

    #[tokio::test]
    async fn book_partial_update_merges_fields() {
        let (authors, books) = services().await;
        let id = authors.create(author_a()).await.unwrap().id().unwrap();
        let original = books
            .create_or_update(isbn(BOOK_A_ISBN), summary_a(id))
            .await
            .unwrap()
            .book;

        let mut update = BookUpdateRequest::new();
        update.set_description("Updated description".into());
        let updated = books
            .partial_update(&isbn(BOOK_A_ISBN), &update)
            .await
            .unwrap();

        assert_eq!(updated.title(), original.title());
        assert_eq!(updated.image(), original.image());
        assert_eq!(updated.author(), original.author());
        assert_eq!(updated.description(), "Updated description");
        assert_eq!(books.get(&isbn(BOOK_A_ISBN)).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn book_partial_update_fails_for_unknown_book() {
        let (_, books) = services().await;

        let err = books
            .partial_update(&isbn(BOOK_A_ISBN), &BookUpdateRequest::new())
            .await
            .unwrap_err();
        assert!(matches!(err, UpdateBookError::NotFound { .. }));
    }

    #[tokio::test]
    async fn book_delete_is_idempotent() {
        let (authors, books) = services().await;
        let id = authors.create(author_a()).await.unwrap().id().unwrap();
        books
            .create_or_update(isbn(BOOK_A_ISBN), summary_a(id))
            .await
            .unwrap();

        books.delete(&isbn(BOOK_A_ISBN)).await.unwrap();
        books.delete(&isbn(BOOK_A_ISBN)).await.unwrap();
        assert_eq!(books.get(&isbn(BOOK_A_ISBN)).await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_on_file_database_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("bookstore.db").display());
        let store = Sqlite::new(&url, 5).await.unwrap();
        let authors = AuthorService::new(store.clone());
        let books = BookService::new(store);

        let id = authors.create(author_a()).await.unwrap().id().unwrap();

        let mut handles = Vec::new();
        for n in 0..40 {
            let authors = authors.clone();
            handles.push(tokio::spawn(async move {
                let mut update = AuthorUpdateRequest::new();
                update.set_age(n);
                authors
                    .partial_update(id, &update)
                    .await
                    .map(|_| ())
                    .map_err(anyhow::Error::from)
            }));
        }
        for n in 0..20 {
            let books = books.clone();
            handles.push(tokio::spawn(async move {
                let key = isbn(&format!("978-0-0000-{n:04}"));
                books
                    .create_or_update(key, summary_a(id))
                    .await
                    .map(|_| ())
                    .map_err(anyhow::Error::from)
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = authors.get(id).await.unwrap().unwrap();
        assert!((0..40).contains(&stored.age()));
        assert_eq!(books.list(Some(id)).await.unwrap().len(), 20);
    }
}
