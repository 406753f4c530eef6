use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorName(String);

impl AuthorName {
    pub fn new(raw: &str) -> Result<Self, AuthorNameEmptyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Err(AuthorNameEmptyError)
        } else {
            Ok(Self(trimmed.into()))
        }
    }

    pub fn new_unchecked(raw: &str) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AuthorName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug)]
#[error("Author name cannot be empty")]
pub struct AuthorNameEmptyError;

/// Book key. Digits and hyphens, optionally ending in an uppercase check character `X`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Isbn(String);

impl Isbn {
    pub fn new(raw: &str) -> Result<Self, IsbnError> {
        let trimmed = raw.trim();
        if Self::is_valid(trimmed) {
            Ok(Self(trimmed.into()))
        } else {
            Err(IsbnError(trimmed.into()))
        }
    }

    pub fn new_unchecked(raw: &str) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(s: &str) -> bool {
        static RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[0-9][0-9-]{8,}[0-9X]$").expect("ISBN pattern is valid")
        });
        RE.is_match(s)
    }
}

impl std::fmt::Display for Isbn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug)]
#[error("{0} is not a valid ISBN")]
pub struct IsbnError(String);

#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    id: Option<i64>,
    name: AuthorName,
    age: i32,
    description: String,
    image: String,
}

impl Author {
    pub const fn new(
        id: Option<i64>,
        name: AuthorName,
        age: i32,
        description: String,
        image: String,
    ) -> Self {
        Self {
            id,
            name,
            age,
            description,
            image,
        }
    }

    /// Absent until the store has saved the record.
    pub const fn id(&self) -> Option<i64> {
        self.id
    }

    pub const fn name(&self) -> &AuthorName {
        &self.name
    }

    pub const fn age(&self) -> i32 {
        self.age
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    #[must_use]
    pub fn with_id(self, id: i64) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    isbn: Isbn,
    title: String,
    description: String,
    image: String,
    author: Author,
}

impl Book {
    pub const fn new(
        isbn: Isbn,
        title: String,
        description: String,
        image: String,
        author: Author,
    ) -> Self {
        Self {
            isbn,
            title,
            description,
            image,
            author,
        }
    }

    pub const fn isbn(&self) -> &Isbn {
        &self.isbn
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub const fn author(&self) -> &Author {
        &self.author
    }
}

/// Fields of a partial author update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct AuthorUpdateRequest {
    name: Option<AuthorName>,
    age: Option<i32>,
    description: Option<String>,
    image: Option<String>,
}

impl AuthorUpdateRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn name(&self) -> Option<&AuthorName> {
        self.name.as_ref()
    }

    pub fn set_name(&mut self, name: AuthorName) {
        self.name = Some(name);
    }

    pub const fn age(&self) -> Option<i32> {
        self.age
    }

    pub fn set_age(&mut self, age: i32) {
        self.age = Some(age);
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: String) {
        self.description = Some(description);
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn set_image(&mut self, image: String) {
        self.image = Some(image);
    }

    /// Overwrites the fields present in this request; the key is never touched.
    pub fn apply_to(&self, author: Author) -> Author {
        Author {
            id: author.id,
            name: self.name.clone().unwrap_or(author.name),
            age: self.age.unwrap_or(author.age),
            description: self.description.clone().unwrap_or(author.description),
            image: self.image.clone().unwrap_or(author.image),
        }
    }
}

/// Fields of a partial book update. The owning author cannot be changed this way.
#[derive(Debug, Clone, Default)]
pub struct BookUpdateRequest {
    title: Option<String>,
    description: Option<String>,
    image: Option<String>,
}

impl BookUpdateRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: String) {
        self.title = Some(title);
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: String) {
        self.description = Some(description);
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn set_image(&mut self, image: String) {
        self.image = Some(image);
    }

    pub fn apply_to(&self, book: Book) -> Book {
        Book {
            isbn: book.isbn,
            title: self.title.clone().unwrap_or(book.title),
            description: self.description.clone().unwrap_or(book.description),
            image: self.image.clone().unwrap_or(book.image),
            author: book.author,
        }
    }
}

/// Input of the book upsert: everything but the key, with the owner given by id.
#[derive(Debug, Clone)]
pub struct BookSummary {
    title: String,
    description: String,
    image: String,
    author_id: i64,
}

impl BookSummary {
    pub const fn new(title: String, description: String, image: String, author_id: i64) -> Self {
        Self {
            title,
            description,
            image,
            author_id,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub const fn author_id(&self) -> i64 {
        self.author_id
    }

    pub fn into_book(self, isbn: Isbn, author: Author) -> Book {
        Book::new(isbn, self.title, self.description, self.image, author)
    }
}

#[derive(Debug, Clone)]
pub struct SavedBook {
    pub book: Book,
    pub created: bool,
}

#[derive(Error, Debug)]
pub enum CreateAuthorError {
    #[error("Author must not carry an id on create, got \"{id}\"")]
    InvalidInput { id: i64 },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum UpdateAuthorError {
    #[error("Author with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum UpsertBookError {
    #[error("Author with id \"{id}\" does not exist")]
    AuthorNotFound { id: i64 },
    #[error("Stored author has no id")]
    InvalidAuthor,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum UpdateBookError {
    #[error("Book with isbn \"{isbn}\" does not exist")]
    NotFound { isbn: Isbn },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct StoreError(#[from] pub anyhow::Error);
