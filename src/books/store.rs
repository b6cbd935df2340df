use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::error;

use super::error::StoreError;
use super::model::{Book, BookPatch, NewBook};

/// Persistence capability the books handlers depend on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn get_books(&self) -> Result<Vec<Book>, StoreError>;
    async fn get_book_by_id(&self, id: i32) -> Result<Book, StoreError>;
    /// Returns the id assigned to the new book.
    async fn add_book(&self, book: NewBook) -> Result<i32, StoreError>;
    async fn remove_book(&self, id: i32) -> Result<(), StoreError>;
    async fn update_book(&self, id: i32, patch: BookPatch) -> Result<(), StoreError>;
}

// ── PostgreSQL ────────────────────────────────────────────────────────────────

const SELECT_ALL: &str = "SELECT id, title, author, genre, number_of_pages, price, release_year \
                          FROM public.books ORDER BY id";
const SELECT_ONE: &str = "SELECT id, title, author, genre, number_of_pages, price, release_year \
                          FROM public.books WHERE id = $1";

/// [`BookStore`] over the `public.books` table.
#[derive(Debug, Clone)]
pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn internal(err: sqlx::Error) -> StoreError {
    error!(error = %err, "books query failed");
    StoreError::internal(err.to_string())
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn get_books(&self) -> Result<Vec<Book>, StoreError> {
        sqlx::query_as::<_, Book>(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)
    }

    async fn get_book_by_id(&self, id: i32) -> Result<Book, StoreError> {
        sqlx::query_as::<_, Book>(SELECT_ONE)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?
            .ok_or_else(|| StoreError::not_found(id))
    }

    async fn add_book(&self, book: NewBook) -> Result<i32, StoreError> {
        sqlx::query_scalar::<_, i32>(
            "INSERT INTO public.books (title, author, genre, number_of_pages, price, release_year) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(book.title)
        .bind(book.author)
        .bind(book.genre)
        .bind(book.number_of_pages)
        .bind(book.price)
        .bind(book.release_year)
        .fetch_one(&self.pool)
        .await
        .map_err(internal)
    }

    async fn remove_book(&self, id: i32) -> Result<(), StoreError> {
        let done = sqlx::query("DELETE FROM public.books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        if done.rows_affected() == 0 {
            return Err(StoreError::not_found(id));
        }
        Ok(())
    }

    async fn update_book(&self, id: i32, patch: BookPatch) -> Result<(), StoreError> {
        let done = sqlx::query(
            "UPDATE public.books SET \
                title = COALESCE($2, title), \
                author = COALESCE($3, author), \
                genre = COALESCE($4, genre), \
                number_of_pages = COALESCE($5, number_of_pages), \
                price = COALESCE($6, price), \
                release_year = COALESCE($7, release_year) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.author)
        .bind(patch.genre)
        .bind(patch.number_of_pages)
        .bind(patch.price)
        .bind(patch.release_year)
        .execute(&self.pool)
        .await
        .map_err(internal)?;
        if done.rows_affected() == 0 {
            return Err(StoreError::not_found(id));
        }
        Ok(())
    }
}

// ── In-memory ─────────────────────────────────────────────────────────────────

/// [`BookStore`] kept in process memory. Ids are assigned from 1.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Shelf>,
}

#[derive(Debug, Default)]
struct Shelf {
    books: BTreeMap<i32, Book>,
    last_id: i32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // a panic elsewhere never leaves the map half-written, so poison is ignored
    fn shelf(&self) -> MutexGuard<'_, Shelf> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn get_books(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.shelf().books.values().cloned().collect())
    }

    async fn get_book_by_id(&self, id: i32) -> Result<Book, StoreError> {
        self.shelf().books.get(&id).cloned().ok_or_else(|| StoreError::not_found(id))
    }

    async fn add_book(&self, book: NewBook) -> Result<i32, StoreError> {
        let mut shelf = self.shelf();
        shelf.last_id += 1;
        let id = shelf.last_id;
        shelf.books.insert(id, book.into_book(id));
        Ok(id)
    }

    async fn remove_book(&self, id: i32) -> Result<(), StoreError> {
        self.shelf().books.remove(&id).map(drop).ok_or_else(|| StoreError::not_found(id))
    }

    async fn update_book(&self, id: i32, patch: BookPatch) -> Result<(), StoreError> {
        let mut shelf = self.shelf();
        let book = shelf.books.get_mut(&id).ok_or_else(|| StoreError::not_found(id))?;
        patch.apply(book);
        Ok(())
    }
}
