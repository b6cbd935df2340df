use serde::{Deserialize, Serialize};

use super::error::ApiError;

/// A stored book, as returned to clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub number_of_pages: i32,
    pub price: i32,
    pub release_year: i32,
}

/// `POST /books` body. Missing fields default; unknown fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub number_of_pages: i32,
    pub price: i32,
    pub release_year: i32,
}

impl NewBook {
    /// Title and author are the only required fields.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.is_empty() || self.author.is_empty() {
            return Err(ApiError::bad_request("required fields are not set, won't save the data"));
        }
        Ok(())
    }

    pub fn into_book(self, id: i32) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            genre: self.genre,
            number_of_pages: self.number_of_pages,
            price: self.price,
            release_year: self.release_year,
        }
    }
}

/// `PATCH /books/{id}` body. Only the fields present are changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub number_of_pages: Option<i32>,
    pub price: Option<i32>,
    pub release_year: Option<i32>,
}

impl BookPatch {
    pub fn apply(self, book: &mut Book) {
        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(author) = self.author {
            book.author = author;
        }
        if let Some(genre) = self.genre {
            book.genre = genre;
        }
        if let Some(pages) = self.number_of_pages {
            book.number_of_pages = pages;
        }
        if let Some(price) = self.price {
            book.price = price;
        }
        if let Some(year) = self.release_year {
            book.release_year = year;
        }
    }
}

/// Body of a `201 Created` answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub resource_id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_serialises_in_camel_case() {
        let book = Book {
            id: 0,
            title: "The Fellowship of the Ring".into(),
            author: "JRR Tolkien".into(),
            genre: "fantasy".into(),
            number_of_pages: 432,
            price: 20,
            release_year: 1954,
        };
        assert_eq!(
            serde_json::to_string(&book).unwrap(),
            r#"{"id":0,"title":"The Fellowship of the Ring","author":"JRR Tolkien","genre":"fantasy","numberOfPages":432,"price":20,"releaseYear":1954}"#
        );
    }

    #[test]
    fn new_book_defaults_missing_fields() {
        let book: NewBook = serde_json::from_str(r#"{"title":"Dune","author":"Frank Herbert"}"#).unwrap();
        assert_eq!(book.genre, "");
        assert_eq!(book.price, 0);
        assert!(book.validate().is_ok());
    }

    #[test]
    fn new_book_rejects_unknown_fields() {
        assert!(serde_json::from_str::<NewBook>(r#"{"title":"Dune","author":"FH","isbn":"x"}"#).is_err());
        assert!(serde_json::from_str::<NewBook>(r#"{"id":4,"title":"Dune","author":"FH"}"#).is_err());
    }

    #[test]
    fn new_book_requires_title_and_author() {
        let book: NewBook = serde_json::from_str(r#"{"title":"Dune"}"#).unwrap();
        let err = book.validate().unwrap_err();
        assert_eq!(err.message(), "required fields are not set, won't save the data");
    }

    #[test]
    fn patch_merges_present_fields_only() {
        let mut book = Book { id: 3, title: "Dune".into(), author: "Frank Herbert".into(), price: 15, ..Book::default() };
        let patch: BookPatch = serde_json::from_str(r#"{"title":"Dune Messiah","price":18}"#).unwrap();
        patch.apply(&mut book);
        assert_eq!(book.title, "Dune Messiah");
        assert_eq!(book.author, "Frank Herbert");
        assert_eq!(book.price, 18);
        assert_eq!(book.id, 3);
    }

    #[test]
    fn action_response_uses_resource_id_key() {
        let body = serde_json::to_string(&ActionResponse { resource_id: 12 }).unwrap();
        assert_eq!(body, r#"{"resourceId":12}"#);
    }
}
