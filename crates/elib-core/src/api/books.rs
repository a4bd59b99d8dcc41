use crate::models::{Book, BookUpdate};

use super::{ApiError, ApiRequest, HttpClient};

#[derive(Clone)]
pub struct BooksApi {
    http: HttpClient,
}

impl BooksApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// One page of the catalog
    pub async fn list(&self, skip: usize, limit: usize) -> Result<Vec<Book>, ApiError> {
        let request = ApiRequest::get("/books")
            .query("skip", skip)
            .query("limit", limit);
        self.http.send_json(request).await
    }

    /// Full-text search over title, author and summary
    pub async fn search(
        &self,
        text: &str,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Book>, ApiError> {
        let request = ApiRequest::get("/books/search")
            .query("text_to_search", text)
            .query("skip", skip)
            .query("limit", limit);
        self.http.send_json(request).await
    }

    pub async fn get_by_isbn(&self, isbn: &str) -> Result<Book, ApiError> {
        self.http.get_json(&format!("/books/{}", isbn)).await
    }

    pub async fn add(&self, book: &Book) -> Result<Book, ApiError> {
        self.http.post_json("/books/", book).await
    }

    pub async fn update(&self, isbn: &str, update: &BookUpdate) -> Result<Book, ApiError> {
        self.http.put_json(&format!("/books/{}", isbn), update).await
    }

    pub async fn delete(&self, isbn: &str) -> Result<(), ApiError> {
        self.http.delete(&format!("/books/{}", isbn)).await
    }
}
