use std::time::Duration;

use crate::api::{ApiError, BooksApi};
use crate::models::{Book, BookUpdate};
use crate::query::{QueryClient, QueryOptions, QueryState};

/// Search text must be longer than this (after trimming) before a search runs
pub const SEARCH_MIN_LEN: usize = 2;

/// Search results stay fresh for 30 seconds
pub const SEARCH_STALE_TIME: Duration = Duration::from_secs(30);

pub mod book_keys {
    use crate::query::QueryKey;

    pub fn all() -> QueryKey {
        QueryKey::from(["books"])
    }

    pub fn lists() -> QueryKey {
        all().with("list")
    }

    /// One page of the catalog, or of a search when `query` is set
    pub fn list(skip: usize, limit: usize, query: Option<&str>) -> QueryKey {
        let key = lists()
            .with(format!("skip={}", skip))
            .with(format!("limit={}", limit));
        match query {
            Some(q) => key.with(format!("q={}", q)),
            None => key,
        }
    }

    pub fn details() -> QueryKey {
        all().with("detail")
    }

    pub fn detail(isbn: &str) -> QueryKey {
        details().with(isbn)
    }
}

/// Whether `text` is long enough to be worth sending to the search endpoint
pub fn is_searchable(text: &str) -> bool {
    text.trim().chars().count() > SEARCH_MIN_LEN
}

#[derive(Clone)]
pub struct BookQueries {
    api: BooksApi,
    client: QueryClient,
}

impl BookQueries {
    pub fn new(api: BooksApi, client: QueryClient) -> Self {
        Self { api, client }
    }

    /// Each page is cached under its own key, so paging back is instant.
    pub async fn page(&self, skip: usize, limit: usize) -> QueryState<Vec<Book>> {
        let api = self.api.clone();
        self.client
            .fetch(
                book_keys::list(skip, limit, None),
                &QueryOptions::default(),
                move || {
                    let api = api.clone();
                    async move { api.list(skip, limit).await }
                },
            )
            .await
    }

    /// Returns `Idle` without a request while the text is too short.
    pub async fn search(&self, text: &str, skip: usize, limit: usize) -> QueryState<Vec<Book>> {
        let text = text.trim().to_string();
        let options = QueryOptions::default()
            .stale_time(SEARCH_STALE_TIME)
            .enabled(is_searchable(&text));
        let key = book_keys::list(skip, limit, Some(&text));
        let api = self.api.clone();
        self.client
            .fetch(key, &options, move || {
                let api = api.clone();
                let text = text.clone();
                async move { api.search(&text, skip, limit).await }
            })
            .await
    }

    pub async fn detail(&self, isbn: &str) -> QueryState<Book> {
        let isbn = isbn.trim().to_string();
        let options = QueryOptions::default().enabled(!isbn.is_empty());
        let key = book_keys::detail(&isbn);
        let api = self.api.clone();
        self.client
            .fetch(key, &options, move || {
                let api = api.clone();
                let isbn = isbn.clone();
                async move { api.get_by_isbn(&isbn).await }
            })
            .await
    }

    pub async fn add(&self, book: &Book) -> Result<Book, ApiError> {
        self.client
            .mutate(self.api.add(book), &[book_keys::all()])
            .await
    }

    pub async fn update(&self, isbn: &str, update: &BookUpdate) -> Result<Book, ApiError> {
        self.client
            .mutate(self.api.update(isbn, update), &[book_keys::all()])
            .await
    }

    pub async fn delete(&self, isbn: &str) -> Result<(), ApiError> {
        self.client
            .mutate(self.api.delete(isbn), &[book_keys::all()])
            .await
    }

    /// Cached page without touching the network
    pub fn cached_page(&self, skip: usize, limit: usize) -> Option<Vec<Book>> {
        self.client
            .get_query_data(&book_keys::list(skip, limit, None))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::HttpClient;
    use crate::auth::MemoryTokenStore;
    use crate::nav::Route;
    use crate::testing::{json_response, RecordingNavigator, ScriptedTransport};

    const DUNE: &str = r#"{"book_isbn": "9780441172719", "title": "Dune", "author_name": "Frank Herbert"}"#;

    fn queries_with(transport: Arc<ScriptedTransport>) -> (BookQueries, QueryClient) {
        let tokens = Arc::new(MemoryTokenStore::with_token("tok"));
        let nav = Arc::new(RecordingNavigator::at(Route::Books));
        let client = QueryClient::new();
        let api = BooksApi::new(HttpClient::new(transport, tokens, nav));
        (BookQueries::new(api, client.clone()), client)
    }

    #[test]
    fn test_book_keys() {
        assert_eq!(book_keys::all().segments(), &["books"]);
        assert_eq!(
            book_keys::list(4, 4, None).segments(),
            &["books", "list", "skip=4", "limit=4"]
        );
        assert_eq!(
            book_keys::list(0, 4, Some("dune")).segments(),
            &["books", "list", "skip=0", "limit=4", "q=dune"]
        );
        assert!(book_keys::detail("123").starts_with(&book_keys::details()));
    }

    #[test]
    fn test_search_threshold() {
        assert!(!is_searchable(""));
        assert!(!is_searchable("ab"));
        assert!(!is_searchable("  ab  "));
        assert!(is_searchable("abc"));
        // Counted in characters, not bytes
        assert!(!is_searchable("éé"));
    }

    #[tokio::test]
    async fn test_short_search_issues_no_request() {
        let transport = Arc::new(ScriptedTransport::always(json_response(200, "[]")));
        let (queries, _) = queries_with(transport.clone());

        let state = queries.search("ab", 0, 4).await;

        assert!(state.is_idle());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_long_enough_search_issues_request() {
        let transport = Arc::new(ScriptedTransport::always(json_response(
            200,
            &format!("[{}]", DUNE),
        )));
        let (queries, _) = queries_with(transport.clone());

        let state = queries.search("abc", 0, 4).await;

        assert_eq!(transport.call_count(), 1);
        assert_eq!(state.data().map(Vec::len), Some(1));
        assert_eq!(transport.paths(), vec!["/books/search"]);
    }

    #[tokio::test]
    async fn test_repeated_search_served_from_cache() {
        let transport = Arc::new(ScriptedTransport::always(json_response(200, "[]")));
        let (queries, _) = queries_with(transport.clone());

        queries.search("dune", 0, 4).await;
        queries.search(" dune ", 0, 4).await;

        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_switching_pages_keeps_earlier_pages() {
        let transport = Arc::new(ScriptedTransport::new(|req| {
            let skip = req
                .query
                .iter()
                .find(|(k, _)| k == "skip")
                .map(|(_, v)| v.clone())
                .unwrap_or_default();
            if skip == "0" {
                Ok(json_response(200, &format!("[{}]", DUNE)))
            } else {
                Ok(json_response(200, "[]"))
            }
        }));
        let (queries, _) = queries_with(transport.clone());

        queries.page(0, 4).await;
        let second = queries.page(4, 4).await;

        assert_eq!(second.data().map(Vec::len), Some(0));
        let first = queries.cached_page(0, 4).unwrap();
        assert_eq!(first[0].title, "Dune");
    }

    #[tokio::test]
    async fn test_empty_isbn_detail_is_disabled() {
        let transport = Arc::new(ScriptedTransport::always(json_response(200, DUNE)));
        let (queries, _) = queries_with(transport.clone());

        assert!(queries.detail("  ").await.is_idle());
        assert_eq!(transport.call_count(), 0);

        let book = queries.detail("9780441172719").await;
        assert_eq!(book.data().map(|b| b.title.as_str()), Some("Dune"));
    }

    #[tokio::test]
    async fn test_book_mutations_invalidate_all_book_queries() {
        let transport = Arc::new(ScriptedTransport::always(json_response(200, DUNE)));
        let (queries, client) = queries_with(transport.clone());
        let search_key = book_keys::list(0, 4, Some("dune"));
        client.set_query_data(search_key.clone(), &Vec::<Book>::new());
        // Mark the seeded entry fresh for 30s
        queries.search("dune", 0, 4).await;
        assert!(!client.is_stale(&search_key));

        let update = BookUpdate {
            title: Some("Dune Messiah".to_string()),
            ..Default::default()
        };
        queries.update("9780441172719", &update).await.unwrap();

        assert!(client.is_stale(&search_key));
        assert_eq!(transport.paths(), vec!["/books/9780441172719"]);
    }
}
