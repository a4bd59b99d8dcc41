use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub book_isbn: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub published_year: Option<i32>,
    pub author_name: String,
}

impl Book {
    pub fn year_display(&self) -> String {
        match self.published_year {
            Some(year) => year.to_string(),
            None => "n/a".to_string(),
        }
    }

    pub fn genre_display(&self) -> &str {
        self.genre.as_deref().unwrap_or("Uncategorized")
    }
}

/// Partial update for `PUT /books/{isbn}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
}
