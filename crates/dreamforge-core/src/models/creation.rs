//! Creation (saved image post) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub prompt: String,
    pub is_public: bool,
    pub is_contest_entry: bool,
    pub likes_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCreation {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub prompt: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateCreation {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
    pub is_contest_entry: Option<bool>,
}

/// Sort order for creation queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CreationOrder {
    #[default]
    Newest,
    MostLiked,
}

/// Filter for creation queries. All set conditions must hold.
#[derive(Debug, Clone, Default)]
pub struct CreationFilter {
    pub owner: Option<Uuid>,
    pub public_only: bool,
    pub contest_only: bool,
}

#[derive(Debug, Clone)]
pub struct CreationQuery {
    pub filter: CreationFilter,
    pub order: CreationOrder,
    pub limit: u64,
}

impl Default for CreationQuery {
    fn default() -> Self {
        Self {
            filter: CreationFilter::default(),
            order: CreationOrder::default(),
            limit: 50,
        }
    }
}

/// Gallery title for a prompt: the first `max_chars` characters,
/// followed by `...` when the prompt was longer.
pub fn title_from_prompt(prompt: &str, max_chars: usize) -> String {
    let prompt = prompt.trim();
    let mut chars = prompt.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_prompt_is_its_own_title() {
        assert_eq!(title_from_prompt("A dragon", 50), "A dragon");
    }

    #[test]
    fn long_prompt_is_truncated_on_char_boundary() {
        let prompt = "é".repeat(60);
        let title = title_from_prompt(&prompt, 50);
        assert_eq!(title, format!("{}...", "é".repeat(50)));
    }

    #[test]
    fn exact_length_has_no_ellipsis() {
        let prompt = "x".repeat(50);
        assert_eq!(title_from_prompt(&prompt, 50), prompt);
    }
}
