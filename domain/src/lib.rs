use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

// --- Domain Errors ---
#[derive(Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("title and content must be submitted")]
    MissingTitleOrContent,
}

// --- Post ID ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(u64);

impl PostId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Id for the next post: one past the largest id in `posts`, or 1 when empty.
    pub fn next_after(posts: &[Post]) -> Self {
        posts
            .iter()
            .map(|post| post.id.0)
            .max()
            .map_or(Self(1), |max| Self(max + 1))
    }
}
impl From<u64> for PostId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}
impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// --- Post ---

/// A single post record. Serializes as `{"id", "title", "content"}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
}

impl Post {
    /// Materializes a validated draft under the given id.
    pub fn new(id: PostId, draft: NewPost) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
        }
    }

    /// Overwrites only the fields the patch carries.
    pub fn apply(&mut self, patch: &PostPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
    }

    pub fn field(&self, field: SortField) -> &str {
        match field {
            SortField::Title => &self.title,
            SortField::Content => &self.content,
        }
    }
}

/// A post that passed required-field validation but has no id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    title: String,
    content: String,
}

impl NewPost {
    /// Both fields must be present and non-empty.
    pub fn new(title: Option<String>, content: Option<String>) -> Result<Self, DomainError> {
        match (title, content) {
            (Some(title), Some(content)) if !title.is_empty() && !content.is_empty() => {
                Ok(Self { title, content })
            }
            _ => Err(DomainError::MissingTitleOrContent),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Partial update. `None` leaves the field untouched; empty strings are
/// dropped so a stored post never ends up with an empty field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl PostPatch {
    pub fn new(title: Option<String>, content: Option<String>) -> Self {
        Self {
            title: title.filter(|t| !t.is_empty()),
            content: content.filter(|c| !c.is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

// --- Sorting ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Content,
}

impl SortField {
    /// Unknown field names yield `None` and leave the listing unsorted.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "title" => Some(Self::Title),
            "content" => Some(Self::Content),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Only `desc` reverses; anything else sorts ascending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Stable, case-insensitive sort. Ties keep their relative order in both directions.
    pub fn apply(&self, posts: &mut [Post]) {
        posts.sort_by(|a, b| {
            let comparison = compare_ignore_case(a.field(self.field), b.field(self.field));
            match self.direction {
                SortDirection::Asc => comparison,
                SortDirection::Desc => comparison.reverse(),
            }
        });
    }
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

// --- Search ---

/// Case-insensitive substring criteria. A post matches when ANY supplied
/// criterion matches; with no criteria nothing matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    title: Option<String>,
    content: Option<String>,
}

impl SearchCriteria {
    pub fn new(title: Option<String>, content: Option<String>) -> Self {
        Self {
            title: title.filter(|t| !t.is_empty()).map(|t| t.to_lowercase()),
            content: content.filter(|c| !c.is_empty()).map(|c| c.to_lowercase()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }

    pub fn matches(&self, post: &Post) -> bool {
        let title_match = self
            .title
            .as_ref()
            .is_some_and(|needle| post.title.to_lowercase().contains(needle.as_str()));
        let content_match = self
            .content
            .as_ref()
            .is_some_and(|needle| post.content.to_lowercase().contains(needle.as_str()));
        title_match || content_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post(id: u64, title: &str, content: &str) -> Post {
        Post {
            id: PostId::new(id),
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    fn ids(posts: &[Post]) -> Vec<u64> {
        posts.iter().map(|p| p.id.value()).collect()
    }

    #[test]
    fn next_id_starts_at_one() {
        assert_eq!(PostId::next_after(&[]), PostId::new(1));
    }

    #[test]
    fn next_id_is_one_past_max() {
        let posts = vec![post(2, "b", "b"), post(7, "a", "a"), post(3, "c", "c")];
        assert_eq!(PostId::next_after(&posts), PostId::new(8));
    }

    #[test]
    fn post_serializes_with_flat_id() {
        let value = serde_json::to_value(post(3, "T", "C")).unwrap();
        assert_eq!(value, json!({"id": 3, "title": "T", "content": "C"}));
    }

    #[test]
    fn new_post_requires_both_fields() {
        assert!(NewPost::new(Some("t".into()), Some("c".into())).is_ok());
        assert_eq!(
            NewPost::new(None, Some("c".into())),
            Err(DomainError::MissingTitleOrContent)
        );
        assert_eq!(
            NewPost::new(Some("t".into()), Some(String::new())),
            Err(DomainError::MissingTitleOrContent)
        );
        assert_eq!(
            DomainError::MissingTitleOrContent.to_string(),
            "title and content must be submitted"
        );
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let mut p = post(1, "Old", "Body");
        p.apply(&PostPatch::new(Some("New".into()), None));
        assert_eq!(p.title, "New");
        assert_eq!(p.content, "Body");

        p.apply(&PostPatch::new(None, Some(String::new())));
        assert_eq!(p.content, "Body");
    }

    #[test]
    fn sort_parsing_falls_back() {
        assert_eq!(SortField::parse("title"), Some(SortField::Title));
        assert_eq!(SortField::parse("author"), None);
        assert_eq!(SortDirection::parse(Some("desc")), SortDirection::Desc);
        assert_eq!(SortDirection::parse(Some("sideways")), SortDirection::Asc);
        assert_eq!(SortDirection::parse(None), SortDirection::Asc);
    }

    #[test]
    fn sort_is_case_insensitive_and_stable() {
        let mut posts = vec![
            post(1, "banana", "x"),
            post(2, "Apple", "x"),
            post(3, "apple", "x"),
            post(4, "Cherry", "x"),
        ];
        SortSpec {
            field: SortField::Title,
            direction: SortDirection::Asc,
        }
        .apply(&mut posts);
        assert_eq!(ids(&posts), vec![2, 3, 1, 4]);

        SortSpec {
            field: SortField::Title,
            direction: SortDirection::Desc,
        }
        .apply(&mut posts);
        assert_eq!(ids(&posts), vec![4, 1, 2, 3]);
    }

    #[test]
    fn search_is_or_across_criteria() {
        let a = post(1, "First post", "alpha");
        let b = post(2, "Second post", "beta");

        let by_title = SearchCriteria::new(Some("FIRST".into()), None);
        assert!(by_title.matches(&a));
        assert!(!by_title.matches(&b));

        let either = SearchCriteria::new(Some("first".into()), Some("beta".into()));
        assert!(either.matches(&a));
        assert!(either.matches(&b));
    }

    #[test]
    fn empty_criteria_match_nothing() {
        let criteria = SearchCriteria::new(None, Some(String::new()));
        assert!(criteria.is_empty());
        assert!(!criteria.matches(&post(1, "anything", "at all")));
    }
}
