//! Row types returned by the query helpers.
//!
//! All public types derive [`serde::Serialize`] so rows can be handed to the
//! UI layer as JSON without further mapping.

use serde::Serialize;
use sqlx::FromRow;

/// One blog as returned by listings and detail lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlogSummary {
    /// Primary key; descending id is the listing order (newest first).
    pub blog_id: i64,
    pub blog_name: String,
    /// Name of the owning category.
    pub category_name: String,
    /// Associated tag names; empty when the blog has no tags, never null.
    pub tags: Vec<String>,
    /// External URL of the hosted markdown content, resolved elsewhere.
    pub pull_address: String,
}

/// Raw listing row before the aggregated tag column is split.
#[derive(Debug, FromRow)]
pub(crate) struct BlogRow {
    pub blog_id: i64,
    pub blog_name: String,
    pub category_name: String,
    /// `GROUP_CONCAT` output; NULL when the blog matched no tag rows.
    pub tags: Option<String>,
    pub pull_address: String,
}

impl From<BlogRow> for BlogSummary {
    fn from(row: BlogRow) -> Self {
        let tags = row.tags.map_or_else(Vec::new, |joined| {
            joined.split(',').map(str::to_owned).collect()
        });
        Self {
            blog_id: row.blog_id,
            blog_name: row.blog_name,
            category_name: row.category_name,
            tags,
            pull_address: row.pull_address,
        }
    }
}

/// A tag row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Tag {
    pub tag_id: i64,
    pub tag_name: String,
}

/// A category row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Category {
    pub category_id: i64,
    pub category_name: String,
}
