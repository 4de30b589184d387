//! Typed query helpers over the blog database.
//!
//! Listing filters are assembled with [`sqlx::QueryBuilder`] from an
//! enumerated set of optional predicates, each bound as a parameter; filter
//! values never reach the SQL text itself.

use sqlx::{QueryBuilder, Sqlite};

use crate::db::BlogDatabase;
use crate::error::{Result, StoreError};
use crate::models::{BlogRow, BlogSummary, Category, Tag};

/// Listing SELECT joining blogs to their category and tags.
const BLOG_SELECT: &str = "\
SELECT blog.blog_id, blog.blog_name, category.category_name, \
GROUP_CONCAT(tag.tag_name) AS tags, blog.pull_address \
FROM blog \
JOIN category ON blog.category_id = category.category_id \
LEFT JOIN blog_tag ON blog.blog_id = blog_tag.blog_id \
LEFT JOIN tag ON blog_tag.tag_id = tag.tag_id";

/// Count over the same join, collapsed to distinct blogs.
const BLOG_COUNT: &str = "\
SELECT COUNT(DISTINCT blog.blog_id) \
FROM blog \
JOIN category ON blog.category_id = category.category_id \
LEFT JOIN blog_tag ON blog.blog_id = blog_tag.blog_id \
LEFT JOIN tag ON blog_tag.tag_id = tag.tag_id";

/// Optional listing predicates, AND-combined.
///
/// Each predicate is an infix `LIKE` match on the respective name column.
/// Note that filtering by tag also narrows the aggregated `tags` column to
/// the matching tag rows.
#[derive(Debug, Clone, Default)]
pub struct BlogFilter {
    name: Option<String>,
    category: Option<String>,
    tag: Option<String>,
}

impl BlogFilter {
    /// Create an empty filter (matches every blog).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Match blogs whose name contains `pattern`.
    #[must_use]
    pub fn name(mut self, pattern: impl Into<String>) -> Self {
        self.name = Some(pattern.into());
        self
    }

    /// Match blogs whose category name contains `pattern`.
    #[must_use]
    pub fn category(mut self, pattern: impl Into<String>) -> Self {
        self.category = Some(pattern.into());
        self
    }

    /// Match blogs with a tag whose name contains `pattern`.
    #[must_use]
    pub fn tag(mut self, pattern: impl Into<String>) -> Self {
        self.tag = Some(pattern.into());
        self
    }

    /// Append the WHERE clause for the configured predicates.
    fn push_predicates(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        let predicates = [
            ("blog.blog_name", self.name.as_deref()),
            ("category.category_name", self.category.as_deref()),
            ("tag.tag_name", self.tag.as_deref()),
        ];
        let mut keyword = " WHERE ";
        for (column, pattern) in predicates {
            if let Some(pattern) = pattern {
                builder.push(keyword);
                builder.push(column);
                builder.push(" LIKE ");
                builder.push_bind(format!("%{pattern}%"));
                keyword = " AND ";
            }
        }
    }
}

/// Half-open `[begin, end)` listing range.
///
/// When both bounds are negative they address the tail of the filtered
/// result: `begin` is an offset from the end of the full count. An offset
/// reaching past the start is clamped to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub begin: i64,
    pub end: i64,
}

/// Resolved LIMIT/OFFSET pair.
#[derive(Debug, PartialEq, Eq)]
struct Slice {
    limit: i64,
    offset: i64,
}

impl PageRange {
    #[must_use]
    pub fn new(begin: i64, end: i64) -> Self {
        Self { begin, end }
    }

    /// Whether this range addresses the tail of the result set.
    fn is_tail(self) -> bool {
        self.begin < 0 && self.end < 0
    }

    fn resolve(self, total: i64) -> Slice {
        if self.is_tail() {
            Slice {
                limit: (self.end - self.begin).abs(),
                offset: (total + self.begin).max(0),
            }
        } else {
            Slice {
                limit: (self.end - self.begin).max(0),
                offset: self.begin.max(0),
            }
        }
    }
}

impl Default for PageRange {
    /// First page of ten, matching the default listing request.
    fn default() -> Self {
        Self { begin: 0, end: 10 }
    }
}

impl BlogDatabase {
    /// List blogs matching `filter`, newest (highest id) first.
    ///
    /// Multiple tag rows per blog are collapsed into one summary with the
    /// tag names split into a vector.
    pub async fn list_blogs(
        &self,
        filter: &BlogFilter,
        range: PageRange,
    ) -> Result<Vec<BlogSummary>> {
        // The tail position is only known relative to the filtered count
        let total = if range.is_tail() {
            self.count_blogs(filter).await?
        } else {
            0
        };
        let Slice { limit, offset } = range.resolve(total);

        let mut builder = QueryBuilder::new(BLOG_SELECT);
        filter.push_predicates(&mut builder);
        builder.push(" GROUP BY blog.blog_id ORDER BY blog.blog_id DESC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let rows: Vec<BlogRow> = builder.build_query_as().fetch_all(self.pool()).await?;
        Ok(rows.into_iter().map(BlogSummary::from).collect())
    }

    /// Count blogs matching `filter`.
    pub async fn count_blogs(&self, filter: &BlogFilter) -> Result<i64> {
        let mut builder = QueryBuilder::new(BLOG_COUNT);
        filter.push_predicates(&mut builder);
        builder
            .build_query_scalar()
            .fetch_optional(self.pool())
            .await?
            .ok_or(StoreError::MalformedResult("blog count returned no row"))
    }

    /// Fetch a single blog by primary key.
    ///
    /// Returns `None` for an unknown id; the `tags` field is an empty vector
    /// when the blog has no tags.
    pub async fn blog_detail(&self, blog_id: i64) -> Result<Option<BlogSummary>> {
        let sql = format!("{BLOG_SELECT} WHERE blog.blog_id = ? GROUP BY blog.blog_id");
        let row: Option<BlogRow> = sqlx::query_as(&sql)
            .bind(blog_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(BlogSummary::from))
    }

    /// List all tags.
    pub async fn tags(&self) -> Result<Vec<Tag>> {
        Ok(sqlx::query_as("SELECT tag_id, tag_name FROM tag")
            .fetch_all(self.pool())
            .await?)
    }

    /// List all categories.
    pub async fn categories(&self) -> Result<Vec<Category>> {
        Ok(sqlx::query_as("SELECT category_id, category_name FROM category")
            .fetch_all(self.pool())
            .await?)
    }

    /// Look up a category id by exact name.
    pub async fn category_id(&self, name: &str) -> Result<Option<i64>> {
        Ok(
            sqlx::query_scalar("SELECT category_id FROM category WHERE category_name = ?")
                .bind(name)
                .fetch_optional(self.pool())
                .await?,
        )
    }

    /// Look up a tag id by exact name.
    pub async fn tag_id(&self, name: &str) -> Result<Option<i64>> {
        Ok(
            sqlx::query_scalar("SELECT tag_id FROM tag WHERE tag_name = ?")
                .bind(name)
                .fetch_optional(self.pool())
                .await?,
        )
    }

    /// Look up a blog id by exact name.
    pub async fn blog_id(&self, name: &str) -> Result<Option<i64>> {
        Ok(
            sqlx::query_scalar("SELECT blog_id FROM blog WHERE blog_name = ?")
                .bind(name)
                .fetch_optional(self.pool())
                .await?,
        )
    }

    /// Total number of categories.
    pub async fn category_count(&self) -> Result<i64> {
        self.table_count("SELECT COUNT(*) FROM category").await
    }

    /// Total number of tags.
    pub async fn tag_count(&self) -> Result<i64> {
        self.table_count("SELECT COUNT(*) FROM tag").await
    }

    /// Total number of blogs.
    pub async fn blog_count(&self) -> Result<i64> {
        self.table_count("SELECT COUNT(*) FROM blog").await
    }

    async fn table_count(&self, sql: &str) -> Result<i64> {
        sqlx::query_scalar(sql)
            .fetch_optional(self.pool())
            .await?
            .ok_or(StoreError::MalformedResult("table count returned no row"))
    }

    /// Execute raw SQL statements in order.
    ///
    /// There is no wrapping transaction: a failure partway returns the error
    /// and leaves the preceding statements applied.
    pub async fn execute_batch(&self, statements: &[impl AsRef<str>]) -> Result<()> {
        for statement in statements {
            sqlx::query(statement.as_ref()).execute(self.pool()).await?;
        }
        Ok(())
    }

    /// Rowid generated by the session's most recent successful insert.
    pub async fn last_insert_rowid(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT last_insert_rowid()")
            .fetch_optional(self.pool())
            .await?
            .ok_or(StoreError::MalformedResult(
                "last_insert_rowid returned no row",
            ))
    }
}
