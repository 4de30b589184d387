//! Blog store: session loading and typed query helpers over the embedded
//! SQLite database.
//!
//! A blog session works against a private, ephemeral copy of the published
//! database: the [`SessionLoader`] obtains the serialized image (from the
//! persistent blob cache, or a remote fetch stored into it) and hydrates a
//! [`BlogDatabase`] from the bytes. The query helpers then return
//! serde-serializable rows shaped for direct display.
//!
//! # Example
//!
//! ```no_run
//! use vellum_store::{BlogFilter, PageRange, SessionLoader};
//!
//! # async fn example() -> vellum_store::Result<()> {
//! let config = vellum_config::Config::load(None).expect("config");
//! let db = SessionLoader::from_config(&config).load().await?;
//!
//! let filter = BlogFilter::new().category("rust");
//! let page = db.list_blogs(&filter, PageRange::new(0, 10)).await?;
//! for blog in page {
//!     println!("{} [{}]", blog.blog_name, blog.tags.join(", "));
//! }
//! # Ok(())
//! # }
//! ```

mod db;
mod error;
mod loader;
mod models;
mod query;

pub use db::BlogDatabase;
pub use error::{Result, StoreError};
pub use loader::{IMAGE_KEY, SessionLoader};
pub use models::{BlogSummary, Category, Tag};
pub use query::{BlogFilter, PageRange};
