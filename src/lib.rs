//! # tumblr
//!
//! Async client for the [Tumblr v2 API](https://www.tumblr.com/docs/en/api/v2).
//!
//! Every call is a single signed HTTP request whose JSON reply is decoded into
//! a typed record. Requests are signed with OAuth1 (HMAC-SHA1); getting the
//! token pair is left to the caller.
//!
//! ```no_run
//! use tumblr::{Params, TumblrClient};
//!
//! # async fn run() -> tumblr::Result<()> {
//! let client = TumblrClient::new("consumer key", "consumer secret", "token", "token secret");
//!
//! let info = client.blog_info("staff.tumblr.com").await?;
//! println!("{} has {} posts", info.blog.name, info.blog.posts);
//!
//! let posts = client.blog_posts("staff", &Params::new().limit(5).kind("text")).await?;
//! for post in posts.posts {
//!     println!("{} {}", post.id, post.post_url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod oauth;
pub mod params;
pub mod types;
mod util;

pub use client::{TumblrClient, API_BASE};
pub use config::Credentials;
pub use error::{Error, Result};
pub use params::{AvatarSize, Params};
pub use types::*;
pub use util::percent_encode;
