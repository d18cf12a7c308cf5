//! Response records for the Tumblr v2 API.
//!
//! Every record mirrors one JSON shape under the `response` key of the API
//! envelope. Identifying fields are required, everything descriptive falls
//! back to its default when Tumblr leaves it out.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;

use crate::params::Params;

/// Post and trail ids arrive as numbers on most endpoints and as strings on
/// others (`id_string`, reblog trails).
fn deserialize_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match <RawId as serde::Deserialize>::deserialize(deserializer)? {
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => s.parse().map_err(de::Error::custom),
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Meta {
    pub status: u16,
    #[serde(default)]
    pub msg: String,
}

/// The `{meta, response}` wrapper around every JSON reply.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub meta: Meta,
    pub response: T,
}

/// Body of a non-2xx reply. `response` is usually an empty array there, so it
/// is not decoded.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub meta: Meta,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub detail: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Blog {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub updated: u64,
    #[serde(default)]
    pub posts: u64,
    /// Only present when the authenticated user owns the blog.
    #[serde(default)]
    pub followers: Option<u64>,
    /// Only present when the blog shares its likes.
    #[serde(default)]
    pub likes: Option<u64>,
    #[serde(default)]
    pub ask: bool,
    #[serde(default)]
    pub is_nsfw: bool,
    #[serde(default)]
    pub primary: Option<bool>,
    #[serde(default)]
    pub admin: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BlogInfo {
    pub blog: Blog,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LinkTarget {
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub query_params: BTreeMap<String, Value>,
}

/// Pagination block returned under `_links`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Links {
    #[serde(default)]
    pub next: Option<LinkTarget>,
    #[serde(default)]
    pub prev: Option<LinkTarget>,
}

impl Links {
    /// Parameters that fetch the page after this one, if there is one.
    pub fn next_params(&self) -> Option<Params> {
        let next = self.next.as_ref()?;

        Some(
            next.query_params
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => (k.clone(), s.clone()),
                    other => (k.clone(), other.to_string()),
                })
                .collect(),
        )
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BlogLikes {
    #[serde(default)]
    pub liked_posts: Vec<Post>,
    pub liked_count: u64,
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Follower {
    pub name: String,
    #[serde(default)]
    pub following: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub updated: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BlogFollowers {
    pub total_users: u64,
    #[serde(default)]
    pub users: Vec<Follower>,
}

/// Posts from a blog, its queue/drafts/submissions or the dashboard. The
/// dashboard carries no `blog`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PostCollection {
    #[serde(default)]
    pub blog: Option<Blog>,
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub total_posts: Option<u64>,
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Text,
    Photo,
    Quote,
    Link,
    Chat,
    Audio,
    Video,
    Answer,
    Blocks,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for PostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PostKind::Text => "text",
            PostKind::Photo => "photo",
            PostKind::Quote => "quote",
            PostKind::Link => "link",
            PostKind::Chat => "chat",
            PostKind::Audio => "audio",
            PostKind::Video => "video",
            PostKind::Answer => "answer",
            PostKind::Blocks => "blocks",
            PostKind::Unknown => "unknown",
        };

        f.write_str(name)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PhotoSize {
    pub url: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Photo {
    #[serde(default)]
    pub caption: String,
    pub original_size: PhotoSize,
    #[serde(default)]
    pub alt_sizes: Vec<PhotoSize>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TrailBlog {
    pub name: String,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TrailPost {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: u64,
}

/// One entry of a reblog trail, oldest first.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TrailItem {
    pub blog: TrailBlog,
    pub post: TrailPost,
    #[serde(default)]
    pub content_raw: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Post {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: u64,
    pub blog_name: String,
    #[serde(rename = "type")]
    pub kind: PostKind,
    #[serde(default)]
    pub post_url: String,
    #[serde(default)]
    pub short_url: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub reblog_key: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub note_count: u64,
    #[serde(default)]
    pub summary: String,

    // text
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,

    // photo, video, audio
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub photos: Option<Vec<Photo>>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,

    // quote
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub source: Option<String>,

    // link
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,

    // answer
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,

    #[serde(default)]
    pub trail: Option<Vec<TrailItem>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub following: u64,
    #[serde(default)]
    pub default_post_format: String,
    #[serde(default)]
    pub blogs: Vec<Blog>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UserInfo {
    pub user: User,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UserFollowing {
    pub total_blogs: u64,
    #[serde(default)]
    pub blogs: Vec<Blog>,
}

/// Outcome of a mutating call (post, edit, reblog, delete, follow, like...).
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub status: u16,
    pub msg: String,
    /// Id of the created, edited or deleted post when Tumblr reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

impl ActionResponse {
    pub(crate) fn from_reply(meta: Meta, response: &Value) -> Self {
        let id = response.get("id").and_then(|id| match id {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        });

        ActionResponse {
            status: meta.status,
            msg: meta.msg,
            id,
        }
    }
}
