//! The Tumblr API client.
//!
//! Every method maps onto exactly one HTTP request: parameters go out as a
//! query string (GET) or a form body (POST), the JSON envelope comes back and
//! its `response` is decoded into the matching record. There is no session,
//! cache or retry, so one client can be cloned and shared freely.

use log::{debug, trace, warn};
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::oauth;
use crate::params::{AvatarSize, Params};
use crate::types::{
    ActionResponse, BlogFollowers, BlogInfo, BlogLikes, Envelope, ErrorEnvelope, Post,
    PostCollection, UserFollowing, UserInfo,
};
use crate::util::build_url;

pub const API_BASE: &str = "https://api.tumblr.com/v2";

const CLIENT_AGENT: &str = concat!("tumblr-rs/", env!("CARGO_PKG_VERSION"));

/// How a request proves who it comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    /// Public resources, e.g. avatars.
    None,
    /// `api_key=<consumer key>` in the query string.
    ApiKey,
    /// Signed `Authorization: OAuth ...` header.
    OAuth,
}

#[derive(Debug, Clone)]
pub struct TumblrClient {
    http: reqwest::Client,
    credentials: Credentials,
    base_url: String,
}

impl TumblrClient {
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        token: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Self {
        Self::with_credentials(Credentials::new(
            consumer_key,
            consumer_secret,
            token,
            token_secret,
        ))
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        TumblrClient {
            http: reqwest::Client::new(),
            credentials,
            base_url: API_BASE.to_string(),
        }
    }

    /// Points the client at another API root, e.g. a local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Reuses an existing `reqwest::Client` and its connection pool.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn blog_url(&self, blog: &str, path: &[&str]) -> String {
        let mut segments = vec!["blog", blog];
        segments.extend_from_slice(path);
        build_url(&self.base_url, &segments)
    }

    fn user_url(&self, path: &str) -> String {
        build_url(&self.base_url, &["user", path])
    }

    async fn send(&self, method: Method, url: &str, params: &Params, auth: Auth) -> Result<Response> {
        let mut params = params.clone();
        if auth == Auth::ApiKey {
            params.insert("api_key", &self.credentials.consumer_key);
        }

        let mut req = self
            .http
            .request(method.clone(), url)
            .header(USER_AGENT, CLIENT_AGENT);

        if method != Method::GET {
            req = req.form(&params);
        } else if !params.is_empty() {
            req = req.query(&params);
        }

        if auth == Auth::OAuth {
            let header = oauth::authorization_header(&self.credentials, method.as_str(), url, &params);
            req = req.header(AUTHORIZATION, header);
        }

        debug!("{} {} ({:?} auth)", method, url, auth);
        let res = req.send().await?;
        debug!("{} {} -> {}", method, url, res.status());

        Ok(res)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        url: &str,
        params: &Params,
        auth: Auth,
    ) -> Result<T> {
        let res = self.send(Method::GET, url, params, auth).await?;
        let status = res.status();
        let body = res.text().await?;

        decode_response(endpoint, status, &body)
    }

    async fn act(&self, endpoint: &str, url: &str, params: &Params) -> Result<ActionResponse> {
        let res = self.send(Method::POST, url, params, Auth::OAuth).await?;
        let status = res.status();
        let body = res.text().await?;

        decode_action(endpoint, status, &body)
    }

    // blog

    /// General information about a blog.
    pub async fn blog_info(&self, blog: &str) -> Result<BlogInfo> {
        let url = self.blog_url(blog, &["info"]);
        self.fetch("blog info", &url, &Params::new(), Auth::ApiKey).await
    }

    /// URL of a blog's avatar, without fetching it.
    pub fn blog_avatar_url(&self, blog: &str, size: Option<AvatarSize>) -> String {
        match size {
            Some(size) => {
                let pixels = size.pixels().to_string();
                self.blog_url(blog, &["avatar", pixels.as_str()])
            }
            None => self.blog_url(blog, &["avatar"]),
        }
    }

    /// The blog's avatar image at Tumblr's default size (64px).
    pub async fn blog_avatar(&self, blog: &str) -> Result<Vec<u8>> {
        self.avatar(self.blog_avatar_url(blog, None)).await
    }

    pub async fn blog_avatar_and_size(&self, blog: &str, size: AvatarSize) -> Result<Vec<u8>> {
        self.avatar(self.blog_avatar_url(blog, Some(size))).await
    }

    async fn avatar(&self, url: String) -> Result<Vec<u8>> {
        // Tumblr answers with a redirect to the image itself, which reqwest follows.
        let res = self.send(Method::GET, &url, &Params::new(), Auth::None).await?;
        let status = res.status();

        if !status.is_success() {
            let body = res.text().await?;
            return Err(api_error(status, &body));
        }

        let bytes = res.bytes().await?;
        debug!("Fetched {} byte avatar", bytes.len());
        Ok(bytes.to_vec())
    }

    /// Posts liked by a blog that shares its likes. Takes `limit`, `offset`,
    /// `before` and `after`.
    pub async fn blog_likes(&self, blog: &str, params: &Params) -> Result<BlogLikes> {
        let url = self.blog_url(blog, &["likes"]);
        self.fetch("blog likes", &url, params, Auth::ApiKey).await
    }

    /// Followers of a blog. Only the owner gets the full list.
    pub async fn blog_followers(&self, blog: &str, params: &Params) -> Result<BlogFollowers> {
        let url = self.blog_url(blog, &["followers"]);
        self.fetch("blog followers", &url, params, Auth::OAuth).await
    }

    /// Published posts of a blog. Takes `type`, `id`, `tag`, `limit`,
    /// `offset`, `reblog_info`, `notes_info` and `filter`.
    pub async fn blog_posts(&self, blog: &str, params: &Params) -> Result<PostCollection> {
        let url = self.blog_url(blog, &["posts"]);
        self.fetch("blog posts", &url, params, Auth::ApiKey).await
    }

    /// Posts waiting in a blog's queue. Owner only.
    pub async fn blog_queued_posts(&self, blog: &str, params: &Params) -> Result<PostCollection> {
        let url = self.blog_url(blog, &["posts", "queue"]);
        self.fetch("queued posts", &url, params, Auth::OAuth).await
    }

    pub async fn blog_drafts(&self, blog: &str, params: &Params) -> Result<PostCollection> {
        let url = self.blog_url(blog, &["posts", "draft"]);
        self.fetch("draft posts", &url, params, Auth::OAuth).await
    }

    pub async fn blog_submissions(&self, blog: &str, params: &Params) -> Result<PostCollection> {
        let url = self.blog_url(blog, &["posts", "submission"]);
        self.fetch("submissions", &url, params, Auth::OAuth).await
    }

    // posting

    /// Creates a post. Which params apply depends on `type`: `title`/`body`
    /// for text, `source`/`caption` for photos, `quote`, `url` and so on.
    pub async fn post(&self, blog: &str, params: &Params) -> Result<ActionResponse> {
        let url = self.blog_url(blog, &["post"]);
        self.act("post", &url, params).await
    }

    pub async fn post_edit(&self, blog: &str, id: u64, params: &Params) -> Result<ActionResponse> {
        let url = self.blog_url(blog, &["post", "edit"]);
        let params = params.merged(&Params::new().set("id", id));
        self.act("post edit", &url, &params).await
    }

    /// Reblogs post `id` onto `blog`. `reblog_key` comes from the source post.
    pub async fn post_reblog(
        &self,
        blog: &str,
        id: u64,
        reblog_key: &str,
        params: &Params,
    ) -> Result<ActionResponse> {
        let url = self.blog_url(blog, &["post", "reblog"]);
        let params = params.merged(&Params::new().set("id", id).set("reblog_key", reblog_key));
        self.act("post reblog", &url, &params).await
    }

    pub async fn post_delete(&self, blog: &str, id: u64) -> Result<ActionResponse> {
        let url = self.blog_url(blog, &["post", "delete"]);
        self.act("post delete", &url, &Params::new().set("id", id)).await
    }

    // user

    /// The authenticated user and the blogs they own.
    pub async fn user_info(&self) -> Result<UserInfo> {
        let url = self.user_url("info");
        self.fetch("user info", &url, &Params::new(), Auth::OAuth).await
    }

    pub async fn user_dashboard(&self, params: &Params) -> Result<PostCollection> {
        let url = self.user_url("dashboard");
        self.fetch("dashboard", &url, params, Auth::OAuth).await
    }

    /// Posts the authenticated user liked, across all blogs.
    pub async fn user_likes(&self, params: &Params) -> Result<BlogLikes> {
        let url = self.user_url("likes");
        self.fetch("user likes", &url, params, Auth::OAuth).await
    }

    pub async fn user_following(&self, params: &Params) -> Result<UserFollowing> {
        let url = self.user_url("following");
        self.fetch("following", &url, params, Auth::OAuth).await
    }

    pub async fn user_follow(&self, blog: &str) -> Result<ActionResponse> {
        let url = self.user_url("follow");
        self.act("follow", &url, &Params::new().set("url", blog)).await
    }

    pub async fn user_unfollow(&self, blog: &str) -> Result<ActionResponse> {
        let url = self.user_url("unfollow");
        self.act("unfollow", &url, &Params::new().set("url", blog)).await
    }

    pub async fn user_like(&self, id: u64, reblog_key: &str) -> Result<ActionResponse> {
        let url = self.user_url("like");
        let params = Params::new().set("id", id).set("reblog_key", reblog_key);
        self.act("like", &url, &params).await
    }

    pub async fn user_unlike(&self, id: u64, reblog_key: &str) -> Result<ActionResponse> {
        let url = self.user_url("unlike");
        let params = Params::new().set("id", id).set("reblog_key", reblog_key);
        self.act("unlike", &url, &params).await
    }

    // tagged

    /// Public posts carrying `tag`, newest first. Takes `before`, `limit` and
    /// `filter`.
    pub async fn tagged_posts(&self, tag: &str, params: &Params) -> Result<Vec<Post>> {
        let url = build_url(&self.base_url, &["tagged"]);
        let params = params.merged(&Params::new().tag(tag));
        self.fetch("tagged posts", &url, &params, Auth::ApiKey).await
    }
}

/// Error for a non-2xx reply, keeping Tumblr's own message and error list
/// when the body has them.
fn api_error(status: StatusCode, body: &str) -> Error {
    let err = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => Error::Api {
            status: status.as_u16(),
            msg: envelope.meta.msg,
            errors: envelope.errors,
        },
        Err(_) => Error::Api {
            status: status.as_u16(),
            msg: status.canonical_reason().unwrap_or_default().to_string(),
            errors: Vec::new(),
        },
    };

    warn!("{}", err);
    err
}

fn decode_envelope<T: DeserializeOwned>(
    endpoint: &str,
    status: StatusCode,
    body: &str,
) -> Result<Envelope<T>> {
    if !status.is_success() {
        return Err(api_error(status, body));
    }

    trace!("{} body: {}", endpoint, body);
    serde_json::from_str(body).map_err(|source| Error::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

fn decode_response<T: DeserializeOwned>(endpoint: &str, status: StatusCode, body: &str) -> Result<T> {
    decode_envelope(endpoint, status, body).map(|envelope| envelope.response)
}

fn decode_action(endpoint: &str, status: StatusCode, body: &str) -> Result<ActionResponse> {
    let envelope: Envelope<Value> = decode_envelope(endpoint, status, body)?;
    Ok(ActionResponse::from_reply(envelope.meta, &envelope.response))
}
