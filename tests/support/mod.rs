//! In-process stand-in for `api.tumblr.com`.
//!
//! Serves the v2 endpoints the client binds from an in-memory store, checks
//! `api_key` on public endpoints and recomputes the OAuth1 signature on
//! private ones, so a request that reaches a handler was signed correctly.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use percent_encoding::percent_decode_str;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tumblr::oauth::{sign, signature_base_string};
use tumblr::TumblrClient;

pub const CONSUMER_KEY: &str = "mock-consumer-key";
pub const CONSUMER_SECRET: &str = "mock-consumer-secret";
pub const TOKEN: &str = "mock-token";
pub const TOKEN_SECRET: &str = "mock-token-secret";

/// Reblog key of every seeded post: `key<id>`.
pub fn reblog_key(id: u64) -> String {
    format!("key{}", id)
}

pub const AVATAR_SIZES: [u16; 9] = [16, 24, 30, 40, 48, 64, 96, 128, 512];

type Params = HashMap<String, String>;
type Reply = Result<Response, Response>;

pub struct Store {
    posts: RwLock<Vec<Value>>,
    next_id: AtomicU64,
    following: RwLock<BTreeSet<String>>,
    likes: RwLock<BTreeSet<u64>>,
}

type Db = Arc<Store>;

fn seed_post(id: u64, blog: &str, kind: &str, state: &str, tags: &[&str]) -> Value {
    json!({
        "id": id,
        "id_string": id.to_string(),
        "blog_name": blog,
        "type": kind,
        "state": state,
        "post_url": format!("https://{}.tumblr.com/post/{}", blog, id),
        "timestamp": 1_600_000_000u64 + id,
        "date": "2020-09-13 12:26:40 GMT",
        "format": "html",
        "reblog_key": reblog_key(id),
        "tags": tags,
        "note_count": 0,
        "title": format!("Post {}", id),
        "body": format!("<p>body of {}</p>", id),
    })
}

impl Store {
    fn seeded() -> Self {
        let posts = vec![
            seed_post(1001, "staff", "text", "published", &["gif", "news"]),
            seed_post(1002, "staff", "photo", "published", &["gif"]),
            seed_post(1003, "staff", "text", "published", &["news"]),
            seed_post(1004, "staff", "text", "queue", &[]),
            seed_post(1005, "staff", "text", "draft", &[]),
            seed_post(1006, "staff", "text", "submission", &[]),
            seed_post(2001, "testnames", "text", "published", &["gif"]),
        ];

        Store {
            posts: RwLock::new(posts),
            next_id: AtomicU64::new(5000),
            following: RwLock::new(BTreeSet::new()),
            likes: RwLock::new([1001u64, 1002].into_iter().collect()),
        }
    }
}

fn short_name(blog: &str) -> String {
    blog.trim_end_matches(".tumblr.com").to_string()
}

fn envelope(status: StatusCode, response: Value) -> Response {
    let body = json!({
        "meta": {"status": status.as_u16(), "msg": status.canonical_reason().unwrap_or("")},
        "response": response,
    });
    (status, Json(body)).into_response()
}

fn failure(status: StatusCode, detail: &str) -> Response {
    let reason = status.canonical_reason().unwrap_or("");
    let body = json!({
        "meta": {"status": status.as_u16(), "msg": reason},
        "response": [],
        "errors": [{"title": reason, "code": 0, "detail": detail}],
    });
    (status, Json(body)).into_response()
}

fn check_api_key(query: &Params) -> Result<(), Response> {
    match query.get("api_key") {
        Some(key) if key == CONSUMER_KEY => Ok(()),
        _ => Err(failure(StatusCode::UNAUTHORIZED, "missing or wrong api_key")),
    }
}

fn parse_oauth_header(raw: &str) -> Option<HashMap<String, String>> {
    let fields = raw.strip_prefix("OAuth ")?;
    let mut out = HashMap::new();

    for field in fields.split(", ") {
        let (key, value) = field.split_once('=')?;
        let value = value.trim_matches('"');
        let decoded = percent_decode_str(value).decode_utf8().ok()?;
        out.insert(key.to_string(), decoded.into_owned());
    }

    Some(out)
}

/// Recomputes the signature the way Tumblr does and rejects the request when
/// it does not match.
fn check_oauth(method: &str, headers: &HeaderMap, uri: &Uri, params: &Params) -> Result<(), Response> {
    let unauthorized = |detail: &str| failure(StatusCode::UNAUTHORIZED, detail);

    let raw = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| unauthorized("missing Authorization header"))?;
    let mut oauth = parse_oauth_header(raw).ok_or_else(|| unauthorized("malformed OAuth header"))?;

    if oauth.get("oauth_consumer_key").map(String::as_str) != Some(CONSUMER_KEY)
        || oauth.get("oauth_token").map(String::as_str) != Some(TOKEN)
        || oauth.get("oauth_signature_method").map(String::as_str) != Some("HMAC-SHA1")
    {
        return Err(unauthorized("wrong consumer key, token or signature method"));
    }

    let signature = oauth
        .remove("oauth_signature")
        .ok_or_else(|| unauthorized("missing signature"))?;

    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| unauthorized("missing Host header"))?;
    let url = format!("http://{}{}", host, uri.path());

    let base = signature_base_string(
        method,
        &url,
        oauth
            .iter()
            .chain(params.iter())
            .map(|(k, v)| (k.as_str(), v.as_str())),
    );

    if sign(&base, CONSUMER_SECRET, TOKEN_SECRET) != signature {
        return Err(unauthorized("signature mismatch"));
    }

    Ok(())
}

fn take<'a>(posts: impl Iterator<Item = &'a Value>, params: &Params) -> Vec<Value> {
    let offset = params.get("offset").and_then(|o| o.parse().ok()).unwrap_or(0);
    let limit = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(20);
    posts.skip(offset).take(limit).cloned().collect()
}

fn has_tag(post: &Value, tag: &str) -> bool {
    post["tags"]
        .as_array()
        .map(|tags| tags.iter().any(|t| t == tag))
        .unwrap_or(false)
}

fn blog_json(name: &str) -> Value {
    json!({
        "name": name,
        "title": format!("{} title", name),
        "url": format!("https://{}.tumblr.com/", name),
        "posts": 3,
        "updated": 1_600_000_000u64,
        "description": "",
        "ask": false,
        "is_nsfw": false,
    })
}

// blog

async fn blog_info(Path(blog): Path<String>, Query(query): Query<Params>) -> Reply {
    check_api_key(&query)?;

    let name = short_name(&blog);
    match name.as_str() {
        "missing" => Err(failure(StatusCode::NOT_FOUND, "blog not found")),
        // required `name` left out on purpose
        "garbled" => Ok(envelope(StatusCode::OK, json!({"blog": {"title": "no name"}}))),
        _ => Ok(envelope(StatusCode::OK, json!({"blog": blog_json(&name)}))),
    }
}

async fn avatar_default(Path(blog): Path<String>) -> Redirect {
    Redirect::temporary(&format!("/avatars/{}/64.png", short_name(&blog)))
}

async fn avatar_sized(Path((blog, size)): Path<(String, u16)>) -> Reply {
    if !AVATAR_SIZES.contains(&size) {
        return Err(failure(StatusCode::BAD_REQUEST, "unsupported avatar size"));
    }

    Ok(Redirect::temporary(&format!("/avatars/{}/{}.png", short_name(&blog), size)).into_response())
}

async fn avatar_image(Path((_blog, file)): Path<(String, String)>) -> Response {
    let mut image = b"\x89PNG\r\n\x1a\n".to_vec();
    image.extend_from_slice(file.as_bytes());
    ([(header::CONTENT_TYPE, "image/png")], image).into_response()
}

async fn blog_likes(Path(blog): Path<String>, Query(query): Query<Params>) -> Reply {
    check_api_key(&query)?;

    if short_name(&blog) != "staff" {
        return Ok(envelope(StatusCode::OK, json!({"liked_posts": [], "liked_count": 0})));
    }

    let posts = vec![
        seed_post(9001, "someone", "text", "published", &[]),
        seed_post(9002, "someone", "photo", "published", &[]),
        seed_post(9003, "other", "text", "published", &[]),
    ];

    // two pages, cursor is the timestamp of the last post on the first page
    let response = match query.get("before") {
        None => json!({
            "liked_posts": posts[..2].to_vec(),
            "liked_count": 3,
            "_links": {"next": {
                "href": "/v2/blog/staff/likes?before=1600009002",
                "method": "GET",
                "query_params": {"before": "1600009002"}
            }},
        }),
        Some(_) => json!({"liked_posts": posts[2..].to_vec(), "liked_count": 3}),
    };

    Ok(envelope(StatusCode::OK, response))
}

async fn blog_followers(
    Path(blog): Path<String>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<Params>,
) -> Reply {
    check_oauth("GET", &headers, &uri, &query)?;

    let response = if short_name(&blog) == "staff" {
        json!({"total_users": 2, "users": [
            {"name": "alice", "following": true, "url": "https://alice.tumblr.com", "updated": 1_600_000_000u64},
            {"name": "bob", "following": false, "url": "https://bob.tumblr.com", "updated": 1_600_000_001u64},
        ]})
    } else {
        json!({"total_users": 0, "users": []})
    };

    Ok(envelope(StatusCode::OK, response))
}

async fn blog_posts(
    State(db): State<Db>,
    Path(blog): Path<String>,
    Query(query): Query<Params>,
) -> Reply {
    check_api_key(&query)?;

    let name = short_name(&blog);
    let posts = db.posts.read().await;
    let matching: Vec<&Value> = posts
        .iter()
        .filter(|p| p["blog_name"] == name.as_str())
        .filter(|p| !matches!(p["state"].as_str(), Some("queue" | "draft" | "submission")))
        .filter(|p| query.get("type").map_or(true, |t| p["type"] == t.as_str()))
        .filter(|p| query.get("tag").map_or(true, |t| has_tag(p, t)))
        .filter(|p| query.get("id").map_or(true, |id| p["id"].to_string() == *id))
        .collect();

    let total = matching.len();
    Ok(envelope(
        StatusCode::OK,
        json!({"blog": blog_json(&name), "posts": take(matching.into_iter(), &query), "total_posts": total}),
    ))
}

async fn blog_posts_by_state(
    State(db): State<Db>,
    Path((blog, kind)): Path<(String, String)>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<Params>,
) -> Reply {
    check_oauth("GET", &headers, &uri, &query)?;

    if !["queue", "draft", "submission"].contains(&kind.as_str()) {
        return Err(failure(StatusCode::NOT_FOUND, "unknown post listing"));
    }

    let name = short_name(&blog);
    let posts = db.posts.read().await;
    let matching = posts
        .iter()
        .filter(|p| p["blog_name"] == name.as_str() && p["state"] == kind.as_str());

    Ok(envelope(StatusCode::OK, json!({"posts": take(matching, &query)})))
}

// posting

async fn create_post(
    State(db): State<Db>,
    Path(blog): Path<String>,
    headers: HeaderMap,
    uri: Uri,
    Form(form): Form<Params>,
) -> Reply {
    check_oauth("POST", &headers, &uri, &form)?;

    let kind = form
        .get("type")
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "type is required"))?;
    let id = db.next_id.fetch_add(1, Ordering::SeqCst);

    let mut created = seed_post(id, &short_name(&blog), kind, "published", &[]);
    for field in ["state", "title", "body"] {
        if let Some(value) = form.get(field) {
            created[field] = json!(value);
        }
    }
    if let Some(tags) = form.get("tags") {
        created["tags"] = json!(tags.split(',').collect::<Vec<_>>());
    }

    db.posts.write().await.push(created);
    Ok(envelope(StatusCode::CREATED, json!({"id": id})))
}

async fn post_action(
    State(db): State<Db>,
    Path((blog, action)): Path<(String, String)>,
    headers: HeaderMap,
    uri: Uri,
    Form(form): Form<Params>,
) -> Reply {
    check_oauth("POST", &headers, &uri, &form)?;

    let name = short_name(&blog);
    let id: u64 = form
        .get("id")
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "id is required"))?;

    let mut posts = db.posts.write().await;
    let position = posts.iter().position(|p| p["id"] == id);

    match action.as_str() {
        "edit" => {
            let post = position
                .filter(|&i| posts[i]["blog_name"] == name.as_str())
                .map(|i| &mut posts[i])
                .ok_or_else(|| failure(StatusCode::NOT_FOUND, "post not found"))?;

            for field in ["state", "title", "body"] {
                if let Some(value) = form.get(field) {
                    post[field] = json!(value);
                }
            }
            Ok(envelope(StatusCode::OK, json!({"id": id})))
        }
        "reblog" => {
            let source = position
                .map(|i| posts[i].clone())
                .ok_or_else(|| failure(StatusCode::NOT_FOUND, "post not found"))?;
            if form.get("reblog_key").map(String::as_str) != source["reblog_key"].as_str() {
                return Err(failure(StatusCode::BAD_REQUEST, "wrong reblog key"));
            }

            let new_id = db.next_id.fetch_add(1, Ordering::SeqCst);
            let kind = source["type"].as_str().unwrap_or("text");
            let mut reblog = seed_post(new_id, &name, kind, "published", &[]);
            if let Some(comment) = form.get("comment") {
                reblog["body"] = json!(comment);
            }
            posts.push(reblog);
            Ok(envelope(StatusCode::CREATED, json!({"id": new_id})))
        }
        "delete" => {
            let index = position
                .filter(|&i| posts[i]["blog_name"] == name.as_str())
                .ok_or_else(|| failure(StatusCode::NOT_FOUND, "post not found"))?;
            posts.remove(index);
            Ok(envelope(StatusCode::OK, json!({"id": id})))
        }
        _ => Err(failure(StatusCode::NOT_FOUND, "unknown action")),
    }
}

// user

async fn user_info(State(db): State<Db>, headers: HeaderMap, uri: Uri) -> Reply {
    check_oauth("GET", &headers, &uri, &Params::new())?;

    let likes = db.likes.read().await.len();
    let following = db.following.read().await.len();
    let mut blog = blog_json("tester");
    blog["primary"] = json!(true);
    blog["followers"] = json!(3);

    Ok(envelope(
        StatusCode::OK,
        json!({"user": {
            "name": "tester",
            "likes": likes,
            "following": following,
            "default_post_format": "html",
            "blogs": [blog],
        }}),
    ))
}

async fn user_dashboard(
    State(db): State<Db>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<Params>,
) -> Reply {
    check_oauth("GET", &headers, &uri, &query)?;

    let posts = db.posts.read().await;
    let published = posts.iter().filter(|p| p["state"] == "published");
    Ok(envelope(StatusCode::OK, json!({"posts": take(published, &query)})))
}

async fn user_likes(
    State(db): State<Db>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<Params>,
) -> Reply {
    check_oauth("GET", &headers, &uri, &query)?;

    let likes = db.likes.read().await;
    let posts = db.posts.read().await;
    let liked = posts
        .iter()
        .filter(|p| p["id"].as_u64().map_or(false, |id| likes.contains(&id)));

    Ok(envelope(
        StatusCode::OK,
        json!({"liked_posts": take(liked, &query), "liked_count": likes.len()}),
    ))
}

async fn user_following(
    State(db): State<Db>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<Params>,
) -> Reply {
    check_oauth("GET", &headers, &uri, &query)?;

    let following = db.following.read().await;
    let blogs: Vec<Value> = following.iter().map(|name| blog_json(name)).collect();
    Ok(envelope(
        StatusCode::OK,
        json!({"total_blogs": following.len(), "blogs": blogs}),
    ))
}

async fn user_action(
    State(db): State<Db>,
    Path(action): Path<String>,
    headers: HeaderMap,
    uri: Uri,
    Form(form): Form<Params>,
) -> Reply {
    check_oauth("POST", &headers, &uri, &form)?;

    match action.as_str() {
        "follow" | "unfollow" => {
            let blog = form
                .get("url")
                .map(|u| short_name(u))
                .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "url is required"))?;
            let mut following = db.following.write().await;

            if action == "follow" {
                following.insert(blog.clone());
                Ok(envelope(StatusCode::OK, json!({"blog": blog_json(&blog)})))
            } else if following.remove(&blog) {
                Ok(envelope(StatusCode::OK, json!([])))
            } else {
                Err(failure(StatusCode::NOT_FOUND, "not following this blog"))
            }
        }
        "like" | "unlike" => {
            let id: u64 = form
                .get("id")
                .and_then(|id| id.parse().ok())
                .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "id is required"))?;
            let key_matches = db
                .posts
                .read()
                .await
                .iter()
                .any(|p| p["id"] == id && form.get("reblog_key").map(String::as_str) == p["reblog_key"].as_str());
            if !key_matches {
                return Err(failure(StatusCode::NOT_FOUND, "post not found"));
            }

            let mut likes = db.likes.write().await;
            if action == "like" {
                likes.insert(id);
            } else {
                likes.remove(&id);
            }
            Ok(envelope(StatusCode::OK, json!([])))
        }
        _ => Err(failure(StatusCode::NOT_FOUND, "unknown action")),
    }
}

async fn tagged(State(db): State<Db>, Query(query): Query<Params>) -> Reply {
    check_api_key(&query)?;

    let tag = query
        .get("tag")
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "tag is required"))?;
    let posts = db.posts.read().await;
    let matching = posts
        .iter()
        .filter(|p| p["state"] == "published" && has_tag(p, tag));

    Ok(envelope(StatusCode::OK, json!(take(matching, &query))))
}

pub fn app() -> Router {
    let db: Db = Arc::new(Store::seeded());

    Router::new()
        .route("/v2/blog/{blog}/info", get(blog_info))
        .route("/v2/blog/{blog}/avatar", get(avatar_default))
        .route("/v2/blog/{blog}/avatar/{size}", get(avatar_sized))
        .route("/avatars/{blog}/{file}", get(avatar_image))
        .route("/v2/blog/{blog}/likes", get(blog_likes))
        .route("/v2/blog/{blog}/followers", get(blog_followers))
        .route("/v2/blog/{blog}/posts", get(blog_posts))
        .route("/v2/blog/{blog}/posts/{kind}", get(blog_posts_by_state))
        .route("/v2/blog/{blog}/post", post(create_post))
        .route("/v2/blog/{blog}/post/{action}", post(post_action))
        .route("/v2/user/info", get(user_info))
        .route("/v2/user/dashboard", get(user_dashboard))
        .route("/v2/user/likes", get(user_likes))
        .route("/v2/user/following", get(user_following))
        .route("/v2/user/{action}", post(user_action))
        .route("/v2/tagged", get(tagged))
        .with_state(db)
}

/// Starts a fresh mock on a random port and returns a client pointed at it.
pub async fn start() -> TumblrClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move { axum::serve(listener, app()).await });

    TumblrClient::new(CONSUMER_KEY, CONSUMER_SECRET, TOKEN, TOKEN_SECRET)
        .with_base_url(format!("http://{}/v2", addr))
}

/// A client whose secrets do not match the mock's.
pub async fn start_with_wrong_secret() -> TumblrClient {
    let client = start().await;
    let base = client.base_url().to_string();

    TumblrClient::new(CONSUMER_KEY, "not-the-secret", TOKEN, TOKEN_SECRET).with_base_url(base)
}
