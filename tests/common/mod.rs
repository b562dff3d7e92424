//! In-process mock of the social backend
//!
//! Serves the REST contract the client depends on from memory, records
//! every request's `Authorization` header, and can delay chosen paths to
//! force out-of-order responses.

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Duration as Minutes, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use social::api::ClientConfig;
use social::config::Config;
use social::App;

/// What `POST /users` answers with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupMode {
    /// `{user, jwt}`
    Authenticated,
    /// The created user only
    Registered,
}

#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredUser {
    id: String,
    name: String,
    email: String,
    password: String,
}

#[derive(Debug, Clone)]
struct StoredPost {
    id: String,
    author: String,
    content: String,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredComment {
    id: String,
    author: String,
    post: String,
    content: String,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
}

#[derive(Debug)]
struct Db {
    users: Vec<StoredUser>,
    posts: Vec<StoredPost>,
    comments: Vec<StoredComment>,
    follows: HashSet<(String, String)>,
    tokens: HashMap<String, String>,
    next_id: u64,
    clock: DateTime<Utc>,
}

impl Db {
    fn new() -> Self {
        Self {
            users: Vec::new(),
            posts: Vec::new(),
            comments: Vec::new(),
            follows: HashSet::new(),
            tokens: HashMap::new(),
            next_id: 1,
            clock: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn id(&mut self, prefix: &str) -> String {
        let id = format!("{prefix}{}", self.next_id);
        self.next_id += 1;
        id
    }

    // One minute per write keeps creation and modification times apart at
    // the wire format's one-second resolution.
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock = self.clock + Minutes::minutes(1);
        self.clock
    }

    fn user(&self, id: &str) -> Option<&StoredUser> {
        self.users.iter().find(|u| u.id == id)
    }

    fn user_json(&self, id: &str) -> Value {
        match self.user(id) {
            Some(u) => json!({"_id": u.id, "name": u.name, "email": u.email}),
            None => json!({"_id": id, "name": "(deleted)", "email": "deleted@example.com"}),
        }
    }

    fn post_json(&self, p: &StoredPost) -> Value {
        json!({
            "id": p.id,
            "author": self.user_json(&p.author),
            "content": p.content,
            "creation_time": instant(p.created),
            "modification_time": instant(p.modified),
        })
    }

    fn comment_json(&self, c: &StoredComment) -> Value {
        json!({
            "_id": c.id,
            "author": self.user_json(&c.author),
            "post": c.post,
            "content": c.content,
            "creation_time": instant(c.created),
            "modification_time": instant(c.modified),
        })
    }

    fn issue_token(&mut self, user_id: &str) -> String {
        let token = format!("jwt-{}", uuid::Uuid::new_v4());
        self.tokens.insert(token.clone(), user_id.to_string());
        token
    }
}

fn instant(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub struct MockState {
    db: Mutex<Db>,
    seen: Mutex<Vec<Seen>>,
    delays: Mutex<HashMap<String, Duration>>,
    signup_mode: Mutex<SignupMode>,
}

type Shared = Arc<MockState>;
type Reply = Result<Response, Response>;

fn reject(status: StatusCode, kind: &str, message: &str) -> Response {
    (status, Json(json!({"type": kind, "message": message}))).into_response()
}

fn not_found(what: &str) -> Response {
    reject(StatusCode::NOT_FOUND, "not_found", &format!("{what} not found"))
}

fn forbidden() -> Response {
    reject(StatusCode::FORBIDDEN, "forbidden", "not the owner")
}

fn no_content() -> Reply {
    Ok(StatusCode::NO_CONTENT.into_response())
}

fn caller(state: &MockState, headers: &HeaderMap) -> Result<String, Response> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "unauthorized", "missing token"))?;
    state
        .db
        .lock()
        .unwrap()
        .tokens
        .get(token)
        .cloned()
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "unauthorized", "invalid token"))
}

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    state.seen.lock().unwrap().push(Seen {
        method: request.method().to_string(),
        path: path.clone(),
        authorization: request
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    let target = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| path.clone());
    let delay = {
        let delays = state.delays.lock().unwrap();
        delays.get(&target).or_else(|| delays.get(&path)).copied()
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    next.run(request).await
}

// ============================================
// Users and auth
// ============================================

#[derive(Deserialize)]
struct SignupBody {
    name: String,
    email: String,
    password: Option<String>,
}

async fn signup(State(state): State<Shared>, Json(body): Json<SignupBody>) -> Reply {
    let mode = *state.signup_mode.lock().unwrap();
    let mut db = state.db.lock().unwrap();
    if db.users.iter().any(|u| u.email == body.email) {
        return Err(reject(StatusCode::CONFLICT, "conflict", "email already registered"));
    }
    let id = db.id("u");
    db.users.push(StoredUser {
        id: id.clone(),
        name: body.name,
        email: body.email,
        password: body.password.unwrap_or_default(),
    });

    let user = db.user_json(&id);
    let body = match mode {
        SignupMode::Authenticated => json!({"user": user, "jwt": db.issue_token(&id)}),
        SignupMode::Registered => user,
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(state): State<Shared>, Json(body): Json<LoginBody>) -> Reply {
    let mut db = state.db.lock().unwrap();
    let id = db
        .users
        .iter()
        .find(|u| u.email == body.email && u.password == body.password)
        .map(|u| u.id.clone())
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "unauthorized", "bad credentials"))?;
    let jwt = db.issue_token(&id);
    Ok(Json(json!({"user": db.user_json(&id), "jwt": jwt})).into_response())
}

#[derive(Deserialize)]
struct UserFilter {
    following_id: Option<String>,
}

async fn list_users(State(state): State<Shared>, Query(filter): Query<UserFilter>) -> Reply {
    let db = state.db.lock().unwrap();
    let users: Vec<Value> = db
        .users
        .iter()
        .filter(|u| match &filter.following_id {
            Some(followee) => db.follows.contains(&(u.id.clone(), followee.clone())),
            None => true,
        })
        .map(|u| db.user_json(&u.id))
        .collect();
    Ok(Json(users).into_response())
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let id = caller(&state, &headers)?;
    Ok(Json(state.db.lock().unwrap().user_json(&id)).into_response())
}

async fn get_user(State(state): State<Shared>, Path(id): Path<String>) -> Reply {
    let db = state.db.lock().unwrap();
    db.user(&id).ok_or_else(|| not_found("user"))?;
    Ok(Json(db.user_json(&id)).into_response())
}

#[derive(Deserialize)]
struct UserPatchBody {
    name: Option<String>,
    email: Option<String>,
}

async fn patch_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UserPatchBody>,
) -> Reply {
    let caller = caller(&state, &headers)?;
    if caller != id {
        return Err(forbidden());
    }
    let mut db = state.db.lock().unwrap();
    let user = db
        .users
        .iter_mut()
        .find(|u| u.id == id)
        .ok_or_else(|| not_found("user"))?;
    if let Some(name) = body.name {
        user.name = name;
    }
    if let Some(email) = body.email {
        user.email = email;
    }
    no_content()
}

async fn delete_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let caller = caller(&state, &headers)?;
    if caller != id {
        return Err(forbidden());
    }
    let mut db = state.db.lock().unwrap();
    db.users.retain(|u| u.id != id);
    db.follows.retain(|(a, b)| *a != id && *b != id);
    db.tokens.retain(|_, user| *user != id);
    no_content()
}

async fn change_password(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(password): Json<String>,
) -> Reply {
    let caller = caller(&state, &headers)?;
    if caller != id {
        return Err(forbidden());
    }
    let mut db = state.db.lock().unwrap();
    if let Some(user) = db.users.iter_mut().find(|u| u.id == id) {
        user.password = password;
    }
    no_content()
}

// ============================================
// Followings
// ============================================

async fn followings(State(state): State<Shared>, Path(id): Path<String>) -> Reply {
    let db = state.db.lock().unwrap();
    db.user(&id).ok_or_else(|| not_found("user"))?;
    let users: Vec<Value> = db
        .follows
        .iter()
        .filter(|(follower, _)| *follower == id)
        .map(|(_, followee)| db.user_json(followee))
        .collect();
    Ok(Json(json!({ "users": users })).into_response())
}

async fn followers(State(state): State<Shared>, Path(id): Path<String>) -> Reply {
    let db = state.db.lock().unwrap();
    db.user(&id).ok_or_else(|| not_found("user"))?;
    let users: Vec<Value> = db
        .follows
        .iter()
        .filter(|(_, followee)| *followee == id)
        .map(|(follower, _)| db.user_json(follower))
        .collect();
    Ok(Json(json!({ "users": users })).into_response())
}

async fn follow(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((follower, followee)): Path<(String, String)>,
) -> Reply {
    if caller(&state, &headers)? != follower {
        return Err(forbidden());
    }
    let mut db = state.db.lock().unwrap();
    db.user(&followee).ok_or_else(|| not_found("user"))?;
    db.follows.insert((follower, followee));
    no_content()
}

async fn unfollow(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((follower, followee)): Path<(String, String)>,
) -> Reply {
    if caller(&state, &headers)? != follower {
        return Err(forbidden());
    }
    state
        .db
        .lock()
        .unwrap()
        .follows
        .remove(&(follower, followee));
    no_content()
}

// ============================================
// Posts
// ============================================

#[derive(Deserialize)]
struct PostFilter {
    user_id: Option<String>,
}

async fn list_posts(State(state): State<Shared>, Query(filter): Query<PostFilter>) -> Reply {
    let db = state.db.lock().unwrap();
    let posts: Vec<Value> = db
        .posts
        .iter()
        .rev()
        .filter(|p| filter.user_id.as_ref().map_or(true, |id| p.author == *id))
        .map(|p| db.post_json(p))
        .collect();
    Ok(Json(posts).into_response())
}

#[derive(Deserialize)]
struct PostBody {
    content: String,
    author: String,
}

async fn create_post(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<PostBody>,
) -> Reply {
    if caller(&state, &headers)? != body.author {
        return Err(forbidden());
    }
    let mut db = state.db.lock().unwrap();
    let id = db.id("p");
    let at = db.tick();
    let post = StoredPost {
        id,
        author: body.author,
        content: body.content,
        created: at,
        modified: at,
    };
    let reply = db.post_json(&post);
    db.posts.push(post);
    Ok((StatusCode::CREATED, Json(reply)).into_response())
}

async fn get_post(State(state): State<Shared>, Path(id): Path<String>) -> Reply {
    let db = state.db.lock().unwrap();
    let post = db
        .posts
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| not_found("post"))?;
    Ok(Json(db.post_json(post)).into_response())
}

#[derive(Deserialize)]
struct ContentBody {
    content: Option<String>,
}

async fn patch_post(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ContentBody>,
) -> Reply {
    let caller = caller(&state, &headers)?;
    let mut db = state.db.lock().unwrap();
    let at = db.tick();
    let post = db
        .posts
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| not_found("post"))?;
    if post.author != caller {
        return Err(forbidden());
    }
    if let Some(content) = body.content {
        post.content = content;
        post.modified = at;
    }
    no_content()
}

async fn delete_post(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let caller = caller(&state, &headers)?;
    let mut db = state.db.lock().unwrap();
    let post = db
        .posts
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| not_found("post"))?;
    if post.author != caller {
        return Err(forbidden());
    }
    db.posts.retain(|p| p.id != id);
    db.comments.retain(|c| c.post != id);
    no_content()
}

// ============================================
// Comments
// ============================================

#[derive(Deserialize)]
struct CommentFilter {
    post_id: Option<String>,
}

async fn list_comments(
    State(state): State<Shared>,
    Query(filter): Query<CommentFilter>,
) -> Reply {
    let db = state.db.lock().unwrap();
    let comments: Vec<Value> = db
        .comments
        .iter()
        .filter(|c| filter.post_id.as_ref().map_or(true, |id| c.post == *id))
        .map(|c| db.comment_json(c))
        .collect();
    Ok(Json(json!({ "comments": comments })).into_response())
}

#[derive(Deserialize)]
struct CommentBody {
    content: String,
    author: String,
    post: String,
}

async fn create_comment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CommentBody>,
) -> Reply {
    if caller(&state, &headers)? != body.author {
        return Err(forbidden());
    }
    let mut db = state.db.lock().unwrap();
    if !db.posts.iter().any(|p| p.id == body.post) {
        return Err(not_found("post"));
    }
    let id = db.id("c");
    let at = db.tick();
    db.comments.push(StoredComment {
        id: id.clone(),
        author: body.author,
        post: body.post,
        content: body.content,
        created: at,
        modified: at,
    });
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))).into_response())
}

async fn get_comment(State(state): State<Shared>, Path(id): Path<String>) -> Reply {
    let db = state.db.lock().unwrap();
    let comment = db
        .comments
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| not_found("comment"))?;
    Ok(Json(db.comment_json(comment)).into_response())
}

async fn patch_comment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ContentBody>,
) -> Reply {
    let caller = caller(&state, &headers)?;
    let mut db = state.db.lock().unwrap();
    let at = db.tick();
    let comment = db
        .comments
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| not_found("comment"))?;
    if comment.author != caller {
        return Err(forbidden());
    }
    if let Some(content) = body.content {
        comment.content = content;
        comment.modified = at;
    }
    no_content()
}

async fn delete_comment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let caller = caller(&state, &headers)?;
    let mut db = state.db.lock().unwrap();
    let comment = db
        .comments
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| not_found("comment"))?;
    if comment.author != caller {
        return Err(forbidden());
    }
    db.comments.retain(|c| c.id != id);
    no_content()
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/users", get(list_users).post(signup))
        .route("/users/me", get(me))
        .route("/users/:id", get(get_user).patch(patch_user).delete(delete_user))
        .route("/users/:id/password", put(change_password))
        .route("/users/:id/followers", get(followers))
        .route("/users/:id/followings", get(followings))
        .route("/users/:id/followings/:followee", put(follow).delete(unfollow))
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/:id", get(get_post).patch(patch_post).delete(delete_post))
        .route("/comments", get(list_comments).post(create_comment))
        .route(
            "/comments/:id",
            get(get_comment).patch(patch_comment).delete(delete_comment),
        )
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

/// A running mock backend
pub struct MockBackend {
    pub base_url: String,
    state: Shared,
    server: tokio::task::JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState {
            db: Mutex::new(Db::new()),
            seen: Mutex::new(Vec::new()),
            delays: Mutex::new(HashMap::new()),
            signup_mode: Mutex::new(SignupMode::Authenticated),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            server,
        }
    }

    /// An app (client plus anonymous session) pointed at this backend
    pub fn app(&self) -> App {
        let mut config = Config::default();
        config.api.base_url = self.base_url.clone();
        config.api.request_timeout_secs = 5;
        App::new(config).unwrap()
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            ..ClientConfig::default()
        }
    }

    pub fn set_signup_mode(&self, mode: SignupMode) {
        *self.state.signup_mode.lock().unwrap() = mode;
    }

    /// Delay requests to `path`
    ///
    /// A path with a query string matches only that exact query; a bare
    /// path matches every query.
    pub fn delay(&self, path: &str, delay: Duration) {
        self.state
            .delays
            .lock()
            .unwrap()
            .insert(path.to_string(), delay);
    }

    /// Requests received so far
    pub fn seen(&self) -> Vec<Seen> {
        self.state.seen.lock().unwrap().clone()
    }

    pub fn clear_seen(&self) {
        self.state.seen.lock().unwrap().clear();
    }

    /// Create a user directly, returning its id
    pub fn seed_user(&self, name: &str, email: &str, password: &str) -> String {
        let mut db = self.state.db.lock().unwrap();
        let id = db.id("u");
        db.users.push(StoredUser {
            id: id.clone(),
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        });
        id
    }

    /// Create a post directly, returning its id
    pub fn seed_post(&self, author: &str, content: &str) -> String {
        let mut db = self.state.db.lock().unwrap();
        let id = db.id("p");
        let at = db.tick();
        db.posts.push(StoredPost {
            id: id.clone(),
            author: author.to_string(),
            content: content.to_string(),
            created: at,
            modified: at,
        });
        id
    }

    pub fn seed_follow(&self, follower: &str, followee: &str) {
        self.state
            .db
            .lock()
            .unwrap()
            .follows
            .insert((follower.to_string(), followee.to_string()));
    }

    pub fn follows(&self, follower: &str, followee: &str) -> bool {
        self.state
            .db
            .lock()
            .unwrap()
            .follows
            .contains(&(follower.to_string(), followee.to_string()))
    }

    pub fn user_exists(&self, id: &str) -> bool {
        self.state.db.lock().unwrap().user(id).is_some()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}
