//! In-memory people API used as the live endpoint in end-to-end tests.
//!
//! Besides plain JSON routes it serves the awkward cases a client engine has
//! to negotiate: a JSON body without any `Content-Type`, a line-separated
//! `text/plain` listing, and an echo route that mirrors the request's body
//! and content type.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: u64,
    pub name: String,
}

/// People keyed by id; ordered so listings are stable.
pub type Db = Arc<RwLock<BTreeMap<u64, Person>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(BTreeMap::new()));
    Router::new()
        .route("/people", get(list_people).post(create_people))
        .route("/people/{id}", get(get_person))
        .route("/people/{id}/untyped", get(get_person_untyped))
        .route("/names", get(list_names))
        .route("/echo", post(echo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_people(State(db): State<Db>) -> Json<Vec<Person>> {
    let people = db.read().await;
    Json(people.values().cloned().collect())
}

/// Bulk insert. Existing ids are overwritten.
async fn create_people(
    State(db): State<Db>,
    Json(input): Json<Vec<Person>>,
) -> (StatusCode, Json<Vec<Person>>) {
    let mut people = db.write().await;
    for person in &input {
        people.insert(person.id, person.clone());
    }
    tracing::debug!(count = input.len(), "people stored");
    (StatusCode::CREATED, Json(input))
}

async fn get_person(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<Person>, StatusCode> {
    let people = db.read().await;
    people.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// Same body as `get_person`, sent without a `Content-Type` header.
async fn get_person_untyped(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Response, StatusCode> {
    let people = db.read().await;
    let person = people.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let body = serde_json::to_string(person).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Response::new(Body::from(body)))
}

/// One name per line, as `text/plain; charset=utf-8`.
async fn list_names(State(db): State<Db>) -> String {
    let people = db.read().await;
    people
        .values()
        .map(|person| person.name.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

async fn echo(headers: HeaderMap, body: String) -> Response {
    let mut response = Response::new(Body::from(body));
    if let Some(content_type) = headers.get(CONTENT_TYPE) {
        response.headers_mut().insert(CONTENT_TYPE, content_type.clone());
    }
    response
}
