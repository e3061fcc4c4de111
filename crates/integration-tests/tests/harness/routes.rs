//! Widget routes whose handlers fail in every supported way

use axum::extract::Path;
use axum::routing::{get, post};
use axum::{Json, Router};
use faultline_core::{Failure, FailureType, guard};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct NewWidget {
    name: String,
    tags: Vec<String>,
}

pub fn widget_routes() -> Router {
    Router::new()
        .route("/widgets", post(create_widget))
        .route("/widgets/{id}", get(get_widget))
        .route("/widgets/{id}/brew", get(brew))
        .route("/batch", get(batch))
        .route("/upstream", get(upstream))
        .route("/explode", get(explode))
}

async fn get_widget(Path(id): Path<String>) -> Result<String, Failure> {
    let widget = (id == "1").then(|| "sprocket".to_owned());
    guard::found(widget, "Widget", id)
}

async fn create_widget(Json(widget): Json<NewWidget>) -> Result<&'static str, Failure> {
    let mut problems = Vec::new();
    if widget.name.trim().is_empty() {
        problems.push(("name", "Name is required."));
    }
    if widget.name.len() > 8 {
        problems.push(("name", "Name is too long."));
    }
    if widget.tags.is_empty() {
        problems.push(("tags", "At least one tag is required."));
    }

    guard::ensure(problems.is_empty(), || Failure::validation_failed(problems))?;
    Ok("created")
}

async fn brew(Path(id): Path<String>) -> Result<(), Failure> {
    Err(Failure::custom("TeaPotError", format!("widget {id} is a teapot")))
}

async fn batch() -> Result<(), Failure> {
    Err(Failure::aggregate([
        Failure::not_found("Widget", 7),
        Failure::timeout("inventory lookup timed out"),
        Failure::not_found("Widget", 8),
    ]))
}

async fn upstream() -> Result<(), Failure> {
    let cause = Failure::unavailable("connection refused").with_type(FailureType::from_static("ConnectionError"));
    Err(Failure::external_component("inventory", "stock service").with_cause(cause))
}

#[allow(clippy::unused_async)]
async fn explode() -> &'static str {
    panic!("widget press jammed")
}
