//! The `/api/users` endpoints.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tokendsl::prelude::*;

use crate::store::{NewUser, User, UserPatch, UserStore};

/// Message of the error returned for unknown ids. Classified as 404.
pub const USER_NOT_FOUND: &str = "User not found";

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    offset: Option<usize>,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct UserId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct UpdateUser {
    id: String,
    #[serde(flatten)]
    patch: UserPatch,
}

fn user_fields() -> Vec<(&'static str, JsonSchema)> {
    vec![
        ("name", JsonSchema::string().min_length(1).max_length(200).required()),
        ("email", JsonSchema::string().email().required()),
        ("age", JsonSchema::integer().minimum(0).maximum(150)),
    ]
}

fn create_schema() -> JsonSchema {
    JsonSchema::object(user_fields())
}

fn update_schema() -> JsonSchema {
    let mut fields = user_fields();
    fields.push(("id", JsonSchema::string()));
    JsonSchema::object(fields).partial()
}

fn id_schema() -> JsonSchema {
    JsonSchema::object(vec![("id", JsonSchema::string().min_length(1).required())])
}

fn not_found() -> ApiError {
    ApiError::not_found(USER_NOT_FOUND)
}

/// Declares the user API over `store`.
pub fn api(store: &Arc<UserStore>) -> Vec<(&'static str, Endpoint)> {
    vec![
        ("GET /api/users", list(Arc::clone(store))),
        ("GET /api/users/:id", get(Arc::clone(store))),
        ("POST /api/users", create(Arc::clone(store))),
        ("PUT /api/users/:id", update(Arc::clone(store))),
        ("DELETE /api/users/:id", delete(Arc::clone(store))),
    ]
}

fn list(store: Arc<UserStore>) -> Endpoint {
    Endpoint::new()
        .description("List users in creation order")
        .tags(["users", "read"])
        .input(JsonSchema::object(vec![
            ("offset", JsonSchema::integer().minimum(0)),
            ("limit", JsonSchema::integer().minimum(1).maximum(1000)),
        ]))
        .typed_handler(move |query: ListQuery, _ctx| {
            let store = Arc::clone(&store);
            async move { Ok(store.list(query.offset.unwrap_or(0), query.limit)) }
        })
        .example_output(json!([{"id": "0190b6c4-…", "name": "Ada", "email": "ada@example.com"}]))
        .ui_schema(
            UiSchema::new(UiLayout::Table)
                .field("name", UiField::new("text", "Full name"))
                .field("email", UiField::new("email", "Email address")),
        )
        .commit_hint("Add user listing endpoint")
}

fn get(store: Arc<UserStore>) -> Endpoint {
    Endpoint::new()
        .description("Fetch a user by id")
        .tags(["users", "read"])
        .input(id_schema())
        .typed_handler(move |UserId { id }, _ctx| {
            let store = Arc::clone(&store);
            async move { store.get(&id).ok_or_else(not_found) }
        })
        .ui_schema(
            UiSchema::new(UiLayout::Card)
                .field("id", UiField::new("text", "User ID").display("readonly"))
                .field("name", UiField::new("text", "Full name"))
                .field("email", UiField::new("email", "Email address")),
        )
        .commit_hint("Add user fetch endpoint")
}

fn create(store: Arc<UserStore>) -> Endpoint {
    Endpoint::new()
        .description("Create a user")
        .tags(["users", "create"])
        .input(create_schema())
        .typed_handler(move |new: NewUser, _ctx| {
            let store = Arc::clone(&store);
            async move {
                let user: User = store.create(new);
                tracing::info!(user.id = %user.id, "user created");
                Ok(user)
            }
        })
        .example_input(json!({"name": "Ada", "email": "ada@example.com", "age": 36}))
        .ui_schema(
            UiSchema::new(UiLayout::Form)
                .field("name", UiField::new("text", "Full name"))
                .field("email", UiField::new("email", "Email address"))
                .field("age", UiField::new("number", "Age")),
        )
        .commit_hint("Add user creation endpoint")
}

fn update(store: Arc<UserStore>) -> Endpoint {
    Endpoint::new()
        .description("Update some fields of a user")
        .tags(["users", "update"])
        .input(update_schema())
        .typed_handler(move |UpdateUser { id, patch }, _ctx| {
            let store = Arc::clone(&store);
            async move { store.update(&id, patch).ok_or_else(not_found) }
        })
        .example_input(json!({"name": "Ada Lovelace"}))
        .commit_hint("Add user update endpoint")
}

fn delete(store: Arc<UserStore>) -> Endpoint {
    Endpoint::new()
        .description("Delete a user")
        .tags(["users", "delete"])
        .input(id_schema())
        .handler(move |input: Value, _ctx| {
            let store = Arc::clone(&store);
            async move {
                let id = input["id"].as_str().unwrap_or_default();
                if store.delete(id) {
                    Ok(json!({"success": true}))
                } else {
                    Err(not_found())
                }
            }
        })
        .example_output(json!({"success": true}))
        .commit_hint("Add user deletion endpoint")
}
