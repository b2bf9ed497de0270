use actix_web::{web, HttpResponse};
use serde_json::json;

use super::dtos::envelope::Envelope;
use super::dtos::todo::{CreateTodoDTO, ListTodosQuery, UpdateTodoDTO};
use super::errors::TodoApiError;
use super::state::AppState;
use crate::models::todo_model::{NewTodo, TodoPatch};

const FETCH_ALL_FAILED: &str = "Server error while fetching todos";
const FETCH_FAILED: &str = "Server error while fetching todo";
const CREATE_FAILED: &str = "Server error while creating todo";
const UPDATE_FAILED: &str = "Server error while updating todo";
const DELETE_FAILED: &str = "Server error while deleting todo";
const DELETE_ALL_FAILED: &str = "Server error while deleting todos";
const DELETE_COMPLETED_FAILED: &str = "Server error while deleting completed todos";

/// List todos newest first, optionally only (in)complete ones with
/// `?completed=true|false`
pub async fn get_todos(
    state: web::Data<AppState>,
    query: web::Query<ListTodosQuery>,
) -> Result<HttpResponse, TodoApiError> {
    let filter = query.into_inner().completed;

    let list = state
        .with_store(move |store| match filter {
            Some(completed) => store.find_by_completed(completed),
            None => store.find_all(),
        })
        .await
        .map_err(|e| state.api_error(e, FETCH_ALL_FAILED))?;

    let count = list.len();

    Ok(HttpResponse::Ok().json(Envelope::ok(list).count(count)))
}

pub async fn get_todo(
    state: web::Data<AppState>,
    todo_id: web::Path<String>,
) -> Result<HttpResponse, TodoApiError> {
    let todo_id = todo_id.into_inner();

    let todo = state
        .with_store(move |store| store.find_by_id(&todo_id))
        .await
        .map_err(|e| state.api_error(e, FETCH_FAILED))?;

    Ok(HttpResponse::Ok().json(Envelope::ok(todo)))
}

/// Create a new todo
pub async fn create_todo(
    state: web::Data<AppState>,
    request_data: web::Json<CreateTodoDTO>,
) -> Result<HttpResponse, TodoApiError> {
    let new_todo = NewTodo::try_from(request_data.into_inner())?;

    let created = state
        .with_store(move |store| store.create(new_todo))
        .await
        .map_err(|e| state.api_error(e, CREATE_FAILED))?;

    log::debug!("created todo {}", created.id);

    Ok(HttpResponse::Created().json(Envelope::ok(created).message("Todo created successfully")))
}

/// Replace the fields present in the body, leave the rest untouched
pub async fn update_todo(
    state: web::Data<AppState>,
    todo_id: web::Path<String>,
    request_data: web::Json<UpdateTodoDTO>,
) -> Result<HttpResponse, TodoApiError> {
    let todo_id = todo_id.into_inner();
    let patch = TodoPatch::from(request_data.into_inner());

    let updated = state
        .with_store(move |store| store.update(&todo_id, &patch))
        .await
        .map_err(|e| state.api_error(e, UPDATE_FAILED))?;

    Ok(HttpResponse::Ok().json(Envelope::ok(updated).message("Todo updated successfully")))
}

/// Api to Delete a TODO, answers with the removed record
pub async fn delete_todo(
    state: web::Data<AppState>,
    todo_id: web::Path<String>,
) -> Result<HttpResponse, TodoApiError> {
    let todo_id = todo_id.into_inner();

    let deleted = state
        .with_store(move |store| store.delete_by_id(&todo_id))
        .await
        .map_err(|e| state.api_error(e, DELETE_FAILED))?;

    log::debug!("deleted todo {}", deleted.id);

    Ok(HttpResponse::Ok().json(Envelope::ok(deleted).message("Todo deleted successfully")))
}

pub async fn delete_all_todos(state: web::Data<AppState>) -> Result<HttpResponse, TodoApiError> {
    let deleted_count = state
        .with_store(|store| store.delete_all())
        .await
        .map_err(|e| state.api_error(e, DELETE_ALL_FAILED))?;

    log::info!("deleted all {} todo(s)", deleted_count);

    Ok(HttpResponse::Ok().json(
        Envelope::success("All todos deleted successfully").deleted_count(deleted_count),
    ))
}

pub async fn delete_completed_todos(
    state: web::Data<AppState>,
) -> Result<HttpResponse, TodoApiError> {
    let deleted_count = state
        .with_store(|store| store.delete_all_completed())
        .await
        .map_err(|e| state.api_error(e, DELETE_COMPLETED_FAILED))?;

    Ok(HttpResponse::Ok().json(
        Envelope::ok(json!({ "deletedCount": deleted_count }))
            .message(format!(
                "{} completed todo(s) deleted successfully",
                deleted_count
            ))
            .deleted_count(deleted_count),
    ))
}

#[cfg(test)]
mod test {
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    use crate::api::api::build_app;
    use crate::api::api::test_support::{cors, limiter, memory_state};

    macro_rules! app {
        () => {
            test::init_service(build_app(memory_state(), limiter(), cors())).await
        };
    }

    /// Sends a `TestRequest` and yields `(status, json body)`
    macro_rules! send {
        ($app:expr, $req:expr) => {{
            let res = test::call_service(&$app, $req.to_request()).await;
            let status = res.status();
            let body: Value = test::read_body_json(res).await;
            (status, body)
        }};
    }

    /// Creates a todo and yields its `data`
    macro_rules! create {
        ($app:expr, $body:expr) => {{
            let (status, mut body) = send!(
                $app,
                test::TestRequest::post().uri("/api/todos").set_json($body)
            );
            assert_eq!(status, StatusCode::CREATED);
            body["data"].take()
        }};
    }

    fn todo_uri(todo: &Value) -> String {
        format!("/api/todos/{}", todo["id"].as_str().unwrap())
    }

    #[actix_web::test]
    async fn test_create_todo_defaults() {
        let app = app!();

        let (status, body) = send!(
            app,
            test::TestRequest::post()
                .uri("/api/todos")
                .set_json(json!({ "title": "  Buy milk  " }))
        );

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Todo created successfully");

        let data = &body["data"];

        assert!(!data["id"].as_str().unwrap().is_empty());
        assert_eq!(data["title"], "Buy milk");
        assert_eq!(data["description"], "");
        assert_eq!(data["completed"], false);
        assert_eq!(data["createdAt"], data["updatedAt"]);
    }

    #[actix_web::test]
    async fn test_create_requires_title() {
        let app = app!();

        for body in [json!({}), json!({ "title": "" }), json!({ "title": "   " }), json!({ "title": null })] {
            let (status, body) = send!(
                app,
                test::TestRequest::post().uri("/api/todos").set_json(body)
            );

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({ "success": false, "message": "Title is required" }));
        }
    }

    #[actix_web::test]
    async fn test_create_rejects_long_fields() {
        let app = app!();

        let (status, body) = send!(
            app,
            test::TestRequest::post()
                .uri("/api/todos")
                .set_json(json!({ "title": "t".repeat(201) }))
        );

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation error");
        assert_eq!(body["error"], "Title cannot exceed 200 characters");

        let (status, body) = send!(
            app,
            test::TestRequest::post()
                .uri("/api/todos")
                .set_json(json!({ "title": "ok", "description": "d".repeat(1001) }))
        );

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Description cannot exceed 1000 characters");
    }

    #[actix_web::test]
    async fn test_create_rejects_bad_json() {
        let app = app!();

        let (status, body) = send!(
            app,
            test::TestRequest::post()
                .uri("/api/todos")
                .insert_header(("content-type", "application/json"))
                .set_payload("{\"title\": ")
        );

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Invalid request body");
    }

    #[actix_web::test]
    async fn test_list_newest_first_with_count() {
        let app = app!();

        let (_, body) = send!(app, test::TestRequest::get().uri("/api/todos"));

        assert_eq!(body, json!({ "success": true, "data": [], "count": 0 }));

        for title in ["first", "second", "third"] {
            create!(app, json!({ "title": title }));
        }

        let (status, body) = send!(app, test::TestRequest::get().uri("/api/todos"));

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 3);

        let stamps: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["createdAt"].as_str().unwrap())
            .collect();
        let created: Vec<chrono::DateTime<chrono::Utc>> =
            stamps.iter().map(|s| s.parse().unwrap()).collect();

        assert!(created.windows(2).all(|w| w[0] >= w[1]));
    }

    #[actix_web::test]
    async fn test_list_filters_by_completed() {
        let app = app!();

        create!(app, json!({ "title": "open" }));
        create!(app, json!({ "title": "done", "completed": true }));

        let (_, body) = send!(app, test::TestRequest::get().uri("/api/todos?completed=true"));

        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["title"], "done");

        let (status, _) = send!(app, test::TestRequest::get().uri("/api/todos?completed=maybe"));

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_get_round_trip() {
        let app = app!();

        let created = create!(app, json!({ "title": "Read", "description": " a book " }));

        let (status, body) = send!(app, test::TestRequest::get().uri(&todo_uri(&created)));

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "data": created }));
        assert_eq!(body["data"]["description"], "a book");
    }

    #[actix_web::test]
    async fn test_malformed_and_missing_ids() {
        let app = app!();
        let missing = format!("/api/todos/{}", uuid::Uuid::new_v4());

        let (status, body) = send!(app, test::TestRequest::get().uri("/api/todos/123"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid todo ID format");

        let (status, _) = send!(
            app,
            test::TestRequest::put()
                .uri("/api/todos/123")
                .set_json(json!({ "completed": true }))
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send!(app, test::TestRequest::delete().uri("/api/todos/123"));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send!(app, test::TestRequest::get().uri(&missing));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "success": false, "message": "Todo not found" }));

        let (status, _) = send!(
            app,
            test::TestRequest::put()
                .uri(&missing)
                .set_json(json!({ "title": "x" }))
        );
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send!(app, test::TestRequest::delete().uri(&missing));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_update_is_partial() {
        let app = app!();

        let created = create!(app, json!({ "title": "Title", "description": "Desc" }));

        let (status, body) = send!(
            app,
            test::TestRequest::put()
                .uri(&todo_uri(&created))
                .set_json(json!({ "completed": true }))
        );

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Todo updated successfully");

        let updated = &body["data"];

        assert_eq!(updated["completed"], true);
        assert_eq!(updated["title"], "Title");
        assert_eq!(updated["description"], "Desc");
        assert_eq!(updated["createdAt"], created["createdAt"]);

        let before: chrono::DateTime<chrono::Utc> =
            created["updatedAt"].as_str().unwrap().parse().unwrap();
        let after: chrono::DateTime<chrono::Utc> =
            updated["updatedAt"].as_str().unwrap().parse().unwrap();

        assert!(after > before);
    }

    #[actix_web::test]
    async fn test_update_null_clears_description() {
        let app = app!();

        let created = create!(app, json!({ "title": "Title", "description": "Desc" }));

        let (_, body) = send!(
            app,
            test::TestRequest::put()
                .uri(&todo_uri(&created))
                .set_json(json!({ "description": null, "title": " New " }))
        );

        assert_eq!(body["data"]["description"], "");
        assert_eq!(body["data"]["title"], "New");
    }

    #[actix_web::test]
    async fn test_update_rejects_blank_title() {
        let app = app!();

        let created = create!(app, json!({ "title": "Title" }));

        for title in [json!(""), json!("   "), Value::Null] {
            let (status, body) = send!(
                app,
                test::TestRequest::put()
                    .uri(&todo_uri(&created))
                    .set_json(json!({ "title": title }))
            );

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["message"], "Title cannot be empty");
        }

        let (_, body) = send!(app, test::TestRequest::get().uri(&todo_uri(&created)));

        assert_eq!(body["data"], created);
    }

    #[actix_web::test]
    async fn test_update_rejects_long_fields() {
        let app = app!();

        let created = create!(app, json!({ "title": "Title", "description": "Desc" }));

        let cases = [
            (
                json!({ "title": "t".repeat(201) }),
                "Title cannot exceed 200 characters",
            ),
            (
                json!({ "description": "d".repeat(1001), "completed": true }),
                "Description cannot exceed 1000 characters",
            ),
        ];

        for (update, reason) in cases {
            let (status, body) = send!(
                app,
                test::TestRequest::put()
                    .uri(&todo_uri(&created))
                    .set_json(update)
            );

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["success"], false);
            assert_eq!(body["message"], "Validation error");
            assert_eq!(body["error"], reason);
        }

        let (_, body) = send!(app, test::TestRequest::get().uri(&todo_uri(&created)));

        assert_eq!(body["data"], created);
    }

    #[actix_web::test]
    async fn test_delete_returns_record() {
        let app = app!();

        let created = create!(app, json!({ "title": "Gone soon" }));

        let (status, body) = send!(app, test::TestRequest::delete().uri(&todo_uri(&created)));

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Todo deleted successfully");
        assert_eq!(body["data"], created);

        let (status, _) = send!(app, test::TestRequest::get().uri(&todo_uri(&created)));

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_delete_all() {
        let app = app!();

        create!(app, json!({ "title": "one" }));
        create!(app, json!({ "title": "two", "completed": true }));

        let (status, body) = send!(app, test::TestRequest::delete().uri("/api/todos"));

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "success": true,
                "message": "All todos deleted successfully",
                "deletedCount": 2
            })
        );

        let (_, body) = send!(app, test::TestRequest::get().uri("/api/todos"));

        assert_eq!(body["count"], 0);
    }

    #[actix_web::test]
    async fn test_delete_completed_keeps_open_todos() {
        let app = app!();

        let open = create!(app, json!({ "title": "open" }));
        create!(app, json!({ "title": "done 1", "completed": true }));
        create!(app, json!({ "title": "done 2", "completed": true }));

        let (status, body) = send!(
            app,
            test::TestRequest::delete().uri("/api/todos/completed/all")
        );

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "2 completed todo(s) deleted successfully");
        assert_eq!(body["deletedCount"], 2);
        assert_eq!(body["data"]["deletedCount"], 2);

        let (_, body) = send!(app, test::TestRequest::get().uri("/api/todos"));

        assert_eq!(body["data"], json!([open]));
    }

    #[actix_web::test]
    async fn test_buy_milk_scenario() {
        let app = app!();

        let created = create!(app, json!({ "title": "Buy milk" }));
        let uri = todo_uri(&created);

        assert_eq!(created["title"], "Buy milk");
        assert_eq!(created["description"], "");
        assert_eq!(created["completed"], false);

        let (status, body) = send!(
            app,
            test::TestRequest::put()
                .uri(&uri)
                .set_json(json!({ "completed": true }))
        );

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["completed"], true);
        assert_eq!(body["data"]["title"], "Buy milk");

        let (status, body) = send!(
            app,
            test::TestRequest::delete().uri("/api/todos/completed/all")
        );

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deletedCount"], 1);

        let (status, body) = send!(app, test::TestRequest::get().uri(&uri));

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "success": false, "message": "Todo not found" }));
    }

    #[actix_web::test]
    async fn test_trailing_slash_is_accepted() {
        let app = app!();

        let (status, body) = send!(app, test::TestRequest::get().uri("/api/todos/"));

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }
}
