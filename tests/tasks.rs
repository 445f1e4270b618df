mod common;

use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::test;
use futures::future::join_all;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use todoforge::models::NewTask;
use todoforge::store::{TaskStore, TodoStore};
use uuid::Uuid;

use common::{init_app, TestContext};

fn orders(tasks: &[Value]) -> Vec<(String, i64)> {
    tasks
        .iter()
        .map(|task| {
            (
                task["name"].as_str().unwrap().to_string(),
                task["sortOrder"].as_i64().unwrap(),
            )
        })
        .collect()
}

fn expected(pairs: &[(&str, i64)]) -> Vec<(String, i64)> {
    pairs.iter().map(|(name, order)| (name.to_string(), *order)).collect()
}

#[actix_rt::test]
async fn test_groceries_ordering() {
    let ctx = TestContext::new();
    let user = ctx.seed_user("alice").await;
    let todo = ctx.store.create_todo(user.id, "Groceries").await.unwrap();
    let app = init_app(ctx.state.clone()).await;
    let tasks_uri = format!("/todos/{}/tasks", todo.id);

    let create = |name: &str, cookie: Cookie<'static>| {
        test::TestRequest::post()
            .uri(&tasks_uri)
            .cookie(cookie)
            .set_json(json!({ "name": name }))
            .to_request()
    };
    let list = |cookie: Cookie<'static>| {
        test::TestRequest::get().uri(&tasks_uri).cookie(cookie).to_request()
    };

    let mut ids = Vec::new();
    for name in ["Milk", "Eggs", "Bread"] {
        let resp = test::call_service(&app, create(name, ctx.cookie_for(&user))).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let task: Value = test::read_body_json(resp).await;
        ids.push(task["id"].as_str().unwrap().to_string());
    }

    let tasks: Vec<Value> = test::call_and_read_body_json(&app, list(ctx.cookie_for(&user))).await;
    assert_eq!(orders(&tasks), expected(&[("Milk", 1), ("Eggs", 2), ("Bread", 3)]));

    let delete_eggs = || {
        test::TestRequest::delete()
            .uri(&format!("{}/{}", tasks_uri, ids[1]))
            .cookie(ctx.cookie_for(&user))
            .to_request()
    };
    let resp = test::call_service(&app, delete_eggs()).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let tasks: Vec<Value> = test::call_and_read_body_json(&app, list(ctx.cookie_for(&user))).await;
    assert_eq!(orders(&tasks), expected(&[("Milk", 1), ("Bread", 2)]));

    let resp = test::call_service(&app, create("Cheese", ctx.cookie_for(&user))).await;
    let cheese: Value = test::read_body_json(resp).await;
    assert_eq!(cheese["sortOrder"], 3);

    // a second delete of the same task changes nothing
    let resp = test::call_service(&app, delete_eggs()).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let tasks: Vec<Value> = test::call_and_read_body_json(&app, list(ctx.cookie_for(&user))).await;
    assert_eq!(
        orders(&tasks),
        expected(&[("Milk", 1), ("Bread", 2), ("Cheese", 3)])
    );
}

#[actix_rt::test]
async fn test_sequential_creates_number_from_one() {
    let ctx = TestContext::new();
    let user = ctx.seed_user("alice").await;
    let todo = ctx.store.create_todo(user.id, "Chores").await.unwrap();
    let app = init_app(ctx.state.clone()).await;

    for n in 1..=12 {
        let req = test::TestRequest::post()
            .uri(&format!("/todos/{}/tasks", todo.id))
            .cookie(ctx.cookie_for(&user))
            .set_json(json!({ "name": format!("task {}", n) }))
            .to_request();
        let task: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(task["sortOrder"], n);
    }
}

#[actix_rt::test]
async fn test_concurrent_creates_stay_contiguous() {
    let ctx = TestContext::new();
    let user = ctx.seed_user("alice").await;
    let todo = ctx.store.create_todo(user.id, "Chores").await.unwrap();

    let creates = (0..25).map(|n| {
        ctx.store.create_task(
            user.id,
            todo.id,
            NewTask {
                name: format!("task {}", n),
                description: String::new(),
                completed: false,
                due_date: None,
            },
        )
    });
    for created in join_all(creates).await {
        assert!(created.unwrap().is_some());
    }

    let orders: Vec<i32> = ctx
        .store
        .list_tasks(user.id, todo.id)
        .await
        .unwrap()
        .iter()
        .map(|task| task.sort_order)
        .collect();
    assert_eq!(orders, (1..=25).collect::<Vec<i32>>());
}

#[actix_rt::test]
async fn test_create_task_fields_and_validation() {
    let ctx = TestContext::new();
    let user = ctx.seed_user("alice").await;
    let todo = ctx.store.create_todo(user.id, "Groceries").await.unwrap();
    let app = init_app(ctx.state.clone()).await;
    let uri = format!("/todos/{}/tasks", todo.id);

    let req = test::TestRequest::post()
        .uri(&uri)
        .cookie(ctx.cookie_for(&user))
        .set_json(json!({
            "name": "Milk",
            "description": "two litres",
            "completed": true,
            "dueDate": "2026-11-01"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let task: Value = test::read_body_json(resp).await;
    assert_eq!(task["todoId"], todo.id.to_string());
    assert_eq!(task["description"], "two litres");
    assert_eq!(task["completed"], true);
    assert_eq!(task["dueDate"], "2026-11-01");
    assert!(task.get("userId").is_none());

    let req = test::TestRequest::post()
        .uri(&uri)
        .cookie(ctx.cookie_for(&user))
        .set_json(json!({ "name": "Eggs", "dueDate": "" }))
        .to_request();
    let task: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(task["dueDate"], Value::Null);
    assert_eq!(task["completed"], false);
    assert_eq!(task["description"], "");

    for body in [
        json!({ "name": "" }),
        json!({ "description": "no name" }),
        json!({ "name": "Bread", "dueDate": "next tuesday" }),
        json!({ "name": "Bread", "description": "d".repeat(1001) }),
    ] {
        let req = test::TestRequest::post()
            .uri(&uri)
            .cookie(ctx.cookie_for(&user))
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", body);
    }

    assert_eq!(ctx.store.list_tasks(user.id, todo.id).await.unwrap().len(), 2);
}

#[actix_rt::test]
async fn test_task_on_foreign_todo_is_not_found() {
    let ctx = TestContext::new();
    let alice = ctx.seed_user("alice").await;
    let bob = ctx.seed_user("bob").await;
    let todo = ctx.store.create_todo(alice.id, "Groceries").await.unwrap();
    let app = init_app(ctx.state.clone()).await;
    let uri = format!("/todos/{}/tasks", todo.id);

    let req = test::TestRequest::post()
        .uri(&uri)
        .cookie(ctx.cookie_for(&bob))
        .set_json(json!({ "name": "Spam" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&uri)
        .cookie(ctx.cookie_for(&bob))
        .to_request();
    let tasks: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert!(tasks.is_empty());

    assert!(ctx.store.raw_tasks(todo.id).await.is_empty());
}

#[actix_rt::test]
async fn test_patch_writes_only_present_fields() {
    let ctx = TestContext::new();
    let user = ctx.seed_user("alice").await;
    let todo = ctx.store.create_todo(user.id, "Groceries").await.unwrap();
    for name in ["Milk", "Eggs"] {
        ctx.store
            .create_task(
                user.id,
                todo.id,
                NewTask {
                    name: name.to_string(),
                    description: format!("buy {}", name),
                    completed: false,
                    due_date: Some(chrono::NaiveDate::from_ymd_opt(2026, 11, 1).unwrap()),
                },
            )
            .await
            .unwrap();
    }
    let eggs = ctx.store.list_tasks(user.id, todo.id).await.unwrap()[1].clone();
    let app = init_app(ctx.state.clone()).await;
    let uri = format!("/todos/{}/tasks/{}", todo.id, eggs.id);

    let req = test::TestRequest::patch()
        .uri(&uri)
        .cookie(ctx.cookie_for(&user))
        .set_json(json!({ "completed": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let task: Value = test::read_body_json(resp).await;
    assert_eq!(task["completed"], true);
    assert_eq!(task["name"], "Eggs");
    assert_eq!(task["description"], "buy Eggs");
    assert_eq!(task["dueDate"], "2026-11-01");
    assert_eq!(task["sortOrder"], 2);

    let req = test::TestRequest::patch()
        .uri(&uri)
        .cookie(ctx.cookie_for(&user))
        .set_json(json!({ "dueDate": null, "name": "Free-range eggs" }))
        .to_request();
    let task: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(task["dueDate"], Value::Null);
    assert_eq!(task["name"], "Free-range eggs");
    assert_eq!(task["completed"], true);
    assert_eq!(task["sortOrder"], 2);
}

#[actix_rt::test]
async fn test_patch_rejections() {
    let ctx = TestContext::new();
    let alice = ctx.seed_user("alice").await;
    let bob = ctx.seed_user("bob").await;
    let todo = ctx.store.create_todo(alice.id, "Groceries").await.unwrap();
    let task = ctx
        .store
        .create_task(
            alice.id,
            todo.id,
            NewTask {
                name: "Milk".to_string(),
                description: String::new(),
                completed: false,
                due_date: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
    let app = init_app(ctx.state.clone()).await;
    let uri = format!("/todos/{}/tasks/{}", todo.id, task.id);

    let cases = [
        (json!({}), StatusCode::BAD_REQUEST),
        (json!({ "name": null }), StatusCode::BAD_REQUEST),
        (json!({ "completed": null }), StatusCode::BAD_REQUEST),
        (json!({ "name": "" }), StatusCode::BAD_REQUEST),
        (json!({ "completed": "yes" }), StatusCode::BAD_REQUEST),
    ];
    for (body, status) in cases {
        let req = test::TestRequest::patch()
            .uri(&uri)
            .cookie(ctx.cookie_for(&alice))
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), status, "{}", body);
    }

    let req = test::TestRequest::patch()
        .uri(&uri)
        .cookie(ctx.cookie_for(&bob))
        .set_json(json!({ "completed": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::patch()
        .uri(&format!("/todos/{}/tasks/{}", todo.id, Uuid::new_v4()))
        .cookie(ctx.cookie_for(&alice))
        .set_json(json!({ "completed": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let stored = ctx
        .store
        .get_task(alice.id, todo.id, task.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "Milk");
    assert!(!stored.completed);
}

#[actix_rt::test]
async fn test_foreign_delete_leaves_tasks_alone() {
    let ctx = TestContext::new();
    let alice = ctx.seed_user("alice").await;
    let bob = ctx.seed_user("bob").await;
    let todo = ctx.store.create_todo(alice.id, "Groceries").await.unwrap();
    let task = ctx
        .store
        .create_task(
            alice.id,
            todo.id,
            NewTask {
                name: "Milk".to_string(),
                description: String::new(),
                completed: false,
                due_date: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
    let app = init_app(ctx.state.clone()).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/todos/{}/tasks/{}", todo.id, task.id))
        .cookie(ctx.cookie_for(&bob))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let remaining = ctx.store.list_tasks(alice.id, todo.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].sort_order, 1);
}
