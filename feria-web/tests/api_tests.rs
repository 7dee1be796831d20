//! Integration tests for the feria-web HTTP API
//!
//! Each test builds a fresh database in a temp directory and drives the
//! router directly with tower's oneshot, no listening socket needed.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use feria_common::config::{database_path, uploads_path};
use feria_common::db::init::init_database;
use feria_web::{build_router, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: Router,
    db: SqlitePool,
    // Holds the temp directory open for the test's lifetime
    _root: TempDir,
}

async fn spawn_app() -> TestApp {
    let root = TempDir::new().unwrap();
    let db = init_database(&database_path(&root.path().to_path_buf()))
        .await
        .unwrap();
    let uploads = uploads_path(&root.path().to_path_buf());
    std::fs::create_dir_all(&uploads).unwrap();

    let app = build_router(AppState::new(db.clone(), uploads));
    TestApp {
        app,
        db,
        _root: root,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn init_lead(app: &Router, flow: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/leads/init", json!({"flow_type": flow})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    body["lead"]["id"].as_str().unwrap().to_string()
}

async fn save_step(app: &Router, lead_id: &str, key: &str, value: &str) -> axum::response::Response {
    app.clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/leads/{}/step", lead_id),
            json!({"step_key": key, "value": value}),
        ))
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok() {
    let t = spawn_app().await;
    let response = t
        .app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "feria-web");
}

// ---------------------------------------------------------------------------
// Wizard lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn init_rejects_unknown_flow_type() {
    let t = spawn_app().await;
    let response = t
        .app
        .oneshot(json_request("POST", "/leads/init", json!({"flow_type": "auction"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn resume_unknown_lead_is_404() {
    let t = spawn_app().await;
    let response = t
        .app
        .oneshot(
            Request::builder()
                .uri("/leads/no-such-lead/resume")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn full_rent_flow_saves_resumes_and_submits() {
    let t = spawn_app().await;
    let lead_id = init_lead(&t.app, "rent").await;

    for (key, value) in [("zone", "Centro"), ("property_type", "departamento")] {
        let response = save_step(&t.app, &lead_id, key, value).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
    }

    // Cursor lands one past the furthest answered visible step
    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/leads/{}/resume", lead_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["steps"]["zone"], "Centro");
    assert_eq!(body["steps"]["property_type"], "departamento");
    assert_eq!(body["resume_index"], 2);

    let answers = json!({
        "zone": "Centro",
        "property_type": "departamento",
        "budget": "1000-2000",
        "bedrooms": "2",
        "name": "Ana",
        "email": "ana@example.com",
        "phone": "1155551234",
    });
    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/leads/{}/submit", lead_id),
            answers.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["lead"]["zone"], "Centro");
    assert_eq!(body["lead"]["budget_min"], 1000.0);
    assert_eq!(body["lead"]["budget_max"], 2000.0);
    assert_eq!(body["lead"]["bedrooms"], 2);
    assert!(!body["lead"]["submitted_at"].is_null());

    // Second submit loses to the first
    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/leads/{}/submit", lead_id),
            answers,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // So does any further autosave
    let response = save_step(&t.app, &lead_id, "name", "Otra").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn failed_submit_is_422_and_writes_nothing() {
    let t = spawn_app().await;
    let lead_id = init_lead(&t.app, "contact").await;

    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/leads/{}/submit", lead_id),
            json!({"name": "Ana", "message": "Hola, quiero consultar"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["error"]["message"].as_str().unwrap().contains("email"));

    // The rejected submit left no partial field writes: the lead is still
    // an untouched draft, including the fields the answer map did carry
    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/leads/{}/resume", lead_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["lead"]["name"].is_null());
    assert!(body["lead"]["email"].is_null());
    assert!(body["lead"]["submitted_at"].is_null());

    // And a corrected submit still goes through
    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/leads/{}/submit", lead_id),
            json!({
                "name": "Ana",
                "email": "ana@example.com",
                "message": "Hola, quiero consultar",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["lead"]["name"], "Ana");
    assert!(!body["lead"]["submitted_at"].is_null());
}

#[tokio::test]
async fn hidden_step_is_not_required_at_submit() {
    let t = spawn_app().await;
    let lead_id = init_lead(&t.app, "rent").await;

    // "local" hides the bedrooms step, so no bedrooms answer is needed
    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/leads/{}/submit", lead_id),
            json!({
                "zone": "Norte",
                "property_type": "local",
                "budget": "500000",
                "name": "Ana",
                "email": "ana@example.com",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["lead"]["bedrooms"].is_null());
}

#[tokio::test]
async fn step_save_is_idempotent_last_write_wins() {
    let t = spawn_app().await;
    let lead_id = init_lead(&t.app, "contact").await;

    save_step(&t.app, &lead_id, "name", "Ana").await;
    save_step(&t.app, &lead_id, "name", "Ana María").await;

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/leads/{}/resume", lead_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["steps"]["name"], "Ana María");
}

// ---------------------------------------------------------------------------
// Import: multipart preview and commit
// ---------------------------------------------------------------------------

const BOUNDARY: &str = "feriatestboundary";

fn multipart_request(uri: &str, filename: &str, file: &str, extra: &[(&str, &str)]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: text/csv\r\n\r\n{file}\r\n"
    );
    for (name, value) in extra {
        body.push_str(&format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn preview_splits_valid_and_invalid_rows_without_writing() {
    let t = spawn_app().await;
    let csv = "titulo,descripcion,precio,moneda,categoria,zona\n\
               Departamento dos ambientes,Luminoso con balcón al frente,120000,ARS,Inmuebles,Centro\n\
               Casa grande con patio,Tres dormitorios y cochera doble,,,Astronáutica,Centro\n";

    let response = t
        .app
        .clone()
        .oneshot(multipart_request(
            "/publish/listing/import-excel-v2",
            "listado.csv",
            csv,
            &[],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["preview"], true);
    assert_eq!(body["totalRows"], 2);
    assert_eq!(body["validRows"], 1);
    assert_eq!(body["errorRows"], 1);
    assert_eq!(body["previewListings"][0]["title"], "Departamento dos ambientes");
    assert_eq!(body["previewListings"][0]["category_name"], "Inmuebles");
    assert_eq!(body["previewListings"][0]["zone_id"], 1);
    assert!(body["errorsDetails"][0]["errors"][0]
        .as_str()
        .unwrap()
        .contains("Astronáutica"));

    // Preview writes nothing
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listings")
        .fetch_one(&t.db)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn missing_photo_filenames_only_warn() {
    let t = spawn_app().await;
    let csv = "titulo,descripcion,categoria,zona,foto_principal\n\
               Bicicleta rodado 29,Poco uso con cubiertas nuevas,Hogar,Centro,bici.jpg\n";

    let response = t
        .app
        .clone()
        .oneshot(multipart_request(
            "/publish/listing/import-excel-v2",
            "listado.csv",
            csv,
            &[],
        ))
        .await
        .unwrap();
    let body = body_json(response).await;

    assert_eq!(body["validRows"], 1);
    assert!(body["previewListings"][0]["warnings"][0]
        .as_str()
        .unwrap()
        .contains("bici.jpg"));
}

#[tokio::test]
async fn over_fifty_rows_is_rejected() {
    let t = spawn_app().await;
    let mut csv = String::from("titulo,descripcion,categoria,zona\n");
    for i in 0..51 {
        csv.push_str(&format!(
            "Publicación número {i},Descripción suficientemente larga,Hogar,Centro\n"
        ));
    }

    let response = t
        .app
        .clone()
        .oneshot(multipart_request(
            "/publish/listing/import-excel-v2",
            "listado.csv",
            &csv,
            &[],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn one_shot_commit_inserts_valid_rows() {
    let t = spawn_app().await;
    let csv = "titulo,descripcion,precio,categoria,zona\n\
               Notebook 14 pulgadas,En garantía con cargador original,450000,notebooks,Centro\n";

    let response = t
        .app
        .clone()
        .oneshot(multipart_request(
            "/publish/listing/import-excel-v2",
            "listado.csv",
            csv,
            &[
                ("previewOnly", "false"),
                ("defaultEmail", "ventas@example.com"),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["results"][0]["title"], "Notebook 14 pulgadas");

    let (count, email): (i64, Option<String>) =
        sqlx::query_as("SELECT COUNT(*), MAX(email) FROM listings")
            .fetch_one(&t.db)
            .await
            .unwrap();
    assert_eq!(count, 1);
    assert_eq!(email.as_deref(), Some("ventas@example.com"));
}

#[tokio::test]
async fn commit_keeps_good_rows_when_one_row_fails() {
    let t = spawn_app().await;

    let row = |n: usize, zone_id: i64| {
        json!({
            "row_number": n,
            "title": format!("Publicación número {n}"),
            "description": "Descripción suficientemente larga",
            "currency": "ARS",
            "category_id": 3,
            "zone_id": zone_id,
        })
    };
    let body = json!({"rows": [row(1, 1), row(2, 9999), row(3, 2)]});

    let response = t
        .app
        .clone()
        .oneshot(json_request("POST", "/publish/listing/import-commit", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["success"], false);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert_eq!(body["insertErrors"].as_array().unwrap().len(), 1);
    assert_eq!(body["insertErrors"][0]["row_number"], 2);
    assert!(body["insertErrors"][0]["error"]
        .as_str()
        .unwrap()
        .contains("9999"));

    // The failed row did not roll back its neighbors
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listings")
        .fetch_one(&t.db)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn commit_revalidates_rows_before_inserting() {
    let t = spawn_app().await;

    let body = json!({"rows": [{
        "row_number": 1,
        "title": "Ok",
        "description": "corta",
        "currency": "ARS",
        "category_id": 1,
        "zone_id": 1,
    }]});

    let response = t
        .app
        .clone()
        .oneshot(json_request("POST", "/publish/listing/import-commit", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["success"], false);
    assert_eq!(body["validationErrors"].as_array().unwrap().len(), 1);
    assert!(body["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn commit_with_zero_rows_is_400() {
    let t = spawn_app().await;
    let response = t
        .app
        .oneshot(json_request(
            "POST",
            "/publish/listing/import-commit",
            json!({"rows": []}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
