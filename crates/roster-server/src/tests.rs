//! End-to-end tests of the assembled router: sessions, Basic auth, page
//! endpoints, QR scanning and media serving, against an in-memory SQLite
//! store and a temporary media directory.

use std::sync::Arc;

use argon2::{Algorithm, Argon2, Params, PasswordHasher, Version, password_hash::SaltString};
use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rand_core::OsRng;
use roster_core::{artifact::ArtifactRenderer, blob::Upload, form::FormData, record::RecordFields};
use roster_image::QrRenderer;
use roster_store_sqlite::SqliteStore;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt as _;

use crate::{
  AppRegistry, AppState, ServerConfig, auth::AuthConfig, handlers::scan, media::FsBlobStore,
  router,
};

// ─── Fixtures ────────────────────────────────────────────────────────────────

const USER: &str = "admin";
const PASSWORD: &str = "secret";
const BOUNDARY: &str = "roster-server-boundary";

struct Harness {
  app:      Router,
  registry: Arc<AppRegistry<SqliteStore>>,
  media:    TempDir,
}

fn cheap_hash(password: &str) -> String {
  let params = Params::new(8, 1, 1, None).unwrap();
  let salt = SaltString::generate(&mut OsRng);
  Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    .hash_password(password.as_bytes(), &salt)
    .unwrap()
    .to_string()
}

async fn harness() -> Harness {
  let media = tempfile::tempdir().unwrap();
  let store = SqliteStore::open_in_memory().await.unwrap();
  let registry = Arc::new(AppRegistry::new(store, FsBlobStore::new(media.path()), QrRenderer));
  let password_hash = cheap_hash(PASSWORD);

  let config = ServerConfig {
    host:               "127.0.0.1".into(),
    port:               0,
    store_path:         ":memory:".into(),
    media_dir:          media.path().to_path_buf(),
    auth_username:      USER.into(),
    auth_password_hash: password_hash.clone(),
    secure_cookies:     false,
  };
  let state = AppState {
    registry: registry.clone(),
    config:   Arc::new(config),
    auth:     Arc::new(AuthConfig { username: USER.into(), password_hash }),
  };

  Harness { app: router(state), registry, media }
}

fn basic() -> String { format!("Basic {}", B64.encode(format!("{USER}:{PASSWORD}"))) }

fn form_fields(name: &str, roll_no: &str, department: &str) -> Vec<(String, String)> {
  [
    ("role", "student"),
    ("department", department),
    ("student_grade", "fsc 1st year"),
    ("student_name", name),
    ("father_name", "Test Father"),
    ("dob", "2000-01-01"),
    ("contact", "1234567890"),
    ("roll_no", roll_no),
    ("session", "2024-2025"),
    ("email", "test@example.com"),
    ("address", "123 Test Street"),
    ("gender", "Male"),
    ("emergency_contact", "0987654321"),
    ("blood_group", "O+"),
    ("id_card_number", "ID-001"),
  ]
  .into_iter()
  .map(|(k, v)| (k.to_owned(), v.to_owned()))
  .collect()
}

fn photo() -> Vec<u8> { QrRenderer.render("a photo").unwrap() }

/// Insert a record directly through the registry.
async fn seed(h: &Harness, name: &str, roll_no: &str, department: &str) -> Value {
  let form: FormData = form_fields(name, roll_no, department).into_iter().collect();
  let fields = RecordFields::from_form(&form).unwrap();
  let upload = Upload {
    file_name:  "me.png".into(),
    media_type: "image/png".into(),
    bytes:      photo(),
  };
  let record = h.registry.create(fields, Some(upload)).await.unwrap();
  serde_json::to_value(record).unwrap()
}

fn multipart(uri: &str, fields: &[(String, String)], photo: Option<&[u8]>) -> Request<Body> {
  let mut body = Vec::new();
  for (name, value) in fields {
    body.extend_from_slice(
      format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
      )
      .as_bytes(),
    );
  }
  if let Some(bytes) = photo {
    body.extend_from_slice(
      format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; \
         filename=\"me.png\"\r\nContent-Type: image/png\r\n\r\n"
      )
      .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
  }
  body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

  Request::builder()
    .method("POST")
    .uri(uri)
    .header(header::AUTHORIZATION, basic())
    .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
    .body(Body::from(body))
    .unwrap()
}

fn authed(method: &str, uri: &str) -> Request<Body> {
  Request::builder()
    .method(method)
    .uri(uri)
    .header(header::AUTHORIZATION, basic())
    .body(Body::empty())
    .unwrap()
}

fn scan_request(body: &str) -> Request<Body> {
  Request::builder()
    .method("POST")
    .uri("/process_qr/")
    .header(header::AUTHORIZATION, basic())
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(body.to_owned()))
    .unwrap()
}

fn login_request(password: &str, next: &str) -> Request<Body> {
  Request::builder()
    .method("POST")
    .uri("/login/")
    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
    .body(Body::from(format!("username={USER}&password={password}&next={next}")))
    .unwrap()
}

struct Reply {
  status:  StatusCode,
  headers: axum::http::HeaderMap,
  bytes:   Vec<u8>,
}

impl Reply {
  fn json(&self) -> Value { serde_json::from_slice(&self.bytes).unwrap() }

  fn text(&self) -> String { String::from_utf8(self.bytes.clone()).unwrap() }

  fn location(&self) -> &str { self.headers[header::LOCATION].to_str().unwrap() }
}

async fn send(app: &Router, req: Request<Body>) -> Reply {
  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let headers = resp.headers().clone();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec();
  Reply { status, headers, bytes }
}

fn decode_qr(png: &[u8]) -> String {
  let img = image::load_from_memory(png).unwrap().to_luma8();
  let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
    img.width() as usize,
    img.height() as usize,
    |x, y| img.get_pixel(x as u32, y as u32)[0],
  );
  let grids = prepared.detect_grids();
  let (_, content) = grids[0].decode().unwrap();
  content
}

// ─── Authentication ──────────────────────────────────────────────────────────

#[tokio::test]
async fn anonymous_pages_redirect_and_api_is_401() {
  let h = harness().await;

  let get = |uri: &str| Request::builder().uri(uri).body(Body::empty()).unwrap();

  let page = send(&h.app, get("/dashboard/?x=1")).await;
  assert_eq!(page.status, StatusCode::FOUND);
  assert_eq!(page.location(), "/login/?next=/dashboard/%3Fx%3D1");

  let media = send(&h.app, get("/media/images/me.png")).await;
  assert_eq!(media.status, StatusCode::FOUND);

  let api = send(&h.app, get("/api/students/")).await;
  assert_eq!(api.status, StatusCode::UNAUTHORIZED);
  assert!(api.headers.contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn login_form_carries_escaped_next() {
  let h = harness().await;
  let req = Request::builder()
    .uri("/login/?next=/home/%22%3E")
    .body(Body::empty())
    .unwrap();
  let reply = send(&h.app, req).await;

  assert_eq!(reply.status, StatusCode::OK);
  assert!(reply.text().contains(r#"value="/home/&quot;&gt;""#));
}

#[tokio::test]
async fn session_login_and_logout() {
  let h = harness().await;

  let login = send(&h.app, login_request(PASSWORD, "%2Fdashboard%2F")).await;
  assert_eq!(login.status, StatusCode::SEE_OTHER);
  assert_eq!(login.location(), "/dashboard/");
  let cookie = login.headers[header::SET_COOKIE]
    .to_str()
    .unwrap()
    .split(';')
    .next()
    .unwrap()
    .to_owned();
  assert!(cookie.starts_with("id="));

  let with_cookie = |method: &str, uri: &str| {
    Request::builder()
      .method(method)
      .uri(uri)
      .header(header::COOKIE, &cookie)
      .body(Body::empty())
      .unwrap()
  };

  let home = send(&h.app, with_cookie("GET", "/home/")).await;
  assert_eq!(home.status, StatusCode::OK);

  let logout = send(&h.app, with_cookie("POST", "/logout/")).await;
  assert_eq!(logout.status, StatusCode::SEE_OTHER);
  assert_eq!(logout.location(), "/login/");

  let after = send(&h.app, with_cookie("GET", "/home/")).await;
  assert_eq!(after.status, StatusCode::FOUND);
}

#[tokio::test]
async fn failed_login_is_401_and_offsite_next_is_ignored() {
  let h = harness().await;

  let wrong = send(&h.app, login_request("nope", "%2Fhome%2F")).await;
  assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
  assert!(!wrong.headers.contains_key(header::SET_COOKIE));

  let offsite = send(&h.app, login_request(PASSWORD, "%2F%2Fevil.example%2F")).await;
  assert_eq!(offsite.status, StatusCode::SEE_OTHER);
  assert_eq!(offsite.location(), "/home/");
}

#[tokio::test]
async fn login_without_password_is_a_json_400() {
  let h = harness().await;
  let req = Request::builder()
    .method("POST")
    .uri("/login/")
    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
    .body(Body::from(format!("username={USER}")))
    .unwrap();

  let reply = send(&h.app, req).await;
  assert_eq!(reply.status, StatusCode::BAD_REQUEST);
  assert!(reply.json()["error"].as_str().unwrap().contains("password"));
}

#[tokio::test]
async fn root_redirects_home() {
  let h = harness().await;
  let reply = send(&h.app, authed("GET", "/")).await;
  assert_eq!(reply.status, StatusCode::SEE_OTHER);
  assert_eq!(reply.location(), "/home/");
}

// ─── Record pages ────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_user_writes_decodable_qr_and_serves_it() {
  let h = harness().await;
  let photo = photo();
  let req = multipart("/add-user/", &form_fields("Test Student", "CS-2024-001", "computer"), Some(&photo));
  let reply = send(&h.app, req).await;
  assert_eq!(reply.status, StatusCode::SEE_OTHER);
  assert_eq!(reply.location(), "/home/");

  let on_disk = std::fs::read(h.media.path().join("qrcodes/Test_Student_qr.png")).unwrap();
  assert_eq!(decode_qr(&on_disk), "CS-2024-001");

  let served = send(&h.app, authed("GET", "/media/qrcodes/Test_Student_qr.png")).await;
  assert_eq!(served.status, StatusCode::OK);
  assert_eq!(served.headers[header::CONTENT_TYPE], "image/png");
  assert_eq!(served.bytes, on_disk);
}

#[tokio::test]
async fn add_user_rejects_invalid_form() {
  let h = harness().await;
  let mut fields = form_fields("A", "R-1", "computer");
  fields.retain(|(k, _)| k != "roll_no");
  let reply = send(&h.app, multipart("/add-user/", &fields, None)).await;

  assert_eq!(reply.status, StatusCode::BAD_REQUEST);
  let body = reply.json();
  assert!(body["errors"]["roll_no"].is_array());
  assert_eq!(std::fs::read_dir(h.media.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn home_paginates_and_searches() {
  let h = harness().await;
  for i in 1..=6 {
    seed(&h, &format!("Student {i}"), &format!("R-{i}"), "computer").await;
  }
  seed(&h, "Zara", "EN-1", "english").await;

  let first = send(&h.app, authed("GET", "/home/")).await.json();
  assert_eq!(first["students"]["items"].as_array().unwrap().len(), 5);
  assert_eq!(first["students"]["items"][0]["student_name"], "Zara");
  assert_eq!(first["students"]["num_pages"], 2);

  let last = send(&h.app, authed("GET", "/home/?page=9999")).await.json();
  assert_eq!(last["students"]["number"], 2);
  assert_eq!(last["students"]["items"].as_array().unwrap().len(), 2);

  let garbage = send(&h.app, authed("GET", "/home/?page=abc")).await.json();
  assert_eq!(garbage["students"]["number"], 1);

  let found = send(&h.app, authed("GET", "/home/?search=%20english%20")).await.json();
  assert_eq!(found["search"], "english");
  assert_eq!(found["students"]["total_items"], 1);
  assert_eq!(found["students"]["items"][0]["roll_no"], "EN-1");
}

#[tokio::test]
async fn details_and_card() {
  let h = harness().await;
  let record = seed(&h, "Test Student", "CS-1", "computer").await;
  let id = record["id"].as_str().unwrap();

  let details = send(&h.app, authed("GET", &format!("/full-details/{id}/"))).await;
  assert_eq!(details.status, StatusCode::OK);
  assert_eq!(details.json()["father_name"], "Test Father");

  let card = send(&h.app, authed("GET", &format!("/generate-card/{id}/"))).await.json();
  assert_eq!(card["student"]["roll_no"], "CS-1");
  assert_eq!(card["photo_url"], "/media/images/me.png");
  assert_eq!(card["qr_code_url"], "/media/qrcodes/Test_Student_qr.png");

  let missing = send(
    &h.app,
    authed("GET", "/full-details/00000000-0000-4000-8000-000000000000/"),
  )
  .await;
  assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_replaces_qr_only_when_roll_changes() {
  let h = harness().await;
  let record = seed(&h, "Test Student", "CS-1", "computer").await;
  let id = record["id"].as_str().unwrap();
  let uri = format!("/update-student/{id}/");
  let old_qr = h.media.path().join(record["qr_code"]["path"].as_str().unwrap());

  let mut fields = form_fields("Test Student", "CS-1", "computer");
  fields.push(("address".into(), "Elsewhere".into()));
  let same = send(&h.app, multipart(&uri, &fields, None)).await;
  assert_eq!(same.status, StatusCode::SEE_OTHER);
  let kept = h.registry.get(id.parse().unwrap()).await.unwrap();
  assert_eq!(kept.qr_code.path, record["qr_code"]["path"].as_str().unwrap());
  assert_eq!(kept.fields.address, "Elsewhere");
  assert!(old_qr.exists());

  let moved = send(&h.app, multipart(&uri, &form_fields("Test Student", "CS-9", "computer"), None)).await;
  assert_eq!(moved.status, StatusCode::SEE_OTHER);
  let updated = h.registry.get(id.parse().unwrap()).await.unwrap();
  assert!(!old_qr.exists());
  let png = std::fs::read(h.media.path().join(&updated.qr_code.path)).unwrap();
  assert_eq!(decode_qr(&png), "CS-9");

  let missing = send(
    &h.app,
    multipart("/update-student/00000000-0000-4000-8000-000000000000/", &fields, None),
  )
  .await;
  assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_confirms_then_removes_files() {
  let h = harness().await;
  let record = seed(&h, "Test Student", "CS-1", "computer").await;
  let id = record["id"].as_str().unwrap();
  let uri = format!("/delete-student/{id}/");

  let confirm = send(&h.app, authed("GET", &uri)).await.json();
  assert_eq!(confirm["student"]["roll_no"], "CS-1");

  let deleted = send(&h.app, authed("POST", &uri)).await;
  assert_eq!(deleted.status, StatusCode::SEE_OTHER);
  assert!(!h.media.path().join("images/me.png").exists());
  assert!(!h.media.path().join("qrcodes/Test_Student_qr.png").exists());

  let again = send(&h.app, authed("POST", &uri)).await;
  assert_eq!(again.status, StatusCode::NOT_FOUND);
}

// ─── QR scanning ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn scan_page_is_served() {
  let h = harness().await;
  let reply = send(&h.app, authed("GET", "/auth/")).await;
  assert_eq!(reply.status, StatusCode::OK);
  assert!(reply.text().contains("/process_qr/"));
}

#[tokio::test]
async fn process_qr_outcomes() {
  let h = harness().await;
  seed(&h, "Test Student", "CS-2024-001", "computer").await;

  let found = send(&h.app, scan_request(r#"{"qr_data":"CS-2024-001"}"#)).await;
  assert_eq!(found.status, StatusCode::OK);
  assert_eq!(
    found.json(),
    serde_json::json!({
      "status": "success",
      "student": { "name": "Test Student", "department": "computer", "roll_no": "CS-2024-001" },
    })
  );

  for body in [r#"{"qr_data":"NOPE"}"#, r#"{}"#] {
    let reply = send(&h.app, scan_request(body)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["message"], scan::NOT_FOUND);
  }

  let malformed = send(&h.app, scan_request("not json")).await;
  assert_eq!(malformed.status, StatusCode::OK);
  assert_eq!(malformed.json()["status"], "error");

  let get = send(&h.app, authed("GET", "/process_qr/")).await;
  assert_eq!(get.status, StatusCode::OK);
  assert_eq!(get.json()["message"], scan::INVALID_METHOD);
}

// ─── Reports ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn export_csv_is_an_attachment() {
  let h = harness().await;
  seed(&h, "Test Student", "CS-1", "computer").await;

  let reply = send(&h.app, authed("GET", "/export-csv/")).await;
  assert_eq!(reply.status, StatusCode::OK);
  assert_eq!(reply.headers[header::CONTENT_TYPE], "text/csv");
  assert_eq!(
    reply.headers[header::CONTENT_DISPOSITION],
    "attachment; filename=\"students.csv\""
  );
  let text = reply.text();
  let lines: Vec<&str> = text.split("\r\n").filter(|l| !l.is_empty()).collect();
  assert_eq!(lines.len(), 2);
  assert!(lines[0].starts_with("Name,Father Name,Roll No"));
  assert!(lines[1].starts_with("Test Student,Test Father,CS-1,computer"));
}

#[tokio::test]
async fn dashboard_counts_groups() {
  let h = harness().await;
  seed(&h, "A", "R-1", "computer").await;
  seed(&h, "B", "R-2", "english").await;
  seed(&h, "C", "R-3", "computer").await;

  let body = send(&h.app, authed("GET", "/dashboard/")).await.json();
  assert_eq!(body["total_students"], 3);
  assert_eq!(body["by_department"][0], serde_json::json!({ "department": "computer", "count": 2 }));
  assert_eq!(body["by_role"], serde_json::json!([{ "role": "student", "count": 3 }]));
}

#[tokio::test]
async fn department_listing() {
  let h = harness().await;
  for i in 1..=11 {
    seed(&h, &format!("S{i}"), &format!("CS-{i}"), "computer").await;
  }
  seed(&h, "E", "EN-1", "english").await;

  let body = send(&h.app, authed("GET", "/department/computer/")).await.json();
  assert_eq!(body["department"], "computer");
  assert_eq!(body["department_label"], "Computer");
  assert_eq!(body["total_count"], 11);
  assert_eq!(body["students"]["items"].as_array().unwrap().len(), 10);

  let second = send(&h.app, authed("GET", "/department/computer/?page=2")).await.json();
  assert_eq!(second["students"]["items"][0]["roll_no"], "CS-1");

  let unknown = send(&h.app, authed("GET", "/department/physics/")).await;
  assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
  assert!(unknown.json()["error"].is_string());
}

#[tokio::test]
async fn api_is_reachable_with_basic_auth() {
  let h = harness().await;
  seed(&h, "A", "R-1", "computer").await;
  let reply = send(&h.app, authed("GET", "/api/students/")).await;
  assert_eq!(reply.status, StatusCode::OK);
  assert_eq!(reply.json().as_array().unwrap().len(), 1);
}
