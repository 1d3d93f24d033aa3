//! API integration tests.
//!
//! The router runs against a local axum app standing in for the ERP, so
//! request translation and response shaping are checked end to end.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use fichajes_api::{AppState, router as api_router};
use fichajes_common::Config;
use fichajes_core::{
    DeliveryError, DolibarrClient, PushNotificationService, PushStore, PushSubscription,
    PushTransport, SubscriptionKeys,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Mutex;
use tower::ServiceExt;

const USER_KEY: &str = "user-key";
const ADMIN_KEY: &str = "admin-key";
const CRON_SECRET: &str = "s3cret";

/// A request seen by the fake ERP.
#[derive(Debug, Clone)]
struct Seen {
    method: Method,
    path: String,
    query: Option<String>,
    api_key: Option<String>,
    body: Option<Value>,
}

type Log = Arc<Mutex<Vec<Seen>>>;

/// Correction rows as the ERP stores them.
fn correction_rows() -> Vec<Value> {
    vec![
        json!({"rowid": 9, "fk_user": 44, "estado": "pendiente", "id_tipo": "1",
               "fecha_evento": 1_739_184_000, "motivo": "Olvido", "usuario_nombre": "Luis"}),
        json!({"rowid": 5, "fk_user": 12, "estado": "pendiente", "id_tipo": "2",
               "fecha_evento": "2026-03-02 15:00:00", "usuario_nombre": "Marta"}),
    ]
}

/// Vacation rows as the ERP stores them, keyed by login.
fn vacation_rows() -> Vec<Value> {
    vec![
        json!({"rowid": 1, "usuario": "ana", "fecha_inicio": "2026-08-03", "fecha_fin": "2026-08-14", "estado": "aprobado"}),
        json!({"rowid": 2, "usuario": "bob", "fecha_inicio": "2026-08-10", "fecha_fin": "2026-08-20", "estado": "pendiente"}),
        json!({"rowid": 3, "usuario": "ana", "fecha_inicio": "2026-09-01", "fecha_fin": "2026-09-04", "estado": "rechazado"}),
    ]
}

/// Keep rows whose `field` matches the query parameter of the same name, when given.
fn filter_rows(rows: Vec<Value>, params: &HashMap<String, String>, field: &str) -> Vec<Value> {
    match params.get(field) {
        Some(wanted) => rows
            .into_iter()
            .filter(|row| match &row[field] {
                Value::String(s) => s == wanted,
                other => other.to_string() == *wanted,
            })
            .collect(),
        None => rows,
    }
}

/// Canned ERP responses keyed by method and path.
async fn fake_erp(
    State(log): State<Log>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let api_key = headers
        .get("DOLAPIKEY")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    log.lock().await.push(Seen {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        api_key,
        body: serde_json::from_slice(&body).ok(),
    });

    let reply = |status: StatusCode, value: Value| (status, axum::Json(value)).into_response();
    let params: HashMap<String, String> = url::form_urlencoded::parse(uri.query().unwrap_or("").as_bytes())
        .into_owned()
        .collect();

    match (method.as_str(), uri.path()) {
        ("GET", "/fichajestrabajadoresapi/fichajes") => reply(
            StatusCode::OK,
            json!([
                {"id": 4, "fk_user": 3, "usuario_nombre": "Ana", "tipo": "salir", "fecha_creacion": "2026-03-02 15:00:00"},
                {"id": 3, "fk_user": 3, "usuario_nombre": "Ana", "tipo": "terminar_pausa", "fecha_creacion": "2026-03-02 10:30:00"},
                {"id": 2, "fk_user": 3, "usuario_nombre": "Ana", "tipo": "iniciar_pausa", "fecha_creacion": "2026-03-02 10:00:00"},
                {"id": 1, "fk_user": 3, "usuario_nombre": "Ana", "tipo": "entrar", "fecha_creacion": "2026-03-02 08:00:00",
                 "latitud": "40.41", "longitud": "-3.70"}
            ]),
        ),
        ("POST", "/fichajestrabajadoresapi/registrarEntrada") => {
            reply(StatusCode::OK, json!({"id": 99}))
        }
        ("POST", "/fichajestrabajadoresapi/registrarSalida") => reply(
            StatusCode::CONFLICT,
            json!({"error": {"code": 409, "message": "No hay entrada abierta"}}),
        ),
        ("GET", "/fichajestrabajadoresapi/jornadas") => {
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
        // The listing filters by owner and state only; an `id` parameter is ignored.
        ("GET", "/fichajestrabajadoresapi/corrections") => {
            let rows = filter_rows(correction_rows(), &params, "fk_user");
            reply(StatusCode::OK, Value::Array(filter_rows(rows, &params, "estado")))
        }
        ("POST", "/fichajestrabajadoresapi/corrections/5/approve") => {
            reply(StatusCode::OK, json!({"success": true}))
        }
        ("GET", "/fichajestrabajadoresapi/vacaciones") => reply(
            StatusCode::OK,
            Value::Array(filter_rows(vacation_rows(), &params, "usuario")),
        ),
        ("GET", "/fichajestrabajadoresapi/vacaciones/7") => reply(
            StatusCode::OK,
            json!({"rowid": 7, "usuario": "ana", "fecha_inicio": "2026-10-05", "fecha_fin": "2026-10-09"}),
        ),
        ("POST", "/fichajestrabajadoresapi/vacaciones/7/aprobar") => {
            (StatusCode::OK, "").into_response()
        }
        ("GET", "/setupempresaapi") => (StatusCode::NOT_FOUND, "").into_response(),
        ("GET", "/setupempresa") => reply(StatusCode::OK, json!({"name": "Acme"})),
        ("POST", "/setupusuariosapi/crearUsuario") => reply(StatusCode::OK, json!(55)),
        ("POST", "/fichajestrabajadoresapi/users/55/config") => {
            reply(StatusCode::OK, json!({"success": true}))
        }
        ("GET", "/users") => match params.get("sqlfilters").map(String::as_str) {
            Some("(t.login:=:'ana')") => reply(StatusCode::OK, json!([{"id": "3", "login": "ana"}])),
            Some("(t.statut:=:1)") | None => reply(
                StatusCode::OK,
                json!([{"id": "3", "login": "ana"}, {"id": "4", "login": "bob"}]),
            ),
            Some(_) => reply(StatusCode::NOT_FOUND, json!({"error": {"code": 404, "message": "No user found"}})),
        },
        ("GET", "/fichajestrabajadoresapi/centers") => {
            reply(StatusCode::OK, json!([{"rowid": "1", "label": "Oficina"}]))
        }
        _ => reply(StatusCode::NOT_FOUND, json!({"error": {"code": 404, "message": "Not found"}})),
    }
}

/// Records delivered payloads and the endpoints they went to.
#[derive(Default)]
struct CapturingTransport {
    delivered: Mutex<Vec<Value>>,
    endpoints: Mutex<Vec<String>>,
}

#[async_trait]
impl PushTransport for CapturingTransport {
    async fn deliver(
        &self,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<(), DeliveryError> {
        self.endpoints
            .lock()
            .await
            .push(subscription.endpoint.clone());
        self.delivered
            .lock()
            .await
            .push(serde_json::from_slice(payload).unwrap());
        Ok(())
    }
}

struct TestApp {
    router: Router,
    log: Log,
    transport: Arc<CapturingTransport>,
    store: PushStore,
    _dir: TempDir,
}

impl TestApp {
    async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    async fn start_with(adjust: impl FnOnce(&mut Config)) -> Self {
        let log: Log = Arc::default();
        let erp = Router::new().fallback(fake_erp).with_state(log.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, erp).await.unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::with_api_url(format!("http://{addr}"));
        config.dolibarr.admin_api_key = Some(ADMIN_KEY.to_string());
        config.storage.data_dir = dir.path().to_path_buf();
        config.cron.secret = CRON_SECRET.to_string();
        config.features.logout_after_clock = true;
        adjust(&mut config);

        let store = PushStore::new(dir.path());
        let transport = Arc::new(CapturingTransport::default());
        let push = PushNotificationService::with_transport(
            store.clone(),
            transport.clone(),
            Some("BPublicKey".to_string()),
        );
        let dolibarr = DolibarrClient::new(&config.dolibarr).unwrap();
        let state = AppState::new(dolibarr, push, &config).unwrap();

        Self {
            router: Router::new().nest("/api", api_router()).with_state(state),
            log,
            transport,
            store,
            _dir: dir,
        }
    }

    async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn seen(&self, path: &str) -> Vec<Seen> {
        self.log
            .lock()
            .await
            .iter()
            .filter(|s| s.path == path)
            .cloned()
            .collect()
    }

    async fn subscribe(&self, user_id: &str) {
        let subscription = PushSubscription {
            endpoint: format!("https://push.example/{user_id}"),
            keys: SubscriptionKeys {
                p256dh: "p".to_string(),
                auth: "a".to_string(),
            },
        };
        self.store
            .save_subscription(user_id, subscription, None)
            .await
            .unwrap();
    }
}

fn get(uri: &str, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri).method("GET");
    if let Some(key) = api_key {
        builder = builder.header("DOLAPIKEY", key);
    }
    builder.body(Body::empty()).unwrap()
}

fn send(method: &str, uri: &str, api_key: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method(method)
        .header("Content-Type", "application/json");
    if let Some(key) = api_key {
        builder = builder.header("DOLAPIKEY", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_missing_api_key_is_rejected() {
    let app = TestApp::start().await;

    let (status, body) = app.call(get("/api/fichajes", None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "No autorizado");
    assert!(app.log.lock().await.is_empty());
}

#[tokio::test]
async fn test_list_fichajes_forwards_defaults_and_flags_location() {
    let app = TestApp::start().await;

    let (status, body) = app
        .call(get("/api/fichajes?fk_user=3", Some(USER_KEY)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let fichajes = body["fichajes"].as_array().unwrap();
    assert_eq!(fichajes.len(), 4);
    assert_eq!(fichajes[0]["tiene_ubicacion"], false);
    assert_eq!(fichajes[3]["tiene_ubicacion"], true);
    assert_eq!(fichajes[3]["fk_user"], "3");

    let seen = app.seen("/fichajestrabajadoresapi/fichajes").await;
    assert_eq!(seen[0].api_key.as_deref(), Some(USER_KEY));
    assert_eq!(
        seen[0].query.as_deref(),
        Some("sortfield=f.rowid&sortorder=DESC&limit=1000&fk_user=3")
    );
}

#[tokio::test]
async fn test_cycles_are_computed_from_events() {
    let app = TestApp::start().await;

    let (status, body) = app.call(get("/api/fichajes/cycles", Some(USER_KEY))).await;

    assert_eq!(status, StatusCode::OK);
    let cycle = &body["cycles"][0];
    assert_eq!(cycle["duracion_total"], 420);
    assert_eq!(cycle["duracion_pausas"], 30);
    assert_eq!(cycle["duracion_efectiva"], 390);
    assert_eq!(body["state"], "sin_iniciar");
    assert_eq!(body["timeline"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_export_returns_csv() {
    let app = TestApp::start().await;

    let response = app
        .router
        .clone()
        .oneshot(get("/api/fichajes/export", Some(USER_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/csv; charset=utf-8"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(csv.starts_with('\u{feff}'));
    assert!(csv.contains("Ana,2026-03-02,08:00:00,15:00:00,30,390,6.50,"));
}

#[tokio::test]
async fn test_registrar_wraps_request_data() {
    let app = TestApp::start().await;

    let (status, body) = app
        .call(send(
            "POST",
            "/api/fichajes/registrar",
            Some(USER_KEY),
            &json!({"tipo": "entrar", "usuario": "ana", "latitud": 40.4, "longitud": 0}),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "data": {"id": 99}}));

    let seen = app.seen("/fichajestrabajadoresapi/registrarEntrada").await;
    assert_eq!(
        seen[0].body,
        Some(json!({"request_data": {"observaciones": ""}}))
    );
}

#[tokio::test]
async fn test_registrar_relays_erp_errors() {
    let app = TestApp::start().await;

    let (status, body) = app
        .call(send(
            "POST",
            "/api/fichajes/registrar",
            Some(USER_KEY),
            &json!({"tipo": "salir"}),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "No hay entrada abierta");

    let (status, body) = app
        .call(send(
            "POST",
            "/api/fichajes/registrar",
            Some(USER_KEY),
            &json!({"tipo": "descanso"}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Tipo inválido");
}

#[tokio::test]
async fn test_jornadas_not_found_is_empty_list() {
    let app = TestApp::start().await;

    let (status, body) = app
        .call(get("/api/jornadas?user_id=3", Some(USER_KEY)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_unknown_erp_resource_keeps_status_and_fallback() {
    let app = TestApp::start().await;

    let (status, body) = app.call(get("/api/users/999", Some(USER_KEY))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Error al obtener usuario");
    assert_eq!(body["details"], "Not found");
    assert_eq!(body["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn test_path_ids_stay_in_one_segment() {
    let app = TestApp::start().await;

    let (status, _) = app.call(get("/api/users/1%3Fx=y", Some(USER_KEY))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let seen = app.seen("/users/1%3Fx%3Dy").await;
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].query, None);
}

#[tokio::test]
async fn test_users_listing_filters_active() {
    let app = TestApp::start().await;

    let (status, _) = app.call(get("/api/users", Some(USER_KEY))).await;

    assert_eq!(status, StatusCode::OK);
    let seen = app.seen("/users").await;
    assert_eq!(
        seen[0].query.as_deref(),
        Some("limit=100&sqlfilters=%28t.statut%3A%3D%3A1%29")
    );
}

#[tokio::test]
async fn test_approving_correction_notifies_owner() {
    let app = TestApp::start().await;
    app.subscribe("12").await;
    app.subscribe("44").await;

    let (status, body) = app
        .call(send("POST", "/api/corrections/5/approve", Some(USER_KEY), &json!({})))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    // Correction 5 is the second row of the listing and belongs to user 12.
    let endpoints = app.transport.endpoints.lock().await.clone();
    assert_eq!(endpoints, vec!["https://push.example/12".to_string()]);
    let delivered = app.transport.delivered.lock().await.clone();
    assert_eq!(delivered[0]["title"], "Solicitud Aprobada");
    assert_eq!(delivered[0]["url"], "/fichajes/historial");
}

#[tokio::test]
async fn test_unknown_correction_notifies_nobody() {
    let app = TestApp::start().await;
    app.subscribe("12").await;
    app.subscribe("44").await;

    let (status, _) = app
        .call(send("POST", "/api/corrections/77/approve", Some(USER_KEY), &json!({})))
        .await;

    // The ERP has no route for correction 77.
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.transport.endpoints.lock().await.is_empty());
}

#[tokio::test]
async fn test_pending_corrections_render_epochs_in_erp_zone() {
    let app = TestApp::start().await;

    let (status, body) = app
        .call(get("/api/fichajes/pending", Some(USER_KEY)))
        .await;

    assert_eq!(status, StatusCode::OK);
    let seen = app.seen("/fichajestrabajadoresapi/corrections").await;
    assert_eq!(seen[0].query.as_deref(), Some("estado=pendiente"));
    assert_eq!(body[0]["id"], 9);
    assert_eq!(body[0]["tipo"], "entrada");
    assert_eq!(body[0]["fecha_creacion_iso"], "2025-02-10 11:40:00");
    assert_eq!(body[1]["tipo"], "salida");
    assert_eq!(body[1]["observaciones"], "Sin observaciones");
}

#[tokio::test]
async fn test_vacation_decision_notifies_in_background() {
    let app = TestApp::start().await;
    app.subscribe("3").await;
    app.subscribe("4").await;

    let (status, body) = app
        .call(send(
            "POST",
            "/api/vacations/7/aprobar?notify=1",
            Some(USER_KEY),
            &json!({"comentario": "ok"}),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let seen = app.seen("/fichajestrabajadoresapi/vacaciones/7/aprobar").await;
    assert_eq!(seen[0].method, Method::POST);
    assert_eq!(seen[0].query.as_deref(), Some("notify=1"));
    assert_eq!(seen[0].body, Some(json!({"comentario": "ok"})));

    let mut delivered = Vec::new();
    for _ in 0..50 {
        delivered = app.transport.delivered.lock().await.clone();
        if !delivered.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0]["title"], "Vacaciones Aprobada");
    assert_eq!(delivered[0]["body"], "Tu solicitud de vacaciones ha sido aprobada.");

    // The row names its requester by login, resolved through the users listing.
    let endpoints = app.transport.endpoints.lock().await.clone();
    assert_eq!(endpoints, vec!["https://push.example/3".to_string()]);
    let lookups = app.seen("/users").await;
    assert_eq!(
        lookups[0].query.as_deref(),
        Some("sqlfilters=%28t.login%3A%3D%3A%27ana%27%29")
    );
}

#[tokio::test]
async fn test_vacation_errors_use_erp_message() {
    let app = TestApp::start().await;

    let (status, body) = app
        .call(send("DELETE", "/api/vacations/8", Some(USER_KEY), &json!({})))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn test_check_overlap_ignores_rejected() {
    let app = TestApp::start().await;

    let (status, body) = app
        .call(send(
            "POST",
            "/api/vacations/check-overlap",
            Some(USER_KEY),
            &json!({"fecha_inicio": "2026-08-10", "fecha_fin": "2026-08-21", "usuario": "ana"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overlap"], true);
    assert_eq!(body["conflict"]["rowid"], "1");
    assert_eq!(body["working_days"], 10);

    let (_, body) = app
        .call(send(
            "POST",
            "/api/vacations/check-overlap",
            Some(USER_KEY),
            &json!({"fecha_inicio": "2026-09-02", "fecha_fin": "2026-09-03", "usuario": "ana"}),
        ))
        .await;
    assert_eq!(body["overlap"], false);

    let seen = app.seen("/fichajestrabajadoresapi/vacaciones").await;
    assert_eq!(seen[0].query.as_deref(), Some("usuario=ana"));
}

#[tokio::test]
async fn test_check_overlap_is_scoped_to_login() {
    let app = TestApp::start().await;

    // Only bob's pending row covers 2026-08-17..19.
    let (status, body) = app
        .call(send(
            "POST",
            "/api/vacations/check-overlap",
            Some(USER_KEY),
            &json!({"fecha_inicio": "2026-08-17", "fecha_fin": "2026-08-19", "usuario": "ana"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overlap"], false);

    let (_, body) = app
        .call(send(
            "POST",
            "/api/vacations/check-overlap",
            Some(USER_KEY),
            &json!({"fecha_inicio": "2026-08-17", "fecha_fin": "2026-08-19", "usuario": "bob"}),
        ))
        .await;
    assert_eq!(body["overlap"], true);
    assert_eq!(body["conflict"]["rowid"], "2");

    let (status, _) = app
        .call(send(
            "POST",
            "/api/vacations/check-overlap",
            Some(USER_KEY),
            &json!({"fecha_inicio": "2026-08-17", "fecha_fin": "2026-08-19"}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_setupempresa_falls_back_to_legacy_path() {
    let app = TestApp::start().await;

    let (status, body) = app.call(get("/api/setupempresa", Some(USER_KEY))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"name": "Acme"}));
}

#[tokio::test]
async fn test_setupempresa_update_is_validated() {
    let app = TestApp::start().await;

    let (status, body) = app
        .call(send(
            "PUT",
            "/api/setupempresa",
            Some(USER_KEY),
            &json!({"name": "Acme", "email": "nope"}),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(app.seen("/setupempresaapi").await.is_empty());
}

#[tokio::test]
async fn test_register_uses_admin_key_and_assigns_centers() {
    let app = TestApp::start().await;

    let (status, body) = app
        .call(send(
            "POST",
            "/api/register",
            None,
            &json!({
                "firstname": "Ana", "lastname": "López", "login": "ana",
                "password": "secreto", "center_ids": [1, "4"]
            }),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "data": 55}));

    let created = app.seen("/setupusuariosapi/crearUsuario").await;
    assert_eq!(created[0].api_key.as_deref(), Some(ADMIN_KEY));
    assert_eq!(created[0].body.as_ref().unwrap()["employee"], 1);

    let config = app.seen("/fichajestrabajadoresapi/users/55/config").await;
    assert_eq!(
        config[0].body,
        Some(json!({"param_name": "work_centers_ids", "value": "1,4"}))
    );
}

#[tokio::test]
async fn test_register_requires_fields() {
    let app = TestApp::start().await;

    let (status, body) = app
        .call(send("POST", "/api/register", None, &json!({"firstname": "Ana"})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"success": false, "message": "Faltan campos obligatorios"})
    );
}

#[tokio::test]
async fn test_centers_fall_back_to_admin_key() {
    let app = TestApp::start().await;

    let (status, _) = app.call(get("/api/centers", None)).await;

    assert_eq!(status, StatusCode::OK);
    let seen = app.seen("/fichajestrabajadoresapi/centers").await;
    assert_eq!(seen[0].api_key.as_deref(), Some(ADMIN_KEY));
}

#[tokio::test]
async fn test_read_notifications_roundtrip() {
    let app = TestApp::start().await;

    let (status, _) = app.call(get("/api/notifications/read", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(send(
            "POST",
            "/api/notifications/read",
            None,
            &json!({"userId": 3, "notificationIds": ["a", "b", "a"]}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let (_, body) = app.call(get("/api/notifications/read?userId=3", None)).await;
    assert_eq!(body, json!(["a", "b"]));
}

#[tokio::test]
async fn test_web_push_subscribe_and_preferences() {
    let app = TestApp::start().await;

    let request = Request::builder()
        .uri("/api/web-push/subscribe")
        .method("POST")
        .header("Content-Type", "application/json")
        .header("DOLAPIKEY", USER_KEY)
        .header("X-User-Id", "3")
        .body(Body::from(
            json!({"endpoint": "https://push.example/x", "keys": {"p256dh": "p", "auth": "a"}})
                .to_string(),
        ))
        .unwrap();
    let (status, _) = app.call(request).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .call(get("/api/web-push/subscribe?userId=3", Some(USER_KEY)))
        .await;
    assert_eq!(body[0]["endpoint"], "https://push.example/x");

    let (status, _) = app
        .call(send(
            "POST",
            "/api/web-push/preferences",
            Some(USER_KEY),
            &json!({"userId": "3", "cambios": false, "fichajes": "no"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .call(get("/api/web-push/preferences?userId=3", Some(USER_KEY)))
        .await;
    assert_eq!(
        body,
        json!({"fichajes": true, "vacaciones": true, "cambios": false})
    );

    let (_, body) = app.call(get("/api/web-push/public-key", None)).await;
    assert_eq!(body, json!({"available": true, "publicKey": "BPublicKey"}));
}

#[tokio::test]
async fn test_cron_requires_secret() {
    let app = TestApp::start().await;

    let (status, _) = app.call(get("/api/cron/reminders", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/cron/reminders")
        .header("Authorization", format!("Bearer {CRON_SECRET}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.call(request).await;
    // The fake ERP has no shifts, so the sweep checks nothing.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "sent": 0, "checked": 0}));

    let request = Request::builder()
        .uri("/api/cron/reminders")
        .header("Authorization", "Bearer ")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.call(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cron_disabled_without_secret() {
    let app = TestApp::start_with(|config| config.cron.secret = String::new()).await;

    let request = Request::builder()
        .uri("/api/cron/reminders")
        .header("Authorization", "Bearer ")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.call(request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"],
        "Recordatorios deshabilitados: secreto de cron no configurado"
    );
}

#[tokio::test]
async fn test_logout_after_clock_flag() {
    let app = TestApp::start().await;

    let (status, body) = app
        .call(get("/api/config/logout-after-clock", None))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"enabled": true}));
}
