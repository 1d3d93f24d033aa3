//! Work center endpoints.

use axum::{
    Json, Router,
    extract::State,
    http::Method,
    routing::{get, put},
};
use fichajes_common::{AppError, AppResult};
use fichajes_core::domain::center::format_label_for_save;
use serde_json::Value;

use crate::{
    extractors::{DolApiKey, ErpId, MaybeDolApiKey},
    middleware::AppState,
};

const CENTERS_PATH: &str = "/fichajestrabajadoresapi/centers";

/// Turn an `is_project` flag into the label prefix the ERP stores.
fn apply_project_flag(body: &mut Value) {
    let Some(object) = body.as_object_mut() else {
        return;
    };
    let Some(project) = object.remove("is_project").and_then(|v| v.as_bool()) else {
        return;
    };
    if let Some(label) = object.get("label").and_then(Value::as_str) {
        let label = format_label_for_save(label, project);
        object.insert("label".to_string(), Value::String(label));
    }
}

/// Listing is also used by the registration form, before the user has a
/// token, so it falls back to the server key.
async fn list(
    MaybeDolApiKey(api_key): MaybeDolApiKey,
    State(state): State<AppState>,
) -> AppResult<Json<Value>> {
    let api_key = api_key
        .or_else(|| state.dolibarr.admin_api_key().map(str::to_string))
        .ok_or(AppError::Unauthorized)?;

    let data = state
        .dolibarr
        .get_json(CENTERS_PATH, &api_key, &[], "Error al obtener centros")
        .await?;
    Ok(Json(data))
}

async fn create(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    Json(mut body): Json<Value>,
) -> AppResult<Json<Value>> {
    apply_project_flag(&mut body);
    let data = state
        .dolibarr
        .send_json(Method::POST, CENTERS_PATH, &api_key, &body, "Error al crear centro")
        .await?;
    Ok(Json(data))
}

async fn update(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    ErpId(id): ErpId,
    Json(mut body): Json<Value>,
) -> AppResult<Json<Value>> {
    apply_project_flag(&mut body);
    let data = state
        .dolibarr
        .send_json(
            Method::PUT,
            &format!("{CENTERS_PATH}/{id}"),
            &api_key,
            &body,
            "Error al actualizar centro",
        )
        .await?;
    Ok(Json(data))
}

async fn delete(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    ErpId(id): ErpId,
) -> AppResult<Json<Value>> {
    let data = state
        .dolibarr
        .send(Method::DELETE, &format!("{CENTERS_PATH}/{id}"), &api_key, &[], None)
        .await?
        .ok_json("Error al eliminar centro")?;
    Ok(Json(data))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", put(update).delete(delete))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_project_flag_sets_prefix() {
        let mut body = json!({"label": "Obra Norte", "is_project": true, "radius": 50});
        apply_project_flag(&mut body);
        assert_eq!(body, json!({"label": "[PROYECTO] Obra Norte", "radius": 50}));

        let mut body = json!({"label": "[PROYECTO] Obra Norte", "is_project": false});
        apply_project_flag(&mut body);
        assert_eq!(body, json!({"label": "Obra Norte"}));
    }

    #[test]
    fn test_body_without_flag_is_untouched() {
        let mut body = json!({"label": "[PROYECTO] Obra"});
        apply_project_flag(&mut body);
        assert_eq!(body, json!({"label": "[PROYECTO] Obra"}));
    }
}
