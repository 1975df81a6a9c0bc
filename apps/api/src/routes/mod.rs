pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::state::AppState;
use crate::{fonts, layout, presets, roster};

/// Headroom over the font size limit for multipart framing.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_font_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // Rendering
        .route("/api/v1/render", post(layout::handlers::handle_render))
        // Presets
        .route("/api/v1/presets", get(presets::handlers::handle_list_presets))
        .route(
            "/api/v1/presets/:id",
            put(presets::handlers::handle_upsert_preset)
                .delete(presets::handlers::handle_delete_preset),
        )
        // Fonts
        .route(
            "/api/v1/fonts",
            get(fonts::handlers::handle_list_fonts)
                .post(fonts::handlers::handle_upload_font)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/v1/fonts/:file_name",
            delete(fonts::handlers::handle_delete_font),
        )
        .route("/fonts/:file_name", get(fonts::handlers::handle_serve_font))
        // Roster
        .route(
            "/api/v1/records/import",
            post(roster::handlers::handle_import_records),
        )
        .route(
            "/api/v1/records/export",
            post(roster::handlers::handle_export_records),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(AppState::in_memory(Config::in_memory()))
    }

    async fn body_json(res: Response) -> Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
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

    fn font_upload(file_name: &str, data: &str) -> Request<Body> {
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"font\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             {data}\r\n\
             --{boundary}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/api/v1/fonts")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_service() {
        let res = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["service"], "badge-api");
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn render_print_keeps_record_order() {
        let req = json_request(
            "POST",
            "/api/v1/render",
            json!({
                "records": [
                    { "id": "r1", "chineseName": "张伟" },
                    { "id": "r2", "chineseName": "李娜" }
                ],
                "config": { "rotateForPrint": true, "globalSpacingPt": "oops" },
                "target": "print"
            }),
        );
        let res = app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["target"], "print");
        assert_eq!(body["provisional"], false);
        assert_eq!(body["pages"][0]["recordId"], "r1");
        assert_eq!(body["pages"][1]["recordId"], "r2");
        assert_eq!(body["pages"][0]["canvas"]["fitScale"], 1.0);
    }

    #[tokio::test]
    async fn render_screen_wraps_pages_in_preview_blocks() {
        let req = json_request(
            "POST",
            "/api/v1/render",
            json!({
                "records": [{ "id": "r1" }],
                "config": { "previewScale": 5 },
                "target": "screen"
            }),
        );
        let body = body_json(app().oneshot(req).await.unwrap()).await;
        assert_eq!(body["target"], "screen");
        assert_eq!(body["pages"][0]["block"]["previewScale"], 1.0);
    }

    #[tokio::test]
    async fn malformed_record_renders_blank_without_failing_the_batch() {
        let req = json_request(
            "POST",
            "/api/v1/render",
            json!({
                "records": [
                    { "id": "r1", "chineseName": "张三" },
                    { "id": "r2", "chineseName": null, "englishName": 42 },
                    "not a record",
                    { "id": "r4", "chineseName": "李四" }
                ]
            }),
        );
        let res = app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        let pages = body["pages"].as_array().unwrap();
        assert_eq!(pages.len(), 4);
        assert_eq!(pages[0]["recordId"], "r1");
        assert_eq!(pages[1]["recordId"], "r2");
        assert_eq!(pages[3]["recordId"], "r4");

        let fields = &pages[1]["canvas"]["faces"]["front"]["fields"];
        assert_eq!(fields[0]["text"], "");
        assert_eq!(fields[1]["text"], "42");
    }

    #[tokio::test]
    async fn unreadable_body_uses_the_error_envelope() {
        let req = Request::post("/api/v1/render")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{ \"records\": "))
            .unwrap();
        let res = app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_json(res).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["retryable"], false);

        let req = Request::post("/api/v1/records/export")
            .body(Body::from("[]"))
            .unwrap();
        let res = app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unloaded_custom_font_makes_render_provisional() {
        let app = app();
        let res = app
            .clone()
            .oneshot(font_upload("Brand.woff2", "glyphs"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let config = json!({ "chineseName": { "fontFamily": "Brand" } });
        let pending = json_request(
            "POST",
            "/api/v1/render",
            json!({ "records": [{ "chineseName": "张伟" }], "config": config, "loadedFonts": [] }),
        );
        let body = body_json(app.clone().oneshot(pending).await.unwrap()).await;
        assert_eq!(body["provisional"], true);

        let ready = json_request(
            "POST",
            "/api/v1/render",
            json!({ "records": [{ "chineseName": "张伟" }], "config": config, "loadedFonts": ["Brand"] }),
        );
        let body = body_json(app.oneshot(ready).await.unwrap()).await;
        assert_eq!(body["provisional"], false);
    }

    #[tokio::test]
    async fn preset_crud() {
        let app = app();
        let res = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/v1/presets/gala",
                json!({ "name": "Gala", "settings": { "showFoldLine": true } }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app
            .clone()
            .oneshot(Request::get("/api/v1/presets").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(res).await;
        assert_eq!(body[0]["id"], "gala");
        assert_eq!(body[0]["settings"]["showFoldLine"], true);
        // Filled from defaults.
        assert_eq!(body[0]["settings"]["previewScale"], 0.5);

        let del = || {
            Request::delete("/api/v1/presets/gala")
                .body(Body::empty())
                .unwrap()
        };
        let res = app.clone().oneshot(del()).await.unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        let res = app.oneshot(del()).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body = body_json(res).await;
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn preset_with_blank_name_is_rejected() {
        let res = app()
            .oneshot(json_request(
                "PUT",
                "/api/v1/presets/x",
                json!({ "name": " " }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn font_upload_serve_and_delete() {
        let app = app();
        let res = app
            .clone()
            .oneshot(font_upload("Brand Sans.ttf", "glyphs"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let font = body_json(res).await;
        assert_eq!(font["name"], "Brand Sans");
        let file_name = font["fileName"].as_str().unwrap().to_string();
        assert_eq!(font["url"], format!("/fonts/{file_name}"));

        let res = app
            .clone()
            .oneshot(
                Request::get(format!("/fonts/{file_name}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "font/ttf");
        let data = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&data[..], b"glyphs");

        let res = app
            .clone()
            .oneshot(
                Request::delete(format!("/api/v1/fonts/{file_name}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let res = app
            .oneshot(Request::get("/api/v1/fonts").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(res).await, json!([]));
    }

    #[tokio::test]
    async fn unsupported_font_format_is_415() {
        let res = app()
            .oneshot(font_upload("readme.txt", "hello"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body = body_json(res).await;
        assert_eq!(body["error"]["retryable"], false);
    }

    #[tokio::test]
    async fn roster_import_and_export() {
        let res = app()
            .oneshot(
                Request::post("/api/v1/records/import")
                    .header(header::CONTENT_TYPE, "text/csv")
                    .body(Body::from("姓名,Company\n张伟,星辰科技\n,\n"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let records = body_json(res).await;
        assert_eq!(records.as_array().unwrap().len(), 1);
        assert_eq!(records[0]["chineseCompany"], "星辰科技");

        let res = app()
            .oneshot(json_request("POST", "/api/v1/records/export", records))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        let csv = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&csv);
        assert!(text.contains("中文名,英文名,中文单位,英文单位"));
        assert!(text.contains("张伟,,星辰科技,"));
    }

    #[tokio::test]
    async fn import_without_known_columns_is_400() {
        let res = app()
            .oneshot(
                Request::post("/api/v1/records/import")
                    .body(Body::from("Email\na@b.c\n"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
