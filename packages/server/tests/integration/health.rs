use crate::common::{TestApp, routes};

#[tokio::test]
async fn reports_backend_and_generator() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::HEALTH).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["ok"], true);
    assert_eq!(res.body["generator_configured"], true);
    assert_eq!(res.body["storage_backend"], "filesystem");
}

#[tokio::test]
async fn serves_openapi_document() {
    let app = TestApp::spawn().await;

    let res = app.get("/api-docs/openapi.json").await;

    assert_eq!(res.status, 200);
    assert!(res.body["paths"]["/api/plant"].is_object());
    assert!(res.body["paths"]["/suggest"].is_object());
}
