use serde_json::json;

use crate::common::{FakeGenerator, ImageReply, PLACEHOLDER, TestApp, routes};

const SVG_REPLY: &str = r#"```json
{
  "scientific_name": "Musa acuminata",
  "sunlight": "Full sun",
  "watering": "Keep soil moist",
  "soil": "Rich, well-drained",
  "seasonality": "Year-round in the tropics",
  "uses_notes": "Edible fruit",
  "image": "https://upload.wikimedia.org/wikipedia/commons/banana.svg"
}
```"#;

#[tokio::test]
async fn vector_image_is_replaced_and_fields_pass_through() {
    let app =
        TestApp::spawn_with(FakeGenerator::new(ImageReply::Png).with_completion(SVG_REPLY)).await;

    let res = app.post(routes::SUGGEST, &json!({ "plantName": "Banana" })).await;

    assert_eq!(res.status, 200);
    let s = &res.body["suggestions"];
    assert_eq!(s["plant_name"], "Banana");
    assert_eq!(s["scientific_name"], "Musa acuminata");
    assert_eq!(s["watering"], "Keep soil moist");
    assert_eq!(s["image"], PLACEHOLDER);
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn plant_name_is_required() {
    let app = TestApp::spawn().await;

    let res = app.post(routes::SUGGEST, &json!({})).await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unparsable_reply_is_reported() {
    let app = TestApp::spawn_with(
        FakeGenerator::new(ImageReply::Png).with_completion("I think bananas like sun."),
    )
    .await;

    let res = app.post(routes::SUGGEST, &json!({ "plantName": "Banana" })).await;

    assert_eq!(res.status, 500);
    assert_eq!(res.body["code"], "MALFORMED_SUGGESTION");
}

#[tokio::test]
async fn generator_failure_is_upstream_error() {
    let app = TestApp::spawn().await;

    let res = app.post(routes::SUGGEST, &json!({ "plantName": "Banana" })).await;

    assert_eq!(res.status, 500);
    assert_eq!(res.body["code"], "UPSTREAM_GENERATION_ERROR");
}
