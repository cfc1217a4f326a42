use std::time::Duration;

use serde_json::json;

use crate::common::{FakeGenerator, ImageReply, PNG_BYTES, TestApp, routes};

mod image_cache {
    use super::*;

    #[tokio::test]
    async fn miss_generates_and_second_lookup_hits_cache() {
        let app = TestApp::spawn().await;

        let first = app.get(&routes::plant_image("Tulip")).await;
        assert_eq!(first.status, 200);
        assert_eq!(first.body["name"], "tulip");
        assert_eq!(first.body["source"], "generated");
        let url = first.body["imageUrl"].as_str().unwrap().to_string();
        assert!(url.starts_with(&app.url("/uploads/")), "{url}");
        assert!(url.ends_with(".png"));

        let second = app.get(&routes::plant_image("  TULIP ")).await;
        assert_eq!(second.status, 200);
        assert_eq!(second.body["source"], "cache");
        assert_eq!(second.body["imageUrl"], url.as_str());

        assert_eq!(app.generator.image_calls(), 1);
        assert_eq!(app.store.len().await, 1);
    }

    #[tokio::test]
    async fn generated_image_is_served_with_etag() {
        let app = TestApp::spawn().await;
        let res = app.get(&routes::plant_image("banana")).await;
        let url = res.body["imageUrl"].as_str().unwrap().to_string();

        let image = app.get_absolute(&url, None).await;
        assert_eq!(image.status, 200);
        assert_eq!(image.bytes, PNG_BYTES);
        assert_eq!(image.header("content-type"), Some("image/png"));
        assert!(image.header("cache-control").unwrap().contains("immutable"));

        let etag = image.header("etag").unwrap().to_string();
        let revalidated = app.get_absolute(&url, Some(&etag)).await;
        assert_eq!(revalidated.status, 304);
    }

    #[tokio::test]
    async fn existing_record_without_image_is_filled_in_place() {
        let app = TestApp::spawn().await;
        let id = app
            .create_plant(json!({ "name": "Fern", "soil": "peaty" }))
            .await;

        let res = app.get(&routes::plant_image("fern")).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["source"], "generated");

        let record = app.get(&routes::plant(id)).await;
        assert_eq!(record.body["image_url"], res.body["imageUrl"]);
        assert_eq!(record.body["soil"], "peaty");
        assert_eq!(app.store.len().await, 1);
    }

    #[tokio::test]
    async fn missing_or_blank_name_is_rejected() {
        let app = TestApp::spawn().await;

        let missing = app.get("/api/plant").await;
        assert_eq!(missing.status, 400);
        assert_eq!(missing.body["code"], "VALIDATION_ERROR");

        let blank = app.get(&routes::plant_image("   ")).await;
        assert_eq!(blank.status, 400);
        assert_eq!(app.generator.image_calls(), 0);
    }

    #[tokio::test]
    async fn empty_generator_payload_writes_nothing() {
        let app = TestApp::spawn_with(FakeGenerator::new(ImageReply::Empty)).await;

        let res = app.get(&routes::plant_image("cactus")).await;
        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "UPSTREAM_GENERATION_ERROR");
        assert!(app.store.is_empty().await);
    }

    #[tokio::test]
    async fn upstream_failure_is_retryable() {
        let app = TestApp::spawn_with(FakeGenerator::new(ImageReply::Fail)).await;

        for _ in 0..2 {
            let res = app.get(&routes::plant_image("cactus")).await;
            assert_eq!(res.status, 500);
            assert_eq!(res.body["code"], "UPSTREAM_GENERATION_ERROR");
            assert!(!res.text_contains("overloaded"));
        }
        assert_eq!(app.generator.image_calls(), 2);
    }

    #[tokio::test]
    async fn concurrent_first_lookups_converge() {
        let app = TestApp::spawn_with(
            FakeGenerator::new(ImageReply::Png).with_delay(Duration::from_millis(50)),
        )
        .await;

        let responses = futures::future::join_all(
            ["Orchid", "orchid", " ORCHID", "Orchid ", "orchid", "Orchid"]
                .into_iter()
                .map(|name| app.get_owned(routes::plant_image(name))),
        )
        .await;

        let urls: Vec<_> = responses
            .iter()
            .map(|r| {
                assert_eq!(r.status, 200);
                r.body["imageUrl"].as_str().unwrap().to_string()
            })
            .collect();
        assert!(urls.windows(2).all(|w| w[0] == w[1]));

        let list = app.get(routes::PLANTS).await;
        assert_eq!(list.body["plants"].as_array().unwrap().len(), 1);
    }
}

mod records {
    use super::*;

    #[tokio::test]
    async fn create_and_read_back() {
        let app = TestApp::spawn().await;
        let id = app
            .create_plant(json!({
                "name": " Monstera ",
                "scientific_name": "Monstera deliciosa",
                "plantType": "climber",
                "seasonalMonths": ["march", "april"],
                "qr_code": "PLANT:monstera"
            }))
            .await;

        let res = app.get(&routes::plant(id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "monstera");
        assert_eq!(res.body["scientific_name"], "Monstera deliciosa");
        assert_eq!(res.body["plant_type"], "climber");
        assert_eq!(res.body["seasonal_months"], json!(["march", "april"]));
        assert_eq!(res.body["qr_code"], "PLANT:monstera");
        assert!(res.body["image_url"].is_null());
        assert!(res.body["created_at"].is_string());
    }

    #[tokio::test]
    async fn create_requires_name() {
        let app = TestApp::spawn().await;

        let res = app.post(routes::PLANTS, &json!({ "soil": "loam" })).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn duplicate_normalized_name_conflicts() {
        let app = TestApp::spawn().await;
        app.create_plant(json!({ "name": "Rose" })).await;

        let res = app.post(routes::PLANTS, &json!({ "name": "  rose" })).await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let app = TestApp::spawn().await;
        app.create_plant(json!({ "name": "aloe" })).await;
        app.create_plant(json!({ "name": "basil" })).await;
        app.create_plant(json!({ "name": "chive" })).await;

        let res = app.get(routes::PLANTS).await;
        let names: Vec<_> = res.body["plants"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["chive", "basil", "aloe"]);
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids() {
        let app = TestApp::spawn().await;

        let missing = app.get(&routes::plant(999)).await;
        assert_eq!(missing.status, 404);
        assert_eq!(missing.body["code"], "NOT_FOUND");

        let malformed = app.get("/api/plant/abc").await;
        assert_eq!(malformed.status, 400);
        assert_eq!(malformed.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn patch_updates_fields_and_renames() {
        let app = TestApp::spawn().await;
        let id = app.create_plant(json!({ "name": "fig" })).await;

        let res = app
            .patch(
                &routes::plant(id),
                &json!({ "name": "Weeping Fig", "watering": "weekly", "seasonal_months": ["june"] }),
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "weeping fig");
        assert_eq!(res.body["watering"], "weekly");
        assert_eq!(res.body["seasonal_months"], json!(["june"]));

        let cached = app.get(&routes::plant_image("weeping fig")).await;
        assert_eq!(cached.body["source"], "generated");
        assert_eq!(app.store.len().await, 1);
    }

    #[tokio::test]
    async fn patch_cannot_clear_image_or_steal_a_name() {
        let app = TestApp::spawn().await;
        app.get(&routes::plant_image("lily")).await;
        let id = app.create_plant(json!({ "name": "lotus" })).await;

        let cleared = app.patch(&routes::plant(id), &json!({ "image_url": "" })).await;
        assert_eq!(cleared.status, 400);

        let renamed = app.patch(&routes::plant(id), &json!({ "name": "LILY" })).await;
        assert_eq!(renamed.status, 409);
        assert_eq!(renamed.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn empty_patch_returns_record_unchanged() {
        let app = TestApp::spawn().await;
        let id = app.create_plant(json!({ "name": "sage" })).await;
        let before = app.get(&routes::plant(id)).await;

        let res = app.patch(&routes::plant(id), &json!({})).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body, before.body);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let app = TestApp::spawn().await;
        let id = app.create_plant(json!({ "name": "mint" })).await;

        for _ in 0..2 {
            let res = app.delete(&routes::plant(id)).await;
            assert_eq!(res.status, 200);
            assert_eq!(res.body["success"], true);
        }
        assert_eq!(app.get(&routes::plant(id)).await.status, 404);
    }
}
