mod common;

use cms_files::AppError;
use cms_files::models::FileRecord;
use common::{Call, MockProbe, setup_service};
use reqwest::StatusCode;
use serde_json::json;

fn status_of(err: AppError) -> StatusCode {
    match err {
        AppError::Api { status, .. } => status,
        other => panic!("expected Api error, got {:?}", other),
    }
}

fn stored(attributes: serde_json::Value) -> FileRecord {
    FileRecord::from_attributes(attributes).unwrap()
}

#[tokio::test]
async fn test_find_hydrates_unwrapped_record() {
    let (files, connection, _) = setup_service(MockProbe::failing());
    connection.respond(
        "GET",
        "files/file/7",
        json!({"data": {"id": 7, "name": "photo.jpg", "path": "photo.jpg", "userid": "3"}}),
    );

    let record = files.find(7).await.unwrap().unwrap();
    assert_eq!(record.id(), Some(7));
    assert_eq!(record.user_id, 3);
    assert_eq!(record.extension().as_deref(), Some(".jpg"));
    assert_eq!(
        connection.calls(),
        vec![Call::Get {
            path: "files/file/7".to_string(),
            unwrap: true
        }]
    );
}

#[tokio::test]
async fn test_find_missing_record() {
    let (files, _, _) = setup_service(MockProbe::failing());

    assert!(files.find(99).await.unwrap().is_none());
    match files.find_or_fail(99).await {
        Err(AppError::NotFound { model, values }) => {
            assert_eq!(model, "File");
            assert_eq!(values, vec!["99".to_string()]);
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_known_width_needs_no_io() {
    let (files, connection, probe) = setup_service(MockProbe::returning(1, 1));
    let mut record = stored(json!({"id": 1, "path": "a.png", "img_width": 640}));

    assert_eq!(files.resolve_image_width(&mut record).await.unwrap(), Some(640));
    assert_eq!(files.resolve_image_width(&mut record).await.unwrap(), Some(640));

    assert_eq!(probe.calls(), 0);
    assert!(connection.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_width_probes_once_and_saves() {
    let (files, connection, probe) = setup_service(MockProbe::returning(640, 480));
    let mut record = stored(json!({"id": 5, "path": "images/a.png"}));

    let width = files.resolve_image_width(&mut record).await.unwrap();
    assert_eq!(width, Some(640));
    assert_eq!(record.width(), Some(640));
    assert_eq!(probe.calls(), 1);
    assert_eq!(
        connection.puts(),
        vec![("files/file/5".to_string(), json!({"img_width": 640}))]
    );

    // Height reuses the memoized probe
    let height = files.resolve_image_height(&mut record).await.unwrap();
    assert_eq!(height, Some(480));
    assert_eq!(probe.calls(), 1);
    assert_eq!(connection.puts().len(), 2);
    assert_eq!(connection.puts()[1].1, json!({"img_height": 480}));
}

#[tokio::test]
async fn test_probe_failure_is_swallowed_and_remembered() {
    let (files, connection, probe) = setup_service(MockProbe::failing());
    let mut record = stored(json!({"id": 5, "path": "docs/readme.txt"}));

    assert_eq!(files.resolve_image_width(&mut record).await.unwrap(), None);
    assert_eq!(files.resolve_image_height(&mut record).await.unwrap(), None);

    assert_eq!(probe.calls(), 1);
    assert!(connection.calls().is_empty());
    assert_eq!(record.image_width(), None);
}

#[tokio::test]
async fn test_record_without_path_is_not_probed() {
    let (files, connection, probe) = setup_service(MockProbe::returning(10, 10));
    let mut record = stored(json!({"id": 5}));

    assert_eq!(files.resolve_image_width(&mut record).await.unwrap(), None);
    assert_eq!(probe.calls(), 0);
    assert!(connection.calls().is_empty());
}

#[tokio::test]
async fn test_resolution_prefers_stored_value() {
    let (files, connection, probe) = setup_service(MockProbe::returning(10, 10));
    let mut record = stored(json!({"id": 5, "path": "a.png", "img_res": "300x200"}));

    assert_eq!(files.resolve_resolution(&mut record).await.unwrap(), "300x200");
    assert_eq!(probe.calls(), 0);
    assert!(connection.calls().is_empty());
}

#[tokio::test]
async fn test_resolution_resolves_missing_dimensions() {
    let (files, connection, probe) = setup_service(MockProbe::returning(800, 600));
    let mut record = stored(json!({"id": 5, "path": "a.png"}));

    assert_eq!(files.resolve_resolution(&mut record).await.unwrap(), "800x600");
    assert_eq!(probe.calls(), 1);
    assert_eq!(connection.puts().len(), 2);
}

#[tokio::test]
async fn test_insert_posts_changes_and_prewarms_resolution() {
    let (files, connection, probe) = setup_service(MockProbe::returning(32, 16));
    connection.respond(
        "POST",
        "files/file/",
        json!({"data": {"id": 42, "name": "logo.png", "path": "logo.png", "folder_id": 2}}),
    );

    let mut record = FileRecord::new("logo.png");
    record.folder_id = Some(2);
    files.save(&mut record).await.unwrap();

    assert_eq!(record.id(), Some(42));
    assert_eq!(record.path(), Some("logo.png"));
    assert_eq!(record.resolution(), "32x16");
    assert_eq!(probe.calls(), 1);

    let calls = connection.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls[0],
        Call::Post {
            path: "files/file/".to_string(),
            body: json!({"name": "logo.png", "folder_id": 2}),
            unwrap: true
        }
    );
    assert_eq!(
        connection.puts(),
        vec![
            ("files/file/42".to_string(), json!({"img_width": 32})),
            ("files/file/42".to_string(), json!({"img_height": 16})),
        ]
    );
}

#[tokio::test]
async fn test_insert_without_path_skips_probe() {
    let (files, connection, probe) = setup_service(MockProbe::returning(32, 16));

    let mut record = FileRecord::new("notes.txt");
    record.description = Some("draft".to_string());
    files.save(&mut record).await.unwrap();

    assert_eq!(record.id(), Some(100));
    assert_eq!(record.description.as_deref(), Some("draft"));
    assert_eq!(probe.calls(), 0);
    assert_eq!(connection.calls().len(), 1);
}

#[tokio::test]
async fn test_update_sends_only_changes() {
    let (files, connection, _) = setup_service(MockProbe::failing());
    let mut record = stored(json!({"id": 9, "name": "a.png", "path": "a.png", "tags": ["x"]}));

    files.save(&mut record).await.unwrap();
    assert!(connection.calls().is_empty());

    record.set_tags("x,y,,");
    record.description = Some("updated".to_string());
    files.save(&mut record).await.unwrap();

    assert_eq!(
        connection.puts(),
        vec![(
            "files/file/9".to_string(),
            json!({"tags": ["x", "y"], "description": "updated"})
        )]
    );

    files.save(&mut record).await.unwrap();
    assert_eq!(connection.puts().len(), 1);
}

#[tokio::test]
async fn test_delete() {
    let (files, connection, _) = setup_service(MockProbe::failing());

    assert!(!files.delete(&FileRecord::new("unsaved")).await.unwrap());
    assert!(connection.calls().is_empty());

    assert!(files.delete(&stored(json!({"id": 12}))).await.unwrap());
    assert_eq!(
        connection.calls(),
        vec![Call::Delete {
            path: "files/file/12".to_string()
        }]
    );
}

#[tokio::test]
async fn test_refresh_keeps_probe_memo() {
    let (files, connection, probe) = setup_service(MockProbe::failing());
    connection.respond(
        "GET",
        "files/file/3",
        json!({"id": 3, "path": "a.png", "description": "server"}),
    );

    let mut record = stored(json!({"id": 3, "path": "a.png"}));
    files.resolve_image_width(&mut record).await.unwrap();
    files.refresh(&mut record).await.unwrap();
    files.resolve_image_width(&mut record).await.unwrap();

    assert_eq!(record.description.as_deref(), Some("server"));
    assert_eq!(probe.calls(), 1);
}

#[tokio::test]
async fn test_route_binding_by_default_field() {
    let (files, connection, _) = setup_service(MockProbe::failing());
    connection.respond(
        "GET",
        "search?relation=file&q=id%3A%2214%22&size=1",
        json!({"data": [{"id": 14, "name": "found.png"}], "total": 1}),
    );

    let record = files.resolve_route_binding("14", None).await.unwrap();
    assert_eq!(record.id(), Some(14));
    assert_eq!(record.name, "found.png");
}

#[tokio::test]
async fn test_route_binding_miss_carries_context() {
    let (files, connection, _) = setup_service(MockProbe::failing());
    connection.respond(
        "GET",
        "search?relation=file&q=name%3A%22ghost.png%22&size=1",
        json!({"data": [], "total": 0}),
    );

    let err = files
        .resolve_route_binding("ghost.png", Some("name"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "No query results for model [File] ghost.png");
}

#[tokio::test]
async fn test_find_only_treats_404_as_missing() {
    let (files, connection, _) = setup_service(MockProbe::failing());
    connection.fail("GET", "files/file/5", StatusCode::INTERNAL_SERVER_ERROR);
    connection.fail("GET", "files/file/6", StatusCode::UNAUTHORIZED);

    assert_eq!(
        status_of(files.find(5).await.unwrap_err()),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        status_of(files.find_or_fail(6).await.unwrap_err()),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_failed_insert_leaves_record_unsaved() {
    let (files, connection, probe) = setup_service(MockProbe::returning(1, 1));
    connection.fail("POST", "files/file/", StatusCode::UNPROCESSABLE_ENTITY);

    let mut record = FileRecord::new("a.png");
    let err = files.save(&mut record).await.unwrap_err();

    assert_eq!(status_of(err), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(record.id(), None);
    assert_eq!(probe.calls(), 0);
}

#[tokio::test]
async fn test_failed_update_keeps_changes_pending() {
    let (files, connection, _) = setup_service(MockProbe::failing());
    connection.fail("PUT", "files/file/9", StatusCode::INTERNAL_SERVER_ERROR);

    let mut record = stored(json!({"id": 9, "name": "a.png"}));
    record.description = Some("edited".to_string());

    let err = files.save(&mut record).await.unwrap_err();
    assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(record.is_dirty());
}

#[tokio::test]
async fn test_failed_dimension_save_propagates() {
    let (files, connection, probe) = setup_service(MockProbe::returning(20, 10));
    connection.fail("PUT", "files/file/9", StatusCode::SERVICE_UNAVAILABLE);

    let mut record = stored(json!({"id": 9, "path": "a.png"}));
    let err = files.resolve_image_width(&mut record).await.unwrap_err();

    assert_eq!(status_of(err), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(probe.calls(), 1);
}

#[tokio::test]
async fn test_failed_delete_propagates() {
    let (files, connection, _) = setup_service(MockProbe::failing());
    connection.fail("DELETE", "files/file/12", StatusCode::FORBIDDEN);

    let err = files.delete(&stored(json!({"id": 12}))).await.unwrap_err();
    assert_eq!(status_of(err), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_insert_response_with_placeholder_dates_hydrates() {
    let (files, connection, _) = setup_service(MockProbe::failing());
    connection.respond(
        "POST",
        "files/file/",
        json!({"data": {"id": 31, "img_o_date": "0000-00-00 00:00:00", "related_entries": ["4"]}}),
    );

    let mut record = FileRecord::new("notes.txt");
    files.save(&mut record).await.unwrap();

    assert_eq!(record.id(), Some(31));
    assert_eq!(record.related_entries, vec![4]);
    assert!(record.img_o_date.is_none());
}
