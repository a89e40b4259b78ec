use crate::TestCli;
use mockito::{Matcher, Server};
use serde_json::json;

#[test]
fn test_create_bucket_twice_succeeds() {
    let mut server = Server::new();
    let cli = TestCli::new(&server);

    let created = server
        .mock("POST", "/storage/v1/b")
        .match_query(Matcher::UrlEncoded("project".into(), "test-project".into()))
        .match_header("authorization", "Bearer test-token")
        .match_body(Matcher::Json(
            json!({"name": "model_bucket", "location": "us-central1"}),
        ))
        .with_body(
            json!({
                "name": "model_bucket",
                "location": "US-CENTRAL1",
                "storageClass": "STANDARD",
                "timeCreated": "2024-01-20T10:00:00.000Z"
            })
            .to_string(),
        )
        .expect(1)
        .create();

    let output = cli.run(["create", "bucket", "model_bucket"]);
    assert!(output.contains("model_bucket"), "{}", output);
    assert!(output.contains("STANDARD"), "{}", output);
    created.assert();
    created.remove();

    let conflict = server
        .mock("POST", "/storage/v1/b")
        .match_query(Matcher::Any)
        .with_status(409)
        .with_body(
            json!({"error": {
                "code": 409,
                "message": "Your previous request to create the named bucket succeeded and you already own it.",
                "status": "ALREADY_EXISTS"
            }})
            .to_string(),
        )
        .expect(1)
        .create();

    let (output, logs) = cli.run_with_logs(["create", "bucket", "model_bucket"]);
    assert!(output.is_empty(), "{}", output);
    assert!(
        logs.contains("Bucket `model_bucket` already exists"),
        "{}",
        logs
    );
    conflict.assert();
}

#[test]
fn test_create_bucket_json_output() {
    let mut server = Server::new();
    let cli = TestCli::new(&server);

    server
        .mock("POST", "/storage/v1/b")
        .match_query(Matcher::Any)
        .with_body(json!({"name": "model_bucket", "location": "EU"}).to_string())
        .create();

    let output = cli.run(["--output", "json", "create", "bucket", "model_bucket", "--location", "eu"]);
    let bucket: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
    assert_eq!(bucket["name"], "model_bucket");
    assert_eq!(bucket["location"], "EU");
}

#[test]
fn test_create_bucket_with_generated_name() {
    let mut server = Server::new();
    let cli = TestCli::new(&server);

    let created = server
        .mock("POST", "/storage/v1/b")
        .match_query(Matcher::Any)
        .match_body(Matcher::Regex(
            r#""name":"cloud_project_model_storage[1-9]{5}""#.to_owned(),
        ))
        .with_body(json!({"name": "cloud_project_model_storage12345"}).to_string())
        .expect(1)
        .create();

    cli.run(["create", "bucket"]);
    created.assert();
}

#[test]
fn test_create_bucket_permission_denied_fails() {
    let mut server = Server::new();
    let cli = TestCli::new(&server);

    server
        .mock("POST", "/storage/v1/b")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body(
            json!({"error": {"code": 403, "message": "Caller does not have storage.buckets.create access", "status": "PERMISSION_DENIED"}})
                .to_string(),
        )
        .create();

    let output = cli.run_and_error(["create", "bucket", "model_bucket"]);
    assert!(
        output.contains("Caller does not have storage.buckets.create access"),
        "{}",
        output
    );
}

#[test]
fn test_create_bucket_with_invalid_name_fails() {
    let server = Server::new();
    let cli = TestCli::new(&server);

    let output = cli.run_and_error(["create", "bucket", "Model-Bucket"]);
    assert!(output.contains("Invalid bucket name `Model-Bucket`"), "{}", output);
}
