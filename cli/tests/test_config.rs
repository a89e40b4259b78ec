use crate::TestCli;
use mockito::{Matcher, Mock, Server};
use serde_json::json;

fn bucket_created(server: &mut Server) -> Mock {
    server.mock("POST", "/storage/v1/b").with_body(
        json!({"name": "model_bucket", "location": "ASIA-EAST1", "storageClass": "STANDARD"})
            .to_string(),
    )
}

fn expect_bearer(server: &mut Server, token: &str) -> Mock {
    bucket_created(server)
        .match_query(Matcher::Any)
        .match_header("authorization", format!("Bearer {token}").as_str())
        .expect(1)
        .create()
}

#[test]
fn test_flags_override_configuration_file() {
    let mut server = Server::new();
    let mut configured_storage = Server::new();
    let cli = TestCli::with_config(
        &server,
        json!({
            "project_id": "config-project",
            "location": "europe-west1",
            "endpoints": {
                "storage": configured_storage.url(),
                "aiplatform": server.url(),
                "functions": server.url(),
            }
        }),
    );

    let unused = configured_storage
        .mock("POST", "/storage/v1/b")
        .match_query(Matcher::Any)
        .expect(0)
        .create();
    let created = bucket_created(&mut server)
        .match_query(Matcher::UrlEncoded("project".into(), "flag-project".into()))
        .match_body(Matcher::Json(
            json!({"name": "model_bucket", "location": "asia-east1"}),
        ))
        .expect(1)
        .create();

    let storage_endpoint = server.url();
    cli.run([
        "--project",
        "flag-project",
        "--location",
        "asia-east1",
        "--storage-endpoint",
        storage_endpoint.as_str(),
        "create",
        "bucket",
        "model_bucket",
    ]);

    created.assert();
    unused.assert();
}

#[test]
fn test_configuration_file_applies_without_flags() {
    let mut server = Server::new();
    let cli = TestCli::with_config(
        &server,
        json!({"project_id": "config-project", "location": "europe-west1"}),
    );

    let created = bucket_created(&mut server)
        .match_query(Matcher::UrlEncoded("project".into(), "config-project".into()))
        .match_body(Matcher::PartialJson(json!({"location": "europe-west1"})))
        .expect(1)
        .create();

    cli.run(["create", "bucket", "model_bucket"]);
    created.assert();
}

#[test]
fn test_token_flag_beats_configured_token() {
    let mut server = Server::new();
    let cli = TestCli::with_config(&server, json!({"token": "config-token"}));
    let created = expect_bearer(&mut server, "flag-token");

    cli.output(
        cli.command()
            .env("GOOGLE_OAUTH_ACCESS_TOKEN", "env-token")
            .args(["--token", "flag-token", "create", "bucket", "model_bucket"]),
    );
    created.assert();
}

#[test]
fn test_configured_token_beats_environment() {
    let mut server = Server::new();
    let cli = TestCli::with_config(&server, json!({"token": "config-token"}));
    let created = expect_bearer(&mut server, "config-token");

    cli.output(
        cli.command()
            .env("GOOGLE_OAUTH_ACCESS_TOKEN", "env-token")
            .args(["create", "bucket", "model_bucket"]),
    );
    created.assert();
}

#[test]
fn test_environment_token_used_when_none_configured() {
    let mut server = Server::new();
    let cli = TestCli::with_config(&server, json!({"token": null}));
    let created = expect_bearer(&mut server, "env-token");

    cli.output(
        cli.command()
            .env("GOOGLE_OAUTH_ACCESS_TOKEN", "env-token")
            .args(["create", "bucket", "model_bucket"]),
    );
    created.assert();
}
