//! Purpose: End-to-end tests for the record API over TCP.
//! Exports: None (integration test module).
//! Role: Validate CRUD semantics, error envelopes, and CORS through the real binary.
//! Invariants: Each test owns a temp database and a loopback server.

mod support;

use serde_json::Value;
use support::{TestResult, TestServer, sample_fields, serial};
use userdesk::api::ErrorKind;

fn status_and_body(result: Result<ureq::Response, ureq::Error>) -> TestResult<(u16, Value)> {
    let resp = match result {
        Ok(resp) => resp,
        Err(ureq::Error::Status(_, resp)) => resp,
        Err(err) => return Err(err.into()),
    };
    let status = resp.status();
    let body: Value = serde_json::from_str(&resp.into_string()?)?;
    Ok((status, body))
}

#[test]
fn create_assigns_distinct_ids_and_get_returns_record() -> TestResult<()> {
    let _serial = serial();
    let temp = tempfile::tempdir()?;
    let server = TestServer::api(&temp.path().join("users.db"))?;
    let client = server.client()?;

    let alice = client.create(&sample_fields("Alice"))?;
    let bob = client.create(&sample_fields("Bob"))?;
    assert_ne!(alice.id, bob.id);
    assert_eq!(alice.fields(), sample_fields("Alice"));

    let fetched = client.get(bob.id)?;
    assert_eq!(fetched, bob);
    Ok(())
}

#[test]
fn list_returns_records_in_id_order_with_paging() -> TestResult<()> {
    let _serial = serial();
    let temp = tempfile::tempdir()?;
    let server = TestServer::api(&temp.path().join("users.db"))?;
    let client = server.client()?;

    assert!(client.list(0, 100)?.is_empty());
    for name in ["Ann", "Ben", "Cid"] {
        client.create(&sample_fields(name))?;
    }

    let names: Vec<String> = client.list(0, 100)?.into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["Ann", "Ben", "Cid"]);

    let page = client.list(1, 1)?;
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].name, "Ben");
    Ok(())
}

#[test]
fn update_replaces_only_the_target_record() -> TestResult<()> {
    let _serial = serial();
    let temp = tempfile::tempdir()?;
    let server = TestServer::api(&temp.path().join("users.db"))?;
    let client = server.client()?;

    let alice = client.create(&sample_fields("Alice"))?;
    let bob = client.create(&sample_fields("Bob"))?;

    let mut changed = sample_fields("Alicia");
    changed.age = 31;
    changed.pincode = "110001".to_string();
    let updated = client.update(alice.id, &changed)?;
    assert_eq!(updated.id, alice.id);
    assert_eq!(updated.fields(), changed);

    assert_eq!(client.get(alice.id)?.fields(), changed);
    assert_eq!(client.get(bob.id)?, bob);
    Ok(())
}

#[test]
fn delete_removes_record_and_reports_success() -> TestResult<()> {
    let _serial = serial();
    let temp = tempfile::tempdir()?;
    let server = TestServer::api(&temp.path().join("users.db"))?;
    let client = server.client()?;

    let alice = client.create(&sample_fields("Alice"))?;
    let ack = client.delete(alice.id)?;
    assert_eq!(ack.status, "success");
    assert_eq!(ack.message, "User deleted");

    let err = client.get(alice.id).expect_err("gone");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = client.delete(alice.id).expect_err("already gone");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let next = client.create(&sample_fields("Bob"))?;
    assert!(next.id > alice.id);
    Ok(())
}

#[test]
fn missing_ids_are_404_with_user_not_found() -> TestResult<()> {
    let _serial = serial();
    let temp = tempfile::tempdir()?;
    let server = TestServer::api(&temp.path().join("users.db"))?;
    let client = server.client()?;

    let err = client.update(999, &sample_fields("Ghost")).expect_err("missing");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.id(), Some(999));

    let (status, body) = status_and_body(ureq::get(&server.url("/users/999")).call())?;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["kind"], "NotFound");
    assert_eq!(body["error"]["message"], "User not found");
    Ok(())
}

#[test]
fn invalid_bodies_are_422_and_store_nothing() -> TestResult<()> {
    let _serial = serial();
    let temp = tempfile::tempdir()?;
    let server = TestServer::api(&temp.path().join("users.db"))?;
    let client = server.client()?;

    let mut blank = sample_fields("   ");
    blank.age = 0;
    let err = client.create(&blank).expect_err("invalid");
    assert_eq!(err.kind(), ErrorKind::Validation);
    let fields: Vec<&str> = err.issues().iter().map(|i| i.field.as_str()).collect();
    assert_eq!(fields, vec!["name", "age"]);

    let (status, body) = status_and_body(
        ureq::post(&server.url("/users/"))
            .set("Content-Type", "application/json")
            .send_string(r#"{"name":"Only"}"#),
    )?;
    assert_eq!(status, 422);
    assert_eq!(body["error"]["kind"], "Validation");

    let (status, _) = status_and_body(
        ureq::post(&server.url("/users/"))
            .set("Content-Type", "application/json")
            .send_string("{not json"),
    )?;
    assert_eq!(status, 422);

    let (status, _) = status_and_body(ureq::get(&server.url("/users/abc")).call())?;
    assert_eq!(status, 422);

    assert!(client.list(0, 100)?.is_empty());
    Ok(())
}

#[test]
fn cors_allows_any_origin_with_credentials() -> TestResult<()> {
    let _serial = serial();
    let temp = tempfile::tempdir()?;
    let server = TestServer::api(&temp.path().join("users.db"))?;
    let origin = "http://localhost:8501";

    let preflight = ureq::request("OPTIONS", &server.url("/users/"))
        .set("Origin", origin)
        .set("Access-Control-Request-Method", "PUT")
        .set("Access-Control-Request-Headers", "content-type")
        .call()?;
    assert_eq!(preflight.status(), 200);
    assert_eq!(preflight.header("access-control-allow-origin"), Some(origin));
    assert_eq!(
        preflight.header("access-control-allow-credentials"),
        Some("true")
    );

    let list = ureq::get(&server.url("/users/"))
        .set("Origin", "https://example.org")
        .call()?;
    assert_eq!(
        list.header("access-control-allow-origin"),
        Some("https://example.org")
    );
    Ok(())
}

#[test]
fn healthz_and_version_header() -> TestResult<()> {
    let _serial = serial();
    let temp = tempfile::tempdir()?;
    let server = TestServer::api(&temp.path().join("users.db"))?;

    let resp = ureq::get(&server.url("/healthz")).call()?;
    assert_eq!(resp.header("userdesk-version"), Some("1"));
    let body: Value = serde_json::from_str(&resp.into_string()?)?;
    assert_eq!(body["ok"], true);
    Ok(())
}

#[test]
fn records_survive_server_restart() -> TestResult<()> {
    let _serial = serial();
    let temp = tempfile::tempdir()?;
    let db = temp.path().join("users.db");

    let created = {
        let server = TestServer::api(&db)?;
        server.client()?.create(&sample_fields("Durable"))?
    };

    let server = TestServer::api(&db)?;
    assert_eq!(server.client()?.get(created.id)?, created);
    Ok(())
}
