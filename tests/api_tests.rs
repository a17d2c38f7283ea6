mod common;

use common::http::{get, request};
use common::test_server::{start, start_with_memory_store, TestServer};
use serde_json::json;

fn hub() -> (TestServer, tempfile::TempDir) {
    let root = tempfile::tempdir().unwrap();
    (start_with_memory_store(root.path()), root)
}

#[test]
fn test_notes_crud() {
    let (srv, _root) = hub();
    let a = request(
        &srv.addr,
        "POST",
        "/api/notes",
        Some(r#"{"title":"first","content":"one"}"#),
    );
    let b = request(
        &srv.addr,
        "POST",
        "/api/notes",
        Some(r#"{"note_title":"second","note_content":"two"}"#),
    );
    assert_eq!(a.status, 201);
    assert_eq!(b.status, 201);
    let a_id = a.json()["id"].as_i64().unwrap();
    let b_id = b.json()["id"].as_i64().unwrap();
    assert_ne!(a_id, b_id);
    assert_eq!(b.json()["note_title"], "second");

    let listed = get(&srv.addr, "/api/notes").json();
    let titles: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["note_title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["second", "first"]);

    let updated = request(
        &srv.addr,
        "PUT",
        &format!("/api/notes/{a_id}"),
        Some(r#"{"title":"first*","content":"uno"}"#),
    );
    assert_eq!(updated.status, 200);
    assert_eq!(updated.json()["note_content"], "uno");
    assert_eq!(updated.json()["id"], a_id);

    let deleted = request(&srv.addr, "DELETE", &format!("/api/notes/{a_id}"), None);
    assert_eq!(deleted.status, 200);
    assert_eq!(deleted.json(), json!({"message": "Note deleted successfully"}));
    let again = request(&srv.addr, "DELETE", &format!("/api/notes/{a_id}"), None);
    assert_eq!(again.status, 404);

    let left = get(&srv.addr, "/api/notes").json();
    srv.stop();
    assert_eq!(left.as_array().unwrap().len(), 1);
}

#[test]
fn test_note_validation() {
    let (srv, _root) = hub();
    let missing = request(&srv.addr, "POST", "/api/notes", Some(r#"{"title":"x"}"#));
    let bad_json = request(&srv.addr, "POST", "/api/notes", Some("{oops"));
    let bad_id = request(
        &srv.addr,
        "PUT",
        "/api/notes/abc",
        Some(r#"{"title":"x","content":"y"}"#),
    );
    let unknown = request(
        &srv.addr,
        "PUT",
        "/api/notes/999",
        Some(r#"{"title":"x","content":"y"}"#),
    );
    srv.stop();

    assert_eq!(missing.status, 400);
    assert_eq!(missing.json()["error"], "Title and content are required");
    assert_eq!(bad_json.status, 400);
    assert_eq!(bad_json.json()["error"], "Invalid JSON in request body");
    assert_eq!(bad_id.status, 400);
    assert_eq!(bad_id.json()["error"], "Invalid note ID");
    assert_eq!(unknown.status, 404);
}

#[test]
fn test_kanban_defaults_and_update() {
    let (srv, _root) = hub();
    let created = request(&srv.addr, "POST", "/api/kanban", Some(r#"{"title":"ship"}"#));
    assert_eq!(created.status, 201);
    let task = created.json();
    assert_eq!(task["status"], "todo");
    assert_eq!(task["priority"], "medium");
    assert_eq!(task["description"], "");
    let id = task["id"].as_i64().unwrap();

    let moved = request(
        &srv.addr,
        "PUT",
        &format!("/api/kanban/{id}"),
        Some(r#"{"title":"ship","status":"done","priority":"high"}"#),
    );
    assert_eq!(moved.status, 200);
    assert_eq!(moved.json()["status"], "done");
    assert_eq!(moved.json()["priority"], "high");

    let no_title = request(&srv.addr, "POST", "/api/kanban", Some(r#"{"status":"todo"}"#));
    assert_eq!(no_title.status, 400);
    assert_eq!(no_title.json()["error"], "Title is required");

    let gone = request(&srv.addr, "DELETE", &format!("/api/kanban/{id}"), None);
    assert_eq!(gone.json()["message"], "Task deleted successfully");
    let list = get(&srv.addr, "/api/kanban").json();
    srv.stop();
    assert_eq!(list, json!([]));
}

#[test]
fn test_links_replace_whole_list() {
    let (srv, _root) = hub();
    let body = r#"[{"id":1,"title":"Docs","url":"https://docs.rs","icon":"mdi:book","pinned":true},
                   {"id":"b","name":"Crates","url":"https://crates.io"}]"#;
    let saved = request(&srv.addr, "POST", "/api/tw-grid-links", Some(body));
    assert_eq!(saved.status, 200);
    assert_eq!(saved.json(), json!({"message": "Links updated successfully."}));

    let links = get(&srv.addr, "/api/tw-grid-links").json();
    assert_eq!(links.as_array().unwrap().len(), 2);
    assert_eq!(links[0]["name"], "Docs");
    assert_eq!(links[0]["image"], "mdi:book");
    assert_eq!(links[0]["pinned"], true);
    assert_eq!(links[1]["id"], "b");

    request(&srv.addr, "POST", "/api/tw-grid-links", Some("[]"));
    let cleared = get(&srv.addr, "/api/tw-grid-links").json();

    let not_array = request(&srv.addr, "POST", "/api/tw-grid-links", Some(r#"{"url":"x"}"#));
    let not_object = request(&srv.addr, "POST", "/api/tw-grid-links", Some("[1,2]"));
    srv.stop();

    assert_eq!(cleared, json!([]));
    assert_eq!(not_array.status, 400);
    assert_eq!(not_array.json()["error"], "Request body must be an array of links.");
    assert_eq!(not_object.json()["error"], "Each link must be a JSON object.");
}

#[test]
fn test_database_tables() {
    let (srv, _root) = hub();
    for i in 0..3 {
        request(
            &srv.addr,
            "POST",
            "/api/notes",
            Some(&format!(r#"{{"title":"n{i}","content":"c"}}"#)),
        );
    }
    request(&srv.addr, "POST", "/api/kanban", Some(r#"{"title":"t"}"#));

    let tables = get(&srv.addr, "/api/database/tables").json();
    let rows = get(&srv.addr, "/api/database/tables/notes_records?limit=2").json();
    let unknown = get(&srv.addr, "/api/database/tables/users");
    let bad_limit = get(&srv.addr, "/api/database/tables/notes_records?limit=lots");
    srv.stop();

    let count = |name: &str| {
        tables
            .as_array()
            .unwrap()
            .iter()
            .find(|t| t["table_name"] == name)
            .map(|t| t["row_count"].as_u64().unwrap())
    };
    assert_eq!(count("notes_records"), Some(3));
    assert_eq!(count("kanban_tasks"), Some(1));
    assert_eq!(count("tw_grid_links"), Some(0));

    assert_eq!(rows.as_array().unwrap().len(), 2);
    assert_eq!(rows[0]["note_title"], "n2");
    assert_eq!(unknown.status, 200);
    assert_eq!(unknown.json(), json!([]));
    assert_eq!(bad_limit.status, 400);
}

#[test]
fn test_without_store() {
    let root = tempfile::tempdir().unwrap();
    let srv = start(root.path(), None, None);
    let notes = get(&srv.addr, "/api/notes");
    let tables = get(&srv.addr, "/api/database/tables");
    let write = request(&srv.addr, "POST", "/api/kanban", Some(r#"{"title":"x"}"#));
    let delete = request(&srv.addr, "DELETE", "/api/notes/1", None);
    srv.stop();

    assert_eq!(notes.status, 200);
    assert_eq!(notes.json(), json!([]));
    assert_eq!(tables.json(), json!([]));
    assert_eq!(write.status, 503);
    assert_eq!(write.json(), json!({"error": "Database not available"}));
    assert_eq!(delete.status, 503);
}
