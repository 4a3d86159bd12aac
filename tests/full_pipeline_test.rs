//! End-to-end test of the report pipeline over HTTP: upload, import,
//! edit, reorder, and persistence to the save file.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;

use reportforge::config::AppConfig;
use reportforge::{routes, AppState};

const NESSUS_SAMPLE: &[u8] = include_bytes!("fixtures/nessus_sample.nessus");
const CSV_SAMPLE: &[u8] = include_bytes!("fixtures/findings_sample.csv");

/// Spin up the full Axum app on a random port with its save file inside
/// `dir`, returning the base URL and the save file path.
async fn start_server(dir: &tempfile::TempDir) -> (String, PathBuf) {
    let save_file = dir.path().join("data/saved_report.json");
    let config = AppConfig {
        report_save_file: save_file.clone(),
        frontend_url: "http://localhost:5173".to_string(),
        ..AppConfig::default()
    };
    let state = AppState::load(config).await.expect("state");
    let app = routes::app(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    // Wait briefly for server readiness
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    (base_url, save_file)
}

/// Helper: extract `data` from the API envelope, panic with message on error.
fn extract_data(body: &Value) -> &Value {
    if let Some(err) = body.get("error").filter(|e| !e.is_null()) {
        panic!(
            "API error: {}: {}",
            err["code"].as_str().unwrap_or("?"),
            err["message"].as_str().unwrap_or("?"),
        );
    }
    body.get("data").expect("missing 'data' field")
}

fn upload(data: &[u8], file_name: &str) -> Form {
    Form::new().part("file", Part::bytes(data.to_vec()).file_name(file_name.to_string()))
}

fn ids(findings: &Value) -> Vec<String> {
    findings
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn full_report_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let (base, save_file) = start_server(&dir).await;
    let client = Client::new();

    // Health
    let resp = client.get(format!("{base}/health/live")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Preview does not import
    let preview: Value = client
        .post(format!("{base}/api/v1/ingestion/preview"))
        .multipart(upload(NESSUS_SAMPLE, "scan.nessus"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let preview = extract_data(&preview);
    assert_eq!(preview["format"], "nessus");
    assert_eq!(preview["total"], 4);
    assert_eq!(preview["skipped"].as_array().unwrap().len(), 1);
    assert_eq!(preview["severity_counts"][0]["severity"], "Critical");
    assert_eq!(preview["severity_counts"][0]["count"], 1);

    let listed: Value = client
        .get(format!("{base}/api/v1/findings"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(extract_data(&listed).as_array().unwrap().is_empty());

    // Import only Critical and Moderate from the Nessus scan
    let form = upload(NESSUS_SAMPLE, "scan.nessus").text("severities", "Critical,Moderate");
    let imported: Value = client
        .post(format!("{base}/api/v1/ingestion/import"))
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let imported = extract_data(&imported);
    assert_eq!(imported["parsed"], 4);
    assert_eq!(imported["imported"], 2);

    // Then everything from the CSV export
    let imported: Value = client
        .post(format!("{base}/api/v1/ingestion/import"))
        .multipart(upload(CSV_SAMPLE, "findings.csv"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(extract_data(&imported)["imported"], 3);

    let listed: Value = client
        .get(format!("{base}/api/v1/findings"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let findings = extract_data(&listed);
    assert_eq!(ids(findings), vec!["8.1", "8.2", "8.3", "8.4", "8.5"]);
    assert_eq!(findings[0]["index"], 0);

    // Manual finding lands at the end
    let created: Value = client
        .post(format!("{base}/api/v1/findings"))
        .json(&json!({
            "title": "Default credentials on admin panel",
            "severity": "Critical",
            "host": "10.0.0.50",
            "cve": "CVE-2024-2, CVE-2024-1"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let created = extract_data(&created);
    assert_eq!(created["id"], "8.6");
    assert_eq!(created["cve"], "CVE-2024-1, CVE-2024-2");

    // Delete and reorder keep numbering dense
    let resp = client
        .delete(format!("{base}/api/v1/findings/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let reordered: Value = client
        .post(format!("{base}/api/v1/findings/reorder"))
        .json(&json!({ "from": 4, "to": 0 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let reordered = extract_data(&reordered);
    assert_eq!(ids(reordered), vec!["8.1", "8.2", "8.3", "8.4", "8.5"]);
    assert_eq!(reordered[0]["title"], "Default credentials on admin panel");

    // Severity filter
    let critical: Value = client
        .get(format!("{base}/api/v1/findings?severity=Critical"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let critical = extract_data(&critical).as_array().unwrap();
    assert!(critical.iter().all(|f| f["severity"] == "Critical"));
    assert_eq!(critical[0]["index"], 0);

    // Out-of-range edits are 404s
    let resp = client
        .put(format!("{base}/api/v1/findings/99"))
        .json(&json!({ "title": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Additional reports use their own sequence
    for name in ["Nmap full TCP sweep", ""] {
        client
            .post(format!("{base}/api/v1/additional-reports"))
            .json(&json!({ "name": name, "code": "nmap -p- 10.0.0.0/24" }))
            .send()
            .await
            .unwrap();
    }
    let appendix: Value = client
        .get(format!("{base}/api/v1/additional-reports"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let appendix = extract_data(&appendix);
    assert_eq!(ids(appendix), vec!["9.1", "9.2"]);
    assert_eq!(appendix[1]["name"], "Untitled");

    // Metadata and remediation roadmap
    let resp = client
        .put(format!("{base}/api/v1/report/metadata"))
        .json(&json!({ "client": "ACME Corp", "watermark_enabled": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let roadmap: Value = client
        .post(format!("{base}/api/v1/report/remediation"))
        .json(&json!({ "term": "short", "text": "Rotate admin credentials" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(extract_data(&roadmap)[0], "Rotate admin credentials");

    let resp = client
        .post(format!("{base}/api/v1/report/remediation"))
        .json(&json!({ "term": "long", "text": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let summary: Value = client
        .get(format!("{base}/api/v1/report/summary"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(extract_data(&summary)["total"], 5);

    // Everything above was persisted
    let saved: Value = serde_json::from_slice(&std::fs::read(&save_file).unwrap()).unwrap();
    assert_eq!(saved["client"], "ACME Corp");
    assert_eq!(saved["findings"].as_array().unwrap().len(), 5);
    assert_eq!(saved["additional_reports"].as_array().unwrap().len(), 2);
    assert_eq!(saved["remediation_short"][0], "Rotate admin credentials");

    // Reset clears the session and the save file
    let reset: Value = client
        .post(format!("{base}/api/v1/report/reset"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(extract_data(&reset)["findings"].as_array().unwrap().is_empty());
    assert!(!save_file.exists());
}

#[tokio::test]
async fn malformed_upload_is_rejected_without_changes() {
    let dir = tempfile::tempdir().unwrap();
    let (base, _save_file) = start_server(&dir).await;
    let client = Client::new();

    let resp = client
        .post(format!("{base}/api/v1/ingestion/import"))
        .multipart(upload(b"{\"findings\": 3}", "export.json"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "PARSE_ERROR");

    let resp = client
        .post(format!("{base}/api/v1/ingestion/import"))
        .multipart(Form::new().text("severities", "High"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let listed: Value = client
        .get(format!("{base}/api/v1/findings"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(extract_data(&listed).as_array().unwrap().is_empty());
}

#[tokio::test]
async fn saved_report_is_resumed_on_startup() {
    let dir = tempfile::tempdir().unwrap();
    let save_file = dir.path().join("data/saved_report.json");
    std::fs::create_dir_all(save_file.parent().unwrap()).unwrap();
    std::fs::write(
        &save_file,
        json!({
            "client": "Initech",
            "findings": [
                { "id": "8.4", "title": "Old finding", "severity": "High" },
                { "title": "Unnumbered", "severity": "Low" }
            ]
        })
        .to_string(),
    )
    .unwrap();

    let (base, _) = start_server(&dir).await;
    let report: Value = Client::new()
        .get(format!("{base}/api/v1/report"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let report = extract_data(&report);
    assert_eq!(report["client"], "Initech");
    assert_eq!(ids(&report["findings"]), vec!["8.1", "8.2"]);
    assert_eq!(report["sorted_findings"][0]["title"], "Old finding");
}
