mod common;

use common::{FixtureAudit, FixtureInventory, FixtureMetrics, event, line_item};
use cost_attribution::attribution::{
    AllocationMethod, Dispatcher, Ranking, ReportWriter, UNKNOWN_CREATOR, load_line_items,
    sort_rows, summarize_by_person,
};
use cost_attribution::config::Config;
use serde_json::json;
use tempfile::TempDir;

const PROJECT: &str = "acme-prod";

fn config() -> Config {
    Config::default()
        .with_project(PROJECT)
        .with_request_delay_ms(0)
}

fn vm(name: &str, machine_type: &str, status: &str) -> serde_json::Value {
    json!({
        "name": name,
        "machineType": format!("zones/us-central1-a/machineTypes/{}", machine_type),
        "zone": "projects/acme-prod/zones/us-central1-a",
        "status": status,
    })
}

#[tokio::test]
async fn compute_engine_core_split_forty_sixty_with_creators() {
    let inventory = FixtureInventory::default().with(
        "compute instances list",
        json!([
            vm("api-vm", "e2-standard-2", "RUNNING"),
            vm("batch-vm", "e2-standard-3", "RUNNING"),
        ]),
    );
    let audit = FixtureAudit::default().with(
        "compute.googleapis.com",
        vec![
            event("projects/acme-prod/zones/us-central1-a/instances/batch-vm", "bob@acme.io", "2026-10-02T00:00:00Z"),
            event("projects/acme-prod/zones/us-central1-a/instances/api-vm", "alice@acme.io", "2026-10-01T00:00:00Z"),
            event("projects/acme-prod/zones/us-central1-a/instances/api-vm", "mallory@acme.io", "2026-09-01T00:00:00Z"),
        ],
    );
    let config = config();
    let default_metrics = FixtureMetrics::default();
    let dispatcher = Dispatcher::new(&config, PROJECT, &inventory, &default_metrics, &audit);

    let item = line_item("Compute Engine", "E2 Instance Core running in Americas", 100.0, 100.0);
    let rows = dispatcher.attribute(&item).await;

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].resource, "batch-vm (e2-standard-3, us-central1-a)");
    assert_eq!(rows[0].usage_share_pct, 60.0);
    assert_eq!(rows[0].actual_cost, 60.0);
    assert_eq!(rows[0].resource_usage, 60.0);
    assert_eq!(rows[0].created_by, "bob@acme.io");
    assert_eq!(rows[1].usage_share_pct, 40.0);
    assert_eq!(rows[1].actual_cost, 40.0);
    // The first matching entry wins
    assert_eq!(rows[1].created_by, "alice@acme.io");
    assert!(rows.iter().all(|r| r.method == AllocationMethod::ComputeInstances));
    assert_eq!(audit.calls.get(), 1);
}

#[tokio::test]
async fn no_running_vms_falls_back_exactly_once() {
    let inventory = FixtureInventory::default().with(
        "compute instances list",
        json!([vm("idle", "n2-standard-8", "TERMINATED")]),
    );
    let audit = FixtureAudit::default().with(
        "compute.googleapis.com",
        vec![
            event("projects/acme-prod/instances/a", "alice@acme.io", "2026-10-01T00:00:00Z"),
            event("projects/acme-prod/instances/b", "alice@acme.io", "2026-10-02T00:00:00Z"),
            event("projects/acme-prod/instances/c", "bob@acme.io", "2026-10-03T00:00:00Z"),
            event("projects/acme-prod/instances/d", "bob@acme.io", "2026-10-04T00:00:00Z"),
        ],
    );
    let config = config();
    let default_metrics = FixtureMetrics::default();
    let dispatcher = Dispatcher::new(&config, PROJECT, &inventory, &default_metrics, &audit);

    let item = line_item("Compute Engine", "N2 Instance Ram running in Americas", 50.0, 200.0);
    let rows = dispatcher.attribute(&item).await;

    assert_eq!(audit.calls.get(), 1);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.method == AllocationMethod::ProportionalEstimate));
    assert!(rows.iter().all(|r| r.resource == "2 resources created"));
    assert_eq!(rows.iter().map(|r| r.actual_cost).sum::<f64>(), 50.0);
    assert!(!rows.iter().any(|r| r.resource.contains("idle")));
}

#[tokio::test]
async fn unregistered_service_without_events_is_one_unknown_row() {
    let audit = FixtureAudit::default();
    let config = config();
    let default_inventory = FixtureInventory::default();
    let default_metrics = FixtureMetrics::default();
    let dispatcher = Dispatcher::new(
        &config,
        PROJECT,
        &default_inventory,
        &default_metrics,
        &audit,
    );

    let item = line_item("Mystery Service", "Mystery Units", 12.34, 5.0);
    let rows = dispatcher.attribute(&item).await;

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].resource, "No data");
    assert_eq!(rows[0].created_by, UNKNOWN_CREATOR);
    assert_eq!(rows[0].usage_share_pct, 100.0);
    assert_eq!(rows[0].actual_cost, 12.34);
    assert_eq!(rows[0].resource_usage, 5.0);
    assert_eq!(rows[0].method, AllocationMethod::NoData);
    assert_eq!(audit.calls.get(), 0);
}

#[tokio::test]
async fn mapped_service_without_adapter_uses_event_counts() {
    let audit = FixtureAudit::default().with(
        "bigquery.googleapis.com",
        vec![
            event("projects/acme-prod/datasets/sales", "analyst@acme.io", "2026-10-01T00:00:00Z"),
            event("projects/acme-prod/datasets/ml", "analyst@acme.io", "2026-10-02T00:00:00Z"),
            event("projects/acme-prod/datasets/tmp", "etl@acme.iam.gserviceaccount.com", "2026-10-03T00:00:00Z"),
        ],
    );
    let config = config();
    let default_inventory = FixtureInventory::default();
    let default_metrics = FixtureMetrics::default();
    let dispatcher = Dispatcher::new(
        &config,
        PROJECT,
        &default_inventory,
        &default_metrics,
        &audit,
    );

    let rows = dispatcher
        .attribute(&line_item("BigQuery", "Analysis", 30.0, 3.0))
        .await;

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].created_by, "analyst@acme.io");
    assert_eq!(rows[0].actual_cost, 20.0);
    assert_eq!(rows[0].resource, "2 resources created");
    assert_eq!(rows[1].actual_cost, 10.0);
}

#[tokio::test]
async fn inventory_failure_degrades_to_fallback() {
    // No listing registered: the SQL inventory call fails
    let inventory = FixtureInventory::default();
    let audit = FixtureAudit::failing();
    let config = config();
    let default_metrics = FixtureMetrics::default();
    let dispatcher = Dispatcher::new(&config, PROJECT, &inventory, &default_metrics, &audit);

    let rows = dispatcher
        .attribute(&line_item("Cloud SQL", "Cloud SQL for PostgreSQL: Zonal - vCPU", 80.0, 720.0))
        .await;

    assert_eq!(*inventory.calls.borrow(), vec!["sql instances list".to_string()]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].method, AllocationMethod::NoData);
    assert_eq!(rows[0].actual_cost, 80.0);
}

#[tokio::test]
async fn cloud_run_split_by_instance_time() {
    let metrics = FixtureMetrics::default().with(
        "run.googleapis.com/container/billable_instance_time",
        &[("checkout", 750.0), ("search", 250.0)],
    );
    let audit = FixtureAudit::default().with(
        "run.googleapis.com",
        vec![event(
            "namespaces/acme-prod/services/checkout",
            "deployer@acme.iam.gserviceaccount.com",
            "2026-10-05T00:00:00Z",
        )],
    );
    let config = config();
    let default_inventory = FixtureInventory::default();
    let dispatcher = Dispatcher::new(&config, PROJECT, &default_inventory, &metrics, &audit);

    let rows = dispatcher
        .attribute(&line_item("Cloud Run", "CPU Allocation Time", 40.0, 1000.0))
        .await;

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].resource, "checkout");
    assert_eq!(rows[0].actual_cost, 30.0);
    assert_eq!(rows[0].created_by, "deployer@acme.iam.gserviceaccount.com");
    assert_eq!(rows[1].resource, "search");
    assert_eq!(rows[1].created_by, UNKNOWN_CREATOR);
    assert!(rows.iter().all(|r| r.method == AllocationMethod::BillableInstanceTime));
}

#[tokio::test]
async fn export_to_reports_end_to_end() {
    let dir = TempDir::new().unwrap();
    let export = dir.path().join("billing_export.csv");
    std::fs::write(
        &export,
        "Service description,SKU description,Usage amount,Usage unit,Cost ($)\n\
         Compute Engine,E2 Instance Core running in Americas,100,hour,\"$1,000.00\"\n\
         Mystery Service,Mystery Units,1,unit,$5.00\n\
         Cloud Run,CPU Allocation Time,1000,vCPU-second,$40.00\n",
    )
    .unwrap();

    let items = load_line_items(&export, Ranking::Raw, 10).unwrap();
    assert_eq!(items[0].total_cost, 1000.0);

    let inventory = FixtureInventory::default().with(
        "compute instances list",
        json!([
            vm("api-vm", "e2-standard-2", "RUNNING"),
            vm("batch-vm", "e2-standard-2", "RUNNING"),
        ]),
    );
    let audit = FixtureAudit::default().with(
        "compute.googleapis.com",
        vec![event("instances/api-vm", "alice@acme.io", "2026-10-01T00:00:00Z")],
    );
    let config = config();
    let default_metrics = FixtureMetrics::default();
    let dispatcher = Dispatcher::new(&config, PROJECT, &inventory, &default_metrics, &audit);

    let mut seen = Vec::new();
    let mut rows = dispatcher
        .attribute_all(&items, |i, item| seen.push((i, item.service.clone())))
        .await;
    assert_eq!(seen.len(), 3);

    sort_rows(&mut rows);
    assert_eq!(rows[0].total_cost, 1000.0);
    assert_eq!(rows.last().map(|r| r.total_cost), Some(5.0));

    let people = summarize_by_person(&rows);
    assert_eq!(people[0].identity, UNKNOWN_CREATOR);
    assert_eq!(people[0].total_cost, 545.0);
    assert_eq!(people[1].identity, "alice@acme.io");
    assert_eq!(people[1].total_cost, 500.0);

    let writer = ReportWriter::new(dir.path());
    let breakdown = writer.write_breakdown(&rows).unwrap();
    writer.write_person_summary(&people).unwrap();

    let mut reader = csv::Reader::from_path(&breakdown).unwrap();
    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), rows.len());
    assert_eq!(&records[0][9], "alice@acme.io");
    assert!(dir.path().join("person_cost_summary.csv").exists());
}
