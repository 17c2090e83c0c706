// Copyright (c) 2025 - Cowboy AI, Inc.
//! Integration tests for full sync runs
//!
//! Drives [`SyncRunner`] against the in-memory CMDB and store and checks
//! phase ordering, phase selection and the run success signal.

mod fixtures;

use pretty_assertions::assert_eq;

use cim_asset_sync::domain::CmdbHost;
use cim_asset_sync::{Phase, SyncRunner};
use fixtures::*;

fn snapshot() -> FakeCmdb {
    FakeCmdb::new(
        vec![
            cmdb_host("web01", "10.0.0.5", "linux", "Ops.Web"),
            cmdb_host("db01", "10.0.1.5", "linux", "Ops.DB, Finance"),
            cmdb_host("win01", "10.0.2.5", "windows", "Office"),
        ],
        vec![
            cmdb_user("alice", "Ops.Web", "1"),
            cmdb_user("bob", "Ops.Web", "1"),
            cmdb_user("carol", "Finance", "3"),
        ],
    )
}

fn seeded_store() -> FakeStore {
    let store = FakeStore::new();
    store.seed_user("alice");
    store.seed_user("bob");
    store.seed_user("carol");
    store
}

#[tokio::test]
async fn test_full_run_mirrors_cmdb() {
    let cmdb = snapshot();
    let store = seeded_store();
    let config = sync_config(true);

    let report = SyncRunner::new(&cmdb, &store, &config)
        .run_at(&Phase::ALL, fixed_timestamp())
        .await;

    assert!(report.success);
    assert_eq!(report.nodes.map(|n| n.created), Some(5));
    assert_eq!(report.hosts.map(|h| h.added), Some(2));
    assert_eq!(report.permissions.map(|p| p.created), Some(2));
    assert_eq!(report.settle.map(|s| s.created + s.deleted), Some(0));

    // Windows hosts still contribute their departments to the tree
    assert_eq!(
        store.node_paths(),
        vec![
            "/DEFAULT/C3/Finance",
            "/DEFAULT/C3/Office",
            "/DEFAULT/C3/Ops",
            "/DEFAULT/C3/Ops/DB",
            "/DEFAULT/C3/Ops/Web",
        ]
    );

    // Hosts are attached to nodes created earlier in the same run
    let web = store.node_id("/DEFAULT/C3/Ops/Web").unwrap();
    assert_eq!(store.host_nodes("web01"), vec![web]);

    let grant = store.permission("C3_Ops.Web_level_1").unwrap();
    assert_eq!(grant.users.len(), 2);
    assert_eq!(grant.nodes, vec![web]);
}

#[tokio::test]
async fn test_second_run_makes_no_structural_changes() {
    let cmdb = snapshot();
    let store = seeded_store();
    let config = sync_config(true);
    let runner = SyncRunner::new(&cmdb, &store, &config);

    runner.run_at(&Phase::ALL, fixed_timestamp()).await;
    store.clear_calls();
    let report = runner.run_at(&Phase::ALL, fixed_timestamp()).await;

    assert!(report.success);
    assert_eq!(report.hosts.map(|h| (h.added, h.updated)), Some((0, 2)));
    assert_eq!(report.permissions.map(|p| (p.created, p.updated)), Some((0, 2)));
    // Only the validity re-stamp of existing grants is written
    assert!(store
        .calls()
        .iter()
        .all(|call| matches!(call, Call::UpdatePermission(_))));
}

#[tokio::test]
async fn test_selected_phase_only() {
    let cmdb = snapshot();
    let store = seeded_store();
    let config = sync_config(true);

    let report = SyncRunner::new(&cmdb, &store, &config)
        .run_at(&[Phase::Hosts], fixed_timestamp())
        .await;

    assert!(report.success);
    assert!(report.nodes.is_none());
    assert!(report.permissions.is_none());
    assert!(report.settle.is_none());
    assert_eq!(report.hosts.map(|h| h.added), Some(2));
    assert!(store.node_paths().is_empty());
}

#[tokio::test]
async fn test_cmdb_host_failure_marks_run_unsuccessful() {
    let cmdb = FakeCmdb {
        hosts: None,
        ..snapshot()
    };
    let store = seeded_store();
    let config = sync_config(true);

    let report = SyncRunner::new(&cmdb, &store, &config)
        .run_at(&Phase::ALL, fixed_timestamp())
        .await;

    assert!(!report.success);
    assert!(report.nodes.is_none());
    assert!(report.hosts.is_none());
    // Permissions do not depend on the host read
    assert!(report.permissions.is_some());
}

#[tokio::test]
async fn test_inventory_failure_marks_run_unsuccessful() {
    let cmdb = snapshot();
    let store = seeded_store();
    store.fail_list_hosts();
    let config = sync_config(false);

    let report = SyncRunner::new(&cmdb, &store, &config)
        .run_at(&Phase::ALL, fixed_timestamp())
        .await;

    assert!(!report.success);
    assert!(report.nodes.is_some());
    assert!(report.hosts.is_none());
    assert!(report.permissions.is_some());
}

#[tokio::test]
async fn test_item_failures_keep_run_successful() {
    let cmdb = snapshot();
    let store = seeded_store();
    store.fail_host("10.0.0.5");
    let config = sync_config(false);

    let report = SyncRunner::new(&cmdb, &store, &config)
        .run_at(&Phase::ALL, fixed_timestamp())
        .await;

    assert!(report.success);
    assert_eq!(report.hosts.map(|h| h.failed), Some(1));
    assert!(report.settle.is_none());
}

#[tokio::test]
async fn test_empty_cmdb_changes_nothing() {
    let cmdb = FakeCmdb::new(Vec::<CmdbHost>::new(), vec![]);
    let store = seeded_store();
    store.seed_node("/DEFAULT/C3/Ops");
    store.seed_host("web01", "10.0.0.5");
    let config = sync_config(true);

    let report = SyncRunner::new(&cmdb, &store, &config)
        .run_at(&Phase::ALL, fixed_timestamp())
        .await;

    assert!(report.success);
    assert!(store.calls().is_empty());
    assert_eq!(store.hosts().len(), 1);
}
