//! End-to-end volume lifecycle against a temporary root directory.

use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;

use libhostpath::*;

fn backend_at(root: &std::path::Path, identity: &str) -> HostPathBackend {
    HostPathBackend::new(ProvisionerConfig {
        root: root.to_path_buf(),
        identity: identity.to_owned(),
        ..Default::default()
    })
    .expect("valid config")
}

fn claim(namespace: &str, name: &str) -> ProvisionRequest {
    ProvisionRequest {
        namespace: namespace.to_owned(),
        claim_name: name.to_owned(),
        volume_name: format!("pvc-{namespace}-{name}"),
        access_modes: vec![AccessMode::ReadWriteMany],
        capacity: Quantity::from("5Gi"),
        reclaim_policy: Some(ReclaimPolicy::Delete),
        ..Default::default()
    }
}

#[tokio::test]
async fn provision_then_delete_roundtrip() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("data");
    let backend = backend_at(&root, "hostpath-provisioner");

    let vol = backend.provision(claim("ns1", "pvc-a")).await.unwrap();
    let dir = root.join("ns1").join("pvc-a");
    assert_eq!(vol.host_path.as_ref().unwrap().path, dir);
    assert_eq!(vol.identity(), Some("hostpath-provisioner"));
    assert_eq!(
        std::fs::metadata(&dir).unwrap().permissions().mode() & 0o777,
        0o777
    );
    assert!(backend.probe().await.unwrap());

    // The controller persists the descriptor and hands it back unchanged.
    let json = serde_json::to_string(&vol).unwrap();
    let persisted: VolumeDescriptor = serde_json::from_str(&json).unwrap();

    std::fs::write(dir.join("payload"), b"data").unwrap();
    let outcome = backend.delete(&persisted).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert!(!dir.exists());
    assert_eq!(VolumeState::after_delete(&outcome), VolumeState::Deleted);
}

#[tokio::test]
async fn other_instance_leaves_volume_alone() {
    let tmp = tempfile::tempdir().unwrap();
    let ours = backend_at(tmp.path(), "node-a");
    let theirs = backend_at(tmp.path(), "node-b");

    let vol = ours.provision(claim("ns1", "pvc-a")).await.unwrap();

    let outcome = theirs.delete(&vol).await.unwrap();
    assert!(outcome.is_declined());
    assert!(tmp.path().join("ns1/pvc-a").is_dir());

    assert_eq!(ours.delete(&vol).await.unwrap(), DeleteOutcome::Deleted);
}

#[tokio::test]
async fn restarted_instance_reprovisions_same_path() {
    let tmp = tempfile::tempdir().unwrap();

    let first = backend_at(tmp.path(), "hostpath-provisioner")
        .provision(claim("ns1", "pvc-a"))
        .await
        .unwrap();
    let second = backend_at(tmp.path(), "hostpath-provisioner")
        .provision(claim("ns1", "pvc-a"))
        .await
        .unwrap();

    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_provisions_of_same_claim_succeed() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = Arc::new(backend_at(tmp.path(), "hostpath-provisioner"));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let backend = Arc::clone(&backend);
            tokio::spawn(async move { backend.provision(claim("ns1", "pvc-race")).await })
        })
        .collect();

    let mut descriptors = Vec::new();
    for handle in handles {
        descriptors.push(handle.await.unwrap().unwrap());
    }
    assert!(descriptors.windows(2).all(|w| w[0] == w[1]));
    assert!(tmp.path().join("ns1/pvc-race").is_dir());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims_are_independent() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = Arc::new(backend_at(tmp.path(), "hostpath-provisioner"));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let backend = Arc::clone(&backend);
            tokio::spawn(async move {
                let vol = backend
                    .provision(claim(&format!("ns{}", i % 2), &format!("pvc-{i}")))
                    .await
                    .unwrap();
                backend.delete(&vol).await
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), DeleteOutcome::Deleted);
    }
    assert!(tmp.path().join("ns0").is_dir());
    assert!(tmp.path().join("ns1").is_dir());
    assert_eq!(std::fs::read_dir(tmp.path().join("ns0")).unwrap().count(), 0);
}
