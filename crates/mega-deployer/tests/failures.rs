//! Tests for failed runs and what they leave behind.

use mega_deployer::{
    execute,
    test_utils::{abi_from_signatures, artifact, injected_address, MockChainClient},
    Artifacts, ClientError, DeployConfig, DeployError, DeploymentTarget, Phase, RunOptions,
    StateSnapshot, TxContext,
};

fn three_contracts() -> (DeployConfig, Artifacts) {
    let config = DeployConfig::from([
        ("A".to_string(), DeploymentTarget::default()),
        ("B".to_string(), DeploymentTarget::default()),
        ("C".to_string(), DeploymentTarget::default().with_inject("A", "setA").with_inject("B", "setB")),
    ]);
    let artifacts = Artifacts::from([
        ("A".to_string(), artifact("A", &[0x0a], &[])),
        ("B".to_string(), artifact("B", &[0x0b], &[])),
        ("C".to_string(), artifact("C", &[0x0c], &["setA", "setB"])),
    ]);
    (config, artifacts)
}

/// Test that a missing artifact aborts before any transaction.
#[tokio::test]
async fn test_missing_artifact_issues_nothing() {
    let (mut config, artifacts) = three_contracts();
    config.insert("D".into(), DeploymentTarget::default());
    let client = MockChainClient::new();

    let failure =
        execute(&client, &config, &StateSnapshot::new(), &artifacts, &RunOptions::default())
            .await
            .unwrap_err();

    assert_eq!(failure.phase, Phase::Plan);
    assert!(matches!(&failure.error, DeployError::MissingArtifact(name) if name == "D"));
    assert_eq!(failure.to_string(), "planning failed: contract D not compiled");
    assert!(failure.snapshot.is_none());
    assert_eq!(client.transaction_count(), 0);
}

/// Test that a failed deployment fails the run after every deployment settled, keeping the
/// addresses that were confirmed.
#[tokio::test]
async fn test_failed_deployment_keeps_confirmed_addresses() {
    let (config, artifacts) = three_contracts();
    let client = MockChainClient::new().fail_deploy_of(vec![0x0b]);

    let failure =
        execute(&client, &config, &StateSnapshot::new(), &artifacts, &RunOptions::default())
            .await
            .unwrap_err();

    assert_eq!(failure.phase, Phase::Deploy);
    match &failure.error {
        DeployError::TransactionFailure { context, source } => {
            assert_eq!(*context, TxContext::Deploy("B".into()));
            assert!(matches!(source, ClientError::Reverted(_)));
        }
        other => panic!("unexpected error: {other}"),
    }

    // Every deployment was attempted, and no injection was.
    assert_eq!(client.deployments().len(), 3);
    assert!(client.calls().is_empty());

    let snapshot = failure.snapshot.expect("partial snapshot");
    assert!(snapshot["A"].address.is_some());
    assert!(snapshot["B"].address.is_none());
    assert!(snapshot["C"].address.is_some());
}

/// Test that a reverted setter fails the run without cutting short the other injections.
#[tokio::test]
async fn test_failed_injection() {
    let (config, artifacts) = three_contracts();
    let set_a = abi_from_signatures(&[("setA", &["address"])]).functions["setA"][0].selector();
    let client = MockChainClient::new().fail_calls_to(set_a);

    let failure =
        execute(&client, &config, &StateSnapshot::new(), &artifacts, &RunOptions::default())
            .await
            .unwrap_err();

    assert_eq!(failure.phase, Phase::Inject);
    match &failure.error {
        DeployError::TransactionFailure { context, .. } => assert_eq!(
            *context,
            TxContext::Inject { contract: "C".into(), reference: "A".into(), method: "setA".into() }
        ),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(client.calls().len(), 2);

    // Only the confirmed injection is on record.
    let snapshot = failure.snapshot.expect("partial snapshot");
    assert_eq!(snapshot["C"].injected, Some(vec![mega_deployer::InjectSpec::new("B", "setB")]));
}

/// Test that a node without accounts fails transactions lacking an explicit sender.
#[tokio::test]
async fn test_no_default_account() {
    let (config, artifacts) = three_contracts();
    let client = MockChainClient::new().without_default_account();

    let failure =
        execute(&client, &config, &StateSnapshot::new(), &artifacts, &RunOptions::default())
            .await
            .unwrap_err();

    assert!(matches!(
        failure.error,
        DeployError::TransactionFailure { source: ClientError::NoDefaultAccount, .. }
    ));
    assert!(client.deployments().is_empty());
}

/// Test that a run failing after a dependency was redeployed does not leave the dependent's record
/// claiming the old injection, so the next run re-injects the new address.
#[tokio::test]
async fn test_partial_snapshot_does_not_vouch_for_stale_injection() {
    let config = DeployConfig::from([
        ("Other".to_string(), DeploymentTarget::default()),
        ("Token".to_string(), DeploymentTarget::default()),
        ("Vault".to_string(), DeploymentTarget::default().with_inject("Token", "setToken")),
    ]);
    let build = |token: u8, other: u8| {
        Artifacts::from([
            ("Other".to_string(), artifact("Other", &[other], &[])),
            ("Token".to_string(), artifact("Token", &[token], &[])),
            ("Vault".to_string(), artifact("Vault", &[0x0c], &["setToken"])),
        ])
    };
    let client = MockChainClient::new();
    let initial = build(0x0a, 0x01);
    let first = execute(&client, &config, &StateSnapshot::new(), &initial, &RunOptions::default())
        .await
        .unwrap()
        .snapshot;

    // Token and Other change; Other's deployment reverts after Token got a new address.
    let upgraded = build(0x1a, 0x11);
    let failing = client.clone().fail_deploy_of(vec![0x11]);
    let failure = execute(&failing, &config, &first, &upgraded, &RunOptions::default())
        .await
        .unwrap_err();
    assert_eq!(failure.phase, Phase::Deploy);
    let partial = failure.snapshot.expect("partial snapshot");
    let new_token = partial["Token"].address.unwrap();
    assert_ne!(Some(new_token), first["Token"].address);
    assert_eq!(partial["Vault"].address, first["Vault"].address);
    assert_eq!(partial["Vault"].injected, Some(vec![]));

    let client = MockChainClient::new();
    let outcome =
        execute(&client, &config, &partial, &upgraded, &RunOptions::default()).await.unwrap();

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].to, partial["Vault"].address.unwrap());
    assert_eq!(injected_address(&calls[0]), new_token);
    assert_eq!(outcome.report.skipped_injections, 0);
}
