//! End-to-end runs of the engine against the in-memory chain client.

use alloy_primitives::{address, Address};
use mega_deployer::{
    execute, plan,
    test_utils::{artifact, deployed, injected_address, MockChainClient, MOCK_DEFAULT_ACCOUNT},
    Artifacts, DeployConfig, DeploymentTarget, RunOptions, StateSnapshot, Verdict,
};

const TOKEN_CODE: &[u8] = &[0xaa];
const VAULT_CODE: &[u8] = &[0xbb];

/// `Token` plus a `Vault` that needs `Token`'s address through `setToken`.
fn token_vault() -> (DeployConfig, Artifacts) {
    let config = DeployConfig::from([
        ("Token".to_string(), DeploymentTarget::default()),
        ("Vault".to_string(), DeploymentTarget::default().with_inject("Token", "setToken")),
    ]);
    let artifacts = Artifacts::from([
        ("Token".to_string(), artifact("Token", TOKEN_CODE, &[])),
        ("Vault".to_string(), artifact("Vault", VAULT_CODE, &["setToken"])),
    ]);
    (config, artifacts)
}

/// Runs `execute` to completion, panicking on failure.
async fn run(
    client: &MockChainClient,
    config: &DeployConfig,
    prior: &StateSnapshot,
    artifacts: &Artifacts,
) -> StateSnapshot {
    execute(client, config, prior, artifacts, &RunOptions::default()).await.unwrap().snapshot
}

/// Test that a first run deploys everything and injects `Token` into `Vault` once.
#[tokio::test]
async fn test_first_run_deploys_and_injects() {
    let (config, artifacts) = token_vault();
    let client = MockChainClient::new();

    let outcome =
        execute(&client, &config, &StateSnapshot::new(), &artifacts, &RunOptions::default())
            .await
            .unwrap();
    let snapshot = outcome.snapshot;

    let deployments = client.deployments();
    assert_eq!(deployments.len(), 2);
    assert!(deployments.iter().all(|d| d.from == MOCK_DEFAULT_ACCOUNT));

    let token = snapshot["Token"].address.expect("token deployed");
    let vault = snapshot["Vault"].address.expect("vault deployed");
    assert_ne!(token, vault);

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].to, vault);
    assert_eq!(calls[0].from, MOCK_DEFAULT_ACCOUNT);
    assert_eq!(injected_address(&calls[0]), token);

    assert_eq!(outcome.report.deployed, 2);
    assert_eq!(outcome.report.unchanged, 0);
    assert_eq!(outcome.report.injected, 1);
    assert_eq!(outcome.report.skipped_injections, 0);

    // The default account is resolved once for the whole run.
    assert_eq!(client.default_account_queries(), 1);
}

/// Test that rerunning against the first run's snapshot issues nothing and changes nothing.
#[tokio::test]
async fn test_rerun_is_idempotent() {
    let (config, artifacts) = token_vault();
    let first = run(&MockChainClient::new(), &config, &StateSnapshot::new(), &artifacts).await;

    let client = MockChainClient::new();
    let outcome =
        execute(&client, &config, &first, &artifacts, &RunOptions::default()).await.unwrap();

    assert_eq!(client.transaction_count(), 0);
    assert_eq!(client.default_account_queries(), 0);
    assert_eq!(outcome.snapshot, first);
    assert_eq!(outcome.report.unchanged, 2);
    assert_eq!(outcome.report.skipped_injections, 1);
}

/// Test that a changed dependency is redeployed and re-injected into an unchanged dependent.
#[tokio::test]
async fn test_changed_dependency_is_reinjected() {
    let (config, mut artifacts) = token_vault();
    let client = MockChainClient::new();
    let first = run(&client, &config, &StateSnapshot::new(), &artifacts).await;
    let old_token = first["Token"].address.unwrap();
    let vault = first["Vault"].address.unwrap();
    let (deployments_before, calls_before) = (client.deployments().len(), client.calls().len());

    artifacts.insert("Token".into(), artifact("Token", &[0xaa, 0x01], &[]));
    let snapshot = run(&client, &config, &first, &artifacts).await;

    let new_token = snapshot["Token"].address.unwrap();
    assert_ne!(new_token, old_token);
    assert_eq!(snapshot["Vault"].address, Some(vault));
    assert_eq!(snapshot["Token"].bytecode.as_ref(), &[0xaa, 0x01]);

    let deployments = client.deployments().split_off(deployments_before);
    assert_eq!(deployments.len(), 1);
    assert_eq!(deployments[0].bytecode.as_ref(), &[0xaa, 0x01]);

    let calls = client.calls().split_off(calls_before);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].to, vault);
    assert_eq!(injected_address(&calls[0]), new_token);
}

/// Test that a dry run issues no transaction and returns exactly the plan.
#[tokio::test]
async fn test_dry_run_returns_plan() {
    let (config, artifacts) = token_vault();
    let mut prior = StateSnapshot::new();
    prior.insert(
        "Token".into(),
        deployed(&artifacts["Token"], address!("0000000000000000000000000000000000000777")),
    );

    let client = MockChainClient::new();
    let outcome = execute(&client, &config, &prior, &artifacts, &RunOptions::dry_run())
        .await
        .unwrap();

    assert_eq!(client.transaction_count(), 0);
    assert_eq!(client.default_account_queries(), 0);
    assert_eq!(outcome.snapshot, plan(&config, &artifacts, &prior).unwrap().into_snapshot());
    assert_eq!(outcome.snapshot["Vault"].address, None);
    assert!(outcome.report.dry_run);
    assert_eq!(outcome.report.deployed, 1);
    assert_eq!(outcome.report.unchanged, 1);
}

/// Test that an explicit sender is used for both deployment and injection.
#[tokio::test]
async fn test_declared_sender() {
    const OWNER: Address = address!("00000000000000000000000000000000000000aa");
    let (mut config, artifacts) = token_vault();
    config.insert(
        "Vault".into(),
        DeploymentTarget::default().with_from(OWNER).with_inject("Token", "setToken"),
    );
    config.insert("Token".into(), DeploymentTarget::default().with_from(OWNER));

    let client = MockChainClient::new().without_default_account();
    run(&client, &config, &StateSnapshot::new(), &artifacts).await;

    assert!(client.deployments().iter().all(|d| d.from == OWNER));
    assert_eq!(client.calls()[0].from, OWNER);
    assert_eq!(client.default_account_queries(), 0);
}

/// Test that the configured gas limit is applied to every transaction.
#[tokio::test]
async fn test_gas_limit_option() {
    let (config, artifacts) = token_vault();
    let client = MockChainClient::new();
    let options = RunOptions { gas_limit: 4_000_000, ..Default::default() };

    execute(&client, &config, &StateSnapshot::new(), &artifacts, &options).await.unwrap();

    assert!(client.deployments().iter().all(|d| d.gas_limit == 4_000_000));
    assert!(client.calls().iter().all(|c| c.gas_limit == 4_000_000));
}

/// Test that deployments of independent contracts are in flight at the same time.
#[tokio::test]
async fn test_deployments_run_concurrently() {
    let names = ["A", "B", "C", "D"];
    let config: DeployConfig =
        names.iter().map(|n| (n.to_string(), DeploymentTarget::default())).collect();
    let artifacts: Artifacts = names
        .iter()
        .enumerate()
        .map(|(i, n)| (n.to_string(), artifact(n, &[i as u8 + 1], &[])))
        .collect();

    // Every deployment blocks until all four have been submitted.
    let client = MockChainClient::new().with_deploy_barrier(names.len());
    let outcome = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        execute(&client, &config, &StateSnapshot::new(), &artifacts, &RunOptions::default()),
    )
    .await
    .expect("deployments were serialized")
    .unwrap();

    assert_eq!(client.deployments().len(), names.len());
    assert!(outcome.snapshot.values().all(|state| state.address.is_some()));
}

/// Test that the planner's verdicts survive deployment.
#[tokio::test]
async fn test_verdicts_fixed_at_planning() {
    let (config, artifacts) = token_vault();
    let client = MockChainClient::new();
    let mut plan = plan(&config, &artifacts, &StateSnapshot::new()).unwrap();
    let senders = mega_deployer::Senders::new(&client);

    let handles =
        mega_deployer::deploy(&client, &config, &mut plan, &senders, &RunOptions::default())
            .await
            .unwrap();

    assert_eq!(handles.len(), 2);
    assert_eq!(handles["Token"].address(), plan.address_of("Token").unwrap());
    assert_eq!(plan.verdict("Token"), Some(Verdict::NeedsDeploy));
}
