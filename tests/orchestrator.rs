//! Switch sequencing against a recording executor: step order, directory
//! resolution, short-circuit on failure and single-flight rejection.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{directory_store, test_config, RecordingExecutor};
use linkswitch::link::orchestrator::{Orchestrator, SwitchError};
use linkswitch::link::request::{validate, SwitchRequest, ValidatedRequest, ValidationError};

fn request(mode: &str, node: Option<&str>, talkgroup: Option<&str>) -> SwitchRequest {
    SwitchRequest {
        mode: Some(mode.into()),
        node_number: node.map(String::from),
        talkgroup: talkgroup.map(String::from),
    }
}

fn valid(mode: &str, node: Option<&str>, talkgroup: Option<&str>) -> ValidatedRequest {
    validate(&request(mode, node, talkgroup)).unwrap()
}

#[tokio::test]
async fn ysf_switch_runs_teardown_bridge_mode_and_tune() {
    let executor = Arc::new(RecordingExecutor::new());
    let orchestrator = Orchestrator::new(executor.clone(), directory_store(true).await);
    let config = test_config();

    let connected = orchestrator
        .switch_link(&config.controller, &valid("YSF", None, Some("12345")))
        .await
        .unwrap();

    assert_eq!(
        connected.message,
        "Connected to YSF talkgroup 12345 (ysf.example.org:42000)"
    );
    assert_eq!(
        connected.completed,
        ["teardown", "bridge-link", "mode-select", "tune"]
    );
    assert_eq!(
        executor.last_args(),
        [
            "rpt cmd 57686 ilink 6 0",
            "rpt fun 57686 *31999",
            "YSF",
            "ysf.example.org:42000"
        ]
    );
}

#[tokio::test]
async fn ysf_ipv6_endpoint_is_bracketed() {
    let executor = Arc::new(RecordingExecutor::new());
    let orchestrator = Orchestrator::new(executor.clone(), directory_store(true).await);

    orchestrator
        .switch_link(&test_config().controller, &valid("YSF", None, Some("34567")))
        .await
        .unwrap();

    assert_eq!(executor.last_args().last().unwrap(), "[2001:db8::7]:42002");
}

#[tokio::test]
async fn unknown_ysf_talkgroup_runs_nothing() {
    let executor = Arc::new(RecordingExecutor::new());
    let orchestrator = Orchestrator::new(executor.clone(), directory_store(true).await);

    let err = orchestrator
        .switch_link(&test_config().controller, &valid("YSF", None, Some("99999")))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SwitchError::NotFound {
            mode: linkswitch::link::Mode::Ysf,
            talkgroup: 99999
        }
    );
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn ysf_without_directory_is_unavailable() {
    let executor = Arc::new(RecordingExecutor::new());
    let orchestrator = Orchestrator::new(executor.clone(), directory_store(false).await);

    let err = orchestrator
        .switch_link(&test_config().controller, &valid("YSF", None, Some("12345")))
        .await
        .unwrap_err();

    assert_eq!(err, SwitchError::DirectoryUnavailable);
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn allstar_switch_dials_node() {
    let executor = Arc::new(RecordingExecutor::new());
    let orchestrator = Orchestrator::new(executor.clone(), directory_store(false).await);

    let connected = orchestrator
        .switch_link(&test_config().controller, &valid("ALLSTAR", Some("2000"), None))
        .await
        .unwrap();

    assert_eq!(connected.message, "Connected to Allstar node 2000");
    assert_eq!(
        executor.last_args(),
        ["rpt cmd 57686 ilink 6 0", "rpt fun 57686 *32000"]
    );
}

#[tokio::test]
async fn brandmeister_selects_stfu_and_tunes_talkgroup() {
    let executor = Arc::new(RecordingExecutor::new());
    let orchestrator = Orchestrator::new(executor.clone(), directory_store(false).await);

    let connected = orchestrator
        .switch_link(
            &test_config().controller,
            &valid("BRANDMEISTER", None, Some("3100")),
        )
        .await
        .unwrap();

    assert_eq!(connected.message, "Connected to BRANDMEISTER talkgroup 3100");
    assert_eq!(
        executor.last_args(),
        ["rpt cmd 57686 ilink 6 0", "rpt fun 57686 *31999", "STFU", "3100"]
    );
}

#[tokio::test]
async fn teardown_failure_stops_the_sequence() {
    let executor = Arc::new(RecordingExecutor::failing_on("ilink 6"));
    let orchestrator = Orchestrator::new(executor.clone(), directory_store(false).await);

    let err = orchestrator
        .switch_link(&test_config().controller, &valid("DMR", None, Some("91")))
        .await
        .unwrap_err();

    match err {
        SwitchError::Step {
            ref stage,
            ref detail,
            ref completed,
        } => {
            assert_eq!(stage, "teardown");
            assert_eq!(detail, "refused ilink 6");
            assert!(completed.is_empty());
        }
        ref other => panic!("expected step failure, got {other:?}"),
    }
    assert!(!err.left_partial_state());
    assert_eq!(executor.calls().len(), 1);
}

#[tokio::test]
async fn mid_sequence_failure_reports_completed_stages() {
    let executor = Arc::new(RecordingExecutor::failing_on("mode"));
    let orchestrator = Orchestrator::new(executor.clone(), directory_store(false).await);

    let err = orchestrator
        .switch_link(&test_config().controller, &valid("NXDN", None, Some("65000")))
        .await
        .unwrap_err();

    assert!(err.left_partial_state());
    assert_eq!(
        err.to_string(),
        "step 'mode-select' failed: refused mode (completed before failure: teardown, bridge-link)"
    );
    // tune never ran
    assert_eq!(executor.calls().len(), 3);
}

#[test]
fn allstar_without_node_number_is_rejected_before_execution() {
    let err = validate(&request("ALLSTAR", None, Some("12345"))).unwrap_err();
    assert_eq!(err, ValidationError::MissingField("nodeNumber"));
}

#[tokio::test(start_paused = true)]
async fn concurrent_switch_is_rejected_without_interleaving() {
    let executor = Arc::new(RecordingExecutor::slow(Duration::from_secs(1)));
    let orchestrator = Arc::new(Orchestrator::new(
        executor.clone(),
        directory_store(false).await,
    ));
    let config = Arc::new(test_config());

    let first = {
        let orchestrator = Arc::clone(&orchestrator);
        let config = Arc::clone(&config);
        tokio::spawn(async move {
            orchestrator
                .switch_link(&config.controller, &valid("P25", None, Some("10200")))
                .await
        })
    };

    // Let the first switch take the gate and start its teardown.
    tokio::time::sleep(Duration::from_millis(10)).await;

    let second = orchestrator
        .switch_link(&config.controller, &valid("ECHOLINK", Some("123456"), None))
        .await;
    assert_eq!(second.unwrap_err(), SwitchError::Busy);

    let connected = first.await.unwrap().unwrap();
    assert_eq!(connected.completed.len(), 4);

    // Only the first request's commands ran.
    assert_eq!(
        executor.last_args(),
        ["rpt cmd 57686 ilink 6 0", "rpt fun 57686 *31999", "P25", "10200"]
    );

    // The gate is free again afterwards.
    orchestrator
        .switch_link(&config.controller, &valid("ECHOLINK", Some("123456"), None))
        .await
        .unwrap();
}

#[tokio::test]
async fn ysf_scenario_without_bridge_link_step() {
    use linkswitch::directory::{parse_document, DirectoryStore, SnapshotOrigin};
    use linkswitch::link::Mode;

    let parsed =
        parse_document("12345;TestLink;Test Description; 10.0.0.5 ;42000;TGIF;http://dash;99\n");
    let store = DirectoryStore::empty(common::scratch_dir().join("ysf.json"));
    store
        .install(parsed.records, SnapshotOrigin::Network)
        .await
        .unwrap();

    let mut config = test_config();
    let ysf = config.controller.modes.get_mut(&Mode::Ysf).unwrap();
    ysf.steps.retain(|s| s.stage != "bridge-link");

    let executor = Arc::new(RecordingExecutor::new());
    let orchestrator = Orchestrator::new(executor.clone(), Arc::new(store));
    let connected = orchestrator
        .switch_link(&config.controller, &valid("YSF", None, Some("12345")))
        .await
        .unwrap();

    assert_eq!(connected.completed, ["teardown", "mode-select", "tune"]);
    assert_eq!(
        executor.calls()[1..]
            .iter()
            .map(|c| c.args.clone())
            .collect::<Vec<_>>(),
        [vec!["mode", "YSF"], vec!["tune", "10.0.0.5:42000"]]
    );
    assert!(connected.message.contains("12345"));
    assert!(connected.message.contains("10.0.0.5:42000"));
}
