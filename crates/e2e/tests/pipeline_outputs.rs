//! Output propagation between blocks, registration precedence, and the
//! execution report.

use testforge_e2e::blocks::{
    AssertStringBlock, AsyncTokenBlock, BoolReturnBlock, ConsumerBlock, ProducerBlock,
    TokenConsumerCleanupBlock,
};
use testforge_e2e::dependencies::Expected;
use testforge_framework::{
    BlockOutcome, BlockPhase, ExecuteArgs, FrameworkError, TestBuilder, TestCaseError,
};

#[tokio::test]
async fn output_flows_to_later_blocks() {
    let mut tc = TestBuilder::new()
        .add_test_block::<ProducerBlock>()
        .add_test_block::<ConsumerBlock>()
        .build();

    tc.execute().await.unwrap();
    assert!(tc.passed());
}

#[tokio::test]
async fn output_is_unavailable_before_its_producer() {
    // Consumer registered ahead of the producer: its resolution must miss.
    let mut tc = TestBuilder::new()
        .add_test_block::<ConsumerBlock>()
        .add_test_block::<ProducerBlock>()
        .build();

    let err = tc.execute().await.unwrap_err();
    assert!(!tc.passed());

    let failure = match &err {
        TestCaseError::BlockFailed { failure } => failure,
        other => panic!("expected a block failure, got: {other}"),
    };
    let resolution = failure.error.downcast_ref::<FrameworkError>().unwrap();
    assert!(matches!(
        resolution,
        FrameworkError::MissingDependency { type_name, .. } if type_name.contains("Widget")
    ));

    // The producer after the failure was skipped, not run.
    let report = tc.report().unwrap();
    assert_eq!(report.blocks[1].outcome, BlockOutcome::Skipped);
}

#[tokio::test]
async fn last_registration_wins() {
    let mut tc = TestBuilder::new()
        .add_dependency_instance("first".to_string())
        .add_dependency_instance("second".to_string())
        .add_dependency_instance(Expected("second".to_string()))
        .add_test_block::<AssertStringBlock>()
        .build();

    tc.execute().await.unwrap();
    assert!(tc.passed());
}

#[tokio::test]
async fn literal_args_shadow_pool_entries() {
    let mut tc = TestBuilder::new()
        .add_dependency_instance("pool".to_string())
        .add_dependency_instance(Expected("literal".to_string()))
        .add_test_block_with::<AssertStringBlock>(ExecuteArgs::new().arg("literal".to_string()))
        .build();

    tc.execute().await.unwrap();
    assert!(tc.passed());
}

#[tokio::test]
async fn awaited_output_is_visible_to_the_next_block() {
    // The token is published only after the producer's suspension
    // completes; the consumer still sees it.
    let mut tc = TestBuilder::new()
        .add_test_block::<AsyncTokenBlock>()
        .add_test_block::<TokenConsumerCleanupBlock>()
        .build();

    tc.execute().await.unwrap();
    assert!(tc.passed());
}

#[tokio::test]
async fn execution_report_is_serializable() {
    let mut tc = TestBuilder::new()
        .add_dependency_instance(true)
        .add_test_block::<BoolReturnBlock>()
        .add_cleanup_block::<TokenConsumerCleanupBlock>()
        .add_test_block::<ProducerBlock>()
        .build();

    // The cleanup block wants a SessionToken nobody published.
    let err = tc.execute().await.unwrap_err();
    assert!(matches!(err, TestCaseError::CleanupFailed { .. }));
    assert!(tc.passed());

    let report = tc.report().unwrap();
    let json = serde_json::to_value(report).unwrap();
    assert_eq!(json["passed"], true);
    assert!(json["run_id"].is_string());

    let blocks = json["blocks"].as_array().unwrap();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[2]["phase"], "cleanup");
    assert_eq!(blocks[2]["outcome"], "failed");

    let phases: Vec<BlockPhase> = vec![BlockPhase::Main, BlockPhase::Main, BlockPhase::Cleanup];
    let reported: Vec<BlockPhase> = report.blocks.iter().map(|block| block.phase).collect();
    assert_eq!(reported, phases);
}
