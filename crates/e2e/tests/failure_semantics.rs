//! Failure semantics of the main pipeline: short-circuiting, preservation
//! of the original error's identity, named resolution failures, and hook
//! errors.

use test_case::test_case;
use testforge_e2e::blocks::{
    BoolReturnBlock, ExecuteArgBlock, MultipleDependenciesBlock, PostHookFailBlock,
    PreHookFailBlock, SomeDependencyBlock,
};
use testforge_e2e::dependencies::{throwing_factory, FixtureError, SomeDependency};
use testforge_framework::{
    BlockOutcome, ExecuteArgs, FrameworkError, TestBuilder, TestCaseError,
};

#[tokio::test]
async fn failure_short_circuits_and_preserves_original_error() {
    let mut tc = TestBuilder::new()
        .add_dependency_instance(false)
        .add_dependency_instance("Testing".to_string())
        .add_test_block::<BoolReturnBlock>()
        .add_test_block_with::<MultipleDependenciesBlock>(ExecuteArgs::new().arg(1i32))
        .build();

    let err = tc.execute().await.unwrap_err();
    assert!(!tc.passed());

    let failure = match &err {
        TestCaseError::BlockFailed { failure } => failure,
        other => panic!("expected a block failure, got: {other}"),
    };
    assert!(failure.block.contains("BoolReturnBlock"));

    // The inner cause is the fixture's error, untouched.
    let original = failure.error.downcast_ref::<FixtureError>().unwrap();
    assert_eq!(*original, FixtureError::BoolWasFalse);
    assert_eq!(original.to_string(), "test failure");

    // The second block never ran.
    let report = tc.report().unwrap();
    assert_eq!(report.blocks[1].outcome, BlockOutcome::Skipped);
}

#[tokio::test]
async fn missing_dependency_is_a_named_resolution_failure() {
    // No string registered for ExecuteArgBlock.
    let mut tc = TestBuilder::new().add_test_block::<ExecuteArgBlock>().build();

    let err = tc.execute().await.unwrap_err();
    assert!(!tc.passed());

    let failure = match &err {
        TestCaseError::BlockFailed { failure } => failure,
        other => panic!("expected a block failure, got: {other}"),
    };
    let resolution = failure.error.downcast_ref::<FrameworkError>().unwrap();
    assert!(matches!(
        resolution,
        FrameworkError::MissingDependency { type_name, .. } if type_name.contains("String")
    ));
    assert!(failure.error.to_string().contains("ExecuteArgBlock"));
}

#[tokio::test]
async fn nested_factory_failure_preserves_original_error() {
    let mut tc = TestBuilder::new()
        .add_dependency_factory(throwing_factory)
        .add_dependency_service::<SomeDependency>()
        .add_test_block::<SomeDependencyBlock>()
        .build();

    let err = tc.execute().await.unwrap_err();
    assert!(!tc.passed());

    let failure = err.primary().unwrap();
    let original = failure.error.downcast_ref::<FixtureError>().unwrap();
    assert_eq!(*original, FixtureError::FactoryBroke);
    assert!(original.to_string().contains("oops"));
}

#[tokio::test]
async fn pre_hook_error_fails_the_block() {
    let mut tc = TestBuilder::new().add_test_block::<PreHookFailBlock>().build();

    let err = tc.execute().await.unwrap_err();
    assert!(!tc.passed());
    let original = err.primary().unwrap().error.downcast_ref::<FixtureError>();
    assert_eq!(original, Some(&FixtureError::PreHookRejected));
}

#[tokio::test]
async fn post_hook_error_fails_the_block() {
    let mut tc = TestBuilder::new().add_test_block::<PostHookFailBlock>().build();

    let err = tc.execute().await.unwrap_err();
    assert!(!tc.passed());
    let original = err.primary().unwrap().error.downcast_ref::<FixtureError>();
    assert_eq!(original, Some(&FixtureError::PostHookRejected));
}

#[test_case(true ; "passing input")]
#[test_case(false ; "failing input")]
#[tokio::test]
async fn bool_block_outcome_follows_input(input: bool) {
    let mut tc = TestBuilder::new()
        .add_dependency_instance(input)
        .add_test_block::<BoolReturnBlock>()
        .build();

    let result = tc.execute().await;
    assert_eq!(tc.passed(), input);
    assert_eq!(result.is_ok(), input);
}
