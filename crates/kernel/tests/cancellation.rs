//! Cooperative, flow-scoped cancellation: an exit requested mid-dispatch
//! aborts that flow's remaining stages and nothing else.

mod common;

use std::sync::Arc;

use common::{RecordingHandler, layout};
use railyard_api::{Family, Stage};
use railyard_kernel::{LoadOptions, Pipeline};
use railyard_plugin::Command;
use tokio::task::JoinSet;

#[tokio::test]
async fn exit_in_pre_stage_skips_main_and_post() {
    let layout = layout();
    let pre = RecordingHandler::scoped(Family::COMPILE, "/sdk", &layout).exiting();
    let main = RecordingHandler::scoped(Family::COMPILE, "/sdk", &layout);
    let post = RecordingHandler::scoped(Family::COMPILE, "/sdk", &layout);

    let pipeline = Pipeline::new();
    pipeline.load(pre.clone(), LoadOptions::at(Stage::Pre)).unwrap();
    pipeline.load(main.clone(), LoadOptions::at(Stage::Main)).unwrap();
    pipeline.load(post.clone(), LoadOptions::at(Stage::Post)).unwrap();

    let cmd = Command::new(Family::COMPILE, "/project/src/a.cpp");
    let outcome = pipeline.dispatch(&cmd);

    assert!(!outcome.accepted);
    assert!(outcome.exit);
    assert_eq!(pre.hits(), 1);
    assert_eq!(main.hits(), 0);
    assert_eq!(post.hits(), 0);
    cmd.release();
}

#[tokio::test]
async fn exit_is_scoped_to_one_flow() {
    let layout = layout();
    let exiting = RecordingHandler::scoped(Family::COMPILE, "/sdk", &layout).exiting();
    let normal = RecordingHandler::scoped(Family::LINT, "/sdk", &layout);

    let pipeline = Arc::new(Pipeline::new());
    pipeline.load(exiting, LoadOptions::at(Stage::Pre)).unwrap();
    pipeline.load(normal.clone(), LoadOptions::default()).unwrap();

    let mut set = JoinSet::new();

    {
        let pipeline = Arc::clone(&pipeline);
        set.spawn(async move {
            let cmd = Command::new(Family::COMPILE, "/project/src/a.cpp");
            let outcome = pipeline.dispatch(&cmd);
            cmd.release();
            outcome
        });
    }
    {
        let pipeline = Arc::clone(&pipeline);
        set.spawn(async move {
            let cmd = Command::new(Family::LINT, "/project/src/a.cpp");
            let outcome = pipeline.dispatch(&cmd);
            cmd.release();
            outcome
        });
    }

    let mut cancelled = 0;
    let mut completed = 0;
    while let Some(result) = set.join_next().await {
        let outcome = result.unwrap();
        if outcome.exit {
            cancelled += 1;
            assert!(!outcome.accepted);
        } else {
            completed += 1;
            assert!(outcome.accepted);
        }
    }
    assert_eq!(cancelled, 1);
    assert_eq!(completed, 1);
}

#[tokio::test]
async fn flow_flag_is_reset_between_dispatches() {
    let layout = layout();
    let handler = RecordingHandler::scoped(Family::COMPILE, "/sdk", &layout);

    let pipeline = Pipeline::new();
    pipeline.load(handler.clone(), LoadOptions::default()).unwrap();

    let cmd = Command::new(Family::COMPILE, "/project/src/a.cpp");
    pipeline.exit(&cmd);
    assert!(cmd.flow().is_tripped());

    // A fresh top-level dispatch of the same command starts clean.
    let outcome = pipeline.dispatch(&cmd);
    assert!(outcome.accepted);
    assert!(!outcome.exit);
    assert_eq!(handler.hits(), 1);
    cmd.release();
}
