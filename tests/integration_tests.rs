use satcore::command::Command;
use satcore::pipeline::PipelineError;
use satcore::registry::CommandRegistry;
use satcore::repos::{var_keys, VarValue};
use satcore::{executer, CmdResult, CoreConfig, CoreContext};
use std::sync::Arc;
use std::time::Duration;

fn spawn_pipeline_tasks(ctx: &CoreContext) {
    tokio::spawn(executer::run_dispatcher(ctx.clone()));
    tokio::spawn(executer::run_executer(ctx.clone()));
}

/// Polls the history store until `expected` executions have landed,
/// panicking with a stall report if the pipeline stops making progress.
async fn wait_for_history_len(ctx: &CoreContext, expected: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while ctx.repos.history.len() < expected {
        assert!(
            tokio::time::Instant::now() < deadline,
            "pipeline stalled: {} of {} commands executed",
            ctx.repos.history.len(),
            expected
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_command_flows_submission_to_result() {
    let ctx = CoreContext::new(&CoreConfig::default()).unwrap();

    let repos = Arc::clone(&ctx.repos);
    ctx.registry
        .register("drp_add_hrs_alive", "%d", 1, move |_, params, _| {
            let Some(delta) = params.and_then(|p| p.trim().parse::<i64>().ok()) else {
                return CmdResult::SyntaxError;
            };
            repos.vars.add_int(var_keys::OBC_HRS_ALIVE, delta, 0);
            CmdResult::Ok
        });
    spawn_pipeline_tasks(&ctx);

    let mut cmd = Command::build(&ctx.registry, "drp_add_hrs_alive").unwrap();
    cmd.add_params("1").unwrap();
    ctx.send(cmd).await.unwrap();

    let outcome = ctx.pipeline.results.dequeue().await.unwrap();
    assert_eq!(outcome.name.as_str(), "drp_add_hrs_alive");
    assert_eq!(outcome.result, CmdResult::Ok);

    // Handler side effect landed in the variable store, and the execution
    // was recorded in history.
    assert_eq!(
        ctx.repos.vars.get(var_keys::OBC_HRS_ALIVE),
        Some(VarValue::Int(1))
    );
    let history = ctx.repos.history.recent(1);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].name, "drp_add_hrs_alive");
    assert_eq!(history[0].params.as_deref(), Some("1"));
    assert_eq!(history[0].result, CmdResult::Ok);

    ctx.shutdown().await;
}

#[tokio::test]
async fn test_unknown_command_yields_fail_outcome_without_history() {
    let ctx = CoreContext::new(&CoreConfig::default()).unwrap();
    spawn_pipeline_tasks(&ctx);

    // Built against a foreign registry, so the flight registry has never
    // heard of it: the dispatcher must reject it, not the builder.
    let ground_registry = CommandRegistry::new();
    ground_registry.register("ghost_cmd", "", 0, |_, _, _| CmdResult::Ok);
    let ghost = Command::build(&ground_registry, "ghost_cmd").unwrap();

    ctx.send(ghost).await.unwrap();
    let outcome = ctx.pipeline.results.dequeue().await.unwrap();
    assert_eq!(outcome.name.as_str(), "ghost_cmd");
    assert_eq!(outcome.result, CmdResult::Fail);
    assert!(ctx.repos.history.is_empty());

    ctx.shutdown().await;
}

#[tokio::test]
async fn test_repeat_count_runs_additional_repetitions() {
    let ctx = CoreContext::new(&CoreConfig::default()).unwrap();
    ctx.registry
        .register("obc_prop_tle", "%d", 1, |_, _, _| CmdResult::Ok);
    spawn_pipeline_tasks(&ctx);

    let mut cmd = Command::build(&ctx.registry, "obc_prop_tle").unwrap();
    cmd.add_params("0").unwrap();
    cmd.set_repeat(2);
    ctx.send(cmd).await.unwrap();

    // One submission, three executions (original + two repetitions).
    for _ in 0..3 {
        let outcome = ctx.pipeline.results.dequeue().await.unwrap();
        assert_eq!(outcome.result, CmdResult::Ok);
    }
    assert_eq!(ctx.repos.history.len(), 3);

    ctx.shutdown().await;
}

#[tokio::test]
async fn test_results_monitor_keeps_pipeline_live() {
    // Queues far smaller than the command load: the flight wiring must keep
    // the results queue drained or the executer wedges after queue-depth
    // outcomes and the stall backs up through the whole pipeline.
    let ctx = CoreContext::new(&CoreConfig {
        queue_depth: 2,
        ..CoreConfig::default()
    })
    .unwrap();
    ctx.registry
        .register("tm_send_status", "%d", 1, |_, _, _| CmdResult::Ok);
    spawn_pipeline_tasks(&ctx);
    tokio::spawn(executer::run_results_monitor(ctx.clone()));

    for _ in 0..10 {
        let mut cmd = Command::build(&ctx.registry, "tm_send_status").unwrap();
        cmd.add_params("0").unwrap();
        ctx.send(cmd).await.unwrap();
    }

    wait_for_history_len(&ctx, 10).await;
    ctx.shutdown().await;
}

#[tokio::test]
async fn test_repeat_storm_with_full_queues_completes() {
    // Depth-1 queues and every command repeating: the executer must never
    // block on the submission queue it feeds, or the dispatcher/executer
    // pair deadlocks on the first full cycle.
    let ctx = CoreContext::new(&CoreConfig {
        queue_depth: 1,
        ..CoreConfig::default()
    })
    .unwrap();
    ctx.registry
        .register("obc_prop_tle", "%d", 1, |_, _, _| CmdResult::Ok);
    spawn_pipeline_tasks(&ctx);
    tokio::spawn(executer::run_results_monitor(ctx.clone()));

    for _ in 0..20 {
        let mut cmd = Command::build(&ctx.registry, "obc_prop_tle").unwrap();
        cmd.add_params("0").unwrap();
        cmd.set_repeat(3);
        ctx.send(cmd).await.unwrap();
    }

    // 20 originals, 3 repetitions each.
    wait_for_history_len(&ctx, 80).await;
    ctx.shutdown().await;
}

#[tokio::test]
async fn test_handler_failure_reported_not_propagated() {
    let ctx = CoreContext::new(&CoreConfig::default()).unwrap();
    ctx.registry
        .register("eps_hard_reset", "", 0, |_, _, _| CmdResult::Fail);
    ctx.registry
        .register("tm_send_status", "%d", 1, |_, _, _| CmdResult::Ok);
    spawn_pipeline_tasks(&ctx);

    let failing = Command::build(&ctx.registry, "eps_hard_reset").unwrap();
    ctx.send(failing).await.unwrap();
    let outcome = ctx.pipeline.results.dequeue().await.unwrap();
    assert_eq!(outcome.result, CmdResult::Fail);

    // The executer survives failed handlers and keeps serving commands.
    let mut next = Command::build(&ctx.registry, "tm_send_status").unwrap();
    next.add_params("0").unwrap();
    ctx.send(next).await.unwrap();
    let outcome = ctx.pipeline.results.dequeue().await.unwrap();
    assert_eq!(outcome.result, CmdResult::Ok);

    ctx.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_terminates_pipeline_tasks() {
    let ctx = CoreContext::new(&CoreConfig::default()).unwrap();
    ctx.registry.register("sim_start", "", 0, |_, _, _| CmdResult::Ok);

    let dispatcher = tokio::spawn(executer::run_dispatcher(ctx.clone()));
    let exec = tokio::spawn(executer::run_executer(ctx.clone()));

    ctx.shutdown().await;
    dispatcher.await.unwrap();
    exec.await.unwrap();

    let cmd = Command::build(&ctx.registry, "sim_start").unwrap();
    assert_eq!(ctx.send(cmd).await.unwrap_err(), PipelineError::QueueClosed);
}

#[tokio::test]
async fn test_repositories_flush_and_reload_across_restart() {
    let data_dir = std::env::temp_dir().join(format!("satcore-e2e-{}", std::process::id()));
    std::fs::create_dir_all(&data_dir).unwrap();
    let config = CoreConfig {
        data_dir: Some(data_dir.clone()),
        ..CoreConfig::default()
    };

    {
        let ctx = CoreContext::new(&config).unwrap();
        ctx.repos
            .vars
            .set(var_keys::OBC_OP_MODE, VarValue::Int(3), 42);
        ctx.repos.history.append(satcore::repos::HistoryRecord {
            name: "tm_send_status".to_string(),
            params: Some("0".to_string()),
            result: CmdResult::Ok,
            executed_at: 42,
        });
        ctx.shutdown().await;
    }

    let reopened = CoreContext::new(&config).unwrap();
    assert_eq!(
        reopened.repos.vars.get(var_keys::OBC_OP_MODE),
        Some(VarValue::Int(3))
    );
    assert_eq!(reopened.repos.history.len(), 1);

    std::fs::remove_dir_all(&data_dir).ok();
}
