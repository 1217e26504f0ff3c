use clap::{App, Arg};
use satcore::command::CmdResult;
use satcore::housekeeping::HousekeepingTask;
use satcore::repos::{var_keys, VarValue};
use satcore::{executer, sim, CoreConfig, CoreContext};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let matches = App::new("satcore")
        .version("0.1.0")
        .author("Space Systems Engineering Team")
        .about("Nanosatellite onboard control core")
        .arg(
            Arg::with_name("device-id")
                .short("d")
                .long("device-id")
                .value_name("ID")
                .help("Spacecraft device identifier")
                .takes_value(true)
                .default_value("0")
                .validator(|v| {
                    v.parse::<u32>()
                        .map(|_| ())
                        .map_err(|_| "device id must be a number".to_string())
                }),
        )
        .arg(
            Arg::with_name("tick-ms")
                .short("t")
                .long("tick-ms")
                .value_name("MS")
                .help("Housekeeping tick period in milliseconds")
                .takes_value(true)
                .default_value("1000")
                .validator(|v| {
                    v.parse::<u64>()
                        .map(|_| ())
                        .map_err(|_| "tick period must be a number".to_string())
                }),
        )
        .arg(
            Arg::with_name("queue-depth")
                .short("q")
                .long("queue-depth")
                .value_name("N")
                .help("Depth of each dispatch queue")
                .takes_value(true)
                .default_value("32")
                .validator(|v| {
                    v.parse::<usize>()
                        .map(|_| ())
                        .map_err(|_| "queue depth must be a number".to_string())
                }),
        )
        .arg(
            Arg::with_name("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .help("Directory for repository snapshots (omit for in-memory stores)")
                .takes_value(true),
        )
        .get_matches();

    let config = CoreConfig {
        device_id: matches.value_of("device-id").unwrap_or("0").parse()?,
        tick_ms: matches.value_of("tick-ms").unwrap_or("1000").parse()?,
        queue_depth: matches.value_of("queue-depth").unwrap_or("32").parse()?,
        data_dir: matches.value_of("data-dir").map(PathBuf::from),
    };
    info!(
        device_id = config.device_id,
        tick_ms = config.tick_ms,
        "satcore starting"
    );

    let ctx = CoreContext::new(&config).map_err(|e| {
        error!("repository startup failed: {}", e);
        e
    })?;

    register_stock_commands(&ctx);
    sim::register_commands(&ctx.registry, &ctx.gate);

    let dispatcher = tokio::spawn(executer::run_dispatcher(ctx.clone()));
    let exec = tokio::spawn(executer::run_executer(ctx.clone()));
    let results = tokio::spawn(executer::run_results_monitor(ctx.clone()));
    let housekeeping = tokio::spawn(
        HousekeepingTask::with_default_rules(ctx.clone(), config.tick_ms).run(),
    );

    tokio::signal::ctrl_c().await?;
    info!("termination signal received, shutting down");
    ctx.shutdown().await;

    for task in [dispatcher, exec, results, housekeeping] {
        if let Err(e) = task.await {
            warn!("task join error: {}", e);
        }
    }
    info!("satcore stopped");
    Ok(())
}

/// The housekeeping rule targets. Real flight builds register the full
/// command catalog here; the core ships the handlers its own rules need.
fn register_stock_commands(ctx: &CoreContext) {
    let registry = &ctx.registry;

    registry.register("obc_prop_tle", "%d", 1, |_, _, _| {
        // Orbit propagation lives in the ADCS subsystem; this hook only
        // keeps the pipeline contract exercised in bare-core builds.
        CmdResult::Ok
    });

    let repos = Arc::clone(&ctx.repos);
    let clock = Arc::clone(&ctx.clock);
    registry.register("tm_send_status", "%d", 1, move |_, _, _| {
        let rtc = repos.vars.get(var_keys::RTC_DATE_TIME);
        info!(rtc = ?rtc, now = clock.now_epoch_s(), "telemetry status");
        CmdResult::Ok
    });

    let repos = Arc::clone(&ctx.repos);
    let clock = Arc::clone(&ctx.clock);
    registry.register("drp_add_hrs_alive", "%d", 1, move |_, params, _| {
        let Some(delta) = params.and_then(|p| p.trim().parse::<i64>().ok()) else {
            return CmdResult::SyntaxError;
        };
        let total = repos
            .vars
            .add_int(var_keys::OBC_HRS_ALIVE, delta, clock.now_epoch_s());
        info!(hours = total, "alive hours updated");
        CmdResult::Ok
    });

    let repos = Arc::clone(&ctx.repos);
    let clock = Arc::clone(&ctx.clock);
    registry.register("drp_set_op_mode", "%d", 1, move |_, params, _| {
        let Some(mode) = params.and_then(|p| p.trim().parse::<i64>().ok()) else {
            return CmdResult::SyntaxError;
        };
        repos
            .vars
            .set(var_keys::OBC_OP_MODE, VarValue::Int(mode), clock.now_epoch_s());
        CmdResult::Ok
    });
}
