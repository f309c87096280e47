use std::error::Error;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use sitewatch::config::model::RewriteRule;
use sitewatch::engine::{
    BuildOutcome, BuildScheduler, ChangeKind, IgnoreList, PendingChanges, Runtime, RuntimeEvent,
    RuntimeOptions,
};
use sitewatch::exec::BuildRequest;
use sitewatch::mapper::{CommandMapper, Scope};
use sitewatch::reload::ChannelReloadNotifier;

type TestResult = Result<(), Box<dyn Error>>;

const UNSCOPED: &str = "middleman build";
const SCOPED: &str = "middleman build --glob='{glob}' --no-clean";

const TICK: Duration = Duration::from_millis(100);

struct Harness {
    rt_tx: mpsc::Sender<RuntimeEvent>,
    exec_rx: mpsc::Receiver<BuildRequest>,
    reload_rx: mpsc::UnboundedReceiver<()>,
    runtime: tokio::task::JoinHandle<anyhow::Result<()>>,
}

/// Stand up a runtime whose executor is this test: build requests land in
/// `exec_rx` and the test injects `BuildCompleted` events by hand.
fn harness() -> Result<Harness, Box<dyn Error>> {
    let mapper = CommandMapper::new(
        "source",
        UNSCOPED,
        Some(SCOPED.to_string()),
        vec![RewriteRule {
            from: ".adoc".into(),
            to: ".html".into(),
        }],
    );
    let ignore = IgnoreList::from_suffixes(&[".bak".to_string()])?;
    let scheduler = BuildScheduler::new(mapper, PendingChanges::new(ignore));

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let (exec_tx, exec_rx) = mpsc::channel::<BuildRequest>(8);
    let (reload_tx, reload_rx) = mpsc::unbounded_channel::<()>();

    let runtime = Runtime::new(
        scheduler,
        RuntimeOptions {
            exit_when_idle: true,
        },
        rt_rx,
        exec_tx,
        Box::new(ChannelReloadNotifier::new(reload_tx)),
    );

    Ok(Harness {
        rt_tx,
        exec_rx,
        reload_rx,
        runtime: tokio::spawn(runtime.run()),
    })
}

fn changed(path: &str) -> RuntimeEvent {
    RuntimeEvent::PathChanged {
        path: path.to_string(),
        kind: ChangeKind::Modified,
    }
}

fn completed(exit_code: i32) -> RuntimeEvent {
    RuntimeEvent::BuildCompleted {
        outcome: BuildOutcome {
            exit_code,
            output: if exit_code == 0 {
                String::new()
            } else {
                "boom".to_string()
            },
        },
    }
}

#[tokio::test]
async fn builds_are_single_flight_and_changes_batch_into_the_next_run() -> TestResult {
    let mut h = harness()?;

    h.rt_tx.send(changed("source/page.adoc")).await?;

    let first = timeout(TICK, h.exec_rx.recv()).await?.expect("request");
    assert_eq!(first.invocation.scope, Scope::Glob("page.html".into()));

    // Two more changes while the build is "running": no second request, and
    // no reload signal yet.
    h.rt_tx.send(changed("source/a.adoc")).await?;
    h.rt_tx.send(changed("source/b.adoc")).await?;
    assert!(timeout(TICK, h.exec_rx.recv()).await.is_err());
    assert!(h.reload_rx.try_recv().is_err());

    // Completion: reload fires once, then the retained batch dispatches.
    h.rt_tx.send(completed(0)).await?;
    timeout(TICK, h.reload_rx.recv()).await?.expect("reload");

    let second = timeout(TICK, h.exec_rx.recv()).await?.expect("request");
    assert_eq!(second.invocation.scope, Scope::AllFiles);
    assert_eq!(second.invocation.command_line, UNSCOPED);

    // Nothing new arrived: the runtime notifies, quiesces and exits
    // (exit_when_idle is set for this test).
    h.rt_tx.send(completed(0)).await?;
    timeout(TICK, h.reload_rx.recv()).await?.expect("reload");
    h.runtime.await??;

    assert!(h.exec_rx.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn failed_build_still_notifies_reload_exactly_once() -> TestResult {
    let mut h = harness()?;

    h.rt_tx.send(changed("source/page.adoc")).await?;
    timeout(TICK, h.exec_rx.recv()).await?.expect("request");

    h.rt_tx.send(completed(2)).await?;
    timeout(TICK, h.reload_rx.recv()).await?.expect("reload");
    h.runtime.await??;

    // Exactly one notification for the failed attempt.
    assert!(h.reload_rx.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn dropped_reload_listener_does_not_stop_the_scheduler() -> TestResult {
    let mut h = harness()?;

    h.rt_tx.send(changed("source/page.adoc")).await?;
    timeout(TICK, h.exec_rx.recv()).await?.expect("request");

    // A change arrives mid-build, then the reload listener goes away. The
    // failed notification is logged; the retained change must still
    // dispatch.
    h.rt_tx.send(changed("source/late.adoc")).await?;
    drop(h.reload_rx);

    h.rt_tx.send(completed(0)).await?;
    let next = timeout(TICK, h.exec_rx.recv()).await?.expect("request");
    assert_eq!(next.invocation.scope, Scope::Glob("late.html".into()));

    h.rt_tx.send(completed(0)).await?;
    h.runtime.await??;
    Ok(())
}

#[tokio::test]
async fn ignored_changes_trigger_no_build_and_no_reload() -> TestResult {
    let mut h = harness()?;

    h.rt_tx.send(changed("source/page.adoc.bak")).await?;
    h.rt_tx.send(RuntimeEvent::ShutdownRequested).await?;
    h.runtime.await??;

    assert!(h.exec_rx.try_recv().is_err());
    assert!(h.reload_rx.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn continuous_changes_keep_the_runtime_draining() -> TestResult {
    let mut h = harness()?;

    h.rt_tx.send(changed("source/p.adoc")).await?;
    timeout(TICK, h.exec_rx.recv()).await?.expect("request");

    // Each completion finds a fresh change and immediately re-dispatches.
    for i in 0..3 {
        h.rt_tx.send(changed(&format!("source/q{i}.adoc"))).await?;
        h.rt_tx.send(completed(0)).await?;
        timeout(TICK, h.reload_rx.recv()).await?.expect("reload");
        timeout(TICK, h.exec_rx.recv()).await?.expect("request");
    }

    // Final completion with nothing pending: exit.
    h.rt_tx.send(completed(0)).await?;
    timeout(TICK, h.reload_rx.recv()).await?.expect("reload");
    h.runtime.await??;
    Ok(())
}
