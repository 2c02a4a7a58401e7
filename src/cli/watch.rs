//! taskdesk watch command implementation
//!
//! Re-reads the dashboard counters each time the store reports a change.

use std::time::{Duration, Instant};

use crate::cli::{BoardContext, Globals};
use crate::error::{Error, Result};
use crate::model::Actor;
use crate::output::{emit_success, format_human, HumanOutput};
use crate::provider::{ChangeNotifier, ChangeTable, ChangeToken};
use crate::refresh::RefreshSequencer;
use crate::stats::TaskStats;
use crate::watch::FileWatcher;

#[derive(serde::Serialize)]
struct WatchReport {
    changes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_change: Option<ChangeToken>,
    stats: Option<TaskStats>,
    timed_out: bool,
}

pub fn run(globals: &Globals, once: bool, timeout: Option<u64>) -> Result<()> {
    let deadline = timeout.map(timeout_deadline).transpose()?;
    let ctx = BoardContext::open(globals)?;
    let actor = ctx.actor(globals)?;
    let live = !globals.json && !globals.quiet;

    let watcher = FileWatcher::new(
        ctx.board.provider().storage(),
        ctx.board.config().watch.debounce_ms,
    );
    let subscription = watcher.subscribe()?;

    let sequencer: RefreshSequencer<TaskStats> = RefreshSequencer::new();
    refresh(&ctx, &actor, &sequencer)?;
    if live {
        print_stats(&sequencer, "watching for changes (Ctrl-C to stop)");
    }

    let mut changes = 0u64;
    let mut last_change = None;
    let mut timed_out = false;

    loop {
        let token = match deadline {
            Some(at) => {
                let remaining = at.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    timed_out = true;
                    break;
                }
                subscription.recv_timeout(remaining)
            }
            None => subscription.recv(),
        };
        let Some(token) = token else {
            // Either the timeout elapsed or the watcher thread stopped.
            timed_out = deadline.is_some();
            break;
        };

        changes += 1;
        tracing::debug!(sequence = token.sequence, tables = ?token.tables, "refreshing");
        if token.touches(ChangeTable::Tasks) || token.touches(ChangeTable::Profiles) {
            refresh(&ctx, &actor, &sequencer)?;
            if live {
                print_stats(&sequencer, &format!("change #{}", token.sequence));
            }
        }
        last_change = Some(token);
        if once {
            break;
        }
    }
    subscription.cancel();

    let report = WatchReport {
        changes,
        last_change,
        stats: sequencer.current(),
        timed_out,
    };

    let mut human = HumanOutput::new("taskdesk watch: stopped");
    human.push_summary("changes", changes.to_string());
    if timed_out && changes == 0 {
        human.push_warning("no changes before the timeout");
    }
    if live {
        println!("{}", format_human(&human));
        return Ok(());
    }
    emit_success(globals.plain_output(), "watch", &report, Some(&human))
}

fn timeout_deadline(secs: u64) -> Result<Instant> {
    Instant::now()
        .checked_add(Duration::from_secs(secs))
        .ok_or_else(|| Error::InvalidArgument(format!("--timeout {secs} is too large")))
}

/// Load counters under a fresh token; a slower, older load never overwrites
/// a newer one.
fn refresh(ctx: &BoardContext, actor: &Actor, sequencer: &RefreshSequencer<TaskStats>) -> Result<()> {
    let token = sequencer.begin();
    let stats = ctx.board.stats(actor)?;
    if !sequencer.complete(token, stats) {
        tracing::debug!(token = token.value(), "discarded stale refresh");
    }
    Ok(())
}

fn print_stats(sequencer: &RefreshSequencer<TaskStats>, header: &str) {
    sequencer.with_current(|stats| {
        if let Some(stats) = stats {
            let mut human = super::task::stats_human(stats);
            human.push_detail(header.to_string());
            println!("{}", format_human(&human));
        }
    });
}
