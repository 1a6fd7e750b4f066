use crate::client::HttpBackend;
use crate::cmd::Backend;
use crate::output::Console;
use anyhow::Context;
use pipeline_core::config::Config;
use pipeline_core::invalidation::InvalidationHub;
use pipeline_core::session::BoardSession;
use pipeline_core::types::Taxonomy;
use std::path::Path;
use std::time::Duration;

const POLL: Duration = Duration::from_millis(200);

/// Hold a board open against a server and reprint it whenever another
/// client changes the record set. Stops after `max_updates` refreshes, or
/// when the server closes the event stream.
pub fn run(
    root: &Path,
    server: &str,
    taxonomy: Taxonomy,
    max_updates: Option<usize>,
) -> anyhow::Result<()> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    let http = HttpBackend::new(server);
    let hub = InvalidationHub::new();
    let follower = http.follow_events(hub.clone());

    let mut session = BoardSession::open(taxonomy, &config, Backend::Remote(http), Console)
        .with_context(|| format!("failed to load opportunities from {server}"))?;
    // Changes between the first fetch and the subscription would be lost;
    // one refetch after subscribing covers them.
    session.attach(&hub);
    session
        .refresh()
        .with_context(|| format!("failed to load opportunities from {server}"))?;
    print_summary(&session);

    let mut updates = 0;
    while max_updates.map_or(true, |max| updates < max) {
        if follower.is_finished() {
            break;
        }
        if session.pump_invalidations() {
            updates += 1;
            print_summary(&session);
        } else {
            std::thread::sleep(POLL);
        }
    }
    session.detach();

    if follower.is_finished() {
        follower
            .join()
            .map_err(|_| anyhow::anyhow!("event stream thread panicked"))??;
    }
    Ok(())
}

fn print_summary(session: &BoardSession<Backend, Console>) {
    let line: Vec<String> = session
        .partition()
        .aggregate()
        .iter()
        .map(|s| format!("{} {}", s.label, s.count))
        .collect();
    if session.needs_refresh() {
        println!("{}  (stale)", line.join(" | "));
    } else {
        println!("{}", line.join(" | "));
    }
}
