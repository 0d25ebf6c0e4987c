//! Streams reporter lines from the blocking worker to the terminal

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use wallet_migration::MessageSink;

const CANDIDATE_PREFIX: &str = "Wallet '";

/// Sink forwarding each line to the printer task
#[derive(Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<String>,
}

impl MessageSink for ChannelSink {
    fn emit(&self, line: &str) {
        // Receiver gone means the printer stopped; nothing left to show
        let _ = self.tx.send(line.to_string());
    }
}

/// Create a sink and the receiving end for [`spawn_printer`]
pub fn channel() -> (ChannelSink, UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink { tx }, rx)
}

fn spinner(draw_target: ProgressDrawTarget) -> ProgressBar {
    let spinner = ProgressBar::with_draw_target(None, draw_target);
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner
}

/// Write every line to `out` until all senders are dropped, keeping a
/// spinner on stderr. Lines are written whether or not the spinner is
/// visible. Returns the number of lines written.
pub fn spawn_printer<W>(
    mut rx: UnboundedReceiver<String>,
    mut out: W,
    draw_target: ProgressDrawTarget,
) -> JoinHandle<io::Result<usize>>
where
    W: Write + Send + 'static,
{
    let spinner = spinner(draw_target);
    spinner.enable_steady_tick(Duration::from_millis(120));

    tokio::spawn(async move {
        let mut written = 0usize;
        while let Some(line) = rx.recv().await {
            if let Some(name) = candidate_name(&line) {
                spinner.set_message(format!("Migrating '{}'", name));
            }
            spinner.suspend(|| writeln!(out, "{}", line).and_then(|()| out.flush()))?;
            written += 1;
        }
        spinner.finish_and_clear();
        Ok::<_, io::Error>(written)
    })
}

/// Wallet name from a candidate header line
fn candidate_name(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(CANDIDATE_PREFIX)?;
    let end = rest.rfind("' is legacy")?;
    Some(&rest[..end])
}
