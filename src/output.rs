use std::path::Path;
use std::time::Duration;

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::error::SnapshotError;
use crate::snapshot::JobOutcome;

// Styling helpers

fn bright_yellow(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

fn bright_green(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().green()
}

fn red(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).red()
}

fn dim(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).dim()
}

fn magenta_bold(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).magenta().bold()
}

// Banner

pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("📸 SiteSnap"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("GitHub data snapshots for static sites")
    );
}

// Progress tracking

/// Owns the spinners of every job running in this process.
///
/// Result lines go to stdout so they survive in non-interactive CI logs,
/// where indicatif draws nothing.
pub struct Reporter {
    multi: MultiProgress,
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::stderr()),
        }
    }

    /// A reporter that draws no spinners.
    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        }
    }

    pub fn start(&self, job: &str) -> JobProgress<'_> {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("  {msg} {spinner}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(bright_yellow(format!("Fetching {job}")).to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        JobProgress {
            multi: &self.multi,
            pb,
            job: job.to_string(),
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

pub struct JobProgress<'a> {
    multi: &'a MultiProgress,
    pb: ProgressBar,
    job: String,
}

impl JobProgress<'_> {
    pub fn finish(self, outcome: &JobOutcome, path: &Path) {
        self.pb.finish_and_clear();

        let line = match outcome {
            JobOutcome::Live { summary } => format!(
                "{} {} {}",
                bright_green("✓"),
                bright_green(format!("{}: {summary}", self.job)),
                dim(format!("→ {}", path.display()))
            ),
            JobOutcome::Degraded { reason } => format!(
                "{} {} {}",
                bright_yellow("⚠"),
                bright_yellow(format!("{}: wrote fallback data ({reason})", self.job)),
                dim(format!("→ {}", path.display()))
            ),
        };
        self.multi.suspend(|| println!("{line}"));
    }

    pub fn fail(self, error: &SnapshotError) {
        self.pb.finish_and_clear();
        let line = format!("{} {}", red("✗"), red(format!("{}: {error}", self.job)));
        self.multi.suspend(|| eprintln!("{line}"));
    }
}

/// One line per job after a combined run.
pub fn print_summary(results: &[(&str, bool)]) {
    let failed = results.iter().filter(|(_, ok)| !ok).count();
    if failed == 0 {
        eprintln!("\n{}", bright_green(format!("All {} snapshots written", results.len())));
    } else {
        for (job, _) in results.iter().filter(|(_, ok)| !ok) {
            eprintln!("{}", red(format!("Snapshot failed: {job}")));
        }
    }
}
