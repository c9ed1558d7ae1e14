//! Text output formatter

use std::error::Error;
use std::fmt;

use gsmc_core::{Entry, Outcome, Report};

/// Plain text rendering of a report.
pub struct TextReport<'a> {
    report: &'a Report,
    verbose: bool,
}

impl<'a> TextReport<'a> {
    pub fn new(report: &'a Report, verbose: bool) -> Self {
        Self { report, verbose }
    }

    fn entry(&self, f: &mut fmt::Formatter<'_>, entry: &Entry) -> fmt::Result {
        let name = entry.label.as_deref().unwrap_or(&entry.origin);
        let peer = if entry.peer { " (peer)" } else { "" };

        match &entry.outcome {
            Outcome::Synced { path, size_mib } => writeln!(
                f,
                "synced    {}{} -> {} ({:.2} MiB)",
                name,
                peer,
                path.display(),
                size_mib
            ),
            Outcome::Passed { status } => {
                writeln!(f, "passed    {}{} (HTTP {})", name, peer, status)
            }
            Outcome::Skipped(reason) => writeln!(f, "skipped   {}{}: {}", name, peer, reason),
            Outcome::Checked(satisfaction) => {
                let verdict = if satisfaction.satisfied {
                    "satisfied"
                } else {
                    "unmet    "
                };
                writeln!(f, "{} {}{}", verdict, name, peer)?;
                for (label, present) in &satisfaction.required {
                    let state = if *present { "present" } else { "missing" };
                    writeln!(f, "    required      {} ({})", label, state)?;
                }
                for (label, present) in &satisfaction.incompatible {
                    let state = if *present { "CONFLICT" } else { "absent" };
                    writeln!(f, "    incompatible  {} ({})", label, state)?;
                }
                for (label, present) in &satisfaction.optional {
                    let state = if *present { "present" } else { "absent" };
                    writeln!(f, "    optional      {} ({})", label, state)?;
                }
                Ok(())
            }
            Outcome::Failed { error, nearest } => {
                writeln!(f, "failed    {}: {}", entry.origin, error.cause())?;
                if self.verbose {
                    writeln!(f, "    {}", error)?;
                    let mut source = error.source();
                    while let Some(cause) = source {
                        writeln!(f, "    caused by: {}", cause)?;
                        source = cause.source();
                    }
                }
                for support in nearest {
                    writeln!(
                        f,
                        "    {} supports {} .. {}",
                        support.platform,
                        support.oldest.join(", "),
                        support.newest.join(", ")
                    )?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.report.entries {
            self.entry(f, entry)?;
        }

        for conflict in &self.report.conflicts {
            writeln!(
                f,
                "conflict  '{}' is present but another source is incompatible with it",
                conflict
            )?;
        }

        writeln!(f)?;
        writeln!(f, "{}", self.report.summary())
    }
}
