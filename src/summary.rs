use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// The plain-text run log: a header, one line per row describing its fate,
/// and a footer counting and listing the keys that failed lookup. Generic
/// over the writer so tests capture the log in memory.
pub(crate) struct RunSummary<W: Write> {
    out: W,
}

impl RunSummary<BufWriter<File>> {
    pub(crate) fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        RunSummary::new(BufWriter::new(file))
    }
}

impl<W: Write> RunSummary<W> {
    pub(crate) fn new(mut out: W) -> io::Result<Self> {
        writeln!(out, "SUMMARY OF SITES:")?;
        Ok(RunSummary { out })
    }

    pub(crate) fn institutional_control(&mut self, key: &str) -> io::Result<()> {
        writeln!(self.out, "Site {key} is an institutional control.")
    }

    pub(crate) fn engineering_control(&mut self, key: &str) -> io::Result<()> {
        writeln!(self.out, "Site {key} is an engineering control.")
    }

    pub(crate) fn no_controls(&mut self, key: &str) -> io::Result<()> {
        writeln!(self.out, "Site {key} has no controls.")
    }

    pub(crate) fn no_area_name(&mut self, key: &str) -> io::Result<()> {
        writeln!(self.out, "Site {key} has no AREA NAME value.")
    }

    pub(crate) fn unmatched_area(&mut self, key: &str) -> io::Result<()> {
        writeln!(
            self.out,
            "Site {key} has an AREA NAME value but it does not match controls in the service."
        )
    }

    pub(crate) fn lookup_failed(&mut self, key: &str) -> io::Result<()> {
        writeln!(self.out, "Site {key} not found in the RCRAInfo web service.")
    }

    /// Close out the log with the failed-key tally and listing.
    pub(crate) fn finish(mut self, bad_sites: &[String]) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out)?;
        writeln!(
            self.out,
            "There were {} EPA IDs that were not successful:",
            bad_sites.len()
        )?;
        for site in bad_sites {
            writeln!(self.out, "{site}")?;
        }
        self.out.flush()
    }
}
