use std::error::Error;
use std::io;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt;
use tracing_subscriber::fmt::MakeWriter;

use sitewatch::engine::{IgnoreList, PendingChanges};

type TestResult = Result<(), Box<dyn Error>>;

fn pending() -> Result<PendingChanges, Box<dyn Error>> {
    let ignore = IgnoreList::from_suffixes(&[".bak".to_string(), ".bkp".to_string()])?;
    Ok(PendingChanges::new(ignore))
}

#[test]
fn duplicate_adds_collapse_into_one_entry() -> TestResult {
    let mut pending = pending()?;

    assert!(pending.add("source/page.adoc"));
    assert!(pending.add("source/page.adoc"));
    assert!(pending.add("source/page.adoc"));

    let drained = pending.drain();
    assert_eq!(drained.len(), 1);
    assert!(drained.contains("source/page.adoc"));
    Ok(())
}

#[test]
fn ignored_suffixes_never_reach_the_set() -> TestResult {
    let mut pending = pending()?;

    assert!(!pending.add("source/page.adoc.bak"));
    assert!(!pending.add("notes.bkp"));
    assert!(pending.is_empty());
    assert!(pending.drain().is_empty());
    Ok(())
}

#[test]
fn drain_clears_and_later_adds_hit_the_next_drain() -> TestResult {
    let mut pending = pending()?;

    pending.add("source/a.adoc");
    pending.add("source/b.adoc");

    let first = pending.drain();
    assert_eq!(first.len(), 2);
    assert!(pending.is_empty());

    // A path added after the snapshot belongs to the next drain only.
    pending.add("source/a.adoc");
    let second = pending.drain();
    assert_eq!(second.len(), 1);
    assert!(second.contains("source/a.adoc"));

    assert!(pending.drain().is_empty());
    Ok(())
}

/// Captures formatted log output for assertions.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn ignored_paths_log_ignoring_instead_of_file_changed() -> TestResult {
    let buffer = LogBuffer::default();
    let subscriber = fmt()
        .with_writer(buffer.clone())
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .finish();

    let mut pending = pending()?;
    tracing::subscriber::with_default(subscriber, || {
        pending.add("source/page.adoc.bak");
        pending.add("source/page.adoc");
    });

    let logs = buffer.contents();
    assert!(logs.contains("ignoring change"));
    assert!(logs.contains("page.adoc.bak"));

    // The ignored path gets no "file changed" line; the real change does.
    let changed: Vec<&str> = logs
        .lines()
        .filter(|line| line.contains("file changed"))
        .collect();
    assert_eq!(changed.len(), 1);
    assert!(changed[0].contains("source/page.adoc"));
    assert!(!changed[0].contains(".bak"));
    Ok(())
}

#[test]
fn empty_ignore_list_drops_nothing() -> TestResult {
    let mut pending = PendingChanges::new(IgnoreList::empty());

    assert!(pending.add("whatever.bak"));
    assert_eq!(pending.len(), 1);
    Ok(())
}
