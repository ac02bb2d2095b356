use std::cell::RefCell;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use evs_core::errors::{ErrorInfo, EvsError};

use crate::record::{Column, OutputRecord, COLUMN_COUNT};

fn sink_error(code: &str, err: impl ToString) -> EvsError {
    EvsError::Sink(ErrorInfo::new(code, err.to_string()))
}

/// Persistent writer receiving one mini-tree record per event.
pub trait RecordSink {
    /// Declares the column layout; called once before the first write.
    fn register_schema(&mut self, columns: &[Column]) -> Result<(), EvsError>;

    /// Persists one record.
    fn write(&mut self, record: OutputRecord) -> Result<(), EvsError>;

    /// Flushes and releases the output.
    fn close(&mut self) -> Result<(), EvsError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    Open,
    Registered,
    Closed,
}

fn check_writable(state: SinkState) -> Result<(), EvsError> {
    match state {
        SinkState::Registered => Ok(()),
        SinkState::Open => Err(sink_error("sink.schema", "schema not registered")),
        SinkState::Closed => Err(sink_error("sink.closed", "sink already closed")),
    }
}

/// Mini-tree rows as CSV, one header line of column names.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    state: SinkState,
    written: u64,
}

impl CsvSink<File> {
    /// Creates (or truncates) the CSV file at `path`.
    pub fn create(path: &Path) -> Result<Self, EvsError> {
        let writer = csv::Writer::from_path(path).map_err(|err| {
            sink_error("sink.create", err).with_context("path", path.display().to_string())
        })?;
        Ok(Self::with_writer(writer))
    }
}

impl<W: Write> CsvSink<W> {
    /// Wraps an arbitrary writer.
    pub fn new(inner: W) -> Self {
        Self::with_writer(csv::Writer::from_writer(inner))
    }

    fn with_writer(writer: csv::Writer<W>) -> Self {
        Self {
            writer,
            state: SinkState::Open,
            written: 0,
        }
    }

    /// Number of records written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W, EvsError> {
        self.writer
            .into_inner()
            .map_err(|err| sink_error("sink.flush", err))
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn register_schema(&mut self, columns: &[Column]) -> Result<(), EvsError> {
        if self.state != SinkState::Open {
            return Err(sink_error("sink.schema", "schema already registered"));
        }
        if columns.len() != COLUMN_COUNT {
            return Err(sink_error("sink.schema", "unexpected column count")
                .with_context("columns", columns.len().to_string()));
        }
        self.writer
            .write_record(columns.iter().map(|column| column.name))
            .map_err(|err| sink_error("sink.write", err))?;
        self.state = SinkState::Registered;
        Ok(())
    }

    fn write(&mut self, record: OutputRecord) -> Result<(), EvsError> {
        check_writable(self.state)?;
        self.writer
            .write_record(record.values().iter().map(f64::to_string))
            .map_err(|err| {
                sink_error("sink.write", err).with_context("row", self.written.to_string())
            })?;
        self.written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), EvsError> {
        if self.state == SinkState::Closed {
            return Ok(());
        }
        self.writer
            .flush()
            .map_err(|err| sink_error("sink.flush", err))?;
        self.state = SinkState::Closed;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryStore {
    schema: Option<Vec<&'static str>>,
    records: Vec<OutputRecord>,
    closed: bool,
}

/// Sink keeping every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    store: Rc<RefCell<MemoryStore>>,
}

/// Read access to a [`MemorySink`] after it has been moved into a pipeline.
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    store: Rc<RefCell<MemoryStore>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of the stored records.
    pub fn handle(&self) -> MemoryHandle {
        MemoryHandle {
            store: Rc::clone(&self.store),
        }
    }
}

impl MemoryHandle {
    /// Records written so far.
    pub fn records(&self) -> Vec<OutputRecord> {
        self.store.borrow().records.clone()
    }

    /// Registered column names, if any.
    pub fn schema(&self) -> Option<Vec<&'static str>> {
        self.store.borrow().schema.clone()
    }

    /// True once the sink was closed.
    pub fn is_closed(&self) -> bool {
        self.store.borrow().closed
    }
}

impl RecordSink for MemorySink {
    fn register_schema(&mut self, columns: &[Column]) -> Result<(), EvsError> {
        let mut store = self.store.borrow_mut();
        if store.schema.is_some() {
            return Err(sink_error("sink.schema", "schema already registered"));
        }
        store.schema = Some(columns.iter().map(|column| column.name).collect());
        Ok(())
    }

    fn write(&mut self, record: OutputRecord) -> Result<(), EvsError> {
        let mut store = self.store.borrow_mut();
        if store.closed {
            return Err(sink_error("sink.closed", "sink already closed"));
        }
        if store.schema.is_none() {
            return Err(sink_error("sink.schema", "schema not registered"));
        }
        store.records.push(record);
        Ok(())
    }

    fn close(&mut self) -> Result<(), EvsError> {
        self.store.borrow_mut().closed = true;
        Ok(())
    }
}
