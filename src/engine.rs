use crate::record::Project;
use crate::schema::ColumnSchema;
use crate::source::transport::Transport;
use crate::source::{resolve_records, Resolved, SelectionMode, SourceSpec, SourceTag};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

const LOG_CAPACITY: usize = 200;

/// Commands the presentation layer sends to the data engine.
#[derive(Debug, Clone, Copy)]
pub enum EngineCommand {
    Refresh(SelectionMode),
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub message: String,
}

/// Data half of the application state, published over a watch channel.
/// Filter state lives in the presentation layer; this only carries what a
/// resolution produces plus the visible failure channel.
#[derive(Debug, Clone)]
pub struct DataState {
    pub projects: Vec<Project>,
    pub source: Option<SourceTag>,
    pub loading: bool,
    pub error: Option<String>,
    pub logs: VecDeque<LogEntry>,
    /// Sequence of the newest committed resolution. Monotonic; completions
    /// carrying an older ticket are discarded instead of clobbering newer
    /// data.
    pub seq: u64,
    /// Newest ticket handed out. Only that resolution's completion may
    /// clear the loading flag.
    pub pending: u64,
}

impl DataState {
    pub fn new() -> Self {
        Self {
            projects: Vec::new(),
            source: None,
            loading: true,
            error: None,
            logs: VecDeque::with_capacity(LOG_CAPACITY),
            seq: 0,
            pending: 0,
        }
    }

    /// A resolution with this ticket is now in flight.
    pub fn begin(&mut self, ticket: u64) {
        self.pending = ticket;
        self.loading = true;
    }

    /// A resolution finished; only the newest in-flight one clears the
    /// loading flag.
    pub fn finish(&mut self, ticket: u64) {
        if ticket == self.pending {
            self.loading = false;
        }
    }

    pub fn push_log(&mut self, level: &str, message: String) {
        let time = chrono::Local::now().format("%H:%M:%S").to_string();
        if self.logs.len() >= LOG_CAPACITY {
            self.logs.pop_front();
        }
        self.logs.push_back(LogEntry {
            time,
            level: level.to_string(),
            message,
        });
    }

    /// Commit a completed resolution unless a newer one already landed.
    pub fn commit(&mut self, ticket: u64, resolved: Resolved) -> bool {
        if ticket <= self.seq {
            self.push_log(
                "WARN",
                format!("discarded stale refresh from {}", resolved.tag.label()),
            );
            return false;
        }
        self.seq = ticket;
        self.source = Some(resolved.tag);
        self.error = None;
        self.push_log(
            "INFO",
            format!("{} projects from {}", resolved.projects.len(), resolved.tag.label()),
        );
        self.projects = resolved.projects;
        true
    }

    /// Record a failed resolution. Same guard as `commit`: a failure whose
    /// ticket is older than the newest committed data is logged and dropped,
    /// never surfaced over state that loaded fine.
    pub fn fail(&mut self, ticket: u64, message: String) -> bool {
        if ticket <= self.seq {
            self.push_log("WARN", format!("discarded stale failure: {}", message));
            return false;
        }
        self.push_log("ERROR", message.clone());
        self.error = Some(message);
        true
    }
}

impl Default for DataState {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the source chain and runs resolutions. Each resolution is spawned
/// with a monotonic ticket; the watch state is only advanced by the newest
/// ticket, so a slow initial load finishing after a fast manual refresh
/// cannot overwrite it.
pub struct Engine {
    sources: Vec<SourceSpec>,
    schema: ColumnSchema,
    transport: Arc<dyn Transport>,
    state_tx: watch::Sender<DataState>,
    next_ticket: u64,
}

impl Engine {
    pub fn new(
        sources: Vec<SourceSpec>,
        schema: ColumnSchema,
        transport: Arc<dyn Transport>,
        state_tx: watch::Sender<DataState>,
    ) -> Self {
        Self {
            sources,
            schema,
            transport,
            state_tx,
            next_ticket: 0,
        }
    }

    /// Kick off the initial load, then serve refresh commands until shutdown.
    pub async fn run(mut self, mut cmd_rx: mpsc::Receiver<EngineCommand>) {
        self.spawn_resolve(SelectionMode::Auto);

        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                EngineCommand::Refresh(mode) => self.spawn_resolve(mode),
                EngineCommand::Shutdown => break,
            }
        }
    }

    fn spawn_resolve(&mut self, mode: SelectionMode) {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let sources = self.sources.clone();
        let schema = self.schema.clone();
        let transport = self.transport.clone();
        let state_tx = self.state_tx.clone();

        self.state_tx.send_modify(|s| s.begin(ticket));

        tokio::spawn(async move {
            let result = resolve_records(&sources, mode, transport.as_ref(), &schema).await;
            state_tx.send_modify(|s| {
                s.finish(ticket);
                match result {
                    Ok(resolved) => {
                        s.commit(ticket, resolved);
                    }
                    Err(e) => {
                        let message = format!("{:#}", e);
                        tracing::error!("resolution failed: {}", message);
                        s.fail(ticket, message);
                    }
                }
            });
        });
    }
}
