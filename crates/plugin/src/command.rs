use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use railyard_api::{CommandId, Family, Payload, ResultCode, ScopePath};
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// One pending asynchronous sub-operation attached to a command.
///
/// Handlers spawn their long-running work onto the runtime and attach the
/// handle; the kernel never blocks on it. A panicked task surfaces as a fault
/// in the aggregate, an aborted task as a cancellation.
pub type SubOperation = JoinHandle<ResultCode>;

/// Pool of recycled sub-operation lists shared by all commands.
static OP_POOL: Lazy<Mutex<Vec<Vec<SubOperation>>>> = Lazy::new(|| Mutex::new(Vec::new()));

const OP_POOL_LIMIT: usize = 32;

fn pooled_ops() -> Vec<SubOperation> {
    OP_POOL
        .lock()
        .ok()
        .and_then(|mut pool| pool.pop())
        .unwrap_or_default()
}

fn return_ops(mut ops: Vec<SubOperation>) {
    ops.clear();
    if let Ok(mut pool) = OP_POOL.lock() {
        if pool.len() < OP_POOL_LIMIT {
            pool.push(ops);
        }
    }
}

/// Cooperative cancellation flag for the logical flow a command rides on.
///
/// The kernel resets it at the start of every top-level dispatch and observes
/// it between stages; nothing else in the process is affected by a trip.
#[derive(Debug, Default)]
pub struct FlowToken {
    tripped: AtomicBool,
}

impl FlowToken {
    /// Mark the flow for exit. Emits the cancellation diagnostic once per
    /// dispatch; repeat trips within the same dispatch stay silent.
    pub fn trip(&self) {
        if !self.tripped.swap(true, Ordering::AcqRel) {
            warn!("flow cancellation requested; remaining dispatch stages will be skipped");
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    /// Clear the flag at the start of a top-level dispatch.
    pub fn reset(&self) {
        self.tripped.store(false, Ordering::Release);
    }
}

/// Envelope routed through the pipeline: an immutable routing key and target
/// path, an append-only list of attached asynchronous sub-operations, and the
/// aggregate result derived from them on demand.
#[derive(Debug)]
pub struct Command {
    id: CommandId,
    target: ScopePath,
    payload: Arc<Payload>,
    ops: Mutex<Vec<SubOperation>>,
    flow: FlowToken,
}

impl Command {
    /// Ordinary command: the id is the family itself.
    pub fn new(family: Family, target: impl AsRef<std::path::Path>) -> Self {
        Self::with_id(CommandId::from_family(family), target)
    }

    /// Specialized command with an explicit template component.
    pub fn with_id(id: CommandId, target: impl AsRef<std::path::Path>) -> Self {
        Self {
            id,
            target: ScopePath::new(target),
            payload: Arc::new(Payload::None),
            ops: Mutex::new(pooled_ops()),
            flow: FlowToken::default(),
        }
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Arc::new(payload);
        self
    }

    pub fn id(&self) -> CommandId {
        self.id
    }

    pub fn family(&self) -> Family {
        self.id.family()
    }

    pub fn target(&self) -> &ScopePath {
        &self.target
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn flow(&self) -> &FlowToken {
        &self.flow
    }

    /// Mark the calling flow for cooperative exit. The in-progress dispatch
    /// observes the flag between stages and aborts.
    pub fn request_exit(&self) {
        self.flow.trip();
    }

    /// Build a follow-up command that widens the routing key by OR-ing in
    /// `extra`, reusing this command's target and payload. The new command
    /// rides its own flow and owns its own sub-operation list.
    pub fn derive(&self, extra: Family) -> Self {
        Self {
            id: self.id.widen(extra),
            target: self.target.clone(),
            payload: Arc::clone(&self.payload),
            ops: Mutex::new(pooled_ops()),
            flow: FlowToken::default(),
        }
    }

    /// Record one pending asynchronous sub-operation. Valid from within
    /// `process` and afterwards, up until the producer observes the aggregate.
    pub fn attach(&self, op: SubOperation) {
        match self.ops.lock() {
            Ok(mut ops) => ops.push(op),
            Err(_) => {
                warn!(command = %self.id, "operation list poisoned; dropping attached sub-operation");
                op.abort();
            }
        }
    }

    /// Await every attached sub-operation and reduce their codes.
    ///
    /// The aggregate is the first non-success code in attachment order. Any
    /// faulted (panicked) sub-operation makes the aggregate the generic
    /// failure code after logging every fault; a cancelled sub-operation does
    /// the same. Sub-operations attached while the aggregate is being awaited
    /// are drained too.
    pub async fn wait(&self) -> ResultCode {
        let mut first_nonzero: Option<ResultCode> = None;
        let mut failed = false;

        loop {
            let drained = {
                let Ok(mut ops) = self.ops.lock() else {
                    return ResultCode::FAILURE;
                };
                std::mem::take(&mut *ops)
            };
            if drained.is_empty() {
                break;
            }

            for op in drained {
                match op.await {
                    Ok(code) => {
                        if !code.is_success() && first_nonzero.is_none() {
                            first_nonzero = Some(code);
                        }
                    }
                    Err(err) if err.is_cancelled() => {
                        warn!(command = %self.id, "sub-operation cancelled");
                        failed = true;
                    }
                    Err(err) => {
                        error!(command = %self.id, %err, "sub-operation faulted");
                        failed = true;
                    }
                }
            }
        }

        if failed {
            ResultCode::FAILURE
        } else {
            first_nonzero.unwrap_or(ResultCode::SUCCESS)
        }
    }

    /// Return the internal operation list to the shared pool and clear
    /// references. Safe to call repeatedly; still-pending handles are
    /// detached, not aborted.
    pub fn release(&self) {
        let taken = match self.ops.lock() {
            Ok(mut ops) => std::mem::take(&mut *ops),
            Err(_) => return,
        };
        return_ops(taken);
    }
}

impl Drop for Command {
    fn drop(&mut self) {
        self.release();
    }
}
