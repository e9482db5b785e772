use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type ExecutorHandle = Arc<dyn TaskExecutor>;

pub trait Task: Future<Output = ()> + Send {}
impl<T: Future<Output = ()> + Send> Task for T {}

/// The host scheduler a Node's Cells run their dispatch loops on. A thin seam
/// over `tokio::runtime::Handle` rather than a bare `tokio::spawn` call, so a
/// Node never hard-codes which runtime it rides on.
pub trait TaskExecutor: Send + Sync {
    fn spawn(&self, future: Pin<Box<dyn Task>>) -> TaskHandle;
}

#[derive(Debug)]
pub struct JoinError(tokio::task::JoinError);

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "actor task ended abnormally: {}", self.0)
    }
}

impl Error for JoinError {}

pub struct TaskHandle(tokio::task::JoinHandle<()>);

impl TaskHandle {
    pub fn abort(&self) {
        self.0.abort();
    }
}

impl Future for TaskHandle {
    type Output = Result<(), JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> std::task::Poll<Self::Output> {
        Future::poll(Pin::new(&mut self.0), cx).map(|r| r.map_err(JoinError))
    }
}

pub fn tokio_executor() -> ExecutorHandle {
    Arc::new(TokioExecutor(tokio::runtime::Handle::current()))
}

struct TokioExecutor(tokio::runtime::Handle);

impl TaskExecutor for TokioExecutor {
    fn spawn(&self, future: Pin<Box<dyn Task>>) -> TaskHandle {
        TaskHandle(self.0.spawn(future))
    }
}
