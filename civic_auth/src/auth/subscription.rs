use tokio::task::JoinHandle;

/// Handle to a registered auth state listener
///
/// Delivery stops when the handle is unsubscribed or dropped.
#[derive(Debug)]
pub struct AuthSubscription {
    handle: JoinHandle<()>,
}

impl AuthSubscription {
    pub(crate) fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    pub fn unsubscribe(self) {
        self.handle.abort();
    }

    /// False once the listener has been stopped or the event stream closed
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
