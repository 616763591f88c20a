use std::sync::Arc;

use crate::queue::BoundedQueue;

/// Where a subscription hands incoming data
pub(crate) enum DataHandler<T> {
    /// Store for later retrieval, dropping the oldest entry when full
    Queue(Arc<BoundedQueue<T>>),

    /// Process immediately on the delivering thread
    Callback(Arc<dyn Fn(T) + Send + Sync>),
}

impl<T> DataHandler<T> {
    pub(crate) fn handle(&self, data: T) {
        match self {
            DataHandler::Queue(queue) => {
                if queue.push(data) {
                    tracing::warn!("[SUB] Queue full, dropped oldest entry");
                }
            }
            DataHandler::Callback(cb) => cb(data),
        }
    }
}
