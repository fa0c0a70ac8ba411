//! Work item abstraction
//!
//! A work item is anything the caller wants to submit in bulk. The protocol
//! layer never inspects it beyond its identifier, which is used for logging.

/// A caller-defined descriptor with a stable identifier
pub trait WorkItem {
    /// Stable identifier of this item
    fn id(&self) -> &str;
}

impl<T: WorkItem + ?Sized> WorkItem for &T {
    fn id(&self) -> &str {
        (**self).id()
    }
}
