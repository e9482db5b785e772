use std::fmt::Debug;

/// Anything that can travel through a mailbox: cheap to clone, safe to move across
/// threads, and debug-printable (the dead-letter office formats undeliverable
/// payloads with `{:?}`).
pub trait Message: Debug + Clone + Send + 'static {}
impl<T: Debug + Clone + Send + 'static> Message for T {}
