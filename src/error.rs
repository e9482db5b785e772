use std::error::Error as StdError;
use std::fmt;

use crate::path::{NodeId, Path};

/// The error taxonomy the kernel itself distinguishes (see the error design section
/// of the spec this crate implements). Every other failure mode is an event on the
/// `EventBus`, not a `Result`.
pub enum CorvidError {
    UserFailure(String),
    NameConflict(Path),
    InvalidPath(String),
    InvalidNodeId(String),
    NodeLost(NodeId),
    MailboxOverflow(Path),
    DeliveryFailed(Path),
}

impl StdError for CorvidError {
    fn description(&self) -> &str {
        match *self {
            CorvidError::UserFailure(_) => "actor hook raised a failure",
            CorvidError::NameConflict(_) => "an actor at this path already exists",
            CorvidError::InvalidPath(_) => "path failed grammar validation",
            CorvidError::InvalidNodeId(_) => "node id failed grammar validation",
            CorvidError::NodeLost(_) => "remote peer considered down",
            CorvidError::MailboxOverflow(_) => "mailbox high-water mark exceeded",
            CorvidError::DeliveryFailed(_) => "message could not be delivered",
        }
    }
}

impl fmt::Display for CorvidError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CorvidError::UserFailure(reason) => write!(f, "user failure: {}", reason),
            CorvidError::NameConflict(path) => write!(f, "name conflict at {}", path),
            CorvidError::InvalidPath(path) => write!(f, "invalid path: {}", path),
            CorvidError::InvalidNodeId(id) => write!(f, "invalid node id: {}", id),
            CorvidError::NodeLost(id) => write!(f, "node lost: {}", id),
            CorvidError::MailboxOverflow(path) => write!(f, "mailbox overflow at {}", path),
            CorvidError::DeliveryFailed(path) => write!(f, "delivery failed to {}", path),
        }
    }
}

impl fmt::Debug for CorvidError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Internal error when a message can't be added to an actor's mailbox: the
/// mailbox side of a send that failed because the Cell is already gone.
#[doc(hidden)]
#[derive(Clone)]
pub struct MsgError<T> {
    pub msg: T,
}

impl<T> MsgError<T> {
    pub fn new(msg: T) -> Self {
        MsgError { msg }
    }
}

impl<T> StdError for MsgError<T> {
    fn description(&self) -> &str {
        "the actor does not exist; it may have been terminated"
    }
}

impl<T> fmt::Display for MsgError<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("the actor does not exist; it may have been terminated")
    }
}

impl<T> fmt::Debug for MsgError<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Error type returned when spawning an actor fails.
pub enum CreateError {
    Panicked,
    InvalidName(String),
    AlreadyExists(Path),
}

impl StdError for CreateError {
    fn description(&self) -> &str {
        match *self {
            CreateError::Panicked => "failed to create actor: panicked while starting",
            CreateError::InvalidName(_) => "failed to create actor: invalid name",
            CreateError::AlreadyExists(_) => {
                "failed to create actor: an actor at the same path already exists"
            }
        }
    }
}

impl fmt::Display for CreateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CreateError::Panicked => f.write_str(self.description()),
            CreateError::InvalidName(name) => write!(f, "{} ({})", self.description(), name),
            CreateError::AlreadyExists(path) => write!(f, "{} ({})", self.description(), path),
        }
    }
}

impl fmt::Debug for CreateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Error type when an actor fails to restart after a `Restart` directive.
pub struct RestartError;

impl StdError for RestartError {
    fn description(&self) -> &str {
        "failed to restart actor: panicked while rebuilding behavior"
    }
}

impl fmt::Display for RestartError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl fmt::Debug for RestartError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}
