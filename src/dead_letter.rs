use crate::event_bus::{Event, EventBus};
use crate::path::Path;

/// Absorbs every undeliverable send: to Terminated refs, Hub overflow drops,
/// unresolvable remote refs, and sends where the peer is Down at dispatch
/// time. Silent by design — it only ever publishes; consumers subscribe to
/// `DeadLetter` on the `EventBus`.
#[derive(Clone)]
pub struct DeadLetterOffice {
    bus: EventBus,
    log: slog::Logger,
}

impl DeadLetterOffice {
    pub fn new(bus: EventBus, log: slog::Logger) -> Self {
        DeadLetterOffice { bus, log }
    }

    pub fn publish(&self, recipient: Path, description: String) {
        slog::debug!(self.log, "dead letter"; "recipient" => %recipient, "message" => %description);
        self.bus.publish(Event::DeadLetter { recipient, description });
    }
}
