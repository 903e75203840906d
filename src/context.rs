use tendermint_proto::v0_38::abci::{Event, EventAttribute};

/// The phase of transaction processing a call is running in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecMode {
    /// Block execution. The only mode whose writes reach consensus state.
    #[default]
    Deliver,
    /// First admission of a transaction into the mempool.
    Check,
    /// Re-admission of a mempool transaction after a new block.
    ReCheck,
    /// Gas estimation.
    Simulate,
}

/// Per-block execution context: the block header fields the oracle reads and
/// the events it emits.
#[derive(Clone, Debug, Default)]
pub struct Context {
    pub height: i64,
    pub time_millis: i64,
    pub mode: ExecMode,
    pub events: Vec<Event>,
}

impl Context {
    pub fn new(height: i64, time_millis: i64) -> Self {
        Context {
            height,
            time_millis,
            ..Default::default()
        }
    }

    pub fn from_seconds(height: i64, seconds: i64) -> Self {
        Self::new(height, seconds * 1000)
    }

    pub fn with_mode(mut self, mode: ExecMode) -> Self {
        self.mode = mode;
        self
    }

    /// Block time in whole seconds since the Unix epoch.
    pub fn unix_seconds(&self) -> i64 {
        self.time_millis.div_euclid(1000)
    }

    pub fn emit_event(&mut self, kind: &str, attributes: &[(&str, String)]) {
        self.events.push(Event {
            r#type: kind.to_string(),
            attributes: attributes
                .iter()
                .map(|(key, value)| EventAttribute {
                    key: key.to_string(),
                    value: value.clone(),
                    index: true,
                })
                .collect(),
        });
    }

    /// Returns the events of the given type, in emission order.
    pub fn events_of(&self, kind: &str) -> Vec<&Event> {
        self.events.iter().filter(|e| e.r#type == kind).collect()
    }
}

/// Looks up an attribute value on an event.
pub fn attribute<'a>(event: &'a Event, key: &str) -> Option<&'a str> {
    event
        .attributes
        .iter()
        .find(|attr| attr.key == key)
        .map(|attr| attr.value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_seconds_floors() {
        assert_eq!(Context::new(1, 1_999).unix_seconds(), 1);
        assert_eq!(Context::from_seconds(1, 60).unix_seconds(), 60);
    }

    #[test]
    fn emit_and_find() {
        let mut ctx = Context::new(1, 0);
        ctx.emit_event("a", &[("k", "v".to_string())]);
        ctx.emit_event("b", &[]);
        let events = ctx.events_of("a");
        assert_eq!(events.len(), 1);
        assert_eq!(attribute(events[0], "k"), Some("v"));
        assert_eq!(attribute(events[0], "x"), None);
    }
}
