use std::fmt;

use crate::properties::PropertyError;

/// A traversal or conversion failure that was reported instead of raised.
#[derive(Debug)]
pub struct SuppressedError {
    pub window: String,
    pub control: Option<String>,
    pub error: PropertyError,
}

impl fmt::Display for SuppressedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.control {
            Some(control) => write!(f, "{}.{}: {}", self.window, control, self.error),
            None => write!(f, "{}: {}", self.window, self.error),
        }
    }
}

type Handler = Box<dyn Fn(&SuppressedError)>;

/// Fan-out of suppressed errors to host subscribers.
#[derive(Default)]
pub struct Notifier {
    handlers: Vec<Handler>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, handler: impl Fn(&SuppressedError) + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn raise(&self, suppressed: SuppressedError) {
        tracing::warn!(
            window = %suppressed.window,
            control = suppressed.control.as_deref().unwrap_or("-"),
            err = %suppressed.error,
            "suppressed property error"
        );
        for handler in &self.handlers {
            handler(&suppressed);
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
