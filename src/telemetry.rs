use anyhow::{anyhow, Result};
use tracing::{info, info_span, warn, Span};

/// Observability backend the feed providers report into.
///
/// Implementations are best-effort: callers go through [`SpanGuard`], which
/// logs and drops any error so a broken sink never changes a response.
pub trait TraceSink: Send + Sync {
    fn start_span(&self, name: &'static str) -> Result<Box<dyn SpanHandle>>;
}

/// An open span returned by [`TraceSink::start_span`].
pub trait SpanHandle {
    fn begin_sub_operation(&mut self, name: &'static str) -> Result<()>;
    fn attach_metadata(&mut self, key: &'static str, value: i64) -> Result<()>;
    fn end_sub_operation(&mut self) -> Result<()>;
    fn set_attribute(&mut self, key: &'static str, value: i64) -> Result<()>;
    fn end(&mut self) -> Result<()>;
}

/// Scoped span. The span is ended when the guard is dropped.
pub struct SpanGuard {
    name: &'static str,
    handle: Option<Box<dyn SpanHandle>>,
}

impl SpanGuard {
    pub fn start(sink: &dyn TraceSink, name: &'static str) -> Self {
        let handle = match sink.start_span(name) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Failed to start span {}: {}", name, e);
                None
            }
        };
        Self { name, handle }
    }

    pub fn begin_sub_operation(&mut self, name: &'static str) {
        self.best_effort("begin_sub_operation", |h| h.begin_sub_operation(name));
    }

    pub fn attach_metadata(&mut self, key: &'static str, value: i64) {
        self.best_effort("attach_metadata", |h| h.attach_metadata(key, value));
    }

    pub fn end_sub_operation(&mut self) {
        self.best_effort("end_sub_operation", |h| h.end_sub_operation());
    }

    pub fn set_attribute(&mut self, key: &'static str, value: i64) {
        self.best_effort("set_attribute", |h| h.set_attribute(key, value));
    }

    fn best_effort(
        &mut self,
        operation: &str,
        f: impl FnOnce(&mut Box<dyn SpanHandle>) -> Result<()>,
    ) {
        if let Some(handle) = self.handle.as_mut() {
            if let Err(e) = f(handle) {
                warn!("Span {} {} failed: {}", self.name, operation, e);
            }
        }
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if let Err(e) = handle.end() {
                warn!("Failed to end span {}: {}", self.name, e);
            }
        }
    }
}

/// Sink backed by the process-wide `tracing` subscriber.
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn start_span(&self, name: &'static str) -> Result<Box<dyn SpanHandle>> {
        let span = info_span!(
            "span",
            otel.name = name,
            app.result_length = tracing::field::Empty
        );
        Ok(Box::new(TracingSpan {
            span: Some(span),
            sub_operation: None,
        }))
    }
}

struct TracingSpan {
    span: Option<Span>,
    sub_operation: Option<Span>,
}

impl TracingSpan {
    fn span(&self) -> Result<&Span> {
        self.span.as_ref().ok_or_else(|| anyhow!("span already ended"))
    }
}

impl SpanHandle for TracingSpan {
    fn begin_sub_operation(&mut self, name: &'static str) -> Result<()> {
        if self.sub_operation.is_some() {
            return Err(anyhow!("sub-operation already open"));
        }
        let sub = info_span!(parent: self.span()?, "sub_operation", otel.name = name);
        self.sub_operation = Some(sub);
        Ok(())
    }

    fn attach_metadata(&mut self, key: &'static str, value: i64) -> Result<()> {
        let sub = self
            .sub_operation
            .as_ref()
            .ok_or_else(|| anyhow!("no open sub-operation"))?;
        info!(parent: sub, metadata = key, value, "sub-operation metadata");
        Ok(())
    }

    fn end_sub_operation(&mut self) -> Result<()> {
        self.sub_operation
            .take()
            .map(drop)
            .ok_or_else(|| anyhow!("no open sub-operation"))
    }

    fn set_attribute(&mut self, key: &'static str, value: i64) -> Result<()> {
        let span = self.span()?;
        span.record(key, value);
        info!(parent: span, attribute = key, value, "span attribute");
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.sub_operation = None;
        self.span
            .take()
            .map(drop)
            .ok_or_else(|| anyhow!("span already ended"))
    }
}

/// Sink that discards everything.
pub struct NoopSink;

impl TraceSink for NoopSink {
    fn start_span(&self, _name: &'static str) -> Result<Box<dyn SpanHandle>> {
        Ok(Box::new(NoopSpan))
    }
}

struct NoopSpan;

impl SpanHandle for NoopSpan {
    fn begin_sub_operation(&mut self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    fn attach_metadata(&mut self, _key: &'static str, _value: i64) -> Result<()> {
        Ok(())
    }

    fn end_sub_operation(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_attribute(&mut self, _key: &'static str, _value: i64) -> Result<()> {
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every call as a short string, in order.
    #[derive(Clone, Default)]
    pub struct RecordingSink {
        pub events: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingSink {
        pub fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl TraceSink for RecordingSink {
        fn start_span(&self, name: &'static str) -> Result<Box<dyn SpanHandle>> {
            self.events.lock().unwrap().push(format!("start {}", name));
            Ok(Box::new(RecordingSpan {
                events: Arc::clone(&self.events),
            }))
        }
    }

    struct RecordingSpan {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingSpan {
        fn push(&self, event: String) -> Result<()> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    impl SpanHandle for RecordingSpan {
        fn begin_sub_operation(&mut self, name: &'static str) -> Result<()> {
            self.push(format!("begin {}", name))
        }

        fn attach_metadata(&mut self, key: &'static str, value: i64) -> Result<()> {
            self.push(format!("metadata {}={}", key, value))
        }

        fn end_sub_operation(&mut self) -> Result<()> {
            self.push("end_sub_operation".to_string())
        }

        fn set_attribute(&mut self, key: &'static str, value: i64) -> Result<()> {
            self.push(format!("attribute {}={}", key, value))
        }

        fn end(&mut self) -> Result<()> {
            self.push("end".to_string())
        }
    }

    /// Collects everything a `fmt` subscriber writes.
    #[derive(Clone, Default)]
    pub struct CapturedOutput {
        buf: Arc<Mutex<Vec<u8>>>,
    }

    impl CapturedOutput {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for CapturedOutput {
        fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
            self.buf.lock().unwrap().extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Fails either on `start_span` or on every span call.
    pub struct FailingSink {
        pub fail_on_start: bool,
    }

    impl TraceSink for FailingSink {
        fn start_span(&self, _name: &'static str) -> Result<Box<dyn SpanHandle>> {
            if self.fail_on_start {
                return Err(anyhow!("collector unavailable"));
            }
            Ok(Box::new(FailingSpan))
        }
    }

    struct FailingSpan;

    impl SpanHandle for FailingSpan {
        fn begin_sub_operation(&mut self, _name: &'static str) -> Result<()> {
            Err(anyhow!("collector unavailable"))
        }

        fn attach_metadata(&mut self, _key: &'static str, _value: i64) -> Result<()> {
            Err(anyhow!("collector unavailable"))
        }

        fn end_sub_operation(&mut self) -> Result<()> {
            Err(anyhow!("collector unavailable"))
        }

        fn set_attribute(&mut self, _key: &'static str, _value: i64) -> Result<()> {
            Err(anyhow!("collector unavailable"))
        }

        fn end(&mut self) -> Result<()> {
            Err(anyhow!("collector unavailable"))
        }
    }
}
