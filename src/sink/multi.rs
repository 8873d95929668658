//! Fan-out sink forwarding each record to several member sinks.

use std::any::Any;
use std::sync::Arc;

use crate::sink::{Record, Sink, SinkError};

#[derive(Debug)]
pub struct MultiSink {
    members: Vec<(String, Arc<dyn Sink>)>,
}

impl MultiSink {
    pub fn new(members: Vec<(String, Arc<dyn Sink>)>) -> Self {
        Self { members }
    }

    /// Names of member sinks, in delivery order.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(name, _)| name.as_str())
    }
}

impl Sink for MultiSink {
    /// Every member receives the record even if an earlier one fails.
    fn accept(&self, record: &Record) -> Result<(), SinkError> {
        let mut failed = 0;
        let mut first = None;
        for (_, sink) in &self.members {
            if let Err(e) = sink.accept(record) {
                failed += 1;
                first.get_or_insert(e);
            }
        }
        match first {
            None => Ok(()),
            Some(first) => Err(SinkError::Fanout {
                failed,
                total: self.members.len(),
                first: Box::new(first),
            }),
        }
    }

    fn flush(&self) -> Result<(), SinkError> {
        let mut result = Ok(());
        for (_, sink) in &self.members {
            if let Err(e) = sink.flush() {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    fn kind(&self) -> &'static str {
        "multisink"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use crate::sink::MemorySink;

    #[derive(Debug)]
    struct FailingSink;

    impl Sink for FailingSink {
        fn accept(&self, _record: &Record) -> Result<(), SinkError> {
            Err(SinkError::Io(std::io::Error::other("disk gone")))
        }
        fn kind(&self) -> &'static str {
            "failing"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_delivers_to_all_members_despite_failure() {
        let a = Arc::new(MemorySink::default());
        let b = Arc::new(MemorySink::default());
        let multi = MultiSink::new(vec![
            ("a".into(), a.clone() as Arc<dyn Sink>),
            ("broken".into(), Arc::new(FailingSink) as Arc<dyn Sink>),
            ("b".into(), b.clone() as Arc<dyn Sink>),
        ]);

        let record = Record::new(Arc::from("fan"), Level::Info, "hi".into());
        let err = multi.accept(&record).unwrap_err();

        assert!(matches!(err, SinkError::Fanout { failed: 1, total: 3, .. }));
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert_eq!(multi.member_names().collect::<Vec<_>>(), vec!["a", "broken", "b"]);
    }
}
