use crate::reporting::model::Finding;
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

/// Receives findings as soon as they are produced.
///
/// Sessions only ever push; a sink shared between concurrent sessions must
/// handle its own synchronization.
pub trait FindingSink: Send + Sync {
    fn report(&self, finding: Finding);
}

/// Collects findings in memory
#[derive(Default)]
pub struct Reporter {
    findings: Mutex<Vec<Finding>>,
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            findings: Mutex::new(Vec::new()),
        }
    }

    pub fn add(&self, finding: Finding) {
        match self.findings.lock() {
            Ok(mut findings) => findings.push(finding),
            Err(poisoned) => poisoned.into_inner().push(finding),
        }
    }

    /// Snapshot of everything reported so far
    pub fn findings(&self) -> Vec<Finding> {
        match self.findings.lock() {
            Ok(findings) => findings.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self.findings.lock() {
            Ok(findings) => findings.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FindingSink for Reporter {
    fn report(&self, finding: Finding) {
        self.add(finding);
    }
}

impl FindingSink for UnboundedSender<Finding> {
    fn report(&self, finding: Finding) {
        if self.send(finding).is_err() {
            tracing::debug!("Finding receiver dropped, discarding finding");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::model::Channel;

    fn sample() -> Finding {
        Finding::new(Channel::ErrorBased, "t", "http://t/?id=1", "id", "1'")
    }

    #[test]
    fn test_reporter_collects() {
        let reporter = Reporter::new();
        reporter.report(sample());
        reporter.report(sample());
        assert_eq!(reporter.len(), 2);
    }

    #[tokio::test]
    async fn test_channel_sink_forwards() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tx.report(sample());
        let got = rx.recv().await.unwrap();
        assert_eq!(got.parameter, "id");
    }

    #[test]
    fn test_closed_channel_is_ignored() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Finding>();
        drop(rx);
        tx.report(sample());
    }
}
