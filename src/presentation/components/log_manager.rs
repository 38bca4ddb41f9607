use std::collections::VecDeque;
use std::sync::mpsc::Receiver;

const MAX_LOG_SIZE: usize = 200;

/// Log pane contents: the most recent captured tracing lines.
pub struct LogManager {
    logs: VecDeque<String>,
}

impl LogManager {
    pub fn new() -> Self {
        Self {
            logs: VecDeque::with_capacity(MAX_LOG_SIZE),
        }
    }

    pub fn push(&mut self, message: String) {
        if self.logs.len() >= MAX_LOG_SIZE {
            self.logs.pop_front();
        }
        self.logs.push_back(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = String>) {
        for message in messages {
            self.push(message);
        }
    }

    /// Moves everything currently buffered in `receiver` into the pane.
    /// Must not log: the capture layer writes into `receiver`.
    pub fn drain(&mut self, receiver: &Receiver<String>) -> usize {
        let mut received = 0;
        while let Ok(message) = receiver.try_recv() {
            self.push(message);
            received += 1;
        }
        received
    }

    /// The newest `count` lines, oldest first.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &String> {
        self.logs.iter().skip(self.logs.len().saturating_sub(count))
    }

    pub fn all_logs(&self) -> Vec<&String> {
        self.logs.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_newest_lines() {
        let mut logs = LogManager::new();
        logs.extend((0..250).map(|i| format!("line {}", i)));
        assert_eq!(logs.len(), MAX_LOG_SIZE);
        assert_eq!(logs.all_logs()[0], "line 50");
    }

    #[test]
    fn drain_empties_the_channel() {
        let (tx, rx) = std::sync::mpsc::channel();
        tx.send("a".to_string()).unwrap();
        tx.send("b".to_string()).unwrap();
        let mut logs = LogManager::new();
        assert_eq!(logs.drain(&rx), 2);
        assert_eq!(logs.drain(&rx), 0);
    }
}
