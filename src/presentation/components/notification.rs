use crate::domain::services::NotificationLevel;
use chrono::{DateTime, Local};
use std::collections::VecDeque;

const HISTORY_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub at: DateTime<Local>,
}

impl Notification {
    pub fn render(&self) -> String {
        format!("{} [{}] {}", self.at.format("%H:%M:%S"), self.level, self.message)
    }
}

/// Single-line banner; keeps a short history for the headless log.
#[derive(Debug, Default)]
pub struct NotificationBanner {
    history: VecDeque<Notification>,
}

impl NotificationBanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, level: NotificationLevel, message: impl Into<String>) {
        if self.history.len() >= HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(Notification {
            level,
            message: message.into(),
            at: Local::now(),
        });
    }

    pub fn current(&self) -> Option<&Notification> {
        self.history.back()
    }

    pub fn history(&self) -> impl Iterator<Item = &Notification> {
        self.history.iter()
    }
}
