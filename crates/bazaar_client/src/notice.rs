//! Transient rejection notices with TTL and dedupe.
//!
//! A rejected command is corrected by the next snapshot, not by rollback;
//! the notice is only there so the player knows why the gold came back.

use std::collections::VecDeque;

use bazaar_shared::ActionName;

use crate::config::NoticeConfig;

/// Identifier for a notice entry.
pub type NoticeId = u64;

#[derive(Debug, Clone)]
struct Notice {
    id: NoticeId,
    action: ActionName,
    message: String,
    age_secs: f32,
}

/// Rendering-friendly view of a notice.
#[derive(Debug, Clone, PartialEq)]
pub struct NoticeView {
    /// Stable identifier.
    pub id: NoticeId,
    /// Action that was rejected.
    pub action: ActionName,
    /// Text to show.
    pub message: String,
    /// 1.0 -> just created, 0.0 -> expired.
    pub progress: f32,
}

/// Bounded queue of rejection notices.
#[derive(Debug, Clone)]
pub struct NoticeQueue {
    queue: VecDeque<Notice>,
    capacity: usize,
    ttl_secs: f32,
    dedupe_window_secs: f32,
    next_id: NoticeId,
}

impl NoticeQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new(config: &NoticeConfig) -> Self {
        Self {
            queue: VecDeque::with_capacity(config.capacity),
            capacity: config.capacity.max(1),
            ttl_secs: config.ttl_secs,
            dedupe_window_secs: config.dedupe_window_secs,
            next_id: 1,
        }
    }

    /// Pushes a notice. An identical notice younger than the dedupe window
    /// is refreshed instead of duplicated.
    pub fn push(&mut self, action: ActionName, message: impl Into<String>) -> NoticeId {
        let message = message.into();
        let window = self.dedupe_window_secs;

        if let Some(existing) = self
            .queue
            .iter_mut()
            .find(|n| n.action == action && n.message == message && n.age_secs <= window)
        {
            existing.age_secs = 0.0;
            return existing.id;
        }

        let id = self.next_id;
        self.next_id += 1;
        if self.queue.len() == self.capacity {
            self.queue.pop_front();
        }
        self.queue.push_back(Notice {
            id,
            action,
            message,
            age_secs: 0.0,
        });
        id
    }

    /// Ages notices by `dt` seconds and drops expired ones.
    pub fn update(&mut self, dt: f32) {
        for notice in &mut self.queue {
            notice.age_secs += dt;
        }
        let ttl = self.ttl_secs;
        self.queue.retain(|n| n.age_secs < ttl);
    }

    /// Visible notices, oldest first.
    #[must_use]
    pub fn visible(&self) -> Vec<NoticeView> {
        self.queue
            .iter()
            .map(|n| NoticeView {
                id: n.id,
                action: n.action,
                message: n.message.clone(),
                progress: (1.0 - n.age_secs / self.ttl_secs).clamp(0.0, 1.0),
            })
            .collect()
    }

    /// Number of live notices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True if no notices are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drops every notice.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
