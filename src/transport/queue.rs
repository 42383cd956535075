//! Outbound frame queue.
//!
//! All outbound traffic funnels through one FIFO drained by the session
//! loop: at most one transmission is in flight, frames go out in push
//! order, and a trailing guard interval separates back-to-back sends so
//! frame byte streams can never interleave on the socket.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// FIFO of encoded text frames with a trailing guard between sends.
#[derive(Debug)]
pub struct OutboundQueue {
    frames: VecDeque<String>,
    send_gap: Duration,
    last_sent: Option<Instant>,
}

impl OutboundQueue {
    /// Create a queue with the given trailing guard interval.
    pub fn new(send_gap: Duration) -> Self {
        Self {
            frames: VecDeque::new(),
            send_gap,
            last_sent: None,
        }
    }

    /// Append a frame to the back of the queue.
    pub fn push(&mut self, frame: String) {
        self.frames.push_back(frame);
    }

    /// Whether the queue holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of queued frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Earliest instant at which the next frame may be transmitted, or
    /// `None` when the queue is empty.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.frames.is_empty() {
            return None;
        }
        Some(match self.last_sent {
            Some(at) => at + self.send_gap,
            None => Instant::now(),
        })
    }

    /// Pop the next frame if the guard interval has elapsed.
    pub fn pop_ready(&mut self, now: Instant) -> Option<String> {
        if self.frames.is_empty() {
            return None;
        }
        if let Some(at) = self.last_sent {
            if now < at + self.send_gap {
                return None;
            }
        }
        let frame = self.frames.pop_front();
        if frame.is_some() {
            self.last_sent = Some(now);
        }
        frame
    }

    /// Drop all queued frames (stale after a disconnect; their tokens
    /// belong to the dead session).
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = OutboundQueue::new(Duration::ZERO);
        queue.push("a".into());
        queue.push("b".into());
        queue.push("c".into());

        let now = Instant::now();
        assert_eq!(queue.pop_ready(now).as_deref(), Some("a"));
        assert_eq!(queue.pop_ready(now).as_deref(), Some("b"));
        assert_eq!(queue.pop_ready(now).as_deref(), Some("c"));
        assert_eq!(queue.pop_ready(now), None);
    }

    #[test]
    fn test_guard_interval_blocks_back_to_back_sends() {
        let gap = Duration::from_millis(100);
        let mut queue = OutboundQueue::new(gap);
        queue.push("a".into());
        queue.push("b".into());

        let start = Instant::now();
        assert!(queue.pop_ready(start).is_some());
        // Second frame is held until the guard elapses.
        assert!(queue.pop_ready(start + Duration::from_millis(50)).is_none());
        assert!(queue.pop_ready(start + gap).is_some());
    }

    #[test]
    fn test_deadline_tracks_guard() {
        let gap = Duration::from_millis(100);
        let mut queue = OutboundQueue::new(gap);
        assert!(queue.next_deadline().is_none());

        queue.push("a".into());
        let start = Instant::now();
        assert!(queue.next_deadline().is_some());
        assert!(queue.pop_ready(start).is_some());

        queue.push("b".into());
        assert_eq!(queue.next_deadline(), Some(start + gap));
    }

    #[test]
    fn test_clear_drops_frames() {
        let mut queue = OutboundQueue::new(Duration::ZERO);
        queue.push("a".into());
        queue.push("b".into());
        assert_eq!(queue.len(), 2);

        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.pop_ready(Instant::now()), None);
    }
}
