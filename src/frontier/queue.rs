use crate::frontier::UrlRecord;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Heap entry ordered by `(priority, sequence)`
#[derive(Debug)]
struct Entry {
    priority: u32,
    sequence: u64,
    record: UrlRecord,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.priority, self.sequence).cmp(&(other.priority, other.sequence))
    }
}

/// Min-priority queue with FIFO order among equal priorities
#[derive(Debug, Default)]
pub(crate) struct PriorityQueue {
    heap: BinaryHeap<Reverse<Entry>>,
    next_sequence: u64,
}

impl PriorityQueue {
    pub fn push(&mut self, record: UrlRecord) {
        let entry = Entry {
            priority: record.priority(),
            sequence: self.next_sequence,
            record,
        };
        self.next_sequence += 1;
        self.heap.push(Reverse(entry));
    }

    pub fn pop(&mut self) -> Option<UrlRecord> {
        self.heap.pop().map(|Reverse(entry)| entry.record)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn record(path: &str, priority: u32) -> UrlRecord {
        let url = Url::parse(&format!("https://example.com/{}", path)).unwrap();
        UrlRecord::new(url, 0, priority)
    }

    #[test]
    fn test_lowest_priority_first() {
        let mut queue = PriorityQueue::default();
        queue.push(record("c", 3));
        queue.push(record("a", 1));
        queue.push(record("b", 2));

        let order: Vec<u32> = std::iter::from_fn(|| queue.pop())
            .map(|r| r.priority())
            .collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_fifo_among_equal_priority() {
        let mut queue = PriorityQueue::default();
        for path in ["first", "second", "third"] {
            queue.push(record(path, 2));
        }
        queue.push(record("urgent", 0));

        let paths: Vec<String> = std::iter::from_fn(|| queue.pop())
            .map(|r| r.url().path().to_string())
            .collect();
        assert_eq!(paths, vec!["/urgent", "/first", "/second", "/third"]);
    }

    #[test]
    fn test_empty() {
        let mut queue = PriorityQueue::default();
        assert!(queue.is_empty());
        assert!(queue.pop().is_none());

        queue.push(record("a", 1));
        assert_eq!(queue.len(), 1);
    }
}
