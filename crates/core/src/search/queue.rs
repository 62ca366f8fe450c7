use crate::{grid::CellIndex, unwrap};

/// Head and tail of the linked list of cells sharing one priority
#[derive(Copy, Clone, Debug, Default)]
struct Bucket {
    head: Option<CellIndex>,
    tail: Option<CellIndex>,
}

/// A bucket queue of cells keyed by small non-negative integer priorities.
///
/// There is one bucket per priority value, and each bucket is a singly
/// linked list threaded through an array indexed by cell. Enqueueing and
/// dequeueing are O(1) amortized as long as priorities only creep upwards,
/// which is the case for graph search distances. Cells with equal priority
/// come out in the order they went in.
///
/// A cell may be in the queue at most once at a time.
#[derive(Clone, Debug)]
pub struct CellPriorityQueue {
    buckets: Vec<Bucket>,
    /// Link to the next cell in the same bucket, indexed by cell
    next: Vec<Option<CellIndex>>,
    /// No bucket below this one holds anything
    minimum: usize,
    len: usize,
}

impl Default for CellPriorityQueue {
    fn default() -> Self {
        Self {
            buckets: Vec::new(),
            next: Vec::new(),
            minimum: usize::MAX,
            len: 0,
        }
    }
}

impl CellPriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn enqueue(&mut self, cell: CellIndex, priority: i32) {
        debug_assert!(priority >= 0, "negative priority {}", priority);
        let priority = priority as usize;
        self.len += 1;
        if priority < self.minimum {
            self.minimum = priority;
        }
        if priority >= self.buckets.len() {
            self.buckets.resize(priority + 1, Bucket::default());
        }
        if cell.0 >= self.next.len() {
            self.next.resize(cell.0 + 1, None);
        }

        self.next[cell.0] = None;
        let bucket = &mut self.buckets[priority];
        match bucket.tail {
            Some(tail) => self.next[tail.0] = Some(cell),
            None => bucket.head = Some(cell),
        }
        bucket.tail = Some(cell);
    }

    /// Remove and return the cell with the lowest priority, or `None` if the
    /// queue is empty.
    pub fn dequeue(&mut self) -> Option<CellIndex> {
        if self.len == 0 {
            return None;
        }
        while self.minimum < self.buckets.len() {
            let minimum = self.minimum;
            let bucket = &mut self.buckets[minimum];
            if let Some(head) = bucket.head {
                bucket.head = self.next[head.0];
                if bucket.head.is_none() {
                    bucket.tail = None;
                }
                self.len -= 1;
                return Some(head);
            }
            self.minimum += 1;
        }
        None
    }

    /// Move a queued cell from `old_priority` to `new_priority`. The cell
    /// must currently be in the queue at `old_priority`.
    pub fn change(
        &mut self,
        cell: CellIndex,
        old_priority: i32,
        new_priority: i32,
    ) {
        let old_priority = old_priority as usize;
        let bucket = unwrap!(
            self.buckets.get_mut(old_priority),
            "no bucket for priority {}",
            old_priority
        );

        // Walk the bucket to find the link pointing at this cell
        let mut previous: Option<CellIndex> = None;
        let mut current = unwrap!(
            bucket.head,
            "{} is not queued at priority {}",
            cell,
            old_priority
        );
        while current != cell {
            previous = Some(current);
            current = unwrap!(
                self.next[current.0],
                "{} is not queued at priority {}",
                cell,
                old_priority
            );
        }

        let next = self.next[cell.0];
        match previous {
            Some(previous) => self.next[previous.0] = next,
            None => bucket.head = next,
        }
        if bucket.tail == Some(cell) {
            bucket.tail = previous;
        }
        self.len -= 1;
        self.enqueue(cell, new_priority);
    }

    /// Empty the queue, keeping allocations for the next search
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.minimum = usize::MAX;
        self.len = 0;
    }
}
