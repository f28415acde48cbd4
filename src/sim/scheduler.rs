//! 反应调度器
//!
//! 以 (发生时刻, 反应 id) 为键的索引化二叉最小堆。与标准库的
//! `BinaryHeap` 不同，它维护 反应 id → 堆位置 的反查表，依赖传播
//! 之后可以原位调整任意反应的键，不靠惰性删除，队列长度恒等于
//! 存活反应数。时刻相同的反应按 id 从小到大出队。

use tracing::trace;

use crate::model::ReactionId;

use super::time::SimTime;

/// 索引化最小堆调度器。
#[derive(Debug, Default)]
pub struct ReactionScheduler {
    /// 堆序存储的 (时刻, 反应)
    heap: Vec<(SimTime, ReactionId)>,
    /// 反应 id → 堆下标
    slots: Vec<Option<usize>>,
}

impl ReactionScheduler {
    pub fn new() -> ReactionScheduler {
        ReactionScheduler::default()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// 队首：全局最早的 (时刻, 反应)。
    pub fn peek(&self) -> Option<(SimTime, ReactionId)> {
        self.heap.first().copied()
    }

    /// 某反应当前登记的时刻。
    pub fn time_of(&self, id: ReactionId) -> Option<SimTime> {
        let idx = (*self.slots.get(id.0)?)?;
        Some(self.heap[idx].0)
    }

    /// 登记新反应。同一反应不允许重复登记。
    pub fn insert(&mut self, id: ReactionId, at: SimTime) {
        if self.slots.len() <= id.0 {
            self.slots.resize(id.0 + 1, None);
        }
        assert!(
            self.slots[id.0].is_none(),
            "reaction {id:?} already scheduled"
        );
        let idx = self.heap.len();
        self.heap.push((at, id));
        self.slots[id.0] = Some(idx);
        self.sift_up(idx);
        trace!(reaction = id.0, at = ?at, "反应已登记");
    }

    /// 调整已登记反应的时刻，原位恢复堆序。
    pub fn update_key(&mut self, id: ReactionId, at: SimTime) {
        let idx = self
            .slots
            .get(id.0)
            .copied()
            .flatten()
            .expect("reaction is scheduled");
        let old = self.heap[idx].0;
        self.heap[idx].0 = at;
        if at < old {
            self.sift_up(idx);
        } else {
            self.sift_down(idx);
        }
    }

    /// 注销反应；未登记时为空操作。
    pub fn remove(&mut self, id: ReactionId) {
        let Some(idx) = self.slots.get(id.0).copied().flatten() else {
            return;
        };
        self.slots[id.0] = None;
        let last = self.heap.len() - 1;
        if idx == last {
            self.heap.pop();
            return;
        }
        self.heap.swap(idx, last);
        self.heap.pop();
        let moved = self.heap[idx].1;
        self.slots[moved.0] = Some(idx);
        // 补位元素可能需要向任一方向恢复堆序
        self.sift_up(idx);
        self.sift_down(idx);
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if self.heap[idx] < self.heap[parent] {
                self.swap_entries(idx, parent);
                idx = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        loop {
            let left = 2 * idx + 1;
            if left >= self.heap.len() {
                break;
            }
            let right = left + 1;
            let mut smallest = idx;
            if self.heap[left] < self.heap[smallest] {
                smallest = left;
            }
            if right < self.heap.len() && self.heap[right] < self.heap[smallest] {
                smallest = right;
            }
            if smallest == idx {
                break;
            }
            self.swap_entries(idx, smallest);
            idx = smallest;
        }
    }

    fn swap_entries(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        let ra = self.heap[a].1;
        let rb = self.heap[b].1;
        self.slots[ra.0] = Some(a);
        self.slots[rb.0] = Some(b);
    }
}
