use crate::engine::types::{Order, Price, Quantity};

/// Opaque handle to an order's position within a [`PriceLevel`]. Stable
/// across enqueues and removals of other orders; lets the order index map
/// an `OrderId` directly to its slot instead of scanning the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Handle(usize);

struct Node {
    order: Order,
    prev: Option<usize>,
    next: Option<usize>,
}

/// FIFO queue of resting orders at a single price, oldest (highest time
/// priority) first. Backed by a slab so cancellation of an arbitrary order
/// is O(1) given its handle, rather than requiring a scan of the level.
pub struct PriceLevel {
    price: Price,
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    cached_sum: Quantity,
}

impl PriceLevel {
    pub fn new(price: Price) -> Self {
        Self {
            price,
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
            cached_sum: Quantity::ZERO,
        }
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total remaining quantity resting at this price.
    pub fn total_quantity(&self) -> Quantity {
        self.cached_sum
    }

    /// Appends an order to the tail (back) of the queue and returns a handle
    /// to it.
    pub fn enqueue(&mut self, order: Order) -> Handle {
        self.cached_sum += order.remaining_quantity;
        let node = Node {
            order,
            prev: self.tail,
            next: None,
        };
        let index = match self.free.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                index
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        if let Some(tail) = self.tail {
            self.nodes[tail].as_mut().expect("tail node present").next = Some(index);
        } else {
            self.head = Some(index);
        }
        self.tail = Some(index);
        self.len += 1;
        Handle(index)
    }

    /// The order at the front of the queue, the next one due a match.
    pub fn peek_head(&self) -> Option<&Order> {
        self.head.map(|index| &self.nodes[index].as_ref().expect("head node present").order)
    }

    /// Mutable access to the order at the front of the queue.
    pub fn peek_head_mut(&mut self) -> Option<&mut Order> {
        self.head
            .map(|index| &mut self.nodes[index].as_mut().expect("head node present").order)
    }

    /// Reduces the remaining quantity of the order currently at the head by
    /// `delta`, keeping `cached_sum` consistent. Does not remove the order
    /// even if it reaches zero; call [`Self::pop_head`] for that once the
    /// caller has recorded the fill.
    pub fn decrement_head(&mut self, delta: Quantity) {
        if let Some(order) = self.peek_head_mut() {
            order.remaining_quantity -= delta;
        }
        self.cached_sum -= delta;
    }

    /// Removes and returns the order at the front of the queue.
    pub fn pop_head(&mut self) -> Option<Order> {
        let index = self.head?;
        Some(self.remove_index(index))
    }

    /// Removes an arbitrary order given its handle, wherever it sits in the
    /// queue. Returns `None` if the handle was already removed.
    pub fn remove(&mut self, handle: Handle) -> Option<Order> {
        if self.nodes.get(handle.0).and_then(|n| n.as_ref()).is_none() {
            return None;
        }
        Some(self.remove_index(handle.0))
    }

    fn remove_index(&mut self, index: usize) -> Order {
        let node = self.nodes[index].take().expect("valid node index");
        self.cached_sum -= node.order.remaining_quantity;
        match node.prev {
            Some(prev) => self.nodes[prev].as_mut().expect("prev node present").next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => self.nodes[next].as_mut().expect("next node present").prev = node.prev,
            None => self.tail = node.prev,
        }
        self.free.push(index);
        self.len -= 1;
        node.order
    }

    /// Iterates resting orders from head (oldest) to tail (newest).
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        let mut current = self.head;
        std::iter::from_fn(move || {
            let index = current?;
            let node = self.nodes[index].as_ref().expect("valid node index");
            current = node.next;
            Some(&node.order)
        })
    }
}
