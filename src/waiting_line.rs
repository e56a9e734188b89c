use std::collections::VecDeque;

use crate::event::Customer;

/// FIFO line of customers waiting for the server.
#[derive(Debug, Default)]
pub struct WaitingLine {
    deque: VecDeque<Customer>,
    max_len: usize,
}

impl WaitingLine {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push_back(&mut self, customer: Customer) {
        self.deque.push_back(customer);
        self.max_len = self.max_len.max(self.deque.len());
    }

    pub fn pop_front(&mut self) -> Option<Customer> {
        self.deque.pop_front()
    }

    pub fn front(&self) -> Option<&Customer> {
        self.deque.front()
    }

    pub fn len(&self) -> usize {
        self.deque.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deque.is_empty()
    }

    /// Longest the line has been since it was created.
    pub fn max_len(&self) -> usize {
        self.max_len
    }
}
