//! Persistent singly linked list with shared prefixes
//!
//! Path builders extend one partial path into many; each extension shares the
//! existing prefix instead of copying it. `push` and `pop` are O(1), the most
//! recently pushed element is the head.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

struct ConsNode<T> {
    value: T,
    next: Option<Arc<ConsNode<T>>>,
}

/// Immutable list; clones share all nodes
pub struct ConsList<T> {
    head: Option<Arc<ConsNode<T>>>,
    len: usize,
}

impl<T> ConsList<T> {
    pub fn new() -> Self {
        Self { head: None, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// New list with `value` on top
    pub fn push(&self, value: T) -> Self {
        Self {
            head: Some(Arc::new(ConsNode {
                value,
                next: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Most recently pushed element
    pub fn last(&self) -> Option<&T> {
        self.head.as_deref().map(|node| &node.value)
    }

    /// Top element and the list below it
    pub fn pop(&self) -> Option<(&T, Self)> {
        let node = self.head.as_deref()?;
        Some((
            &node.value,
            Self {
                head: node.next.clone(),
                len: self.len - 1,
            },
        ))
    }

    /// Iterate from the most recently pushed element down to the first
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            next: self.head.as_deref(),
        }
    }

    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|v| v == value)
    }

    /// Elements in insertion order
    pub fn to_vec_oldest_first(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut out: Vec<T> = self.iter().cloned().collect();
        out.reverse();
        out
    }
}

impl<T> Clone for ConsList<T> {
    fn clone(&self) -> Self {
        Self {
            head: self.head.clone(),
            len: self.len,
        }
    }
}

impl<T> Default for ConsList<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Long paths would otherwise drop recursively, one stack frame per node.
impl<T> Drop for ConsList<T> {
    fn drop(&mut self) {
        let mut cur = self.head.take();
        while let Some(node) = cur {
            match Arc::try_unwrap(node) {
                Ok(mut node) => cur = node.next.take(),
                Err(_) => break,
            }
        }
    }
}

impl<T: PartialEq> PartialEq for ConsList<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.len != other.len {
            return false;
        }
        let mut a = self.head.as_ref();
        let mut b = other.head.as_ref();
        loop {
            match (a, b) {
                (None, None) => return true,
                (Some(x), Some(y)) => {
                    // Shared tail: the rest is identical
                    if Arc::ptr_eq(x, y) {
                        return true;
                    }
                    if x.value != y.value {
                        return false;
                    }
                    a = x.next.as_ref();
                    b = y.next.as_ref();
                }
                _ => return false,
            }
        }
    }
}

impl<T: Eq> Eq for ConsList<T> {}

impl<T: Hash> Hash for ConsList<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len.hash(state);
        for value in self.iter() {
            value.hash(state);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ConsList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

pub struct Iter<'a, T> {
    next: Option<&'a ConsNode<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.next.as_deref();
        Some(&node.value)
    }
}

impl<T> FromIterator<T> for ConsList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter()
            .fold(ConsList::new(), |list, value| list.push(value))
    }
}
