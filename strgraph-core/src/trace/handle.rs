//! Trace Handles
//!
//! A [`Handle`] is a node index plus a shared reference to the store being
//! traced into. Calling an operation on a handle records a calc node whose
//! first child is the handle's node, followed by the operands.

use std::cell::RefCell;
use std::fmt;
use std::ops::{Add, AddAssign};
use std::rc::Rc;

use crate::graph::{ChildRef, NewNode, NodeIndex, NodeStore};

/// Symbolic string value used while tracing a function.
#[derive(Clone)]
pub struct Handle {
    index: NodeIndex,
    store: Rc<RefCell<NodeStore>>,
}

impl Handle {
    /// Create a constant node for a traced input.
    pub(crate) fn input(store: &Rc<RefCell<NodeStore>>, value: &str) -> Self {
        let index = store
            .borrow_mut()
            .insert(None, NewNode::Const(value.to_owned()));
        Self {
            index,
            store: Rc::clone(store),
        }
    }

    /// Index of the node this handle refers to.
    pub fn index(&self) -> NodeIndex {
        self.index
    }

    /// Record `operation` with this handle as the receiver.
    ///
    /// Operands may be other handles or literal strings.
    pub fn call<I>(&self, operation: &str, operands: I) -> Handle
    where
        I: IntoIterator,
        I::Item: Into<ChildRef>,
    {
        let children = std::iter::once(ChildRef::Index(self.index))
            .chain(operands.into_iter().map(Into::into))
            .collect();

        let index = self.store.borrow_mut().insert(
            None,
            NewNode::Calc {
                operation: operation.to_owned(),
                children,
            },
        );
        Handle {
            index,
            store: Rc::clone(&self.store),
        }
    }

    /// Record a single-argument `operation`, e.g. `capitalize`.
    pub fn apply(&self, operation: &str) -> Handle {
        self.call(operation, std::iter::empty::<ChildRef>())
    }

    pub fn concat(&self, other: impl Into<ChildRef>) -> Handle {
        self.call("concat", [other.into()])
    }

    pub fn upper(&self) -> Handle {
        self.apply("upper")
    }

    pub fn lower(&self) -> Handle {
        self.apply("lower")
    }

    pub fn replace(&self, old: impl Into<ChildRef>, new: impl Into<ChildRef>) -> Handle {
        self.call("replace", [old.into(), new.into()])
    }
}

impl From<Handle> for ChildRef {
    fn from(handle: Handle) -> Self {
        ChildRef::Index(handle.index)
    }
}

impl From<&Handle> for ChildRef {
    fn from(handle: &Handle) -> Self {
        ChildRef::Index(handle.index)
    }
}

impl<T: Into<ChildRef>> Add<T> for Handle {
    type Output = Handle;

    fn add(self, rhs: T) -> Handle {
        self.concat(rhs)
    }
}

impl<T: Into<ChildRef>> Add<T> for &Handle {
    type Output = Handle;

    fn add(self, rhs: T) -> Handle {
        self.concat(rhs)
    }
}

impl<T: Into<ChildRef>> AddAssign<T> for Handle {
    fn add_assign(&mut self, rhs: T) {
        *self = self.concat(rhs);
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.index).finish()
    }
}
