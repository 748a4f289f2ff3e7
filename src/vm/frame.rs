use std::rc::Rc;

use crate::code::Instructions;
use crate::object::Closure;

/// Per-call record: the running closure, its instruction pointer, and the
/// stack slot where this call's locals begin.
#[derive(Clone, Debug)]
pub struct Frame {
    pub closure: Rc<Closure>,
    pub ip: i64,
    pub base_pointer: usize,
}

impl Frame {
    pub fn new(closure: Rc<Closure>, base_pointer: usize) -> Self {
        Frame {
            closure,
            ip: -1,
            base_pointer,
        }
    }

    pub fn instructions(&self) -> &Instructions {
        &self.closure.func.instructions
    }
}
