pub mod builtins;

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::code::Instructions;

pub const INTEGER_OBJ: &str = "INTEGER";
pub const STRING_OBJ: &str = "STRING";
pub const BOOLEAN_OBJ: &str = "BOOLEAN";
pub const NULL_OBJ: &str = "NULL";
pub const UNDEFINED_OBJ: &str = "UNDEFINED";
pub const ARRAY_OBJ: &str = "ARRAY";
pub const OBJECT_OBJ: &str = "OBJECT";
pub const COMPILED_FUNCTION_OBJ: &str = "COMPILED_FUNCTION";
pub const CLOSURE_OBJ: &str = "CLOSURE";
pub const BUILTIN_OBJ: &str = "BUILTIN";
pub const ERROR_OBJ: &str = "ERROR";

pub type BuiltinFunction = fn(Vec<Object>) -> Object;

/// Bytecode of one function body together with its frame layout.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFunction {
    pub instructions: Instructions,
    pub num_locals: usize,
    pub num_parameters: usize,
}

/// A compiled function paired with the values captured from enclosing scopes.
#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub func: Rc<CompiledFunction>,
    pub free: Vec<Object>,
}

/// Type tag plus 64-bit hash. Only Int, String and Bool values produce one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub object_type: &'static str,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: Object,
    pub value: Object,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Int(i64),
    String(String),
    Bool(bool),
    Null,
    Undefined,
    Array(Vec<Object>),
    Hash(HashMap<HashKey, HashPair>),
    CompiledFunction(Rc<CompiledFunction>),
    Closure(Rc<Closure>),
    Builtin(BuiltinFunction),
    Error(String),
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

// FNV-1a, 64 bit.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for b in bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

impl Object {
    pub fn r#type(&self) -> &'static str {
        match self {
            Object::Int(_) => INTEGER_OBJ,
            Object::String(_) => STRING_OBJ,
            Object::Bool(_) => BOOLEAN_OBJ,
            Object::Null => NULL_OBJ,
            Object::Undefined => UNDEFINED_OBJ,
            Object::Array(_) => ARRAY_OBJ,
            Object::Hash(_) => OBJECT_OBJ,
            Object::CompiledFunction(_) => COMPILED_FUNCTION_OBJ,
            Object::Closure(_) => CLOSURE_OBJ,
            Object::Builtin(_) => BUILTIN_OBJ,
            Object::Error(_) => ERROR_OBJ,
        }
    }

    /// Hash key for use as an object-literal key or index. `None` for
    /// unhashable values.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Object::Int(value) => Some(HashKey {
                object_type: INTEGER_OBJ,
                value: *value as u64,
            }),
            Object::Bool(value) => Some(HashKey {
                object_type: BOOLEAN_OBJ,
                value: *value as u64,
            }),
            Object::String(value) => Some(HashKey {
                object_type: STRING_OBJ,
                value: fnv1a(value.as_bytes()),
            }),
            _ => None,
        }
    }

    pub fn inspect(&self) -> String {
        match self {
            Object::Int(value) => value.to_string(),
            Object::String(value) => value.clone(),
            Object::Bool(value) => value.to_string(),
            Object::Null => "null".to_string(),
            Object::Undefined => "undefined".to_string(),
            Object::Array(elements) => {
                let elems: Vec<String> = elements.iter().map(|e| e.inspect()).collect();
                format!("[{}]", elems.join(", "))
            }
            Object::Hash(pairs) => {
                let mut entries: Vec<String> = pairs
                    .values()
                    .map(|pair| format!("{}: {}", pair.key.inspect(), pair.value.inspect()))
                    .collect();
                entries.sort();
                format!("{{{}}}", entries.join(", "))
            }
            Object::CompiledFunction(_) => "compiled function".to_string(),
            Object::Closure(_) => "closure".to_string(),
            Object::Builtin(_) => "builtin function".to_string(),
            Object::Error(message) => format!("ERROR: {}", message),
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inspect())
    }
}
