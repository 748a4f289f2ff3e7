use crate::object::{BuiltinFunction, Object, ARRAY_OBJ};

pub struct BuiltinDef {
    pub name: &'static str,
    pub func: BuiltinFunction,
}

/// Native functions, in registration order. The compiler seeds the global
/// symbol table from this slice, so an entry's position here is its
/// `OpGetBuiltin` operand.
pub static BUILTINS: &[BuiltinDef] = &[
    BuiltinDef {
        name: "len",
        func: |args: Vec<Object>| {
            if args.len() != 1 {
                return new_error(format!(
                    "wrong number of arguments. got={}, want=1",
                    args.len()
                ));
            }
            match &args[0] {
                Object::Array(elements) => Object::Int(elements.len() as i64),
                Object::String(value) => Object::Int(value.len() as i64),
                other => new_error(format!(
                    "argument to `len` not supported, got {}",
                    other.r#type()
                )),
            }
        },
    },
    BuiltinDef {
        name: "puts",
        func: |args: Vec<Object>| {
            for arg in &args {
                println!("{}", arg.inspect());
            }
            Object::Undefined
        },
    },
    BuiltinDef {
        name: "first",
        func: |args: Vec<Object>| {
            if args.len() != 1 {
                return new_error(format!(
                    "wrong number of arguments. got={}, want=1",
                    args.len()
                ));
            }
            match &args[0] {
                Object::Array(elements) => elements.first().cloned().unwrap_or(Object::Undefined),
                other => new_error(format!(
                    "argument to `first` must be {}, got {}",
                    ARRAY_OBJ,
                    other.r#type()
                )),
            }
        },
    },
    BuiltinDef {
        name: "last",
        func: |args: Vec<Object>| {
            if args.len() != 1 {
                return new_error(format!(
                    "wrong number of arguments. got={}, want=1",
                    args.len()
                ));
            }
            match &args[0] {
                Object::Array(elements) => elements.last().cloned().unwrap_or(Object::Undefined),
                other => new_error(format!(
                    "argument to `last` must be {}, got {}",
                    ARRAY_OBJ,
                    other.r#type()
                )),
            }
        },
    },
    BuiltinDef {
        name: "rest",
        func: |args: Vec<Object>| {
            if args.len() != 1 {
                return new_error(format!(
                    "wrong number of arguments. got={}, want=1",
                    args.len()
                ));
            }
            match &args[0] {
                Object::Array(elements) => {
                    if elements.is_empty() {
                        Object::Undefined
                    } else {
                        Object::Array(elements[1..].to_vec())
                    }
                }
                other => new_error(format!(
                    "argument to `rest` must be {}, got {}",
                    ARRAY_OBJ,
                    other.r#type()
                )),
            }
        },
    },
    BuiltinDef {
        name: "push",
        func: |args: Vec<Object>| {
            if args.len() != 2 {
                return new_error(format!(
                    "wrong number of arguments. got={}, want=2",
                    args.len()
                ));
            }
            match &args[0] {
                Object::Array(elements) => {
                    let mut elements = elements.clone();
                    elements.push(args[1].clone());
                    Object::Array(elements)
                }
                other => new_error(format!(
                    "argument to `push` must be {}, got {}",
                    ARRAY_OBJ,
                    other.r#type()
                )),
            }
        },
    },
];

pub fn get_builtin_by_name(name: &str) -> Option<BuiltinFunction> {
    BUILTINS.iter().find(|def| def.name == name).map(|def| def.func)
}

fn new_error(message: String) -> Object {
    Object::Error(message)
}
