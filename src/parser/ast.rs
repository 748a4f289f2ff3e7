use std::fmt;

pub type Program = Vec<Stmt>;
pub type BlockStmt = Vec<Stmt>;

#[derive(Debug, Clone, PartialEq)]
pub struct Ident(pub String);

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let(Ident, Expr),
    Return(Expr),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(Ident),
    Lit(Literal),
    Prefix(Prefix, Box<Expr>),
    Infix(Infix, Box<Expr>, Box<Expr>),
    If {
        cond: Box<Expr>,
        consequence: BlockStmt,
        alternative: Option<BlockStmt>,
    },
    /// `name` is empty for anonymous functions and back-filled by the parser
    /// when the literal is the value of a let binding, so the body can refer
    /// to the binding recursively.
    Function {
        name: Option<String>,
        params: Vec<Ident>,
        body: BlockStmt,
    },
    Call {
        function: Box<Expr>,
        arguments: Vec<Expr>,
    },
    Index(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    String(String),
    Bool(bool),
    Array(Vec<Expr>),
    /// Key/value pairs in source order. Keys are general expressions; their
    /// runtime values must be hashable, which the VM checks.
    Hash(Vec<(Expr, Expr)>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Prefix {
    Not,
    Minus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Infix {
    Plus,
    Minus,
    Multiply,
    Divide,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    Equal,
    NotEqual,
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::Not => write!(f, "!"),
            Prefix::Minus => write!(f, "-"),
        }
    }
}

impl fmt::Display for Infix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Infix::Plus => "+",
            Infix::Minus => "-",
            Infix::Multiply => "*",
            Infix::Divide => "/",
            Infix::GreaterThan => ">",
            Infix::GreaterThanEqual => ">=",
            Infix::LessThan => "<",
            Infix::LessThanEqual => "<=",
            Infix::Equal => "==",
            Infix::NotEqual => "!=",
        };
        write!(f, "{}", op)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn join<T: fmt::Display>(items: &[T], sep: &str) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<String>>()
        .join(sep)
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Let(ident, value) => write!(f, "let {} = {};", ident, value),
            Stmt::Return(value) => write!(f, "return {};", value),
            Stmt::Expr(expr) => write!(f, "{}", expr),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(value) => write!(f, "{}", value),
            Literal::String(value) => write!(f, "\"{}\"", value),
            Literal::Bool(value) => write!(f, "{}", value),
            Literal::Array(elements) => write!(f, "[{}]", join(elements, ", ")),
            Literal::Hash(pairs) => {
                let entries: Vec<String> = pairs
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key, value))
                    .collect();
                write!(f, "{{{}}}", entries.join(", "))
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(ident) => write!(f, "{}", ident),
            Expr::Lit(literal) => write!(f, "{}", literal),
            Expr::Prefix(op, right) => write!(f, "({}{})", op, right),
            Expr::Infix(op, left, right) => write!(f, "({} {} {})", left, op, right),
            Expr::If {
                cond,
                consequence,
                alternative,
            } => {
                write!(f, "if {} {{ {} }}", cond, join(consequence, " "))?;
                if let Some(alternative) = alternative {
                    write!(f, " else {{ {} }}", join(alternative, " "))?;
                }
                Ok(())
            }
            Expr::Function { name, params, body } => {
                write!(f, "function")?;
                if let Some(name) = name {
                    write!(f, " {}", name)?;
                }
                write!(f, "({}) {{ {} }}", join(params, ", "), join(body, " "))
            }
            Expr::Call {
                function,
                arguments,
            } => write!(f, "{}({})", function, join(arguments, ", ")),
            Expr::Index(left, index) => write!(f, "({}[{}])", left, index),
        }
    }
}
