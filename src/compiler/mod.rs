pub mod symbol_table;

use std::cell::RefCell;
use std::rc::Rc;

use symbol_table::{Symbol, SymbolScope, SymbolTable};

use crate::code::{
    self, Instructions, Opcode, OPADD, OPARRAY, OPCALL, OPCLOSURE, OPCONSTANT, OPCURRENTCLOSURE,
    OPDIV, OPEQUAL, OPFALSE, OPGETBUILTIN, OPGETFREE, OPGETGLOBAL, OPGETLOCAL, OPGREATERTHAN,
    OPINDEX, OPJUMP, OPJUMPFALSE, OPLESSTHAN, OPMUL, OPNEGATE, OPNOT, OPNOTEQUAL, OPNULL,
    OPOBJECT, OPPOP, OPRETURN, OPRETURNVALUE, OPSETGLOBAL, OPSETLOCAL, OPSUB, OPTRUE,
};
use crate::object::{self, CompiledFunction, Object};
use crate::parser::ast;

/// Placeholder operand for jumps whose target is not yet known.
const VIRTUAL_OFFSET: i32 = 9999;

pub struct CompilationScope {
    pub instructions: Instructions,
    last_instruction: EmittedInstruction,
    previous_instruction: EmittedInstruction,
}

impl CompilationScope {
    fn new() -> Self {
        CompilationScope {
            instructions: Instructions::new(),
            last_instruction: EmittedInstruction::new(),
            previous_instruction: EmittedInstruction::new(),
        }
    }
}

pub struct Compiler {
    pub constants: Rc<RefCell<Vec<Object>>>,
    symbol_table: Rc<RefCell<SymbolTable>>,
    scopes: Vec<CompilationScope>,
    scope_index: usize,
}

impl Compiler {
    pub fn new() -> Self {
        let mut symbol_table = SymbolTable::new();
        for (i, b) in object::builtins::BUILTINS.iter().enumerate() {
            symbol_table.define_builtin(i, b.name);
        }

        Compiler {
            constants: Rc::new(RefCell::new(vec![])),
            symbol_table: Rc::new(RefCell::new(symbol_table)),
            scopes: vec![CompilationScope::new()],
            scope_index: 0,
        }
    }

    /// Compiler that continues with a symbol table and constants pool from a
    /// previous compilation, for REPL-style hosts.
    pub fn new_with_state(
        symbol_table: Rc<RefCell<SymbolTable>>,
        constants: Rc<RefCell<Vec<Object>>>,
    ) -> Self {
        Compiler {
            constants,
            symbol_table,
            scopes: vec![CompilationScope::new()],
            scope_index: 0,
        }
    }

    pub fn compile(&mut self, program: &ast::Program) -> Result<(), String> {
        for stmt in program {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    fn compile_stmt(&mut self, stmt: &ast::Stmt) -> Result<(), String> {
        match stmt {
            ast::Stmt::Expr(expr) => {
                self.compile_expr(expr)?;
                self.emit(OPPOP, &[]);
            }
            ast::Stmt::Let(ident, expr) => {
                // Defined before the value is compiled so the value can refer
                // to its own binding.
                let symbol = self.symbol_table.borrow_mut().define(&ident.0);
                self.compile_expr(expr)?;
                if symbol.scope == SymbolScope::Global {
                    self.emit(OPSETGLOBAL, &[symbol.index as i32]);
                } else {
                    self.emit(OPSETLOCAL, &[symbol.index as i32]);
                }
            }
            ast::Stmt::Return(value) => {
                self.compile_expr(value)?;
                self.emit(OPRETURNVALUE, &[]);
            }
        }
        Ok(())
    }

    fn compile_expr(&mut self, expr: &ast::Expr) -> Result<(), String> {
        match expr {
            ast::Expr::Lit(literal) => self.compile_literal(literal)?,
            ast::Expr::Infix(op, left, right) => {
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                match op {
                    ast::Infix::Plus => {
                        self.emit(OPADD, &[]);
                    }
                    ast::Infix::Minus => {
                        self.emit(OPSUB, &[]);
                    }
                    ast::Infix::Multiply => {
                        self.emit(OPMUL, &[]);
                    }
                    ast::Infix::Divide => {
                        self.emit(OPDIV, &[]);
                    }
                    ast::Infix::GreaterThan => {
                        self.emit(OPGREATERTHAN, &[]);
                    }
                    ast::Infix::LessThan => {
                        self.emit(OPLESSTHAN, &[]);
                    }
                    ast::Infix::Equal => {
                        self.emit(OPEQUAL, &[]);
                    }
                    ast::Infix::NotEqual => {
                        self.emit(OPNOTEQUAL, &[]);
                    }
                    op => {
                        return Err(format!("unknown operator {}", op));
                    }
                }
            }
            ast::Expr::Prefix(prefix, right) => {
                self.compile_expr(right)?;
                match prefix {
                    ast::Prefix::Not => {
                        self.emit(OPNOT, &[]);
                    }
                    ast::Prefix::Minus => {
                        self.emit(OPNEGATE, &[]);
                    }
                }
            }
            ast::Expr::If {
                cond,
                consequence,
                alternative,
            } => {
                self.compile_expr(cond)?;
                let jump_false_pos = self.emit(OPJUMPFALSE, &[VIRTUAL_OFFSET]);

                self.compile_block_statement(consequence)?;
                if self.last_instruction_is(OPPOP) {
                    self.remove_last_pop();
                }

                let jump_pos = self.emit(OPJUMP, &[VIRTUAL_OFFSET]);

                let after_consequence_pos = self.current_instructions().len();
                self.change_operand(jump_false_pos, after_consequence_pos as i32);

                match alternative {
                    None => {
                        self.emit(OPNULL, &[]);
                    }
                    Some(alternative) => {
                        self.compile_block_statement(alternative)?;
                        if self.last_instruction_is(OPPOP) {
                            self.remove_last_pop();
                        }
                    }
                }

                let after_alternative_pos = self.current_instructions().len();
                self.change_operand(jump_pos, after_alternative_pos as i32);
            }
            ast::Expr::Ident(ident) => {
                let symbol = self.symbol_table.borrow_mut().resolve(&ident.0);
                match symbol {
                    Some(symbol) => self.load_symbol(&symbol),
                    None => return Err(format!("symbol not found: {}", ident.0)),
                }
            }
            ast::Expr::Index(left, index) => {
                self.compile_expr(left)?;
                self.compile_expr(index)?;
                self.emit(OPINDEX, &[]);
            }
            ast::Expr::Function { name, params, body } => {
                self.enter_scope();

                if let Some(name) = name {
                    self.symbol_table.borrow_mut().define_function_name(name);
                }
                for param in params {
                    self.symbol_table.borrow_mut().define(&param.0);
                }

                self.compile_block_statement(body)?;

                // The final expression statement of the body is its return
                // value; an empty or value-less body returns undefined.
                if self.last_instruction_is(OPPOP) {
                    self.replace_last_pop_with_return();
                }
                if !self.last_instruction_is(OPRETURNVALUE) {
                    self.emit(OPRETURN, &[]);
                }

                let (free_symbols, num_locals) = {
                    let table = self.symbol_table.borrow();
                    (table.free_symbols.clone(), table.num_definitions)
                };
                let instructions = self.leave_scope();

                for symbol in &free_symbols {
                    self.load_symbol(symbol);
                }

                let compiled_fn = Object::CompiledFunction(Rc::new(CompiledFunction {
                    instructions,
                    num_locals,
                    num_parameters: params.len(),
                }));
                let const_index = self.add_constant(compiled_fn) as i32;
                self.emit(OPCLOSURE, &[const_index, free_symbols.len() as i32]);
            }
            ast::Expr::Call {
                function,
                arguments,
            } => {
                self.compile_expr(function)?;
                for arg in arguments {
                    self.compile_expr(arg)?;
                }
                self.emit(OPCALL, &[arguments.len() as i32]);
            }
        }
        Ok(())
    }

    fn compile_literal(&mut self, literal: &ast::Literal) -> Result<(), String> {
        match literal {
            ast::Literal::Int(value) => {
                let const_index = self.add_constant(Object::Int(*value)) as i32;
                self.emit(OPCONSTANT, &[const_index]);
            }
            ast::Literal::String(value) => {
                let const_index = self.add_constant(Object::String(value.clone())) as i32;
                self.emit(OPCONSTANT, &[const_index]);
            }
            ast::Literal::Bool(value) => {
                if *value {
                    self.emit(OPTRUE, &[]);
                } else {
                    self.emit(OPFALSE, &[]);
                }
            }
            ast::Literal::Array(elements) => {
                for element in elements {
                    self.compile_expr(element)?;
                }
                self.emit(OPARRAY, &[elements.len() as i32]);
            }
            ast::Literal::Hash(pairs) => {
                // Pairs in source order, key before value.
                for (key, value) in pairs {
                    self.compile_expr(key)?;
                    self.compile_expr(value)?;
                }
                self.emit(OPOBJECT, &[(pairs.len() * 2) as i32]);
            }
        }
        Ok(())
    }

    fn compile_block_statement(&mut self, block: &ast::BlockStmt) -> Result<(), String> {
        for statement in block {
            self.compile_stmt(statement)?;
        }
        Ok(())
    }

    fn load_symbol(&mut self, symbol: &Symbol) {
        match symbol.scope {
            SymbolScope::Global => {
                self.emit(OPGETGLOBAL, &[symbol.index as i32]);
            }
            SymbolScope::Local => {
                self.emit(OPGETLOCAL, &[symbol.index as i32]);
            }
            SymbolScope::Builtin => {
                self.emit(OPGETBUILTIN, &[symbol.index as i32]);
            }
            SymbolScope::Free => {
                self.emit(OPGETFREE, &[symbol.index as i32]);
            }
            SymbolScope::Function => {
                self.emit(OPCURRENTCLOSURE, &[]);
            }
        }
    }

    pub fn bytecode(&self) -> Bytecode {
        Bytecode {
            instructions: self.current_instructions().clone(),
            constants: self.constants.borrow().clone(),
        }
    }

    pub fn add_constant(&mut self, obj: Object) -> usize {
        self.constants.borrow_mut().push(obj);
        self.constants.borrow().len() - 1
    }

    pub fn emit(&mut self, op: Opcode, operands: &[i32]) -> usize {
        let ins = code::make(op, operands);
        let pos = self.add_instruction(&ins);

        self.set_last_instruction(op, pos);

        pos
    }

    fn add_instruction(&mut self, ins: &Instructions) -> usize {
        let pos_new_instruction = self.current_instructions().len();
        self.scopes[self.scope_index]
            .instructions
            .0
            .extend_from_slice(&ins.0);
        pos_new_instruction
    }

    pub fn current_instructions(&self) -> &Instructions {
        &self.scopes[self.scope_index].instructions
    }

    fn set_last_instruction(&mut self, op: Opcode, pos: usize) {
        let previous = self.scopes[self.scope_index].last_instruction.clone();
        let last = EmittedInstruction {
            opcode: op,
            position: pos,
        };

        self.scopes[self.scope_index].previous_instruction = previous;
        self.scopes[self.scope_index].last_instruction = last;
    }

    fn last_instruction_is(&self, op: Opcode) -> bool {
        if self.current_instructions().len() == 0 {
            return false;
        }
        self.scopes[self.scope_index].last_instruction.opcode == op
    }

    fn replace_instruction(&mut self, pos: usize, new_instruction: &Instructions) {
        let ins = &mut self.scopes[self.scope_index].instructions.0;
        ins[pos..pos + new_instruction.0.len()].copy_from_slice(&new_instruction.0);
    }

    fn change_operand(&mut self, op_pos: usize, operand: i32) {
        let op = self.current_instructions().0[op_pos];
        let new_instruction = code::make(op, &[operand]);
        self.replace_instruction(op_pos, &new_instruction);
    }

    fn remove_last_pop(&mut self) {
        let last = self.scopes[self.scope_index].last_instruction.clone();
        let previous = self.scopes[self.scope_index].previous_instruction.clone();

        self.scopes[self.scope_index]
            .instructions
            .0
            .truncate(last.position);
        self.scopes[self.scope_index].last_instruction = previous;
    }

    fn replace_last_pop_with_return(&mut self) {
        let last_pos = self.scopes[self.scope_index].last_instruction.position;
        let new_instruction = code::make(OPRETURNVALUE, &[]);
        self.replace_instruction(last_pos, &new_instruction);

        self.scopes[self.scope_index].last_instruction.opcode = OPRETURNVALUE;
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::new());
        self.scope_index += 1;

        let enclosed = SymbolTable::new_enclosed(Rc::clone(&self.symbol_table));
        self.symbol_table = Rc::new(RefCell::new(enclosed));
    }

    pub fn leave_scope(&mut self) -> Instructions {
        let scope = self.scopes.pop().unwrap_or_else(CompilationScope::new);
        if self.scope_index > 0 {
            self.scope_index -= 1;
        }

        let outer = self.symbol_table.borrow().get_outer();
        if let Some(outer) = outer {
            self.symbol_table = outer;
        }

        scope.instructions
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new()
    }
}

pub struct Bytecode {
    pub instructions: Instructions,
    pub constants: Vec<Object>,
}

#[derive(Clone)]
struct EmittedInstruction {
    opcode: Opcode,
    position: usize,
}

impl EmittedInstruction {
    fn new() -> Self {
        EmittedInstruction {
            opcode: 0,
            position: 0,
        }
    }
}
