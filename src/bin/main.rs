use std::cell::RefCell;
use std::rc::Rc;

use rustyline::error::ReadlineError;
use rustyline::Editor;

use crescent::compiler::symbol_table::SymbolTable;
use crescent::compiler::Compiler;
use crescent::lexer::Scanner;
use crescent::object::builtins::BUILTINS;
use crescent::object::Object;
use crescent::parser::Parser;
use crescent::vm::{GLOBAL_SIZE, VM};

fn main() {
    println!("crescent REPL 0.1.0");

    let mut rl = Editor::<()>::new();

    // Globals, constants and the symbol table survive across lines.
    let mut symbol_table = SymbolTable::new();
    for (i, b) in BUILTINS.iter().enumerate() {
        symbol_table.define_builtin(i, b.name);
    }
    let symbol_table = Rc::new(RefCell::new(symbol_table));
    let constants: Rc<RefCell<Vec<Object>>> = Rc::new(RefCell::new(vec![]));
    let globals = Rc::new(RefCell::new(vec![Object::Null; GLOBAL_SIZE]));

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                rl.add_history_entry(&line);

                let mut parser = Parser::new(Scanner::new(&line));
                let program = parser.parse();

                if !parser.errors().is_empty() {
                    for err in parser.errors() {
                        println!("{}", err);
                    }
                    continue;
                }

                let mut compiler =
                    Compiler::new_with_state(Rc::clone(&symbol_table), Rc::clone(&constants));
                if let Err(e) = compiler.compile(&program) {
                    println!("compiler error: {}", e);
                    continue;
                }

                let bytecode = compiler.bytecode();
                let mut vm = VM::new_with_globals_store(&bytecode, Rc::clone(&globals));
                if let Err(e) = vm.run() {
                    println!("vm error: {}", e);
                    continue;
                }

                println!("{}", vm.last_popped_stack_elem());
            }
            Err(ReadlineError::Interrupted) => {
                println!("\nExiting...");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
            }
        }
    }
}
