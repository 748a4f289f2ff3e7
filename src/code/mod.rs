use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

#[derive(Debug, Clone, PartialEq)]
pub struct Instructions(pub Vec<u8>);

impl std::ops::Deref for Instructions {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for Instructions {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl IntoIterator for Instructions {
    type Item = u8;
    type IntoIter = std::vec::IntoIter<u8>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

pub type Opcode = u8;

pub const OPCONSTANT: Opcode = 0;
pub const OPADD: Opcode = 1;
pub const OPSUB: Opcode = 2;
pub const OPMUL: Opcode = 3;
pub const OPDIV: Opcode = 4;
pub const OPNEGATE: Opcode = 5;
pub const OPNOT: Opcode = 6;
pub const OPTRUE: Opcode = 7;
pub const OPFALSE: Opcode = 8;
pub const OPNULL: Opcode = 9;
pub const OPEQUAL: Opcode = 10;
pub const OPNOTEQUAL: Opcode = 11;
pub const OPGREATERTHAN: Opcode = 12;
pub const OPLESSTHAN: Opcode = 13;
pub const OPJUMP: Opcode = 14;
pub const OPJUMPFALSE: Opcode = 15;
pub const OPPOP: Opcode = 16;
pub const OPSETGLOBAL: Opcode = 17;
pub const OPGETGLOBAL: Opcode = 18;
pub const OPSETLOCAL: Opcode = 19;
pub const OPGETLOCAL: Opcode = 20;
pub const OPGETBUILTIN: Opcode = 21;
pub const OPGETFREE: Opcode = 22;
pub const OPCURRENTCLOSURE: Opcode = 23;
pub const OPARRAY: Opcode = 24;
pub const OPOBJECT: Opcode = 25;
pub const OPINDEX: Opcode = 26;
pub const OPCALL: Opcode = 27;
pub const OPRETURN: Opcode = 28;
pub const OPRETURNVALUE: Opcode = 29;
pub const OPCLOSURE: Opcode = 30;

#[derive(Debug)]
pub struct Definition {
    pub name: String,
    pub operand_widths: Vec<usize>,
}

static DEFINITIONS: Lazy<HashMap<Opcode, Definition>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(OPCONSTANT, Definition {
        name: "OpConstant".to_string(),
        operand_widths: vec![2],
    });
    m.insert(OPADD, Definition {
        name: "OpAdd".to_string(),
        operand_widths: vec![],
    });
    m.insert(OPSUB, Definition {
        name: "OpSub".to_string(),
        operand_widths: vec![],
    });
    m.insert(OPMUL, Definition {
        name: "OpMul".to_string(),
        operand_widths: vec![],
    });
    m.insert(OPDIV, Definition {
        name: "OpDiv".to_string(),
        operand_widths: vec![],
    });
    m.insert(OPNEGATE, Definition {
        name: "OpNegate".to_string(),
        operand_widths: vec![],
    });
    m.insert(OPNOT, Definition {
        name: "OpNot".to_string(),
        operand_widths: vec![],
    });
    m.insert(OPTRUE, Definition {
        name: "OpTrue".to_string(),
        operand_widths: vec![],
    });
    m.insert(OPFALSE, Definition {
        name: "OpFalse".to_string(),
        operand_widths: vec![],
    });
    m.insert(OPNULL, Definition {
        name: "OpNull".to_string(),
        operand_widths: vec![],
    });
    m.insert(OPEQUAL, Definition {
        name: "OpEqual".to_string(),
        operand_widths: vec![],
    });
    m.insert(OPNOTEQUAL, Definition {
        name: "OpNotEqual".to_string(),
        operand_widths: vec![],
    });
    m.insert(OPGREATERTHAN, Definition {
        name: "OpGreaterThan".to_string(),
        operand_widths: vec![],
    });
    m.insert(OPLESSTHAN, Definition {
        name: "OpLessThan".to_string(),
        operand_widths: vec![],
    });
    m.insert(OPJUMP, Definition {
        name: "OpJump".to_string(),
        operand_widths: vec![2],
    });
    m.insert(OPJUMPFALSE, Definition {
        name: "OpJumpFalse".to_string(),
        operand_widths: vec![2],
    });
    m.insert(OPPOP, Definition {
        name: "OpPop".to_string(),
        operand_widths: vec![],
    });
    m.insert(OPSETGLOBAL, Definition {
        name: "OpSetGlobal".to_string(),
        operand_widths: vec![2],
    });
    m.insert(OPGETGLOBAL, Definition {
        name: "OpGetGlobal".to_string(),
        operand_widths: vec![2],
    });
    m.insert(OPSETLOCAL, Definition {
        name: "OpSetLocal".to_string(),
        operand_widths: vec![1],
    });
    m.insert(OPGETLOCAL, Definition {
        name: "OpGetLocal".to_string(),
        operand_widths: vec![1],
    });
    m.insert(OPGETBUILTIN, Definition {
        name: "OpGetBuiltin".to_string(),
        operand_widths: vec![1],
    });
    m.insert(OPGETFREE, Definition {
        name: "OpGetFree".to_string(),
        operand_widths: vec![1],
    });
    m.insert(OPCURRENTCLOSURE, Definition {
        name: "OpCurrentClosure".to_string(),
        operand_widths: vec![],
    });
    m.insert(OPARRAY, Definition {
        name: "OpArray".to_string(),
        operand_widths: vec![2],
    });
    m.insert(OPOBJECT, Definition {
        name: "OpObject".to_string(),
        operand_widths: vec![2],
    });
    m.insert(OPINDEX, Definition {
        name: "OpIndex".to_string(),
        operand_widths: vec![],
    });
    m.insert(OPCALL, Definition {
        name: "OpCall".to_string(),
        operand_widths: vec![1],
    });
    m.insert(OPRETURN, Definition {
        name: "OpReturn".to_string(),
        operand_widths: vec![],
    });
    m.insert(OPRETURNVALUE, Definition {
        name: "OpReturnValue".to_string(),
        operand_widths: vec![],
    });
    m.insert(OPCLOSURE, Definition {
        name: "OpClosure".to_string(),
        operand_widths: vec![2, 1],
    });
    m
});

impl Instructions {
    pub fn new() -> Self {
        Instructions(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.0.get(index).copied()
    }

    pub fn fmt_instruction(def: &Definition, operands: &[i32]) -> String {
        let operand_count = def.operand_widths.len();

        if operands.len() != operand_count {
            return format!(
                "ERROR: operand len {} does not match defined {}\n",
                operands.len(),
                operand_count
            );
        }

        match operand_count {
            0 => def.name.clone(),
            1 => format!("{} {}", def.name, operands[0]),
            2 => format!("{} {} {}", def.name, operands[0], operands[1]),
            _ => format!("ERROR: unhandled operandCount for {}\n", def.name),
        }
    }
}

impl Default for Instructions {
    fn default() -> Self {
        Instructions::new()
    }
}

impl fmt::Display for Instructions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut i = 0;
        while i < self.len() {
            let op = self.get(i).unwrap_or(0);
            let def = match lookup(op) {
                Ok(def) => def,
                Err(err) => {
                    writeln!(f, "ERROR: {}", err)?;
                    i += 1;
                    continue;
                }
            };

            let (operands, read) = read_operands(def, &self.0[i + 1..]);
            writeln!(f, "{:04} {}", i, Instructions::fmt_instruction(def, &operands))?;
            i += 1 + read;
        }
        Ok(())
    }
}

pub fn lookup(op: u8) -> Result<&'static Definition, String> {
    match DEFINITIONS.get(&op) {
        Some(def) => Ok(def),
        None => Err(format!("opcode {} undefined", op)),
    }
}

pub fn make(op: Opcode, operands: &[i32]) -> Instructions {
    let def = match lookup(op) {
        Ok(def) => def,
        Err(_) => return Instructions(vec![]),
    };

    let mut instruction_len = 1;
    for w in &def.operand_widths {
        instruction_len += w;
    }

    let mut instruction = vec![0u8; instruction_len];
    instruction[0] = op;

    let mut offset = 1;
    for (i, o) in operands.iter().enumerate() {
        let width = def.operand_widths[i];
        match width {
            2 => {
                let val = *o as u16;
                instruction[offset] = (val >> 8) as u8;
                instruction[offset + 1] = (val & 0xff) as u8;
            }
            1 => {
                instruction[offset] = *o as u8;
            }
            _ => {}
        }
        offset += width;
    }

    Instructions(instruction)
}

pub fn read_operands(def: &Definition, ins: &[u8]) -> (Vec<i32>, usize) {
    let mut operands = Vec::with_capacity(def.operand_widths.len());
    let mut offset = 0;

    for width in &def.operand_widths {
        match *width {
            2 => {
                let val = read_u16(&ins[offset..offset + 2]);
                operands.push(val as i32);
            }
            1 => {
                let val = read_u8(&ins[offset]);
                operands.push(val);
            }
            _ => {}
        }
        offset += *width;
    }

    (operands, offset)
}

pub fn read_u8(ins: &u8) -> i32 {
    *ins as i32
}

pub fn read_u16(ins: &[u8]) -> u16 {
    ((ins[0] as u16) << 8) | (ins[1] as u16)
}
