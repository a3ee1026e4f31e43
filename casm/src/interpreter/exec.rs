//! Instruction dispatch and the addressing resolver.

use casm_common::token::TokenKind;
use casm_common::CasmError;
use casm_lang::Scanner;

use super::machine::{parse_int, Interpreter, PC};

/// A register operand: the index named in the source and the value it held
/// when the operand was parsed.
#[derive(Debug, Clone, Copy)]
struct Reg {
    index: usize,
    value: i64,
}

/// A parsed operand. Whether it stands for a value or an address is decided
/// by the instruction context that resolves it.
#[derive(Debug, Clone, Copy)]
enum Addressing {
    /// `Rn`
    Direct(Reg),
    /// `=k`
    Immediate(i64),
    /// `[k, Rn]`
    Indexed { base: i64, reg: Reg },
    /// `@Rn`
    Indirect(Reg),
    /// `$Rn`
    Relative(Reg),
}

impl Addressing {
    fn mode(&self) -> &'static str {
        match self {
            Addressing::Direct(_) => "direct",
            Addressing::Immediate(_) => "immediate",
            Addressing::Indexed { .. } => "indexed",
            Addressing::Indirect(_) => "indirect",
            Addressing::Relative(_) => "relative",
        }
    }
}

impl Interpreter {
    /// Dispatch on the instruction token and run it. The whole token list
    /// must be consumed; anything left over is an error.
    pub(super) fn execute(&mut self, scanner: &mut Scanner) -> Result<(), CasmError> {
        let Some(&instruction) = scanner.advance() else {
            return Ok(());
        };
        match instruction.kind {
            TokenKind::Load => self.exec_load(scanner)?,
            TokenKind::Store => self.exec_store(scanner)?,
            TokenKind::Read => self.exec_read(scanner)?,
            TokenKind::Write => self.exec_write(scanner)?,
            TokenKind::Add | TokenKind::Sub | TokenKind::Mul | TokenKind::Div => {
                self.exec_math(instruction.kind, scanner)?
            }
            TokenKind::Inc => {
                let reg = self.register(scanner)?;
                self.set_register(reg.index, reg.value.wrapping_add(1))?;
            }
            TokenKind::Br => {
                let target = self.branch_target(scanner)?;
                self.set_pc(target);
            }
            TokenKind::Blt
            | TokenKind::Bgt
            | TokenKind::Bleq
            | TokenKind::Bgeq
            | TokenKind::Beq
            | TokenKind::Bneq => self.exec_branch(instruction.kind, scanner)?,
            TokenKind::Halt => self.halt(),
            _ => {
                return Err(CasmError::ParseUnknownInstruction {
                    literal: instruction.literal.to_owned(),
                })
            }
        }
        if !scanner.at_end() {
            return Err(CasmError::ParseTrailingTokens);
        }
        Ok(())
    }

    fn exec_load(&mut self, scanner: &mut Scanner) -> Result<(), CasmError> {
        let reg = self.register(scanner)?;
        scanner.consume(TokenKind::Comma)?;
        let value = self.load_value(scanner)?;
        self.set_register(reg.index, value)
    }

    fn exec_store(&mut self, scanner: &mut Scanner) -> Result<(), CasmError> {
        let reg = self.register(scanner)?;
        scanner.consume(TokenKind::Comma)?;
        let address = self.store_address(scanner)?;
        self.set_memory(address, reg.value.to_string())
    }

    fn exec_read(&mut self, scanner: &mut Scanner) -> Result<(), CasmError> {
        let reg = self.register(scanner)?;
        scanner.consume(TokenKind::Comma)?;
        let value = self.read_value(scanner)?;
        self.set_register(reg.index, value)
    }

    fn exec_write(&mut self, scanner: &mut Scanner) -> Result<(), CasmError> {
        let reg = self.register(scanner)?;
        scanner.consume(TokenKind::Comma)?;
        let address = self.write_address(scanner)?;
        self.set_storage(address, reg.value.to_string())
    }

    fn exec_math(&mut self, instruction: TokenKind, scanner: &mut Scanner) -> Result<(), CasmError> {
        let r1 = self.register(scanner)?;
        scanner.consume(TokenKind::Comma)?;
        let r2 = self.register(scanner)?;
        let (a, b) = (r1.value, r2.value);
        match instruction {
            TokenKind::Add => self.set_register(r1.index, a.wrapping_add(b))?,
            TokenKind::Sub => self.set_register(r1.index, a.wrapping_sub(b))?,
            TokenKind::Mul => self.set_register(r1.index, a.wrapping_mul(b))?,
            TokenKind::Div => {
                if b == 0 {
                    return Err(CasmError::DivByZero);
                }
                // Remainder lands in the divisor register first, then the
                // quotient overwrites the dividend.
                self.set_register(r2.index, a.wrapping_rem(b))?;
                self.set_register(r1.index, a.wrapping_div(b))?;
            }
            _ => unreachable!("execute() only dispatches math kinds here"),
        }
        Ok(())
    }

    fn exec_branch(&mut self, instruction: TokenKind, scanner: &mut Scanner) -> Result<(), CasmError> {
        let r1 = self.register(scanner)?;
        scanner.consume(TokenKind::Comma)?;
        let r2 = self.register(scanner)?;
        scanner.consume(TokenKind::Comma)?;
        let target = self.branch_target(scanner)?;
        let taken = match instruction {
            TokenKind::Blt => r1.value < r2.value,
            TokenKind::Bgt => r1.value > r2.value,
            TokenKind::Bleq => r1.value <= r2.value,
            TokenKind::Bgeq => r1.value >= r2.value,
            TokenKind::Beq => r1.value == r2.value,
            TokenKind::Bneq => r1.value != r2.value,
            _ => unreachable!("execute() only dispatches conditional branches here"),
        };
        if taken {
            self.set_pc(target);
        }
        Ok(())
    }

    fn branch_target(&mut self, scanner: &mut Scanner) -> Result<usize, CasmError> {
        let token = scanner.consume(TokenKind::LabelRef)?;
        self.resolve_jump(token.literal)
    }

    // Addressing. `operand` parses the syntax; the four context entry
    // points below decide which modes are legal and whether the result is
    // the address itself or the value behind it.

    fn operand(&mut self, scanner: &mut Scanner) -> Result<Addressing, CasmError> {
        let Some(token) = scanner.peek() else {
            return Err(CasmError::ParseExpectedToken {
                expected: TokenKind::Register,
                found: TokenKind::None,
            });
        };
        match token.kind {
            TokenKind::Register => Ok(Addressing::Direct(self.register(scanner)?)),
            TokenKind::Equal => {
                scanner.advance();
                Ok(Addressing::Immediate(number(scanner)?))
            }
            TokenKind::LBracket => {
                scanner.advance();
                let base = number(scanner)?;
                scanner.consume(TokenKind::Comma)?;
                let reg = self.register(scanner)?;
                scanner.consume(TokenKind::RBracket)?;
                Ok(Addressing::Indexed { base, reg })
            }
            TokenKind::At => {
                scanner.advance();
                Ok(Addressing::Indirect(self.register(scanner)?))
            }
            TokenKind::Dollar => {
                scanner.advance();
                Ok(Addressing::Relative(self.register(scanner)?))
            }
            _ => Err(CasmError::ParseUnknownInstruction {
                literal: token.literal.to_owned(),
            }),
        }
    }

    /// The byte address an operand designates. Immediate and indirect
    /// operands have no address form.
    fn address_of(&self, addressing: &Addressing) -> Result<i64, CasmError> {
        match addressing {
            Addressing::Direct(reg) => Ok(reg.value),
            Addressing::Indexed { base, reg } => Ok(base.wrapping_add(reg.value)),
            Addressing::Relative(reg) => Ok(self.relative_base().wrapping_add(reg.value)),
            other => Err(CasmError::AddrIllegalMode { mode: other.mode() }),
        }
    }

    /// `LOAD` accepts all five modes; direct yields the register itself and
    /// the rest go through memory.
    fn load_value(&mut self, scanner: &mut Scanner) -> Result<i64, CasmError> {
        let addressing = self.operand(scanner)?;
        match addressing {
            Addressing::Direct(reg) => Ok(reg.value),
            Addressing::Immediate(value) => Ok(value),
            Addressing::Indirect(reg) => self.get_memory(reg.value),
            Addressing::Indexed { .. } | Addressing::Relative(_) => {
                let address = self.address_of(&addressing)?;
                self.get_memory(address)
            }
        }
    }

    /// `STORE` takes any address-shaped operand.
    fn store_address(&mut self, scanner: &mut Scanner) -> Result<i64, CasmError> {
        let addressing = self.operand(scanner)?;
        self.address_of(&addressing)
    }

    /// `READ` pulls from storage; only direct and indexed shapes apply.
    fn read_value(&mut self, scanner: &mut Scanner) -> Result<i64, CasmError> {
        let addressing = self.operand(scanner)?;
        match addressing {
            Addressing::Direct(_) | Addressing::Indexed { .. } => {
                let address = self.address_of(&addressing)?;
                self.get_storage(address)
            }
            other => Err(CasmError::AddrIllegalMode { mode: other.mode() }),
        }
    }

    /// `WRITE` mirrors `READ` on the storage side.
    fn write_address(&mut self, scanner: &mut Scanner) -> Result<i64, CasmError> {
        let addressing = self.operand(scanner)?;
        match addressing {
            Addressing::Direct(_) | Addressing::Indexed { .. } => self.address_of(&addressing),
            other => Err(CasmError::AddrIllegalMode { mode: other.mode() }),
        }
    }

    /// `R5` -> the operand pair (5, registers[5]). R0 is the program
    /// counter and can never be named in source.
    fn register(&mut self, scanner: &mut Scanner) -> Result<Reg, CasmError> {
        let token = scanner.consume(TokenKind::Register)?;
        let index = (token.literal.as_bytes()[1] - b'0') as usize;
        if index == PC {
            return Err(CasmError::RegOutOfRange { index });
        }
        Ok(Reg {
            index,
            value: self.registers[index],
        })
    }

}

/// `=100` or `[100, ...]` -> 100.
fn number(scanner: &mut Scanner) -> Result<i64, CasmError> {
    let token = scanner.consume(TokenKind::Number)?;
    Ok(parse_int(token.literal))
}
