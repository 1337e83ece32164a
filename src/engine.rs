//! Script execution engine
//!
//! A two-stack virtual machine over a parsed instruction sequence. The
//! main stack holds the working byte vectors, the alt stack serves
//! TOALTSTACK/FROMALTSTACK, and a branch-return stack records the
//! instruction index to resume at when an ELSE or ENDIF is reached.
//!
//! Execution is synchronous and single-threaded; every `run` call starts
//! from fresh state, so independent engines may evaluate scripts on
//! separate threads with no coordination. Failure is always reported as a
//! `false` result — the engine never panics on any parsed input.
//!
//! Stack elements are addressed by index and cloned before the stack is
//! mutated, so no operation ever reads through a position invalidated by
//! its own push or removal.
//!
//! Numbers on the stack use the minimal signed little-endian encoding: the
//! magnitude in little-endian order with the high bit of the final byte as
//! the sign flag, and zero as the empty array. Operands wider than four
//! bytes fail the script; results are re-encoded minimally and may be
//! wider.

use crate::constants::*;
use crate::crypto;
use crate::opcode::{self, *};
use crate::script::Script;
use crate::types::*;

fn decode_num(data: &[u8]) -> i64 {
    if data.is_empty() {
        return 0;
    }

    let last = data.len() - 1;
    let mut value: i64 = 0;
    for (i, &b) in data.iter().enumerate() {
        let byte = if i == last { (b & 0x7f) as i64 } else { b as i64 };
        value += byte << (8 * i);
    }

    if data[last] & 0x80 != 0 {
        -value
    } else {
        value
    }
}

fn encode_num(value: i64) -> ByteString {
    if value == 0 {
        return ByteString::new();
    }

    let negative = value < 0;
    let mut magnitude = value.unsigned_abs();
    let mut out = ByteString::new();
    while magnitude > 0 {
        out.push((magnitude & 0xff) as u8);
        magnitude >>= 8;
    }

    // A set high bit in the top byte would read as the sign flag, so the
    // sign gets its own byte there
    let last = out.len() - 1;
    if out[last] & 0x80 != 0 {
        out.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        out[last] |= 0x80;
    }

    out
}

fn decode_bool(data: &[u8]) -> bool {
    // False is the empty array, all zeros, or negative zero (sign flag
    // alone in the final byte)
    for (i, &b) in data.iter().enumerate() {
        if b != 0 {
            return !(i == data.len() - 1 && b == 0x80);
        }
    }
    false
}

fn encode_bool(value: bool) -> ByteString {
    if value {
        vec![1]
    } else {
        ByteString::new()
    }
}

/// The script virtual machine.
///
/// State is owned exclusively by one execution; `run` resets everything
/// before interpreting, and two runs of the same script always agree.
pub struct ScriptEngine {
    main_stack: Vec<ByteString>,
    alt_stack: Vec<ByteString>,
    branch_returns: Vec<usize>,
    code_separator: usize,
}

impl ScriptEngine {
    /// Create an engine with empty state
    pub fn new() -> ScriptEngine {
        ScriptEngine {
            main_stack: Vec::new(),
            alt_stack: Vec::new(),
            branch_returns: Vec::new(),
            code_separator: 0,
        }
    }

    /// Evaluate a single script from fresh state.
    ///
    /// Returns true iff the script is valid, execution completes without a
    /// failure, and the final main stack is non-empty with a true top
    /// element.
    pub fn run(&mut self, script: &Script) -> bool {
        self.reset();
        if !self.execute(script) {
            return false;
        }
        self.final_stack_is_true()
    }

    /// Evaluate an unlocking script followed by a locking script over one
    /// shared stack, then apply the final truth check.
    pub fn verify_spend(&mut self, script_sig: &Script, script_pubkey: &Script) -> bool {
        self.reset();
        if !self.execute(script_sig) {
            return false;
        }
        if !self.execute(script_pubkey) {
            return false;
        }
        self.final_stack_is_true()
    }

    /// Returns the main stack, bottom first. Useful for inspecting the
    /// result of a partial evaluation in tests and tooling.
    pub fn main_stack(&self) -> &[ByteString] {
        &self.main_stack
    }

    fn reset(&mut self) {
        self.main_stack.clear();
        self.alt_stack.clear();
        self.branch_returns.clear();
        self.code_separator = 0;
    }

    fn final_stack_is_true(&self) -> bool {
        match self.main_stack.last() {
            Some(top) => decode_bool(top),
            None => false,
        }
    }

    // The interpreter loop. Leaves the stacks in place so a following
    // script can continue on them; `run` applies the final truth check.
    fn execute(&mut self, script: &Script) -> bool {
        if !script.valid() {
            return false;
        }

        self.branch_returns.clear();
        self.code_separator = 0;

        let instructions = script.instructions();
        let mut pc = 0;
        while pc < instructions.len() {
            let instruction = &instructions[pc];
            let op = instruction.opcode();
            pc += 1;

            if self.main_stack.len() < instruction.info().min_args as usize {
                return false;
            }

            if instruction.is_push() {
                self.main_stack.push(instruction.data().to_vec());
                continue;
            }

            if opcode::is_disabled(op) {
                return false;
            }

            match op {
                OP_1NEGATE => self.main_stack.push(vec![0x81]),

                OP_RESERVED | OP_VER | OP_RESERVED1 | OP_RESERVED2 => return false,

                OP_1..=OP_16 => self.main_stack.push(vec![op - 0x50]),

                OP_NOP => {}

                OP_IF | OP_NOTIF => {
                    let top = match self.main_stack.pop() {
                        Some(v) => v,
                        None => return false,
                    };
                    let mut condition = decode_bool(&top);
                    if op == OP_NOTIF {
                        condition = !condition;
                    }
                    match self.process_branch(instructions, pc, condition) {
                        Some(next) => pc = next,
                        None => return false,
                    }
                }

                OP_ELSE | OP_ENDIF => match self.branch_returns.pop() {
                    Some(resume) => pc = resume,
                    None => return false,
                },

                OP_VERIFY => {
                    let top = match self.main_stack.pop() {
                        Some(v) => v,
                        None => return false,
                    };
                    if !decode_bool(&top) {
                        return false;
                    }
                }

                OP_RETURN => return false,

                // Stack

                OP_TOALTSTACK => {
                    let top = match self.main_stack.pop() {
                        Some(v) => v,
                        None => return false,
                    };
                    self.alt_stack.push(top);
                }
                OP_FROMALTSTACK => match self.alt_stack.pop() {
                    Some(v) => self.main_stack.push(v),
                    None => return false,
                },
                OP_2DROP => {
                    self.main_stack.pop();
                    self.main_stack.pop();
                }
                OP_2DUP => {
                    let a = self.peek(1).clone();
                    let b = self.peek(0).clone();
                    self.main_stack.push(a);
                    self.main_stack.push(b);
                }
                OP_3DUP => {
                    let a = self.peek(2).clone();
                    let b = self.peek(1).clone();
                    let c = self.peek(0).clone();
                    self.main_stack.push(a);
                    self.main_stack.push(b);
                    self.main_stack.push(c);
                }
                OP_2OVER => {
                    let a = self.peek(3).clone();
                    let b = self.peek(2).clone();
                    self.main_stack.push(a);
                    self.main_stack.push(b);
                }
                OP_2ROT => {
                    let base = self.main_stack.len() - 6;
                    let a = self.main_stack.remove(base);
                    let b = self.main_stack.remove(base);
                    self.main_stack.push(a);
                    self.main_stack.push(b);
                }
                OP_2SWAP => {
                    let base = self.main_stack.len() - 4;
                    self.main_stack.swap(base, base + 2);
                    self.main_stack.swap(base + 1, base + 3);
                }
                OP_IFDUP => {
                    let top = self.peek(0).clone();
                    if decode_bool(&top) {
                        self.main_stack.push(top);
                    }
                }
                OP_DEPTH => {
                    let depth = self.main_stack.len() as i64;
                    self.main_stack.push(encode_num(depth));
                }
                OP_DROP => {
                    self.main_stack.pop();
                }
                OP_DUP => {
                    let top = self.peek(0).clone();
                    self.main_stack.push(top);
                }
                OP_NIP => {
                    let below = self.main_stack.len() - 2;
                    self.main_stack.remove(below);
                }
                OP_OVER => {
                    let below = self.peek(1).clone();
                    self.main_stack.push(below);
                }
                OP_PICK | OP_ROLL => {
                    let n = match self.numeric_operand(0) {
                        Some(n) => n,
                        None => return false,
                    };
                    self.main_stack.pop();
                    if n < 0 || n as usize >= self.main_stack.len() {
                        return false;
                    }
                    let index = self.main_stack.len() - 1 - n as usize;
                    if op == OP_PICK {
                        let element = self.main_stack[index].clone();
                        self.main_stack.push(element);
                    } else {
                        let element = self.main_stack.remove(index);
                        self.main_stack.push(element);
                    }
                }
                OP_ROT => {
                    let third = self.main_stack.len() - 3;
                    let element = self.main_stack.remove(third);
                    self.main_stack.push(element);
                }
                OP_SWAP => {
                    let len = self.main_stack.len();
                    self.main_stack.swap(len - 1, len - 2);
                }
                OP_TUCK => {
                    let top = self.peek(0).clone();
                    let below = self.main_stack.len() - 2;
                    self.main_stack.insert(below, top);
                }

                // Splice

                OP_SIZE => {
                    let size = self.peek(0).len() as i64;
                    self.main_stack.push(encode_num(size));
                }

                // Bitwise logic

                OP_EQUAL => {
                    let a = match self.main_stack.pop() {
                        Some(v) => v,
                        None => return false,
                    };
                    let b = match self.main_stack.pop() {
                        Some(v) => v,
                        None => return false,
                    };
                    self.main_stack.push(encode_bool(a == b));
                }
                OP_EQUALVERIFY => {
                    let a = match self.main_stack.pop() {
                        Some(v) => v,
                        None => return false,
                    };
                    let b = match self.main_stack.pop() {
                        Some(v) => v,
                        None => return false,
                    };
                    if a != b {
                        return false;
                    }
                }

                // Arithmetic

                OP_1ADD => {
                    let a = match self.numeric_operand(0) {
                        Some(a) => a,
                        None => return false,
                    };
                    self.replace_top(encode_num(a + 1));
                }
                OP_1SUB => {
                    let a = match self.numeric_operand(0) {
                        Some(a) => a,
                        None => return false,
                    };
                    self.replace_top(encode_num(a - 1));
                }
                OP_NEGATE => {
                    let a = match self.numeric_operand(0) {
                        Some(a) => a,
                        None => return false,
                    };
                    self.replace_top(encode_num(-a));
                }
                OP_ABS => {
                    let a = match self.numeric_operand(0) {
                        Some(a) => a,
                        None => return false,
                    };
                    self.replace_top(encode_num(a.abs()));
                }
                OP_NOT => {
                    if self.peek(0).len() > MAX_NUMERIC_OPERAND_SIZE {
                        return false;
                    }
                    let result = !decode_bool(self.peek(0));
                    self.replace_top(encode_bool(result));
                }
                OP_0NOTEQUAL => {
                    if self.peek(0).len() > MAX_NUMERIC_OPERAND_SIZE {
                        return false;
                    }
                    let result = decode_bool(self.peek(0));
                    self.replace_top(encode_bool(result));
                }
                OP_ADD => {
                    let (a, b) = match self.numeric_operands() {
                        Some(p) => p,
                        None => return false,
                    };
                    self.main_stack.pop();
                    self.replace_top(encode_num(a + b));
                }
                OP_SUB => {
                    let (a, b) = match self.numeric_operands() {
                        Some(p) => p,
                        None => return false,
                    };
                    self.main_stack.pop();
                    self.replace_top(encode_num(a - b));
                }
                OP_BOOLAND | OP_BOOLOR => {
                    if self.peek(0).len() > MAX_NUMERIC_OPERAND_SIZE
                        || self.peek(1).len() > MAX_NUMERIC_OPERAND_SIZE
                    {
                        return false;
                    }
                    let a = decode_bool(self.peek(1));
                    let b = decode_bool(self.peek(0));
                    let result = if op == OP_BOOLAND { a && b } else { a || b };
                    self.main_stack.pop();
                    self.replace_top(encode_bool(result));
                }
                OP_NUMEQUAL => {
                    let (a, b) = match self.numeric_operands() {
                        Some(p) => p,
                        None => return false,
                    };
                    self.main_stack.pop();
                    self.replace_top(encode_bool(a == b));
                }
                OP_NUMEQUALVERIFY => {
                    let (a, b) = match self.numeric_operands() {
                        Some(p) => p,
                        None => return false,
                    };
                    self.main_stack.pop();
                    self.main_stack.pop();
                    if a != b {
                        return false;
                    }
                }
                OP_NUMNOTEQUAL => {
                    let (a, b) = match self.numeric_operands() {
                        Some(p) => p,
                        None => return false,
                    };
                    self.main_stack.pop();
                    self.replace_top(encode_bool(a != b));
                }
                OP_LESSTHAN => {
                    let (a, b) = match self.numeric_operands() {
                        Some(p) => p,
                        None => return false,
                    };
                    self.main_stack.pop();
                    self.replace_top(encode_bool(a < b));
                }
                OP_GREATERTHAN => {
                    let (a, b) = match self.numeric_operands() {
                        Some(p) => p,
                        None => return false,
                    };
                    self.main_stack.pop();
                    self.replace_top(encode_bool(a > b));
                }
                OP_LESSTHANOREQUAL => {
                    let (a, b) = match self.numeric_operands() {
                        Some(p) => p,
                        None => return false,
                    };
                    self.main_stack.pop();
                    self.replace_top(encode_bool(a <= b));
                }
                OP_GREATERTHANOREQUAL => {
                    let (a, b) = match self.numeric_operands() {
                        Some(p) => p,
                        None => return false,
                    };
                    self.main_stack.pop();
                    self.replace_top(encode_bool(a >= b));
                }
                OP_MIN => {
                    let (a, b) = match self.numeric_operands() {
                        Some(p) => p,
                        None => return false,
                    };
                    self.main_stack.pop();
                    self.replace_top(encode_num(a.min(b)));
                }
                OP_MAX => {
                    let (a, b) = match self.numeric_operands() {
                        Some(p) => p,
                        None => return false,
                    };
                    self.main_stack.pop();
                    self.replace_top(encode_num(a.max(b)));
                }
                OP_WITHIN => {
                    // [.. min, x, max] with max on top: true when min <= x < max
                    let max = match self.numeric_operand(0) {
                        Some(v) => v,
                        None => return false,
                    };
                    let x = match self.numeric_operand(1) {
                        Some(v) => v,
                        None => return false,
                    };
                    let min = match self.numeric_operand(2) {
                        Some(v) => v,
                        None => return false,
                    };
                    self.main_stack.pop();
                    self.main_stack.pop();
                    self.replace_top(encode_bool(min <= x && x < max));
                }

                // Crypto

                OP_RIPEMD160 => {
                    let hash = crypto::ripemd160(self.peek(0));
                    self.replace_top(hash.to_vec());
                }
                OP_SHA1 => {
                    let hash = crypto::sha1(self.peek(0));
                    self.replace_top(hash.to_vec());
                }
                OP_SHA256 => {
                    let hash = crypto::sha256(self.peek(0));
                    self.replace_top(hash.to_vec());
                }
                OP_HASH160 => {
                    let hash = crypto::hash160(self.peek(0));
                    self.replace_top(hash.to_vec());
                }
                OP_HASH256 => {
                    let hash = crypto::double_sha256(self.peek(0));
                    self.replace_top(hash.to_vec());
                }
                OP_CODESEPARATOR => {
                    self.code_separator = instruction.location();
                }
                OP_CHECKSIG | OP_CHECKSIGVERIFY => {
                    let pubkey = match self.main_stack.pop() {
                        Some(v) => v,
                        None => return false,
                    };
                    let signature = match self.main_stack.pop() {
                        Some(v) => v,
                        None => return false,
                    };
                    let message = self.signing_hash(script);
                    let ok = crypto::verify_signature(&message, &pubkey, &signature);
                    if op == OP_CHECKSIG {
                        self.main_stack.push(encode_bool(ok));
                    } else if !ok {
                        return false;
                    }
                }
                OP_CHECKMULTISIG | OP_CHECKMULTISIGVERIFY => {
                    let ok = match self.check_multisig(script) {
                        Some(ok) => ok,
                        None => return false,
                    };
                    if op == OP_CHECKMULTISIG {
                        self.main_stack.push(encode_bool(ok));
                    } else if !ok {
                        return false;
                    }
                }

                OP_NOP1..=OP_NOP10 => {}

                // Unassigned values are rejected by the parser; nothing
                // else reaches here
                _ => return false,
            }
        }

        true
    }

    // Element `depth` positions below the top. Callers stay within the
    // opcode's min_args guarantee.
    fn peek(&self, depth: usize) -> &ByteString {
        &self.main_stack[self.main_stack.len() - 1 - depth]
    }

    fn replace_top(&mut self, value: ByteString) {
        let top = self.main_stack.len() - 1;
        self.main_stack[top] = value;
    }

    // Numeric view of the element `depth` below the top; None when the
    // element is missing or wider than the operand limit.
    fn numeric_operand(&self, depth: usize) -> Option<i64> {
        if depth >= self.main_stack.len() {
            return None;
        }
        let bytes = self.peek(depth);
        if bytes.len() > MAX_NUMERIC_OPERAND_SIZE {
            return None;
        }
        Some(decode_num(bytes))
    }

    // Both operands of a binary numeric op as (deeper, top)
    fn numeric_operands(&self) -> Option<(i64, i64)> {
        let b = self.numeric_operand(0)?;
        let a = self.numeric_operand(1)?;
        Some((a, b))
    }

    // The message covered by signature checks: the script bytes from the
    // most recent CODESEPARATOR onward, double-hashed
    fn signing_hash(&self, script: &Script) -> Hash {
        crypto::double_sha256(&script.data()[self.code_separator..])
    }

    // Pops key count, keys, signature count, signatures, and the
    // historical extra element, then matches each signature against the
    // remaining keys in order. None reports a malformed layout.
    fn check_multisig(&mut self, script: &Script) -> Option<bool> {
        let key_count = self.numeric_operand(0)?;
        self.main_stack.pop();
        if key_count < 0 || key_count > MAX_MULTISIG_KEYS {
            return None;
        }
        let key_count = key_count as usize;
        if self.main_stack.len() < key_count {
            return None;
        }
        let mut keys: Vec<ByteString> = Vec::with_capacity(key_count);
        for _ in 0..key_count {
            keys.push(self.main_stack.pop()?);
        }
        keys.reverse();

        let signature_count = self.numeric_operand(0)?;
        self.main_stack.pop();
        if signature_count < 0 || signature_count as usize > key_count {
            return None;
        }
        let signature_count = signature_count as usize;
        if self.main_stack.len() < signature_count {
            return None;
        }
        let mut signatures: Vec<ByteString> = Vec::with_capacity(signature_count);
        for _ in 0..signature_count {
            signatures.push(self.main_stack.pop()?);
        }
        signatures.reverse();

        // One extra element is consumed, matching the original protocol
        self.main_stack.pop()?;

        let message = self.signing_hash(script);
        let mut key_index = 0;
        for signature in &signatures {
            let mut found = false;
            while key_index < keys.len() {
                let key = &keys[key_index];
                key_index += 1;
                if crypto::verify_signature(&message, key, signature) {
                    found = true;
                    break;
                }
            }
            if !found {
                return Some(false);
            }
        }
        Some(true)
    }

    fn push_branch_return(&mut self, resume: usize) -> bool {
        if self.branch_returns.len() >= MAX_CONDITIONAL_DEPTH {
            return false;
        }
        self.branch_returns.push(resume);
        true
    }

    // Resolve an IF/NOTIF whose condition has been popped. Returns the
    // instruction index to continue at, or None for an unterminated block
    // or over-deep nesting.
    fn process_branch(
        &mut self,
        instructions: &[crate::script::Instruction],
        pc: usize,
        condition: bool,
    ) -> Option<usize> {
        if condition {
            let end = find_matching_endif(instructions, pc)?;
            if !self.push_branch_return(end + 1) {
                return None;
            }
            Some(pc)
        } else {
            let target = find_matching_else(instructions, pc)?;
            if instructions[target].opcode() == OP_ELSE {
                let end = find_matching_endif(instructions, target + 1)?;
                if !self.push_branch_return(end + 1) {
                    return None;
                }
                Some(target + 1)
            } else {
                if !self.push_branch_return(target + 1) {
                    return None;
                }
                Some(target)
            }
        }
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        ScriptEngine::new()
    }
}

// Index of the ELSE or ENDIF belonging to the block opened just before
// `start`, skipping nested IF/NOTIF blocks by depth counting
fn find_matching_else(instructions: &[crate::script::Instruction], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = start;
    while i < instructions.len() {
        match instructions[i].opcode() {
            OP_IF | OP_NOTIF => depth += 1,
            OP_ELSE if depth == 0 => return Some(i),
            OP_ENDIF => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

// Index of the ENDIF belonging to the block opened just before `start`
fn find_matching_endif(instructions: &[crate::script::Instruction], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = start;
    while i < instructions.len() {
        match instructions[i].opcode() {
            OP_IF | OP_NOTIF => depth += 1,
            OP_ENDIF => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}
