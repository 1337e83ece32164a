//! Script byte-form parsing
//!
//! A script is a byte string holding a sequence of instructions: data
//! pushes and operations. Parsing is total — any byte string produces a
//! `Script` — but a script is only `valid()` when every instruction decoded
//! cleanly and no forbidden opcode appears anywhere, executed or not.

use crate::error::{LedgerError, Result};
use crate::opcode::{self, OpcodeInfo, OP_0, OP_PUSHDATA1, OP_PUSHDATA2, OP_PUSHDATA4};
use crate::types::*;
use serde::{Deserialize, Serialize};

/// A single decoded instruction.
///
/// `data` is non-empty only for push opcodes; OP_0 is a push of the empty
/// array and carries empty data. `location` is the byte offset of the
/// opcode in the source script. Instructions are immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    opcode: u8,
    data: ByteString,
    location: usize,
}

impl Instruction {
    /// Decode one instruction starting at `offset`.
    ///
    /// Push opcodes consume their length prefix (if any) and exactly that
    /// many data bytes. Running out of bytes at any step is
    /// `TruncatedScript`; an opcode whose descriptor is marked invalid is
    /// `ForbiddenOpcode`.
    pub fn decode(bytes: &[u8], offset: usize) -> Result<Instruction> {
        let opcode = *bytes
            .get(offset)
            .ok_or(LedgerError::TruncatedScript(offset))?;

        if !opcode::describe(opcode).valid {
            return Err(LedgerError::ForbiddenOpcode(opcode));
        }

        let mut data = ByteString::new();
        if opcode >= 0x01 && opcode <= OP_PUSHDATA4 {
            let mut cursor = offset + 1;
            let count = match opcode {
                OP_PUSHDATA1 => {
                    let b = *bytes
                        .get(cursor)
                        .ok_or(LedgerError::TruncatedScript(offset))?;
                    cursor += 1;
                    b as usize
                }
                OP_PUSHDATA2 => {
                    let b = bytes
                        .get(cursor..cursor + 2)
                        .ok_or(LedgerError::TruncatedScript(offset))?;
                    cursor += 2;
                    u16::from_le_bytes([b[0], b[1]]) as usize
                }
                OP_PUSHDATA4 => {
                    let b = bytes
                        .get(cursor..cursor + 4)
                        .ok_or(LedgerError::TruncatedScript(offset))?;
                    cursor += 4;
                    u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize
                }
                n => n as usize,
            };

            data = bytes
                .get(cursor..cursor + count)
                .ok_or(LedgerError::TruncatedScript(offset))?
                .to_vec();
        }

        Ok(Instruction {
            opcode,
            data,
            location: offset,
        })
    }

    /// Returns the opcode
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Returns the push data (empty for non-push instructions)
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the byte offset of the instruction in the source script
    pub fn location(&self) -> usize {
        self.location
    }

    /// Returns the encoded size, including any length prefix
    pub fn size(&self) -> usize {
        let prefix = match self.opcode {
            OP_PUSHDATA1 => 1,
            OP_PUSHDATA2 => 2,
            OP_PUSHDATA4 => 4,
            _ => 0,
        };
        1 + prefix + self.data.len()
    }

    /// Returns true if the instruction pushes data
    pub fn is_push(&self) -> bool {
        opcode::is_push(self.opcode)
    }

    /// Returns the static descriptor for this instruction's opcode
    pub fn info(&self) -> &'static OpcodeInfo {
        opcode::describe(self.opcode)
    }

    /// Append the canonical byte form to `out`
    pub fn serialize_into(&self, out: &mut ByteString) {
        out.push(self.opcode);
        match self.opcode {
            OP_PUSHDATA1 => out.push(self.data.len() as u8),
            OP_PUSHDATA2 => out.extend_from_slice(&(self.data.len() as u16).to_le_bytes()),
            OP_PUSHDATA4 => out.extend_from_slice(&(self.data.len() as u32).to_le_bytes()),
            _ => {}
        }
        out.extend_from_slice(&self.data);
    }
}

/// A parsed script.
///
/// Holds the raw bytes alongside the decoded instruction sequence. Immutable
/// after construction. Invalid scripts keep whatever prefix decoded cleanly,
/// which the text forms can still render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    data: ByteString,
    instructions: Vec<Instruction>,
    valid: bool,
}

impl Script {
    /// Parse a script from its byte form
    pub fn new(data: ByteString) -> Script {
        let mut instructions = Vec::new();
        let mut valid = true;

        let mut offset = 0;
        while offset < data.len() {
            match Instruction::decode(&data, offset) {
                Ok(instruction) => {
                    offset += instruction.size();
                    instructions.push(instruction);
                }
                Err(_) => {
                    valid = false;
                    break;
                }
            }
        }

        Script {
            data,
            instructions,
            valid,
        }
    }

    /// Parse a script from hex text
    pub fn from_hex(s: &str) -> Result<Script> {
        let data = hex::decode(s).map_err(|e| LedgerError::InvalidFormat(e.to_string()))?;
        Ok(Script::new(data))
    }

    /// Returns the raw byte form
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the decoded instruction sequence
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns true when every instruction decoded and no forbidden opcode
    /// appears
    pub fn valid(&self) -> bool {
        self.valid
    }

    /// Append the raw byte form to `out`
    pub fn serialize_into(&self, out: &mut ByteString) {
        out.extend_from_slice(&self.data);
    }

    /// Returns the script as hex text
    pub fn to_hex(&self) -> String {
        hex::encode(&self.data)
    }

    /// Returns the script in assembly form: mnemonics for operations, hex
    /// for push data, "0" for the empty push.
    pub fn to_asm(&self) -> String {
        let rendered: Vec<String> = self
            .instructions
            .iter()
            .map(|i| {
                if i.opcode() == OP_0 {
                    "0".to_string()
                } else if i.is_push() {
                    hex::encode(i.data())
                } else {
                    i.info().name.to_string()
                }
            })
            .collect();
        rendered.join(" ")
    }

    /// Returns the script's hex form as a JSON string value
    pub fn to_json(&self) -> String {
        serde_json::Value::String(self.to_hex()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::*;

    #[test]
    fn test_parse_empty() {
        let script = Script::new(vec![]);
        assert!(script.valid());
        assert!(script.instructions().is_empty());
    }

    #[test]
    fn test_parse_pay_to_pubkey_hash() {
        let mut bytes = vec![OP_DUP, OP_HASH160, 0x14];
        bytes.extend_from_slice(&[0xaa; 20]);
        bytes.push(OP_EQUALVERIFY);
        bytes.push(OP_CHECKSIG);

        let script = Script::new(bytes);
        assert!(script.valid());
        assert_eq!(script.instructions().len(), 5);

        let push = &script.instructions()[2];
        assert_eq!(push.opcode(), 0x14);
        assert_eq!(push.data(), &[0xaa; 20]);
        assert_eq!(push.location(), 2);
        assert_eq!(push.size(), 21);

        assert_eq!(script.instructions()[3].location(), 23);
        assert_eq!(script.instructions()[4].location(), 24);
    }

    #[test]
    fn test_parse_op_0_is_an_empty_push() {
        let script = Script::new(vec![OP_0]);
        assert!(script.valid());
        let i = &script.instructions()[0];
        assert!(i.is_push());
        assert!(i.data().is_empty());
    }

    #[test]
    fn test_non_push_instructions_carry_no_data() {
        let script = Script::new(vec![OP_1, OP_DUP, OP_NOP]);
        assert!(script.valid());
        for i in script.instructions() {
            assert!(i.data().is_empty());
        }
    }

    #[test]
    fn test_parse_pushdata1() {
        let mut bytes = vec![OP_PUSHDATA1, 0x03];
        bytes.extend_from_slice(b"abc");
        let script = Script::new(bytes);
        assert!(script.valid());
        let i = &script.instructions()[0];
        assert_eq!(i.data(), b"abc");
        assert_eq!(i.size(), 5);
    }

    #[test]
    fn test_parse_pushdata2() {
        let mut bytes = vec![OP_PUSHDATA2, 0x00, 0x01];
        bytes.extend_from_slice(&[0x55; 256]);
        let script = Script::new(bytes);
        assert!(script.valid());
        let i = &script.instructions()[0];
        assert_eq!(i.data().len(), 256);
        assert_eq!(i.size(), 259);
    }

    #[test]
    fn test_parse_pushdata4() {
        let mut bytes = vec![OP_PUSHDATA4, 0x05, 0x00, 0x00, 0x00];
        bytes.extend_from_slice(b"hello");
        let script = Script::new(bytes);
        assert!(script.valid());
        assert_eq!(script.instructions()[0].data(), b"hello");
        assert_eq!(script.instructions()[0].size(), 10);
    }

    #[test]
    fn test_truncated_direct_push() {
        // Push of 5 bytes with only 3 available
        let script = Script::new(vec![0x05, 0x01, 0x02, 0x03]);
        assert!(!script.valid());
    }

    #[test]
    fn test_truncated_length_prefix() {
        assert!(!Script::new(vec![OP_PUSHDATA1]).valid());
        assert!(!Script::new(vec![OP_PUSHDATA2, 0x01]).valid());
        assert!(!Script::new(vec![OP_PUSHDATA4, 0x01, 0x00]).valid());
    }

    #[test]
    fn test_truncated_pushdata_body() {
        let script = Script::new(vec![OP_PUSHDATA1, 0x10, 0x01, 0x02]);
        assert!(!script.valid());
    }

    #[test]
    fn test_verif_invalidates_even_unexecuted() {
        // OP_0 IF VERIF ENDIF: the VERIF branch would never execute, the
        // script is invalid regardless
        let script = Script::new(vec![OP_0, OP_IF, OP_VERIF, OP_ENDIF]);
        assert!(!script.valid());

        let script = Script::new(vec![OP_0, OP_IF, OP_VERNOTIF, OP_ENDIF]);
        assert!(!script.valid());
    }

    #[test]
    fn test_unassigned_opcode_invalidates() {
        assert!(!Script::new(vec![OP_1, 0xba]).valid());
        assert!(!Script::new(vec![0xff]).valid());
    }

    #[test]
    fn test_disabled_opcodes_still_parse() {
        let script = Script::new(vec![OP_1, OP_1, OP_CAT]);
        assert!(script.valid());
    }

    #[test]
    fn test_instruction_decode_errors() {
        assert_eq!(
            Instruction::decode(&[], 0),
            Err(LedgerError::TruncatedScript(0))
        );
        assert_eq!(
            Instruction::decode(&[OP_VERIF], 0),
            Err(LedgerError::ForbiddenOpcode(OP_VERIF))
        );
    }

    #[test]
    fn test_serialize_round_trip() {
        let mut bytes = vec![OP_DUP, OP_HASH160, 0x02, 0xab, 0xcd, OP_PUSHDATA1, 0x01, 0x99];
        bytes.push(OP_CHECKSIG);
        let script = Script::new(bytes.clone());
        assert!(script.valid());

        let mut out = ByteString::new();
        for i in script.instructions() {
            i.serialize_into(&mut out);
        }
        assert_eq!(out, bytes);

        let mut whole = ByteString::new();
        script.serialize_into(&mut whole);
        assert_eq!(whole, bytes);
    }

    #[test]
    fn test_to_asm() {
        let mut bytes = vec![OP_DUP, OP_HASH160, 0x02, 0xab, 0xcd];
        bytes.push(OP_EQUALVERIFY);
        bytes.push(OP_CHECKSIG);
        let script = Script::new(bytes);
        assert_eq!(script.to_asm(), "DUP HASH160 abcd EQUALVERIFY CHECKSIG");

        let script = Script::new(vec![OP_0, OP_1]);
        assert_eq!(script.to_asm(), "0 1");
    }

    #[test]
    fn test_hex_forms() {
        let script = Script::from_hex("76a988ac").unwrap();
        assert!(script.valid());
        assert_eq!(script.to_hex(), "76a988ac");
        assert_eq!(script.to_json(), "\"76a988ac\"");

        assert!(Script::from_hex("not hex").is_err());
    }
}
