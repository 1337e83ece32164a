//! # Ledger-Core
//!
//! Core primitives of a Bitcoin-like ledger client: the script validation
//! engine with its supporting stack machine, the Base58Check address and
//! key codec, and compact-target difficulty arithmetic.
//!
//! ## Architecture
//!
//! The crate is layered leaf-first:
//! - `base58` / `base58check` — text codecs over big-endian integers
//! - `keys` / `address` — immutable value types with validity flags
//! - `target` — compact/hash-form proof-of-work target conversions
//! - `opcode` / `script` — the static opcode table and the byte-form parser
//! - `engine` — the two-stack virtual machine that evaluates scripts
//!
//! ## Design Principles
//!
//! 1. **Two error channels**: untrusted input produces values with
//!    `valid() == false`; structural decode failures are `Result` values.
//!    Script execution reports plain `bool` and never panics.
//! 2. **Fresh state per evaluation**: every engine run owns its stacks, so
//!    independent evaluations can proceed on separate threads.
//! 3. **Exact version pinning**: consensus-critical cryptography
//!    dependencies are pinned to exact versions.
//!
//! ## Usage
//!
//! ```rust
//! use ledger_core::engine::ScriptEngine;
//! use ledger_core::script::Script;
//!
//! // OP_1: push the number one, leaving a true value on the stack
//! let script = Script::new(vec![0x51]);
//! assert!(script.valid());
//!
//! let mut engine = ScriptEngine::new();
//! assert!(engine.run(&script));
//! ```
//!
//! ```rust
//! use ledger_core::address::Address;
//! use ledger_core::constants::MAIN_NETWORK_ID;
//! use ledger_core::keys::{PrivateKey, PublicKey};
//!
//! let key = PrivateKey::from_text("5HpHagT65TZzG1PH3CSu63k8DbpvD8s5ip4nEB3kEsreAnchuDf");
//! assert!(key.valid());
//!
//! let address = Address::from_public_key(&PublicKey::from_private_key(&key));
//! assert_eq!(
//!     address.to_string(MAIN_NETWORK_ID),
//!     "1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm"
//! );
//! ```

pub mod types;
pub mod constants;
pub mod error;
pub mod crypto;
pub mod base58;
pub mod base58check;
pub mod keys;
pub mod address;
pub mod target;
pub mod opcode;
pub mod script;
pub mod engine;

// Re-export commonly used types
pub use types::*;
pub use constants::*;
pub use error::{LedgerError, Result};
pub use address::Address;
pub use engine::ScriptEngine;
pub use keys::{PrivateKey, PublicKey};
pub use script::{Instruction, Script};
pub use target::Target;
