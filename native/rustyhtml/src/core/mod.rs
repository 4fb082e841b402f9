//! Core HTML scanning primitives
//!
//! This module contains the fundamental building blocks for HTML parsing:
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Tokenizer: Lenient state machine for HTML token extraction
//! - Entities: Character reference decoding with Cow (zero-copy when possible)
//! - Attributes: Attribute parsing and extraction
//! - Encoding: BOM and `<meta>` charset detection, conversion to UTF-8

pub mod attributes;
pub mod encoding;
pub mod entities;
pub mod scanner;
pub mod tokenizer;
