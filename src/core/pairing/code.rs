// src/core/pairing/code.rs

//! Generation of short, human-typed pairing codes.

use crate::core::errors::UniclipError;
use rand::Rng;

/// Uppercase letters and digits without the look-alikes `0`, `O`, `1` and `I`.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const DEFAULT_CODE_LENGTH: usize = 5;

pub const MAX_CODE_LENGTH: usize = 16;

const DEFAULT_MAX_ATTEMPTS: usize = 16;

/// Produces a code of the default length. Each character is drawn
/// independently and uniformly from [`CODE_ALPHABET`].
pub fn generate_code() -> String {
    generate_code_with(&mut rand::thread_rng(), DEFAULT_CODE_LENGTH)
}

/// Produces a code of `length` characters from the supplied random source.
pub fn generate_code_with<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Returns true if `code` has the given length and uses only the code alphabet.
pub fn is_well_formed(code: &str, length: usize) -> bool {
    code.len() == length && code.bytes().all(|b| CODE_ALPHABET.contains(&b))
}

/// A configured code generator. The registry owns one and asks it for a
/// code that is not currently outstanding.
#[derive(Debug, Clone, Copy)]
pub struct CodeGenerator {
    length: usize,
    max_attempts: usize,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH, DEFAULT_MAX_ATTEMPTS)
    }
}

impl CodeGenerator {
    pub fn new(length: usize, max_attempts: usize) -> Self {
        Self {
            length: length.clamp(1, MAX_CODE_LENGTH),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn generate(&self) -> String {
        generate_code_with(&mut rand::thread_rng(), self.length)
    }

    /// Draws codes until one is not `taken`, giving up after the configured
    /// number of attempts.
    pub fn generate_unique<F>(&self, taken: F) -> Result<String, UniclipError>
    where
        F: Fn(&str) -> bool,
    {
        let mut rng = rand::thread_rng();
        for _ in 0..self.max_attempts {
            let code = generate_code_with(&mut rng, self.length);
            if !taken(&code) {
                return Ok(code);
            }
        }
        Err(UniclipError::CodeSpaceExhausted(self.max_attempts))
    }
}
