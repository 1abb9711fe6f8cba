//! content-shroud: build-time content obfuscation for static sites
//!
//! A tool that encrypts marked sections of HTML so that:
//! - Content is unreadable when opening files directly
//! - The runtime ContentDecoder reveals it after the access check passes
//!
//! ## How it works
//!
//! 1. **Scan**: Find sections marked with `class="encode-content"` or
//!    `<!-- ENCODE-START -->` / `<!-- ENCODE-END -->` comments
//! 2. **Salt**: Generate a fresh random salt per section
//! 3. **Cipher**: XOR the section text against a key-stream derived from
//!    the master secret and the salt
//! 4. **Embed**: Replace each section with a protected block carrying the
//!    base64 payload, and inject the decoder script reference

pub mod cipher;
pub mod codec;
pub mod rewriter;
pub mod scanner;

pub use codec::DecodeError;
pub use scanner::Section;
