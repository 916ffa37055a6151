//! Flat word-addressed data memory.

use crate::core::sched::traits::DataMemory;

/// Power-of-two sized array of 64-bit words. Addresses wrap modulo the size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatMemory {
    words: Vec<u64>,
}

impl FlatMemory {
    /// Creates a zeroed memory of `words` words.
    pub fn new(words: usize) -> Self {
        Self {
            words: vec![0; words.max(1)],
        }
    }

    /// Creates a memory of `words` words preloaded with `init` from address 0.
    pub fn with_contents(words: usize, init: &[u64]) -> Self {
        let mut mem = Self::new(words);
        for (addr, v) in init.iter().enumerate() {
            mem.write(addr as u64, *v);
        }
        mem
    }

    fn index(&self, addr: u64) -> usize {
        (addr as usize) % self.words.len()
    }

    /// All words.
    pub fn words(&self) -> &[u64] {
        &self.words
    }
}

impl DataMemory for FlatMemory {
    fn read(&self, addr: u64) -> u64 {
        self.words[self.index(addr)]
    }

    fn write(&mut self, addr: u64, value: u64) {
        let i = self.index(addr);
        self.words[i] = value;
    }
}
