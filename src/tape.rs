//! Unbounded, zero-initialized byte tape.
//!
//! The tape is split into fixed-size blocks that are allocated lazily as the
//! data pointer wanders past the cells allocated so far. Blocks are kept in a
//! `VecDeque`, so growing to the left is as cheap as growing to the right and
//! no previously written cell is ever moved or lost.
//!
//! Addresses are signed and the pointer starts at address 0, which sits in the
//! middle of the origin block. Reading an address that was never allocated
//! yields 0 without allocating anything.

use std::collections::VecDeque;
use std::fmt;

/// Number of cells held by one block.
pub const BLOCK_SIZE: usize = 1024;

// Address 0 lives in the middle of block 0 so small moves in either direction
// stay inside the origin block.
const ORIGIN_OFFSET: isize = (BLOCK_SIZE / 2) as isize;

type Block = Box<[u8; BLOCK_SIZE]>;

fn new_block() -> Block {
    Box::new([0; BLOCK_SIZE])
}

/// Split an absolute address into (block number, index inside the block).
/// Block numbers are relative to the origin block and may be negative.
/// Never overflows, even for `isize::MIN` and `isize::MAX`.
fn locate(address: isize) -> (isize, usize) {
    let size = BLOCK_SIZE as isize;
    let shifted = address.rem_euclid(size) + ORIGIN_OFFSET;
    (address.div_euclid(size) + shifted / size, (shifted % size) as usize)
}

/// A growable, bidirectional tape of byte cells with a single data pointer.
#[derive(Clone)]
pub struct Tape {
    blocks: VecDeque<Block>,
    // Block number of `blocks[0]`.
    first: isize,
    pointer: isize,
    // Index into `blocks` of the block holding the pointer.
    current: usize,
}

impl Tape {
    /// Create a tape with a single zeroed block and the pointer at address 0.
    pub fn new() -> Self {
        Self {
            blocks: VecDeque::from([new_block()]),
            first: 0,
            pointer: 0,
            current: 0,
        }
    }

    /// Absolute address of the data pointer.
    pub fn pointer(&self) -> isize {
        self.pointer
    }

    /// Number of blocks allocated so far.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Byte at `pointer + offset`; 0 when that cell was never allocated or
    /// the address is not representable.
    pub fn read(&self, offset: isize) -> u8 {
        self.pointer.checked_add(offset).map_or(0, |address| self.read_at(address))
    }

    /// Byte at an absolute address; 0 when that cell was never allocated.
    pub fn read_at(&self, address: isize) -> u8 {
        let (block, index) = locate(address);
        match block.checked_sub(self.first) {
            Some(slot) if slot >= 0 => self.blocks.get(slot as usize).map_or(0, |b| b[index]),
            _ => 0,
        }
    }

    /// `len` consecutive bytes starting at `pointer + offset`. Cells past
    /// the end of the address space read as 0.
    pub fn peek(&self, offset: isize, len: usize) -> Vec<u8> {
        (0..len)
            .map(|i| {
                isize::try_from(i)
                    .ok()
                    .and_then(|i| offset.checked_add(i))
                    .map_or(0, |offset| self.read(offset))
            })
            .collect()
    }

    /// Byte under the pointer.
    pub fn current(&self) -> u8 {
        let (_, index) = locate(self.pointer);
        self.blocks[self.current][index]
    }

    fn cell_mut(&mut self) -> &mut u8 {
        let (_, index) = locate(self.pointer);
        &mut self.blocks[self.current][index]
    }

    /// Overwrite the byte under the pointer.
    pub fn write(&mut self, value: u8) {
        *self.cell_mut() = value;
    }

    /// Add `count` to the byte under the pointer, wrapping modulo 256.
    pub fn increment(&mut self, count: usize) {
        let cell = self.cell_mut();
        *cell = cell.wrapping_add((count % 256) as u8);
    }

    /// Subtract `count` from the byte under the pointer, wrapping modulo 256.
    pub fn decrement(&mut self, count: usize) {
        let cell = self.cell_mut();
        *cell = cell.wrapping_sub((count % 256) as u8);
    }

    /// Shift the pointer by `delta` cells, allocating zeroed blocks for every
    /// block the pointer crosses into. Returns the number of the block that
    /// now holds the pointer.
    pub fn move_pointer(&mut self, delta: isize) -> isize {
        self.pointer += delta;
        let (block, _) = locate(self.pointer);

        while block < self.first {
            self.blocks.push_front(new_block());
            self.first -= 1;
        }
        while block >= self.first + self.blocks.len() as isize {
            self.blocks.push_back(new_block());
        }

        self.current = (block - self.first) as usize;
        block
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tape")
            .field("pointer", &self.pointer)
            .field("first_block", &self.first)
            .field("blocks", &self.blocks.len())
            .finish()
    }
}
