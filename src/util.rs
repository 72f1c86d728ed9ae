/// Alignment of every owned pixel buffer, wide enough for AVX-512 loads
pub const SIMD_ALIGNMENT: usize = 64;

/// Zero initialized byte buffer whose first byte is aligned to [`SIMD_ALIGNMENT`]
///
/// Over-allocates by up to `SIMD_ALIGNMENT - 1` bytes and skips the unaligned head. Moving the
/// buffer never moves the heap allocation, so the alignment holds for its whole lifetime.
pub(crate) struct AlignedBuf {
    storage: Vec<u8>,
    offset: usize,
    len: usize,
}

/// The allocator refused to hand out `bytes` bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AllocFailed {
    pub(crate) bytes: usize,
}

impl AlignedBuf {
    pub(crate) fn zeroed(len: usize) -> Result<Self, AllocFailed> {
        let capacity = len
            .checked_add(SIMD_ALIGNMENT - 1)
            .ok_or(AllocFailed { bytes: len })?;

        let mut storage = Vec::new();
        storage
            .try_reserve_exact(capacity)
            .map_err(|_| AllocFailed { bytes: len })?;
        storage.resize(capacity, 0);

        // align_offset is allowed to give up, the buffer is still usable unaligned then
        let offset = match storage.as_ptr().align_offset(SIMD_ALIGNMENT) {
            offset if offset < SIMD_ALIGNMENT => offset,
            _ => 0,
        };

        Ok(Self {
            storage,
            offset,
            len,
        })
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.storage[self.offset..self.offset + self.len]
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.storage[self.offset..self.offset + self.len]
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

impl std::fmt::Debug for AlignedBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBuf")
            .field("len", &self.len)
            .field("offset", &self.offset)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_and_zeroed() {
        for len in [1, 7, 64, 1000] {
            let buf = AlignedBuf::zeroed(len).unwrap();

            assert_eq!(buf.len(), len);
            assert_eq!(buf.as_slice().as_ptr() as usize % SIMD_ALIGNMENT, 0);
            assert!(buf.as_slice().iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn alignment_survives_move() {
        let buf = AlignedBuf::zeroed(100).unwrap();
        let ptr = buf.as_slice().as_ptr();

        let moved = vec![buf];

        assert_eq!(moved[0].as_slice().as_ptr(), ptr);
    }

    #[test]
    fn overflowing_len_fails() {
        assert_eq!(
            AlignedBuf::zeroed(usize::MAX).unwrap_err(),
            AllocFailed { bytes: usize::MAX }
        );
    }
}
