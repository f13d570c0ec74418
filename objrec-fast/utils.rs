//! Bit helpers for the 16-pixel FAST circle

/// True if `mask` holds a circular run of at least `min_count` set bits
pub fn has_contiguous_arc(mask: u16, min_count: usize) -> bool {
    if min_count == 0 || min_count > 16 {
        return false;
    }
    if mask == u16::MAX {
        return true;
    }

    // AND the mask with its rotations; a surviving bit starts a long enough run
    let mut runs = mask;
    for i in 1..min_count as u32 {
        runs &= mask.rotate_right(i);
        if runs == 0 {
            return false;
        }
    }

    runs != 0
}
