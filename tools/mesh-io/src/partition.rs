//! Partition file format encoder.
//!
//! A partition file starts with the four bytes `MePe`, followed by the number
//! of elements and by the part id of each element, all as little-endian
//! 64-bit unsigned integers.

use std::io;

/// Wrapping `w` in a [`std::io::BufWriter`] is recommended.
pub fn write<I, W>(mut w: W, array: I) -> io::Result<()>
where
    I: IntoIterator<Item = usize>,
    I::IntoIter: ExactSizeIterator,
    W: io::Write,
{
    let array = array.into_iter();

    w.write_all(b"MePe")?;
    w.write_all(&u64::to_le_bytes(array.len() as u64))?;

    for id in array {
        w.write_all(&u64::to_le_bytes(id as u64))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        let mut buf = Vec::new();
        write(&mut buf, vec![0, 3]).unwrap();
        assert_eq!(buf.len(), 4 + 3 * 8);
        assert_eq!(&buf[..4], b"MePe");
        assert_eq!(&buf[4..12], &2u64.to_le_bytes());
        assert_eq!(&buf[12..20], &0u64.to_le_bytes());
        assert_eq!(&buf[20..], &3u64.to_le_bytes());
    }

    #[test]
    fn empty_partition() {
        let mut buf = Vec::new();
        write(&mut buf, Vec::new()).unwrap();
        assert_eq!(&buf[..4], b"MePe");
        assert_eq!(&buf[4..], &0u64.to_le_bytes());
    }
}
