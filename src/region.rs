/// A resolved channel sub-range over `[0, n)`.
///
/// When `inverted` is false the affected channels are the half-open range
/// `[begin, end)`; when true they are its complement `[0, begin) ∪ [end, n)`
/// (the captured middle segment is the part left untouched).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelRegion {
    pub begin: usize,
    pub end: usize,
    pub inverted: bool,
}

/// Converts a `(width, offset)` ratio pair into a concrete channel region
/// over `n` channels.
///
/// A negative width folds its sign into the offset, so the region grows
/// toward lower channels instead. The offset wraps into `[0, 1)`; if the
/// region then runs past the end of the channel range it wraps around,
/// which is expressed as the inverted complement of the middle segment.
///
/// Fractional boundaries round half away from zero.
pub fn ratio_to_region(width: f64, offset: f64, n: usize) -> ChannelRegion {
    let mut width = width;
    let mut offset = offset;

    if width < 0.0 {
        offset += width;
        width = -width;
    }
    width = width.min(1.0);

    if offset < 0.0 {
        offset = 1.0 + offset - offset.floor();
    }
    offset %= 1.0;

    let n = n as f64;
    if width + offset <= 1.0 {
        ChannelRegion {
            begin: (offset * n).round() as usize,
            end: ((width + offset) * n).round() as usize,
            inverted: false,
        }
    } else {
        ChannelRegion {
            begin: ((width + offset - 1.0) * n).round() as usize,
            end: (offset * n).round() as usize,
            inverted: true,
        }
    }
}
