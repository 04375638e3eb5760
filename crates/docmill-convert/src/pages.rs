//! Page-range expressions.

use docmill_core::AppError;
use docmill_core::AppResult;

/// Parse a 1-based range expression like `"1-3,5,7-10"` against a page
/// count.
///
/// Returns inclusive `(start, end)` pairs in the order written. Malformed
/// pieces, page zero, reversed ranges, and pages beyond `total` are all
/// validation errors.
pub fn parse_ranges(expr: &str, total: u32) -> AppResult<Vec<(u32, u32)>> {
    let mut ranges = Vec::new();
    for piece in expr.split(',') {
        let piece = piece.trim();
        if piece.is_empty() {
            return Err(AppError::validation(format!("Empty range in \"{expr}\"")));
        }
        let (start, end) = match piece.split_once('-') {
            Some((a, b)) => (parse_page(a, expr)?, parse_page(b, expr)?),
            None => {
                let page = parse_page(piece, expr)?;
                (page, page)
            }
        };
        if start > end {
            return Err(AppError::validation(format!("Range {start}-{end} is reversed")));
        }
        if end > total {
            return Err(AppError::validation(format!(
                "Page {end} is out of bounds (document has {total} pages)"
            )));
        }
        ranges.push((start, end));
    }
    Ok(ranges)
}

/// Chunk `1..=total` into consecutive ranges of `every` pages, the last
/// one possibly shorter.
pub fn chunks(total: u32, every: u32) -> Vec<(u32, u32)> {
    let mut out = Vec::new();
    let mut start = 1;
    while start <= total {
        let end = (start + every - 1).min(total);
        out.push((start, end));
        start = end + 1;
    }
    out
}

fn parse_page(raw: &str, expr: &str) -> AppResult<u32> {
    let raw = raw.trim();
    let page: u32 = raw.parse().map_err(|_| {
        AppError::validation(format!("Invalid page number \"{raw}\" in \"{expr}\""))
    })?;
    if page == 0 {
        return Err(AppError::validation("Page numbers are 1-based"));
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmill_core::error::ErrorKind;

    #[test]
    fn parses_mixed_expression() {
        let ranges = parse_ranges("1-3,5,7-10", 12).unwrap();
        assert_eq!(ranges, vec![(1, 3), (5, 5), (7, 10)]);
    }

    #[test]
    fn tolerates_whitespace() {
        let ranges = parse_ranges(" 2 - 4 , 6 ", 10).unwrap();
        assert_eq!(ranges, vec![(2, 4), (6, 6)]);
    }

    #[test]
    fn rejects_reversed_range() {
        let err = parse_ranges("5-2", 10).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn rejects_page_zero() {
        assert!(parse_ranges("0-3", 10).is_err());
    }

    #[test]
    fn rejects_out_of_bounds() {
        let err = parse_ranges("1-99", 10).unwrap_err();
        assert!(err.message.contains("out of bounds"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_ranges("abc", 10).is_err());
        assert!(parse_ranges("1,,3", 10).is_err());
    }

    #[test]
    fn chunks_cover_every_page() {
        assert_eq!(chunks(7, 3), vec![(1, 3), (4, 6), (7, 7)]);
        assert_eq!(chunks(4, 2), vec![(1, 2), (3, 4)]);
        assert_eq!(chunks(3, 10), vec![(1, 3)]);
    }
}
