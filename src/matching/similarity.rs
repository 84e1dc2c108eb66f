//! Token-sort string similarity.
//!
//! Both strings are lower-cased, split into alphanumeric tokens, sorted and
//! re-joined, then compared with the Indel ratio `2 * LCS / (|a| + |b|)`
//! over characters. "Corp Acme" and "acme corp" score 100; a name that is a
//! prefix of a longer one keeps partial credit ("Acme Corp" vs
//! "Acme Corporation" is 72).

/// Lower-case, tokenize on non-alphanumerics, sort, and re-join with single spaces.
pub fn token_sort_key(s: &str) -> String {
    let lowered = s.to_lowercase();
    let mut tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Length of the longest common subsequence, one DP row at a time.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                row[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}

/// Indel similarity of two strings in `0.0..=1.0`.
fn indel_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }
    (2 * lcs_len(&a, &b)) as f64 / total as f64
}

/// Word-order-insensitive similarity in `0..=100`.
///
/// An empty side (after tokenization) scores 0: no text is no evidence.
pub fn token_sort_ratio(a: &str, b: &str) -> u32 {
    let a = token_sort_key(a);
    let b = token_sort_key(b);
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    (indel_ratio(&a, &b) * 100.0).round().clamp(0.0, 100.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_sort_key() {
        assert_eq!(token_sort_key("Weekly Sync — Acme"), "acme sync weekly");
        assert_eq!(token_sort_key("  "), "");
    }

    #[test]
    fn test_identical_after_reordering() {
        assert_eq!(token_sort_ratio("Corp Acme", "acme corp"), 100);
    }

    #[test]
    fn test_empty_scores_zero() {
        assert_eq!(token_sort_ratio("", "acme"), 0);
        assert_eq!(token_sort_ratio("", ""), 0);
        assert_eq!(token_sort_ratio("!!", "acme"), 0);
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            ("Acme Corp", "Acme Sync"),
            ("jane doe", "Jane A. Doe"),
            ("Globex Quarterly Review", "globex"),
            ("x", "a much longer string entirely"),
        ];
        for (a, b) in pairs {
            assert_eq!(token_sort_ratio(a, b), token_sort_ratio(b, a), "{a} / {b}");
        }
    }

    #[test]
    fn test_dissimilar_scores_low() {
        assert!(token_sort_ratio("Acme Corp", "Initech") < 60);
    }

    #[test]
    fn test_close_names_score_high() {
        assert!(token_sort_ratio("jon smith", "John Smith") >= 80);
    }

    #[test]
    fn test_shorter_name_keeps_partial_credit() {
        assert_eq!(token_sort_ratio("Acme Corp", "Acme Corporation"), 72);
        assert_eq!(token_sort_ratio("jane", "Jane Doe"), 67);
        assert_eq!(token_sort_ratio("Acme Corp", "Acme Corp Labs"), 78);
    }

    #[test]
    fn test_lcs_len() {
        let chars = |s: &str| s.chars().collect::<Vec<_>>();
        assert_eq!(lcs_len(&chars("acme corp"), &chars("acme corporation")), 9);
        assert_eq!(lcs_len(&chars("abc"), &chars("xyz")), 0);
        assert_eq!(lcs_len(&chars(""), &chars("abc")), 0);
    }
}
