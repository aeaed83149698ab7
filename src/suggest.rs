/// Suggestion helper for "did you mean …?" diagnostics.
/// Uses Levenshtein edit distance with deterministic ordering.

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let m = b.len();

    let mut prev = (0..=m).collect::<Vec<_>>();
    let mut curr = vec![0; m + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=m {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[m]
}

/// Best candidate for `input`, or `None` when nothing is close enough.
///
/// Threshold: `max(1, min(2, input.len() / 2))`. Exact matches are never suggested.
pub fn suggest<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let threshold = 1.max(2.min(input.len() / 2));

    let mut sorted = candidates.to_vec();
    sorted.sort();

    let mut best: Option<(usize, &'a str)> = None;
    for c in sorted {
        let d = levenshtein(input, c);
        if d == 0 || d > threshold {
            continue;
        }
        match best {
            Some((bd, _)) if d >= bd => {} // ties keep the lexicographically first
            _ => best = Some((d, c)),
        }
    }
    best.map(|(_, s)| s)
}
