use similar::{Algorithm, DiffOp, capture_diff_slices};

use crate::diff_file::{ChangeKind, DiffHunk, DiffLine, LineType, WordChange};

/// Splits a line into word tokens. Runs of alphanumerics and `_` form one
/// token; every other character, whitespace included, is a token of its own.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut word_start = None;

    for (i, ch) in text.char_indices() {
        if ch.is_alphanumeric() || ch == '_' {
            if word_start.is_none() {
                word_start = Some(i);
            }
        } else {
            if let Some(start) = word_start.take() {
                tokens.push(&text[start..i]);
            }
            tokens.push(&text[i..i + ch.len_utf8()]);
        }
    }
    if let Some(start) = word_start {
        tokens.push(&text[start..]);
    }

    tokens
}

/// Longest common subsequence of two token lists.
/// Returns, for each side, whether the token at that index is retained.
pub fn lcs_retained(old: &[&str], new: &[&str]) -> (Vec<bool>, Vec<bool>) {
    let mut old_kept = vec![false; old.len()];
    let mut new_kept = vec![false; new.len()];

    for op in capture_diff_slices(Algorithm::Lcs, old, new) {
        if let DiffOp::Equal {
            old_index,
            new_index,
            len,
        } = op
        {
            old_kept[old_index..old_index + len].fill(true);
            new_kept[new_index..new_index + len].fill(true);
        }
    }

    (old_kept, new_kept)
}

/// One span per token that is not retained, offsets taken in original order.
fn emit_spans(tokens: &[&str], kept: &[bool], kind: ChangeKind) -> Vec<WordChange> {
    let mut spans = Vec::new();
    let mut offset = 0;

    for (token, &is_kept) in tokens.iter().zip(kept) {
        if !is_kept {
            spans.push(WordChange {
                start: offset,
                len: token.len(),
                kind,
            });
        }
        offset += token.len();
    }

    spans
}

/// Computes the changed spans of a deleted line and its replacement.
pub fn word_changes(old_text: &str, new_text: &str) -> (Vec<WordChange>, Vec<WordChange>) {
    let old_tokens = tokenize(old_text);
    let new_tokens = tokenize(new_text);
    let (old_kept, new_kept) = lcs_retained(&old_tokens, &new_tokens);

    (
        emit_spans(&old_tokens, &old_kept, ChangeKind::Deletion),
        emit_spans(&new_tokens, &new_kept, ChangeKind::Addition),
    )
}

/// Fills `word_changes` on a deletion/addition pair. When `max_tokens` is set
/// and either side is longer, the pair stays a whole-line change.
pub fn align_pair(old: &mut DiffLine, new: &mut DiffLine, max_tokens: Option<usize>) {
    if let Some(cap) = max_tokens
        && (tokenize(&old.content).len() > cap || tokenize(&new.content).len() > cap)
    {
        return;
    }

    let (old_spans, new_spans) = word_changes(&old.content, &new.content);
    old.word_changes = old_spans;
    new.word_changes = new_spans;
}

/// Pairs each run of deletions with the run of additions right after it,
/// i-th with i-th, and aligns every pair. Unpaired lines are left alone.
pub fn align_hunk(hunk: &mut DiffHunk, max_tokens: Option<usize>) {
    let lines = &mut hunk.lines;
    let mut i = 0;

    while i < lines.len() {
        if lines[i].line_type != LineType::Deletion {
            i += 1;
            continue;
        }

        let del_start = i;
        while i < lines.len() && lines[i].line_type == LineType::Deletion {
            i += 1;
        }
        let add_start = i;
        while i < lines.len() && lines[i].line_type == LineType::Addition {
            i += 1;
        }

        let pairs = (add_start - del_start).min(i - add_start);
        for k in 0..pairs {
            let (before, after) = lines.split_at_mut(add_start);
            align_pair(&mut before[del_start + k], &mut after[k], max_tokens);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(changes: &[WordChange]) -> Vec<(usize, usize)> {
        changes.iter().map(|c| (c.start, c.len)).collect()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("let foo_bar = baz(1);"),
            vec!["let", " ", "foo_bar", " ", "=", " ", "baz", "(", "1", ")", ";"]
        );
        assert_eq!(tokenize("a  b"), vec!["a", " ", " ", "b"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_tokenize_unicode() {
        assert_eq!(tokenize("héllo→wörld"), vec!["héllo", "→", "wörld"]);
    }

    #[test]
    fn test_word_changes_single_word() {
        let (old, new) = word_changes("hello world", "hello there");
        assert_eq!(spans(&old), vec![(6, 5)]);
        assert_eq!(spans(&new), vec![(6, 5)]);
        assert!(old.iter().all(|c| c.kind == ChangeKind::Deletion));
        assert!(new.iter().all(|c| c.kind == ChangeKind::Addition));
    }

    #[test]
    fn test_word_changes_identical() {
        let (old, new) = word_changes("same line here", "same line here");
        assert!(old.is_empty());
        assert!(new.is_empty());
    }

    #[test]
    fn test_word_changes_nothing_shared() {
        let (old, new) = word_changes("abc", "x+y");
        assert_eq!(spans(&old), vec![(0, 3)]);
        assert_eq!(spans(&new), vec![(0, 1), (1, 1), (2, 1)]);
    }

    #[test]
    fn test_lcs_retained_keeps_longest_subsequence() {
        let old = tokenize("a b a b");
        let new = tokenize("b a b a c");
        let (old_kept, new_kept) = lcs_retained(&old, &new);
        assert_eq!(old_kept.iter().filter(|&&k| k).count(), 6);
        assert_eq!(new_kept.iter().filter(|&&k| k).count(), 6);

        let kept = |tokens: &[&str], flags: &[bool]| -> Vec<String> {
            tokens
                .iter()
                .zip(flags)
                .filter(|(_, k)| **k)
                .map(|(t, _)| t.to_string())
                .collect()
        };
        assert_eq!(kept(&old, &old_kept), kept(&new, &new_kept));

        let (old_kept, new_kept) =
            lcs_retained(&tokenize("let b = 2;"), &tokenize("let b = 3;"));
        assert_eq!(old_kept, vec![true, true, true, true, true, true, false, true]);
        assert_eq!(new_kept, old_kept);

        let (old_kept, new_kept) = lcs_retained(&[], &tokenize("x"));
        assert!(old_kept.is_empty());
        assert_eq!(new_kept, vec![false]);
    }

    #[test]
    fn test_word_changes_offsets_are_bytes() {
        let (old, new) = word_changes("é = 1", "é = 22");
        assert_eq!(spans(&old), vec![(5, 1)]);
        assert_eq!(spans(&new), vec![(5, 2)]);
        assert_eq!(&"é = 22"[new[0].range()], "22");
    }

    #[test]
    fn test_align_hunk_pairs_shorter_run() {
        let mut hunk = DiffHunk {
            lines: vec![
                DiffLine::new_removed("-one two", 1),
                DiffLine::new_removed("-three", 2),
                DiffLine::new_added("+one 2", 1),
                DiffLine::new_context(" keep", 3, 2),
                DiffLine::new_added("+lonely", 3),
            ],
            ..DiffHunk::default()
        };

        align_hunk(&mut hunk, None);

        assert_eq!(spans(&hunk.lines[0].word_changes), vec![(4, 3)]);
        assert_eq!(spans(&hunk.lines[2].word_changes), vec![(4, 1)]);
        assert!(hunk.lines[1].word_changes.is_empty());
        assert!(hunk.lines[4].word_changes.is_empty());
    }

    #[test]
    fn test_align_pair_respects_token_cap() {
        let mut old = DiffLine::new_removed("-a b c", 1);
        let mut new = DiffLine::new_added("+a b d", 1);
        align_pair(&mut old, &mut new, Some(3));
        assert!(old.word_changes.is_empty());
        assert!(new.word_changes.is_empty());

        align_pair(&mut old, &mut new, Some(5));
        assert_eq!(spans(&new.word_changes), vec![(4, 1)]);
    }
}
