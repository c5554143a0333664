/// Characters that end a sentence.
const SENTENCE_ENDINGS: &[char] = &['.', '!', '?'];

/// Byte range into the text being chunked.
type Span = (usize, usize);

/// Pack text into chunks of at most `max_chars` characters.
///
/// Text that already fits is returned unchanged. Otherwise whole sentences are
/// packed while they fit, longer sentences are split on whitespace, and single
/// words longer than the limit are cut. Spacing inside a chunk is kept as written.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.trim().is_empty() {
        return Vec::new();
    }
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut units = Vec::new();
    for sentence in sentence_spans(text) {
        if char_len(text, sentence) <= max_chars {
            units.push(sentence);
            continue;
        }
        for word in word_spans(text, sentence) {
            if char_len(text, word) <= max_chars {
                units.push(word);
            } else {
                units.extend(hard_split(text, word, max_chars));
            }
        }
    }

    let mut chunks = Vec::new();
    let mut current: Option<Span> = None;
    for (start, end) in units {
        current = match current {
            Some((chunk_start, _)) if char_len(text, (chunk_start, end)) <= max_chars => {
                Some((chunk_start, end))
            }
            Some((s, e)) => {
                chunks.push(text[s..e].to_string());
                Some((start, end))
            }
            None => Some((start, end)),
        };
    }
    if let Some((s, e)) = current {
        chunks.push(text[s..e].to_string());
    }
    chunks
}

fn char_len(text: &str, (start, end): Span) -> usize {
    text[start..end].chars().count()
}

/// Trimmed sentence spans. A sentence ends at `.`, `!` or `?` followed by
/// whitespace or the end of the text.
fn sentence_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let at_boundary = SENTENCE_ENDINGS.contains(&c)
            && chars.peek().map_or(true, |(_, next)| next.is_whitespace());
        if at_boundary {
            let end = i + c.len_utf8();
            push_trimmed(text, (start, end), &mut spans);
            start = end;
        }
    }
    push_trimmed(text, (start, text.len()), &mut spans);
    spans
}

fn push_trimmed(text: &str, (start, end): Span, spans: &mut Vec<Span>) {
    let slice = &text[start..end];
    let without_leading = slice.trim_start();
    let trimmed_start = start + (slice.len() - without_leading.len());
    let trimmed = without_leading.trim_end();
    if !trimmed.is_empty() {
        spans.push((trimmed_start, trimmed_start + trimmed.len()));
    }
}

fn word_spans(text: &str, (start, end): Span) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut word_start = None;
    for (i, c) in text[start..end].char_indices() {
        match (c.is_whitespace(), word_start) {
            (true, Some(ws)) => {
                spans.push((start + ws, start + i));
                word_start = None;
            }
            (false, None) => word_start = Some(i),
            _ => {}
        }
    }
    if let Some(ws) = word_start {
        spans.push((start + ws, end));
    }
    spans
}

fn hard_split(text: &str, (start, end): Span, max_chars: usize) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut piece_start = start;
    let mut count = 0;
    for (i, _) in text[start..end].char_indices() {
        if count == max_chars {
            spans.push((piece_start, start + i));
            piece_start = start + i;
            count = 0;
        }
        count += 1;
    }
    spans.push((piece_start, end));
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_sentences(text: &str) -> Vec<&str> {
        sentence_spans(text).into_iter().map(|(s, e)| &text[s..e]).collect()
    }

    #[test]
    fn splits_sentences_keeping_punctuation() {
        assert_eq!(
            split_sentences("One. Two! Three? four"),
            vec!["One.", "Two!", "Three?", "four"]
        );
        assert_eq!(split_sentences("Wait... what"), vec!["Wait...", "what"]);
        assert_eq!(split_sentences("Pi is 3.14 today."), vec!["Pi is 3.14 today."]);
    }

    #[test]
    fn fitting_text_is_left_untouched() {
        let text = "Pi is 3.14 today. Wait... what";
        assert_eq!(chunk_text(text, 100), vec![text]);
        assert_eq!(chunk_text("a  b.\tc", 100), vec!["a  b.\tc"]);
    }

    #[test]
    fn decimals_and_ellipses_survive_chunking() {
        let chunks = chunk_text("Pi is 3.14.  Then more... done.", 16);
        assert_eq!(chunks, vec!["Pi is 3.14.", "Then more...", "done."]);
    }

    #[test]
    fn spacing_inside_a_chunk_is_kept() {
        let chunks = chunk_text("Keep  two  spaces. Next one here.", 20);
        assert_eq!(chunks, vec!["Keep  two  spaces.", "Next one here."]);
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        assert_eq!(chunk_text("Hello there. How are you?", 100), vec!["Hello there. How are you?"]);
    }

    #[test]
    fn chunks_never_exceed_limit() {
        let text = "This is a sentence that goes on for quite a while without stopping at all. \
                    Then another one follows it! And a third, shorter one? "
            .repeat(5);
        let chunks = chunk_text(&text, 40);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 40, "chunk too long: {chunk:?}");
            assert!(!chunk.is_empty());
        }
    }

    #[test]
    fn overlong_words_are_cut() {
        let word = "a".repeat(25);
        let chunks = chunk_text(&word, 10);
        assert_eq!(chunks, vec!["a".repeat(10), "a".repeat(10), "a".repeat(5)]);
    }

    #[test]
    fn chunking_preserves_words_in_order() {
        let text = "alpha beta gamma. delta epsilon zeta eta theta iota kappa.";
        let chunks = chunk_text(text, 16);
        let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.split_whitespace()).collect();
        let original: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(chunk_text("", 100).is_empty());
        assert!(chunk_text("   ", 100).is_empty());
    }
}
