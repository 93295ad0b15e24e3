use thiserror::Error;

/// How far back from the cut point to look for a whitespace boundary
/// when hard-splitting an oversized sentence.
const HARD_SPLIT_LOOKBACK: usize = 24;

#[derive(Debug, Error)]
#[error("max_chars must be greater than zero")]
pub struct InvalidChunkSize;

/// Split text into sentence-oriented chunks of up to `max_chars` characters.
///
/// Whitespace runs are collapsed to single spaces before splitting, so
/// joining the returned chunks with single spaces reproduces the
/// normalized input (as long as no single word exceeds `max_chars`).
pub fn split_transcript(text: &str, max_chars: usize) -> Result<Vec<String>, InvalidChunkSize> {
    if max_chars == 0 {
        return Err(InvalidChunkSize);
    }

    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        return Ok(Vec::new());
    }
    if cleaned.chars().count() <= max_chars {
        // Fast path: the full text already fits in one chunk.
        return Ok(vec![cleaned]);
    }

    // First pass: split into sentence-like spans at terminal punctuation
    // followed by whitespace.
    let sentences = split_sentences(&cleaned);

    // Second pass: pack sentences into size-limited chunks.
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;
    for sentence in sentences {
        let sentence_chars = sentence.chars().count();
        let pending_chars = if current.is_empty() {
            sentence_chars
        } else {
            current_chars + 1 + sentence_chars
        };
        if pending_chars <= max_chars {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&sentence);
            current_chars = pending_chars;
        } else {
            // Current chunk is full; emit it and start a new one.
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            if sentence_chars <= max_chars {
                current = sentence;
                current_chars = sentence_chars;
            } else {
                // Sentence itself is too long; hard-split it by length.
                hard_split_into(&sentence, max_chars, &mut chunks);
            }
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    Ok(chunks)
}

/// Split normalized text at `.`/`!`/`?` followed by whitespace (or end of
/// input). Text with no such boundary comes back as one sentence.
fn split_sentences(cleaned: &str) -> Vec<String> {
    let mut sentences: Vec<String> = Vec::new();
    let mut start = 0usize;
    let mut iter = cleaned.char_indices().peekable();
    while let Some((idx, ch)) = iter.next() {
        if matches!(ch, '.' | '!' | '?') {
            let at_boundary = iter
                .peek()
                .map_or(true, |&(_, next)| next.is_whitespace());
            if at_boundary {
                let end = idx + ch.len_utf8();
                let sentence = cleaned[start..end].trim_start();
                if !sentence.is_empty() {
                    sentences.push(sentence.to_string());
                }
                start = end;
            }
        }
    }
    let tail = cleaned[start..].trim_start();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

/// Cut an oversized sentence into pieces of at most `max_chars` characters,
/// preferring a whitespace boundary within the lookback window, else an
/// exact character cut.
fn hard_split_into(sentence: &str, max_chars: usize, out: &mut Vec<String>) {
    let chars: Vec<char> = sentence.chars().collect();
    let mut start = 0usize;
    while chars.len() - start > max_chars {
        let limit = start + max_chars;
        let floor = limit.saturating_sub(HARD_SPLIT_LOOKBACK).max(start + 1);
        let space = (floor..=limit).rev().find(|&i| chars[i] == ' ');
        match space {
            Some(i) => {
                out.push(chars[start..i].iter().collect());
                start = i + 1;
            }
            None => {
                out.push(chars[start..limit].iter().collect());
                start = limit;
            }
        }
    }
    if start < chars.len() {
        out.push(chars[start..].iter().collect());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(split_transcript("", 100).unwrap().is_empty());
        assert!(split_transcript("   \n\t  ", 100).unwrap().is_empty());
    }

    #[test]
    fn zero_max_chars_is_rejected() {
        assert!(split_transcript("hello", 0).is_err());
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = split_transcript("Hello   world.\nNext  line.", 100).unwrap();
        assert_eq!(chunks, vec!["Hello world. Next line.".to_string()]);
    }

    #[test]
    fn chunks_respect_max_chars_and_reassemble() {
        let text = "Sentence one is here. Sentence two follows! Does sentence three ask? \
                    Sentence four ends it.";
        let chunks = split_transcript(text, 30).unwrap();
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 30, "chunk too long: {chunk:?}");
            assert!(!chunk.is_empty());
        }
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        assert_eq!(chunks.join(" "), normalized);
    }

    #[test]
    fn no_boundary_inside_decimal_numbers() {
        let chunks = split_transcript("Pi is 3.14159 roughly. The end.", 22).unwrap();
        assert_eq!(
            chunks,
            vec!["Pi is 3.14159 roughly.".to_string(), "The end.".to_string()]
        );
    }

    #[test]
    fn packs_1820_chars_into_minimal_chunks_of_900() {
        // 19 sentences of 90 chars plus one of 91, joined by 19 spaces: 1820 chars.
        let mut sentences: Vec<String> = (0..20)
            .map(|i| format!("{}{}.", (b'a' + i as u8) as char, "x".repeat(88)))
            .collect();
        sentences[19] = format!("t{}.", "x".repeat(89));
        let text = sentences.join(" ");
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        assert_eq!(normalized.chars().count(), 1820);

        let chunks = split_transcript(&text, 900).unwrap();
        assert_eq!(chunks.len(), 3);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 900);
            // No chunk boundary falls mid-sentence.
            assert!(chunk.ends_with('.'));
        }
        assert_eq!(chunks.join(" "), normalized);
    }

    #[test]
    fn oversized_sentence_prefers_whitespace_cut() {
        let text = "one two three four five six seven eight nine ten";
        let chunks = split_transcript(text, 20).unwrap();
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 20);
            assert!(!chunk.starts_with(' ') && !chunk.ends_with(' '));
        }
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn unbroken_run_is_cut_exactly() {
        let text = "a".repeat(25);
        let chunks = split_transcript(&text, 10).unwrap();
        assert_eq!(
            chunks,
            vec!["a".repeat(10), "a".repeat(10), "a".repeat(5)]
        );
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let text = "Zwölf Böcke jagen. Über die Hügel weit weg! Am Ende.";
        let chunks = split_transcript(text, 25).unwrap();
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 25);
        }
        assert_eq!(
            chunks.join(" "),
            text.split_whitespace().collect::<Vec<_>>().join(" ")
        );
    }
}
