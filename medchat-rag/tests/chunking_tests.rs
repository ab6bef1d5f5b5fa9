//! Property tests for passage coverage and overlap.

use medchat_rag::chunking::{Chunker, FixedSizeChunker};
use medchat_rag::document::Document;
use proptest::prelude::*;

/// Chunk parameters with `0 <= overlap < size`.
fn arb_params() -> impl Strategy<Value = (usize, usize)> {
    (1usize..64).prop_flat_map(|size| (Just(size), 0..size))
}

/// One to four pages, at least one of which has visible text.
fn arb_document() -> impl Strategy<Value = Document> {
    proptest::collection::vec("[a-zA-Z0-9 .,:é\n]{0,120}", 1..4)
        .prop_map(|pages| Document::new("report.pdf", pages))
        .prop_filter("document needs visible text", |d| !d.is_blank())
}

/// **Chunking coverage**
/// *For any* document and valid parameters, every character of the joined
/// text lies in at least one passage, passages are contiguous windows of the
/// joined text, and consecutive passages share exactly `chunk_overlap`
/// characters.
mod prop_chunking_coverage {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn passages_cover_every_character(
            document in arb_document(),
            (size, overlap) in arb_params(),
        ) {
            let chunker = FixedSizeChunker::new(size, overlap).unwrap();
            let passages = chunker.split(&document).unwrap();
            let chars: Vec<char> = document.full_text().chars().collect();

            prop_assert!(!passages.is_empty());
            prop_assert_eq!(passages[0].start, 0);
            prop_assert_eq!(passages.last().unwrap().end, chars.len());

            let mut covered = vec![false; chars.len()];
            for (i, passage) in passages.iter().enumerate() {
                prop_assert_eq!(passage.sequence, i);
                prop_assert!(passage.len() <= size);
                prop_assert!(!passage.is_empty());
                let expected: String = chars[passage.start..passage.end].iter().collect();
                prop_assert_eq!(&passage.text, &expected);
                for flag in &mut covered[passage.start..passage.end] {
                    *flag = true;
                }
            }
            prop_assert!(covered.iter().all(|c| *c));

            for pair in passages.windows(2) {
                prop_assert_eq!(pair[0].len(), size, "only the last passage may be short");
                prop_assert_eq!(pair[0].end - pair[1].start, overlap);
            }
        }

        #[test]
        fn passage_page_contains_its_start(
            document in arb_document(),
            (size, overlap) in arb_params(),
        ) {
            let chunker = FixedSizeChunker::new(size, overlap).unwrap();
            let passages = chunker.split(&document).unwrap();

            let mut page_of_char = Vec::new();
            for (page, text) in document.pages.iter().enumerate() {
                page_of_char.extend(std::iter::repeat_n(page, text.chars().count() + 1));
            }
            for passage in &passages {
                prop_assert_eq!(passage.page, page_of_char[passage.start]);
            }
        }

        #[test]
        fn splitting_is_deterministic(
            document in arb_document(),
            (size, overlap) in arb_params(),
        ) {
            let chunker = FixedSizeChunker::new(size, overlap).unwrap();
            prop_assert_eq!(chunker.split(&document).unwrap(), chunker.split(&document).unwrap());
        }
    }
}

#[test]
fn three_page_report_with_default_parameters() {
    let pages: Vec<String> = (1..=3)
        .map(|n| format!("Page {n}. ").repeat(150))
        .collect();
    let document = Document::new("diagnostic-report.pdf", pages);
    let passages = FixedSizeChunker::new(1000, 20).unwrap().split(&document).unwrap();

    let total = document.char_count();
    let expected = (total - 20).div_ceil(980);
    assert_eq!(passages.len(), expected);
    assert_eq!(passages.last().unwrap().end, total);
}
