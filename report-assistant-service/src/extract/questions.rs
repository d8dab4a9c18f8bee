use regex::Regex;
use std::sync::LazyLock;

/// Upper bound on extracted questions when the caller has no opinion.
pub const DEFAULT_MAX_QUESTIONS: usize = 10;

/// Marker conventions that start a question line, in priority order.
/// The order matters: patterns overlap (`Q:` vs `Q1.`), and the first
/// matching rule wins for each line.
static MARKER_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Q: / Ｑ： forms
        r"^[QＱ][:：]\s*",
        // Q1 / Ｑ１ with optional trailing punctuation
        r"^[QＱ][0-9０-９]+[.．:：)）]?\s*",
        // 問1 with optional trailing punctuation
        r"^問[0-9０-９]+[.．:：)）]?\s*",
        // 【問1】
        r"^【問[0-9０-９]+】\s*",
        // 問題:
        r"^問題[:：]\s*",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("Invalid marker pattern"))
    .collect()
});

/// Scan document text for question-marker lines and return the marked
/// questions in document order, deduplicated (first occurrence wins),
/// capped at `max_q`.
///
/// Pure and deterministic: the same text always yields the same sequence,
/// no entry is empty after trimming, and malformed input at worst yields
/// an empty list. Half-width and full-width digits and punctuation are
/// both recognized; the corpus mixes them freely.
pub fn extract_questions(text: &str, max_q: usize) -> Vec<String> {
    let mut questions: Vec<String> = Vec::new();

    for line in text.lines() {
        if questions.len() >= max_q {
            break;
        }
        let line = line.trim();
        let Some(matched) = MARKER_RULES.iter().find_map(|rule| rule.find(line)) else {
            continue;
        };
        let question = line[matched.end()..].trim();
        if question.is_empty() {
            continue;
        }
        if !questions.iter().any(|q| q == question) {
            questions.push(question.to_string());
        }
    }

    questions
}

/// Clean one line of LLM-generated question output: strip list bullets and
/// leftover `Q1`-style numbering the model was told not to add but
/// sometimes adds anyway.
pub fn clean_generated_line(line: &str) -> String {
    let line = line
        .trim()
        .trim_matches(|c| matches!(c, '・' | '-' | '‐' | '*' | '●' | '\t' | ' ' | '　'))
        .trim();

    let mut cleaned = line;
    for prefix in ["Q1", "Q2", "Q3", "Q4", "１", "２", "３"] {
        if let Some(rest) = cleaned.strip_prefix(prefix) {
            cleaned = rest
                .trim_start_matches(|c| matches!(c, '.' | '．' | ':' | '：' | ')' | '）' | '」' | ' ' | '　'));
            break;
        }
    }

    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_q_number_markers_in_order() {
        let text = "Q1. What did you learn?\nsome prose\nQ2: How will you apply it?";
        let questions = extract_questions(text, DEFAULT_MAX_QUESTIONS);
        assert_eq!(
            questions,
            vec![
                "What did you learn?".to_string(),
                "How will you apply it?".to_string()
            ]
        );
    }

    #[test]
    fn extracts_mon_number_markers_without_the_marker() {
        let text = "問1 感想は？\n問2 学びは？";
        let questions = extract_questions(text, DEFAULT_MAX_QUESTIONS);
        assert_eq!(questions, vec!["感想は？".to_string(), "学びは？".to_string()]);
    }

    #[test]
    fn recognizes_all_marker_families() {
        let text = "Q: 最初の問い\nＱ２． 二番目の問い\n問３） 三番目の問い\n【問4】四番目の問い\n問題: 五番目の問い";
        let questions = extract_questions(text, DEFAULT_MAX_QUESTIONS);
        assert_eq!(
            questions,
            vec![
                "最初の問い".to_string(),
                "二番目の問い".to_string(),
                "三番目の問い".to_string(),
                "四番目の問い".to_string(),
                "五番目の問い".to_string(),
            ]
        );
    }

    #[test]
    fn deduplicates_first_occurrence_wins() {
        let text = "Q1. 感想は？\nQ2. 学びは？\nQ3. 感想は？";
        let questions = extract_questions(text, DEFAULT_MAX_QUESTIONS);
        assert_eq!(questions, vec!["感想は？".to_string(), "学びは？".to_string()]);
    }

    #[test]
    fn respects_max_q() {
        let text = (1..=20)
            .map(|i| format!("Q{}. 問い{}", i, i))
            .collect::<Vec<_>>()
            .join("\n");
        let questions = extract_questions(&text, 3);
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[2], "問い3");
    }

    #[test]
    fn is_deterministic() {
        let text = "Q1. a\n問2 b\nnoise\n【問3】c";
        assert_eq!(
            extract_questions(text, DEFAULT_MAX_QUESTIONS),
            extract_questions(text, DEFAULT_MAX_QUESTIONS)
        );
    }

    #[test]
    fn marker_only_lines_and_markerless_text_yield_nothing() {
        assert!(extract_questions("", DEFAULT_MAX_QUESTIONS).is_empty());
        assert!(extract_questions("Q1.\n問2：  \nただの文章です。", DEFAULT_MAX_QUESTIONS).is_empty());
    }

    #[test]
    fn trims_fullwidth_whitespace_from_remainders() {
        let questions = extract_questions("Q1.　感想は？　", DEFAULT_MAX_QUESTIONS);
        assert_eq!(questions, vec!["感想は？".to_string()]);
    }

    #[test]
    fn cleans_generated_bullet_lines() {
        assert_eq!(clean_generated_line("- 今日の学びは？"), "今日の学びは？");
        assert_eq!(clean_generated_line("・ 感想を教えてください"), "感想を教えてください");
        assert_eq!(clean_generated_line("Q1. 何を学びましたか"), "何を学びましたか");
        assert_eq!(clean_generated_line("１） 印象に残った点は？"), "印象に残った点は？");
        assert_eq!(clean_generated_line("   "), "");
    }
}
