//! Turning predicted labels into token edits

use crate::vocab::{VerbFormDictionary, DELETE, KEEP, PADDING, UNKNOWN};

const APPEND: &str = "$APPEND_";
const REPLACE: &str = "$REPLACE_";
const TRANSFORM: &str = "$TRANSFORM_";
const MERGE: &str = "$MERGE_";

/// One token edit against the source sentence.
///
/// Positions index the source tokens (without `$START`). `start == end`
/// inserts before `start`; `end == start + 1` acts on the token at `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub start: i64,
    pub end: i64,
    /// Empty for deletions, the bare word for appends and replacements,
    /// the full label for transforms and merges
    pub label: String,
    pub probability: f32,
}

/// Edit implied by `label` predicted at `index` of the `$START`-prefixed sequence
pub fn token_action(
    index: usize,
    label: &str,
    probability: f32,
    min_error_probability: f32,
) -> Option<Edit> {
    if probability < min_error_probability || matches!(label, KEEP | UNKNOWN | PADDING) {
        return None;
    }

    let index = index as i64;
    let (start, end) = if label == DELETE
        || label.starts_with(REPLACE)
        || label.starts_with(TRANSFORM)
    {
        (index, index + 1)
    } else if label.starts_with(APPEND) || label.starts_with(MERGE) {
        (index + 1, index + 1)
    } else {
        return None;
    };

    let cleared = if label == DELETE {
        String::new()
    } else if label.starts_with(TRANSFORM) || label.starts_with(MERGE) {
        label.to_string()
    } else {
        label
            .split_once('_')
            .map(|(_, word)| word.to_string())
            .unwrap_or_default()
    };

    Some(Edit {
        start: start - 1,
        end: end - 1,
        label: cleared,
        probability,
    })
}

/// Apply edits in order, shifting later positions as tokens come and go
pub fn apply_edits(source: &[String], edits: &[Edit], verbs: &VerbFormDictionary) -> Vec<String> {
    let mut target = source.to_vec();
    let mut shift: i64 = 0;

    for edit in edits {
        let pos = edit.start + shift;
        let in_bounds = pos >= 0 && (pos as usize) < target.len();

        if edit.label.is_empty() {
            if in_bounds {
                target.remove(pos as usize);
                shift -= 1;
            }
        } else if edit.start == edit.end {
            if pos >= 0 {
                let at = (pos as usize).min(target.len());
                target.insert(at, edit.label.clone());
                shift += 1;
            }
        } else if edit.label.starts_with(TRANSFORM) {
            if in_bounds {
                let slot = &mut target[pos as usize];
                if let Some(word) = apply_transformation(slot, &edit.label, verbs) {
                    *slot = word;
                }
            }
        } else if edit.start == edit.end - 1 && in_bounds {
            target[pos as usize] = edit.label.clone();
        }
    }

    replace_merge_transforms(target)
}

/// Glue tokens around `$MERGE_HYPHEN` and `$MERGE_SPACE` markers
fn replace_merge_transforms(tokens: Vec<String>) -> Vec<String> {
    if !tokens.iter().any(|t| t.starts_with(MERGE)) {
        return tokens;
    }

    let line = format!(" {} ", tokens.join(" "))
        .replace(" $MERGE_HYPHEN ", "-")
        .replace(" $MERGE_SPACE ", "");

    line.split_whitespace().map(str::to_string).collect()
}

/// Rewrite `token` according to a `$TRANSFORM_*` label.
///
/// Returns `None` when the label does not apply, leaving the token as is.
pub fn apply_transformation(token: &str, label: &str, verbs: &VerbFormDictionary) -> Option<String> {
    let kind = label.strip_prefix(TRANSFORM)?;

    if let Some(case) = kind.strip_prefix("CASE_") {
        Some(convert_case(token, case))
    } else if let Some(tags) = kind.strip_prefix("VERB_") {
        verbs.decode(token, tags).map(str::to_string)
    } else if kind == "SPLIT_HYPHEN" {
        Some(token.split('-').collect::<Vec<_>>().join(" "))
    } else if kind == "AGREEMENT_PLURAL" {
        Some(format!("{}s", token))
    } else if kind == "AGREEMENT_SINGULAR" {
        let mut chars = token.chars();
        chars.next_back();
        Some(chars.as_str().to_string())
    } else {
        None
    }
}

fn convert_case(token: &str, case: &str) -> String {
    match case {
        "LOWER" => token.to_lowercase(),
        "UPPER" => token.to_uppercase(),
        "CAPITAL" => capitalize(token),
        "CAPITAL_1" => {
            let mut chars = token.chars();
            match chars.next() {
                Some(first) => format!("{}{}", first, capitalize(chars.as_str())),
                None => String::new(),
            }
        }
        "UPPER_-1" => {
            let mut chars = token.chars();
            match chars.next_back() {
                Some(last) => format!("{}{}", chars.as_str().to_uppercase(), last),
                None => String::new(),
            }
        }
        _ => token.to_string(),
    }
}

/// First character upper case, the rest lower case
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    fn edits(actions: &[(usize, &str)]) -> Vec<Edit> {
        actions
            .iter()
            .filter_map(|(i, label)| token_action(*i, label, 0.9, 0.0))
            .collect()
    }

    #[test]
    fn test_token_action_positions() {
        let replace = token_action(2, "$REPLACE_goes", 0.8, 0.0).unwrap();
        assert_eq!((replace.start, replace.end), (1, 2));
        assert_eq!(replace.label, "goes");

        let append = token_action(0, "$APPEND_The", 0.8, 0.0).unwrap();
        assert_eq!((append.start, append.end), (0, 0));
        assert_eq!(append.label, "The");

        let delete = token_action(3, "$DELETE", 0.8, 0.0).unwrap();
        assert_eq!((delete.start, delete.end), (2, 3));
        assert_eq!(delete.label, "");

        let merge = token_action(1, "$MERGE_SPACE", 0.8, 0.0).unwrap();
        assert_eq!((merge.start, merge.end), (1, 1));
        assert_eq!(merge.label, "$MERGE_SPACE");
    }

    #[test]
    fn test_token_action_skips() {
        assert!(token_action(1, KEEP, 0.99, 0.0).is_none());
        assert!(token_action(1, UNKNOWN, 0.99, 0.0).is_none());
        assert!(token_action(1, PADDING, 0.99, 0.0).is_none());
        assert!(token_action(1, "$REPLACE_a", 0.3, 0.5).is_none());
    }

    #[test]
    fn test_apply_replace_and_append() {
        let source = toks("he go to school");
        let result = apply_edits(
            &source,
            &edits(&[(2, "$REPLACE_goes"), (4, "$APPEND_.")]),
            &VerbFormDictionary::default(),
        );
        assert_eq!(result, toks("he goes to school ."));
    }

    #[test]
    fn test_apply_shifts_after_insert_and_delete() {
        let source = toks("cat sat the the mat");
        let result = apply_edits(
            &source,
            &edits(&[(0, "$APPEND_The"), (3, "$DELETE"), (5, "$REPLACE_rug")]),
            &VerbFormDictionary::default(),
        );
        assert_eq!(result, toks("The cat sat the rug"));
    }

    #[test]
    fn test_apply_merges() {
        let source = toks("some thing well known");
        let result = apply_edits(
            &source,
            &edits(&[(1, "$MERGE_SPACE"), (3, "$MERGE_HYPHEN")]),
            &VerbFormDictionary::default(),
        );
        assert_eq!(result, toks("something well-known"));
    }

    #[test]
    fn test_replace_on_start_marker_is_ignored() {
        let source = toks("a b");
        let result = apply_edits(
            &source,
            &edits(&[(0, "$REPLACE_x"), (0, "$DELETE")]),
            &VerbFormDictionary::default(),
        );
        assert_eq!(result, source);
    }

    #[test]
    fn test_case_transforms() {
        let verbs = VerbFormDictionary::default();
        let t = |token: &str, label: &str| apply_transformation(token, label, &verbs).unwrap();

        assert_eq!(t("London", "$TRANSFORM_CASE_LOWER"), "london");
        assert_eq!(t("nasa", "$TRANSFORM_CASE_UPPER"), "NASA");
        assert_eq!(t("pARIS", "$TRANSFORM_CASE_CAPITAL"), "Paris");
        assert_eq!(t("mcdonald", "$TRANSFORM_CASE_CAPITAL_1"), "mCdonald");
        assert_eq!(t("pcs", "$TRANSFORM_CASE_UPPER_-1"), "PCs");
    }

    #[test]
    fn test_other_transforms() {
        let verbs = VerbFormDictionary::from_lines(["go_goes:VB_VBZ"]);

        assert_eq!(
            apply_transformation("go", "$TRANSFORM_VERB_VB_VBZ", &verbs).as_deref(),
            Some("goes")
        );
        assert_eq!(apply_transformation("run", "$TRANSFORM_VERB_VB_VBZ", &verbs), None);
        assert_eq!(
            apply_transformation("e-mail", "$TRANSFORM_SPLIT_HYPHEN", &verbs).as_deref(),
            Some("e mail")
        );
        assert_eq!(
            apply_transformation("book", "$TRANSFORM_AGREEMENT_PLURAL", &verbs).as_deref(),
            Some("books")
        );
        assert_eq!(
            apply_transformation("books", "$TRANSFORM_AGREEMENT_SINGULAR", &verbs).as_deref(),
            Some("book")
        );
        assert_eq!(apply_transformation("x", "$TRANSFORM_UNKNOWN", &verbs), None);
    }

    #[test]
    fn test_missing_verb_form_keeps_token() {
        let source = toks("they runs");
        let result = apply_edits(
            &source,
            &edits(&[(2, "$TRANSFORM_VERB_VBZ_VB")]),
            &VerbFormDictionary::default(),
        );
        assert_eq!(result, source);
    }
}
