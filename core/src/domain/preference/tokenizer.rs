use crate::domain::food::helpers::normalize_food_name;

/// Feature tokens of a food name: latin words, CJK bigrams and a whole-name token.
///
/// The output is sorted and free of duplicates, so a name counts once per token.
pub fn tokenize(name: &str) -> Vec<String> {
    let normalized = normalize_food_name(name);
    if normalized.is_empty() {
        return Vec::new();
    }

    let mut tokens = vec![whole_name_token(&normalized)];
    let mut run = String::new();
    let mut run_is_cjk = false;

    for c in normalized.chars() {
        let cjk = is_cjk(c);
        if !(cjk || c.is_alphanumeric()) {
            flush(&mut run, run_is_cjk, &mut tokens);
            continue;
        }
        if !run.is_empty() && cjk != run_is_cjk {
            flush(&mut run, run_is_cjk, &mut tokens);
        }
        run_is_cjk = cjk;
        run.push(c);
    }
    flush(&mut run, run_is_cjk, &mut tokens);

    tokens.sort();
    tokens.dedup();
    tokens
}

pub fn whole_name_token(normalized: &str) -> String {
    format!("={}", normalized)
}

fn flush(run: &mut String, cjk: bool, tokens: &mut Vec<String>) {
    if run.is_empty() {
        return;
    }
    if cjk {
        let chars: Vec<char> = run.chars().collect();
        if chars.len() == 1 {
            tokens.push(run.clone());
        } else {
            tokens.extend(chars.windows(2).map(|pair| pair.iter().collect::<String>()));
        }
    } else if run.chars().count() >= 2 {
        tokens.push(run.clone());
    }
    run.clear();
}

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{30FF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{AC00}'..='\u{D7AF}'
        | '\u{F900}'..='\u{FAFF}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin_words() {
        assert_eq!(
            tokenize("Fried Chicken"),
            vec!["=fried chicken", "chicken", "fried"]
        );
    }

    #[test]
    fn test_cjk_bigrams() {
        assert_eq!(tokenize("西红柿"), vec!["=西红柿", "红柿", "西红"]);
        assert_eq!(tokenize("粥"), vec!["=粥", "粥"]);
    }

    #[test]
    fn test_mixed_script_and_duplicates() {
        assert_eq!(tokenize("rice 米饭 rice"), vec!["=rice 米饭 rice", "rice", "米饭"]);
    }

    #[test]
    fn test_empty_name() {
        assert!(tokenize("   ").is_empty());
    }
}
